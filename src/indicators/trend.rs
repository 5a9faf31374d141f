//! Moving averages and Wilder's directional movement (ADX).

use std::fmt;

use serde::{Deserialize, Serialize};

use super::rolling::rolling_mean;
use crate::{OHLCVExt, OHLCV};

/// Simple moving average; the first `period - 1` values are NaN.
pub fn sma(values: &[f64], period: usize) -> Vec<f64> {
    if period == 0 {
        return vec![f64::NAN; values.len()];
    }
    rolling_mean(values, period, period)
}

/// ADX together with the directional indicators it is built from.
#[derive(Debug, Clone, Default)]
pub struct AdxSeries {
    pub adx: Vec<f64>,
    pub plus_di: Vec<f64>,
    pub minus_di: Vec<f64>,
}

impl AdxSeries {
    pub fn last_adx(&self) -> Option<f64> {
        super::rolling::last_finite(&self.adx)
    }
}

/// Average Directional Index with Wilder smoothing.
///
/// DI values start at index `period`, ADX at index `2 * period - 1`.
/// A zero smoothed true range gives DI = 0 and a zero DI sum gives DX = 0,
/// so flat data reads as a weak trend rather than NaN.
pub fn adx<T: OHLCV>(bars: &[T], period: usize) -> AdxSeries {
    let n = bars.len();
    let mut out = AdxSeries {
        adx: vec![f64::NAN; n],
        plus_di: vec![f64::NAN; n],
        minus_di: vec![f64::NAN; n],
    };
    if period == 0 || n <= period {
        return out;
    }

    let p = period as f64;
    let (mut s_tr, mut s_pdm, mut s_mdm) = (0.0, 0.0, 0.0);
    let mut dx_seed = 0.0;
    let mut adx_prev = f64::NAN;

    for i in 1..n {
        let (cur, prev) = (&bars[i], &bars[i - 1]);
        let up = cur.high() - prev.high();
        let down = prev.low() - cur.low();
        let pdm = if up > down && up > 0.0 { up } else { 0.0 };
        let mdm = if down > up && down > 0.0 { down } else { 0.0 };
        let tr = cur
            .range()
            .max((cur.high() - prev.close()).abs())
            .max((cur.low() - prev.close()).abs());

        if i <= period {
            s_tr += tr;
            s_pdm += pdm;
            s_mdm += mdm;
            if i < period {
                continue;
            }
        } else {
            s_tr = s_tr - s_tr / p + tr;
            s_pdm = s_pdm - s_pdm / p + pdm;
            s_mdm = s_mdm - s_mdm / p + mdm;
        }

        let (pdi, mdi) = if s_tr > 0.0 {
            (100.0 * s_pdm / s_tr, 100.0 * s_mdm / s_tr)
        } else {
            (0.0, 0.0)
        };
        out.plus_di[i] = pdi;
        out.minus_di[i] = mdi;

        let di_sum = pdi + mdi;
        let dx = if di_sum > 0.0 {
            100.0 * (pdi - mdi).abs() / di_sum
        } else {
            0.0
        };

        let seed_end = 2 * period - 1;
        if i < seed_end {
            dx_seed += dx;
        } else if i == seed_end {
            dx_seed += dx;
            adx_prev = dx_seed / p;
            out.adx[i] = adx_prev;
        } else {
            adx_prev = (adx_prev * (p - 1.0) + dx) / p;
            out.adx[i] = adx_prev;
        }
    }

    out
}

/// Trend strength band derived from ADX.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrendStrength {
    Weak,
    Moderate,
    Strong,
    Unavailable,
}

impl fmt::Display for TrendStrength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TrendStrength::Weak => "Weak Trend",
            TrendStrength::Moderate => "Moderate Trend",
            TrendStrength::Strong => "Strong Trend",
            TrendStrength::Unavailable => "N/A",
        })
    }
}

/// `< 20` weak, `20..=40` moderate, `> 40` strong; NaN is unavailable.
pub fn interpret_adx(value: f64) -> TrendStrength {
    match value {
        v if !v.is_finite() => TrendStrength::Unavailable,
        v if v < 20.0 => TrendStrength::Weak,
        v if v <= 40.0 => TrendStrength::Moderate,
        _ => TrendStrength::Strong,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Bar {
        h: f64,
        l: f64,
        c: f64,
    }

    impl OHLCV for Bar {
        fn open(&self) -> f64 {
            self.c
        }

        fn high(&self) -> f64 {
            self.h
        }

        fn low(&self) -> f64 {
            self.l
        }

        fn close(&self) -> f64 {
            self.c
        }

        fn volume(&self) -> f64 {
            1_000.0
        }
    }

    fn ramp(n: usize, step: f64) -> Vec<Bar> {
        (0..n)
            .map(|i| {
                let c = 100.0 + i as f64 * step;
                Bar {
                    h: c + 1.0,
                    l: c - 1.0,
                    c,
                }
            })
            .collect()
    }

    #[test]
    fn sma_warm_up_and_value() {
        let out = sma(&[1.0, 2.0, 3.0, 4.0, 5.0], 5);
        assert!(out[..4].iter().all(|v| v.is_nan()));
        assert_eq!(out[4], 3.0);
    }

    #[test]
    fn adx_warm_up_indices() {
        let series = adx(&ramp(40, 1.0), 14);
        assert!(series.plus_di[13].is_nan());
        assert!(series.plus_di[14].is_finite());
        assert!(series.adx[26].is_nan());
        assert!(series.adx[27].is_finite());
    }

    #[test]
    fn steady_uptrend_is_strong() {
        let series = adx(&ramp(60, 1.0), 14);
        let last = series.last_adx().unwrap();
        assert!((last - 100.0).abs() < 1e-9);
        assert_eq!(interpret_adx(last), TrendStrength::Strong);
        assert_eq!(*series.minus_di.last().unwrap(), 0.0);
    }

    #[test]
    fn flat_series_is_weak_not_nan() {
        let series = adx(&ramp(40, 0.0), 14);
        assert_eq!(series.last_adx(), Some(0.0));
        assert_eq!(interpret_adx(0.0), TrendStrength::Weak);
    }

    #[test]
    fn short_series_is_unavailable() {
        let series = adx(&ramp(20, 1.0), 14);
        assert_eq!(series.last_adx(), None);
        assert_eq!(interpret_adx(f64::NAN), TrendStrength::Unavailable);
    }

    #[test]
    fn adx_band_edges() {
        assert_eq!(interpret_adx(19.99), TrendStrength::Weak);
        assert_eq!(interpret_adx(20.0), TrendStrength::Moderate);
        assert_eq!(interpret_adx(40.0), TrendStrength::Moderate);
        assert_eq!(interpret_adx(40.01), TrendStrength::Strong);
    }
}
