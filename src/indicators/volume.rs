//! Volume indicators: OBV, VWAP and volume-anomaly detection.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{round2, rolling::RollingWindow};
use crate::{params::IndicatorOptions, OHLCVExt, OHLCV};

/// Same-bar close change beyond which an anomaly is a breakout/breakdown.
pub const BREAKOUT_CHANGE: f64 = 0.05;

/// On-Balance Volume, seeded with the first bar's volume.
pub fn obv<T: OHLCV>(bars: &[T]) -> Vec<f64> {
    let Some(first) = bars.first() else {
        return Vec::new();
    };
    let mut out = Vec::with_capacity(bars.len());
    let mut acc = first.volume();
    out.push(acc);
    for pair in bars.windows(2) {
        let (prev, cur) = (&pair[0], &pair[1]);
        if cur.close() > prev.close() {
            acc += cur.volume();
        } else if cur.close() < prev.close() {
            acc -= cur.volume();
        }
        out.push(acc);
    }
    out
}

/// Direction of accumulated volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObvTrend {
    BuyingPressure,
    SellingPressure,
    Neutral,
}

impl fmt::Display for ObvTrend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ObvTrend::BuyingPressure => "Buying Pressure",
            ObvTrend::SellingPressure => "Selling Pressure",
            ObvTrend::Neutral => "Neutral",
        })
    }
}

/// Compare the latest OBV with the mean of the `lookback` values before it.
///
/// The band is `mean ± tolerance * |mean|` so that a negative baseline is
/// handled the same way as a positive one. Too little history is Neutral.
pub fn interpret_obv(obv: &[f64], lookback: usize, tolerance: f64) -> ObvTrend {
    let n = obv.len();
    if lookback == 0 || n < lookback + 1 {
        return ObvTrend::Neutral;
    }
    let latest = obv[n - 1];
    let prior = &obv[n - 1 - lookback..n - 1];
    let mean = prior.iter().sum::<f64>() / lookback as f64;
    let band = tolerance * mean.abs();

    if latest > mean + band {
        ObvTrend::BuyingPressure
    } else if latest < mean - band {
        ObvTrend::SellingPressure
    } else {
        ObvTrend::Neutral
    }
}

/// Cumulative VWAP from the first bar of the slice (no session resets).
/// NaN while no volume has traded.
pub fn vwap<T: OHLCV>(bars: &[T]) -> Vec<f64> {
    let mut pv = 0.0;
    let mut vol = 0.0;
    bars.iter()
        .map(|bar| {
            pv += bar.typical_price() * bar.volume();
            vol += bar.volume();
            if vol > 0.0 {
                pv / vol
            } else {
                f64::NAN
            }
        })
        .collect()
}

/// VWAP as of the last bar; `None` if nothing has traded.
pub fn calculate_vwap<T: OHLCV>(bars: &[T]) -> Option<f64> {
    super::last_finite(&vwap(bars))
}

/// Classification of an anomalous volume bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnomalyKind {
    Breakout,
    Breakdown,
    Accumulation,
    Distribution,
}

impl fmt::Display for AnomalyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AnomalyKind::Breakout => "Breakout",
            AnomalyKind::Breakdown => "Breakdown",
            AnomalyKind::Accumulation => "Accumulation",
            AnomalyKind::Distribution => "Distribution",
        })
    }
}

/// Which rules fired. They are OR-combined without ranking.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnomalyTriggers {
    pub statistical: bool,
    pub market: bool,
    pub sustained: bool,
}

impl AnomalyTriggers {
    pub fn any(&self) -> bool {
        self.statistical || self.market || self.sustained
    }
}

/// Volume-anomaly verdict for the latest bar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct VolumeAnomaly {
    /// False when the series is shorter than the baseline window plus one.
    pub evaluated: bool,
    pub is_anomaly: bool,
    pub kind: Option<AnomalyKind>,
    /// Latest volume over the baseline mean, 2 decimals; 0 without a baseline.
    pub ratio: f64,
    /// Own relative volume over the benchmark's, when a benchmark was usable.
    pub market_ratio: Option<f64>,
    pub triggers: AnomalyTriggers,
}

/// Baseline (mean, sample std) of the `window` values strictly before each index.
fn trailing_baselines(volumes: &[f64], window: usize) -> Vec<Option<(f64, Option<f64>)>> {
    let mut rolling = RollingWindow::new(window);
    volumes
        .iter()
        .map(|&v| {
            let baseline = if rolling.is_full() {
                rolling.mean().map(|m| (m, rolling.std_dev()))
            } else {
                None
            };
            rolling.push(v);
            baseline
        })
        .collect()
}

fn market_relative(benchmark: Option<&[f64]>, window: usize, own_relative: f64) -> Option<f64> {
    let bench = benchmark?;
    if bench.len() < window + 1 || !own_relative.is_finite() {
        return None;
    }
    let latest = bench[bench.len() - 1];
    let prior = &bench[bench.len() - 1 - window..bench.len() - 1];
    let mean = prior.iter().sum::<f64>() / window as f64;
    if !(mean > 0.0 && latest > 0.0) {
        return None;
    }
    Some(own_relative / (latest / mean))
}

/// Flag unusual volume on the latest bar.
///
/// The baseline is the `anomaly_window` volumes preceding the latest bar.
/// Statistical, market-relative and sustained rules are OR-combined. A
/// missing or degenerate benchmark disables only the market rule.
pub fn detect_volume_anomaly<T: OHLCV>(
    bars: &[T],
    benchmark: Option<&[f64]>,
    options: &IndicatorOptions,
) -> VolumeAnomaly {
    let window = options.anomaly_window.get();
    let n = bars.len();
    if n < window + 1 {
        return VolumeAnomaly::default();
    }

    let volumes: Vec<f64> = bars.iter().map(|b| b.volume()).collect();
    let baselines = trailing_baselines(&volumes, window);
    let latest = volumes[n - 1];
    let Some((mean, std)) = baselines[n - 1] else {
        return VolumeAnomaly::default();
    };

    let relative = if mean > 0.0 { latest / mean } else { f64::NAN };
    let ratio = if relative.is_finite() { round2(relative) } else { 0.0 };

    let statistical = std.is_some_and(|s| latest > mean + options.anomaly_std_multiplier * s);

    let market_ratio = market_relative(benchmark, window, relative);
    if benchmark.is_some() && market_ratio.is_none() {
        tracing::trace!("benchmark volume unusable, market-relative rule disabled");
    }
    let market = market_ratio.is_some_and(|r| r > options.anomaly_market_ratio_threshold);

    let k = options.sustained_bars.get();
    let sustained = n >= window + k
        && (n - k..n).all(|j| {
            baselines[j].is_some_and(|(m, _)| volumes[j] > options.sustained_multiplier * m)
        });

    let triggers = AnomalyTriggers {
        statistical,
        market,
        sustained,
    };
    let is_anomaly = triggers.any();
    let kind = is_anomaly.then(|| classify(&bars[n - 2], &bars[n - 1]));

    VolumeAnomaly {
        evaluated: true,
        is_anomaly,
        kind,
        ratio,
        market_ratio,
        triggers,
    }
}

fn classify<T: OHLCV>(prev: &T, cur: &T) -> AnomalyKind {
    let prev_close = prev.close();
    let change = if prev_close > 0.0 {
        (cur.close() - prev_close) / prev_close
    } else {
        0.0
    };
    if change > BREAKOUT_CHANGE {
        AnomalyKind::Breakout
    } else if change < -BREAKOUT_CHANGE {
        AnomalyKind::Breakdown
    } else if change >= 0.0 {
        AnomalyKind::Accumulation
    } else {
        AnomalyKind::Distribution
    }
}
