//! Swing & level detector
//!
//! Swing highs/lows, Fibonacci retracements and the ranked support and
//! resistance lists built from them.
//!
//! Candidate pools:
//! - **Support**: Fibonacci 0.618 and 0.786
//! - **Resistance**: Fibonacci 0.236 and 0.382
//! - **Both**: MA20, MA50, cumulative VWAP, nearest psychological level,
//!   and the volume-profile point of control when enabled

pub mod fibonacci;
pub mod profile;
pub mod swings;

pub use fibonacci::{calculate_fibonacci_levels, FibonacciLevels, FIB_RATIOS};
pub use profile::{
    nearest_psychological_level, volume_profile, ProfileBin, VolumeProfile, PSYCHOLOGICAL_LEVELS,
};
pub use swings::{
    identify_significant_swings, local_maxima, local_minima, SwingRange, SwingSource,
    RECENT_EXTREMA,
};

use serde::Serialize;

use crate::{
    indicators::{calculate_vwap, closes, last_finite, sma},
    params::IndicatorOptions,
    Result, ScreenError, OHLCV,
};

/// Levels closer than this are the same level.
const SAME_LEVEL: f64 = 1e-9;

/// Shared candidates that enter both pools.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct LevelCandidates {
    pub ma20: Option<f64>,
    pub ma50: Option<f64>,
    pub vwap: Option<f64>,
    pub psychological: Option<f64>,
    pub volume_poc: Option<f64>,
}

impl LevelCandidates {
    pub fn from_series<T: OHLCV>(bars: &[T], options: &IndicatorOptions) -> Self {
        let close = closes(bars);
        let profile_start = bars.len().saturating_sub(options.profile_window.get());
        Self {
            ma20: last_finite(&sma(&close, 20)),
            ma50: last_finite(&sma(&close, 50)),
            vwap: calculate_vwap(bars),
            psychological: close.last().copied().and_then(nearest_psychological_level),
            volume_poc: volume_profile(&bars[profile_start..], options.profile_bins.get())
                .and_then(|p| p.point_of_control()),
        }
    }

    fn shared(&self, with_poc: bool) -> impl Iterator<Item = f64> {
        let poc = if with_poc { self.volume_poc } else { None };
        [self.ma20, self.ma50, self.vwap, self.psychological, poc]
            .into_iter()
            .flatten()
    }
}

/// Support and resistance as of the last close.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LevelSet {
    pub close: f64,
    /// Below the close, nearest first
    pub support: Vec<f64>,
    /// Above the close, nearest first
    pub resistance: Vec<f64>,
    pub fibonacci: FibonacciLevels,
    pub swing: SwingRange,
}

impl LevelSet {
    /// `"98.50, 95.00"`
    pub fn format_support(&self) -> String {
        format_levels(&self.support)
    }

    pub fn format_resistance(&self) -> String {
        format_levels(&self.resistance)
    }

    /// `"Fib_0.236: 176.40 | Fib_0.382: 161.80 | ..."`, interior ratios only.
    pub fn format_fibonacci(&self) -> String {
        self.fibonacci
            .labelled()
            .filter(|(label, _)| *label != "Fib_0.0" && *label != "Fib_1.0")
            .map(|(label, price)| format!("{label}: {price:.2}"))
            .collect::<Vec<_>>()
            .join(" | ")
    }
}

fn format_levels(levels: &[f64]) -> String {
    levels
        .iter()
        .map(|l| format!("{l:.2}"))
        .collect::<Vec<_>>()
        .join(", ")
}

fn rank(mut pool: Vec<f64>, keep: impl Fn(f64) -> bool, descending: bool, count: usize) -> Vec<f64> {
    pool.retain(|&v| v.is_finite() && keep(v));
    pool.sort_by(|a, b| if descending { b.total_cmp(a) } else { a.total_cmp(b) });
    pool.dedup_by(|a, b| (*a - *b).abs() < SAME_LEVEL);
    pool.truncate(count);
    pool
}

/// Rank support and resistance for the latest bar.
///
/// # Errors
/// `InsufficientData` for an empty series.
pub fn calculate_support_resistance<T: OHLCV>(
    bars: &[T],
    options: &IndicatorOptions,
) -> Result<LevelSet> {
    calculate_support_resistance_with(bars, &LevelCandidates::from_series(bars, options), options)
}

/// Same as [`calculate_support_resistance`] with precomputed shared candidates.
pub(crate) fn calculate_support_resistance_with<T: OHLCV>(
    bars: &[T],
    candidates: &LevelCandidates,
    options: &IndicatorOptions,
) -> Result<LevelSet> {
    let Some(last) = bars.last() else {
        return Err(ScreenError::InsufficientData { need: 1, got: 0 });
    };
    let close = last.close();

    let swing = identify_significant_swings(
        bars,
        options.swing_window.get(),
        options.swing_min_size.get(),
        options.min_swing_order.get(),
    )?;
    let fibonacci = calculate_fibonacci_levels(swing.high, swing.low);
    let shared: Vec<f64> = candidates.shared(options.profile_in_levels).collect();

    let support_pool: Vec<f64> = [0.618, 0.786]
        .iter()
        .filter_map(|&r| fibonacci.get(r))
        .chain(shared.iter().copied())
        .collect();
    let resistance_pool: Vec<f64> = [0.236, 0.382]
        .iter()
        .filter_map(|&r| fibonacci.get(r))
        .chain(shared.iter().copied())
        .collect();

    let count = options.level_count.get();
    Ok(LevelSet {
        close,
        support: rank(support_pool, |v| v < close, true, count),
        resistance: rank(resistance_pool, |v| v > close, false, count),
        fibonacci,
        swing,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Bar {
        c: f64,
    }

    impl OHLCV for Bar {
        fn open(&self) -> f64 {
            self.c
        }

        fn high(&self) -> f64 {
            self.c * 1.01
        }

        fn low(&self) -> f64 {
            self.c * 0.99
        }

        fn close(&self) -> f64 {
            self.c
        }

        fn volume(&self) -> f64 {
            10_000.0
        }
    }

    fn zigzag(n: usize) -> Vec<Bar> {
        (0..n)
            .map(|i| {
                let phase = (i % 16) as f64;
                let tri = if phase < 8.0 { phase } else { 16.0 - phase };
                Bar {
                    c: 150.0 + 4.0 * tri + 0.3 * i as f64,
                }
            })
            .collect()
    }

    #[test]
    fn levels_bracket_the_close() {
        let bars = zigzag(90);
        let levels = calculate_support_resistance(&bars, &IndicatorOptions::default()).unwrap();
        assert!(levels.support.len() <= 3);
        assert!(levels.resistance.len() <= 3);
        assert!(levels.support.iter().all(|&s| s < levels.close));
        assert!(levels.resistance.iter().all(|&r| r > levels.close));
        assert!(levels.support.windows(2).all(|w| w[0] > w[1]));
        assert!(levels.resistance.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn empty_series_is_an_error() {
        let bars: Vec<Bar> = Vec::new();
        assert!(matches!(
            calculate_support_resistance(&bars, &IndicatorOptions::default()),
            Err(ScreenError::InsufficientData { .. })
        ));
    }

    #[test]
    fn short_series_drops_unavailable_averages() {
        let bars = zigzag(10);
        let candidates = LevelCandidates::from_series(&bars, &IndicatorOptions::default());
        assert_eq!(candidates.ma20, None);
        assert_eq!(candidates.ma50, None);
        assert!(candidates.vwap.is_some());
        assert_eq!(candidates.psychological, Some(200.0));
    }

    #[test]
    fn precomputed_candidates_give_same_levels() {
        let bars = zigzag(90);
        let options = IndicatorOptions {
            profile_in_levels: true,
            ..IndicatorOptions::default()
        };
        let candidates = LevelCandidates::from_series(&bars, &options);
        assert!(candidates.volume_poc.is_some());
        assert_eq!(
            calculate_support_resistance_with(&bars, &candidates, &options).unwrap(),
            calculate_support_resistance(&bars, &options).unwrap()
        );
    }

    #[test]
    fn duplicates_collapse() {
        let ranked = rank(vec![90.0, 95.0, 95.0, 80.0, 100.0, f64::NAN], |v| v < 100.0, true, 3);
        assert_eq!(ranked, vec![95.0, 90.0, 80.0]);
    }

    #[test]
    fn formatting() {
        let bars = zigzag(90);
        let levels = calculate_support_resistance(&bars, &IndicatorOptions::default()).unwrap();
        let fib = levels.format_fibonacci();
        assert!(fib.starts_with("Fib_0.236: "));
        assert_eq!(fib.matches(" | ").count(), 4);
        assert_eq!(format_levels(&[98.5, 95.0]), "98.50, 95.00");
        assert_eq!(format_levels(&[]), "");
    }
}
