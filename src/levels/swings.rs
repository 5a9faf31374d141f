//! Swing-point detection.
//!
//! Extrema use a symmetric comparison radius. On a plateau the first bar
//! wins: values to the left must be strictly worse, values to the right may
//! tie. Bars without a full radius on both sides never qualify.

use serde::{Deserialize, Serialize};

use crate::{Result, ScreenError, OHLCV};

/// Number of most recent extrema considered per side.
pub const RECENT_EXTREMA: usize = 10;

/// Which fallback tier produced a swing price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SwingSource {
    /// Extremum of the significant consecutive moves.
    Significant,
    /// Extremum of the recent local extrema.
    RecentExtrema,
    /// Plain window high/low.
    WindowExtreme,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SwingRange {
    pub high: f64,
    pub low: f64,
    pub high_source: SwingSource,
    pub low_source: SwingSource,
}

fn local_extrema(values: &[f64], order: usize, beats: impl Fn(f64, f64) -> bool) -> Vec<usize> {
    let order = order.max(1);
    if values.len() <= 2 * order {
        return Vec::new();
    }
    (order..values.len() - order)
        .filter(|&i| {
            let v = values[i];
            values[i - order..i].iter().all(|&l| beats(v, l))
                && values[i + 1..=i + order].iter().all(|&r| !beats(r, v))
        })
        .collect()
}

/// Indices of local maxima (argrelextrema-style, first-of-plateau).
pub fn local_maxima(values: &[f64], order: usize) -> Vec<usize> {
    local_extrema(values, order, |a, b| a > b)
}

/// Indices of local minima (argrelextrema-style, first-of-plateau).
pub fn local_minima(values: &[f64], order: usize) -> Vec<usize> {
    local_extrema(values, order, |a, b| a < b)
}

/// Later points of consecutive pairs that moved more than `min_swing_size`.
fn significant_moves(points: &[f64], min_swing_size: f64) -> Vec<f64> {
    points
        .windows(2)
        .filter(|w| w[0] != 0.0 && ((w[1] - w[0]) / w[0]).abs() > min_swing_size)
        .map(|w| w[1])
        .collect()
}

fn select(
    values: &[f64],
    extrema: &[usize],
    min_swing_size: f64,
    pick: fn(f64, f64) -> f64,
    seed: f64,
) -> (f64, SwingSource) {
    let recent: Vec<f64> = extrema
        .iter()
        .rev()
        .take(RECENT_EXTREMA)
        .rev()
        .map(|&i| values[i])
        .collect();

    let significant = significant_moves(&recent, min_swing_size);
    if !significant.is_empty() {
        return (significant.iter().copied().fold(seed, pick), SwingSource::Significant);
    }
    if !recent.is_empty() {
        return (recent.iter().copied().fold(seed, pick), SwingSource::RecentExtrema);
    }
    (values.iter().copied().fold(seed, pick), SwingSource::WindowExtreme)
}

/// Find the swing high/low of the last `window` bars.
///
/// Each side falls back from significant swings to recent extrema to the
/// plain window extreme, so any non-empty series yields a pair. If the
/// chosen pair is inverted (high below low) both sides revert to the window
/// extremes.
pub fn identify_significant_swings<T: OHLCV>(
    bars: &[T],
    window: usize,
    min_swing_size: f64,
    order: usize,
) -> Result<SwingRange> {
    if bars.is_empty() {
        return Err(ScreenError::InsufficientData { need: 1, got: 0 });
    }
    let start = bars.len().saturating_sub(window.max(1));
    let recent = &bars[start..];
    let highs: Vec<f64> = recent.iter().map(|b| b.high()).collect();
    let lows: Vec<f64> = recent.iter().map(|b| b.low()).collect();

    let (high, high_source) = select(
        &highs,
        &local_maxima(&highs, order),
        min_swing_size,
        f64::max,
        f64::NEG_INFINITY,
    );
    let (low, low_source) = select(
        &lows,
        &local_minima(&lows, order),
        min_swing_size,
        f64::min,
        f64::INFINITY,
    );

    if high < low {
        return Ok(SwingRange {
            high: highs.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            low: lows.iter().copied().fold(f64::INFINITY, f64::min),
            high_source: SwingSource::WindowExtreme,
            low_source: SwingSource::WindowExtreme,
        });
    }

    Ok(SwingRange {
        high,
        low,
        high_source,
        low_source,
    })
}
