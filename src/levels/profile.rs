//! Volume profile and psychological round-number levels.

use serde::{Deserialize, Serialize};

use crate::OHLCV;

/// Round numbers traders anchor to.
pub const PSYCHOLOGICAL_LEVELS: [f64; 7] = [50.0, 100.0, 200.0, 500.0, 1_000.0, 2_000.0, 5_000.0];

/// Closest round number to `price`; equidistant prices take the lower one.
pub fn nearest_psychological_level(price: f64) -> Option<f64> {
    if !price.is_finite() {
        return None;
    }
    let mut best = PSYCHOLOGICAL_LEVELS[0];
    for &level in &PSYCHOLOGICAL_LEVELS[1..] {
        if (level - price).abs() < (best - price).abs() {
            best = level;
        }
    }
    Some(best)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProfileBin {
    pub low: f64,
    pub high: f64,
    pub volume: f64,
}

impl ProfileBin {
    pub fn midpoint(&self) -> f64 {
        (self.low + self.high) / 2.0
    }
}

/// Volume traded per close-price bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumeProfile {
    pub bins: Vec<ProfileBin>,
}

impl VolumeProfile {
    /// Midpoint of the heaviest bin. The first bin wins a tie; a profile
    /// without traded volume has no point of control.
    pub fn point_of_control(&self) -> Option<f64> {
        let mut best: Option<&ProfileBin> = None;
        for bin in &self.bins {
            if bin.volume > best.map_or(0.0, |b| b.volume) {
                best = Some(bin);
            }
        }
        best.map(ProfileBin::midpoint)
    }
}

/// Bucket each bar's volume by its close over `bins` equal-width price bins
/// spanning the lowest low to the highest high. The last edge is inclusive.
/// A zero-width range yields a single bin.
pub fn volume_profile<T: OHLCV>(bars: &[T], bins: usize) -> Option<VolumeProfile> {
    if bars.is_empty() {
        return None;
    }
    let low = bars.iter().map(|b| b.low()).fold(f64::INFINITY, f64::min);
    let high = bars.iter().map(|b| b.high()).fold(f64::NEG_INFINITY, f64::max);
    if !low.is_finite() || !high.is_finite() {
        return None;
    }

    let span = high - low;
    if bins <= 1 || span <= 0.0 {
        let volume = bars.iter().map(|b| b.volume()).sum();
        return Some(VolumeProfile {
            bins: vec![ProfileBin { low, high, volume }],
        });
    }

    let width = span / bins as f64;
    let mut out: Vec<ProfileBin> = (0..bins)
        .map(|i| ProfileBin {
            low: low + width * i as f64,
            high: if i + 1 == bins { high } else { low + width * (i + 1) as f64 },
            volume: 0.0,
        })
        .collect();

    for bar in bars {
        let close = bar.close();
        if close < low || close > high {
            continue;
        }
        let slot = (((close - low) / width) as usize).min(bins - 1);
        out[slot].volume += bar.volume();
    }
    Some(VolumeProfile { bins: out })
}
