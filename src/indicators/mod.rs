//! Indicator library
//!
//! Pure functions over an OHLCV slice. Series-valued indicators return a
//! `Vec<f64>` the same length as the input with NaN during warm-up, so the
//! value "as of the last bar" is simply the last element when it is finite.
//!
//! - **Momentum**: RSI, MFI (+ band interpretation)
//! - **Volume**: OBV (+ pressure interpretation), VWAP, volume anomaly
//! - **Trend**: SMA, ADX (+ strength interpretation)

pub mod momentum;
pub mod rolling;
pub mod trend;
pub mod volume;

pub use momentum::*;
pub use rolling::{last_finite, rolling_mean, rolling_std, rolling_sum, RollingWindow};
pub use trend::*;
pub use volume::*;

use crate::OHLCV;

/// Round to 2 decimals.
#[inline]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Close prices of a series.
pub fn closes<T: OHLCV>(bars: &[T]) -> Vec<f64> {
    bars.iter().map(|b| b.close()).collect()
}
