//! Fibonacci retracement levels.

use serde::ser::{Serialize, SerializeMap, Serializer};

/// Retracement ratios, shallowest first.
pub const FIB_RATIOS: [f64; 7] = [0.0, 0.236, 0.382, 0.5, 0.618, 0.786, 1.0];

const FIB_LABELS: [&str; 7] = [
    "Fib_0.0", "Fib_0.236", "Fib_0.382", "Fib_0.5", "Fib_0.618", "Fib_0.786", "Fib_1.0",
];

/// Prices at each ratio of a high/low range, non-increasing with the ratio.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FibonacciLevels {
    high: f64,
    low: f64,
    prices: [f64; 7],
}

/// Retracements measured down from `high` toward `low`.
///
/// Arguments are reordered if given inverted. Level 0.0 is exactly the high
/// and level 1.0 exactly the low. A non-finite bound gives all-NaN levels.
pub fn calculate_fibonacci_levels(high: f64, low: f64) -> FibonacciLevels {
    if !(high.is_finite() && low.is_finite()) {
        return FibonacciLevels {
            high,
            low,
            prices: [f64::NAN; 7],
        };
    }
    let (hi, lo) = if high >= low { (high, low) } else { (low, high) };
    let span = hi - lo;
    let mut prices = [0.0; 7];
    let mut floor = hi;
    for (price, ratio) in prices.iter_mut().zip(FIB_RATIOS) {
        let level = (hi - ratio * span).clamp(lo, hi).min(floor);
        *price = level;
        floor = level;
    }
    prices[0] = hi;
    prices[6] = lo;
    FibonacciLevels {
        high: hi,
        low: lo,
        prices,
    }
}

impl FibonacciLevels {
    pub fn high(&self) -> f64 {
        self.high
    }

    pub fn low(&self) -> f64 {
        self.low
    }

    /// Price at one of [`FIB_RATIOS`].
    pub fn get(&self, ratio: f64) -> Option<f64> {
        FIB_RATIOS
            .iter()
            .position(|r| (r - ratio).abs() < 1e-9)
            .map(|i| self.prices[i])
    }

    /// `(ratio, price)` pairs from 0.0 to 1.0.
    pub fn iter(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        FIB_RATIOS.iter().copied().zip(self.prices.iter().copied())
    }

    /// `("Fib_0.236", price)` pairs for display.
    pub fn labelled(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        FIB_LABELS.iter().copied().zip(self.prices.iter().copied())
    }
}

impl Serialize for FibonacciLevels {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        let mut map = s.serialize_map(Some(FIB_LABELS.len()))?;
        for (label, price) in self.labelled() {
            map.serialize_entry(label, &price)?;
        }
        map.end()
    }
}
