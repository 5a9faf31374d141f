//! # candlescreen - four-candle setup screener
//!
//! Screens instruments for a bullish-then-three-bearish four-candle setup and
//! annotates every match with momentum, volume, trend and support/resistance
//! indicators computed as of the last bar.
//!
//! ## Quick Start
//!
//! ```rust
//! use candlescreen::prelude::*;
//! use chrono::{Days, NaiveDate};
//!
//! let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
//! let candles = [(100.0, 104.0), (103.0, 99.0), (98.0, 96.0), (95.0, 93.0)];
//! let bars: Vec<Bar> = candles
//!     .iter()
//!     .enumerate()
//!     .map(|(i, &(o, c))| {
//!         let date = start + Days::new(i as u64);
//!         Bar::new(date, o, o.max(c) + 1.0, o.min(c) - 1.0, c, 10_000)
//!     })
//!     .collect();
//!
//! assert!(detect_pattern(&bars));
//!
//! let screener = ScreenerBuilder::new().build().unwrap();
//! let report = screener.screen(&[Instrument::new("BBCA", &bars)]);
//! assert_eq!(report.matched(), 1);
//! ```

pub mod indicators;
pub mod levels;
pub mod params;
pub mod pattern;
pub mod screener;
pub mod snapshot;

pub mod prelude {
    pub use crate::{
        // Indicators
        indicators::{
            adx, calculate_vwap, detect_volume_anomaly, interpret_adx, interpret_mfi,
            interpret_obv, mfi, obv, rsi, sma, vwap, AdxSeries, AnomalyKind, AnomalyTriggers,
            MfiSignal, ObvTrend, RollingWindow, TrendStrength, UnchangedFlow, VolumeAnomaly, WarmUp,
            ZeroNegativeFlow,
        },
        // Levels
        levels::{
            calculate_fibonacci_levels, calculate_support_resistance,
            identify_significant_swings, nearest_psychological_level, volume_profile,
            FibonacciLevels, LevelSet, SwingRange, SwingSource, VolumeProfile,
        },
        // Configuration
        params::{IndicatorOptions, ParamMeta, ParamType, ParameterizedDetector},
        // Pattern
        pattern::{
            detect_pattern, FourCandleDetector, PatternDetector, PatternId, PatternMatch,
            PatternResult, TrendGate,
        },
        // Orchestration
        screener::{
            CancelFlag, Instrument, ScanError, ScreenProgress, ScreenRecord, ScreenReport,
            Screener, ScreenerBuilder,
        },
        snapshot::{
            compute_indicators, compute_indicators_with_benchmark, compute_support_resistance,
            IndicatorSnapshot,
        },
        // Core types
        validate_series, Bar, OHLCVExt, Period, Ratio, Result, ScreenError, OHLCV,
    };
}

use chrono::NaiveDate;

// ============================================================
// ERRORS
// ============================================================

pub type Result<T> = std::result::Result<T, ScreenError>;

/// Errors raised by configuration and series validation.
///
/// Indicator computations never return these; they degrade to `None` or a
/// documented sentinel instead.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScreenError {
    #[error("Invalid value: {0}")]
    InvalidValue(&'static str),

    #[error("{field} = {value} out of range [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Insufficient data: need {need} bars, got {got}")]
    InsufficientData { need: usize, got: usize },

    #[error("Invalid OHLCV at index {index}: {reason}")]
    InvalidOHLCV { index: usize, reason: &'static str },

    #[error("Bar at index {index} is not dated after its predecessor")]
    OutOfOrder { index: usize },
}

// ============================================================
// VALIDATED TYPES
// ============================================================

/// Normalized value in range 0.0..=1.0
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Ratio(f64);

impl Ratio {
    /// Create a new Ratio, validating the value is in [0.0, 1.0]
    pub fn new(value: f64) -> Result<Self> {
        if value.is_nan() || value.is_infinite() {
            return Err(ScreenError::InvalidValue("Ratio cannot be NaN or infinite"));
        }
        if !(0.0..=1.0).contains(&value) {
            return Err(ScreenError::OutOfRange {
                field: "Ratio",
                value,
                min: 0.0,
                max: 1.0,
            });
        }
        Ok(Self(value))
    }

    #[doc(hidden)]
    pub const fn new_const(value: f64) -> Self {
        Self(value)
    }

    #[inline]
    pub fn get(self) -> f64 {
        self.0
    }
}

impl serde::Serialize for Ratio {
    fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        self.0.serialize(s)
    }
}

impl<'de> serde::Deserialize<'de> for Ratio {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        let value = f64::deserialize(d)?;
        Ratio::new(value).map_err(serde::de::Error::custom)
    }
}

/// Period (must be > 0)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Period(usize);

impl Period {
    /// Create a new Period, validating value is > 0
    pub fn new(value: usize) -> Result<Self> {
        if value == 0 {
            return Err(ScreenError::InvalidValue("Period must be > 0"));
        }
        Ok(Self(value))
    }

    #[doc(hidden)]
    pub const fn new_const(value: usize) -> Self {
        Self(value)
    }

    #[inline]
    pub fn get(self) -> usize {
        self.0
    }
}

impl serde::Serialize for Period {
    fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        self.0.serialize(s)
    }
}

impl<'de> serde::Deserialize<'de> for Period {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        let value = usize::deserialize(d)?;
        Period::new(value).map_err(serde::de::Error::custom)
    }
}

// ============================================================
// OHLCV TRAITS
// ============================================================

/// Core OHLCV data trait
pub trait OHLCV {
    fn open(&self) -> f64;
    fn high(&self) -> f64;
    fn low(&self) -> f64;
    fn close(&self) -> f64;
    fn volume(&self) -> f64;

    /// Trading day of the bar. Series without dates skip ordering checks
    /// and cannot be cut at an evaluation date.
    fn date(&self) -> Option<NaiveDate> {
        None
    }
}

/// Extension trait with computed properties for OHLCV data
pub trait OHLCVExt: OHLCV {
    #[inline]
    fn body(&self) -> f64 {
        (self.close() - self.open()).abs()
    }

    #[inline]
    fn range(&self) -> f64 {
        self.high() - self.low()
    }

    #[inline]
    fn is_bullish(&self) -> bool {
        self.close() > self.open()
    }

    #[inline]
    fn is_bearish(&self) -> bool {
        self.close() < self.open()
    }

    /// Signed body relative to the open. Returns None if open ≈ 0
    #[inline]
    fn body_pct(&self) -> Option<f64> {
        let open = self.open();
        (open.abs() > f64::EPSILON).then(|| (self.close() - open) / open)
    }

    /// (high + low + close) / 3
    #[inline]
    fn typical_price(&self) -> f64 {
        (self.high() + self.low() + self.close()) / 3.0
    }

    /// Validate OHLCV data consistency
    fn validate(&self) -> Result<()> {
        let prices = [self.open(), self.high(), self.low(), self.close()];
        if prices.iter().any(|p| p.is_nan()) {
            return Err(ScreenError::InvalidOHLCV {
                index: 0,
                reason: "NaN in OHLCV",
            });
        }
        if prices.iter().any(|p| p.is_infinite()) {
            return Err(ScreenError::InvalidOHLCV {
                index: 0,
                reason: "Infinite value in OHLCV",
            });
        }
        if prices.iter().any(|&p| p <= 0.0) {
            return Err(ScreenError::InvalidOHLCV {
                index: 0,
                reason: "non-positive price",
            });
        }
        if self.high() < self.open().max(self.close()) {
            return Err(ScreenError::InvalidOHLCV {
                index: 0,
                reason: "high below body",
            });
        }
        if self.low() > self.open().min(self.close()) {
            return Err(ScreenError::InvalidOHLCV {
                index: 0,
                reason: "low above body",
            });
        }
        let volume = self.volume();
        if !volume.is_finite() || volume < 0.0 {
            return Err(ScreenError::InvalidOHLCV {
                index: 0,
                reason: "negative or non-finite volume",
            });
        }
        Ok(())
    }
}

impl<T: OHLCV> OHLCVExt for T {}

/// Validate every bar of a series and, when dates are present, that they
/// strictly increase.
pub fn validate_series<T: OHLCV>(bars: &[T]) -> Result<()> {
    let mut previous: Option<NaiveDate> = None;
    for (i, bar) in bars.iter().enumerate() {
        bar.validate().map_err(|e| match e {
            ScreenError::InvalidOHLCV { reason, .. } => ScreenError::InvalidOHLCV { index: i, reason },
            other => other,
        })?;
        if let (Some(prev), Some(date)) = (previous, bar.date()) {
            if date <= prev {
                return Err(ScreenError::OutOfOrder { index: i });
            }
        }
        previous = bar.date().or(previous);
    }
    Ok(())
}

// ============================================================
// BAR
// ============================================================

/// Daily OHLCV bar as delivered by the market-data collaborator.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

impl Bar {
    pub fn new(date: NaiveDate, open: f64, high: f64, low: f64, close: f64, volume: u64) -> Self {
        Self {
            date,
            open,
            high,
            low,
            close,
            volume,
        }
    }
}

impl OHLCV for Bar {
    fn open(&self) -> f64 {
        self.open
    }

    fn high(&self) -> f64 {
        self.high
    }

    fn low(&self) -> f64 {
        self.low
    }

    fn close(&self) -> f64 {
        self.close
    }

    fn volume(&self) -> f64 {
        self.volume as f64
    }

    fn date(&self) -> Option<NaiveDate> {
        Some(self.date)
    }
}

// ============================================================
// TESTS
// ============================================================
