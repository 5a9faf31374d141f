//! Indicator options and parameter metadata
//!
//! [`IndicatorOptions`] is the single configuration surface for the indicator
//! library and the level detector. It deserializes with serde (every field
//! has a default) and can also be built from a flat `name -> value` map, the
//! same shape a settings form or a sweep script produces.
//!
//! # Example
//!
//! ```rust
//! use std::collections::HashMap;
//! use candlescreen::params::IndicatorOptions;
//!
//! let mut params = HashMap::new();
//! params.insert("rsi_period", 9.0);
//! params.insert("swing_min_size", 0.03);
//!
//! let options = IndicatorOptions::with_params(&params).unwrap();
//! assert_eq!(options.rsi_period.get(), 9);
//! assert_eq!(options.mfi_period.get(), 14);
//! ```

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{
  indicators::{UnchangedFlow, WarmUp, ZeroNegativeFlow},
  Period, Ratio, Result, ScreenError,
};

// ============================================================
// PARAMETER TYPES
// ============================================================

/// Type of parameter value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
  /// Ratio value in 0.0..=1.0
  Ratio,
  /// Period value (positive integer)
  Period,
  /// Positive real scale factor
  Multiplier,
}

/// Metadata for a single numeric parameter
#[derive(Debug, Clone)]
pub struct ParamMeta {
  /// Parameter name (e.g., "rsi_period")
  pub name: &'static str,
  pub param_type: ParamType,
  pub default: f64,
  /// Accepted range (min, max), inclusive
  pub range: (f64, f64),
  pub description: &'static str,
}

impl ParamMeta {
  pub const fn ratio(
    name: &'static str,
    default: f64,
    range: (f64, f64),
    description: &'static str,
  ) -> Self {
    Self { name, param_type: ParamType::Ratio, default, range, description }
  }

  pub const fn period(
    name: &'static str,
    default: f64,
    range: (f64, f64),
    description: &'static str,
  ) -> Self {
    Self { name, param_type: ParamType::Period, default, range, description }
  }

  pub const fn multiplier(
    name: &'static str,
    default: f64,
    range: (f64, f64),
    description: &'static str,
  ) -> Self {
    Self { name, param_type: ParamType::Multiplier, default, range, description }
  }

  /// Validate a value for this parameter
  pub fn validate(&self, value: f64) -> Result<()> {
    let (min, max) = self.range;
    if value.is_nan() || value < min || value > max {
      return Err(ScreenError::OutOfRange { field: self.name, value, min, max });
    }
    if self.param_type == ParamType::Period && value.fract() != 0.0 {
      return Err(ScreenError::InvalidValue("Period must be a positive integer"));
    }
    Ok(())
  }
}

// ============================================================
// PARAMETERIZED DETECTOR TRAIT
// ============================================================

/// Trait for detectors that expose their thresholds as parameters
pub trait ParameterizedDetector: Sized {
  /// Returns metadata for all configurable parameters
  fn param_meta() -> &'static [ParamMeta];

  /// Creates a detector with parameters from a HashMap
  ///
  /// Missing parameters use their default values.
  fn with_params(params: &HashMap<&str, f64>) -> Result<Self>;

  /// Returns the pattern ID string
  fn pattern_id_str() -> &'static str;
}

// ============================================================
// PARAMETER VALUE HELPERS
// ============================================================

fn lookup(meta: &[ParamMeta], params: &HashMap<&str, f64>, key: &str) -> Result<f64> {
  let entry = meta
    .iter()
    .find(|m| m.name == key)
    .ok_or_else(|| ScreenError::InvalidConfig(format!("no metadata for `{key}`")))?;
  let value = params.get(key).copied().unwrap_or(entry.default);
  entry.validate(value)?;
  Ok(value)
}

/// Helper to get a Ratio from params, validated against `meta`
pub fn get_ratio(meta: &[ParamMeta], params: &HashMap<&str, f64>, key: &str) -> Result<Ratio> {
  Ratio::new(lookup(meta, params, key)?)
}

/// Helper to get a Period from params, validated against `meta`
pub fn get_period(meta: &[ParamMeta], params: &HashMap<&str, f64>, key: &str) -> Result<Period> {
  Period::new(lookup(meta, params, key)? as usize)
}

/// Helper to get a multiplier from params, validated against `meta`
pub fn get_multiplier(meta: &[ParamMeta], params: &HashMap<&str, f64>, key: &str) -> Result<f64> {
  lookup(meta, params, key)
}

/// Reject keys that no parameter in `meta` describes
pub fn reject_unknown(meta: &[ParamMeta], params: &HashMap<&str, f64>) -> Result<()> {
  match params.keys().find(|k| !meta.iter().any(|m| m.name == **k)) {
    Some(key) => Err(ScreenError::InvalidConfig(format!("unknown parameter `{key}`"))),
    None => Ok(()),
  }
}

// ============================================================
// INDICATOR OPTIONS
// ============================================================

/// Configuration for indicator and level computation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorOptions {
  pub rsi_period: Period,
  pub rsi_warm_up: WarmUp,
  pub mfi_period: Period,
  pub mfi_unchanged_flow: UnchangedFlow,
  pub mfi_zero_negative: ZeroNegativeFlow,
  pub adx_period: Period,
  /// Prior OBV values averaged by `interpret_obv`
  pub obv_lookback: Period,
  pub obv_tolerance: Ratio,
  /// Bars preceding the latest one that form the volume baseline
  pub anomaly_window: Period,
  pub anomaly_std_multiplier: f64,
  pub anomaly_market_ratio_threshold: f64,
  pub sustained_multiplier: f64,
  pub sustained_bars: Period,
  pub swing_window: Period,
  pub swing_min_size: Ratio,
  /// Comparison radius for local extrema
  pub min_swing_order: Period,
  pub profile_bins: Period,
  pub profile_window: Period,
  /// Feed the volume-profile point of control into support/resistance
  pub profile_in_levels: bool,
  pub level_count: Period,
}

impl Default for IndicatorOptions {
  fn default() -> Self {
    Self {
      rsi_period: Period::new_const(14),
      rsi_warm_up: WarmUp::Strict,
      mfi_period: Period::new_const(14),
      mfi_unchanged_flow: UnchangedFlow::Split,
      mfi_zero_negative: ZeroNegativeFlow::NeutralRatio,
      adx_period: Period::new_const(14),
      obv_lookback: Period::new_const(10),
      obv_tolerance: Ratio::new_const(0.02),
      anomaly_window: Period::new_const(20),
      anomaly_std_multiplier: 2.0,
      anomaly_market_ratio_threshold: 2.0,
      sustained_multiplier: 1.5,
      sustained_bars: Period::new_const(3),
      swing_window: Period::new_const(60),
      swing_min_size: Ratio::new_const(0.05),
      min_swing_order: Period::new_const(5),
      profile_bins: Period::new_const(20),
      profile_window: Period::new_const(20),
      profile_in_levels: false,
      level_count: Period::new_const(3),
    }
  }
}

const OPTION_PARAMS: &[ParamMeta] = &[
  ParamMeta::period("rsi_period", 14.0, (2.0, 200.0), "RSI averaging period"),
  ParamMeta::period("mfi_period", 14.0, (2.0, 200.0), "MFI summing period"),
  ParamMeta::period("adx_period", 14.0, (2.0, 200.0), "ADX smoothing period"),
  ParamMeta::period("obv_lookback", 10.0, (1.0, 250.0), "Prior OBV values in the trend baseline"),
  ParamMeta::ratio("obv_tolerance", 0.02, (0.0, 1.0), "Relative band around the OBV baseline"),
  ParamMeta::period("anomaly_window", 20.0, (2.0, 250.0), "Volume baseline length"),
  ParamMeta::multiplier(
    "anomaly_std_multiplier",
    2.0,
    (0.1, 50.0),
    "Standard deviations above the baseline mean",
  ),
  ParamMeta::multiplier(
    "anomaly_market_ratio_threshold",
    2.0,
    (0.1, 100.0),
    "Relative volume versus benchmark relative volume",
  ),
  ParamMeta::multiplier("sustained_multiplier", 1.5, (0.1, 10.0), "Baseline multiple per bar"),
  ParamMeta::period("sustained_bars", 3.0, (1.0, 20.0), "Consecutive elevated bars"),
  ParamMeta::period("swing_window", 60.0, (5.0, 1000.0), "Bars searched for swings"),
  ParamMeta::ratio("swing_min_size", 0.05, (0.0, 1.0), "Minimum move between consecutive swings"),
  ParamMeta::period("min_swing_order", 5.0, (1.0, 50.0), "Extremum comparison radius"),
  ParamMeta::period("profile_bins", 20.0, (1.0, 500.0), "Volume-profile histogram bins"),
  ParamMeta::period("profile_window", 20.0, (1.0, 1000.0), "Bars in the volume profile"),
  ParamMeta::period("level_count", 3.0, (1.0, 20.0), "Support/resistance entries kept per side"),
];

impl IndicatorOptions {
  /// Returns metadata for all numeric options
  pub fn param_meta() -> &'static [ParamMeta] {
    OPTION_PARAMS
  }

  /// Build options from a flat map. Missing keys take defaults, unknown keys
  /// are rejected. Enum and flag options keep their defaults.
  pub fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
    let meta = Self::param_meta();
    reject_unknown(meta, params)?;
    let options = Self {
      rsi_period: get_period(meta, params, "rsi_period")?,
      mfi_period: get_period(meta, params, "mfi_period")?,
      adx_period: get_period(meta, params, "adx_period")?,
      obv_lookback: get_period(meta, params, "obv_lookback")?,
      obv_tolerance: get_ratio(meta, params, "obv_tolerance")?,
      anomaly_window: get_period(meta, params, "anomaly_window")?,
      anomaly_std_multiplier: get_multiplier(meta, params, "anomaly_std_multiplier")?,
      anomaly_market_ratio_threshold: get_multiplier(
        meta,
        params,
        "anomaly_market_ratio_threshold",
      )?,
      sustained_multiplier: get_multiplier(meta, params, "sustained_multiplier")?,
      sustained_bars: get_period(meta, params, "sustained_bars")?,
      swing_window: get_period(meta, params, "swing_window")?,
      swing_min_size: get_ratio(meta, params, "swing_min_size")?,
      min_swing_order: get_period(meta, params, "min_swing_order")?,
      profile_bins: get_period(meta, params, "profile_bins")?,
      profile_window: get_period(meta, params, "profile_window")?,
      level_count: get_period(meta, params, "level_count")?,
      ..Self::default()
    };
    options.validate()?;
    Ok(options)
  }

  /// Numeric options by metadata name
  fn numeric_values(&self) -> [(&'static str, f64); 16] {
    [
      ("rsi_period", self.rsi_period.get() as f64),
      ("mfi_period", self.mfi_period.get() as f64),
      ("adx_period", self.adx_period.get() as f64),
      ("obv_lookback", self.obv_lookback.get() as f64),
      ("obv_tolerance", self.obv_tolerance.get()),
      ("anomaly_window", self.anomaly_window.get() as f64),
      ("anomaly_std_multiplier", self.anomaly_std_multiplier),
      ("anomaly_market_ratio_threshold", self.anomaly_market_ratio_threshold),
      ("sustained_multiplier", self.sustained_multiplier),
      ("sustained_bars", self.sustained_bars.get() as f64),
      ("swing_window", self.swing_window.get() as f64),
      ("swing_min_size", self.swing_min_size.get()),
      ("min_swing_order", self.min_swing_order.get() as f64),
      ("profile_bins", self.profile_bins.get() as f64),
      ("profile_window", self.profile_window.get() as f64),
      ("level_count", self.level_count.get() as f64),
    ]
  }

  /// Check every numeric option against its [`ParamMeta`] range, then the
  /// cross-field constraints.
  ///
  /// Serde only guarantees the newtype invariants, so deserialized options
  /// should pass through here before use.
  pub fn validate(&self) -> Result<()> {
    for (name, value) in self.numeric_values() {
      let meta = OPTION_PARAMS
        .iter()
        .find(|m| m.name == name)
        .ok_or_else(|| ScreenError::InvalidConfig(format!("no metadata for `{name}`")))?;
      meta.validate(value)?;
    }
    if self.swing_window.get() <= 2 * self.min_swing_order.get() {
      return Err(ScreenError::InvalidConfig(format!(
        "swing_window {} cannot hold an extremum of order {}",
        self.swing_window.get(),
        self.min_swing_order.get()
      )));
    }
    Ok(())
  }
}

// ============================================================
// TESTS
// ============================================================
