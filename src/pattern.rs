//! Four-candle pullback pattern
//!
//! One bullish candle followed by three bearish candles closing successively
//! lower, inside an uptrend. The trend gate is pluggable:
//!
//! - [`TrendGate::FourBarSlope`]: the 4th close is below the 1st (needs 4 bars)
//! - [`TrendGate::PriorUptrend`]: the mean close of the recent bars is above
//!   the mean close of the bars before them (needs `recent + prior` bars)

use std::{collections::HashMap, ops::Range};

use serde::{Deserialize, Serialize};

use crate::{
    params::{get_ratio, reject_unknown, ParamMeta, ParameterizedDetector},
    OHLCVExt, Ratio, Result, ScreenError, OHLCV,
};

// ============================================================
// PATTERN MATCH
// ============================================================

/// Unique identifier for a pattern type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct PatternId(pub &'static str);

impl PatternId {
    #[inline]
    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

/// Details of a matched window - Copy, no allocations
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PatternMatch {
    pub pattern_id: PatternId,
    pub start_index: usize,
    pub end_index: usize,
    /// Body of the bullish candle relative to its open
    pub body_ratio: f64,
    /// Drop from the bullish close to the last close, relative
    pub pullback: f64,
}

/// Outcome of evaluating the latest window of a series
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PatternResult {
    pub matched: bool,
    pub window: Option<Range<usize>>,
    pub pattern: Option<PatternMatch>,
}

impl From<Option<PatternMatch>> for PatternResult {
    fn from(found: Option<PatternMatch>) -> Self {
        match found {
            Some(m) => Self {
                matched: true,
                window: Some(m.start_index..m.end_index + 1),
                pattern: Some(m),
            },
            None => Self::default(),
        }
    }
}

// ============================================================
// DETECTOR TRAIT
// ============================================================

/// Pattern detector over any OHLCV slice
pub trait PatternDetector: Send + Sync {
    fn id(&self) -> PatternId;

    /// Bars needed before `detect` can succeed
    fn min_bars(&self) -> usize;

    /// Check the pattern ending at `index`
    fn detect<T: OHLCV>(&self, bars: &[T], index: usize) -> Option<PatternMatch>;

    fn validate_config(&self) -> Result<()> {
        Ok(())
    }
}

// ============================================================
// TREND GATE
// ============================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendGate {
    /// Last close of the window below the first
    #[default]
    FourBarSlope,
    /// Mean close of the last `recent` bars above that of the `prior` bars before them
    PriorUptrend { recent: usize, prior: usize },
}

impl TrendGate {
    pub const fn prior_uptrend() -> Self {
        TrendGate::PriorUptrend {
            recent: 20,
            prior: 30,
        }
    }

    fn min_bars(&self) -> usize {
        match *self {
            TrendGate::FourBarSlope => 4,
            TrendGate::PriorUptrend { recent, prior } => (recent + prior).max(4),
        }
    }

    fn passes<T: OHLCV>(&self, bars: &[T], index: usize) -> bool {
        match *self {
            TrendGate::FourBarSlope => bars[index].close() < bars[index - 3].close(),
            TrendGate::PriorUptrend { recent, prior } => {
                let end = index + 1;
                let Some(split) = end.checked_sub(recent) else {
                    return false;
                };
                let Some(start) = split.checked_sub(prior) else {
                    return false;
                };
                mean_close(&bars[split..end]) > mean_close(&bars[start..split])
            }
        }
    }
}

fn mean_close<T: OHLCV>(bars: &[T]) -> f64 {
    bars.iter().map(|b| b.close()).sum::<f64>() / bars.len() as f64
}

// ============================================================
// FOUR-CANDLE DETECTOR
// ============================================================

/// Bullish candle, then three lower bearish closes.
#[derive(Debug, Clone, PartialEq)]
pub struct FourCandleDetector {
    /// Minimum (close - open) / open of the bullish candle
    pub min_body_ratio: Ratio,
    pub trend_gate: TrendGate,
}

impl Default for FourCandleDetector {
    fn default() -> Self {
        Self {
            min_body_ratio: Ratio::new_const(0.02),
            trend_gate: TrendGate::FourBarSlope,
        }
    }
}

impl FourCandleDetector {
    pub fn with_trend_gate(mut self, gate: TrendGate) -> Self {
        self.trend_gate = gate;
        self
    }

    /// Evaluate the window ending at the last bar.
    pub fn evaluate<T: OHLCV>(&self, bars: &[T]) -> PatternResult {
        match bars.len().checked_sub(1) {
            Some(last) if bars.len() >= self.min_bars() => self.detect(bars, last).into(),
            _ => PatternResult::default(),
        }
    }
}

impl PatternDetector for FourCandleDetector {
    fn id(&self) -> PatternId {
        PatternId("FOUR_CANDLE_PULLBACK")
    }

    fn min_bars(&self) -> usize {
        self.trend_gate.min_bars()
    }

    fn detect<T: OHLCV>(&self, bars: &[T], index: usize) -> Option<PatternMatch> {
        if index < 3 || index >= bars.len() {
            return None;
        }
        let c1 = &bars[index - 3];
        let c2 = &bars[index - 2];
        let c3 = &bars[index - 1];
        let c4 = &bars[index];

        let body_ratio = c1.body_pct()?;
        if !c1.is_bullish() || body_ratio < self.min_body_ratio.get() {
            return None;
        }
        if !c2.is_bearish() || c2.close() >= c1.close() {
            return None;
        }
        if !c3.is_bearish() || !c4.is_bearish() {
            return None;
        }
        if !self.trend_gate.passes(bars, index) {
            return None;
        }
        if !(c2.close() > c3.close() && c3.close() > c4.close()) {
            return None;
        }

        Some(PatternMatch {
            pattern_id: self.id(),
            start_index: index - 3,
            end_index: index,
            body_ratio,
            pullback: (c1.close() - c4.close()) / c1.close(),
        })
    }

    fn validate_config(&self) -> Result<()> {
        if let TrendGate::PriorUptrend { recent, prior } = self.trend_gate {
            if recent == 0 || prior == 0 {
                return Err(ScreenError::InvalidConfig(
                    "prior-uptrend gate needs non-empty recent and prior windows".into(),
                ));
            }
        }
        Ok(())
    }
}

static FOUR_CANDLE_PARAMS: &[ParamMeta] = &[ParamMeta::ratio(
    "min_body_ratio",
    0.02,
    (0.0, 0.2),
    "Minimum body of the bullish candle relative to its open",
)];

impl ParameterizedDetector for FourCandleDetector {
    fn param_meta() -> &'static [ParamMeta] {
        FOUR_CANDLE_PARAMS
    }

    fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
        reject_unknown(FOUR_CANDLE_PARAMS, params)?;
        Ok(Self {
            min_body_ratio: get_ratio(FOUR_CANDLE_PARAMS, params, "min_body_ratio")?,
            ..Self::default()
        })
    }

    fn pattern_id_str() -> &'static str {
        "FOUR_CANDLE_PULLBACK"
    }
}

/// True when the last four bars form the pattern under default settings.
pub fn detect_pattern<T: OHLCV>(bars: &[T]) -> bool {
    FourCandleDetector::default().evaluate(bars).matched
}

// ============================================================
// TESTS
// ============================================================
