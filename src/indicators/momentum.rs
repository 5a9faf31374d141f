//! Momentum oscillators: RSI and MFI.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::rolling::RollingWindow;
use crate::{OHLCVExt, OHLCV};

/// Warm-up policy for rolling averages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarmUp {
    /// Values stay NaN until a full period of deltas is available.
    #[default]
    Strict,
    /// Average whatever deltas exist (`min_periods = 1`).
    Relaxed,
}

/// How money flow is assigned when the typical price does not change.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnchangedFlow {
    /// Half to the positive side, half to the negative side.
    #[default]
    Split,
    /// The full flow counts on both sides.
    Both,
    /// Flow is dropped.
    Ignore,
}

/// MFI value used when the negative-flow sum over the window is zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZeroNegativeFlow {
    /// Money ratio is taken as 1.0, giving MFI = 50.
    #[default]
    NeutralRatio,
    /// MFI = 100 if any positive flow exists, else 50.
    Saturate,
}

/// Relative Strength Index over simple rolling means of gains and losses.
///
/// Index 0 has no delta and is always NaN. Under [`WarmUp::Strict`] the first
/// value appears at index `period`. When the average loss is zero the RSI is
/// 100, which also covers a flat close series.
pub fn rsi<T: OHLCV>(bars: &[T], period: usize, warm_up: WarmUp) -> Vec<f64> {
    let mut out = vec![f64::NAN; bars.len()];
    if period == 0 || bars.len() < 2 {
        return out;
    }

    let mut gains = RollingWindow::new(period);
    let mut losses = RollingWindow::new(period);

    for i in 1..bars.len() {
        let delta = bars[i].close() - bars[i - 1].close();
        gains.push(delta.max(0.0));
        losses.push((-delta).max(0.0));

        if warm_up == WarmUp::Strict && !gains.is_full() {
            continue;
        }
        let (Some(avg_gain), Some(avg_loss)) = (gains.mean(), losses.mean()) else {
            continue;
        };
        out[i] = if avg_loss <= 0.0 {
            100.0
        } else {
            100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
        };
    }

    out
}

/// Money Flow Index.
///
/// Raw flow is typical price times volume; each bar after the first is
/// classified against the previous typical price. A value appears once
/// `period` classified bars exist (index `period`).
pub fn mfi<T: OHLCV>(
    bars: &[T],
    period: usize,
    unchanged: UnchangedFlow,
    zero_negative: ZeroNegativeFlow,
) -> Vec<f64> {
    let mut out = vec![f64::NAN; bars.len()];
    if period == 0 || bars.len() < 2 {
        return out;
    }

    let mut positive = RollingWindow::new(period);
    let mut negative = RollingWindow::new(period);
    let mut prev_tp = bars[0].typical_price();

    for i in 1..bars.len() {
        let tp = bars[i].typical_price();
        let flow = tp * bars[i].volume();

        let (pos, neg) = if tp > prev_tp {
            (flow, 0.0)
        } else if tp < prev_tp {
            (0.0, flow)
        } else {
            match unchanged {
                UnchangedFlow::Split => (flow / 2.0, flow / 2.0),
                UnchangedFlow::Both => (flow, flow),
                UnchangedFlow::Ignore => (0.0, 0.0),
            }
        };
        positive.push(pos);
        negative.push(neg);
        prev_tp = tp;

        if !positive.is_full() {
            continue;
        }

        let pos_sum = positive.sum();
        let neg_sum = negative.sum();
        out[i] = if neg_sum <= 0.0 {
            match zero_negative {
                ZeroNegativeFlow::NeutralRatio => 50.0,
                ZeroNegativeFlow::Saturate if pos_sum > 0.0 => 100.0,
                ZeroNegativeFlow::Saturate => 50.0,
            }
        } else {
            100.0 - 100.0 / (1.0 + pos_sum / neg_sum)
        };
    }

    out
}

/// Qualitative MFI band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MfiSignal {
    Overbought,
    Bullish,
    Neutral,
    Bearish,
    Oversold,
    NotAvailable,
}

impl fmt::Display for MfiSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MfiSignal::Overbought => "Overbought",
            MfiSignal::Bullish => "Bullish",
            MfiSignal::Neutral => "Neutral",
            MfiSignal::Bearish => "Bearish",
            MfiSignal::Oversold => "Oversold",
            MfiSignal::NotAvailable => "N/A",
        })
    }
}

/// Map an MFI value to its band: `>= 80`, `[65, 80)`, `[35, 65)`, `(20, 35)`, `<= 20`.
pub fn interpret_mfi(value: f64) -> MfiSignal {
    match value {
        v if v.is_nan() => MfiSignal::NotAvailable,
        v if v >= 80.0 => MfiSignal::Overbought,
        v if v >= 65.0 => MfiSignal::Bullish,
        v if v >= 35.0 => MfiSignal::Neutral,
        v if v > 20.0 => MfiSignal::Bearish,
        _ => MfiSignal::Oversold,
    }
}
