//! Batch screening
//!
//! A [`Screener`] runs the pattern gate over many instruments and builds a
//! [`ScreenRecord`] for every match. A ticker that fails validation or is
//! too short is skipped with its reason; it never aborts the batch.
//!
//! # Example
//!
//! ```rust
//! use candlescreen::prelude::*;
//!
//! let screener = ScreenerBuilder::new()
//!     .detector(FourCandleDetector::default().with_trend_gate(TrendGate::prior_uptrend()))
//!     .workers(2)
//!     .build()
//!     .unwrap();
//!
//! let empty: Vec<Bar> = Vec::new();
//! let report = screener.screen(&[Instrument::new("TLKM", &empty)]);
//! assert_eq!(report.skipped.len(), 1);
//! assert_eq!(report.matched(), 0);
//! ```

use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Arc,
};

use chrono::NaiveDate;
use rayon::prelude::*;
use serde::Serialize;

use crate::{
    params::IndicatorOptions,
    pattern::{FourCandleDetector, PatternDetector, PatternMatch},
    snapshot::{compute_indicators_with_benchmark, IndicatorSnapshot},
    validate_series, Result, ScreenError, OHLCV,
};

// ============================================================
// INPUTS
// ============================================================

/// One ticker's history.
#[derive(Debug, Clone)]
pub struct Instrument<'a, T> {
    pub symbol: String,
    pub bars: &'a [T],
    /// Listing board, carried through to the record
    pub board: Option<String>,
}

impl<'a, T: OHLCV> Instrument<'a, T> {
    pub fn new(symbol: impl Into<String>, bars: &'a [T]) -> Self {
        Self {
            symbol: symbol.into(),
            bars,
            board: None,
        }
    }

    pub fn with_board(mut self, board: impl Into<String>) -> Self {
        self.board = Some(board.into());
        self
    }
}

/// Called after each ticker with `(done, total, symbol)`.
pub trait ScreenProgress: Sync {
    fn on_ticker(&self, done: usize, total: usize, symbol: &str);
}

impl<F> ScreenProgress for F
where
    F: Fn(usize, usize, &str) + Sync,
{
    fn on_ticker(&self, done: usize, total: usize, symbol: &str) {
        self(done, total, symbol)
    }
}

struct Silent;

impl ScreenProgress for Silent {
    fn on_ticker(&self, _done: usize, _total: usize, _symbol: &str) {}
}

/// Cooperative cancellation, checked between tickers.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

// ============================================================
// OUTPUTS
// ============================================================

/// A matched ticker with its indicator annotations.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScreenRecord {
    pub symbol: String,
    pub board: Option<String>,
    pub last_close: f64,
    pub snapshot: IndicatorSnapshot,
    pub pattern: PatternMatch,
    /// Nearest first, comma separated
    pub support: String,
    pub resistance: String,
    /// Interior Fibonacci levels, `|` separated
    pub fibonacci: String,
}

/// A ticker that could not be screened.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{symbol}: {error}")]
pub struct ScanError {
    pub symbol: String,
    pub error: ScreenError,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScreenReport {
    /// Matches in input order
    pub records: Vec<ScreenRecord>,
    #[serde(skip)]
    pub skipped: Vec<ScanError>,
    /// Tickers evaluated before completion or cancellation
    pub scanned: usize,
    pub cancelled: bool,
}

impl ScreenReport {
    pub fn matched(&self) -> usize {
        self.records.len()
    }
}

enum Outcome {
    Matched(Box<ScreenRecord>),
    NoMatch,
    Skipped(ScanError),
    Cancelled,
}

// ============================================================
// BUILDER
// ============================================================

/// Builder for [`Screener`]
#[derive(Debug, Clone, Default)]
pub struct ScreenerBuilder {
    detector: FourCandleDetector,
    options: IndicatorOptions,
    benchmark: Option<Vec<f64>>,
    as_of: Option<NaiveDate>,
    workers: Option<usize>,
}

impl ScreenerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn detector(mut self, detector: FourCandleDetector) -> Self {
        self.detector = detector;
        self
    }

    pub fn options(mut self, options: IndicatorOptions) -> Self {
        self.options = options;
        self
    }

    /// Market volume series for the market-relative anomaly rule, aligned so
    /// its last value is the evaluation day.
    pub fn benchmark(mut self, volumes: Vec<f64>) -> Self {
        self.benchmark = Some(volumes);
        self
    }

    /// Ignore bars dated after `date`.
    pub fn as_of(mut self, date: NaiveDate) -> Self {
        self.as_of = Some(date);
        self
    }

    /// Screen on a dedicated pool of `n` threads instead of sequentially.
    pub fn workers(mut self, n: usize) -> Self {
        self.workers = Some(n);
        self
    }

    pub fn build(self) -> Result<Screener> {
        self.options.validate()?;
        self.detector.validate_config()?;
        let pool = match self.workers {
            None => None,
            Some(0) => {
                return Err(ScreenError::InvalidConfig("workers must be at least 1".into()));
            }
            Some(n) => Some(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(n)
                    .thread_name(|i| format!("screener-{i}"))
                    .build()
                    .map_err(|e| ScreenError::InvalidConfig(e.to_string()))?,
            ),
        };
        Ok(Screener {
            detector: self.detector,
            options: self.options,
            benchmark: self.benchmark,
            as_of: self.as_of,
            pool,
        })
    }
}

// ============================================================
// SCREENER
// ============================================================

#[derive(Debug)]
pub struct Screener {
    detector: FourCandleDetector,
    options: IndicatorOptions,
    benchmark: Option<Vec<f64>>,
    as_of: Option<NaiveDate>,
    pool: Option<rayon::ThreadPool>,
}

impl Screener {
    pub fn detector(&self) -> &FourCandleDetector {
        &self.detector
    }

    pub fn options(&self) -> &IndicatorOptions {
        &self.options
    }

    /// Screen every instrument to completion.
    pub fn screen<T: OHLCV + Sync>(&self, instruments: &[Instrument<'_, T>]) -> ScreenReport {
        self.screen_with(instruments, &Silent, &CancelFlag::new())
    }

    /// Screen with a progress callback and a cancellation flag.
    ///
    /// Records keep input order regardless of the worker count.
    pub fn screen_with<T, P>(
        &self,
        instruments: &[Instrument<'_, T>],
        progress: &P,
        cancel: &CancelFlag,
    ) -> ScreenReport
    where
        T: OHLCV + Sync,
        P: ScreenProgress + ?Sized,
    {
        let total = instruments.len();
        let done = AtomicUsize::new(0);
        let run = |instrument: &Instrument<'_, T>| {
            if cancel.is_cancelled() {
                return Outcome::Cancelled;
            }
            let outcome = self.screen_one(instrument);
            let finished = done.fetch_add(1, Ordering::Relaxed) + 1;
            progress.on_ticker(finished, total, &instrument.symbol);
            outcome
        };

        let outcomes: Vec<Outcome> = match &self.pool {
            Some(pool) => pool.install(|| instruments.par_iter().map(run).collect()),
            None => {
                let mut out = Vec::with_capacity(total);
                for instrument in instruments {
                    let outcome = run(instrument);
                    let stop = matches!(outcome, Outcome::Cancelled);
                    out.push(outcome);
                    if stop {
                        break;
                    }
                }
                out
            }
        };

        let mut report = ScreenReport::default();
        for outcome in outcomes {
            match outcome {
                Outcome::Matched(record) => {
                    report.scanned += 1;
                    report.records.push(*record);
                }
                Outcome::NoMatch => report.scanned += 1,
                Outcome::Skipped(error) => {
                    report.scanned += 1;
                    report.skipped.push(error);
                }
                Outcome::Cancelled => report.cancelled = true,
            }
        }

        if report.cancelled {
            tracing::warn!(scanned = report.scanned, total, "screening cancelled");
        }
        tracing::info!(
            scanned = report.scanned,
            matched = report.matched(),
            skipped = report.skipped.len(),
            "screening finished"
        );
        report
    }

    fn screen_one<T: OHLCV>(&self, instrument: &Instrument<'_, T>) -> Outcome {
        match self.evaluate(instrument) {
            Ok(Some(record)) => {
                tracing::debug!(symbol = %instrument.symbol, close = record.last_close, "pattern matched");
                Outcome::Matched(Box::new(record))
            }
            Ok(None) => Outcome::NoMatch,
            Err(error) => {
                tracing::debug!(symbol = %instrument.symbol, %error, "ticker skipped");
                Outcome::Skipped(ScanError {
                    symbol: instrument.symbol.clone(),
                    error,
                })
            }
        }
    }

    fn evaluate<T: OHLCV>(&self, instrument: &Instrument<'_, T>) -> Result<Option<ScreenRecord>> {
        let bars = self.visible(instrument.bars);
        validate_series(bars)?;

        let need = self.detector.min_bars();
        if bars.len() < need {
            return Err(ScreenError::InsufficientData {
                need,
                got: bars.len(),
            });
        }

        let Some(pattern) = self.detector.evaluate(bars).pattern else {
            return Ok(None);
        };
        let snapshot =
            compute_indicators_with_benchmark(bars, self.benchmark.as_deref(), &self.options)?;

        Ok(Some(ScreenRecord {
            symbol: instrument.symbol.clone(),
            board: instrument.board.clone(),
            last_close: snapshot.last_close,
            pattern,
            support: snapshot.levels.format_support(),
            resistance: snapshot.levels.format_resistance(),
            fibonacci: snapshot.levels.format_fibonacci(),
            snapshot,
        }))
    }

    /// Prefix of `bars` dated on or before the evaluation date.
    fn visible<'b, T: OHLCV>(&self, bars: &'b [T]) -> &'b [T] {
        let Some(as_of) = self.as_of else {
            return bars;
        };
        let end = bars
            .iter()
            .position(|b| b.date().is_some_and(|d| d > as_of))
            .unwrap_or(bars.len());
        &bars[..end]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Bar;
    use chrono::Days;

    fn day(i: u64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap() + Days::new(i)
    }

    fn candles(pairs: &[(f64, f64)]) -> Vec<Bar> {
        pairs
            .iter()
            .enumerate()
            .map(|(i, &(o, c))| Bar::new(day(i as u64), o, o.max(c) + 1.0, o.min(c) - 1.0, c, 10_000))
            .collect()
    }

    fn setup() -> Vec<Bar> {
        candles(&[(100.0, 104.0), (103.0, 99.0), (98.0, 96.0), (95.0, 93.0)])
    }

    #[test]
    fn zero_workers_rejected() {
        assert!(matches!(
            ScreenerBuilder::new().workers(0).build(),
            Err(ScreenError::InvalidConfig(_))
        ));
    }

    #[test]
    fn invalid_options_rejected() {
        let options = IndicatorOptions {
            anomaly_std_multiplier: -1.0,
            ..IndicatorOptions::default()
        };
        assert!(ScreenerBuilder::new().options(options).build().is_err());
    }

    #[test]
    fn as_of_hides_later_bars() {
        let mut bars = setup();
        bars.extend(candles(&[(93.0, 97.0)]).into_iter().map(|mut b| {
            b.date = day(4);
            b
        }));
        let instruments = [Instrument::new("ASII", &bars)];

        let latest = ScreenerBuilder::new().build().unwrap().screen(&instruments);
        assert_eq!(latest.matched(), 0);

        let earlier = ScreenerBuilder::new().as_of(day(3)).build().unwrap().screen(&instruments);
        assert_eq!(earlier.matched(), 1);
    }

    #[test]
    fn cancelled_before_start() {
        let bars = setup();
        let cancel = CancelFlag::new();
        cancel.cancel();
        let report = ScreenerBuilder::new().build().unwrap().screen_with(
            &[Instrument::new("BBRI", &bars)],
            &Silent,
            &cancel,
        );
        assert!(report.cancelled);
        assert_eq!(report.scanned, 0);
    }

    #[test]
    fn record_carries_board_and_formatting() {
        let bars = setup();
        let report = ScreenerBuilder::new()
            .build()
            .unwrap()
            .screen(&[Instrument::new("BBCA", &bars).with_board("Main")]);
        let record = &report.records[0];
        assert_eq!(record.board.as_deref(), Some("Main"));
        assert_eq!(record.last_close, 93.0);
        assert_eq!(record.pattern.start_index, 0);
        assert!(record.fibonacci.starts_with("Fib_0.236: "));
    }
}
