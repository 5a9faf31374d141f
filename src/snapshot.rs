//! Indicator snapshot as of the last bar of a series.

use serde::Serialize;

use crate::{
    indicators::{
        adx, detect_volume_anomaly, interpret_adx, interpret_mfi, interpret_obv, last_finite,
        mfi, obv, round2, rsi, MfiSignal, ObvTrend, TrendStrength, VolumeAnomaly,
    },
    levels::{
        calculate_support_resistance, calculate_support_resistance_with, LevelCandidates, LevelSet,
    },
    params::IndicatorOptions,
    Result, ScreenError, OHLCV,
};

/// Everything reported alongside a match. Values that cannot be computed
/// from the available history are `None`, never zero or NaN.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorSnapshot {
    pub last_close: f64,
    pub volume: f64,
    pub ma20: Option<f64>,
    pub ma50: Option<f64>,
    pub rsi: Option<f64>,
    pub mfi: Option<f64>,
    pub mfi_signal: MfiSignal,
    pub obv: Option<f64>,
    pub obv_trend: ObvTrend,
    pub adx: Option<f64>,
    pub trend_strength: TrendStrength,
    pub vwap: Option<f64>,
    pub volume_anomaly: VolumeAnomaly,
    /// Point of control of the recent volume profile
    pub volume_profile_level: Option<f64>,
    pub levels: LevelSet,
}

/// Compute the snapshot without a market benchmark.
pub fn compute_indicators<T: OHLCV>(
    bars: &[T],
    options: &IndicatorOptions,
) -> Result<IndicatorSnapshot> {
    compute_indicators_with_benchmark(bars, None, options)
}

/// Compute the snapshot; `benchmark` is the market's volume series aligned to
/// the same dates and only feeds the market-relative anomaly rule.
///
/// # Errors
/// `InsufficientData` for an empty series.
pub fn compute_indicators_with_benchmark<T: OHLCV>(
    bars: &[T],
    benchmark: Option<&[f64]>,
    options: &IndicatorOptions,
) -> Result<IndicatorSnapshot> {
    let Some(last) = bars.last() else {
        return Err(ScreenError::InsufficientData { need: 1, got: 0 });
    };
    let candidates = LevelCandidates::from_series(bars, options);

    let rsi_value = last_finite(&rsi(bars, options.rsi_period.get(), options.rsi_warm_up));
    let mfi_value = last_finite(&mfi(
        bars,
        options.mfi_period.get(),
        options.mfi_unchanged_flow,
        options.mfi_zero_negative,
    ));
    let obv_series = obv(bars);
    let adx_value = adx(bars, options.adx_period.get()).last_adx();

    let snapshot = IndicatorSnapshot {
        last_close: round2(last.close()),
        volume: last.volume(),
        ma20: candidates.ma20.map(round2),
        ma50: candidates.ma50.map(round2),
        rsi: rsi_value.map(round2),
        mfi: mfi_value.map(round2),
        mfi_signal: mfi_value.map_or(MfiSignal::NotAvailable, interpret_mfi),
        obv: last_finite(&obv_series),
        obv_trend: interpret_obv(
            &obv_series,
            options.obv_lookback.get(),
            options.obv_tolerance.get(),
        ),
        adx: adx_value.map(round2),
        trend_strength: adx_value.map_or(TrendStrength::Unavailable, interpret_adx),
        vwap: candidates.vwap.map(round2),
        volume_anomaly: detect_volume_anomaly(bars, benchmark, options),
        volume_profile_level: candidates.volume_poc.map(round2),
        levels: calculate_support_resistance_with(bars, &candidates, options)?,
    };
    tracing::trace!(
        close = snapshot.last_close,
        rsi = ?snapshot.rsi,
        anomaly = snapshot.volume_anomaly.is_anomaly,
        "indicator snapshot"
    );
    Ok(snapshot)
}

/// Support, resistance and Fibonacci levels for the latest bar.
pub fn compute_support_resistance<T: OHLCV>(
    bars: &[T],
    options: &IndicatorOptions,
) -> Result<LevelSet> {
    calculate_support_resistance(bars, options)
}
