//! Integration tests for the indicator library and level detector.

use std::collections::HashMap;

use candlescreen::prelude::*;

/// Simple test bar structure
#[derive(Debug, Clone, Copy)]
struct TestBar {
    o: f64,
    h: f64,
    l: f64,
    c: f64,
    v: f64,
}

impl TestBar {
    fn new(o: f64, h: f64, l: f64, c: f64, v: f64) -> Self {
        Self { o, h, l, c, v }
    }
}

impl OHLCV for TestBar {
    fn open(&self) -> f64 {
        self.o
    }

    fn high(&self) -> f64 {
        self.h
    }

    fn low(&self) -> f64 {
        self.l
    }

    fn close(&self) -> f64 {
        self.c
    }

    fn volume(&self) -> f64 {
        self.v
    }
}

/// Generate uptrend bars
fn make_uptrend(n: usize) -> Vec<TestBar> {
    (0..n)
        .map(|i| {
            let base = 100.0 + (i as f64) * 2.0;
            TestBar::new(base - 0.5, base + 1.5, base - 1.5, base + 1.0, 10_000.0)
        })
        .collect()
}

/// Generate sideways bars
fn make_flat(n: usize) -> Vec<TestBar> {
    (0..n)
        .map(|_| TestBar::new(100.0, 102.0, 98.0, 100.0, 10_000.0))
        .collect()
}

// ============================================================
// MOMENTUM
// ============================================================

#[test]
fn test_rsi_flat_is_100() {
    let out = rsi(&make_flat(30), 14, WarmUp::Strict);
    assert!(out[..14].iter().all(|v| v.is_nan()));
    assert!(out[14..].iter().all(|&v| v == 100.0));
}

#[test]
fn test_rsi_relaxed_starts_early() {
    let out = rsi(&make_uptrend(10), 14, WarmUp::Relaxed);
    assert!(out[0].is_nan());
    assert!(out[1..].iter().all(|&v| v == 100.0));
}

#[test]
fn test_mfi_all_rising_is_finite() {
    let out = mfi(
        &make_uptrend(30),
        14,
        UnchangedFlow::Split,
        ZeroNegativeFlow::NeutralRatio,
    );
    assert!(out[14..].iter().all(|v| v.is_finite()));
    assert_eq!(interpret_mfi(out[29]), MfiSignal::Neutral);

    let saturated = mfi(
        &make_uptrend(30),
        14,
        UnchangedFlow::Split,
        ZeroNegativeFlow::Saturate,
    );
    assert_eq!(saturated[29], 100.0);
    assert_eq!(interpret_mfi(saturated[29]), MfiSignal::Overbought);
}

// ============================================================
// VOLUME & TREND
// ============================================================

#[test]
fn test_obv_flat_is_constant() {
    let out = obv(&make_flat(25));
    assert!(out.iter().all(|&v| v == 10_000.0));
    assert_eq!(interpret_obv(&out, 10, 0.02), ObvTrend::Neutral);
}

#[test]
fn test_obv_uptrend_is_buying_pressure() {
    let out = obv(&make_uptrend(25));
    assert_eq!(interpret_obv(&out, 10, 0.02), ObvTrend::BuyingPressure);
}

#[test]
fn test_adx_bands() {
    let strong = adx(&make_uptrend(60), 14);
    assert_eq!(interpret_adx(strong.last_adx().unwrap()), TrendStrength::Strong);

    let weak = adx(&make_flat(60), 14);
    assert_eq!(interpret_adx(weak.last_adx().unwrap()), TrendStrength::Weak);

    let short = adx(&make_flat(20), 14);
    assert_eq!(short.last_adx(), None);
    assert_eq!(interpret_adx(f64::NAN), TrendStrength::Unavailable);
}

#[test]
fn test_sma_and_vwap() {
    let closes: Vec<f64> = (1..=25).map(f64::from).collect();
    let ma = sma(&closes, 20);
    assert!(ma[18].is_nan());
    assert_eq!(ma[19], 10.5);
    assert_eq!(ma[24], 15.5);

    let bars = make_flat(5);
    assert!(vwap(&bars).iter().all(|&v| v == 100.0));
}

#[test]
fn test_volume_anomaly_needs_window() {
    let options = IndicatorOptions::default();
    let bars = make_flat(20);
    assert!(!detect_volume_anomaly(&bars, None, &options).evaluated);

    let mut bars = make_flat(21);
    bars[20].v = 100_000.0;
    bars[20].c = 110.0;
    bars[20].h = 111.0;
    let verdict = detect_volume_anomaly(&bars, None, &options);
    assert!(verdict.is_anomaly);
    assert_eq!(verdict.kind, Some(AnomalyKind::Breakout));
    assert_eq!(verdict.ratio, 10.0);
}

// ============================================================
// LEVELS
// ============================================================

#[test]
fn test_rising_series_swing_uses_window_extremes() {
    let bars = make_uptrend(40);
    let swing = identify_significant_swings(&bars, 60, 0.05, 5).unwrap();
    assert_eq!(swing.low_source, SwingSource::WindowExtreme);
    assert_eq!(swing.low, 98.5);
    assert_eq!(swing.high, bars[39].h);
}

#[test]
fn test_fibonacci_levels() {
    let fib = calculate_fibonacci_levels(150.0, 100.0);
    assert_eq!(fib.get(0.0), Some(150.0));
    assert_eq!(fib.get(0.5), Some(125.0));
    assert_eq!(fib.get(1.0), Some(100.0));
}

#[test]
fn test_support_resistance_bracket_close() {
    let bars: Vec<TestBar> = (0..120)
        .map(|i| {
            let wave = ((i as f64) / 6.0).sin() * 12.0;
            let c = 300.0 + wave + i as f64 * 0.1;
            TestBar::new(c - 0.5, c + 2.0, c - 2.0, c, 40_000.0 + (i % 5) as f64 * 1_000.0)
        })
        .collect();
    let levels = compute_support_resistance(&bars, &IndicatorOptions::default()).unwrap();
    let close = bars[119].c;
    assert_eq!(levels.close, close);
    assert!(levels.support.len() <= 3 && levels.resistance.len() <= 3);
    assert!(levels.support.iter().all(|&s| s < close));
    assert!(levels.resistance.iter().all(|&r| r > close));
}

#[test]
fn test_nearest_psychological_level() {
    assert_eq!(nearest_psychological_level(740.0), Some(500.0));
    assert_eq!(nearest_psychological_level(760.0), Some(1_000.0));
    assert_eq!(nearest_psychological_level(750.0), Some(500.0));
}

#[test]
fn test_volume_profile_point_of_control() {
    let mut bars = make_flat(10);
    bars[3].c = 101.5;
    bars[3].v = 1_000_000.0;
    let profile = volume_profile(&bars, 4).unwrap();
    // 98..102 in bins of 1.0; the heavy close sits in the last bin
    assert_eq!(profile.point_of_control(), Some(101.5));
}

// ============================================================
// CONFIGURATION
// ============================================================

#[test]
fn test_options_from_params() {
    let mut params = HashMap::new();
    params.insert("rsi_period", 9.0);
    params.insert("level_count", 2.0);
    let options = IndicatorOptions::with_params(&params).unwrap();
    assert_eq!(options.rsi_period.get(), 9);
    assert_eq!(options.level_count.get(), 2);

    params.insert("rsi_period", 0.0);
    assert!(IndicatorOptions::with_params(&params).is_err());
}

#[test]
fn test_detector_param_meta() {
    let meta = FourCandleDetector::param_meta();
    assert_eq!(meta.len(), 1);
    assert_eq!(meta[0].name, "min_body_ratio");
    assert_eq!(meta[0].param_type, ParamType::Ratio);
    assert_eq!(FourCandleDetector::pattern_id_str(), "FOUR_CANDLE_PULLBACK");
}
