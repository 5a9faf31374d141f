//! Benchmarks for indicator computation and batch screening.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
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

/// Deterministic bars ending in the four-candle setup
fn generate_bars(n: usize) -> Vec<TestBar> {
  let mut bars = Vec::with_capacity(n + 4);
  let mut price = 100.0;

  for i in 0..n {
    let change = ((i * 7 + 13) % 100) as f64 / 50.0 - 1.0; // Deterministic "random"
    let volatility = 2.0 + ((i * 3) % 10) as f64 / 5.0;

    let o = price;
    let c = (price + change).max(10.0);
    let h = o.max(c) + volatility * 0.5;
    let l = o.min(c) - volatility * 0.5;
    let v = 10_000.0 + ((i * 11) % 17) as f64 * 500.0;

    bars.push(TestBar { o, h, l, c, v });
    price = c;
  }

  for (o, c) in [(1.0, 1.04), (1.03, 0.99), (0.98, 0.96), (0.95, 0.93)] {
    let (o, c) = (o * price, c * price);
    bars.push(TestBar { o, h: o.max(c) + 0.5, l: o.min(c) - 0.5, c, v: 20_000.0 });
  }

  bars
}

fn bench_detect_pattern(c: &mut Criterion) {
  let bars = generate_bars(250);

  c.bench_function("detect_pattern_250_bars", |b| {
    b.iter(|| black_box(detect_pattern(black_box(&bars))))
  });
}

fn bench_indicators(c: &mut Criterion) {
  let options = IndicatorOptions::default();
  let mut group = c.benchmark_group("compute_indicators");

  for size in [60, 250, 1000, 5000].iter() {
    let bars = generate_bars(*size);

    group.bench_with_input(BenchmarkId::new("snapshot", size), size, |b, _| {
      b.iter(|| {
        let _ = black_box(compute_indicators(black_box(&bars), &options));
      })
    });
  }

  group.finish();
}

fn bench_screen(c: &mut Criterion) {
  let series: Vec<Vec<TestBar>> = (0..200).map(|i| generate_bars(200 + i)).collect();
  let instruments: Vec<Instrument<'_, TestBar>> = series
    .iter()
    .enumerate()
    .map(|(i, bars)| Instrument::new(format!("SYM{i}"), bars))
    .collect();

  let sequential = ScreenerBuilder::new().build().unwrap();
  let pooled = ScreenerBuilder::new().workers(4).build().unwrap();

  let mut group = c.benchmark_group("screen_200_instruments");
  group.bench_function("sequential", |b| {
    b.iter(|| black_box(sequential.screen(black_box(&instruments))))
  });
  group.bench_function("workers_4", |b| b.iter(|| black_box(pooled.screen(black_box(&instruments)))));
  group.finish();
}

criterion_group!(benches, bench_detect_pattern, bench_indicators, bench_screen);

criterion_main!(benches);
