//! Incremental sliding-window statistics.
//!
//! Every push is O(1): the window keeps a running sum plus a Welford M2
//! accumulator that is updated in place when the oldest value is replaced.
//! A count of non-zero entries lets an all-zero window report an exact zero
//! sum, which the ratio indicators rely on for their zero-denominator rules.

use std::collections::VecDeque;

/// Fixed-capacity window of the most recent values.
#[derive(Debug, Clone)]
pub struct RollingWindow {
    period: usize,
    values: VecDeque<f64>,
    sum: f64,
    mean: f64,
    m2: f64,
    nonzero: usize,
}

impl RollingWindow {
    pub fn new(period: usize) -> Self {
        let period = period.max(1);
        Self {
            period,
            values: VecDeque::with_capacity(period),
            sum: 0.0,
            mean: 0.0,
            m2: 0.0,
            nonzero: 0,
        }
    }

    /// Push a value, evicting the oldest one once the window is full.
    pub fn push(&mut self, value: f64) {
        if value != 0.0 {
            self.nonzero += 1;
        }
        if self.values.len() < self.period {
            self.values.push_back(value);
            self.sum += value;
            let n = self.values.len() as f64;
            let delta = value - self.mean;
            self.mean += delta / n;
            self.m2 += delta * (value - self.mean);
            return;
        }

        let Some(old) = self.values.pop_front() else {
            return;
        };
        if old != 0.0 {
            self.nonzero -= 1;
        }
        self.values.push_back(value);
        self.sum += value - old;

        let n = self.period as f64;
        let old_mean = self.mean;
        self.mean = old_mean + (value - old) / n;
        self.m2 += (value - old) * (value - self.mean + old - old_mean);
        // Rounding can push M2 fractionally below zero on flat input.
        if self.m2 < 0.0 {
            self.m2 = 0.0;
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.values.len() == self.period
    }

    #[inline]
    pub fn period(&self) -> usize {
        self.period
    }

    pub fn sum(&self) -> f64 {
        if self.nonzero == 0 {
            0.0
        } else {
            self.sum
        }
    }

    pub fn mean(&self) -> Option<f64> {
        if self.values.is_empty() {
            None
        } else if self.nonzero == 0 {
            Some(0.0)
        } else {
            Some(self.mean)
        }
    }

    /// Sample standard deviation (n - 1). Needs at least two values.
    pub fn std_dev(&self) -> Option<f64> {
        let n = self.values.len();
        (n >= 2).then(|| (self.m2 / (n - 1) as f64).sqrt())
    }
}

fn rolling_map(
    values: &[f64],
    period: usize,
    min_periods: usize,
    stat: impl Fn(&RollingWindow) -> Option<f64>,
) -> Vec<f64> {
    let min_periods = min_periods.clamp(1, period.max(1));
    let mut window = RollingWindow::new(period);
    values
        .iter()
        .map(|&v| {
            window.push(v);
            if window.len() >= min_periods {
                stat(&window).unwrap_or(f64::NAN)
            } else {
                f64::NAN
            }
        })
        .collect()
}

/// Rolling mean; positions with fewer than `min_periods` values are NaN.
pub fn rolling_mean(values: &[f64], period: usize, min_periods: usize) -> Vec<f64> {
    rolling_map(values, period, min_periods, RollingWindow::mean)
}

/// Rolling sum; positions with fewer than `min_periods` values are NaN.
pub fn rolling_sum(values: &[f64], period: usize, min_periods: usize) -> Vec<f64> {
    rolling_map(values, period, min_periods, |w| Some(w.sum()))
}

/// Rolling sample standard deviation.
pub fn rolling_std(values: &[f64], period: usize, min_periods: usize) -> Vec<f64> {
    rolling_map(values, period, min_periods, RollingWindow::std_dev)
}

/// Last value of a series if it is finite.
#[inline]
pub fn last_finite(values: &[f64]) -> Option<f64> {
    values.last().copied().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn naive_std(values: &[f64]) -> f64 {
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0)).sqrt()
    }

    #[test]
    fn window_matches_naive_recomputation() {
        let values: Vec<f64> = (0..200)
            .map(|i| ((i * 37 + 11) % 97) as f64 * 1_000.0 + 5e6)
            .collect();
        let period = 20;
        let mut window = RollingWindow::new(period);
        for (i, &v) in values.iter().enumerate() {
            window.push(v);
            if i + 1 >= period {
                let slice = &values[i + 1 - period..=i];
                let mean = slice.iter().sum::<f64>() / period as f64;
                assert!((window.mean().unwrap() - mean).abs() < 1e-6);
                assert!((window.sum() - slice.iter().sum::<f64>()).abs() < 1e-3);
                assert!((window.std_dev().unwrap() - naive_std(slice)).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn flat_input_has_zero_std() {
        let mut window = RollingWindow::new(5);
        for _ in 0..50 {
            window.push(12_345_678.0);
        }
        assert_eq!(window.std_dev(), Some(0.0));
    }

    #[test]
    fn all_zero_window_sums_to_exact_zero() {
        let mut window = RollingWindow::new(3);
        for v in [1e9 / 3.0, 7e8 / 7.0, 0.1, 0.0, 0.0, 0.0] {
            window.push(v);
        }
        assert_eq!(window.sum(), 0.0);
        assert_eq!(window.mean(), Some(0.0));
    }

    #[test]
    fn min_periods_controls_warm_up() {
        let values = [1.0, 2.0, 3.0, 4.0];
        let strict = rolling_mean(&values, 3, 3);
        assert!(strict[0].is_nan() && strict[1].is_nan());
        assert_eq!(strict[2], 2.0);
        assert_eq!(strict[3], 3.0);

        let relaxed = rolling_mean(&values, 3, 1);
        assert_eq!(relaxed[0], 1.0);
        assert_eq!(relaxed[1], 1.5);
    }

    #[test]
    fn std_needs_two_values() {
        let out = rolling_std(&[4.0, 6.0], 5, 1);
        assert!(out[0].is_nan());
        assert!((out[1] - 2f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn last_finite_skips_nan_tail() {
        assert_eq!(last_finite(&[1.0, 2.0]), Some(2.0));
        assert_eq!(last_finite(&[1.0, f64::NAN]), None);
        assert_eq!(last_finite(&[]), None);
    }
}
