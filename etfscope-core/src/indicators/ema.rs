//! Exponential Moving Average (EMA).
//!
//! Recursive: EMA[t] = EMA[t-1] + alpha * (x[t] - EMA[t-1]), alpha = 2/(span+1).
//! Seed: EMA[span-1] = SMA of the first `span` values.
//! Lookback: span - 1.

use super::{window_mean, Indicator};
use crate::domain::{PriceBar, PriceField};
use crate::error::{require_window, ConfigError};

#[derive(Debug, Clone)]
pub struct Ema {
    span: usize,
    field: PriceField,
    name: String,
}

impl Ema {
    pub fn new(span: usize, field: PriceField) -> Result<Self, ConfigError> {
        require_window("EMA", span)?;
        Ok(Self {
            span,
            field,
            name: format!("ema_{span}"),
        })
    }
}

impl Indicator for Ema {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.span.saturating_sub(1)
    }

    fn compute(&self, bars: &[PriceBar]) -> Vec<f64> {
        ema_of_series(&self.field.extract(bars), self.span)
    }
}

/// EMA of an arbitrary series.
///
/// Leading NaN values are skipped: the seed window starts at the first
/// defined value, so an EMA of a warming-up series (the MACD line) warms up
/// after it. A NaN after the seed taints every later value.
pub fn ema_of_series(values: &[f64], span: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];

    let Some(start) = values.iter().position(|v| !v.is_nan()) else {
        return result;
    };
    if span == 0 || n - start < span {
        return result;
    }

    let seed_window = &values[start..start + span];
    if seed_window.iter().any(|v| v.is_nan()) {
        return result;
    }
    let alpha = 2.0 / (span as f64 + 1.0);
    let mut prev = window_mean(seed_window);
    result[start + span - 1] = prev;

    for i in (start + span)..n {
        if values[i].is_nan() {
            return result;
        }
        prev += alpha * (values[i] - prev);
        result[i] = prev;
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_bars, DEFAULT_EPSILON};

    #[test]
    fn ema_span_1_equals_close() {
        let bars = make_bars(&[100.0, 200.0, 300.0]);
        let result = Ema::new(1, PriceField::Close).unwrap().compute(&bars);
        assert_eq!(result, vec![100.0, 200.0, 300.0]);
    }

    #[test]
    fn ema_3_known_values() {
        // alpha = 0.5, seed at index 2 = SMA(10,11,12) = 11
        // EMA[3] = 11 + 0.5*(13-11) = 12, EMA[4] = 12 + 0.5*(14-12) = 13
        let bars = make_bars(&[10.0, 11.0, 12.0, 13.0, 14.0]);
        let result = Ema::new(3, PriceField::Close).unwrap().compute(&bars);
        assert!(result[0].is_nan());
        assert!(result[1].is_nan());
        assert_approx(result[2], 11.0, DEFAULT_EPSILON);
        assert_approx(result[3], 12.0, DEFAULT_EPSILON);
        assert_approx(result[4], 13.0, DEFAULT_EPSILON);
    }

    #[test]
    fn ema_skips_leading_nan() {
        let values = [f64::NAN, f64::NAN, 2.0, 4.0, 6.0];
        let result = ema_of_series(&values, 2);
        assert!(result[2].is_nan());
        assert_approx(result[3], 3.0, DEFAULT_EPSILON);
        // alpha = 2/3: 3 + 2/3 * (6 - 3) = 5
        assert_approx(result[4], 5.0, DEFAULT_EPSILON);
    }

    #[test]
    fn ema_nan_after_seed_taints_rest() {
        let values = [1.0, 2.0, f64::NAN, 4.0];
        let result = ema_of_series(&values, 2);
        assert_approx(result[1], 1.5, DEFAULT_EPSILON);
        assert!(result[2].is_nan());
        assert!(result[3].is_nan());
    }

    #[test]
    fn ema_constant_series_is_exact() {
        let result = ema_of_series(&[3.7; 40], 12);
        assert!(result[11..].iter().all(|&v| v == 3.7));
    }
}
