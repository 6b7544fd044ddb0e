//! Simple Moving Average (SMA).
//!
//! Rolling mean of one price column over a lookback window.
//! Lookback: period - 1 (first valid value at index period-1).

use super::{rolling_mean, Indicator};
use crate::domain::{PriceBar, PriceField};
use crate::error::{require_window, ConfigError};

#[derive(Debug, Clone)]
pub struct Sma {
    period: usize,
    field: PriceField,
    name: String,
}

impl Sma {
    pub fn new(period: usize, field: PriceField) -> Result<Self, ConfigError> {
        require_window("SMA", period)?;
        Ok(Self {
            period,
            field,
            name: format!("ma_{period}"),
        })
    }

    pub fn period(&self) -> usize {
        self.period
    }
}

impl Indicator for Sma {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period.saturating_sub(1)
    }

    fn compute(&self, bars: &[PriceBar]) -> Vec<f64> {
        rolling_mean(&self.field.extract(bars), self.period)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_bars, DEFAULT_EPSILON};

    #[test]
    fn sma_5_basic() {
        let bars = make_bars(&[10.0, 11.0, 12.0, 13.0, 14.0, 15.0, 16.0]);
        let result = Sma::new(5, PriceField::Close).unwrap().compute(&bars);

        assert_eq!(result.len(), 7);
        for (i, v) in result.iter().enumerate().take(4) {
            assert!(v.is_nan(), "expected NaN at index {i}");
        }
        assert_approx(result[4], 12.0, DEFAULT_EPSILON);
        assert_approx(result[5], 13.0, DEFAULT_EPSILON);
        assert_approx(result[6], 14.0, DEFAULT_EPSILON);
    }

    #[test]
    fn sma_1_is_close() {
        let bars = make_bars(&[100.0, 200.0, 300.0]);
        let result = Sma::new(1, PriceField::Close).unwrap().compute(&bars);
        assert_eq!(result, vec![100.0, 200.0, 300.0]);
    }

    #[test]
    fn sma_reads_selected_column() {
        let bars = make_bars(&[10.0, 12.0, 14.0]);
        let result = Sma::new(2, PriceField::High).unwrap().compute(&bars);
        // highs: 10.1, 12.1, 14.1
        assert_approx(result[1], 11.1, DEFAULT_EPSILON);
        assert_approx(result[2], 13.1, DEFAULT_EPSILON);
    }

    #[test]
    fn sma_too_few_bars() {
        let bars = make_bars(&[10.0, 11.0]);
        let result = Sma::new(5, PriceField::Close).unwrap().compute(&bars);
        assert!(result.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn sma_zero_period_rejected() {
        assert!(matches!(
            Sma::new(0, PriceField::Close),
            Err(ConfigError::InvalidWindow { value: 0, .. })
        ));
    }

    #[test]
    fn sma_lookback() {
        assert_eq!(Sma::new(20, PriceField::Close).unwrap().lookback(), 19);
        assert_eq!(Sma::new(1, PriceField::Close).unwrap().lookback(), 0);
    }
}
