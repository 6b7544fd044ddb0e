//! Relative Strength Index (RSI).
//!
//! Average gain and average loss are simple rolling means of the last
//! `period` price changes. RSI = 100 - 100 / (1 + avg_gain / avg_loss).
//! Lookback: period (the first change needs a previous bar).
//! Edge cases: no gains and no losses → 50; no losses → 100.

use super::{rolling_mean, Indicator};
use crate::domain::{PriceBar, PriceField};
use crate::error::{require_window, ConfigError};

#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
    field: PriceField,
    name: String,
}

impl Rsi {
    pub fn new(period: usize, field: PriceField) -> Result<Self, ConfigError> {
        require_window("RSI", period)?;
        Ok(Self {
            period,
            field,
            name: format!("rsi_{period}"),
        })
    }
}

impl Indicator for Rsi {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn compute(&self, bars: &[PriceBar]) -> Vec<f64> {
        let prices = self.field.extract(bars);
        let n = prices.len();
        let mut result = vec![f64::NAN; n];
        if n < self.period + 1 {
            return result;
        }

        let changes: Vec<f64> = prices.windows(2).map(|w| w[1] - w[0]).collect();
        let gains: Vec<f64> = changes
            .iter()
            .map(|&c| if c.is_nan() { f64::NAN } else { c.max(0.0) })
            .collect();
        let losses: Vec<f64> = changes
            .iter()
            .map(|&c| if c.is_nan() { f64::NAN } else { (-c).max(0.0) })
            .collect();

        let avg_gain = rolling_mean(&gains, self.period);
        let avg_loss = rolling_mean(&losses, self.period);

        // changes[j] sits between bars j and j+1
        for j in (self.period - 1)..changes.len() {
            if avg_gain[j].is_nan() || avg_loss[j].is_nan() {
                continue;
            }
            result[j + 1] = rsi_from_averages(avg_gain[j], avg_loss[j]);
        }
        result
    }
}

/// RSI from average gain/loss with explicit zero-denominator rules.
pub fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 && avg_gain == 0.0 {
        50.0
    } else if avg_loss == 0.0 {
        100.0
    } else {
        100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_bars, DEFAULT_EPSILON};

    fn rsi(period: usize, closes: &[f64]) -> Vec<f64> {
        Rsi::new(period, PriceField::Close)
            .unwrap()
            .compute(&make_bars(closes))
    }

    #[test]
    fn rsi_all_gains_is_100() {
        let result = rsi(3, &[100.0, 101.0, 102.0, 103.0, 104.0, 105.0]);
        assert!(result[..3].iter().all(|v| v.is_nan()));
        assert!(result[3..].iter().all(|&v| v == 100.0));
    }

    #[test]
    fn rsi_all_losses_is_0() {
        let result = rsi(3, &[105.0, 104.0, 103.0, 102.0, 101.0]);
        assert!(result[3..].iter().all(|&v| v == 0.0));
    }

    #[test]
    fn rsi_flat_is_50() {
        let result = rsi(3, &[10.0; 6]);
        assert!(result[3..].iter().all(|&v| v == 50.0));
    }

    #[test]
    fn rsi_known_value() {
        // changes: +2, -1, +1 → avg_gain 1, avg_loss 1/3, RS = 3, RSI = 75
        let result = rsi(3, &[10.0, 12.0, 11.0, 12.0]);
        assert_approx(result[3], 75.0, DEFAULT_EPSILON);
    }

    #[test]
    fn rsi_uses_simple_rolling_mean() {
        // window slides: changes +2, -1, +1, -2 → last window (-1, +1, -2)
        // avg_gain 1/3, avg_loss 1, RS = 1/3, RSI = 25
        let result = rsi(3, &[10.0, 12.0, 11.0, 12.0, 10.0]);
        assert_approx(result[4], 25.0, DEFAULT_EPSILON);
    }

    #[test]
    fn rsi_needs_period_plus_one_bars() {
        let result = rsi(14, &[10.0; 14]);
        assert!(result.iter().all(|v| v.is_nan()));
        let result = rsi(14, &[10.0; 15]);
        assert_eq!(result[14], 50.0);
    }

    #[test]
    fn rsi_zero_period_rejected() {
        assert!(Rsi::new(0, PriceField::Close).is_err());
    }
}
