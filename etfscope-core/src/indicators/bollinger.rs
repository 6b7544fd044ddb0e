//! Bollinger Bands.
//!
//! Middle = SMA(window), Upper/Lower = Middle ± num_std × rolling sample std.
//! Lookback: window - 1.

use super::{rolling_mean, rolling_std};
use crate::domain::{PriceBar, PriceField};
use crate::error::{require_window, ConfigError};

#[derive(Debug, Clone, PartialEq)]
pub struct BollingerLines {
    pub upper: Vec<f64>,
    pub middle: Vec<f64>,
    pub lower: Vec<f64>,
}

#[derive(Debug, Clone)]
pub struct Bollinger {
    window: usize,
    num_std: f64,
    field: PriceField,
}

impl Bollinger {
    pub fn new(window: usize, num_std: f64, field: PriceField) -> Result<Self, ConfigError> {
        require_window("Bollinger", window)?;
        if !num_std.is_finite() || num_std <= 0.0 {
            return Err(ConfigError::InvalidParameter {
                name: "bollinger_std",
                reason: format!("must be a positive number, got {num_std}"),
            });
        }
        Ok(Self {
            window,
            num_std,
            field,
        })
    }

    pub fn lookback(&self) -> usize {
        self.window.saturating_sub(1)
    }

    pub fn compute(&self, bars: &[PriceBar]) -> BollingerLines {
        let prices = self.field.extract(bars);
        let middle = rolling_mean(&prices, self.window);
        let std = rolling_std(&prices, self.window);

        let upper = middle
            .iter()
            .zip(&std)
            .map(|(m, s)| m + self.num_std * s)
            .collect();
        let lower = middle
            .iter()
            .zip(&std)
            .map(|(m, s)| m - self.num_std * s)
            .collect();

        BollingerLines {
            upper,
            middle,
            lower,
        }
    }
}
