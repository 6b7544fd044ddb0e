//! Rolling annualized volatility of daily returns.
//!
//! vol[t] = sample std of the last `window` daily returns × √252, in percent
//! (the returns are already percentages). Lookback: window.

use super::{daily_returns, rolling_std, Indicator, TRADING_DAYS_PER_YEAR};
use crate::domain::{PriceBar, PriceField};
use crate::error::{require_window, ConfigError};

#[derive(Debug, Clone)]
pub struct RollingVolatility {
    window: usize,
    field: PriceField,
    name: String,
}

impl RollingVolatility {
    pub fn new(window: usize, field: PriceField) -> Result<Self, ConfigError> {
        require_window("volatility", window)?;
        Ok(Self {
            window,
            field,
            name: format!("volatility_{window}"),
        })
    }
}

impl Indicator for RollingVolatility {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.window
    }

    fn compute(&self, bars: &[PriceBar]) -> Vec<f64> {
        let returns = daily_returns(&self.field.extract(bars));
        let scale = TRADING_DAYS_PER_YEAR.sqrt();
        rolling_std(&returns, self.window)
            .into_iter()
            .map(|s| s * scale)
            .collect()
    }
}
