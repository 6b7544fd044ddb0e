//! Analysis configuration — indicator windows and performance parameters.
//!
//! Every field has a default, so an empty TOML document is valid. Values
//! that are given explicitly are validated, never silently replaced.

use serde::{Deserialize, Serialize};

use crate::domain::PriceField;
use crate::error::{require_window, ConfigError};

/// Windows the MA-cross rule and the technical score read.
pub const REQUIRED_MA_WINDOWS: [usize; 2] = [5, 20];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisConfig {
    pub price_field: PriceField,
    pub ma_windows: Vec<usize>,
    pub rsi_period: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub bollinger_window: usize,
    pub bollinger_std: f64,
    pub volatility_window: usize,
    pub support_window: usize,
    /// Annual risk-free rate as a fraction (0.03 = 3%).
    pub risk_free_rate: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            price_field: PriceField::Close,
            ma_windows: vec![5, 10, 20, 60],
            rsi_period: 14,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            bollinger_window: 20,
            bollinger_std: 2.0,
            volatility_window: 20,
            support_window: 20,
            risk_free_rate: 0.03,
        }
    }
}

impl AnalysisConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for &w in &self.ma_windows {
            require_window("moving average", w)?;
        }
        for required in REQUIRED_MA_WINDOWS {
            if !self.ma_windows.contains(&required) {
                return Err(ConfigError::InvalidParameter {
                    name: "ma_windows",
                    reason: format!("must include {required} (used by the MA-cross signal)"),
                });
            }
        }
        require_window("RSI", self.rsi_period)?;
        require_window("MACD fast", self.macd_fast)?;
        require_window("MACD slow", self.macd_slow)?;
        require_window("MACD signal", self.macd_signal)?;
        if self.macd_fast >= self.macd_slow {
            return Err(ConfigError::InvalidPeriods {
                fast: self.macd_fast,
                slow: self.macd_slow,
            });
        }
        require_window("Bollinger", self.bollinger_window)?;
        if !self.bollinger_std.is_finite() || self.bollinger_std <= 0.0 {
            return Err(ConfigError::InvalidParameter {
                name: "bollinger_std",
                reason: format!("must be a positive number, got {}", self.bollinger_std),
            });
        }
        require_window("volatility", self.volatility_window)?;
        require_window("support/resistance", self.support_window)?;
        if !self.risk_free_rate.is_finite() || self.risk_free_rate < 0.0 {
            return Err(ConfigError::InvalidParameter {
                name: "risk_free_rate",
                reason: format!("must be a non-negative fraction, got {}", self.risk_free_rate),
            });
        }
        Ok(())
    }
}
