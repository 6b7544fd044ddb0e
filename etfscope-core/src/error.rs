//! Construction-time validation errors.
//!
//! Short histories and degenerate inputs are never errors: indicators go
//! undefined and sub-signals go neutral. Only explicit, invalid configuration
//! fails, and it fails before any computation runs.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{indicator} window must be >= 1, got {value}")]
    InvalidWindow { indicator: &'static str, value: usize },

    #[error("MACD fast span ({fast}) must be shorter than slow span ({slow})")]
    InvalidPeriods { fast: usize, slow: usize },

    #[error("invalid {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("unknown scoring strategy '{0}' (expected conservative, balanced or aggressive)")]
    UnknownStrategy(String),

    #[error("unknown price field '{0}' (expected open, high, low or close)")]
    UnknownPriceField(String),

    #[error("config parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Reject a zero-length rolling window.
pub(crate) fn require_window(indicator: &'static str, value: usize) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(ConfigError::InvalidWindow { indicator, value });
    }
    Ok(())
}
