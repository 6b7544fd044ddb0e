//! Moving Average Convergence Divergence (MACD).
//!
//! MACD = EMA(fast) - EMA(slow); Signal = EMA(MACD, signal span);
//! Histogram = MACD - Signal.
//! The MACD line is defined from index slow-1, Signal and Histogram from
//! index slow+signal-2.

use super::ema_of_series;
use crate::domain::{PriceBar, PriceField};
use crate::error::{require_window, ConfigError};

/// The three MACD lines, each the same length as the input.
#[derive(Debug, Clone, PartialEq)]
pub struct MacdLines {
    pub macd: Vec<f64>,
    pub signal: Vec<f64>,
    pub histogram: Vec<f64>,
}

#[derive(Debug, Clone)]
pub struct Macd {
    fast: usize,
    slow: usize,
    signal: usize,
    field: PriceField,
}

impl Macd {
    pub fn new(fast: usize, slow: usize, signal: usize, field: PriceField) -> Result<Self, ConfigError> {
        require_window("MACD fast", fast)?;
        require_window("MACD slow", slow)?;
        require_window("MACD signal", signal)?;
        if fast >= slow {
            return Err(ConfigError::InvalidPeriods { fast, slow });
        }
        Ok(Self {
            fast,
            slow,
            signal,
            field,
        })
    }

    /// Bars before the Signal line is defined.
    pub fn lookback(&self) -> usize {
        self.slow + self.signal - 2
    }

    pub fn compute(&self, bars: &[PriceBar]) -> MacdLines {
        let prices = self.field.extract(bars);
        let fast = ema_of_series(&prices, self.fast);
        let slow = ema_of_series(&prices, self.slow);

        let macd: Vec<f64> = fast.iter().zip(&slow).map(|(f, s)| f - s).collect();
        let signal = ema_of_series(&macd, self.signal);
        let histogram = macd.iter().zip(&signal).map(|(m, s)| m - s).collect();

        MacdLines {
            macd,
            signal,
            histogram,
        }
    }
}
