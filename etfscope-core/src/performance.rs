//! Performance summary and support/resistance levels.
//!
//! Pure functions over a bar history. All percentages are in percent units
//! (12.5 = 12.5%). Degenerate inputs return zeros rather than NaN or inf.

use serde::{Deserialize, Serialize};

use crate::domain::{PriceBar, PriceField};
use crate::error::{require_window, ConfigError};
use crate::indicators::{daily_returns, TRADING_DAYS_PER_YEAR};

/// Default annual risk-free rate (fraction) for the Sharpe ratio.
pub const DEFAULT_RISK_FREE_RATE: f64 = 0.03;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSummary {
    pub total_return: f64,
    pub annualized_return: f64,
    pub annualized_volatility: f64,
    /// Largest peak-to-trough decline, as a non-positive percentage.
    pub max_drawdown: f64,
    pub sharpe_ratio: f64,
    pub trading_days: usize,
}

/// Summarize the return profile of `bars` measured on `field`.
///
/// `risk_free_rate` is an annual fraction; the Sharpe ratio is
/// (annualized_return - rf×100) / annualized_volatility, and 0 when the
/// volatility is 0.
pub fn analyze_performance(
    bars: &[PriceBar],
    field: PriceField,
    risk_free_rate: f64,
) -> PerformanceSummary {
    let prices = field.extract(bars);
    let trading_days = prices.len();
    let returns: Vec<f64> = daily_returns(&prices)
        .into_iter()
        .filter(|r| !r.is_nan())
        .collect();

    let total = total_return(&prices);
    let annualized = annualized_return(total, trading_days);
    let volatility = annualized_volatility(&returns).unwrap_or(0.0);
    let sharpe = if volatility < 1e-12 {
        0.0
    } else {
        (annualized - risk_free_rate * 100.0) / volatility
    };

    PerformanceSummary {
        total_return: total,
        annualized_return: annualized,
        annualized_volatility: volatility,
        max_drawdown: max_drawdown(&returns),
        sharpe_ratio: sharpe,
        trading_days,
    }
}

// ─── Individual metric functions ────────────────────────────────────

/// Percentage change from first to last price. 0 for fewer than two prices.
pub fn total_return(prices: &[f64]) -> f64 {
    match (prices.first(), prices.last()) {
        (Some(&first), Some(&last)) if prices.len() >= 2 && first > 0.0 && last.is_finite() => {
            (last / first - 1.0) * 100.0
        }
        _ => 0.0,
    }
}

/// Compound a total percentage return over `trading_days` to a yearly rate.
///
/// A total loss of 100% or more annualizes to -100%.
pub fn annualized_return(total_return: f64, trading_days: usize) -> f64 {
    if trading_days == 0 {
        return 0.0;
    }
    let growth = 1.0 + total_return / 100.0;
    if growth <= 0.0 {
        return -100.0;
    }
    (growth.powf(TRADING_DAYS_PER_YEAR / trading_days as f64) - 1.0) * 100.0
}

/// Sample std of percentage daily returns × √252.
///
/// `None` when fewer than two returns exist.
pub fn annualized_volatility(daily_returns_pct: &[f64]) -> Option<f64> {
    if daily_returns_pct.len() < 2 {
        return None;
    }
    Some(std_dev(daily_returns_pct) * TRADING_DAYS_PER_YEAR.sqrt())
}

/// Maximum drawdown of the compounded return curve, starting from 1.0.
pub fn max_drawdown(daily_returns_pct: &[f64]) -> f64 {
    let mut equity = 1.0_f64;
    let mut peak = 1.0_f64;
    let mut max_dd = 0.0_f64;
    for r in daily_returns_pct {
        equity *= 1.0 + r / 100.0;
        if equity > peak {
            peak = equity;
        }
        let dd = (equity - peak) / peak * 100.0;
        if dd < max_dd {
            max_dd = dd;
        }
    }
    max_dd
}

pub(crate) fn mean_f64(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

pub(crate) fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let mean = mean_f64(values);
    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}

// ─── Support / resistance ───────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SupportResistance {
    pub support: f64,
    pub resistance: f64,
}

/// Lowest low and highest high over the trailing `window` bars.
///
/// Shorter histories use every bar available; an empty history has no levels.
pub fn find_support_resistance(
    bars: &[PriceBar],
    window: usize,
) -> Result<Option<SupportResistance>, ConfigError> {
    require_window("support/resistance", window)?;
    let tail = &bars[bars.len().saturating_sub(window)..];
    if tail.is_empty() {
        return Ok(None);
    }
    let support = tail.iter().map(|b| b.low).fold(f64::INFINITY, f64::min);
    let resistance = tail.iter().map(|b| b.high).fold(f64::NEG_INFINITY, f64::max);
    Ok(Some(SupportResistance {
        support,
        resistance,
    }))
}
