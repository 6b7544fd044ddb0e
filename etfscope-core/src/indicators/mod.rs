//! Indicator implementations.
//!
//! Every indicator is a pure function of the bar history: a full series in,
//! a same-length `Vec<f64>` out, with `f64::NAN` marking bars where there is
//! not yet enough history. Values at index `i` only read bars `0..=i`.
//!
//! Multi-line indicators (MACD, Bollinger) expose a struct computing all of
//! their lines in one pass; single-line indicators implement [`Indicator`].

pub mod atr;
pub mod bollinger;
pub mod ema;
pub mod macd;
pub mod returns;
pub mod rsi;
pub mod sma;
pub mod volatility;

pub use atr::{average_true_range, true_range};
pub use bollinger::{Bollinger, BollingerLines};
pub use ema::{ema_of_series, Ema};
pub use macd::{Macd, MacdLines};
pub use returns::{cumulative_returns, daily_returns};
pub use rsi::Rsi;
pub use sma::Sma;
pub use volatility::RollingVolatility;

use crate::domain::PriceBar;

/// Trading sessions per year used for annualization.
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Single-series indicator.
///
/// `compute` returns a vector of the same length as `bars`. The first
/// `lookback()` values are `f64::NAN`.
pub trait Indicator: Send + Sync {
    /// Human-readable name (e.g., "sma_20", "rsi_14").
    fn name(&self) -> &str;

    /// Number of leading bars without a defined value.
    fn lookback(&self) -> usize;

    fn compute(&self, bars: &[PriceBar]) -> Vec<f64>;
}

/// Map the NaN warmup marker to `None`.
pub fn defined(value: f64) -> Option<f64> {
    if value.is_nan() {
        None
    } else {
        Some(value)
    }
}

/// Value at `index`, or `None` when out of range or undefined.
pub fn value_at(values: &[f64], index: usize) -> Option<f64> {
    values.get(index).copied().and_then(defined)
}

/// Final value of a series, if defined.
pub fn last_value(values: &[f64]) -> Option<f64> {
    values.last().copied().and_then(defined)
}

// ─── Windowed statistics ────────────────────────────────────────────

/// Mean of a window, shifted by its first element.
///
/// Accumulating deviations rather than raw values keeps a constant window
/// exactly equal to that constant.
pub(crate) fn window_mean(window: &[f64]) -> f64 {
    let anchor = window[0];
    let shift: f64 = window.iter().map(|v| v - anchor).sum();
    anchor + shift / window.len() as f64
}

/// Sample standard deviation (n - 1 denominator). Zero for fewer than two values.
pub(crate) fn window_std(window: &[f64]) -> f64 {
    let n = window.len();
    if n < 2 {
        return 0.0;
    }
    let mean = window_mean(window);
    let ss: f64 = window.iter().map(|v| (v - mean).powi(2)).sum();
    (ss / (n - 1) as f64).sqrt()
}

/// Rolling mean over `window` values. Windows containing NaN yield NaN.
pub fn rolling_mean(values: &[f64], window: usize) -> Vec<f64> {
    rolling(values, window, window_mean)
}

/// Rolling sample standard deviation over `window` values.
pub fn rolling_std(values: &[f64], window: usize) -> Vec<f64> {
    rolling(values, window, window_std)
}

fn rolling(values: &[f64], window: usize, stat: fn(&[f64]) -> f64) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];
    if window == 0 || n < window {
        return result;
    }
    for i in (window - 1)..n {
        let slice = &values[(i + 1 - window)..=i];
        if slice.iter().any(|v| v.is_nan()) {
            continue;
        }
        result[i] = stat(slice);
    }
    result
}

/// Create synthetic bars from close prices for testing.
///
/// open = previous close (or close for the first bar),
/// high = max(open, close) + 0.1, low = min(open, close) - 0.1,
/// volume = 1000, amount = volume × close.
#[cfg(test)]
pub fn make_bars(closes: &[f64]) -> Vec<PriceBar> {
    let base_date = chrono::NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            PriceBar {
                date: base_date + chrono::Duration::days(i as i64),
                open,
                high: open.max(close) + 0.1,
                low: open.min(close) - 0.1,
                close,
                volume: 1000.0,
                amount: 1000.0 * close,
            }
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_window_mean_is_exact() {
        let values = vec![0.1; 20];
        let means = rolling_mean(&values, 20);
        assert_eq!(means[19], 0.1);
        assert_eq!(rolling_std(&values, 20)[19], 0.0);
    }

    #[test]
    fn rolling_std_is_sample_std() {
        // mean 2.5, squared deviations 2.25+0.25+0.25+2.25 = 5, / 3
        let result = rolling_std(&[1.0, 2.0, 3.0, 4.0], 4);
        assert_approx(result[3], (5.0f64 / 3.0).sqrt(), DEFAULT_EPSILON);
    }

    #[test]
    fn rolling_window_longer_than_series_is_all_nan() {
        let result = rolling_mean(&[1.0, 2.0, 3.0], 5);
        assert!(result.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn nan_inside_window_poisons_only_that_window() {
        let result = rolling_mean(&[1.0, f64::NAN, 3.0, 4.0, 5.0], 2);
        assert!(result[1].is_nan());
        assert!(result[2].is_nan());
        assert_approx(result[3], 3.5, DEFAULT_EPSILON);
    }

    #[test]
    fn value_helpers_map_nan_to_none() {
        let values = [f64::NAN, 2.0];
        assert_eq!(value_at(&values, 0), None);
        assert_eq!(value_at(&values, 1), Some(2.0));
        assert_eq!(value_at(&values, 5), None);
        assert_eq!(last_value(&values), Some(2.0));
        assert_eq!(last_value(&[]), None);
    }
}
