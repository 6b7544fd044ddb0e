//! True Range and Average True Range (ATR).
//!
//! True Range: max(high-low, |high-prev_close|, |low-prev_close|).
//! The first bar of a series has no previous close and uses high-low.
//! ATR here is the plain mean of the trailing `period` true ranges.

use super::window_mean;
use crate::domain::PriceBar;

/// True Range series, same length as `bars`.
pub fn true_range(bars: &[PriceBar]) -> Vec<f64> {
    bars.iter()
        .enumerate()
        .map(|(i, bar)| {
            let range = bar.high - bar.low;
            match i.checked_sub(1).map(|p| bars[p].close) {
                Some(pc) => range.max((bar.high - pc).abs()).max((bar.low - pc).abs()),
                None => range,
            }
        })
        .collect()
}

/// Mean true range over the last `period` bars.
///
/// `None` when fewer than `period` bars exist or any range is undefined.
pub fn average_true_range(bars: &[PriceBar], period: usize) -> Option<f64> {
    if period == 0 || bars.len() < period {
        return None;
    }
    let tr = true_range(bars);
    let tail = &tr[tr.len() - period..];
    if tail.iter().any(|v| v.is_nan()) {
        return None;
    }
    Some(window_mean(tail))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_bars, DEFAULT_EPSILON};

    #[test]
    fn true_range_first_bar_is_high_low() {
        let bars = make_bars(&[10.0, 11.0]);
        let tr = true_range(&bars);
        assert_approx(tr[0], 0.2, DEFAULT_EPSILON);
        // open 10, close 11 → high 11.1, low 9.9, prev close 10
        assert_approx(tr[1], 1.2, DEFAULT_EPSILON);
    }

    #[test]
    fn true_range_gap_uses_prev_close() {
        let mut bars = make_bars(&[10.0, 10.0]);
        bars[1].high = 12.0;
        bars[1].low = 11.5;
        bars[1].open = 11.6;
        bars[1].close = 11.8;
        let tr = true_range(&bars);
        // high - prev_close = 2.0 beats low - prev_close = 1.5 and high - low = 0.5
        assert_approx(tr[1], 2.0, DEFAULT_EPSILON);
    }

    #[test]
    fn atr_requires_full_period() {
        let closes: Vec<f64> = (0..13).map(|i| 10.0 + i as f64 * 0.1).collect();
        assert!(average_true_range(&make_bars(&closes), 14).is_none());

        let closes: Vec<f64> = (0..14).map(|i| 10.0 + i as f64 * 0.1).collect();
        assert!(average_true_range(&make_bars(&closes), 14).is_some());
    }

    #[test]
    fn atr_of_steady_series() {
        // each later bar: high = close + 0.1, low = prev close - 0.1 → TR 0.3
        let closes: Vec<f64> = (0..20).map(|i| 10.0 + i as f64 * 0.1).collect();
        let atr = average_true_range(&make_bars(&closes), 14).unwrap();
        assert_approx(atr, 0.3, 1e-9);
    }
}
