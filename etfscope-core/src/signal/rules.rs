//! Per-indicator voting rules.
//!
//! Every rule is a pure function of a few readings taken at the last bar(s)
//! and returns a [`SubSignal`]. Missing readings vote neutral.

use super::SubSignal;
use crate::indicators::window_mean;

/// Bars the trend rule looks back over.
pub const TREND_WINDOW: usize = 20;
/// Bars averaged for the recent-volume side of the volume ratio.
pub const RECENT_VOLUME_BARS: usize = 5;

/// A fast/slow line pair at one bar: (MA5, MA20) or (MACD, Signal).
pub type LinePair = (f64, f64);

/// MA5 vs MA20 at the last two bars.
///
/// A cross needs both bars defined; with only the last bar defined the
/// rule falls back to plain alignment.
pub fn ma_cross(prev: Option<LinePair>, now: Option<LinePair>) -> SubSignal {
    let Some((fast, slow)) = now else {
        return SubSignal::neutral();
    };
    if let Some((prev_fast, prev_slow)) = prev {
        if prev_fast <= prev_slow && fast > slow {
            return SubSignal::bullish(1.0);
        }
        if prev_fast >= prev_slow && fast < slow {
            return SubSignal::bearish(-1.0);
        }
    }
    if fast > slow {
        SubSignal::bullish(0.5)
    } else if fast < slow {
        SubSignal::bearish(-0.5)
    } else {
        SubSignal::neutral()
    }
}

/// RSI bands: oversold votes bullish, overbought votes bearish.
pub fn rsi_band(rsi: Option<f64>) -> SubSignal {
    match rsi {
        None => SubSignal::neutral(),
        Some(r) if r < 20.0 => SubSignal::bullish(1.0),
        Some(r) if r < 30.0 => SubSignal::bullish(0.8),
        Some(r) if r < 40.0 => SubSignal::bullish(0.3),
        Some(r) if r <= 60.0 => SubSignal::neutral(),
        Some(r) if r <= 70.0 => SubSignal::bearish(-0.3),
        Some(r) if r <= 80.0 => SubSignal::bearish(-0.8),
        Some(_) => SubSignal::bearish(-1.0),
    }
}

/// MACD vs Signal at the last two bars; histogram = MACD - Signal.
pub fn macd_cross(prev: Option<LinePair>, now: Option<LinePair>) -> SubSignal {
    let Some((macd, signal)) = now else {
        return SubSignal::neutral();
    };
    if let Some((prev_macd, prev_signal)) = prev {
        if prev_macd <= prev_signal && macd > signal {
            return SubSignal::bullish(1.0);
        }
        if prev_macd >= prev_signal && macd < signal {
            return SubSignal::bearish(-1.0);
        }
    }
    let histogram = macd - signal;
    if macd > 0.0 && histogram > 0.0 {
        SubSignal::bullish(0.6)
    } else if macd < 0.0 && histogram < 0.0 {
        SubSignal::bearish(-0.6)
    } else {
        SubSignal::neutral()
    }
}

/// Bollinger bands at the last bar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandReading {
    pub price: f64,
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
}

/// Price position inside the Bollinger envelope.
///
/// Collapsed bands (zero width, a constant window) vote neutral.
pub fn bollinger_position(reading: Option<BandReading>) -> SubSignal {
    let Some(b) = reading else {
        return SubSignal::neutral();
    };
    if b.upper <= b.lower {
        return SubSignal::neutral();
    }
    if b.price <= b.lower {
        SubSignal::bullish(0.8)
    } else if b.price >= b.upper {
        SubSignal::bearish(-0.8)
    } else if b.price < b.middle {
        SubSignal::bullish(0.3)
    } else if b.price > b.middle {
        SubSignal::bearish(-0.3)
    } else {
        SubSignal::neutral()
    }
}

/// Least-squares slope and total change over the trailing trend window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrendReading {
    pub slope: f64,
    pub change_pct: f64,
    pub bars: usize,
}

/// Measure the trend over the last min(20, len) closes.
///
/// `None` for fewer than two closes, a non-positive first close, or NaN.
pub fn trend_reading(closes: &[f64]) -> Option<TrendReading> {
    let window = &closes[closes.len().saturating_sub(TREND_WINDOW)..];
    if window.len() < 2 || window.iter().any(|v| v.is_nan()) {
        return None;
    }
    let first = window[0];
    let last = window[window.len() - 1];
    if first <= 0.0 {
        return None;
    }
    Some(TrendReading {
        slope: linear_slope(window),
        change_pct: (last / first - 1.0) * 100.0,
        bars: window.len(),
    })
}

pub fn trend_direction(reading: Option<TrendReading>) -> SubSignal {
    let Some(t) = reading else {
        return SubSignal::neutral();
    };
    if t.slope > 0.0 && t.change_pct > 5.0 {
        SubSignal::bullish(0.8)
    } else if t.slope > 0.0 && t.change_pct > 0.0 {
        SubSignal::bullish(0.5)
    } else if t.slope < 0.0 && t.change_pct < -5.0 {
        SubSignal::bearish(-0.8)
    } else if t.slope < 0.0 && t.change_pct < 0.0 {
        SubSignal::bearish(-0.5)
    } else {
        SubSignal::neutral()
    }
}

/// Slope of the least-squares line through (i, values[i]).
pub fn linear_slope(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }
    let x_mean = (n - 1) as f64 / 2.0;
    let y_mean = window_mean(values);
    let (mut num, mut den) = (0.0, 0.0);
    for (i, &y) in values.iter().enumerate() {
        let dx = i as f64 - x_mean;
        num += dx * (y - y_mean);
        den += dx * dx;
    }
    num / den
}

/// Recent-vs-overall volume and the last price move.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VolumeReading {
    pub ratio: f64,
    pub price_change: f64,
}

/// Ratio of the last five bars' mean volume to the whole history's mean.
///
/// `None` when the history is empty or either average volume is zero.
pub fn volume_reading(volumes: &[f64], closes: &[f64]) -> Option<VolumeReading> {
    if volumes.is_empty() {
        return None;
    }
    let overall = window_mean(volumes);
    if overall.is_nan() || overall <= 0.0 {
        return None;
    }
    let recent = window_mean(&volumes[volumes.len().saturating_sub(RECENT_VOLUME_BARS)..]);
    if recent.is_nan() || recent <= 0.0 {
        return None;
    }
    let price_change = match closes {
        [.., prev, last] => last - prev,
        _ => 0.0,
    };
    Some(VolumeReading {
        ratio: recent / overall,
        price_change,
    })
}

/// Volume surges confirm the direction of the last move.
///
/// Thin volume on a rising bar stays neutral but keeps a small 0.2 strength.
pub fn volume_confirmation(reading: Option<VolumeReading>) -> SubSignal {
    let Some(v) = reading else {
        return SubSignal::neutral();
    };
    if v.ratio > 1.5 && v.price_change > 0.0 {
        SubSignal::bullish(0.7)
    } else if v.ratio > 1.5 && v.price_change < 0.0 {
        SubSignal::bearish(-0.7)
    } else if v.ratio < 0.7 && v.price_change > 0.0 {
        SubSignal::neutral_with(0.2)
    } else {
        SubSignal::neutral()
    }
}

/// Premium (+) or discount (-) of price over NAV, in percent.
pub fn premium_discount(rate: f64) -> SubSignal {
    if rate.is_nan() {
        SubSignal::neutral()
    } else if rate < -3.0 {
        SubSignal::bullish(0.8)
    } else if rate < -1.0 {
        SubSignal::bullish(0.5)
    } else if rate > 3.0 {
        SubSignal::bearish(-0.8)
    } else if rate > 1.0 {
        SubSignal::bearish(-0.5)
    } else {
        SubSignal::neutral()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, DEFAULT_EPSILON};
    use crate::signal::IndicatorSignal;

    fn strength(s: SubSignal) -> f64 {
        s.strength
    }

    #[test]
    fn ma_cross_rules() {
        assert_eq!(ma_cross(Some((9.9, 10.0)), Some((10.1, 10.0))), SubSignal::bullish(1.0));
        assert_eq!(ma_cross(Some((10.1, 10.0)), Some((9.9, 10.0))), SubSignal::bearish(-1.0));
        assert_eq!(ma_cross(Some((10.2, 10.0)), Some((10.3, 10.0))), SubSignal::bullish(0.5));
        assert_eq!(ma_cross(Some((9.0, 10.0)), Some((9.1, 10.0))), SubSignal::bearish(-0.5));
        assert_eq!(ma_cross(Some((10.0, 10.0)), Some((10.0, 10.0))), SubSignal::neutral());
        assert_eq!(ma_cross(None, None), SubSignal::neutral());
    }

    #[test]
    fn ma_cross_without_previous_bar_is_alignment_only() {
        assert_eq!(ma_cross(None, Some((10.1, 10.0))), SubSignal::bullish(0.5));
    }

    #[test]
    fn rsi_bands() {
        assert_eq!(strength(rsi_band(Some(10.0))), 1.0);
        assert_eq!(strength(rsi_band(Some(20.0))), 0.8);
        assert_eq!(strength(rsi_band(Some(29.9))), 0.8);
        assert_eq!(strength(rsi_band(Some(30.0))), 0.3);
        assert_eq!(strength(rsi_band(Some(40.0))), 0.0);
        assert_eq!(strength(rsi_band(Some(60.0))), 0.0);
        assert_eq!(strength(rsi_band(Some(65.0))), -0.3);
        assert_eq!(strength(rsi_band(Some(70.0))), -0.3);
        assert_eq!(strength(rsi_band(Some(75.0))), -0.8);
        assert_eq!(strength(rsi_band(Some(80.0))), -0.8);
        assert_eq!(strength(rsi_band(Some(100.0))), -1.0);
        assert_eq!(rsi_band(None), SubSignal::neutral());
        assert_eq!(rsi_band(Some(50.0)).signal, IndicatorSignal::Neutral);
    }

    #[test]
    fn macd_rules() {
        assert_eq!(macd_cross(Some((-0.1, 0.0)), Some((0.1, 0.0))), SubSignal::bullish(1.0));
        assert_eq!(macd_cross(Some((0.1, 0.0)), Some((-0.1, 0.0))), SubSignal::bearish(-1.0));
        assert_eq!(macd_cross(Some((0.3, 0.1)), Some((0.4, 0.2))), SubSignal::bullish(0.6));
        assert_eq!(macd_cross(Some((-0.3, -0.1)), Some((-0.4, -0.2))), SubSignal::bearish(-0.6));
        // above zero but histogram negative, no fresh cross
        assert_eq!(macd_cross(Some((0.1, 0.3)), Some((0.2, 0.3))), SubSignal::neutral());
        assert_eq!(macd_cross(None, None), SubSignal::neutral());
    }

    #[test]
    fn bollinger_rules() {
        let band = |price| {
            Some(BandReading {
                price,
                upper: 12.0,
                middle: 10.0,
                lower: 8.0,
            })
        };
        assert_eq!(bollinger_position(band(8.0)), SubSignal::bullish(0.8));
        assert_eq!(bollinger_position(band(12.5)), SubSignal::bearish(-0.8));
        assert_eq!(bollinger_position(band(9.0)), SubSignal::bullish(0.3));
        assert_eq!(bollinger_position(band(11.0)), SubSignal::bearish(-0.3));
        assert_eq!(bollinger_position(band(10.0)), SubSignal::neutral());
        assert_eq!(bollinger_position(None), SubSignal::neutral());
    }

    #[test]
    fn collapsed_bands_are_neutral() {
        let flat = BandReading {
            price: 3.0,
            upper: 3.0,
            middle: 3.0,
            lower: 3.0,
        };
        assert_eq!(bollinger_position(Some(flat)), SubSignal::neutral());
    }

    #[test]
    fn slope_of_line() {
        assert_approx(linear_slope(&[1.0, 3.0, 5.0, 7.0]), 2.0, DEFAULT_EPSILON);
        assert_eq!(linear_slope(&[4.4; 20]), 0.0);
        assert_eq!(linear_slope(&[1.0]), 0.0);
    }

    #[test]
    fn trend_uses_trailing_twenty() {
        // 30 bars: first 10 fall, last 20 rise 10 → 12
        let mut closes: Vec<f64> = (0..10).map(|i| 20.0 - i as f64).collect();
        closes.extend((0..20).map(|i| 10.0 + i as f64 * 2.0 / 19.0));
        let t = trend_reading(&closes).unwrap();
        assert_eq!(t.bars, 20);
        assert_approx(t.change_pct, 20.0, 1e-9);
        assert!(t.slope > 0.0);
        assert_eq!(trend_direction(Some(t)), SubSignal::bullish(0.8));
    }

    #[test]
    fn trend_rules() {
        let t = |slope, change_pct| Some(TrendReading { slope, change_pct, bars: 20 });
        assert_eq!(trend_direction(t(0.1, 3.0)), SubSignal::bullish(0.5));
        assert_eq!(trend_direction(t(-0.1, -6.0)), SubSignal::bearish(-0.8));
        assert_eq!(trend_direction(t(-0.1, -1.0)), SubSignal::bearish(-0.5));
        // slope and change disagree
        assert_eq!(trend_direction(t(0.1, -1.0)), SubSignal::neutral());
        assert_eq!(trend_reading(&[5.0]), None);
    }

    #[test]
    fn volume_rules() {
        let closes_up = [10.0, 10.5];
        let closes_down = [10.5, 10.0];
        let surge = [100.0, 100.0, 100.0, 100.0, 100.0, 400.0, 400.0, 400.0, 400.0, 400.0];
        let r = volume_reading(&surge, &closes_up).unwrap();
        assert_approx(r.ratio, 1.6, DEFAULT_EPSILON);
        assert_eq!(volume_confirmation(Some(r)), SubSignal::bullish(0.7));
        let r = volume_reading(&surge, &closes_down).unwrap();
        assert_eq!(volume_confirmation(Some(r)), SubSignal::bearish(-0.7));

        let thin = [400.0, 400.0, 400.0, 400.0, 400.0, 100.0, 100.0, 100.0, 100.0, 100.0];
        let r = volume_reading(&thin, &closes_up).unwrap();
        assert_eq!(volume_confirmation(Some(r)), SubSignal::neutral_with(0.2));
        let r = volume_reading(&thin, &closes_down).unwrap();
        assert_eq!(volume_confirmation(Some(r)), SubSignal::neutral());
    }

    #[test]
    fn zero_volume_is_neutral() {
        assert_eq!(volume_reading(&[0.0; 10], &[1.0, 2.0]), None);
        assert_eq!(volume_reading(&[], &[]), None);
        assert_eq!(volume_confirmation(None), SubSignal::neutral());
    }

    #[test]
    fn silent_recent_sessions_are_neutral() {
        let mut volumes = vec![1000.0; 20];
        volumes.extend([0.0; 5]);
        let closes: Vec<f64> = (0..25).map(|i| 10.0 + i as f64 * 0.1).collect();
        assert_eq!(volume_reading(&volumes, &closes), None);
        assert_eq!(
            volume_confirmation(volume_reading(&volumes, &closes)),
            SubSignal::neutral()
        );
    }

    #[test]
    fn premium_rules() {
        assert_eq!(premium_discount(-4.0), SubSignal::bullish(0.8));
        assert_eq!(premium_discount(-3.0), SubSignal::bullish(0.5));
        assert_eq!(premium_discount(-1.0), SubSignal::neutral());
        assert_eq!(premium_discount(0.5), SubSignal::neutral());
        assert_eq!(premium_discount(2.0), SubSignal::bearish(-0.5));
        assert_eq!(premium_discount(3.5), SubSignal::bearish(-0.8));
        assert_eq!(premium_discount(f64::NAN), SubSignal::neutral());
    }
}
