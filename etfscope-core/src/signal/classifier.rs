//! SignalClassifier — blends indicator votes into one TradingSignal.
//!
//! final_score = Σ(strength × weight) / Σ(weights used), where the premium
//! vote only counts when a premium rate is supplied (total weight 100,
//! otherwise 95).

use std::collections::BTreeMap;

use tracing::debug;

use super::rules::{
    bollinger_position, macd_cross, ma_cross, premium_discount, rsi_band, trend_direction,
    trend_reading, volume_confirmation, volume_reading, BandReading, LinePair, TrendReading,
};
use super::{IndicatorKind, RiskLevel, SignalCategory, SubSignal, TradingSignal};
use crate::indicators::{average_true_range, daily_returns, last_value, value_at};
use crate::performance::annualized_volatility;
use crate::series::IndicatorSeries;

/// Bars of true range averaged for price targets.
pub const ATR_PERIOD: usize = 14;

const MA_FAST: usize = 5;
const MA_SLOW: usize = 20;

/// Stateless classifier; one instance can serve any number of series.
#[derive(Debug, Clone, Copy, Default)]
pub struct SignalClassifier;

/// Raw readings taken from the last bars, kept for the reason strings.
#[derive(Debug, Clone, Copy)]
struct Readings {
    ma_prev: Option<LinePair>,
    ma_now: Option<LinePair>,
    rsi: Option<f64>,
    macd_prev: Option<LinePair>,
    macd_now: Option<LinePair>,
    band: Option<BandReading>,
    trend: Option<TrendReading>,
}

impl SignalClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Classify the last bar of `series`.
    ///
    /// `premium_rate` is the price premium (+) or discount (-) over NAV in
    /// percent; pass `None` when it is unknown.
    pub fn classify(&self, series: &IndicatorSeries, premium_rate: Option<f64>) -> TradingSignal {
        let readings = take_readings(series);
        let sub_signals = votes(&readings, series, premium_rate);
        let score = aggregate(&sub_signals);
        let category = category_for_score(score);
        let confidence = confidence_for(category, score);
        let risk_level = risk_level(&series.closes());
        let entry_price = series.last_close();
        let (price_target, stop_loss) = match entry_price {
            Some(price) => price_levels(category, series, price),
            None => (None, None),
        };
        let reasons = reasons(&readings, &sub_signals, premium_rate);

        debug!(
            bars = series.len(),
            score,
            category = %category,
            confidence,
            "classified series"
        );

        TradingSignal {
            category,
            confidence,
            score,
            reasons,
            sub_signals,
            risk_level,
            entry_price,
            price_target,
            stop_loss,
        }
    }

    /// Every indicator's vote. Premium is only present when a rate is given.
    pub fn sub_signals(
        &self,
        series: &IndicatorSeries,
        premium_rate: Option<f64>,
    ) -> BTreeMap<IndicatorKind, SubSignal> {
        votes(&take_readings(series), series, premium_rate)
    }
}

fn votes(
    r: &Readings,
    series: &IndicatorSeries,
    premium_rate: Option<f64>,
) -> BTreeMap<IndicatorKind, SubSignal> {
    let volume = volume_reading(&series.volumes(), &series.closes());

    let mut votes = BTreeMap::new();
    votes.insert(IndicatorKind::MaCross, ma_cross(r.ma_prev, r.ma_now));
    votes.insert(IndicatorKind::Rsi, rsi_band(r.rsi));
    votes.insert(IndicatorKind::Macd, macd_cross(r.macd_prev, r.macd_now));
    votes.insert(IndicatorKind::Bollinger, bollinger_position(r.band));
    votes.insert(IndicatorKind::Trend, trend_direction(r.trend));
    votes.insert(IndicatorKind::Volume, volume_confirmation(volume));
    if let Some(rate) = premium_rate {
        votes.insert(IndicatorKind::Premium, premium_discount(rate));
    }
    votes
}

fn take_readings(series: &IndicatorSeries) -> Readings {
    let n = series.len();
    let ma_pair = |back: usize| Some((series.ma_back(MA_FAST, back)?, series.ma_back(MA_SLOW, back)?));
    let macd_pair = |index: Option<usize>| {
        let lines = series.macd()?;
        let i = index?;
        Some((value_at(&lines.macd, i)?, value_at(&lines.signal, i)?))
    };
    let band = series.bollinger().and_then(|b| {
        let i = n.checked_sub(1)?;
        Some(BandReading {
            price: series.last_price()?,
            upper: value_at(&b.upper, i)?,
            middle: value_at(&b.middle, i)?,
            lower: value_at(&b.lower, i)?,
        })
    });

    Readings {
        ma_prev: ma_pair(1),
        ma_now: ma_pair(0),
        rsi: series.rsi().and_then(last_value),
        macd_prev: macd_pair(n.checked_sub(2)),
        macd_now: macd_pair(n.checked_sub(1)),
        band,
        trend: trend_reading(&series.closes()),
    }
}

fn aggregate(votes: &BTreeMap<IndicatorKind, SubSignal>) -> f64 {
    let mut weighted = 0.0;
    let mut weight_used = 0.0;
    for (kind, vote) in votes {
        weighted += vote.strength * kind.weight();
        weight_used += kind.weight();
    }
    if weight_used == 0.0 {
        return 0.0;
    }
    weighted / weight_used
}

/// Map a final score in [-1, 1] to a category. Boundaries are inclusive
/// on the side of the stronger call.
pub fn category_for_score(score: f64) -> SignalCategory {
    if score >= 0.6 {
        SignalCategory::StrongBuy
    } else if score >= 0.2 {
        SignalCategory::Buy
    } else if score <= -0.6 {
        SignalCategory::StrongSell
    } else if score <= -0.2 {
        SignalCategory::Sell
    } else {
        SignalCategory::Hold
    }
}

/// Confidence: |score|×100 capped at 95 for strong calls and 80 for plain
/// calls; a hold is always 50.
pub fn confidence_for(category: SignalCategory, score: f64) -> f64 {
    let raw = score.abs() * 100.0;
    match category {
        SignalCategory::StrongBuy | SignalCategory::StrongSell => raw.min(95.0),
        SignalCategory::Buy | SignalCategory::Sell => raw.min(80.0),
        SignalCategory::Hold => 50.0,
    }
}

/// Risk from annualized close-to-close volatility; low when fewer than two
/// returns exist.
fn risk_level(closes: &[f64]) -> RiskLevel {
    let returns: Vec<f64> = daily_returns(closes)
        .into_iter()
        .filter(|r| !r.is_nan())
        .collect();
    match annualized_volatility(&returns) {
        Some(vol) => RiskLevel::from_volatility(vol),
        None => RiskLevel::Low,
    }
}

/// Target and stop from ATR, rounded to a 0.001 price tick.
fn price_levels(
    category: SignalCategory,
    series: &IndicatorSeries,
    price: f64,
) -> (Option<f64>, Option<f64>) {
    if category == SignalCategory::Hold {
        return (None, None);
    }
    let Some(atr) = average_true_range(series.bars(), ATR_PERIOD) else {
        return (None, None);
    };
    if category.is_buy() {
        (Some(round_tick(price + 2.0 * atr)), Some(round_tick(price - atr)))
    } else {
        (Some(round_tick(price - 2.0 * atr)), Some(round_tick(price + atr)))
    }
}

fn round_tick(price: f64) -> f64 {
    (price * 1000.0).round() / 1000.0
}

// ─── Reasons ────────────────────────────────────────────────────────

fn reasons(
    r: &Readings,
    votes: &BTreeMap<IndicatorKind, SubSignal>,
    premium_rate: Option<f64>,
) -> Vec<String> {
    let vote = |kind| votes.get(&kind).copied().unwrap_or_else(SubSignal::neutral);
    let mut out = Vec::new();

    let ma = vote(IndicatorKind::MaCross);
    if !ma.is_neutral() {
        out.push(
            match ma.strength {
                s if s >= 1.0 => "MA5 crossed above MA20 (golden cross), short-term trend turning up",
                s if s > 0.0 => "MA5 above MA20, short-term uptrend",
                s if s <= -1.0 => "MA5 crossed below MA20 (death cross), short-term trend turning down",
                _ => "MA5 below MA20, short-term downtrend",
            }
            .to_string(),
        );
    }

    if let (false, Some(rsi)) = (vote(IndicatorKind::Rsi).is_neutral(), r.rsi) {
        out.push(if rsi < 30.0 {
            format!("RSI {rsi:.1}: oversold, rebound likely")
        } else if rsi < 40.0 {
            format!("RSI {rsi:.1}: weak momentum, approaching oversold")
        } else if rsi > 70.0 {
            format!("RSI {rsi:.1}: overbought, pullback risk")
        } else {
            format!("RSI {rsi:.1}: strong momentum, approaching overbought")
        });
    }

    let macd = vote(IndicatorKind::Macd);
    if !macd.is_neutral() {
        out.push(
            match macd.strength {
                s if s >= 1.0 => "MACD crossed above its signal line (golden cross)",
                s if s > 0.0 => "MACD above zero with a positive histogram",
                s if s <= -1.0 => "MACD crossed below its signal line (death cross)",
                _ => "MACD below zero with a negative histogram",
            }
            .to_string(),
        );
    }

    if let (false, Some(t)) = (vote(IndicatorKind::Trend).is_neutral(), r.trend) {
        let direction = if t.change_pct > 0.0 { "Uptrend" } else { "Downtrend" };
        out.push(format!(
            "{direction}: {:+.2}% over the last {} sessions",
            t.change_pct, t.bars
        ));
    }

    if let (false, Some(rate)) = (vote(IndicatorKind::Premium).is_neutral(), premium_rate) {
        out.push(if rate < 0.0 {
            format!("Trading at a {:.2}% discount to NAV", rate.abs())
        } else {
            format!("Trading at a {rate:.2}% premium to NAV")
        });
    }

    if out.is_empty() {
        out.push("Indicators neutral, hold".to_string());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalysisConfig;
    use crate::domain::{PriceBar, PriceField};
    use crate::indicators::make_bars;
    use crate::signal::IndicatorSignal;

    fn series(bars: Vec<PriceBar>) -> IndicatorSeries {
        IndicatorSeries::compute(bars, &AnalysisConfig::default()).unwrap()
    }

    #[test]
    fn category_boundaries() {
        assert_eq!(category_for_score(0.6), SignalCategory::StrongBuy);
        assert_eq!(category_for_score(0.599999), SignalCategory::Buy);
        assert_eq!(category_for_score(0.2), SignalCategory::Buy);
        assert_eq!(category_for_score(0.199999), SignalCategory::Hold);
        assert_eq!(category_for_score(-0.2), SignalCategory::Sell);
        assert_eq!(category_for_score(-0.199999), SignalCategory::Hold);
        assert_eq!(category_for_score(-0.6), SignalCategory::StrongSell);
        assert_eq!(category_for_score(-0.599999), SignalCategory::Sell);
    }

    #[test]
    fn confidence_caps() {
        assert_eq!(confidence_for(SignalCategory::StrongBuy, 0.99), 95.0);
        assert_eq!(confidence_for(SignalCategory::StrongSell, -0.7), 70.0);
        assert_eq!(confidence_for(SignalCategory::Buy, 0.3), 30.0);
        assert_eq!(confidence_for(SignalCategory::Hold, 0.1), 50.0);
    }

    #[test]
    fn premium_changes_weight_total() {
        let s = series(make_bars(&[10.0; 10]));
        let classifier = SignalClassifier::new();
        assert_eq!(classifier.sub_signals(&s, None).len(), 6);
        let votes = classifier.sub_signals(&s, Some(-4.0));
        assert_eq!(votes.len(), 7);
        // only the premium votes: 0.8 × 5 / 100
        let signal = classifier.classify(&s, Some(-4.0));
        assert!((signal.score - 0.04).abs() < 1e-12);
        assert_eq!(signal.reasons, vec!["Trading at a 4.00% discount to NAV".to_string()]);
    }

    #[test]
    fn neutral_series_falls_back_to_hold_reason() {
        let signal = SignalClassifier::new().classify(&series(make_bars(&[10.0; 30])), None);
        assert_eq!(signal.category, SignalCategory::Hold);
        assert_eq!(signal.reasons, vec!["Indicators neutral, hold".to_string()]);
    }

    #[test]
    fn falling_series_sells_with_levels() {
        // choppy accelerating decline, then a high-volume down day
        let mut closes: Vec<f64> = (0..39)
            .map(|i| {
                let x = i as f64;
                20.0 - 0.1 * x - 0.002 * x * x + if i % 2 == 1 { 0.25 } else { 0.0 }
            })
            .collect();
        closes.push(closes[38] - 0.3);
        let mut bars = make_bars(&closes);
        for bar in bars.iter_mut().skip(35) {
            bar.volume = 3000.0;
        }
        let signal = SignalClassifier::new().classify(&series(bars), None);
        assert!(signal.category.is_sell(), "got {:?}", signal.category);
        let price = signal.entry_price.unwrap();
        let target = signal.price_target.unwrap();
        let stop = signal.stop_loss.unwrap();
        assert!(target < price && price < stop);
        assert_eq!(
            signal.sub_signal(IndicatorKind::Trend).unwrap().signal,
            IndicatorSignal::Bearish
        );
        assert_eq!(signal.reasons[0], "MA5 below MA20, short-term downtrend");
    }

    #[test]
    fn reasons_follow_fixed_order() {
        let closes: Vec<f64> = (0..40)
            .map(|i| 10.0 + 0.1 * i as f64 + 0.002 * (i * i) as f64)
            .collect();
        let signal = SignalClassifier::new().classify(&series(make_bars(&closes)), Some(2.0));
        let first_words: Vec<&str> = signal
            .reasons
            .iter()
            .map(|r| r.split_whitespace().next().unwrap_or(""))
            .collect();
        assert_eq!(first_words, vec!["MA5", "RSI", "MACD", "Uptrend:", "Trading"]);
    }

    #[test]
    fn empty_series_is_neutral_hold() {
        let signal = SignalClassifier::new().classify(&series(Vec::new()), None);
        assert_eq!(signal.category, SignalCategory::Hold);
        assert_eq!(signal.risk_level, RiskLevel::Low);
        assert_eq!(signal.entry_price, None);
        assert_eq!(signal.price_target, None);
    }

    #[test]
    fn single_return_is_low_risk() {
        let signal = SignalClassifier::new().classify(&series(make_bars(&[10.0, 14.0])), None);
        assert_eq!(signal.risk_level, RiskLevel::Low);
    }

    /// Flat closes with highs alternating 10.8 / 11.2.
    fn flat_close_oscillating_highs() -> Vec<PriceBar> {
        let mut bars = make_bars(&[10.0; 25]);
        for (i, bar) in bars.iter_mut().enumerate() {
            bar.high = if i % 2 == 0 { 10.8 } else { 11.2 };
            bar.low = 9.5;
        }
        bars
    }

    #[test]
    fn bands_compare_against_their_own_price_field() {
        let config = AnalysisConfig {
            price_field: PriceField::High,
            ..AnalysisConfig::default()
        };
        let on_highs = IndicatorSeries::compute(flat_close_oscillating_highs(), &config).unwrap();
        assert_eq!(on_highs.last_price(), Some(10.8));

        // last high sits between the lower band (~10.59) and the middle (11.0);
        // the close of 10.0 would fall below the lower band
        let votes = SignalClassifier::new().sub_signals(&on_highs, None);
        assert_eq!(votes[&IndicatorKind::Bollinger], SubSignal::bullish(0.3));

        // on closes the window is constant and the bands collapse
        let on_closes = series(flat_close_oscillating_highs());
        let votes = SignalClassifier::new().sub_signals(&on_closes, None);
        assert_eq!(votes[&IndicatorKind::Bollinger], SubSignal::neutral());
    }

    #[test]
    fn round_tick_to_thousandths() {
        assert_eq!(round_tick(3.14159), 3.142);
        assert_eq!(round_tick(2.0004), 2.0);
    }
}
