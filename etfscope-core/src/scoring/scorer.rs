//! Strategy-weighted 0–100 score over five dimensions.
//!
//! Each sub-score is a pure function of raw metrics. The technical score
//! reads the same indicators as the signal classifier but awards points on
//! its own scale.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::strategy::ScoringStrategy;
use crate::indicators::last_value;
use crate::performance::PerformanceSummary;
use crate::series::IndicatorSeries;

/// Raw metrics the scorer consumes. Percentages are in percent units and
/// `fee_rate` is the annual total fee in percent (0.5 = 0.5%).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreInputs {
    pub annual_return: f64,
    pub sharpe_ratio: f64,
    pub volatility: f64,
    pub max_drawdown: f64,
    /// Pre-computed 0–100 liquidity score.
    pub liquidity_score: f64,
    pub fee_rate: f64,
}

impl ScoreInputs {
    pub fn from_performance(perf: &PerformanceSummary, liquidity_score: f64, fee_rate: f64) -> Self {
        Self {
            annual_return: perf.annualized_return,
            sharpe_ratio: perf.sharpe_ratio,
            volatility: perf.annualized_volatility,
            max_drawdown: perf.max_drawdown,
            liquidity_score,
            fee_rate,
        }
    }
}

/// The five dimension scores before weighting.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SubScores {
    pub return_score: f64,
    pub risk_score: f64,
    pub liquidity_score: f64,
    pub fee_score: f64,
    pub technical_score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub total_score: f64,
    pub return_score: f64,
    pub risk_score: f64,
    pub liquidity_score: f64,
    pub fee_score: f64,
    pub technical_score: f64,
}

/// Scorer bound to one strategy for its whole lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MultiFactorScorer {
    strategy: ScoringStrategy,
}

impl MultiFactorScorer {
    pub fn new(strategy: ScoringStrategy) -> Self {
        Self { strategy }
    }

    pub fn strategy(&self) -> ScoringStrategy {
        self.strategy
    }

    /// Score one ETF. Without an indicator series the technical score is 50.
    pub fn score(&self, inputs: &ScoreInputs, technical: Option<&IndicatorSeries>) -> ScoreBreakdown {
        let parts = SubScores {
            return_score: return_score(inputs.annual_return, inputs.sharpe_ratio),
            risk_score: risk_score(inputs.volatility, inputs.max_drawdown),
            liquidity_score: clamp_score(inputs.liquidity_score),
            fee_score: fee_score(inputs.fee_rate),
            technical_score: technical
                .map(|s| technical_score(&TechnicalSnapshot::from_series(s)))
                .unwrap_or(NEUTRAL_TECHNICAL),
        };
        let breakdown = self.combine(parts);
        debug!(
            strategy = %self.strategy,
            total = breakdown.total_score,
            "scored"
        );
        breakdown
    }

    /// Weight already-computed sub-scores with this scorer's strategy.
    pub fn combine(&self, parts: SubScores) -> ScoreBreakdown {
        let w = self.strategy.weights();
        let return_score = clamp_score(parts.return_score);
        let risk_score = clamp_score(parts.risk_score);
        let liquidity_score = clamp_score(parts.liquidity_score);
        let fee_score = clamp_score(parts.fee_score);
        let technical_score = clamp_score(parts.technical_score);
        let total = return_score * w.return_weight
            + risk_score * w.risk
            + liquidity_score * w.liquidity
            + fee_score * w.fee
            + technical_score * w.technical;

        ScoreBreakdown {
            total_score: clamp_score(total),
            return_score,
            risk_score,
            liquidity_score,
            fee_score,
            technical_score,
        }
    }
}

// ─── Sub-scores ─────────────────────────────────────────────────────

const NEUTRAL_TECHNICAL: f64 = 50.0;

fn clamp_score(v: f64) -> f64 {
    if v.is_nan() {
        0.0
    } else {
        v.clamp(0.0, 100.0)
    }
}

/// Return potential: 0–20 from annual return (-10% → 0, 30% → 20) plus
/// 0–80 from the Sharpe ratio (0 → 0, 2.0 → 80).
pub fn return_score(annual_return: f64, sharpe_ratio: f64) -> f64 {
    let return_part = ((annual_return + 10.0) / 40.0 * 20.0).clamp(0.0, 20.0);
    let sharpe_part = (sharpe_ratio / 2.0 * 80.0).clamp(0.0, 80.0);
    clamp_score(return_part + sharpe_part)
}

/// Risk control (higher = safer): 0–60 from volatility (10% → 60, 50% → 0)
/// plus 0–40 from drawdown magnitude (5% → 40, 40% → 0).
pub fn risk_score(volatility: f64, max_drawdown: f64) -> f64 {
    let vol_part = ((50.0 - volatility) / 40.0 * 60.0).clamp(0.0, 60.0);
    let drawdown_part = ((40.0 - max_drawdown.abs()) / 35.0 * 40.0).clamp(0.0, 40.0);
    clamp_score(vol_part + drawdown_part)
}

/// Fee advantage: 100 at or below 0.15%, 0 at or above 0.6%, linear between.
pub fn fee_score(fee_rate: f64) -> f64 {
    if fee_rate <= 0.15 {
        100.0
    } else if fee_rate >= 0.6 {
        0.0
    } else {
        (0.6 - fee_rate) / 0.45 * 100.0
    }
}

/// Last-bar readings the technical score looks at.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TechnicalSnapshot {
    pub price: Option<f64>,
    pub ma5: Option<f64>,
    pub ma20: Option<f64>,
    pub rsi: Option<f64>,
    pub macd: Option<f64>,
    pub signal: Option<f64>,
}

impl TechnicalSnapshot {
    pub fn from_series(series: &IndicatorSeries) -> Self {
        Self {
            price: series.last_price(),
            ma5: series.ma_back(5, 0),
            ma20: series.ma_back(20, 0),
            rsi: series.rsi().and_then(last_value),
            macd: series.macd().and_then(|m| last_value(&m.macd)),
            signal: series.macd().and_then(|m| last_value(&m.signal)),
        }
    }
}

/// Technical score: average points of the indicators that are defined.
///
/// MA position 0–30, RSI band 5–30, MACD 10–40; the sum is divided by the
/// number of indicators present. Nothing defined → 50.
///
/// The average of per-indicator points tops out near 33, so with any
/// indicator defined the explainer's "weak technicals" warning (< 40)
/// always fires and its "strong technicals" reason (≥ 70) never does.
pub fn technical_score(snap: &TechnicalSnapshot) -> f64 {
    let mut points = 0.0;
    let mut present = 0usize;

    if let (Some(price), Some(ma5), Some(ma20)) = (snap.price, snap.ma5, snap.ma20) {
        points += if price > ma5 && ma5 > ma20 {
            30.0
        } else if price > ma5 {
            20.0
        } else if price > ma20 {
            10.0
        } else {
            0.0
        };
        present += 1;
    }

    if let Some(rsi) = snap.rsi {
        points += if (40.0..=60.0).contains(&rsi) {
            30.0
        } else if (30.0..40.0).contains(&rsi) || (rsi > 60.0 && rsi <= 70.0) {
            20.0
        } else if rsi < 30.0 {
            15.0
        } else {
            5.0
        };
        present += 1;
    }

    if let (Some(macd), Some(signal)) = (snap.macd, snap.signal) {
        let diff = macd - signal;
        points += if diff > 0.0 && macd > 0.0 {
            40.0
        } else if diff > 0.0 {
            30.0
        } else if macd > 0.0 {
            20.0
        } else {
            10.0
        };
        present += 1;
    }

    if present == 0 {
        return NEUTRAL_TECHNICAL;
    }
    (points / present as f64).min(100.0)
}
