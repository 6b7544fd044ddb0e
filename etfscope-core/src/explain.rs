//! Rule-based recommendation text for a [`ScoreBreakdown`].
//!
//! The trigger thresholds and confidence tier boundaries are stable; the
//! wording is presentation and may change.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::scoring::ScoreBreakdown;

/// At most this many reasons are produced.
pub const MAX_REASONS: usize = 5;
/// Filler reasons are added below this count.
const MIN_REASONS: usize = 3;

pub const MARKET_AVG_RETURN: f64 = 10.0;
pub const MARKET_AVG_VOLATILITY: f64 = 20.0;

/// Confidence in a recommendation, derived from total_score alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceTier {
    Low,
    LowMedium,
    Medium,
    High,
    VeryHigh,
}

impl ConfidenceTier {
    pub fn from_score(total_score: f64) -> Self {
        if total_score >= 85.0 {
            Self::VeryHigh
        } else if total_score >= 75.0 {
            Self::High
        } else if total_score >= 65.0 {
            Self::Medium
        } else if total_score >= 55.0 {
            Self::LowMedium
        } else {
            Self::Low
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::VeryHigh => "very high",
            Self::High => "high",
            Self::Medium => "medium",
            Self::LowMedium => "low-medium",
            Self::Low => "low",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::VeryHigh => "Balanced and strong across every dimension; strongly recommended",
            Self::High => "Strong overall; worth watching",
            Self::Medium => "Solid overall; can be considered",
            Self::LowMedium => "Some dimensions are weak; be cautious",
            Self::Low => "Weak overall; not recommended for allocation",
        }
    }
}

impl fmt::Display for ConfidenceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Raw metrics the text rules quote alongside the breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplainContext {
    pub code: String,
    pub name: String,
    /// Percent.
    pub annual_return: f64,
    /// Annualized, percent.
    pub volatility: f64,
    /// Non-positive percent; the magnitude is what the rules compare.
    pub max_drawdown: f64,
    /// Fund scale in 100 million units, when known.
    pub scale: Option<f64>,
    /// Annual total fee, percent.
    pub fee_rate: f64,
}

/// Everything a report needs about one ETF's score. Optional fields
/// serialize as null.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub code: String,
    pub name: String,
    pub breakdown: ScoreBreakdown,
    pub reasons: Vec<String>,
    pub warnings: Vec<String>,
    pub comparisons: Vec<String>,
    pub confidence: ConfidenceTier,
    pub confidence_note: String,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecommendationExplainer {
    market_return: f64,
    market_volatility: f64,
}

impl Default for RecommendationExplainer {
    fn default() -> Self {
        Self::new()
    }
}

impl RecommendationExplainer {
    pub fn new() -> Self {
        Self {
            market_return: MARKET_AVG_RETURN,
            market_volatility: MARKET_AVG_VOLATILITY,
        }
    }

    /// Compare against a different market baseline.
    pub fn with_market(market_return: f64, market_volatility: f64) -> Self {
        Self {
            market_return,
            market_volatility,
        }
    }

    pub fn explain(&self, breakdown: &ScoreBreakdown, ctx: &ExplainContext) -> Recommendation {
        let confidence = ConfidenceTier::from_score(breakdown.total_score);
        Recommendation {
            code: ctx.code.clone(),
            name: ctx.name.clone(),
            breakdown: *breakdown,
            reasons: self.reasons(breakdown, ctx),
            warnings: self.warnings(breakdown, ctx),
            comparisons: self.comparisons(ctx),
            confidence,
            confidence_note: confidence.description().to_string(),
        }
    }

    /// Up to [`MAX_REASONS`] strengths, in dimension order.
    pub fn reasons(&self, b: &ScoreBreakdown, ctx: &ExplainContext) -> Vec<String> {
        let mut out = Vec::new();

        if b.return_score >= 70.0 {
            out.push(if ctx.annual_return > 20.0 {
                format!("Annual return of {:.1}%, excellent performance", ctx.annual_return)
            } else if ctx.annual_return > 10.0 {
                format!("Annual return of {:.1}%, good performance", ctx.annual_return)
            } else {
                "High Sharpe ratio, strong risk-adjusted return".to_string()
            });
        }

        if b.risk_score >= 70.0 {
            out.push(if ctx.volatility < 15.0 {
                format!(
                    "Volatility only {:.1}%, well controlled risk suited to steady investing",
                    ctx.volatility
                )
            } else if ctx.volatility < 25.0 {
                format!("Volatility {:.1}%, risk is manageable", ctx.volatility)
            } else {
                "Drawdowns well contained".to_string()
            });
        }

        if b.liquidity_score >= 85.0 {
            out.push(match ctx.scale {
                Some(s) if s >= 100.0 => format!("Scale {s:.0}, very large fund with excellent liquidity"),
                Some(s) if s >= 50.0 => format!("Scale {s:.0}, liquid enough for large trades"),
                Some(s) => format!("Scale {s:.0}, good liquidity"),
                None => "Good liquidity".to_string(),
            });
        }

        if b.fee_score >= 70.0 {
            if ctx.fee_rate <= 0.3 {
                out.push(format!("Fee only {:.2}%, clear cost advantage", ctx.fee_rate));
            } else if ctx.fee_rate <= 0.5 {
                out.push(format!("Fee {:.2}%, reasonable cost", ctx.fee_rate));
            }
        }

        if b.technical_score >= 70.0 {
            out.push("Technical indicators healthy, trend improving".to_string());
        } else if b.technical_score >= 60.0 {
            out.push("Technicals neutral to positive, steady price action".to_string());
        }

        if out.len() < MIN_REASONS {
            if b.total_score >= 80.0 {
                out.push(format!(
                    "Total score {:.1}, balanced and strong across dimensions",
                    b.total_score
                ));
            } else if b.total_score >= 70.0 {
                out.push(format!("Total score {:.1}, good overall", b.total_score));
            }
        }

        out.truncate(MAX_REASONS);
        out
    }

    pub fn warnings(&self, b: &ScoreBreakdown, ctx: &ExplainContext) -> Vec<String> {
        let mut out = Vec::new();
        let drawdown = ctx.max_drawdown.abs();

        if b.risk_score < 50.0 {
            if ctx.volatility > 30.0 {
                out.push(format!(
                    "High volatility ({:.1}%), consider limiting position size",
                    ctx.volatility
                ));
            }
            if drawdown > 25.0 {
                out.push(format!("Maximum drawdown reached {drawdown:.1}%, mind the risk"));
            }
        }
        if b.liquidity_score < 60.0 {
            out.push("Average liquidity, prefer small trades".to_string());
        }
        if ctx.annual_return < 0.0 {
            out.push(format!(
                "Negative annual return ({:.1}%), be cautious",
                ctx.annual_return
            ));
        }
        if b.technical_score < 40.0 {
            out.push("Weak technicals, short-term pressure likely".to_string());
        }
        out
    }

    /// Return and volatility relative to the market baseline, outside a
    /// ±20% band.
    pub fn comparisons(&self, ctx: &ExplainContext) -> Vec<String> {
        let mut out = Vec::new();

        if ctx.annual_return > self.market_return * 1.2 {
            out.push(format!(
                "Return beats the market average by {:.1} points",
                ctx.annual_return - self.market_return
            ));
        } else if ctx.annual_return < self.market_return * 0.8 {
            out.push(format!(
                "Return trails the market average by {:.1} points",
                self.market_return - ctx.annual_return
            ));
        }

        if ctx.volatility < self.market_volatility * 0.8 {
            out.push("Volatility well below the market average, steadier".to_string());
        } else if ctx.volatility > self.market_volatility * 1.2 {
            out.push("Volatility above the market average, larger swings".to_string());
        }
        out
    }
}
