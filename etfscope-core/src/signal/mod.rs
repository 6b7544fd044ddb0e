//! Rule-based trading signal.
//!
//! Each indicator votes independently with a [`SubSignal`]; the
//! [`SignalClassifier`] blends the votes with fixed weights into one
//! [`TradingSignal`].

pub mod classifier;
pub mod rules;

pub use classifier::{category_for_score, confidence_for, SignalClassifier, ATR_PERIOD};

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Direction of one indicator's vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IndicatorSignal {
    Bullish,
    Neutral,
    Bearish,
}

/// One indicator's vote: a direction plus a strength in [-1, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SubSignal {
    pub signal: IndicatorSignal,
    pub strength: f64,
}

impl SubSignal {
    pub fn bullish(strength: f64) -> Self {
        Self {
            signal: IndicatorSignal::Bullish,
            strength,
        }
    }

    pub fn bearish(strength: f64) -> Self {
        Self {
            signal: IndicatorSignal::Bearish,
            strength,
        }
    }

    pub fn neutral() -> Self {
        Self::neutral_with(0.0)
    }

    /// Neutral direction that still carries a small strength.
    pub fn neutral_with(strength: f64) -> Self {
        Self {
            signal: IndicatorSignal::Neutral,
            strength,
        }
    }

    pub fn is_neutral(&self) -> bool {
        self.signal == IndicatorSignal::Neutral
    }
}

/// The indicators that vote, with their aggregation weights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndicatorKind {
    MaCross,
    Rsi,
    Macd,
    Bollinger,
    Trend,
    Volume,
    Premium,
}

impl IndicatorKind {
    pub const ALL: [IndicatorKind; 7] = [
        IndicatorKind::MaCross,
        IndicatorKind::Rsi,
        IndicatorKind::Macd,
        IndicatorKind::Bollinger,
        IndicatorKind::Trend,
        IndicatorKind::Volume,
        IndicatorKind::Premium,
    ];

    pub fn weight(self) -> f64 {
        match self {
            IndicatorKind::MaCross => 20.0,
            IndicatorKind::Rsi => 15.0,
            IndicatorKind::Macd => 20.0,
            IndicatorKind::Bollinger => 15.0,
            IndicatorKind::Trend => 15.0,
            IndicatorKind::Volume => 10.0,
            IndicatorKind::Premium => 5.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignalCategory {
    StrongBuy,
    Buy,
    Hold,
    Sell,
    StrongSell,
}

impl SignalCategory {
    /// Strongest buy first.
    pub const ALL: [SignalCategory; 5] = [
        SignalCategory::StrongBuy,
        SignalCategory::Buy,
        SignalCategory::Hold,
        SignalCategory::Sell,
        SignalCategory::StrongSell,
    ];

    /// Wire name, as serialized.
    pub fn code(self) -> &'static str {
        match self {
            SignalCategory::StrongBuy => "STRONG_BUY",
            SignalCategory::Buy => "BUY",
            SignalCategory::Hold => "HOLD",
            SignalCategory::Sell => "SELL",
            SignalCategory::StrongSell => "STRONG_SELL",
        }
    }

    pub fn is_buy(self) -> bool {
        matches!(self, SignalCategory::StrongBuy | SignalCategory::Buy)
    }

    pub fn is_sell(self) -> bool {
        matches!(self, SignalCategory::StrongSell | SignalCategory::Sell)
    }

    pub fn label(self) -> &'static str {
        match self {
            SignalCategory::StrongBuy => "strong buy",
            SignalCategory::Buy => "buy",
            SignalCategory::Hold => "hold",
            SignalCategory::Sell => "sell",
            SignalCategory::StrongSell => "strong sell",
        }
    }
}

impl fmt::Display for SignalCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// Classify annualized volatility (percent): >30 high, >20 medium.
    pub fn from_volatility(volatility: f64) -> Self {
        if volatility > 30.0 {
            RiskLevel::High
        } else if volatility > 20.0 {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RiskLevel::Low => "LOW",
            RiskLevel::Medium => "MEDIUM",
            RiskLevel::High => "HIGH",
        }
    }
}

/// The classifier's verdict for one ETF at the last bar of its history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradingSignal {
    pub category: SignalCategory,
    /// 0–100.
    pub confidence: f64,
    /// Weighted sub-signal average in [-1, 1].
    pub score: f64,
    pub reasons: Vec<String>,
    pub sub_signals: BTreeMap<IndicatorKind, SubSignal>,
    pub risk_level: RiskLevel,
    pub entry_price: Option<f64>,
    pub price_target: Option<f64>,
    pub stop_loss: Option<f64>,
}

impl TradingSignal {
    pub fn sub_signal(&self, kind: IndicatorKind) -> Option<&SubSignal> {
        self.sub_signals.get(&kind)
    }
}
