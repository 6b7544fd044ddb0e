//! Scoring strategies — fixed weight profiles by risk appetite.
//!
//! - **Conservative**: leans on risk control, liquidity and cost
//! - **Balanced**: even spread with a tilt to returns
//! - **Aggressive**: leans on return potential and technicals

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoringStrategy {
    Conservative,
    #[default]
    Balanced,
    Aggressive,
}

/// Weights over the five score dimensions. Each profile sums to 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrategyWeights {
    pub return_weight: f64,
    pub risk: f64,
    pub liquidity: f64,
    pub fee: f64,
    pub technical: f64,
}

impl StrategyWeights {
    pub fn sum(&self) -> f64 {
        self.return_weight + self.risk + self.liquidity + self.fee + self.technical
    }
}

impl ScoringStrategy {
    pub const ALL: [ScoringStrategy; 3] = [
        ScoringStrategy::Conservative,
        ScoringStrategy::Balanced,
        ScoringStrategy::Aggressive,
    ];

    pub fn weights(self) -> StrategyWeights {
        match self {
            Self::Conservative => StrategyWeights {
                return_weight: 0.20,
                risk: 0.35,
                liquidity: 0.25,
                fee: 0.15,
                technical: 0.05,
            },
            Self::Balanced => StrategyWeights {
                return_weight: 0.30,
                risk: 0.25,
                liquidity: 0.20,
                fee: 0.15,
                technical: 0.10,
            },
            Self::Aggressive => StrategyWeights {
                return_weight: 0.45,
                risk: 0.10,
                liquidity: 0.15,
                fee: 0.10,
                technical: 0.20,
            },
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Conservative => "conservative",
            Self::Balanced => "balanced",
            Self::Aggressive => "aggressive",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::Conservative => {
                "Capital preservation first: favors low volatility, shallow drawdowns, \
                 deep liquidity and low fees"
            }
            Self::Balanced => {
                "Balances return against risk for investors with moderate risk tolerance"
            }
            Self::Aggressive => {
                "Chases return potential and technical momentum, accepting larger swings"
            }
        }
    }
}

impl fmt::Display for ScoringStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScoringStrategy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "conservative" => Ok(Self::Conservative),
            "balanced" => Ok(Self::Balanced),
            "aggressive" => Ok(Self::Aggressive),
            _ => Err(ConfigError::UnknownStrategy(s.to_string())),
        }
    }
}
