//! Multi-factor scoring.
//!
//! Five dimensions are scored on 0–100 and blended with the weight profile of
//! a [`ScoringStrategy`] chosen when the [`MultiFactorScorer`] is built.

pub mod scorer;
pub mod strategy;

pub use scorer::{
    fee_score, return_score, risk_score, technical_score, MultiFactorScorer, ScoreBreakdown,
    ScoreInputs, SubScores, TechnicalSnapshot,
};
pub use strategy::{ScoringStrategy, StrategyWeights};
