//! Fund holdings and concentration summary.

use serde::{Deserialize, Serialize};

/// One constituent position of an ETF as disclosed by the fund.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    pub stock_code: String,
    pub stock_name: String,
    /// Portfolio weight in percent.
    pub weight: f64,
    #[serde(default)]
    pub shares: Option<f64>,
    #[serde(default)]
    pub market_value: Option<f64>,
}

/// Concentration figures for a holdings list. Weights are in percent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoldingsSummary {
    pub count: usize,
    pub total_weight: f64,
    pub top5_weight: f64,
    pub top10_weight: f64,
}

/// Summarize how concentrated a holdings list is.
///
/// Weights are ranked descending regardless of input order. An empty list
/// yields zeros.
pub fn analyze_holdings(holdings: &[Holding]) -> HoldingsSummary {
    let mut weights: Vec<f64> = holdings
        .iter()
        .map(|h| h.weight)
        .filter(|w| w.is_finite())
        .collect();
    weights.sort_by(|a, b| b.total_cmp(a));

    HoldingsSummary {
        count: holdings.len(),
        total_weight: weights.iter().sum(),
        top5_weight: weights.iter().take(5).sum(),
        top10_weight: weights.iter().take(10).sum(),
    }
}
