//! Batch analysis of an ETF pool.
//!
//! Each ETF is analyzed independently (indicators, performance, signal,
//! score, explanation), optionally in parallel with rayon. A failing ETF is
//! recorded and never aborts the batch. Reports are ranked by total score.

use std::sync::Arc;

use chrono::NaiveDate;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, info_span, warn};

use etfscope_core::error::ConfigError;
use etfscope_core::explain::{ExplainContext, Recommendation, RecommendationExplainer};
use etfscope_core::performance::{analyze_performance, find_support_resistance, PerformanceSummary, SupportResistance};
use etfscope_core::scoring::{MultiFactorScorer, ScoreInputs, ScoringStrategy};
use etfscope_core::screener::{average_amount, liquidity_score, FeeSchedule};
use etfscope_core::signal::{SignalCategory, SignalClassifier, TradingSignal};
use etfscope_core::{AnalysisConfig, IndicatorSeries, PriceBar};

use crate::cache::HistoryStore;
use crate::fingerprint::input_fingerprint;
use crate::loader::LoadError;
use crate::pool::{EtfEntry, PoolConfig};

/// Liquidity score used when the fund scale is unknown.
pub const NEUTRAL_LIQUIDITY: f64 = 50.0;
/// Sessions of turnover averaged when no average is supplied.
pub const TURNOVER_WINDOW: usize = 30;

#[derive(Debug, Error)]
pub enum AnalyzeError {
    #[error("{code}: price history is empty")]
    EmptyHistory { code: String },

    #[error("{code}: {source}")]
    Load {
        code: String,
        #[source]
        source: LoadError,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// One ETF's bars plus the scalars that do not come from bars.
#[derive(Debug, Clone)]
pub struct EtfInput {
    pub code: String,
    pub name: String,
    pub bars: Arc<Vec<PriceBar>>,
    pub premium_rate: Option<f64>,
    pub fee_rate: Option<f64>,
    pub scale: Option<f64>,
    pub avg_amount: Option<f64>,
}

impl EtfInput {
    pub fn new(code: impl Into<String>, name: impl Into<String>, bars: Vec<PriceBar>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            bars: Arc::new(bars),
            premium_rate: None,
            fee_rate: None,
            scale: None,
            avg_amount: None,
        }
    }

    pub fn from_entry(entry: &EtfEntry, bars: Arc<Vec<PriceBar>>) -> Self {
        Self {
            code: entry.code.clone(),
            name: entry.name.clone(),
            bars,
            premium_rate: entry.premium_rate,
            fee_rate: entry.fee_rate,
            scale: entry.scale,
            avg_amount: entry.avg_amount,
        }
    }
}

/// Everything computed for one ETF.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EtfReport {
    pub code: String,
    pub name: String,
    /// BLAKE3 of the analyzed bars.
    pub fingerprint: String,
    pub bar_count: usize,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub last_close: f64,
    pub premium_rate: Option<f64>,
    pub fee_rate: f64,
    pub liquidity_score: f64,
    pub performance: PerformanceSummary,
    pub support_resistance: Option<SupportResistance>,
    pub signal: TradingSignal,
    pub recommendation: Recommendation,
    /// 0–100 blend of signal, confidence, return and Sharpe.
    pub composite_score: f64,
}

impl EtfReport {
    pub fn total_score(&self) -> f64 {
        self.recommendation.breakdown.total_score
    }
}

/// An ETF the batch could not analyze.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchFailure {
    pub code: String,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchOutcome {
    /// Ranked, best first.
    pub reports: Vec<EtfReport>,
    pub failures: Vec<BatchFailure>,
}

impl BatchOutcome {
    /// Reports with the given signal category, in rank order.
    pub fn by_category(&self, category: SignalCategory) -> Vec<&EtfReport> {
        self.reports
            .iter()
            .filter(|r| r.signal.category == category)
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty() && self.failures.is_empty()
    }
}

/// Ranking score on 0–100 combining the trading signal with the return
/// profile: base 50, ±40 for the category, up to ±18 from confidence and
/// −10..+20 each from annualized return and Sharpe ratio.
pub fn composite_score(
    category: SignalCategory,
    confidence: f64,
    annual_return: f64,
    sharpe_ratio: f64,
) -> f64 {
    let mut score = 50.0;

    score += match category {
        SignalCategory::StrongBuy => 40.0,
        SignalCategory::Buy => 30.0,
        SignalCategory::Hold => 0.0,
        SignalCategory::Sell => -30.0,
        SignalCategory::StrongSell => -40.0,
    };

    score += (confidence - 50.0) / 5.0 * 2.0;

    score += if annual_return > 20.0 {
        20.0
    } else if annual_return > 10.0 {
        15.0
    } else if annual_return > 5.0 {
        10.0
    } else if annual_return > 0.0 {
        5.0
    } else {
        -10.0
    };

    score += if sharpe_ratio > 2.0 {
        20.0
    } else if sharpe_ratio > 1.0 {
        15.0
    } else if sharpe_ratio > 0.5 {
        10.0
    } else if sharpe_ratio > 0.0 {
        5.0
    } else {
        -10.0
    };

    score.clamp(0.0, 100.0)
}

/// Best first: total score, then composite score, then code.
pub fn rank_reports(reports: &mut [EtfReport]) {
    reports.sort_by(|a, b| {
        b.total_score()
            .total_cmp(&a.total_score())
            .then_with(|| b.composite_score.total_cmp(&a.composite_score))
            .then_with(|| a.code.cmp(&b.code))
    });
}

/// Runs the per-ETF pipeline over many ETFs.
#[derive(Debug, Clone)]
pub struct BatchRunner {
    config: AnalysisConfig,
    scorer: MultiFactorScorer,
    classifier: SignalClassifier,
    explainer: RecommendationExplainer,
    fees: FeeSchedule,
    lookback_bars: Option<usize>,
    parallel: bool,
}

impl BatchRunner {
    pub fn new(config: AnalysisConfig, strategy: ScoringStrategy) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            scorer: MultiFactorScorer::new(strategy),
            classifier: SignalClassifier::new(),
            explainer: RecommendationExplainer::new(),
            fees: FeeSchedule::standard(),
            lookback_bars: None,
            parallel: true,
        })
    }

    /// Runner with the pool file's analysis settings, strategy and lookback.
    pub fn from_pool(pool: &PoolConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(pool.analysis.clone(), pool.strategy)?.with_lookback(pool.lookback_bars))
    }

    pub fn with_fees(mut self, fees: FeeSchedule) -> Self {
        self.fees = fees;
        self
    }

    pub fn with_explainer(mut self, explainer: RecommendationExplainer) -> Self {
        self.explainer = explainer;
        self
    }

    pub fn with_strategy(mut self, strategy: ScoringStrategy) -> Self {
        self.scorer = MultiFactorScorer::new(strategy);
        self
    }

    /// Analyze only the trailing `bars` of each history.
    pub fn with_lookback(mut self, bars: Option<usize>) -> Self {
        self.lookback_bars = bars;
        self
    }

    pub fn with_parallelism(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn strategy(&self) -> ScoringStrategy {
        self.scorer.strategy()
    }

    /// Full pipeline for one ETF.
    pub fn analyze_etf(&self, input: &EtfInput) -> Result<EtfReport, AnalyzeError> {
        let _span = info_span!("analyze", code = %input.code).entered();

        let all = input.bars.as_slice();
        let start = match self.lookback_bars {
            Some(n) => all.len().saturating_sub(n),
            None => 0,
        };
        let bars = &all[start..];
        let (Some(first), Some(last)) = (bars.first(), bars.last()) else {
            return Err(AnalyzeError::EmptyHistory {
                code: input.code.clone(),
            });
        };
        let (start_date, end_date, last_close) = (first.date, last.date, last.close);

        let fingerprint = input_fingerprint(bars);
        let performance =
            analyze_performance(bars, self.config.price_field, self.config.risk_free_rate);
        let support_resistance = find_support_resistance(bars, self.config.support_window)?;
        let liquidity = match input.scale {
            Some(scale) => liquidity_score(
                scale,
                input
                    .avg_amount
                    .or_else(|| average_amount(bars, TURNOVER_WINDOW)),
            ),
            None => NEUTRAL_LIQUIDITY,
        };
        let fee_rate = input.fee_rate.unwrap_or_else(|| self.fees.rate(&input.code));

        let series = IndicatorSeries::compute(bars.to_vec(), &self.config)?;
        let signal = self.classifier.classify(&series, input.premium_rate);
        let breakdown = self.scorer.score(
            &ScoreInputs::from_performance(&performance, liquidity, fee_rate),
            Some(&series),
        );
        let recommendation = self.explainer.explain(
            &breakdown,
            &ExplainContext {
                code: input.code.clone(),
                name: input.name.clone(),
                annual_return: performance.annualized_return,
                volatility: performance.annualized_volatility,
                max_drawdown: performance.max_drawdown,
                scale: input.scale,
                fee_rate,
            },
        );
        let composite = composite_score(
            signal.category,
            signal.confidence,
            performance.annualized_return,
            performance.sharpe_ratio,
        );

        info!(
            category = %signal.category,
            total = breakdown.total_score,
            composite,
            "analyzed"
        );

        Ok(EtfReport {
            code: input.code.clone(),
            name: input.name.clone(),
            fingerprint,
            bar_count: bars.len(),
            start_date,
            end_date,
            last_close,
            premium_rate: input.premium_rate,
            fee_rate,
            liquidity_score: liquidity,
            performance,
            support_resistance,
            signal,
            recommendation,
            composite_score: composite,
        })
    }

    /// Analyze in-memory inputs.
    pub fn run(&self, inputs: &[EtfInput]) -> BatchOutcome {
        let results: Vec<(String, Result<EtfReport, AnalyzeError>)> = if self.parallel {
            inputs
                .par_iter()
                .map(|input| (input.code.clone(), self.analyze_etf(input)))
                .collect()
        } else {
            inputs
                .iter()
                .map(|input| (input.code.clone(), self.analyze_etf(input)))
                .collect()
        };
        collect_outcome(results)
    }

    /// Load each entry's history through `store`, then analyze.
    pub fn run_entries(&self, entries: &[&EtfEntry], store: &HistoryStore) -> BatchOutcome {
        let job = |entry: &&EtfEntry| {
            let result = store
                .load(&entry.history)
                .map_err(|source| AnalyzeError::Load {
                    code: entry.code.clone(),
                    source,
                })
                .and_then(|bars| self.analyze_etf(&EtfInput::from_entry(entry, bars)));
            (entry.code.clone(), result)
        };
        let results: Vec<_> = if self.parallel {
            entries.par_iter().map(job).collect()
        } else {
            entries.iter().map(job).collect()
        };
        collect_outcome(results)
    }
}

fn collect_outcome(results: Vec<(String, Result<EtfReport, AnalyzeError>)>) -> BatchOutcome {
    let mut outcome = BatchOutcome::default();
    for (code, result) in results {
        match result {
            Ok(report) => outcome.reports.push(report),
            Err(e) => {
                warn!(code = %code, error = %e, "analysis failed");
                outcome.failures.push(BatchFailure {
                    code,
                    error: e.to_string(),
                });
            }
        }
    }
    rank_reports(&mut outcome.reports);
    info!(
        analyzed = outcome.reports.len(),
        failed = outcome.failures.len(),
        "batch complete"
    );
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synthetic::synthetic_history;

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()
    }

    fn runner() -> BatchRunner {
        BatchRunner::new(AnalysisConfig::default(), ScoringStrategy::Balanced).unwrap()
    }

    #[test]
    fn composite_score_tiers() {
        // 50 + 40 + (95-50)/5*2 + 20 + 20 clamps to 100
        assert_eq!(composite_score(SignalCategory::StrongBuy, 95.0, 25.0, 2.5), 100.0);
        // 50 + 0 + 0 + 5 + 5
        assert_eq!(composite_score(SignalCategory::Hold, 50.0, 3.0, 0.2), 60.0);
        // 50 - 30 + 6 - 10 - 10
        assert_eq!(composite_score(SignalCategory::Sell, 65.0, -4.0, -0.3), 6.0);
        // 50 - 40 + 18 - 10 - 10
        assert_eq!(composite_score(SignalCategory::StrongSell, 95.0, -20.0, -1.0), 8.0);
        // 50 - 40 - 20 - 10 - 10 clamps to 0
        assert_eq!(composite_score(SignalCategory::StrongSell, 0.0, -20.0, -1.0), 0.0);
        // boundaries are exclusive
        assert_eq!(composite_score(SignalCategory::Hold, 50.0, 20.0, 2.0), 80.0);
    }

    #[test]
    fn analyzes_synthetic_etf() {
        let mut input = EtfInput::new("510300", "CSI 300 ETF", synthetic_history("510300", start(), 120));
        input.scale = Some(900.0);
        input.premium_rate = Some(-0.2);
        let report = runner().analyze_etf(&input).unwrap();

        assert_eq!(report.bar_count, 120);
        assert_eq!(report.fee_rate, 0.50);
        assert!(report.liquidity_score >= 70.0);
        assert!((0.0..=100.0).contains(&report.total_score()));
        assert!((0.0..=100.0).contains(&report.composite_score));
        assert!(report.signal.sub_signal(etfscope_core::signal::IndicatorKind::Premium).is_some());
        assert_eq!(report.fingerprint, input_fingerprint(&input.bars));
        assert_eq!(report.recommendation.code, "510300");
    }

    #[test]
    fn unknown_scale_is_neutral_liquidity_and_fee_override_wins() {
        let mut input = EtfInput::new("159001", "Unknown ETF", synthetic_history("159001", start(), 40));
        input.fee_rate = Some(0.15);
        let report = runner().analyze_etf(&input).unwrap();
        assert_eq!(report.liquidity_score, NEUTRAL_LIQUIDITY);
        assert_eq!(report.fee_rate, 0.15);
        assert_eq!(report.recommendation.breakdown.fee_score, 100.0);
    }

    #[test]
    fn lookback_trims_history() {
        let bars = synthetic_history("512480", start(), 200);
        let input = EtfInput::new("512480", "Semiconductor ETF", bars.clone());
        let report = runner().with_lookback(Some(60)).analyze_etf(&input).unwrap();
        assert_eq!(report.bar_count, 60);
        assert_eq!(report.start_date, bars[140].date);
        assert_eq!(report.end_date, bars[199].date);
    }

    #[test]
    fn empty_history_fails_without_aborting_batch() {
        let inputs = vec![
            EtfInput::new("510300", "CSI 300 ETF", synthetic_history("510300", start(), 80)),
            EtfInput::new("000000", "Empty", Vec::new()),
            EtfInput::new("159915", "ChiNext ETF", synthetic_history("159915", start(), 80)),
        ];
        let outcome = runner().run(&inputs);
        assert_eq!(outcome.reports.len(), 2);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].code, "000000");
        assert!(outcome.failures[0].error.contains("empty"));
    }

    #[test]
    fn reports_are_ranked_and_parallelism_is_invisible() {
        let inputs: Vec<EtfInput> = ["510300", "159915", "588000", "512480", "515000"]
            .iter()
            .map(|code| EtfInput::new(*code, *code, synthetic_history(code, start(), 90)))
            .collect();
        let parallel = runner().run(&inputs);
        let sequential = runner().with_parallelism(false).run(&inputs);
        assert_eq!(parallel, sequential);

        for pair in parallel.reports.windows(2) {
            assert!(pair[0].total_score() >= pair[1].total_score());
        }
        let categorized: usize = SignalCategory::ALL
            .iter()
            .map(|c| parallel.by_category(*c).len())
            .sum();
        assert_eq!(categorized, parallel.reports.len());
    }

    #[test]
    fn strategy_changes_scores_not_signals() {
        let input = EtfInput::new("588000", "STAR 50 ETF", synthetic_history("588000", start(), 90));
        let balanced = runner().analyze_etf(&input).unwrap();
        let aggressive = runner()
            .with_strategy(ScoringStrategy::Aggressive)
            .analyze_etf(&input)
            .unwrap();
        assert_eq!(balanced.signal, aggressive.signal);
        assert_eq!(
            balanced.recommendation.breakdown.return_score,
            aggressive.recommendation.breakdown.return_score
        );
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = AnalysisConfig {
            macd_fast: 30,
            ..AnalysisConfig::default()
        };
        assert!(BatchRunner::new(config, ScoringStrategy::Balanced).is_err());
    }
}
