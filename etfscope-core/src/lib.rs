//! EtfScope Core — indicator engine, signal classifier, multi-factor scorer.
//!
//! Everything here is a pure, synchronous function of its inputs:
//! - Domain types (price bars, holdings)
//! - Indicator engine over a bar history ([`series::IndicatorSeries`])
//! - Performance metrics (returns, volatility, drawdown, Sharpe)
//! - Seven-vote signal classifier producing a [`signal::TradingSignal`]
//! - Strategy-weighted multi-factor scorer and recommendation explainer
//! - Liquidity and fee screening
//!
//! Short histories never fail: indicators that need more bars are undefined
//! and their votes are neutral. Invalid explicit configuration fails at
//! construction with a [`error::ConfigError`].

pub mod config;
pub mod domain;
pub mod error;
pub mod explain;
pub mod indicators;
pub mod performance;
pub mod scoring;
pub mod screener;
pub mod series;
pub mod signal;

pub use config::AnalysisConfig;
pub use domain::{PriceBar, PriceField};
pub use error::ConfigError;
pub use series::IndicatorSeries;
