//! EtfScope Runner — batch orchestration around `etfscope-core`.
//!
//! This crate provides:
//! - CSV price-history and screening-candidate loading with validation
//! - ETF pool configuration (TOML)
//! - An explicit TTL cache for loaded histories
//! - Parallel batch analysis with per-ETF failure collection and ranking
//! - Input fingerprinting and seeded synthetic histories
//! - Versioned JSON and CSV summary export

pub mod batch;
pub mod cache;
pub mod export;
pub mod fingerprint;
pub mod loader;
pub mod pool;
pub mod synthetic;

pub use batch::{
    composite_score, rank_reports, AnalyzeError, BatchFailure, BatchOutcome, BatchRunner,
    EtfInput, EtfReport,
};
pub use cache::{CacheStats, HistoryStore, TtlCache};
pub use export::{
    export_json, import_json, summary_csv, write_csv, write_json, BatchDocument, ExportError,
    SCHEMA_VERSION,
};
pub use fingerprint::input_fingerprint;
pub use loader::{load_candidates_csv, load_history_csv, LoadError};
pub use pool::{EtfEntry, PoolConfig, PoolDef, PoolError};
pub use synthetic::synthetic_history;

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn report_types_are_send_sync() {
        assert_send::<EtfReport>();
        assert_sync::<EtfReport>();
        assert_send::<BatchOutcome>();
        assert_sync::<BatchOutcome>();
        assert_send::<BatchDocument>();
        assert_sync::<BatchDocument>();
    }

    #[test]
    fn runner_is_send_sync() {
        assert_send::<BatchRunner>();
        assert_sync::<BatchRunner>();
        assert_send::<EtfInput>();
        assert_sync::<EtfInput>();
    }

    #[test]
    fn history_store_is_send_sync() {
        assert_send::<HistoryStore>();
        assert_sync::<HistoryStore>();
    }

    #[test]
    fn pool_config_is_send_sync() {
        assert_send::<PoolConfig>();
        assert_sync::<PoolConfig>();
    }

    #[test]
    fn errors_are_send_sync() {
        assert_send::<AnalyzeError>();
        assert_sync::<AnalyzeError>();
        assert_send::<ExportError>();
        assert_sync::<ExportError>();
        assert_send::<PoolError>();
        assert_sync::<PoolError>();
    }
}
