//! Result export — a versioned JSON document and a flat CSV summary.
//!
//! The JSON document carries a `schema_version`; newer versions are
//! rejected on import. Optional report fields serialize as `null`.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use etfscope_core::scoring::ScoringStrategy;

use crate::batch::{BatchFailure, BatchOutcome, EtfReport};

pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("unsupported schema version {found} (max supported: {supported})")]
    UnsupportedSchema { found: u32, supported: u32 },
}

/// Everything a batch run produced, as persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchDocument {
    pub schema_version: u32,
    /// Latest bar date across the analyzed reports.
    pub generated_for: Option<NaiveDate>,
    pub strategy: ScoringStrategy,
    pub reports: Vec<EtfReport>,
    pub failures: Vec<BatchFailure>,
}

impl BatchDocument {
    pub fn new(strategy: ScoringStrategy, outcome: BatchOutcome) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            generated_for: outcome.reports.iter().map(|r| r.end_date).max(),
            strategy,
            reports: outcome.reports,
            failures: outcome.failures,
        }
    }
}

pub fn export_json(doc: &BatchDocument) -> Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(doc)?)
}

/// Parse a document, rejecting schema versions newer than this build.
pub fn import_json(json: &str) -> Result<BatchDocument, ExportError> {
    let doc: BatchDocument = serde_json::from_str(json)?;
    if doc.schema_version > SCHEMA_VERSION {
        return Err(ExportError::UnsupportedSchema {
            found: doc.schema_version,
            supported: SCHEMA_VERSION,
        });
    }
    Ok(doc)
}

pub fn write_json(doc: &BatchDocument, path: &Path) -> Result<(), ExportError> {
    let json = export_json(doc)?;
    std::fs::write(path, json).map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// One line per report, in rank order.
///
/// Columns: rank, code, name, end_date, last_close, signal, confidence,
/// risk_level, total_score, return_score, risk_score, liquidity_score,
/// fee_score, technical_score, composite_score, annual_return, volatility,
/// max_drawdown, sharpe_ratio, entry_price, price_target, stop_loss
pub fn summary_csv(reports: &[EtfReport]) -> Result<String, ExportError> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "rank",
        "code",
        "name",
        "end_date",
        "last_close",
        "signal",
        "confidence",
        "risk_level",
        "total_score",
        "return_score",
        "risk_score",
        "liquidity_score",
        "fee_score",
        "technical_score",
        "composite_score",
        "annual_return",
        "volatility",
        "max_drawdown",
        "sharpe_ratio",
        "entry_price",
        "price_target",
        "stop_loss",
    ])?;

    let opt = |v: Option<f64>| v.map(|x| format!("{x:.3}")).unwrap_or_default();

    for (i, r) in reports.iter().enumerate() {
        let b = &r.recommendation.breakdown;
        let p = &r.performance;
        let s = &r.signal;
        wtr.write_record([
            (i + 1).to_string(),
            r.code.clone(),
            r.name.clone(),
            r.end_date.to_string(),
            format!("{:.3}", r.last_close),
            s.category.code().to_string(),
            format!("{:.0}", s.confidence),
            s.risk_level.as_str().to_string(),
            format!("{:.2}", b.total_score),
            format!("{:.2}", b.return_score),
            format!("{:.2}", b.risk_score),
            format!("{:.2}", b.liquidity_score),
            format!("{:.2}", b.fee_score),
            format!("{:.2}", b.technical_score),
            format!("{:.2}", r.composite_score),
            format!("{:.2}", p.annualized_return),
            format!("{:.2}", p.annualized_volatility),
            format!("{:.2}", p.max_drawdown),
            format!("{:.2}", p.sharpe_ratio),
            opt(s.entry_price),
            opt(s.price_target),
            opt(s.stop_loss),
        ])?;
    }

    let data = wtr
        .into_inner()
        .map_err(|e| ExportError::Io {
            path: PathBuf::from("<memory>"),
            source: e.into_error(),
        })?;
    Ok(String::from_utf8_lossy(&data).into_owned())
}

pub fn write_csv(reports: &[EtfReport], path: &Path) -> Result<(), ExportError> {
    let csv = summary_csv(reports)?;
    std::fs::write(path, csv).map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::{BatchRunner, EtfInput};
    use crate::synthetic::synthetic_history;
    use etfscope_core::AnalysisConfig;

    fn outcome() -> BatchOutcome {
        let start = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let inputs = vec![
            EtfInput::new("510300", "CSI 300 ETF", synthetic_history("510300", start, 60)),
            EtfInput::new("159915", "ChiNext, \"growth\" ETF", synthetic_history("159915", start, 60)),
            EtfInput::new("000000", "Empty", Vec::new()),
        ];
        BatchRunner::new(AnalysisConfig::default(), ScoringStrategy::Balanced)
            .unwrap()
            .run(&inputs)
    }

    #[test]
    fn json_round_trip_preserves_reports() {
        let doc = BatchDocument::new(ScoringStrategy::Balanced, outcome());
        assert_eq!(doc.schema_version, SCHEMA_VERSION);
        assert_eq!(doc.generated_for, doc.reports.iter().map(|r| r.end_date).max());
        assert_eq!(doc.failures.len(), 1);

        let json = export_json(&doc).unwrap();
        assert!(json.contains("\"strategy\": \"balanced\""));
        let back = import_json(&json).unwrap();
        assert_eq!(back.strategy, doc.strategy);
        assert_eq!(back.failures, doc.failures);
        assert_eq!(back.reports.len(), doc.reports.len());
        for (a, b) in back.reports.iter().zip(&doc.reports) {
            assert_eq!(a.code, b.code);
            assert_eq!(a.fingerprint, b.fingerprint);
            assert_eq!(a.signal.category, b.signal.category);
            assert_eq!(a.signal.sub_signals.len(), b.signal.sub_signals.len());
            assert!((a.total_score() - b.total_score()).abs() < 1e-9);
        }
    }

    #[test]
    fn newer_schema_is_rejected() {
        let mut doc = BatchDocument::new(ScoringStrategy::Balanced, BatchOutcome::default());
        doc.schema_version = SCHEMA_VERSION + 1;
        let json = export_json(&doc).unwrap();
        match import_json(&json) {
            Err(ExportError::UnsupportedSchema { found, supported }) => {
                assert_eq!(found, SCHEMA_VERSION + 1);
                assert_eq!(supported, SCHEMA_VERSION);
            }
            other => panic!("expected UnsupportedSchema, got {other:?}"),
        }
    }

    #[test]
    fn empty_outcome_has_no_generation_date() {
        let doc = BatchDocument::new(ScoringStrategy::Conservative, BatchOutcome::default());
        assert_eq!(doc.generated_for, None);
        assert!(export_json(&doc).unwrap().contains("\"generated_for\": null"));
    }

    #[test]
    fn csv_has_one_row_per_report_in_rank_order() {
        let outcome = outcome();
        let csv = summary_csv(&outcome.reports).unwrap();
        let mut rdr = csv::Reader::from_reader(csv.as_bytes());
        let headers = rdr.headers().unwrap().clone();
        assert_eq!(headers.len(), 22);
        assert_eq!(&headers[0], "rank");

        let rows: Vec<csv::StringRecord> = rdr.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 2);
        for (i, (row, report)) in rows.iter().zip(&outcome.reports).enumerate() {
            assert_eq!(row[0], (i + 1).to_string());
            assert_eq!(&row[1], report.code.as_str());
            assert_eq!(&row[2], report.name.as_str());
            assert_eq!(&row[5], report.signal.category.code());
        }
    }
}
