//! Price history and screening universe loading from CSV.
//!
//! History files carry a header row `date,open,high,low,close,volume` with
//! an optional `amount` column; dates are `YYYY-MM-DD`. Rows must be in
//! strictly ascending date order. Nothing is repaired silently.

use std::io::{Read, Write};
use std::path::Path;

use chrono::NaiveDate;
use thiserror::Error;

use etfscope_core::screener::ScreenCandidate;
use etfscope_core::PriceBar;

/// Errors from reading or validating CSV inputs.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("history is empty")]
    EmptyHistory,

    #[error("row {row}: duplicate date {date}")]
    DuplicateDate { row: usize, date: NaiveDate },

    #[error("row {row}: date {date} is before the previous row's {previous}")]
    OutOfOrder {
        row: usize,
        date: NaiveDate,
        previous: NaiveDate,
    },

    #[error("row {row}: non-finite value in {date}")]
    NonFinite { row: usize, date: NaiveDate },
}

/// Load a price history file.
pub fn load_history_csv(path: &Path) -> Result<Vec<PriceBar>, LoadError> {
    let file = std::fs::File::open(path).map_err(|source| LoadError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let bars = read_history(file)?;
    tracing::debug!(path = %path.display(), bars = bars.len(), "loaded history");
    Ok(bars)
}

/// Parse and validate a price history from any reader.
pub fn read_history<R: Read>(reader: R) -> Result<Vec<PriceBar>, LoadError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut bars: Vec<PriceBar> = Vec::new();
    for record in rdr.deserialize() {
        bars.push(record?);
    }
    validate_history(&bars)?;
    Ok(bars)
}

/// Check ordering and finiteness. Row numbers are 1-based data rows.
pub fn validate_history(bars: &[PriceBar]) -> Result<(), LoadError> {
    if bars.is_empty() {
        return Err(LoadError::EmptyHistory);
    }
    for (i, bar) in bars.iter().enumerate() {
        let row = i + 1;
        let values = [bar.open, bar.high, bar.low, bar.close, bar.volume, bar.amount];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(LoadError::NonFinite {
                row,
                date: bar.date,
            });
        }
        if let Some(prev) = i.checked_sub(1).map(|j| &bars[j]) {
            if bar.date == prev.date {
                return Err(LoadError::DuplicateDate {
                    row,
                    date: bar.date,
                });
            }
            if bar.date < prev.date {
                return Err(LoadError::OutOfOrder {
                    row,
                    date: bar.date,
                    previous: prev.date,
                });
            }
        }
    }
    Ok(())
}

/// Write bars in the same layout [`read_history`] accepts.
pub fn write_history<W: Write>(writer: W, bars: &[PriceBar]) -> Result<(), csv::Error> {
    let mut wtr = csv::Writer::from_writer(writer);
    for bar in bars {
        wtr.serialize(bar)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Load a screening universe: `code,name,scale[,avg_amount][,exchange]`.
pub fn load_candidates_csv(path: &Path) -> Result<Vec<ScreenCandidate>, LoadError> {
    let file = std::fs::File::open(path).map_err(|source| LoadError::Io {
        path: path.display().to_string(),
        source,
    })?;
    read_candidates(file)
}

pub fn read_candidates<R: Read>(reader: R) -> Result<Vec<ScreenCandidate>, LoadError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut out = Vec::new();
    for record in rdr.deserialize() {
        out.push(record?);
    }
    Ok(out)
}
