//! ETF pool configuration.
//!
//! A pool file lists every ETF once under `[[etf]]` and groups codes into
//! named pools:
//!
//! ```toml
//! default_pool = "broad"
//! strategy = "balanced"
//!
//! [analysis]
//! rsi_period = 14
//!
//! [[etf]]
//! code = "510300"
//! name = "CSI 300 ETF"
//! history = "data/510300.csv"
//! fee_rate = 0.5
//! scale = 900.0
//!
//! [pools.broad]
//! description = "Broad market indices"
//! etfs = ["510300"]
//! ```
//!
//! History paths are resolved against the directory of the pool file.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use etfscope_core::error::ConfigError;
use etfscope_core::scoring::ScoringStrategy;
use etfscope_core::AnalysisConfig;

#[derive(Debug, Error)]
pub enum PoolError {
    #[error("failed to read pool file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid pool file: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("unknown pool '{name}' (available: {available})")]
    UnknownPool { name: String, available: String },

    #[error("pool '{0}' has no ETFs")]
    EmptyPool(String),

    #[error("no pool named and no default_pool set")]
    NoDefaultPool,

    #[error("pool '{pool}' references unknown ETF '{code}'")]
    UnknownEtf { pool: String, code: String },

    #[error("ETF '{0}' is listed more than once")]
    DuplicateEtf(String),

    #[error("invalid analysis settings: {0}")]
    Config(#[from] ConfigError),
}

/// One ETF with the metadata the batch run needs besides its bars.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EtfEntry {
    pub code: String,
    pub name: String,
    /// Price history CSV.
    pub history: PathBuf,
    /// Annual total fee, percent. Falls back to the fee schedule.
    #[serde(default)]
    pub fee_rate: Option<f64>,
    /// Fund scale in 100 million units.
    #[serde(default)]
    pub scale: Option<f64>,
    /// Mean daily turnover in 100 million units. Falls back to the history.
    #[serde(default)]
    pub avg_amount: Option<f64>,
    /// Premium (+) or discount (-) to NAV, percent.
    #[serde(default)]
    pub premium_rate: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PoolDef {
    #[serde(default)]
    pub description: String,
    pub etfs: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PoolConfig {
    #[serde(default)]
    pub default_pool: Option<String>,
    #[serde(default)]
    pub strategy: ScoringStrategy,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    /// Analyze only the trailing N bars of each history.
    #[serde(default)]
    pub lookback_bars: Option<usize>,
    #[serde(default, rename = "etf")]
    pub etfs: Vec<EtfEntry>,
    #[serde(default)]
    pub pools: BTreeMap<String, PoolDef>,
}

impl PoolConfig {
    /// Parse and validate; relative history paths are joined to `base_dir`.
    pub fn from_toml(content: &str, base_dir: &Path) -> Result<Self, PoolError> {
        let mut config: PoolConfig = toml::from_str(content)?;
        for etf in &mut config.etfs {
            if etf.history.is_relative() {
                etf.history = base_dir.join(&etf.history);
            }
        }
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, PoolError> {
        let content = std::fs::read_to_string(path).map_err(|source| PoolError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        Self::from_toml(&content, base_dir)
    }

    pub fn validate(&self) -> Result<(), PoolError> {
        self.analysis.validate()?;
        if self.lookback_bars == Some(0) {
            return Err(ConfigError::InvalidWindow {
                indicator: "lookback_bars",
                value: 0,
            }
            .into());
        }

        let mut seen = HashSet::new();
        for etf in &self.etfs {
            if !seen.insert(etf.code.as_str()) {
                return Err(PoolError::DuplicateEtf(etf.code.clone()));
            }
        }
        for (name, pool) in &self.pools {
            if let Some(code) = pool.etfs.iter().find(|c| !seen.contains(c.as_str())) {
                return Err(PoolError::UnknownEtf {
                    pool: name.clone(),
                    code: code.clone(),
                });
            }
        }
        if let Some(default) = &self.default_pool {
            self.pool(default)?;
        }
        Ok(())
    }

    pub fn pool_names(&self) -> Vec<&str> {
        self.pools.keys().map(String::as_str).collect()
    }

    pub fn pool(&self, name: &str) -> Result<&PoolDef, PoolError> {
        self.pools.get(name).ok_or_else(|| PoolError::UnknownPool {
            name: name.to_string(),
            available: self.pool_names().join(", "),
        })
    }

    /// The named pool, or the default pool when `name` is `None`.
    pub fn resolve(&self, name: Option<&str>) -> Result<(&str, &PoolDef), PoolError> {
        let name = match name.or(self.default_pool.as_deref()) {
            Some(n) => n,
            None => return Err(PoolError::NoDefaultPool),
        };
        let (key, pool) = self
            .pools
            .get_key_value(name)
            .ok_or_else(|| PoolError::UnknownPool {
                name: name.to_string(),
                available: self.pool_names().join(", "),
            })?;
        Ok((key.as_str(), pool))
    }

    pub fn etf(&self, code: &str) -> Option<&EtfEntry> {
        self.etfs.iter().find(|e| e.code == code)
    }

    /// Entries of one pool, in pool order.
    pub fn entries(&self, name: Option<&str>) -> Result<Vec<&EtfEntry>, PoolError> {
        let (pool_name, pool) = self.resolve(name)?;
        if pool.etfs.is_empty() {
            return Err(PoolError::EmptyPool(pool_name.to_string()));
        }
        pool.etfs
            .iter()
            .map(|code| {
                self.etf(code).ok_or_else(|| PoolError::UnknownEtf {
                    pool: pool_name.to_string(),
                    code: code.clone(),
                })
            })
            .collect()
    }

    /// Every listed ETF, each once, in pool-name order.
    pub fn all_entries(&self) -> Vec<&EtfEntry> {
        let mut seen = HashSet::new();
        self.pools
            .values()
            .flat_map(|p| p.etfs.iter())
            .filter(|code| seen.insert(code.as_str()))
            .filter_map(|code| self.etf(code))
            .collect()
    }
}
