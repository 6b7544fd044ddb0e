//! Liquidity and fee screening of an ETF universe.
//!
//! Scale is in 100 million fund units and turnover in 100 million currency
//! units, the way exchanges publish them.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::PriceBar;
use crate::error::ConfigError;

/// Total annual fee (percent) for codes missing from a [`FeeSchedule`].
pub const DEFAULT_FEE_RATE: f64 = 0.60;

/// Names containing these are money-market, bond or wealth products.
pub const DEFAULT_EXCLUDE_KEYWORDS: [&str; 4] = ["货币", "债", "理财", "短融"];

const AMOUNT_UNIT: f64 = 1e8;

/// Liquidity on 0–100: up to 70 points from scale and 30 from average daily
/// turnover. Without turnover data the scale points are stretched to the
/// full range.
pub fn liquidity_score(scale: f64, avg_amount: Option<f64>) -> f64 {
    let scale_points = if scale >= 100.0 {
        70.0
    } else if scale >= 50.0 {
        60.0
    } else if scale >= 20.0 {
        50.0
    } else if scale >= 10.0 {
        40.0
    } else if scale >= 5.0 {
        30.0
    } else if scale >= 2.0 {
        20.0
    } else {
        scale * 10.0
    };

    let score = match avg_amount {
        Some(amount) => {
            let amount_points = if amount >= 10.0 {
                30.0
            } else if amount >= 5.0 {
                25.0
            } else if amount >= 2.0 {
                20.0
            } else if amount >= 1.0 {
                15.0
            } else if amount >= 0.5 {
                10.0
            } else {
                amount * 20.0
            };
            scale_points + amount_points
        }
        None => scale_points / 0.7,
    };
    score.min(100.0)
}

/// Mean daily turnover of the trailing `window` bars, in 100 million units.
///
/// `None` when there are no bars or no bar carries a turnover figure.
pub fn average_amount(bars: &[PriceBar], window: usize) -> Option<f64> {
    let tail = &bars[bars.len().saturating_sub(window)..];
    if tail.is_empty() || tail.iter().all(|b| b.amount <= 0.0) {
        return None;
    }
    let total: f64 = tail.iter().map(|b| b.amount).sum();
    Some(total / tail.len() as f64 / AMOUNT_UNIT)
}

/// Known total fee rates by ETF code.
#[derive(Debug, Clone, PartialEq)]
pub struct FeeSchedule {
    rates: HashMap<String, f64>,
    default_rate: f64,
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self::standard()
    }
}

impl FeeSchedule {
    /// Schedule with no known codes.
    pub fn empty(default_rate: f64) -> Self {
        Self {
            rates: HashMap::new(),
            default_rate,
        }
    }

    /// Published rates for the widely traded broad-market and sector ETFs.
    pub fn standard() -> Self {
        let mut schedule = Self::empty(DEFAULT_FEE_RATE);
        for code in [
            "510300", "510500", "159915", "588000", "510050", "159919", "512880",
        ] {
            schedule.insert(code, 0.50);
        }
        schedule.insert("515000", 0.15);
        for code in ["512690", "512480"] {
            schedule.insert(code, 0.80);
        }
        for code in ["159928", "512290", "515880", "512980"] {
            schedule.insert(code, 0.60);
        }
        schedule
    }

    pub fn insert(&mut self, code: impl Into<String>, rate: f64) {
        self.rates.insert(code.into(), rate);
    }

    pub fn rate(&self, code: &str) -> f64 {
        self.rates.get(code).copied().unwrap_or(self.default_rate)
    }

    pub fn default_rate(&self) -> f64 {
        self.default_rate
    }
}

/// Index families, most specific first. The first family with a keyword
/// contained in the ETF name wins.
const INDEX_FAMILIES: &[(&str, &[&str])] = &[
    ("ChiNext 50", &["创业板50", "ChiNext 50"]),
    ("STAR 50", &["科创50", "科创板50", "KC50", "STAR 50"]),
    ("Semiconductor 50", &["半导体50"]),
    ("CSI 300", &["沪深300", "300ETF", "HS300", "CSI 300"]),
    ("CSI 500", &["中证500", "500ETF", "ZZ500", "CSI 500"]),
    ("SSE 50", &["上证50", "50ETF", "SSE 50"]),
    ("ChiNext", &["创业板", "创业板指", "CYBZ", "ChiNext"]),
    ("STAR Market", &["科创板", "科创ETF"]),
    ("Dividend", &["红利", "股息", "Dividend"]),
    ("Brokerage", &["证券", "券商", "Securities"]),
    ("Bank", &["银行", "Bank"]),
    ("Real Estate", &["地产", "房地产"]),
    ("Consumer", &["消费", "内需", "Consumer"]),
    ("Healthcare", &["医药", "医疗", "生物", "Healthcare"]),
    ("Technology", &["科技"]),
    ("Semiconductor", &["半导体", "芯片", "Semiconductor"]),
    ("Telecom", &["通信", "5G"]),
    ("Defense", &["军工", "国防"]),
    ("New Energy", &["新能源", "光伏", "锂电"]),
    ("Liquor", &["白酒", "酒ETF"]),
    ("Media", &["传媒", "文化"]),
    ("Environmental", &["环保"]),
    ("Nonferrous Metals", &["有色金属", "有色"]),
    ("Steel", &["钢铁"]),
    ("Coal", &["煤炭"]),
    ("Oil", &["石油", "油气"]),
    ("Gold", &["黄金", "Gold"]),
    ("Hang Seng", &["恒生", "HSI", "Hang Seng"]),
    ("NASDAQ", &["纳斯达克", "NASDAQ", "NDX"]),
    ("S&P 500", &["标普500", "S&P"]),
];

/// Tracked index of an ETF, from its display name.
///
/// Unrecognized names fall back to the name with ETF/LOF/feeder markers
/// removed, so two share classes of one fund still collapse together.
pub fn index_family(name: &str) -> String {
    for (family, keywords) in INDEX_FAMILIES {
        if keywords.iter().any(|k| name.contains(k)) {
            return (*family).to_string();
        }
    }
    name.replace("ETF", "")
        .replace("LOF", "")
        .replace("联接", "")
        .trim()
        .to_string()
}

/// One ETF of the universe being screened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreenCandidate {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub exchange: Option<String>,
    pub scale: f64,
    #[serde(default)]
    pub avg_amount: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreenResult {
    pub code: String,
    pub name: String,
    pub exchange: Option<String>,
    pub scale: f64,
    pub avg_amount: Option<f64>,
    pub fee_rate: f64,
    pub liquidity_score: f64,
    pub index_family: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenCriteria {
    pub top_n: usize,
    pub min_scale: f64,
    pub max_fee_rate: f64,
    pub exclude_keywords: Vec<String>,
    /// Keep only the most liquid ETF per index family.
    pub dedup_by_index: bool,
}

impl Default for ScreenCriteria {
    fn default() -> Self {
        Self {
            top_n: 10,
            min_scale: 5.0,
            max_fee_rate: DEFAULT_FEE_RATE,
            exclude_keywords: DEFAULT_EXCLUDE_KEYWORDS
                .iter()
                .map(|k| k.to_string())
                .collect(),
            dedup_by_index: true,
        }
    }
}

impl ScreenCriteria {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.min_scale.is_finite() || self.min_scale < 0.0 {
            return Err(ConfigError::InvalidParameter {
                name: "min_scale",
                reason: format!("must be a non-negative number, got {}", self.min_scale),
            });
        }
        if !self.max_fee_rate.is_finite() || self.max_fee_rate < 0.0 {
            return Err(ConfigError::InvalidParameter {
                name: "max_fee_rate",
                reason: format!("must be a non-negative number, got {}", self.max_fee_rate),
            });
        }
        Ok(())
    }
}

/// Filter, score and rank `candidates`, most liquid first.
pub fn screen(
    candidates: &[ScreenCandidate],
    criteria: &ScreenCriteria,
    fees: &FeeSchedule,
) -> Result<Vec<ScreenResult>, ConfigError> {
    criteria.validate()?;

    let mut results: Vec<ScreenResult> = candidates
        .iter()
        .filter(|c| c.scale >= criteria.min_scale)
        .filter(|c| {
            !criteria
                .exclude_keywords
                .iter()
                .any(|k| c.name.contains(k.as_str()))
        })
        .filter_map(|c| {
            let fee_rate = fees.rate(&c.code);
            if fee_rate > criteria.max_fee_rate {
                return None;
            }
            Some(ScreenResult {
                code: c.code.clone(),
                name: c.name.clone(),
                exchange: c.exchange.clone(),
                scale: c.scale,
                avg_amount: c.avg_amount,
                fee_rate,
                liquidity_score: liquidity_score(c.scale, c.avg_amount),
                index_family: index_family(&c.name),
            })
        })
        .collect();

    results.sort_by(|a, b| {
        b.liquidity_score
            .total_cmp(&a.liquidity_score)
            .then_with(|| b.scale.total_cmp(&a.scale))
            .then_with(|| a.code.cmp(&b.code))
    });

    if criteria.dedup_by_index {
        let mut seen = HashSet::new();
        results.retain(|r| seen.insert(r.index_family.clone()));
    }
    results.truncate(criteria.top_n);

    debug!(
        candidates = candidates.len(),
        kept = results.len(),
        "screened"
    );
    Ok(results)
}
