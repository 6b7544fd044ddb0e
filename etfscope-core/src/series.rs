//! IndicatorSeries — a bar history augmented with computed indicator lines.
//!
//! Each `with_*` step is a pure transformation: it consumes the series and
//! returns it with one more family of lines attached. Lines are stored as
//! named, typed vectors parallel to the bars, with `f64::NAN` where a value
//! is undefined. Accessors hand out `Option<f64>` so callers never see NaN.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::AnalysisConfig;
use crate::domain::{PriceBar, PriceField};
use crate::error::ConfigError;
use crate::indicators::{
    cumulative_returns, daily_returns, defined, value_at, Bollinger, BollingerLines, Indicator,
    Macd, MacdLines, RollingVolatility, Rsi, Sma,
};

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSeries {
    bars: Vec<PriceBar>,
    price_field: PriceField,
    daily_return: Option<Vec<f64>>,
    cumulative_return: Option<Vec<f64>>,
    moving_averages: BTreeMap<usize, Vec<f64>>,
    rsi: Option<Vec<f64>>,
    macd: Option<MacdLines>,
    bollinger: Option<BollingerLines>,
    volatility: Option<Vec<f64>>,
}

impl IndicatorSeries {
    /// Wrap a date-ascending bar history with no computed lines.
    pub fn new(bars: Vec<PriceBar>) -> Self {
        Self {
            bars,
            price_field: PriceField::Close,
            daily_return: None,
            cumulative_return: None,
            moving_averages: BTreeMap::new(),
            rsi: None,
            macd: None,
            bollinger: None,
            volatility: None,
        }
    }

    /// Validate `config` and compute every indicator it describes.
    pub fn compute(bars: Vec<PriceBar>, config: &AnalysisConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let field = config.price_field;
        Self::new(bars)
            .with_price_field(field)
            .with_returns(field)
            .with_moving_averages(&config.ma_windows, field)?
            .with_rsi(config.rsi_period, field)?
            .with_macd(config.macd_fast, config.macd_slow, config.macd_signal, field)?
            .with_bollinger(config.bollinger_window, config.bollinger_std, field)?
            .with_volatility(config.volatility_window, field)
    }

    // ─── Computations ───────────────────────────────────────────────

    /// Price the lines are built on; [`Self::last_price`] reads the same one.
    pub fn with_price_field(mut self, field: PriceField) -> Self {
        self.price_field = field;
        self
    }

    /// Daily percentage return and cumulative return since the first bar.
    pub fn with_returns(mut self, field: PriceField) -> Self {
        let prices = field.extract(&self.bars);
        self.daily_return = Some(daily_returns(&prices));
        self.cumulative_return = Some(cumulative_returns(&prices));
        self
    }

    /// Simple moving average per window. Windows longer than the series are
    /// stored as all-undefined.
    pub fn with_moving_averages(
        mut self,
        windows: &[usize],
        field: PriceField,
    ) -> Result<Self, ConfigError> {
        for &window in windows {
            let sma = Sma::new(window, field)?;
            self.moving_averages.insert(window, sma.compute(&self.bars));
        }
        Ok(self)
    }

    pub fn with_rsi(mut self, period: usize, field: PriceField) -> Result<Self, ConfigError> {
        self.rsi = Some(Rsi::new(period, field)?.compute(&self.bars));
        Ok(self)
    }

    pub fn with_macd(
        mut self,
        fast: usize,
        slow: usize,
        signal: usize,
        field: PriceField,
    ) -> Result<Self, ConfigError> {
        self.macd = Some(Macd::new(fast, slow, signal, field)?.compute(&self.bars));
        Ok(self)
    }

    pub fn with_bollinger(
        mut self,
        window: usize,
        num_std: f64,
        field: PriceField,
    ) -> Result<Self, ConfigError> {
        self.bollinger = Some(Bollinger::new(window, num_std, field)?.compute(&self.bars));
        Ok(self)
    }

    /// Rolling annualized volatility of daily returns, in percent.
    pub fn with_volatility(mut self, window: usize, field: PriceField) -> Result<Self, ConfigError> {
        self.volatility = Some(RollingVolatility::new(window, field)?.compute(&self.bars));
        Ok(self)
    }

    // ─── Accessors ──────────────────────────────────────────────────

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn closes(&self) -> Vec<f64> {
        PriceField::Close.extract(&self.bars)
    }

    pub fn volumes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.volume).collect()
    }

    pub fn last_close(&self) -> Option<f64> {
        self.bars.last().and_then(|b| defined(b.close))
    }

    pub fn price_field(&self) -> PriceField {
        self.price_field
    }

    /// Last bar's value of the price field the indicator lines use.
    pub fn last_price(&self) -> Option<f64> {
        self.bars
            .last()
            .and_then(|b| defined(b.price(self.price_field)))
    }

    pub fn daily_return(&self) -> Option<&[f64]> {
        self.daily_return.as_deref()
    }

    pub fn cumulative_return(&self) -> Option<&[f64]> {
        self.cumulative_return.as_deref()
    }

    pub fn moving_average(&self, window: usize) -> Option<&[f64]> {
        self.moving_averages.get(&window).map(Vec::as_slice)
    }

    pub fn rsi(&self) -> Option<&[f64]> {
        self.rsi.as_deref()
    }

    pub fn macd(&self) -> Option<&MacdLines> {
        self.macd.as_ref()
    }

    pub fn bollinger(&self) -> Option<&BollingerLines> {
        self.bollinger.as_ref()
    }

    pub fn volatility(&self) -> Option<&[f64]> {
        self.volatility.as_deref()
    }

    /// Moving average value `back` bars before the last one (0 = last bar).
    pub fn ma_back(&self, window: usize, back: usize) -> Option<f64> {
        let line = self.moving_average(window)?;
        let index = line.len().checked_sub(1 + back)?;
        value_at(line, index)
    }

    /// Per-bar rows with undefined values as `None`, for export.
    pub fn rows(&self) -> Vec<IndicatorRow> {
        let opt = |line: Option<&[f64]>, i: usize| line.and_then(|l| value_at(l, i));
        self.bars
            .iter()
            .enumerate()
            .map(|(i, bar)| IndicatorRow {
                bar: bar.clone(),
                daily_return: opt(self.daily_return(), i),
                cumulative_return: opt(self.cumulative_return(), i),
                moving_averages: self
                    .moving_averages
                    .iter()
                    .map(|(w, line)| (format!("ma_{w}"), value_at(line, i)))
                    .collect(),
                rsi: opt(self.rsi(), i),
                macd: opt(self.macd.as_ref().map(|m| m.macd.as_slice()), i),
                macd_signal: opt(self.macd.as_ref().map(|m| m.signal.as_slice()), i),
                macd_histogram: opt(self.macd.as_ref().map(|m| m.histogram.as_slice()), i),
                bb_upper: opt(self.bollinger.as_ref().map(|b| b.upper.as_slice()), i),
                bb_middle: opt(self.bollinger.as_ref().map(|b| b.middle.as_slice()), i),
                bb_lower: opt(self.bollinger.as_ref().map(|b| b.lower.as_slice()), i),
                volatility: opt(self.volatility(), i),
            })
            .collect()
    }
}

/// One bar with every computed value; missing values serialize as null.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorRow {
    #[serde(flatten)]
    pub bar: PriceBar,
    pub daily_return: Option<f64>,
    pub cumulative_return: Option<f64>,
    pub moving_averages: BTreeMap<String, Option<f64>>,
    pub rsi: Option<f64>,
    pub macd: Option<f64>,
    pub macd_signal: Option<f64>,
    pub macd_histogram: Option<f64>,
    pub bb_upper: Option<f64>,
    pub bb_middle: Option<f64>,
    pub bb_lower: Option<f64>,
    pub volatility: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::make_bars;

    fn rising(n: usize) -> Vec<PriceBar> {
        let closes: Vec<f64> = (0..n).map(|i| 10.0 + i as f64 * 0.05).collect();
        make_bars(&closes)
    }

    #[test]
    fn compute_attaches_every_line() {
        let series = IndicatorSeries::compute(rising(70), &AnalysisConfig::default()).unwrap();
        assert_eq!(series.len(), 70);
        assert!(series.daily_return().is_some());
        assert!(series.cumulative_return().is_some());
        for w in [5, 10, 20, 60] {
            assert_eq!(series.moving_average(w).unwrap().len(), 70);
        }
        assert!(series.rsi().is_some());
        assert!(series.macd().is_some());
        assert!(series.bollinger().is_some());
        assert!(series.volatility().is_some());
    }

    #[test]
    fn window_longer_than_series_is_all_undefined() {
        let series = IndicatorSeries::new(rising(30))
            .with_moving_averages(&[5, 60], PriceField::Close)
            .unwrap();
        assert!(series.moving_average(60).unwrap().iter().all(|v| v.is_nan()));
        assert_eq!(series.ma_back(60, 0), None);
        assert!(series.ma_back(5, 0).is_some());
    }

    #[test]
    fn zero_window_fails_fast() {
        let result = IndicatorSeries::new(rising(10)).with_moving_averages(&[5, 0], PriceField::Close);
        assert!(matches!(result, Err(ConfigError::InvalidWindow { value: 0, .. })));
    }

    #[test]
    fn ma_back_reads_previous_bars() {
        let series = IndicatorSeries::new(make_bars(&[1.0, 2.0, 3.0, 4.0]))
            .with_moving_averages(&[2], PriceField::Close)
            .unwrap();
        assert_eq!(series.ma_back(2, 0), Some(3.5));
        assert_eq!(series.ma_back(2, 1), Some(2.5));
        assert_eq!(series.ma_back(2, 3), None);
        assert_eq!(series.ma_back(2, 9), None);
        assert_eq!(series.ma_back(3, 0), None);
    }

    #[test]
    fn rows_map_undefined_to_none() {
        let series = IndicatorSeries::compute(rising(25), &AnalysisConfig::default()).unwrap();
        let rows = series.rows();
        assert_eq!(rows.len(), 25);
        assert_eq!(rows[0].daily_return, None);
        assert_eq!(rows[0].cumulative_return, Some(0.0));
        assert_eq!(rows[3].moving_averages["ma_5"], None);
        assert!(rows[4].moving_averages["ma_5"].is_some());
        assert_eq!(rows[24].macd, None);
        assert!(rows[24].bb_middle.is_some());

        let json = serde_json::to_value(&rows[0]).unwrap();
        assert!(json["rsi"].is_null());
        assert_eq!(json["close"], 10.0);
    }

    #[test]
    fn empty_series_is_fine() {
        let series = IndicatorSeries::compute(Vec::new(), &AnalysisConfig::default()).unwrap();
        assert!(series.is_empty());
        assert_eq!(series.last_close(), None);
        assert!(series.rows().is_empty());
    }
}
