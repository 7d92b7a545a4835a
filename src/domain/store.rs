//! In-memory price series store keyed by symbol.

use crate::domain::error::{ScreenerError, SeriesError};
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::series::PriceSeries;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use tracing::debug;

#[derive(Debug, Default, Clone)]
pub struct SeriesStore {
    series: BTreeMap<String, PriceSeries>,
}

impl SeriesStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the series for its symbol.
    pub fn insert(&mut self, series: PriceSeries) {
        self.series.insert(series.symbol().to_string(), series);
    }

    /// Append one bar, creating the symbol's series on first use.
    pub fn append(&mut self, bar: OhlcvBar) -> Result<(), SeriesError> {
        self.series
            .entry(bar.symbol.clone())
            .or_insert_with(|| PriceSeries::new(bar.symbol.clone()))
            .push(bar)
    }

    pub fn get(&self, symbol: &str) -> Option<&PriceSeries> {
        self.series.get(symbol)
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.series.contains_key(symbol)
    }

    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.series.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Fetch `symbol` from the data port and store it. Returns the bar count.
    pub fn load(
        &mut self,
        port: &dyn DataPort,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<usize, ScreenerError> {
        let bars = port.fetch_ohlcv(symbol, start, end)?;
        if bars.is_empty() {
            return Err(ScreenerError::NoData {
                symbol: symbol.to_string(),
            });
        }
        let series = PriceSeries::from_bars(symbol, bars)?;
        let count = series.len();
        debug!(symbol, bars = count, "loaded series");
        self.insert(series);
        Ok(count)
    }
}
