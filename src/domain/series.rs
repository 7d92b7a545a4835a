//! Append-only, date-ordered bar series for a single symbol.

use crate::domain::error::SeriesError;
use crate::domain::ohlcv::{OhlcvBar, bars_until};
use chrono::NaiveDate;

#[derive(Debug, Clone)]
pub struct PriceSeries {
    symbol: String,
    bars: Vec<OhlcvBar>,
}

impl PriceSeries {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            bars: Vec::new(),
        }
    }

    /// Build a series from bars in any order. Bars are sorted by date;
    /// duplicate dates are rejected.
    pub fn from_bars(
        symbol: impl Into<String>,
        mut bars: Vec<OhlcvBar>,
    ) -> Result<Self, SeriesError> {
        let mut series = Self::new(symbol);
        bars.sort_by_key(|b| b.date);
        series.bars.reserve(bars.len());
        for bar in bars {
            series.push(bar)?;
        }
        Ok(series)
    }

    /// Append a bar. The date must be strictly after the last bar's date.
    pub fn push(&mut self, bar: OhlcvBar) -> Result<(), SeriesError> {
        if bar.symbol != self.symbol {
            return Err(SeriesError::SymbolMismatch {
                expected: self.symbol.clone(),
                found: bar.symbol,
            });
        }
        if let Some(last) = self.bars.last() {
            if bar.date == last.date {
                return Err(SeriesError::Duplicate {
                    symbol: self.symbol.clone(),
                    date: bar.date,
                });
            }
            if bar.date < last.date {
                return Err(SeriesError::OutOfOrder {
                    symbol: self.symbol.clone(),
                    date: bar.date,
                    last: last.date,
                });
            }
        }
        self.bars.push(bar);
        Ok(())
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn bars(&self) -> &[OhlcvBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn first(&self) -> Option<&OhlcvBar> {
        self.bars.first()
    }

    pub fn last(&self) -> Option<&OhlcvBar> {
        self.bars.last()
    }

    /// Bars dated on or before `date`.
    pub fn until(&self, date: NaiveDate) -> &[OhlcvBar] {
        bars_until(&self.bars, date)
    }

    pub fn index_of(&self, date: NaiveDate) -> Option<usize> {
        self.bars.binary_search_by_key(&date, |b| b.date).ok()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }
}
