//! Batch indicator computation and point-in-time snapshots.

use crate::domain::indicator::{IndicatorSeries, IndicatorType};
use crate::domain::ohlcv::OhlcvBar;
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Compute each distinct indicator in `types` once over `bars`.
pub fn compute_indicators(
    bars: &[OhlcvBar],
    types: &[IndicatorType],
) -> HashMap<IndicatorType, IndicatorSeries> {
    let mut out = HashMap::with_capacity(types.len());
    for indicator_type in types {
        out.entry(*indicator_type)
            .or_insert_with(|| indicator_type.compute(bars));
    }
    out
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Reading {
    Value(f64),
    Flag(bool),
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reading::Value(v) => write!(f, "{v:.4}"),
            Reading::Flag(b) => write!(f, "{b}"),
        }
    }
}

/// Named indicator readings for one symbol on one date.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorResult {
    pub symbol: String,
    pub date: NaiveDate,
    pub readings: BTreeMap<String, Reading>,
}

impl IndicatorResult {
    pub fn new(symbol: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            symbol: symbol.into(),
            date,
            readings: BTreeMap::new(),
        }
    }

    /// Snapshot every valid value at `index`. Multi-part values are stored
    /// as `NAME.part`, e.g. `MACD(12,26,9).signal`.
    pub fn at(
        symbol: &str,
        bars: &[OhlcvBar],
        index: usize,
        computed: &HashMap<IndicatorType, IndicatorSeries>,
    ) -> Option<Self> {
        let bar = bars.get(index)?;
        let mut result = Self::new(symbol, bar.date);
        result.insert_value("close", bar.close);
        for (indicator_type, series) in computed {
            let Some(value) = series.get(index) else {
                continue;
            };
            for (part, v) in value.components() {
                let name = match part {
                    Some(part) => format!("{indicator_type}.{part}"),
                    None => indicator_type.to_string(),
                };
                result.readings.insert(name, Reading::Value(v));
            }
        }
        Some(result)
    }

    /// Snapshot at the last bar.
    pub fn latest(
        symbol: &str,
        bars: &[OhlcvBar],
        computed: &HashMap<IndicatorType, IndicatorSeries>,
    ) -> Option<Self> {
        Self::at(symbol, bars, bars.len().checked_sub(1)?, computed)
    }

    pub fn insert_value(&mut self, name: impl Into<String>, value: f64) {
        self.readings.insert(name.into(), Reading::Value(value));
    }

    pub fn insert_flag(&mut self, name: impl Into<String>, flag: bool) {
        self.readings.insert(name.into(), Reading::Flag(flag));
    }

    pub fn value(&self, name: &str) -> Option<f64> {
        match self.readings.get(name)? {
            Reading::Value(v) => Some(*v),
            Reading::Flag(_) => None,
        }
    }

    pub fn flag(&self, name: &str) -> Option<bool> {
        match self.readings.get(name)? {
            Reading::Flag(b) => Some(*b),
            Reading::Value(_) => None,
        }
    }
}
