#![allow(dead_code)]

use chrono::{Duration, NaiveDate};
use std::cell::RefCell;
use std::collections::HashMap;
use stockscreen::domain::error::ScreenerError;
use stockscreen::domain::fundamentals::{Fundamentals, Holder};
pub use stockscreen::domain::ohlcv::OhlcvBar;
use stockscreen::ports::data_port::DataPort;
use stockscreen::ports::fundamentals_port::FundamentalsPort;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<OhlcvBar>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, symbol: &str, bars: Vec<OhlcvBar>) -> Self {
        self.data.insert(symbol.to_string(), bars);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_ohlcv(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, ScreenerError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(ScreenerError::DataSource {
                reason: reason.clone(),
            });
        }
        Ok(self
            .data
            .get(symbol)
            .map(|bars| {
                bars.iter()
                    .filter(|b| b.date >= start_date && b.date <= end_date)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn list_symbols(&self) -> Result<Vec<String>, ScreenerError> {
        let mut symbols: Vec<String> = self.data.keys().cloned().collect();
        symbols.sort();
        Ok(symbols)
    }
}

#[derive(Default)]
pub struct MockFundamentalsPort {
    pub data: HashMap<String, Fundamentals>,
    /// `as_of` of every fetch, in call order.
    pub requested_as_of: RefCell<Vec<Option<NaiveDate>>>,
}

impl MockFundamentalsPort {
    pub fn with(mut self, fundamentals: Fundamentals) -> Self {
        self.data.insert(fundamentals.symbol.clone(), fundamentals);
        self
    }
}

impl FundamentalsPort for MockFundamentalsPort {
    fn fetch_fundamentals(
        &self,
        symbols: &[String],
        as_of: Option<NaiveDate>,
    ) -> Result<HashMap<String, Fundamentals>, ScreenerError> {
        self.requested_as_of.borrow_mut().push(as_of);
        Ok(symbols
            .iter()
            .filter_map(|s| self.data.get(s).map(|f| (s.clone(), f.clone())))
            .collect())
    }
}

pub fn start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2022, 1, 3).unwrap()
}

/// Bars on consecutive calendar days with a 1% high/low band.
pub fn generate_bars(symbol: &str, closes: &[f64]) -> Vec<OhlcvBar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| OhlcvBar {
            symbol: symbol.to_string(),
            date: start_date() + Duration::days(i as i64),
            open: close,
            high: close * 1.01,
            low: close * 0.99,
            close,
            volume: 1_000_000,
        })
        .collect()
}

pub fn trend_bars(symbol: &str, n: usize, start: f64, step: f64) -> Vec<OhlcvBar> {
    let closes: Vec<f64> = (0..n).map(|i| start + step * i as f64).collect();
    generate_bars(symbol, &closes)
}

/// Steady uptrend whose last 20 sessions trade 50% more volume.
pub fn leader_bars(symbol: &str) -> Vec<OhlcvBar> {
    let mut bars = trend_bars(symbol, 260, 50.0, 0.5);
    let n = bars.len();
    for bar in &mut bars[n - 20..] {
        bar.volume = 1_500_000;
    }
    bars
}

pub fn strong_fundamentals(symbol: &str) -> Fundamentals {
    Fundamentals {
        net_income: vec![130.0, 100.0, 90.0, 80.0, 70.0, 60.0, 50.0, 40.0],
        holders: vec![
            Holder {
                name: "Vanguard Group Inc".into(),
                value: 6e8,
            },
            Holder {
                name: "BlackRock Inc.".into(),
                value: 5e8,
            },
        ],
        ..Fundamentals::new(symbol)
    }
}

pub fn write_price_csv(dir: &std::path::Path, bars: &[OhlcvBar]) {
    let symbol = &bars[0].symbol;
    let mut content = String::from("date,open,high,low,close,volume\n");
    for b in bars {
        content.push_str(&format!(
            "{},{},{},{},{},{}\n",
            b.date, b.open, b.high, b.low, b.close, b.volume
        ));
    }
    std::fs::write(dir.join(format!("{symbol}.csv")), content).unwrap();
}
