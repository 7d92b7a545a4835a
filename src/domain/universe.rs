//! Symbol universe: parsing symbol lists and loading them into the store.
//!
//! Symbols without data, or with too few bars for any configured strategy,
//! are skipped with a reason instead of failing the run.

use crate::domain::error::ScreenerError;
use crate::domain::store::SeriesStore;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::collections::HashSet;
use std::fmt;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct Universe {
    pub symbols: Vec<String>,
}

impl Universe {
    pub fn new(symbols: Vec<String>) -> Self {
        Self { symbols }
    }

    pub fn count(&self) -> usize {
        self.symbols.len()
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum UniverseError {
    #[error("empty token in symbol list")]
    EmptyToken,

    #[error("duplicate symbol: {0}")]
    DuplicateSymbol(String),

    #[error("all symbols failed validation")]
    AllSymbolsFailed,
}

pub fn parse_symbols(input: &str) -> Result<Vec<String>, UniverseError> {
    let mut symbols = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(UniverseError::EmptyToken);
        }
        let symbol = trimmed.to_uppercase();
        if !seen.insert(symbol.clone()) {
            return Err(UniverseError::DuplicateSymbol(symbol));
        }
        symbols.push(symbol);
    }

    Ok(symbols)
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkippedSymbol {
    pub symbol: String,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    NoData,
    InsufficientBars { bars: usize, minimum: usize },
    Failed(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NoData => write!(f, "no data"),
            SkipReason::InsufficientBars { bars, minimum } => {
                write!(f, "only {bars} bars, minimum {minimum} required")
            }
            SkipReason::Failed(reason) => write!(f, "{reason}"),
        }
    }
}

impl From<&ScreenerError> for SkipReason {
    fn from(err: &ScreenerError) -> Self {
        match err {
            ScreenerError::NoData { .. } => SkipReason::NoData,
            ScreenerError::InsufficientData { bars, minimum, .. } => SkipReason::InsufficientBars {
                bars: *bars,
                minimum: *minimum,
            },
            other => SkipReason::Failed(other.to_string()),
        }
    }
}

pub struct UniverseValidationResult {
    pub universe: Universe,
    pub skipped: Vec<SkippedSymbol>,
}

/// Load every symbol in `[start_date, end_date]` into `store`, keeping those
/// with at least `min_bars` bars.
pub fn validate_universe(
    data_port: &dyn DataPort,
    store: &mut SeriesStore,
    symbols: Vec<String>,
    start_date: NaiveDate,
    end_date: NaiveDate,
    min_bars: usize,
) -> Result<UniverseValidationResult, ScreenerError> {
    let mut valid = Vec::new();
    let mut skipped = Vec::new();

    for symbol in symbols {
        let bars = match store.load(data_port, &symbol, start_date, end_date) {
            Ok(bars) => bars,
            Err(e) => {
                warn!(symbol = %symbol, error = %e, "skipping symbol");
                skipped.push(SkippedSymbol {
                    reason: SkipReason::from(&e),
                    symbol,
                });
                continue;
            }
        };

        if bars < min_bars {
            warn!(symbol = %symbol, bars, minimum = min_bars, "skipping symbol: too few bars");
            skipped.push(SkippedSymbol {
                symbol,
                reason: SkipReason::InsufficientBars {
                    bars,
                    minimum: min_bars,
                },
            });
            continue;
        }

        valid.push(symbol);
    }

    if valid.is_empty() {
        return Err(UniverseError::AllSymbolsFailed.into());
    }

    info!(
        loaded = valid.len(),
        requested = valid.len() + skipped.len(),
        "universe loaded"
    );

    Ok(UniverseValidationResult {
        universe: Universe::new(valid),
        skipped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ohlcv::OhlcvBar;
    use std::collections::HashMap;

    struct StubPort {
        bars: HashMap<String, usize>,
    }

    impl DataPort for StubPort {
        fn fetch_ohlcv(
            &self,
            symbol: &str,
            start_date: NaiveDate,
            _end_date: NaiveDate,
        ) -> Result<Vec<OhlcvBar>, ScreenerError> {
            if symbol == "BROKEN" {
                return Err(ScreenerError::DataSource {
                    reason: "corrupt file".into(),
                });
            }
            let n = self.bars.get(symbol).copied().unwrap_or(0);
            Ok((0..n)
                .map(|i| OhlcvBar {
                    symbol: symbol.to_string(),
                    date: start_date + chrono::Duration::days(i as i64),
                    open: 10.0,
                    high: 10.0,
                    low: 10.0,
                    close: 10.0,
                    volume: 100,
                })
                .collect())
        }

        fn list_symbols(&self) -> Result<Vec<String>, ScreenerError> {
            Ok(self.bars.keys().cloned().collect())
        }
    }

    fn port() -> StubPort {
        StubPort {
            bars: HashMap::from([("AAPL".to_string(), 40), ("TINY".to_string(), 5)]),
        }
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn parse_symbols_basic() {
        let result = parse_symbols("  aapl , MSFT ,nvda").unwrap();
        assert_eq!(result, vec!["AAPL", "MSFT", "NVDA"]);
    }

    #[test]
    fn parse_symbols_empty_token() {
        assert!(matches!(
            parse_symbols("AAPL,,MSFT"),
            Err(UniverseError::EmptyToken)
        ));
    }

    #[test]
    fn parse_symbols_duplicate_is_case_insensitive() {
        assert!(matches!(
            parse_symbols("AAPL,MSFT,aapl"),
            Err(UniverseError::DuplicateSymbol(s)) if s == "AAPL"
        ));
    }

    #[test]
    fn validate_skips_with_reasons() {
        let mut store = SeriesStore::new();
        let symbols = vec![
            "AAPL".to_string(),
            "TINY".to_string(),
            "GONE".to_string(),
            "BROKEN".to_string(),
        ];
        let result = validate_universe(&port(), &mut store, symbols, day(1), day(31), 10).unwrap();
        assert_eq!(result.universe.symbols, vec!["AAPL"]);
        assert_eq!(result.skipped.len(), 3);
        assert_eq!(
            result.skipped[0].reason,
            SkipReason::InsufficientBars {
                bars: 5,
                minimum: 10
            }
        );
        assert_eq!(result.skipped[1].reason, SkipReason::NoData);
        assert!(matches!(result.skipped[2].reason, SkipReason::Failed(ref r) if r.contains("corrupt")));
        assert_eq!(store.get("AAPL").unwrap().len(), 40);
    }

    #[test]
    fn validate_fails_when_nothing_loads() {
        let mut store = SeriesStore::new();
        let result = validate_universe(
            &port(),
            &mut store,
            vec!["GONE".to_string()],
            day(1),
            day(31),
            10,
        );
        assert!(matches!(
            result,
            Err(ScreenerError::Universe(UniverseError::AllSymbolsFailed))
        ));
    }

    #[test]
    fn skip_reason_display() {
        let reason = SkipReason::InsufficientBars {
            bars: 3,
            minimum: 204,
        };
        assert_eq!(reason.to_string(), "only 3 bars, minimum 204 required");
    }
}
