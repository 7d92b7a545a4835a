//! Domain error types.

use crate::domain::universe::UniverseError;
use chrono::NaiveDate;

/// Violations of the price series ordering rules.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SeriesError {
    #[error("bar for {found} pushed into series for {expected}")]
    SymbolMismatch { expected: String, found: String },

    #[error("duplicate bar for {symbol} on {date}")]
    Duplicate { symbol: String, date: NaiveDate },

    #[error("bar for {symbol} on {date} is before last bar on {last}")]
    OutOfOrder {
        symbol: String,
        date: NaiveDate,
        last: NaiveDate,
    },
}

/// Top-level error type for stockscreen.
#[derive(Debug, thiserror::Error)]
pub enum ScreenerError {
    #[error("data source error: {reason}")]
    DataSource { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("unknown strategy: {0}")]
    UnknownStrategy(String),

    #[error("no data for {symbol}")]
    NoData { symbol: String },

    #[error("insufficient data for {symbol}: have {bars} bars, need {minimum}")]
    InsufficientData {
        symbol: String,
        bars: usize,
        minimum: usize,
    },

    #[error(transparent)]
    Series(#[from] SeriesError),

    #[error(transparent)]
    Universe(#[from] UniverseError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ScreenerError {
    pub fn invalid(section: &str, key: &str, reason: impl Into<String>) -> Self {
        ScreenerError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }

    pub fn missing(section: &str, key: &str) -> Self {
        ScreenerError::ConfigMissing {
            section: section.to_string(),
            key: key.to_string(),
        }
    }
}

impl From<&ScreenerError> for std::process::ExitCode {
    fn from(err: &ScreenerError) -> Self {
        let code: u8 = match err {
            ScreenerError::Io(_) => 1,
            ScreenerError::ConfigParse { .. }
            | ScreenerError::ConfigMissing { .. }
            | ScreenerError::ConfigInvalid { .. } => 2,
            ScreenerError::DataSource { .. } | ScreenerError::Series(_) => 3,
            ScreenerError::UnknownStrategy(_) => 4,
            ScreenerError::Universe(UniverseError::AllSymbolsFailed)
            | ScreenerError::NoData { .. }
            | ScreenerError::InsufficientData { .. } => 5,
            ScreenerError::Universe(_) => 2,
        };
        std::process::ExitCode::from(code)
    }
}
