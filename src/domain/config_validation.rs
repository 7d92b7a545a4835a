//! `[screener]` settings and whole-file configuration validation.

use crate::domain::error::ScreenerError;
use crate::domain::ohlcv::days_before;
use crate::domain::strategy::{StrategyKind, build_strategies, parse_strategy_list, read_number};
use crate::domain::universe::parse_symbols;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;
use std::path::PathBuf;

pub const SECTION: &str = "screener";
pub const DEFAULT_HISTORY_DAYS: usize = 730;

/// Run-level settings from the `[screener]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct ScreenerSettings {
    pub data_dir: PathBuf,
    /// `None` screens every symbol in `data_dir`.
    pub symbols: Option<Vec<String>>,
    /// Empty when the key is absent.
    pub strategies: Vec<StrategyKind>,
    pub benchmark: Option<String>,
    pub as_of: Option<NaiveDate>,
    pub history_days: usize,
    pub workers: usize,
    pub fundamentals_dir: Option<PathBuf>,
}

impl ScreenerSettings {
    pub fn load(config: &dyn ConfigPort) -> Result<Self, ScreenerError> {
        let data_dir = match non_empty(config, "data_dir") {
            Some(dir) => PathBuf::from(dir),
            None => return Err(ScreenerError::missing(SECTION, "data_dir")),
        };

        let symbols = config
            .get_string(SECTION, "symbols")
            .map(|raw| {
                parse_symbols(&raw).map_err(|e| ScreenerError::invalid(SECTION, "symbols", e.to_string()))
            })
            .transpose()?;

        let strategies = match config.get_string(SECTION, "strategies") {
            Some(raw) => parse_strategy_list(&raw)?,
            None => Vec::new(),
        };

        let as_of = non_empty(config, "as_of")
            .map(|raw| parse_date(&raw, "as_of"))
            .transpose()?;

        let history_days: i64 = read_number(config, SECTION, "history_days", DEFAULT_HISTORY_DAYS as i64)?;
        if history_days <= 0 {
            return Err(ScreenerError::invalid(
                SECTION,
                "history_days",
                "history_days must be positive",
            ));
        }

        let workers: i64 = read_number(config, SECTION, "workers", 1)?;
        if workers <= 0 {
            return Err(ScreenerError::invalid(
                SECTION,
                "workers",
                "workers must be at least 1",
            ));
        }

        Ok(Self {
            data_dir,
            symbols,
            strategies,
            benchmark: non_empty(config, "benchmark").map(|b| b.to_uppercase()),
            as_of,
            history_days: history_days as usize,
            workers: workers as usize,
            fundamentals_dir: non_empty(config, "fundamentals_dir").map(PathBuf::from),
        })
    }

    /// Date range to read price files over. With `as_of` the window is the
    /// `history_days` calendar days ending there; without it the whole file.
    pub fn load_window(&self) -> (NaiveDate, NaiveDate) {
        match self.as_of {
            Some(end) => {
                (days_before(end, self.history_days), end)
            }
            None => (NaiveDate::MIN, NaiveDate::MAX),
        }
    }
}

fn non_empty(config: &dyn ConfigPort, key: &str) -> Option<String> {
    config
        .get_string(SECTION, key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub fn parse_date(value: &str, key: &str) -> Result<NaiveDate, ScreenerError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
        ScreenerError::invalid(
            SECTION,
            key,
            format!("invalid {key} '{}', expected YYYY-MM-DD", value.trim()),
        )
    })
}

/// Validate `[screener]` and every configured strategy section.
pub fn validate_config(config: &dyn ConfigPort) -> Result<ScreenerSettings, ScreenerError> {
    let settings = ScreenerSettings::load(config)?;
    if settings.strategies.is_empty() {
        return Err(ScreenerError::missing(SECTION, "strategies"));
    }
    build_strategies(&settings.strategies, config)?;
    if settings.benchmark.is_none() && settings.strategies.iter().any(|k| k.needs_benchmark()) {
        tracing::warn!("no benchmark configured; benchmark-relative criteria will fail");
    }
    Ok(settings)
}
