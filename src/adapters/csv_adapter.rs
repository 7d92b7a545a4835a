//! CSV price data adapter.
//!
//! One file per symbol at `{data_dir}/{SYMBOL}.csv` with the header
//! `date,open,high,low,close,volume` and `YYYY-MM-DD` dates. File names
//! match symbols without regard to ASCII case. A missing file reads as no
//! bars.

use crate::domain::error::ScreenerError;
use crate::domain::ohlcv::OhlcvBar;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::str::FromStr;

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    /// `{symbol}.csv`, or the one file whose stem equals `symbol` ignoring
    /// case.
    fn csv_path(&self, symbol: &str) -> Option<PathBuf> {
        let exact = self.base_path.join(format!("{symbol}.csv"));
        if exact.is_file() {
            return Some(exact);
        }
        fs::read_dir(&self.base_path)
            .ok()?
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .find(|path| {
                path.extension().and_then(|e| e.to_str()) == Some("csv")
                    && path
                        .file_stem()
                        .and_then(|s| s.to_str())
                        .is_some_and(|stem| stem.eq_ignore_ascii_case(symbol))
            })
    }
}

fn field<T: FromStr>(record: &csv::StringRecord, index: usize, name: &str) -> Result<T, ScreenerError>
where
    T::Err: std::fmt::Display,
{
    let raw = record.get(index).ok_or_else(|| ScreenerError::DataSource {
        reason: format!("missing {name} column"),
    })?;
    raw.trim().parse().map_err(|e| ScreenerError::DataSource {
        reason: format!("invalid {name} value '{raw}': {e}"),
    })
}

/// Volume may be written as a float by some exporters.
fn volume_field(record: &csv::StringRecord, index: usize) -> Result<i64, ScreenerError> {
    field::<i64>(record, index, "volume")
        .or_else(|_| field::<f64>(record, index, "volume").map(|v| v.round() as i64))
}

impl DataPort for CsvAdapter {
    fn fetch_ohlcv(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, ScreenerError> {
        let Some(path) = self.csv_path(symbol) else {
            return Ok(Vec::new());
        };
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(ScreenerError::DataSource {
                    reason: format!("failed to read {}: {}", path.display(), e),
                });
            }
        };

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut bars = Vec::new();

        for result in rdr.records() {
            let record = result.map_err(|e| ScreenerError::DataSource {
                reason: format!("CSV parse error in {}: {}", path.display(), e),
            })?;

            let date_str = record.get(0).ok_or_else(|| ScreenerError::DataSource {
                reason: "missing date column".into(),
            })?;
            let date = NaiveDate::parse_from_str(date_str.trim(), "%Y-%m-%d").map_err(|e| {
                ScreenerError::DataSource {
                    reason: format!("invalid date '{date_str}': {e}"),
                }
            })?;

            if date < start_date || date > end_date {
                continue;
            }

            bars.push(OhlcvBar {
                symbol: symbol.to_string(),
                date,
                open: field(&record, 1, "open")?,
                high: field(&record, 2, "high")?,
                low: field(&record, 3, "low")?,
                close: field(&record, 4, "close")?,
                volume: volume_field(&record, 5)?,
            });
        }

        bars.sort_by_key(|b| b.date);
        Ok(bars)
    }

    fn list_symbols(&self) -> Result<Vec<String>, ScreenerError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| ScreenerError::DataSource {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let mut symbols = Vec::new();

        for entry in entries {
            let entry = entry.map_err(|e| ScreenerError::DataSource {
                reason: format!("directory entry error: {e}"),
            })?;

            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("csv") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                symbols.push(stem.to_string());
            }
        }

        symbols.sort();
        Ok(symbols)
    }
}
