//! CSV fundamentals adapter.
//!
//! Reads `earnings.csv` (`symbol,period_end,net_income`, one row per quarter)
//! and `holders.csv` (`symbol,holder,value`) from one directory. Either file
//! may be absent. Quarters after the evaluation date are dropped; a quarter
//! listed twice must carry the same figure.

use crate::domain::error::ScreenerError;
use crate::domain::fundamentals::{Fundamentals, Holder};
use crate::ports::fundamentals_port::FundamentalsPort;
use chrono::NaiveDate;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

pub const EARNINGS_FILE: &str = "earnings.csv";
pub const HOLDERS_FILE: &str = "holders.csv";

pub struct CsvFundamentalsAdapter {
    base_path: PathBuf,
}

impl CsvFundamentalsAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }
}

fn read_records(path: &Path) -> Result<Vec<csv::StringRecord>, ScreenerError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => {
            return Err(ScreenerError::DataSource {
                reason: format!("failed to read {}: {}", path.display(), e),
            });
        }
    };
    let mut rdr = csv::Reader::from_reader(content.as_bytes());
    rdr.records()
        .map(|r| {
            r.map_err(|e| ScreenerError::DataSource {
                reason: format!("CSV parse error in {}: {}", path.display(), e),
            })
        })
        .collect()
}

fn text<'r>(record: &'r csv::StringRecord, index: usize, name: &str) -> Result<&'r str, ScreenerError> {
    record
        .get(index)
        .map(str::trim)
        .ok_or_else(|| ScreenerError::DataSource {
            reason: format!("missing {name} column"),
        })
}

fn number(record: &csv::StringRecord, index: usize, name: &str) -> Result<f64, ScreenerError> {
    let raw = text(record, index, name)?;
    raw.parse().map_err(|e| ScreenerError::DataSource {
        reason: format!("invalid {name} value '{raw}': {e}"),
    })
}

/// Collapse repeated `period_end` rows in newest-first quarters.
fn dedup_quarters(symbol: &str, quarters: &mut Vec<(NaiveDate, f64)>) -> Result<(), ScreenerError> {
    if let Some(pair) = quarters
        .windows(2)
        .find(|w| w[0].0 == w[1].0 && w[0].1 != w[1].1)
    {
        return Err(ScreenerError::DataSource {
            reason: format!(
                "conflicting net_income for {symbol} quarter {}: {} vs {}",
                pair[0].0, pair[0].1, pair[1].1
            ),
        });
    }
    quarters.dedup_by_key(|q| q.0);
    Ok(())
}

impl FundamentalsPort for CsvFundamentalsAdapter {
    fn fetch_fundamentals(
        &self,
        symbols: &[String],
        as_of: Option<NaiveDate>,
    ) -> Result<HashMap<String, Fundamentals>, ScreenerError> {
        let wanted: HashSet<String> = symbols.iter().map(|s| s.to_uppercase()).collect();
        let mut out: HashMap<String, Fundamentals> = HashMap::new();

        let mut earnings: HashMap<String, Vec<(NaiveDate, f64)>> = HashMap::new();
        for record in read_records(&self.base_path.join(EARNINGS_FILE))? {
            let symbol = text(&record, 0, "symbol")?.to_uppercase();
            if !wanted.contains(&symbol) {
                continue;
            }
            let period_str = text(&record, 1, "period_end")?;
            let period = NaiveDate::parse_from_str(period_str, "%Y-%m-%d").map_err(|e| {
                ScreenerError::DataSource {
                    reason: format!("invalid period_end '{period_str}': {e}"),
                }
            })?;
            if as_of.is_some_and(|date| period > date) {
                continue;
            }
            let net_income = number(&record, 2, "net_income")?;
            earnings.entry(symbol).or_default().push((period, net_income));
        }
        for (symbol, mut quarters) in earnings {
            quarters.sort_by(|a, b| b.0.cmp(&a.0));
            dedup_quarters(&symbol, &mut quarters)?;
            out.entry(symbol.clone())
                .or_insert_with(|| Fundamentals::new(symbol))
                .net_income = quarters.into_iter().map(|(_, ni)| ni).collect();
        }

        for record in read_records(&self.base_path.join(HOLDERS_FILE))? {
            let symbol = text(&record, 0, "symbol")?.to_uppercase();
            if !wanted.contains(&symbol) {
                continue;
            }
            let holder = Holder {
                name: text(&record, 1, "holder")?.to_string(),
                value: number(&record, 2, "value")?,
            };
            out.entry(symbol.clone())
                .or_insert_with(|| Fundamentals::new(symbol))
                .holders
                .push(holder);
        }

        tracing::debug!(symbols = out.len(), "loaded fundamentals");
        Ok(out)
    }
}
