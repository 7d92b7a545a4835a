//! OHLCV bar representation.

use chrono::{Duration, NaiveDate};

#[derive(Debug, Clone, PartialEq)]
pub struct OhlcvBar {
    pub symbol: String,
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

impl OhlcvBar {
    /// Close-to-close change in percent. `None` when the previous close is zero.
    pub fn change_pct(&self, prev_close: f64) -> Option<f64> {
        if prev_close == 0.0 {
            return None;
        }
        Some((self.close - prev_close) / prev_close * 100.0)
    }

    /// Open-versus-previous-close gap in percent. Negative for a gap down.
    pub fn gap_pct(&self, prev_close: f64) -> Option<f64> {
        if prev_close == 0.0 {
            return None;
        }
        Some((self.open - prev_close) / prev_close * 100.0)
    }
}

/// Prefix of date-ordered `bars` dated on or before `date`.
pub fn bars_until(bars: &[OhlcvBar], date: NaiveDate) -> &[OhlcvBar] {
    let end = bars.partition_point(|b| b.date <= date);
    &bars[..end]
}

/// Index of the last bar dated on or before `date`.
pub fn index_on_or_before(bars: &[OhlcvBar], date: NaiveDate) -> Option<usize> {
    bars_until(bars, date).len().checked_sub(1)
}

/// `date` minus `days` calendar days, saturating at the earliest
/// representable date.
pub fn days_before(date: NaiveDate, days: usize) -> NaiveDate {
    i64::try_from(days)
        .ok()
        .and_then(Duration::try_days)
        .and_then(|span| date.checked_sub_signed(span))
        .unwrap_or(NaiveDate::MIN)
}
