//! Fundamentals access port trait.

use crate::domain::error::ScreenerError;
use crate::domain::fundamentals::Fundamentals;
use chrono::NaiveDate;
use std::collections::HashMap;

pub trait FundamentalsPort {
    /// Fundamentals for each requested symbol that has any on record. With
    /// `as_of`, quarters ending after that date are left out.
    fn fetch_fundamentals(
        &self,
        symbols: &[String],
        as_of: Option<NaiveDate>,
    ) -> Result<HashMap<String, Fundamentals>, ScreenerError>;
}
