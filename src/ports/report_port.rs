//! Screening result export port trait.

use crate::domain::error::ScreenerError;
use crate::domain::screener::ScreenReport;
use std::path::Path;

pub trait ReportPort {
    fn write(&self, report: &ScreenReport, output_path: &Path) -> Result<(), ScreenerError>;
}
