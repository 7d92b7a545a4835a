//! CSV report adapter implementing ReportPort.
//!
//! One row per verdict, then one row per skipped symbol:
//! `strategy,symbol,status,score,evaluated_at,signal,detail`.
//! `detail` lists failed criteria separated by `;`, or the skip reason.

use crate::domain::error::ScreenerError;
use crate::domain::screener::ScreenReport;
use crate::domain::verdict::Verdict;
use crate::ports::report_port::ReportPort;
use std::fs;
use std::path::Path;

const HEADER: [&str; 7] = [
    "strategy",
    "symbol",
    "status",
    "score",
    "evaluated_at",
    "signal",
    "detail",
];

#[derive(Debug, Default)]
pub struct CsvReportAdapter;

impl CsvReportAdapter {
    pub fn new() -> Self {
        Self
    }
}

fn failed_names(verdict: &Verdict) -> String {
    verdict
        .failed_criteria()
        .map(|c| c.name.as_str())
        .collect::<Vec<_>>()
        .join(";")
}

fn csv_error(e: csv::Error) -> ScreenerError {
    ScreenerError::Io(std::io::Error::other(e.to_string()))
}

impl ReportPort for CsvReportAdapter {
    fn write(&self, report: &ScreenReport, output_path: &Path) -> Result<(), ScreenerError> {
        if let Some(parent) = output_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut writer = csv::Writer::from_path(output_path).map_err(csv_error)?;
        writer.write_record(HEADER).map_err(csv_error)?;

        for strategy in &report.strategies {
            for verdict in &strategy.verdicts {
                let signal = verdict
                    .signal
                    .as_ref()
                    .map(|s| s.to_string())
                    .unwrap_or_default();
                let score = format!("{:.1}", verdict.score);
                let date = verdict.evaluated_at.to_string();
                let failed = failed_names(verdict);
                writer
                    .write_record([
                        strategy.name.as_str(),
                        verdict.symbol.as_str(),
                        if verdict.passed { "pass" } else { "fail" },
                        score.as_str(),
                        date.as_str(),
                        signal.as_str(),
                        failed.as_str(),
                    ])
                    .map_err(csv_error)?;
            }
            for skipped in &strategy.skipped {
                let reason = skipped.reason.to_string();
                writer
                    .write_record([
                        strategy.name.as_str(),
                        skipped.symbol.as_str(),
                        "skip",
                        "",
                        "",
                        "",
                        reason.as_str(),
                    ])
                    .map_err(csv_error)?;
            }
        }

        writer.flush()?;
        tracing::info!(path = %output_path.display(), rows = report.verdict_count(), "report written");
        Ok(())
    }
}
