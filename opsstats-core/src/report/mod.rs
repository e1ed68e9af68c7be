use std::io::Write;

use thiserror::Error;

use crate::anomaly::AnomalyReport;
use crate::bench::{BenchmarkResult, ComparisonSet};

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Renders analysis results for humans.
pub trait Reporter: Send + Sync {
    /// Summary statistics of a single benchmark run.
    fn write_summary(
        &self,
        writer: &mut dyn Write,
        results: &[BenchmarkResult],
    ) -> Result<(), ReportError>;

    /// Base vs head comparison table.
    fn write_comparison(
        &self,
        writer: &mut dyn Write,
        comparisons: &ComparisonSet,
    ) -> Result<(), ReportError>;

    /// Review anomaly analysis.
    fn write_anomalies(
        &self,
        writer: &mut dyn Write,
        report: &AnomalyReport,
    ) -> Result<(), ReportError>;
}

/// Format a duration in seconds, switching to minutes from 60 s upwards.
pub fn format_time(seconds: f64) -> String {
    if seconds >= 60.0 {
        let minutes = (seconds / 60.0).floor();
        let secs = seconds - minutes * 60.0;
        format!("{}m {:.1}s", minutes as u64, secs)
    } else {
        format!("{:.1}s", seconds)
    }
}

/// Format a signed percent change, e.g. `+12.50%`.
pub fn format_change(pct_change: f64) -> String {
    if pct_change > 0.0 {
        format!("+{:.2}%", pct_change)
    } else if pct_change < 0.0 {
        format!("-{:.2}%", pct_change.abs())
    } else {
        "0.00%".to_string()
    }
}

mod markdown;
mod terminal;
pub use markdown::MarkdownReporter;
pub use terminal::TerminalReporter;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_time_seconds() {
        assert_eq!(format_time(0.0), "0.0s");
        assert_eq!(format_time(12.34), "12.3s");
        assert_eq!(format_time(59.9), "59.9s");
    }

    #[test]
    fn test_format_time_minutes() {
        assert_eq!(format_time(60.0), "1m 0.0s");
        assert_eq!(format_time(125.5), "2m 5.5s");
    }

    #[test]
    fn test_format_change() {
        assert_eq!(format_change(12.5), "+12.50%");
        assert_eq!(format_change(-3.25), "-3.25%");
        assert_eq!(format_change(0.0), "0.00%");
    }
}
