//! GitHub-flavored Markdown output, for pull request comments and job summaries.

use std::io::Write;

use super::{format_change, format_time, ReportError, Reporter};
use crate::anomaly::AnomalyReport;
use crate::bench::{BenchmarkResult, ComparisonSet, Verdict};

/// Markdown reporter.
#[derive(Debug, Clone, Default)]
pub struct MarkdownReporter;

impl MarkdownReporter {
    pub fn new() -> Self {
        Self
    }

    /// Escape characters that would break a table cell.
    fn cell(text: &str) -> String {
        text.replace('|', "\\|").replace('\n', " ")
    }

    fn verdict_badge(verdict: Verdict) -> &'static str {
        match verdict {
            Verdict::Regression => "🔴 regression",
            Verdict::Warning => "🟡 warning",
            Verdict::Improvement => "🟢 improvement",
            Verdict::Neutral => "⚪ neutral",
        }
    }
}

impl Reporter for MarkdownReporter {
    fn write_summary(
        &self,
        writer: &mut dyn Write,
        results: &[BenchmarkResult],
    ) -> Result<(), ReportError> {
        writeln!(writer, "# Build Performance Benchmark Results")?;
        writeln!(writer)?;
        writeln!(writer, "## Results")?;
        writeln!(writer)?;
        writeln!(writer, "| Scenario | Sample | Mean | Median | Std Dev | Min | Max |")?;
        writeln!(writer, "|----------|--------|------|--------|---------|-----|-----|")?;

        for result in results {
            let s = &result.summary;
            writeln!(
                writer,
                "| {} | {} | {} | {} | ±{} | {} | {} |",
                Self::cell(&result.scenario),
                result.kind,
                format_time(s.mean),
                format_time(s.median),
                format_time(s.std_dev),
                format_time(s.min),
                format_time(s.max)
            )?;
        }

        Ok(())
    }

    fn write_comparison(
        &self,
        writer: &mut dyn Write,
        comparisons: &ComparisonSet,
    ) -> Result<(), ReportError> {
        writeln!(writer, "# Build Performance Comparison")?;
        writeln!(writer)?;
        writeln!(
            writer,
            "| Scenario | Sample | Base | Head | Change | p-value | Verdict |"
        )?;
        writeln!(
            writer,
            "|----------|--------|------|------|--------|---------|---------|"
        )?;

        for c in &comparisons.comparisons {
            writeln!(
                writer,
                "| {} | {} | {} | {} | {} | {:.4} | {} |",
                Self::cell(&c.scenario),
                c.kind,
                format_time(c.base.mean),
                format_time(c.head.mean),
                format_change(c.pct_change),
                c.test_result.p_value,
                Self::verdict_badge(c.verdict)
            )?;
        }

        writeln!(writer)?;
        writeln!(
            writer,
            "**Regressions:** {} | **Warnings:** {} | **Improvements:** {} | **Neutral:** {}",
            comparisons.count(Verdict::Regression),
            comparisons.count(Verdict::Warning),
            comparisons.count(Verdict::Improvement),
            comparisons.count(Verdict::Neutral)
        )?;
        if let Some(average) = comparisons.average_regression_pct() {
            writeln!(writer)?;
            writeln!(writer, "Average regression: {}", format_change(average))?;
        }

        Ok(())
    }

    fn write_anomalies(
        &self,
        writer: &mut dyn Write,
        report: &AnomalyReport,
    ) -> Result<(), ReportError> {
        writeln!(writer, "# Review Anomaly Report")?;
        writeln!(writer)?;
        match report.current_date {
            Some(date) => writeln!(writer, "- **Most recent date:** {date}")?,
            None => writeln!(writer, "- **Most recent date:** none")?,
        }
        writeln!(writer, "- **Reviews on that date:** {}", report.total_reviews)?;
        writeln!(writer, "- **Days covered:** {}", report.days_covered)?;
        if let Some(warning) = &report.skew_warning {
            writeln!(writer)?;
            writeln!(writer, "> ⚠️ {warning}")?;
        }

        writeln!(writer)?;
        writeln!(writer, "| Rating | Count | Mean | Std Dev | Z-Score | Threshold | Anomaly |")?;
        writeln!(writer, "|--------|-------|------|---------|---------|-----------|---------|")?;
        for stat in &report.statistics {
            writeln!(
                writer,
                "| {}★ | {} | {:.2} | {:.2} | {:.2} | {} | {} |",
                stat.rating,
                stat.current_count,
                stat.mean,
                stat.std_dev,
                stat.z_score,
                stat.threshold,
                if stat.anomalous { "yes" } else { "" }
            )?;
        }

        if !report.has_anomalies() {
            writeln!(writer)?;
            for reason in &report.no_anomaly_reasons {
                writeln!(writer, "- {reason}")?;
            }
            return Ok(());
        }

        writeln!(writer)?;
        writeln!(writer, "## Reviews Related to Anomalies")?;
        for review in &report.anomalous_reviews {
            writeln!(writer)?;
            writeln!(
                writer,
                "**{}** ({}★, {})",
                review.author, review.rating, review.at
            )?;
            writeln!(writer)?;
            writeln!(writer, "> {}", review.text.replace('\n', "\n> "))?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bench::{aggregate, BenchmarkSample, Comparator, SampleKind};

    #[test]
    fn test_summary_table() {
        let results = aggregate(vec![
            BenchmarkSample::from_millis("clean|build", SampleKind::TotalExecutionTime, 90_000.0),
            BenchmarkSample::from_millis("clean|build", SampleKind::TotalExecutionTime, 92_000.0),
        ]);

        let mut buffer = Vec::new();
        MarkdownReporter::new()
            .write_summary(&mut buffer, &results)
            .unwrap();
        let output = String::from_utf8(buffer).unwrap();

        assert!(output.contains("| Scenario | Sample | Mean | Median | Std Dev | Min | Max |"));
        let row = "| clean\\|build | total execution time | 1m 31.0s | 1m 31.0s | ±1.4s \
                   | 1m 30.0s | 1m 32.0s |";
        assert!(output.contains(row));
    }

    #[test]
    fn test_comparison_table() {
        let base = aggregate(vec![BenchmarkSample::from_millis(
            "incremental",
            SampleKind::TotalExecutionTime,
            10_000.0,
        )]);
        let head = aggregate(vec![BenchmarkSample::from_millis(
            "incremental",
            SampleKind::TotalExecutionTime,
            10_600.0,
        )]);
        let set = Comparator::default().compare(&base, &head);

        let mut buffer = Vec::new();
        MarkdownReporter::new()
            .write_comparison(&mut buffer, &set)
            .unwrap();
        let output = String::from_utf8(buffer).unwrap();

        assert!(output.contains("| incremental | total execution time | 10.0s | 10.6s | +6.00% |"));
        assert!(output.contains("🟡 warning"));
        assert!(output.contains("**Regressions:** 0 | **Warnings:** 1"));
        assert!(!output.contains("Average regression"));
    }
}
