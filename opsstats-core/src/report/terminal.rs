use std::io::{self, Write};

use colored::{ColoredString, Colorize};

use super::{format_change, format_time, ReportError, Reporter};
use crate::anomaly::AnomalyReport;
use crate::bench::{BenchmarkComparison, BenchmarkResult, ComparisonSet, SampleKind, Verdict};
use crate::stats::Summary;

const RULE_WIDTH: usize = 80;
const TABLE_WIDTH: usize = 118;

/// A reporter that writes plain-text reports suited to a terminal or CI log.
#[derive(Debug, Clone, Default)]
pub struct TerminalReporter {
    /// Whether to use colors in output (defaults to true).
    use_colors: bool,
}

impl TerminalReporter {
    /// Create a new terminal reporter with default settings.
    pub fn new() -> Self {
        Self { use_colors: true }
    }

    /// Create a terminal reporter with color output disabled.
    pub fn without_colors() -> Self {
        Self { use_colors: false }
    }

    fn paint(&self, text: &str, style: fn(&str) -> ColoredString) -> String {
        if self.use_colors {
            style(text).to_string()
        } else {
            text.to_string()
        }
    }

    fn paint_verdict(&self, text: &str, verdict: Verdict) -> String {
        match verdict {
            Verdict::Regression => self.paint(text, |t| t.red().bold()),
            Verdict::Warning => self.paint(text, |t| t.yellow()),
            Verdict::Improvement => self.paint(text, |t| t.green()),
            Verdict::Neutral => text.to_string(),
        }
    }

    fn banner(&self, writer: &mut dyn Write, title: &str) -> io::Result<()> {
        writeln!(writer, "{}", "=".repeat(RULE_WIDTH))?;
        writeln!(writer, "{}", self.paint(title, |t| t.bold()))?;
        writeln!(writer, "{}", "=".repeat(RULE_WIDTH))?;
        writeln!(writer)
    }

    fn print_stats_block(
        &self,
        writer: &mut dyn Write,
        title: &str,
        summary: &Summary,
        indent: usize,
    ) -> io::Result<()> {
        let pad = " ".repeat(indent);
        writeln!(writer, "{pad}{title}:")?;
        writeln!(writer, "{pad}  Mean:   {:>8}", format_time(summary.mean))?;
        writeln!(writer, "{pad}  Median: {:>8}", format_time(summary.median))?;
        writeln!(writer, "{pad}  StdDev: ±{:>7}", format_time(summary.std_dev))?;
        writeln!(
            writer,
            "{pad}  Range:  {:>8} - {}",
            format_time(summary.min),
            format_time(summary.max)
        )?;
        writeln!(writer)
    }

    fn print_scenario(
        &self,
        writer: &mut dyn Write,
        scenario: &str,
        results: &[&BenchmarkResult],
    ) -> io::Result<()> {
        writeln!(writer, "{}", self.paint(scenario, |t| t.bold()))?;
        writeln!(writer, "{}", "-".repeat(scenario.chars().count() + 4))?;

        let total = results
            .iter()
            .filter(|r| r.kind == SampleKind::TotalExecutionTime);
        let config: Vec<&&BenchmarkResult> = results
            .iter()
            .filter(|r| r.kind == SampleKind::TaskStart)
            .collect();

        let mut printed_total = false;
        for result in total {
            printed_total = true;
            self.print_stats_block(writer, "Total Execution Time", &result.summary, 2)?;
            for task_start in &config {
                self.print_stats_block(
                    writer,
                    "└─ Gradle Configuration Time",
                    &task_start.summary,
                    4,
                )?;
            }
        }

        // Configuration-only scenarios still get reported.
        if !printed_total {
            for task_start in &config {
                self.print_stats_block(
                    writer,
                    "Gradle Configuration Time",
                    &task_start.summary,
                    2,
                )?;
            }
        }

        writeln!(writer)
    }

    fn print_comparison_header(&self, writer: &mut dyn Write) -> io::Result<()> {
        writeln!(writer)?;
        let header = format!(
            "{:<36} {:<22} {:>10} {:>10} {:>10} {:>10} {:>8} {:>12}",
            "Scenario", "Sample", "Base", "Head", "Diff", "Change", "p-value", "Verdict"
        );
        writeln!(writer, "{}", self.paint(&header, |t| t.bold()))?;
        writeln!(writer, "{}", "-".repeat(TABLE_WIDTH))
    }

    fn print_comparison_row(
        &self,
        writer: &mut dyn Write,
        comparison: &BenchmarkComparison,
    ) -> io::Result<()> {
        let name = if comparison.scenario.chars().count() > 34 {
            let truncated: String = comparison.scenario.chars().take(31).collect();
            format!("{truncated}...")
        } else {
            comparison.scenario.clone()
        };

        let diff = if comparison.diff < 0.0 {
            format!("-{}", format_time(comparison.diff.abs()))
        } else {
            format!("+{}", format_time(comparison.diff))
        };

        // Pad before coloring so escape codes don't break alignment.
        let change = format!("{:>10}", format_change(comparison.pct_change));
        let verdict = format!("{:>12}", comparison.verdict.label());

        writeln!(
            writer,
            "{:<36} {:<22} {:>10} {:>10} {:>10} {} {:>8.4} {}",
            name,
            comparison.kind.label(),
            format_time(comparison.base.mean),
            format_time(comparison.head.mean),
            diff,
            self.paint_verdict(&change, comparison.verdict),
            comparison.test_result.p_value,
            self.paint_verdict(&verdict, comparison.verdict),
        )
    }

    fn print_comparison_footer(
        &self,
        writer: &mut dyn Write,
        comparisons: &ComparisonSet,
    ) -> io::Result<()> {
        writeln!(writer)?;
        writeln!(writer, "{}", "-".repeat(TABLE_WIDTH))?;

        write!(writer, "{} ", self.paint("Summary:", |t| t.bold()))?;
        writeln!(
            writer,
            "{}, {}, {}, {}",
            self.paint_verdict(
                &format!("{} regression(s)", comparisons.count(Verdict::Regression)),
                Verdict::Regression
            ),
            self.paint_verdict(
                &format!("{} warning(s)", comparisons.count(Verdict::Warning)),
                Verdict::Warning
            ),
            self.paint_verdict(
                &format!("{} improvement(s)", comparisons.count(Verdict::Improvement)),
                Verdict::Improvement
            ),
            format!("{} neutral", comparisons.count(Verdict::Neutral)),
        )?;

        if let Some(average) = comparisons.average_regression_pct() {
            writeln!(writer, "Average regression: {}", format_change(average))?;
        }

        for (scenario, kind) in &comparisons.base_only {
            writeln!(writer, "Only in base: {scenario} ({kind})")?;
        }
        for (scenario, kind) in &comparisons.head_only {
            writeln!(writer, "Only in head: {scenario} ({kind})")?;
        }

        writeln!(writer)
    }
}

impl Reporter for TerminalReporter {
    fn write_summary(
        &self,
        writer: &mut dyn Write,
        results: &[BenchmarkResult],
    ) -> Result<(), ReportError> {
        if results.is_empty() {
            writeln!(writer, "No benchmark results found.")?;
            return Ok(());
        }

        self.banner(writer, "BUILD PERFORMANCE BENCHMARK RESULTS")?;

        let mut scenarios: Vec<&str> = Vec::new();
        for result in results {
            if !scenarios.contains(&result.scenario.as_str()) {
                scenarios.push(&result.scenario);
            }
        }

        for scenario in scenarios {
            let group: Vec<&BenchmarkResult> =
                results.iter().filter(|r| r.scenario == scenario).collect();
            self.print_scenario(writer, scenario, &group)?;
        }

        Ok(())
    }

    fn write_comparison(
        &self,
        writer: &mut dyn Write,
        comparisons: &ComparisonSet,
    ) -> Result<(), ReportError> {
        self.banner(writer, "BUILD PERFORMANCE COMPARISON (base vs head)")?;
        self.print_comparison_header(writer)?;
        for comparison in &comparisons.comparisons {
            self.print_comparison_row(writer, comparison)?;
        }
        self.print_comparison_footer(writer, comparisons)?;
        Ok(())
    }

    fn write_anomalies(
        &self,
        writer: &mut dyn Write,
        report: &AnomalyReport,
    ) -> Result<(), ReportError> {
        writeln!(writer)?;
        writeln!(writer, "{}", self.paint("--- Analysis Results ---", |t| t.bold()))?;
        match report.current_date {
            Some(date) => writeln!(writer, "Most Recent Date: {date}")?,
            None => writeln!(writer, "Most Recent Date: none")?,
        }
        writeln!(
            writer,
            "Total Reviews on Most Recent Date: {}",
            report.total_reviews
        )?;
        writeln!(writer, "Number of Days Covered: {}", report.days_covered)?;
        if let Some(warning) = &report.skew_warning {
            writeln!(writer, "{}", self.paint(warning, |t| t.yellow()))?;
        }
        for stat in &report.statistics {
            writeln!(
                writer,
                "Average {}-Star Reviews: {:.2}, STD: {:.2}",
                stat.rating, stat.mean, stat.std_dev
            )?;
        }

        if !report.has_anomalies() {
            writeln!(writer)?;
            writeln!(writer, "{}", self.paint("No anomalies detected.", |t| t.green()))?;
            if !report.no_anomaly_reasons.is_empty() {
                writeln!(writer, "Reasons:")?;
                for reason in &report.no_anomaly_reasons {
                    writeln!(writer, "- {reason}")?;
                }
            }
            return Ok(());
        }

        writeln!(writer)?;
        writeln!(writer, "{}", self.paint("Anomalies Found:", |t| t.red().bold()))?;
        for stat in report.anomalies() {
            writeln!(
                writer,
                "{}-Star Reviews: {} (Z-Score: {:.2}, Avg: {:.2}, STD: {:.2}, Threshold: {})",
                stat.rating,
                stat.current_count,
                stat.z_score,
                stat.mean,
                stat.std_dev,
                stat.threshold
            )?;
        }

        writeln!(writer)?;
        writeln!(writer, "--- Reviews Related to Anomalies ---")?;
        for review in &report.anomalous_reviews {
            writeln!(writer)?;
            writeln!(
                writer,
                "Review by {} (Rating: {}):",
                review.author, review.rating
            )?;
            writeln!(writer, "Date: {}", review.at)?;
            writeln!(writer, "Review: {}", review.text)?;
        }

        Ok(())
    }
}
