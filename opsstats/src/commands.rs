//! Subcommand runners.
//!
//! Each runner prints its report to `out` (stdout in the binary), optionally
//! writes a markdown copy, and returns the process exit code.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{bail, Context, Result};
use opsstats_core::{Comparator, MarkdownReporter, Reporter, TerminalReporter};
use tracing::{info, warn};

use crate::cli::{CompareArgs, ReviewsArgs, SummaryArgs};
use crate::config::Config;
use crate::csv_input;
use crate::metrics::{MetricsClient, RunContext};
use crate::reviews::{self, HttpReviewSource, JsonFileReviewSource};

pub const EXIT_OK: u8 = 0;
pub const EXIT_FAILURE: u8 = 1;

fn terminal_reporter(use_colors: bool) -> TerminalReporter {
    if use_colors {
        TerminalReporter::new()
    } else {
        TerminalReporter::without_colors()
    }
}

/// Render a markdown report into `path`.
fn write_markdown<F>(path: &Path, render: F) -> Result<()>
where
    F: FnOnce(&MarkdownReporter, &mut dyn Write) -> Result<(), opsstats_core::ReportError>,
{
    let file = File::create(path)
        .with_context(|| format!("Failed to create markdown report: {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    render(&MarkdownReporter::new(), &mut writer)?;
    writer.flush()?;
    info!(path = %path.display(), "Wrote markdown report");
    Ok(())
}

/// Fetch reviews and report rating anomalies for the latest day.
pub async fn run_reviews(
    args: &ReviewsArgs,
    config: &Config,
    use_colors: bool,
    out: &mut dyn Write,
) -> Result<u8> {
    let settings = &config.reviews;

    let fetched = if let Some(path) = &args.reviews_file {
        let source = JsonFileReviewSource::load(path)?;
        info!(path = %path.display(), count = source.len(), "Loaded reviews from file");
        reviews::fetch_all(
            &source,
            &args.package_name,
            &settings.langs,
            &settings.countries,
            settings.count,
        )
        .await
    } else if let Some(url) = &settings.base_url {
        let source = HttpReviewSource::new(url, settings.timeout())?;
        reviews::fetch_all(
            &source,
            &args.package_name,
            &settings.langs,
            &settings.countries,
            settings.count,
        )
        .await
    } else {
        bail!(
            "No review source configured: pass --reviews-file or --source-url, \
             or set reviews.base_url"
        );
    };

    let report = config.anomaly.detector().analyze(&fetched.reviews);

    terminal_reporter(use_colors).write_anomalies(out, &report)?;

    if let Some(path) = &args.markdown {
        write_markdown(path, |reporter, writer| reporter.write_anomalies(writer, &report))?;
    }

    Ok(EXIT_OK)
}

/// Summarize one benchmark CSV and optionally submit the results.
pub async fn run_summary(
    args: &SummaryArgs,
    config: &Config,
    use_colors: bool,
    out: &mut dyn Write,
) -> Result<u8> {
    let results = csv_input::load_results(&args.csv_file)?;

    // An empty result set still gets the "No benchmark results found." line.
    terminal_reporter(use_colors).write_summary(out, &results)?;

    if results.is_empty() {
        warn!(path = %args.csv_file.display(), "No benchmark results found");
        return Ok(EXIT_FAILURE);
    }

    if let Some(path) = &args.markdown {
        write_markdown(path, |reporter, writer| reporter.write_summary(writer, &results))?;
    }

    if args.report_pixel {
        let context = RunContext {
            github_action_run_id: args.github_action_run_id.clone(),
            git_commit_sha: args.git_commit_sha.clone(),
        };
        if context.is_complete() {
            let client = MetricsClient::new(&config.metrics.endpoint, config.metrics.timeout())?;
            let submitted = client.submit_all(&results, &context).await;
            info!(sent = submitted.sent, failed = submitted.failed, "Submitted results");
        } else {
            warn!("Skipping metrics submission: GitHub run id and commit sha are both required");
        }
    }

    Ok(EXIT_OK)
}

/// Compare base and head benchmark CSVs.
pub fn run_compare(
    args: &CompareArgs,
    config: &Config,
    use_colors: bool,
    out: &mut dyn Write,
) -> Result<u8> {
    let base = csv_input::load_results(&args.base)?;
    let head = csv_input::load_results(&args.head)?;

    if base.is_empty() || head.is_empty() {
        warn!(
            base = base.len(),
            head = head.len(),
            "Cannot compare: one side has no benchmark results"
        );
        return Ok(EXIT_FAILURE);
    }

    let comparisons = Comparator::new(config.comparison).compare(&base, &head);

    terminal_reporter(use_colors).write_comparison(out, &comparisons)?;

    if let Some(path) = &args.markdown {
        write_markdown(path, |reporter, writer| {
            reporter.write_comparison(writer, &comparisons)
        })?;
    }

    if args.fail_on_regression && comparisons.has_regressions() {
        warn!(
            regressions = comparisons.regressions().count(),
            "Benchmark regressions detected"
        );
        return Ok(EXIT_FAILURE);
    }

    Ok(EXIT_OK)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::{NamedTempFile, TempDir};

    fn csv_file(rows: &[(&str, &str, &str)]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "Scenario,Phase,Sample,Duration").unwrap();
        for (scenario, sample, duration) in rows {
            writeln!(file, "{scenario},MEASURE,{sample},{duration}").unwrap();
        }
        file
    }

    fn compare_args(base: &Path, head: &Path, fail_on_regression: bool) -> CompareArgs {
        CompareArgs {
            base: base.to_path_buf(),
            head: head.to_path_buf(),
            markdown: None,
            fail_on_regression,
        }
    }

    #[test]
    fn test_compare_regression_exit_code() {
        let base = csv_file(&[("build", "total execution time", "100000")]);
        let head = csv_file(&[("build", "total execution time", "120000")]);
        let config = Config::default();

        let mut out = Vec::new();

        let lenient = compare_args(base.path(), head.path(), false);
        assert_eq!(run_compare(&lenient, &config, false, &mut out).unwrap(), EXIT_OK);

        let strict = compare_args(base.path(), head.path(), true);
        assert_eq!(run_compare(&strict, &config, false, &mut out).unwrap(), EXIT_FAILURE);

        let printed = String::from_utf8(out).unwrap();
        assert!(printed.contains("1 regression(s)"));
    }

    #[test]
    fn test_compare_empty_side_fails() {
        let base = csv_file(&[("build", "total execution time", "100000")]);
        let head = csv_file(&[]);

        let code = run_compare(
            &compare_args(base.path(), head.path(), false),
            &Config::default(),
            false,
            &mut Vec::new(),
        )
        .unwrap();
        assert_eq!(code, EXIT_FAILURE);
    }

    #[test]
    fn test_compare_writes_markdown() {
        let base = csv_file(&[("build", "total execution time", "100000")]);
        let head = csv_file(&[("build", "total execution time", "90000")]);
        let dir = TempDir::new().unwrap();
        let report = dir.path().join("comparison.md");

        let mut args = compare_args(base.path(), head.path(), true);
        args.markdown = Some(report.clone());
        let code = run_compare(&args, &Config::default(), false, &mut Vec::new()).unwrap();

        assert_eq!(code, EXIT_OK);
        let markdown = std::fs::read_to_string(&report).unwrap();
        assert!(markdown.contains("build"));
    }

    #[tokio::test]
    async fn test_summary_missing_file_fails() {
        let args = SummaryArgs {
            csv_file: "/nonexistent/benchmark.csv".into(),
            markdown: None,
            report_pixel: false,
            github_action_run_id: None,
            git_commit_sha: None,
        };

        let mut out = Vec::new();

        let code = run_summary(&args, &Config::default(), false, &mut out)
            .await
            .unwrap();

        assert_eq!(code, EXIT_FAILURE);
        assert_eq!(String::from_utf8(out).unwrap(), "No benchmark results found.\n");
    }

    #[tokio::test]
    async fn test_summary_prints_results() {
        let csv = csv_file(&[
            ("build", "total execution time", "90000"),
            ("build", "task start", "3000"),
        ]);
        let args = SummaryArgs {
            csv_file: csv.path().to_path_buf(),
            markdown: None,
            report_pixel: true,
            github_action_run_id: None,
            git_commit_sha: None,
        };
        let mut out = Vec::new();

        let code = run_summary(&args, &Config::default(), false, &mut out)
            .await
            .unwrap();

        assert_eq!(code, EXIT_OK);
        let printed = String::from_utf8(out).unwrap();
        assert!(printed.contains("BUILD PERFORMANCE BENCHMARK RESULTS"));
        assert!(printed.contains("1m 30.0s"));
    }

    #[tokio::test]
    async fn test_reviews_without_source_is_error() {
        let args = ReviewsArgs {
            package_name: "com.example".to_string(),
            langs: vec![],
            countries: vec![],
            count: None,
            source_url: None,
            reviews_file: None,
            exclude_current_day: false,
            markdown: None,
        };

        let result = run_reviews(&args, &Config::default(), false, &mut Vec::new()).await;
        assert!(result.is_err());
    }
}
