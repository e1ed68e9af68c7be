//! Command-line interface for opsstats.

use crate::config::Config;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "opsstats")]
#[command(about = "Review anomaly detection and build benchmark comparison")]
#[command(version)]
pub struct Cli {
    /// Path to config file (defaults to .opsstats.toml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored terminal output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch recent reviews and flag unusual rating volumes for the latest day
    Reviews(ReviewsArgs),
    /// Summarize a gradle-profiler benchmark CSV
    Summary(SummaryArgs),
    /// Compare two gradle-profiler benchmark CSVs
    Compare(CompareArgs),
}

#[derive(Debug, Args)]
pub struct ReviewsArgs {
    /// Application package name
    #[arg(long, alias = "package_name")]
    pub package_name: String,

    /// Review languages, comma separated
    #[arg(long, value_delimiter = ',')]
    pub langs: Vec<String>,

    /// Review countries, comma separated
    #[arg(long, value_delimiter = ',')]
    pub countries: Vec<String>,

    /// Reviews to fetch per (language, country) pair
    #[arg(long)]
    pub count: Option<usize>,

    /// Base URL of the review API
    #[arg(long, env = "OPSSTATS_REVIEWS_URL")]
    pub source_url: Option<String>,

    /// Read reviews from a JSON file instead of the API
    #[arg(long)]
    pub reviews_file: Option<PathBuf>,

    /// Leave the latest day out of the baseline statistics
    #[arg(long)]
    pub exclude_current_day: bool,

    /// Also write a markdown report to this path
    #[arg(long)]
    pub markdown: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct SummaryArgs {
    /// gradle-profiler benchmark CSV
    pub csv_file: PathBuf,

    /// Also write a markdown report to this path
    #[arg(long)]
    pub markdown: Option<PathBuf>,

    /// Submit each result to the metrics endpoint
    #[arg(long)]
    pub report_pixel: bool,

    #[arg(long, env = "GITHUB_RUN_ID")]
    pub github_action_run_id: Option<String>,

    #[arg(long, env = "GITHUB_SHA")]
    pub git_commit_sha: Option<String>,
}

#[derive(Debug, Args)]
pub struct CompareArgs {
    /// Benchmark CSV of the base revision
    #[arg(long)]
    pub base: PathBuf,

    /// Benchmark CSV of the head revision
    #[arg(long)]
    pub head: PathBuf,

    /// Also write a markdown report to this path
    #[arg(long)]
    pub markdown: Option<PathBuf>,

    /// Exit with status 1 when any scenario regressed
    #[arg(long)]
    pub fail_on_regression: bool,
}

impl Cli {
    /// Apply CLI overrides to the configuration.
    ///
    /// CLI arguments take precedence over config file values.
    /// Only values given on the command line override the config.
    pub fn apply_to_config(&self, config: &mut Config) {
        if let Command::Reviews(args) = &self.command {
            if !args.langs.is_empty() {
                config.reviews.langs = args.langs.clone();
            }
            if !args.countries.is_empty() {
                config.reviews.countries = args.countries.clone();
            }
            if let Some(count) = args.count {
                config.reviews.count = count;
            }
            if let Some(url) = &args.source_url {
                config.reviews.base_url = Some(url.clone());
            }
            if args.exclude_current_day {
                config.anomaly.exclude_current_day = true;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_reviews() {
        let cli = Cli::parse_from([
            "opsstats",
            "reviews",
            "--package-name",
            "com.duckduckgo.mobile.android",
            "--langs",
            "en,de",
            "--countries",
            "us",
            "--count",
            "500",
            "--reviews-file",
            "reviews.json",
            "-v",
        ]);

        assert!(cli.verbose);
        let Command::Reviews(args) = &cli.command else {
            panic!("expected reviews command");
        };
        assert_eq!(args.package_name, "com.duckduckgo.mobile.android");
        assert_eq!(args.langs, vec!["en", "de"]);
        assert_eq!(args.countries, vec!["us"]);
        assert_eq!(args.count, Some(500));
        assert_eq!(args.reviews_file, Some(PathBuf::from("reviews.json")));
        assert!(!args.exclude_current_day);
    }

    #[test]
    fn test_parse_reviews_underscore_alias() {
        let cli = Cli::parse_from(["opsstats", "reviews", "--package_name", "com.example"]);

        let Command::Reviews(args) = &cli.command else {
            panic!("expected reviews command");
        };
        assert_eq!(args.package_name, "com.example");
        assert!(args.langs.is_empty());
    }

    #[test]
    fn test_parse_summary() {
        let cli = Cli::parse_from([
            "opsstats",
            "summary",
            "benchmark.csv",
            "--report-pixel",
            "--github-action-run-id",
            "42",
            "--git-commit-sha",
            "deadbeef",
        ]);

        let Command::Summary(args) = &cli.command else {
            panic!("expected summary command");
        };
        assert_eq!(args.csv_file, PathBuf::from("benchmark.csv"));
        assert!(args.report_pixel);
        assert_eq!(args.github_action_run_id.as_deref(), Some("42"));
        assert_eq!(args.git_commit_sha.as_deref(), Some("deadbeef"));
        assert!(args.markdown.is_none());
    }

    #[test]
    fn test_parse_compare() {
        let cli = Cli::parse_from([
            "opsstats",
            "--no-color",
            "compare",
            "--base",
            "base.csv",
            "--head",
            "head.csv",
            "--markdown",
            "report.md",
            "--fail-on-regression",
        ]);

        assert!(cli.no_color);
        let Command::Compare(args) = &cli.command else {
            panic!("expected compare command");
        };
        assert_eq!(args.base, PathBuf::from("base.csv"));
        assert_eq!(args.head, PathBuf::from("head.csv"));
        assert_eq!(args.markdown, Some(PathBuf::from("report.md")));
        assert!(args.fail_on_regression);
    }

    #[test]
    fn test_apply_to_config_with_overrides() {
        let cli = Cli::parse_from([
            "opsstats",
            "reviews",
            "--package-name",
            "com.example",
            "--langs",
            "fr",
            "--count",
            "50",
            "--source-url",
            "http://localhost:8080",
            "--exclude-current-day",
        ]);

        let mut config = Config::default();
        cli.apply_to_config(&mut config);

        assert_eq!(config.reviews.langs, vec!["fr"]);
        assert_eq!(config.reviews.countries, vec!["us"]);
        assert_eq!(config.reviews.count, 50);
        assert_eq!(
            config.reviews.base_url.as_deref(),
            Some("http://localhost:8080")
        );
        assert!(config.anomaly.exclude_current_day);
    }

    #[test]
    fn test_apply_to_config_without_overrides() {
        let cli = Cli::parse_from(["opsstats", "compare", "--base", "a.csv", "--head", "b.csv"]);

        let mut config = Config::default();
        let original_count = config.reviews.count;
        cli.apply_to_config(&mut config);

        // Values should remain unchanged
        assert_eq!(config.reviews.count, original_count);
        assert!(!config.anomaly.exclude_current_day);
    }
}
