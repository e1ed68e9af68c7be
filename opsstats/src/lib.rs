//! opsstats: operational statistics for the Android app
//!
//! This library fetches Play Store reviews and flags days with unusual rating
//! volumes, and summarizes or compares gradle-profiler build benchmarks.

pub mod cli;
pub mod commands;
pub mod config;
pub mod csv_input;
pub mod metrics;
pub mod reviews;

// Re-export core types for convenience
pub use opsstats_core::{
    AnomalyDetector, AnomalyReport, BenchmarkResult, Comparator, ComparisonSet, MarkdownReporter,
    Reporter, Review, TerminalReporter,
};

// Re-export main types from this crate
pub use cli::{Cli, Command};
pub use config::Config;
pub use csv_input::{load_results, CsvInputError};
pub use metrics::{MetricsClient, MetricsError, RunContext, SubmissionSummary};
pub use reviews::{
    fetch_all, FetchedReviews, HttpReviewSource, JsonFileReviewSource, ReviewSource,
    ReviewSourceError,
};
