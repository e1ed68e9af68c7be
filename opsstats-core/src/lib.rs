//! Core types and statistics for opsstats.
//!
//! This crate holds the pure computations: review anomaly detection, build
//! benchmark aggregation and comparison, and the reporters that render them.
//! Everything that touches the network or the filesystem lives in the
//! `opsstats` crate.

pub mod anomaly;
pub mod bench;
pub mod report;
pub mod stats;

// Re-export main types for convenience
pub use anomaly::{
    AnomalyDetector, AnomalyReport, AnomalyThresholds, BaselineMode, DailyBucket, RatingStatistic,
    Review,
};
pub use bench::{
    aggregate, BenchmarkComparison, BenchmarkResult, BenchmarkSample, Comparator, ComparisonSet,
    ComparisonThresholds, SampleKind, Verdict, MEASURE_PHASE,
};
pub use report::{MarkdownReporter, ReportError, Reporter, TerminalReporter};
pub use stats::{StatisticalTest, Summary, TestResult, WelchTTest};
