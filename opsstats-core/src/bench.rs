//! Build benchmark aggregation and base/head comparison.
//!
//! Samples come from gradle-profiler's long CSV format. Only the MEASURE phase
//! counts towards statistics; warm-up iterations are discarded by the caller.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::stats::{percent_change, StatisticalTest, Summary, TestResult, WelchTTest};

/// The profiling phase whose samples are counted.
pub const MEASURE_PHASE: &str = "MEASURE";

/// The kinds of gradle-profiler samples the comparator understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SampleKind {
    #[serde(rename = "total execution time")]
    TotalExecutionTime,
    #[serde(rename = "task start")]
    TaskStart,
}

impl SampleKind {
    /// Parse the `Sample` column of a gradle-profiler CSV row.
    pub fn parse(label: &str) -> Option<Self> {
        match label {
            "total execution time" => Some(Self::TotalExecutionTime),
            "task start" => Some(Self::TaskStart),
            _ => None,
        }
    }

    /// The label gradle-profiler uses for this kind.
    pub fn label(&self) -> &'static str {
        match self {
            Self::TotalExecutionTime => "total execution time",
            Self::TaskStart => "task start",
        }
    }
}

impl fmt::Display for SampleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A single measured duration for a scenario.
#[derive(Debug, Clone, PartialEq)]
pub struct BenchmarkSample {
    pub scenario: String,
    pub kind: SampleKind,
    pub seconds: f64,
}

impl BenchmarkSample {
    /// Build a sample from a gradle-profiler duration in milliseconds.
    pub fn from_millis(scenario: impl Into<String>, kind: SampleKind, millis: f64) -> Self {
        Self {
            scenario: scenario.into(),
            kind,
            seconds: millis / 1000.0,
        }
    }
}

/// Aggregated statistics for one (scenario, sample kind) group.
#[derive(Debug, Clone, Serialize)]
pub struct BenchmarkResult {
    pub scenario: String,
    pub kind: SampleKind,
    pub summary: Summary,
    /// Raw samples in seconds, in input order.
    pub samples: Vec<f64>,
}

impl BenchmarkResult {
    /// Build a result from a non-empty set of samples.
    pub fn new(scenario: impl Into<String>, kind: SampleKind, samples: Vec<f64>) -> Option<Self> {
        let summary = Summary::from_samples(&samples)?;
        Some(Self {
            scenario: scenario.into(),
            kind,
            summary,
            samples,
        })
    }
}

/// Group samples by (scenario, kind) and summarise each group.
///
/// Groups are returned in the order their first sample was seen.
pub fn aggregate(samples: impl IntoIterator<Item = BenchmarkSample>) -> Vec<BenchmarkResult> {
    let mut order: Vec<(String, SampleKind)> = Vec::new();
    let mut groups: HashMap<(String, SampleKind), Vec<f64>> = HashMap::new();

    for sample in samples {
        let key = (sample.scenario, sample.kind);
        match groups.get_mut(&key) {
            Some(values) => values.push(sample.seconds),
            None => {
                order.push(key.clone());
                groups.insert(key, vec![sample.seconds]);
            }
        }
    }

    order
        .into_iter()
        .filter_map(|key| {
            let values = groups.remove(&key)?;
            BenchmarkResult::new(key.0, key.1, values)
        })
        .collect()
}

/// Classification of a head-vs-base change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Verdict {
    Regression,
    Warning,
    Improvement,
    Neutral,
}

impl Verdict {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Regression => "regression",
            Self::Warning => "warning",
            Self::Improvement => "improvement",
            Self::Neutral => "neutral",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Percent-change cut-offs for classifying a comparison.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComparisonThresholds {
    /// Changes strictly above this are regressions.
    pub regression_pct: f64,
    /// Changes strictly above this (and not regressions) are warnings.
    pub warning_pct: f64,
    /// Changes strictly below this are improvements.
    pub improvement_pct: f64,
}

impl Default for ComparisonThresholds {
    fn default() -> Self {
        Self {
            regression_pct: 10.0,
            warning_pct: 5.0,
            improvement_pct: -5.0,
        }
    }
}

impl ComparisonThresholds {
    pub fn classify(&self, pct_change: f64) -> Verdict {
        if pct_change > self.regression_pct {
            Verdict::Regression
        } else if pct_change > self.warning_pct {
            Verdict::Warning
        } else if pct_change < self.improvement_pct {
            Verdict::Improvement
        } else {
            Verdict::Neutral
        }
    }
}

/// A single (scenario, kind) present in both base and head.
#[derive(Debug, Clone, Serialize)]
pub struct BenchmarkComparison {
    pub scenario: String,
    pub kind: SampleKind,
    pub base: Summary,
    pub head: Summary,
    /// `head.mean - base.mean`, in seconds.
    pub diff: f64,
    pub pct_change: f64,
    pub verdict: Verdict,
    pub test_result: TestResult,
}

/// Result of comparing a base result set against a head result set.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ComparisonSet {
    pub comparisons: Vec<BenchmarkComparison>,
    /// Groups measured only on the base side.
    pub base_only: Vec<(String, SampleKind)>,
    /// Groups measured only on the head side.
    pub head_only: Vec<(String, SampleKind)>,
}

impl ComparisonSet {
    pub fn count(&self, verdict: Verdict) -> usize {
        self.comparisons
            .iter()
            .filter(|c| c.verdict == verdict)
            .count()
    }

    pub fn regressions(&self) -> impl Iterator<Item = &BenchmarkComparison> {
        self.comparisons
            .iter()
            .filter(|c| c.verdict == Verdict::Regression)
    }

    pub fn has_regressions(&self) -> bool {
        self.regressions().next().is_some()
    }

    /// Average percent change across regressions, `None` when there are none.
    pub fn average_regression_pct(&self) -> Option<f64> {
        let pcts: Vec<f64> = self.regressions().map(|c| c.pct_change).collect();
        if pcts.is_empty() {
            None
        } else {
            Some(pcts.iter().sum::<f64>() / pcts.len() as f64)
        }
    }
}

/// Compares base and head benchmark results.
pub struct Comparator {
    thresholds: ComparisonThresholds,
    test: Box<dyn StatisticalTest>,
}

impl Default for Comparator {
    fn default() -> Self {
        Self::new(ComparisonThresholds::default())
    }
}

impl Comparator {
    /// Create a comparator using Welch's t-test for the informational p-value.
    pub fn new(thresholds: ComparisonThresholds) -> Self {
        Self {
            thresholds,
            test: Box::new(WelchTTest::default()),
        }
    }

    /// Replace the statistical test used for p-values.
    pub fn with_test(mut self, test: impl StatisticalTest + 'static) -> Self {
        self.test = Box::new(test);
        self
    }

    pub fn compare_pair(
        &self,
        base: &BenchmarkResult,
        head: &BenchmarkResult,
    ) -> BenchmarkComparison {
        let diff = head.summary.mean - base.summary.mean;
        let pct_change = percent_change(base.summary.mean, head.summary.mean);

        BenchmarkComparison {
            scenario: base.scenario.clone(),
            kind: base.kind,
            base: base.summary,
            head: head.summary,
            diff,
            pct_change,
            verdict: self.thresholds.classify(pct_change),
            test_result: self.test.analyze(&base.samples, &head.samples),
        }
    }

    /// Match results by (scenario, kind) and compare each pair, in base order.
    pub fn compare(&self, base: &[BenchmarkResult], head: &[BenchmarkResult]) -> ComparisonSet {
        let mut set = ComparisonSet::default();

        for base_result in base {
            let matching = head
                .iter()
                .find(|h| h.scenario == base_result.scenario && h.kind == base_result.kind);
            match matching {
                Some(head_result) => set
                    .comparisons
                    .push(self.compare_pair(base_result, head_result)),
                None => set
                    .base_only
                    .push((base_result.scenario.clone(), base_result.kind)),
            }
        }

        for head_result in head {
            let in_base = base
                .iter()
                .any(|b| b.scenario == head_result.scenario && b.kind == head_result.kind);
            if !in_base {
                set.head_only
                    .push((head_result.scenario.clone(), head_result.kind));
            }
        }

        set
    }
}
