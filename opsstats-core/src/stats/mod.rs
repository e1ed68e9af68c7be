//! Descriptive statistics shared by the anomaly detector and the benchmark comparator.

use serde::Serialize;
use statrs::statistics::Statistics;

/// Summary statistics over a non-empty sequence of samples.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Summary {
    pub mean: f64,
    pub median: f64,
    /// Sample standard deviation (n-1 denominator), 0 when fewer than two samples.
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    pub count: usize,
}

impl Summary {
    /// Summarise the given samples, returning `None` for an empty slice.
    pub fn from_samples(samples: &[f64]) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }

        let min = samples.iter().copied().fold(f64::INFINITY, f64::min);
        let max = samples.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        Some(Self {
            // Clamped so accumulated rounding can never push the mean outside the range.
            mean: mean(samples).max(min).min(max),
            median: median(samples),
            std_dev: sample_std_dev(samples),
            min,
            max,
            count: samples.len(),
        })
    }
}

/// Arithmetic mean, 0 for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().mean()
}

/// Sample standard deviation with Bessel's correction.
///
/// Returns 0 instead of NaN when fewer than two values are available.
pub fn sample_std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    values.iter().std_dev()
}

/// Median of the values; the mean of the two middle values for even lengths.
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let len = sorted.len();
    if len % 2 == 0 {
        (sorted[len / 2 - 1] + sorted[len / 2]) / 2.0
    } else {
        sorted[len / 2]
    }
}

/// Number of standard deviations `observed` lies from `mean`.
///
/// Defined as 0 when the standard deviation is not positive.
pub fn z_score(observed: f64, mean: f64, std_dev: f64) -> f64 {
    if std_dev > 0.0 {
        (observed - mean) / std_dev
    } else {
        0.0
    }
}

/// Percent change from `base` to `head`, 0 when `base` is 0.
pub fn percent_change(base: f64, head: f64) -> f64 {
    if base == 0.0 {
        return 0.0;
    }
    100.0 * (head - base) / base
}

/// The result of a statistical comparison between base and head samples.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TestResult {
    /// Two-tailed p-value (probability of observing the difference by chance).
    pub p_value: f64,
    /// Whether the p-value is below `1 - confidence_level`.
    pub statistically_significant: bool,
    /// The confidence level used for the test (e.g., 0.95 for 95% confidence).
    pub confidence_level: f64,
}

/// Trait for statistical tests that compare two sets of measurements.
pub trait StatisticalTest: Send + Sync {
    /// Analyze base and head samples and return a statistical test result.
    fn analyze(&self, base: &[f64], head: &[f64]) -> TestResult;
}

mod ttest;
pub use ttest::WelchTTest;
