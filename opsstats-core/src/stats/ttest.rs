use statrs::distribution::{ContinuousCDF, StudentsT};

use super::{mean, StatisticalTest, TestResult};

/// Welch's t-test for comparing two independent samples with potentially unequal variances.
///
/// Build benchmarks run base and head on different machines or at different times,
/// so equal variances cannot be assumed.
#[derive(Debug, Clone)]
pub struct WelchTTest {
    /// The confidence level for determining statistical significance (default: 0.95).
    pub confidence_level: f64,
}

impl Default for WelchTTest {
    fn default() -> Self {
        Self {
            confidence_level: 0.95,
        }
    }
}

impl WelchTTest {
    /// Create a new Welch's t-test with the specified confidence level.
    ///
    /// # Panics
    /// Panics if confidence_level is not in the range (0, 1).
    pub fn new(confidence_level: f64) -> Self {
        assert!(
            confidence_level > 0.0 && confidence_level < 1.0,
            "confidence_level must be between 0 and 1 (exclusive)"
        );
        Self { confidence_level }
    }

    /// Sample variance with Bessel's correction.
    fn variance(samples: &[f64], mean: f64) -> f64 {
        if samples.len() < 2 {
            return 0.0;
        }
        let sum_sq_diff: f64 = samples.iter().map(|x| (x - mean).powi(2)).sum();
        sum_sq_diff / (samples.len() - 1) as f64
    }

    /// Degrees of freedom from the Welch-Satterthwaite equation.
    ///
    /// df = (var1/n1 + var2/n2)^2 / ((var1/n1)^2/(n1-1) + (var2/n2)^2/(n2-1))
    fn welch_satterthwaite_df(var1: f64, n1: usize, var2: f64, n2: usize) -> f64 {
        let s1 = var1 / n1 as f64;
        let s2 = var2 / n2 as f64;
        let numerator = (s1 + s2).powi(2);
        let denominator = (s1.powi(2) / (n1 - 1) as f64) + (s2.powi(2) / (n2 - 1) as f64);

        if denominator == 0.0 {
            return (n1.min(n2) - 1) as f64;
        }

        numerator / denominator
    }

    fn result(&self, p_value: f64) -> TestResult {
        TestResult {
            p_value,
            statistically_significant: p_value < 1.0 - self.confidence_level,
            confidence_level: self.confidence_level,
        }
    }
}

impl StatisticalTest for WelchTTest {
    fn analyze(&self, base: &[f64], head: &[f64]) -> TestResult {
        let n1 = base.len();
        let n2 = head.len();

        // gradle-profiler runs are often short; a single iteration carries no variance
        if n1 < 2 || n2 < 2 {
            return self.result(1.0);
        }

        let mean1 = mean(base);
        let mean2 = mean(head);
        let var1 = Self::variance(base, mean1);
        let var2 = Self::variance(head, mean2);

        let se = (var1 / n1 as f64 + var2 / n2 as f64).sqrt();
        if se == 0.0 {
            return self.result(if mean1 == mean2 { 1.0 } else { 0.0 });
        }

        let t_statistic = (mean1 - mean2) / se;
        let df = Self::welch_satterthwaite_df(var1, n1, var2, n2);

        let p_value = match StudentsT::new(0.0, 1.0, df) {
            Ok(t_dist) => 2.0 * (1.0 - t_dist.cdf(t_statistic.abs())),
            Err(_) => 1.0,
        };

        self.result(p_value)
    }
}
