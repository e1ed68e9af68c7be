//! Configuration loading for opsstats.
//!
//! Supports loading configuration from TOML files, with sensible defaults
//! for all settings.

use anyhow::{Context, Result};
use opsstats_core::{AnomalyDetector, AnomalyThresholds, BaselineMode, ComparisonThresholds};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::metrics::DEFAULT_ENDPOINT;

/// Top-level configuration for opsstats.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Settings for review anomaly detection.
    pub anomaly: AnomalyConfig,
    /// Percent-change cut-offs for benchmark comparison.
    pub comparison: ComparisonThresholds,
    /// Where and how reviews are fetched.
    pub reviews: ReviewsConfig,
    /// Metrics endpoint for benchmark submissions.
    pub metrics: MetricsConfig,
}

/// Configuration for review anomaly detection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnomalyConfig {
    /// Z-score threshold when the historical std is above `variability_cutoff`.
    pub high_variability_threshold: f64,
    /// Z-score threshold for quieter histories.
    pub low_variability_threshold: f64,
    pub variability_cutoff: f64,
    /// Fewer distinct days than this produce a skew warning.
    pub min_history_days: usize,
    /// Leave the most recent day out of the baseline statistics.
    pub exclude_current_day: bool,
}

/// Configuration for the review API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewsConfig {
    /// Base URL of the paging review API.
    pub base_url: Option<String>,
    pub langs: Vec<String>,
    pub countries: Vec<String>,
    /// Reviews to fetch per (language, country) pair.
    pub count: usize,
    pub timeout_ms: u64,
}

/// Configuration for metrics submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub endpoint: String,
    pub timeout_ms: u64,
}

impl Default for AnomalyConfig {
    fn default() -> Self {
        let thresholds = AnomalyThresholds::default();
        Self {
            high_variability_threshold: thresholds.high_variability,
            low_variability_threshold: thresholds.low_variability,
            variability_cutoff: thresholds.variability_cutoff,
            min_history_days: 4,
            exclude_current_day: false,
        }
    }
}

impl AnomalyConfig {
    /// Build the detector described by this configuration.
    pub fn detector(&self) -> AnomalyDetector {
        let thresholds = AnomalyThresholds {
            high_variability: self.high_variability_threshold,
            low_variability: self.low_variability_threshold,
            variability_cutoff: self.variability_cutoff,
        };
        let baseline = if self.exclude_current_day {
            BaselineMode::ExcludeCurrentDay
        } else {
            BaselineMode::IncludeCurrentDay
        };
        AnomalyDetector::new(thresholds, baseline, self.min_history_days)
    }
}

impl Default for ReviewsConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            langs: vec!["en".to_string()],
            countries: vec!["us".to_string()],
            count: 10_000,
            timeout_ms: 30_000, // 30 seconds
        }
    }
}

impl ReviewsConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout_ms: 10_000,
        }
    }
}

impl MetricsConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Default configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = ".opsstats.toml";

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Config> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Load configuration from `.opsstats.toml` in the current directory, or use defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file exists but cannot be parsed.
    pub fn load_or_default() -> Result<Config> {
        let path = Path::new(DEFAULT_CONFIG_FILE);

        if path.exists() {
            Self::load(path)
        } else {
            Ok(Config::default())
        }
    }

    /// Load configuration from the specified path, or fall back to
    /// [`Config::load_or_default`] when no path is given.
    ///
    /// # Errors
    ///
    /// Returns an error if the specified file cannot be read or parsed.
    pub fn load_from(path: Option<&Path>) -> Result<Config> {
        match path {
            Some(p) => Self::load(p),
            None => Self::load_or_default(),
        }
    }
}
