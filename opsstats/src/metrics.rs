//! Submission of aggregate benchmark statistics to the metrics endpoint.
//!
//! Each result becomes one GET request whose query string carries the
//! statistics, matching what the build-time dashboard ingests.

use std::time::Duration;

use opsstats_core::BenchmarkResult;
use thiserror::Error;
use tracing::{info, warn};

/// Default pixel endpoint for Android build times.
pub const DEFAULT_ENDPOINT: &str = "https://improving.duckduckgo.com/t/m_build_time_android";

/// Errors that can occur while submitting metrics.
#[derive(Debug, Error)]
pub enum MetricsError {
    /// HTTP request to the endpoint failed.
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Invalid endpoint URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

/// CI identifiers attached to every submission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunContext {
    pub github_action_run_id: Option<String>,
    pub git_commit_sha: Option<String>,
}

impl RunContext {
    /// Submissions are only linked to CI runs when both identifiers are known.
    pub fn is_complete(&self) -> bool {
        self.github_action_run_id.is_some() && self.git_commit_sha.is_some()
    }
}

/// Query parameters describing one result, numbers to three decimals.
pub fn query_params(result: &BenchmarkResult, context: &RunContext) -> Vec<(&'static str, String)> {
    let s = &result.summary;
    let mut params = vec![
        ("scenario", result.scenario.clone()),
        ("sample", result.kind.label().to_string()),
        ("mean", format!("{:.3}", s.mean)),
        ("median", format!("{:.3}", s.median)),
        ("std_dev", format!("{:.3}", s.std_dev)),
        ("min", format!("{:.3}", s.min)),
        ("max", format!("{:.3}", s.max)),
    ];

    if let Some(run_id) = &context.github_action_run_id {
        params.push(("github_action_run_id", run_id.clone()));
    }
    if let Some(sha) = &context.git_commit_sha {
        params.push(("git_commit_sha", sha.clone()));
    }

    params
}

/// Outcome of submitting a batch of results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubmissionSummary {
    pub sent: usize,
    pub failed: usize,
}

/// Client for the metrics endpoint.
pub struct MetricsClient {
    endpoint: String,
    client: reqwest::Client,
}

impl MetricsClient {
    /// Create a client for the given endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is not http(s) or the client cannot be created.
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, MetricsError> {
        if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
            return Err(MetricsError::InvalidUrl(format!(
                "URL must start with http:// or https://: {}",
                endpoint
            )));
        }

        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            endpoint: endpoint.to_string(),
            client,
        })
    }

    /// Submit a single result.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the endpoint answers with an error status.
    pub async fn submit(
        &self,
        result: &BenchmarkResult,
        context: &RunContext,
    ) -> Result<(), MetricsError> {
        self.client
            .get(&self.endpoint)
            .query(&query_params(result, context))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    /// Submit every result in turn; failures are logged and counted, never fatal.
    pub async fn submit_all(
        &self,
        results: &[BenchmarkResult],
        context: &RunContext,
    ) -> SubmissionSummary {
        let mut summary = SubmissionSummary::default();

        for result in results {
            info!(scenario = %result.scenario, sample = %result.kind, "Sending results");
            match self.submit(result, context).await {
                Ok(()) => {
                    summary.sent += 1;
                    info!(scenario = %result.scenario, sample = %result.kind, "Sent results");
                }
                Err(e) => {
                    summary.failed += 1;
                    warn!(
                        scenario = %result.scenario,
                        sample = %result.kind,
                        error = %e,
                        "Failed to send results"
                    );
                }
            }
        }

        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opsstats_core::SampleKind;

    fn result() -> BenchmarkResult {
        BenchmarkResult::new(
            "assembleDebug",
            SampleKind::TotalExecutionTime,
            vec![61.25, 62.0, 60.5],
        )
        .unwrap()
    }

    #[test]
    fn test_query_params_without_context() {
        let params = query_params(&result(), &RunContext::default());

        let keys: Vec<&str> = params.iter().map(|(k, _)| *k).collect();
        assert_eq!(
            keys,
            vec!["scenario", "sample", "mean", "median", "std_dev", "min", "max"]
        );
        assert_eq!(params[1].1, "total execution time");
        assert_eq!(params[3].1, "61.250");
        assert_eq!(params[5].1, "60.500");
        assert_eq!(params[6].1, "62.000");
    }

    #[test]
    fn test_query_params_with_context() {
        let context = RunContext {
            github_action_run_id: Some("123".to_string()),
            git_commit_sha: Some("abc".to_string()),
        };

        let params = query_params(&result(), &context);

        assert!(params.contains(&("github_action_run_id", "123".to_string())));
        assert!(params.contains(&("git_commit_sha", "abc".to_string())));
        assert!(context.is_complete());
    }

    #[test]
    fn test_context_incomplete() {
        let context = RunContext {
            github_action_run_id: Some("123".to_string()),
            git_commit_sha: None,
        };
        assert!(!context.is_complete());
    }

    #[test]
    fn test_invalid_endpoint() {
        let result = MetricsClient::new("ftp://example.com", Duration::from_secs(1));
        assert!(matches!(result, Err(MetricsError::InvalidUrl(_))));
    }
}
