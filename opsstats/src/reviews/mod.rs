use std::collections::HashSet;
use std::path::PathBuf;

use opsstats_core::Review;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum ReviewSourceError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse reviews from {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// A place reviews can be fetched from, one (language, country) pair at a time.
#[allow(async_fn_in_trait)]
pub trait ReviewSource {
    /// Fetch up to `count` of the newest reviews for the pair.
    async fn fetch(
        &self,
        package: &str,
        lang: &str,
        country: &str,
        count: usize,
    ) -> Result<Vec<Review>, ReviewSourceError>;
}

/// Decode review records one at a time, logging and skipping the malformed ones.
pub fn decode_reviews(records: Vec<serde_json::Value>, origin: &str) -> Vec<Review> {
    let mut reviews = Vec::with_capacity(records.len());
    for (index, record) in records.into_iter().enumerate() {
        match serde_json::from_value::<Review>(record) {
            Ok(review) => reviews.push(review),
            Err(e) => warn!(origin, index, error = %e, "Skipping malformed review"),
        }
    }
    reviews
}

/// Reviews gathered across all requested pairs.
#[derive(Debug, Clone, Default)]
pub struct FetchedReviews {
    /// Deduplicated reviews in fetch order.
    pub reviews: Vec<Review>,
    pub duplicates: usize,
    /// Pairs whose fetch failed.
    pub failed_pairs: Vec<(String, String)>,
}

/// Fetch reviews for every (lang, country) pair, one request after another.
///
/// A failing pair is logged and skipped so the remaining pairs still run.
/// Reviews seen under more than one pair are kept once.
pub async fn fetch_all<S: ReviewSource>(
    source: &S,
    package: &str,
    langs: &[String],
    countries: &[String],
    count: usize,
) -> FetchedReviews {
    let mut fetched = FetchedReviews::default();
    let mut seen: HashSet<String> = HashSet::new();

    for lang in langs {
        for country in countries {
            match source.fetch(package, lang, country, count).await {
                Ok(reviews) => {
                    info!(
                        lang = %lang,
                        country = %country,
                        count = reviews.len(),
                        "Fetched reviews"
                    );
                    for review in reviews {
                        if seen.insert(review.review_id.clone()) {
                            fetched.reviews.push(review);
                        } else {
                            fetched.duplicates += 1;
                        }
                    }
                }
                Err(e) => {
                    warn!(lang = %lang, country = %country, error = %e, "Failed to fetch reviews");
                    fetched.failed_pairs.push((lang.clone(), country.clone()));
                }
            }
        }
    }

    info!(
        total = fetched.reviews.len(),
        duplicates = fetched.duplicates,
        "Finished fetching reviews"
    );
    fetched
}

mod file;
mod http;
pub use file::JsonFileReviewSource;
pub use http::{HttpReviewSource, ReviewPage};

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use std::collections::HashMap;

    /// In-memory source keyed by "lang-country"; missing keys fail.
    struct StaticSource {
        pages: HashMap<String, Vec<Review>>,
    }

    impl ReviewSource for StaticSource {
        async fn fetch(
            &self,
            _package: &str,
            lang: &str,
            country: &str,
            count: usize,
        ) -> Result<Vec<Review>, ReviewSourceError> {
            self.pages
                .get(&format!("{lang}-{country}"))
                .map(|reviews| reviews.iter().take(count).cloned().collect())
                .ok_or_else(|| ReviewSourceError::InvalidUrl(format!("no pair {lang}-{country}")))
        }
    }

    fn review(id: &str) -> Review {
        Review {
            review_id: id.to_string(),
            rating: 4,
            at: Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap(),
            author: "A".to_string(),
            text: "ok".to_string(),
        }
    }

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[tokio::test]
    async fn test_fetch_all_deduplicates() {
        let source = StaticSource {
            pages: HashMap::from([
                ("en-us".to_string(), vec![review("a"), review("b")]),
                ("en-gb".to_string(), vec![review("b"), review("c")]),
            ]),
        };

        let fetched = fetch_all(
            &source,
            "com.example",
            &strings(&["en"]),
            &strings(&["us", "gb"]),
            100,
        )
        .await;

        let ids: Vec<&str> = fetched.reviews.iter().map(|r| r.review_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(fetched.duplicates, 1);
        assert!(fetched.failed_pairs.is_empty());
    }

    #[test]
    fn test_decode_reviews_skips_malformed_records() {
        let records = vec![
            serde_json::json!({"reviewId": "ok", "score": 5, "at": "2024-05-01T10:00:00Z"}),
            serde_json::json!({"reviewId": "no-date", "score": 5}),
            serde_json::json!({"reviewId": "naive", "score": 300, "at": "2024-05-01 11:00:00"}),
            serde_json::json!("not an object"),
        ];

        let reviews = decode_reviews(records, "test");

        let ids: Vec<&str> = reviews.iter().map(|r| r.review_id.as_str()).collect();
        assert_eq!(ids, vec!["ok", "naive"]);
        assert_eq!(reviews[1].rating, 300);
    }

    #[tokio::test]
    async fn test_fetch_all_tolerates_failing_pair() {
        let source = StaticSource {
            pages: HashMap::from([("de-de".to_string(), vec![review("x")])]),
        };

        let fetched = fetch_all(
            &source,
            "com.example",
            &strings(&["en", "de"]),
            &strings(&["de"]),
            100,
        )
        .await;

        assert_eq!(fetched.reviews.len(), 1);
        assert_eq!(fetched.failed_pairs, vec![("en".to_string(), "de".to_string())]);
    }
}
