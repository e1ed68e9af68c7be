use std::time::Duration;

use opsstats_core::Review;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{decode_reviews, ReviewSource, ReviewSourceError};

/// One page of the review API response.
///
/// Records stay raw JSON so one malformed review does not spoil the page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReviewPage {
    pub reviews: Vec<serde_json::Value>,
    /// Continuation token for the next page, absent on the last page.
    #[serde(default)]
    pub next_token: Option<String>,
}

/// Review source backed by a paging HTTP API.
///
/// Requests `GET {base_url}/reviews` with `package`, `lang`, `country`,
/// `sort=newest`, `count` and, after the first page, `token`.
pub struct HttpReviewSource {
    base_url: String,
    client: reqwest::Client,
}

impl HttpReviewSource {
    /// Connect to the review API at the given URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or the client cannot be created.
    pub fn new(url: &str, timeout: Duration) -> Result<Self, ReviewSourceError> {
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(ReviewSourceError::InvalidUrl(format!(
                "URL must start with http:// or https://: {}",
                url
            )));
        }

        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            base_url: url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn fetch_page(
        &self,
        package: &str,
        lang: &str,
        country: &str,
        count: usize,
        token: Option<&str>,
    ) -> Result<ReviewPage, ReviewSourceError> {
        let url = format!("{}/reviews", self.base_url);
        let mut request = self
            .client
            .get(&url)
            .query(&[
                ("package", package),
                ("lang", lang),
                ("country", country),
                ("sort", "newest"),
            ])
            .query(&[("count", count)]);
        if let Some(token) = token {
            request = request.query(&[("token", token)]);
        }

        let page = request.send().await?.error_for_status()?.json().await?;
        Ok(page)
    }
}

impl ReviewSource for HttpReviewSource {
    async fn fetch(
        &self,
        package: &str,
        lang: &str,
        country: &str,
        count: usize,
    ) -> Result<Vec<Review>, ReviewSourceError> {
        let mut reviews: Vec<Review> = Vec::new();
        let mut token: Option<String> = None;

        while reviews.len() < count {
            let remaining = count - reviews.len();
            let page = match self
                .fetch_page(package, lang, country, remaining, token.as_deref())
                .await
            {
                Ok(page) => page,
                Err(e) if reviews.is_empty() => return Err(e),
                Err(e) => {
                    warn!(
                        lang,
                        country,
                        kept = reviews.len(),
                        error = %e,
                        "Failed to fetch next review page, keeping earlier pages"
                    );
                    break;
                }
            };
            debug!(lang, country, received = page.reviews.len(), "Fetched review page");

            let empty = page.reviews.is_empty();
            reviews.extend(decode_reviews(page.reviews, &format!("{lang}-{country}")));

            match page.next_token {
                Some(next) if !empty => token = Some(next),
                _ => break,
            }
        }

        reviews.truncate(count);
        Ok(reviews)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_validation() {
        assert!(HttpReviewSource::new("http://localhost:8080", Duration::from_secs(1)).is_ok());
        assert!(HttpReviewSource::new("https://reviews.example", Duration::from_secs(1)).is_ok());

        let result = HttpReviewSource::new("localhost:8080", Duration::from_secs(1));
        assert!(matches!(result, Err(ReviewSourceError::InvalidUrl(_))));
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let source =
            HttpReviewSource::new("http://localhost:8080/", Duration::from_secs(1)).unwrap();
        assert_eq!(source.base_url(), "http://localhost:8080");
    }

    #[test]
    fn test_page_without_token() {
        let page: ReviewPage = serde_json::from_str(r#"{"reviews": []}"#).unwrap();
        assert!(page.reviews.is_empty());
        assert!(page.next_token.is_none());
    }
}
