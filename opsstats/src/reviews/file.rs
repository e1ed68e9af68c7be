use std::path::Path;

use opsstats_core::Review;

use super::{decode_reviews, ReviewSource, ReviewSourceError};

/// Review source backed by a JSON array on disk, for offline runs.
///
/// Every (language, country) pair sees the same reviews; `fetch_all`
/// deduplicates them. Malformed records are skipped when loading.
pub struct JsonFileReviewSource {
    reviews: Vec<Review>,
}

impl JsonFileReviewSource {
    /// Read and parse the file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a JSON array.
    pub fn load(path: &Path) -> Result<Self, ReviewSourceError> {
        let content = std::fs::read_to_string(path).map_err(|source| ReviewSourceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let records: Vec<serde_json::Value> =
            serde_json::from_str(&content).map_err(|source| ReviewSourceError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        let reviews = decode_reviews(records, &path.display().to_string());
        Ok(Self { reviews })
    }

    pub fn len(&self) -> usize {
        self.reviews.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reviews.is_empty()
    }
}

impl ReviewSource for JsonFileReviewSource {
    async fn fetch(
        &self,
        _package: &str,
        _lang: &str,
        _country: &str,
        count: usize,
    ) -> Result<Vec<Review>, ReviewSourceError> {
        Ok(self.reviews.iter().take(count).cloned().collect())
    }
}
