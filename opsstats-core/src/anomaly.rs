//! Review anomaly detection.
//!
//! Reviews are bucketed by calendar day and the most recent day's per-rating
//! counts are compared against the daily history using Z-scores with a
//! threshold that depends on how noisy the history is.

use std::collections::BTreeMap;
use std::ops::RangeInclusive;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{de, Deserialize, Deserializer, Serialize};
use tracing::{debug, warn};

use crate::stats::{mean, sample_std_dev, z_score};

/// Valid star ratings.
pub const RATINGS: RangeInclusive<u8> = 1..=5;

pub const NO_REVIEWS_REASON: &str = "No reviews available for the most recent date.";
pub const NO_DEVIATION_REASON: &str =
    "No significant deviations (Z-scores within dynamic thresholds).";

/// Timestamp layout used by Play Store scrapers, without a timezone.
pub const NAIVE_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A single store review.
///
/// Field aliases accept the naming used by common Play Store scrapers.
/// The rating is kept wide so out-of-range scores survive decoding and are
/// dropped, with a warning, when bucketing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    #[serde(alias = "reviewId")]
    pub review_id: String,
    #[serde(alias = "score")]
    pub rating: i64,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub at: DateTime<Utc>,
    #[serde(default, alias = "userName")]
    pub author: String,
    #[serde(default, alias = "content")]
    pub text: String,
}

impl Review {
    pub fn date(&self) -> NaiveDate {
        self.at.date_naive()
    }

    /// The rating as a star count, `None` when outside 1-5.
    pub fn stars(&self) -> Option<u8> {
        u8::try_from(self.rating)
            .ok()
            .filter(|rating| RATINGS.contains(rating))
    }
}

/// Parse an RFC 3339 timestamp, or a naive one which is taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(raw) {
        return Some(timestamp.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, NAIVE_TIMESTAMP_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw).ok_or_else(|| de::Error::custom(format!("invalid timestamp: {raw}")))
}

/// Per-rating review counts for one calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyBucket {
    pub date: NaiveDate,
    counts: [u32; 5],
    pub total: u32,
}

impl DailyBucket {
    fn new(date: NaiveDate) -> Self {
        Self {
            date,
            counts: [0; 5],
            total: 0,
        }
    }

    fn record(&mut self, rating: u8) {
        self.counts[usize::from(rating - 1)] += 1;
        self.total += 1;
    }

    /// Number of reviews with the given rating; 0 for ratings outside 1-5.
    pub fn count(&self, rating: u8) -> u32 {
        if RATINGS.contains(&rating) {
            self.counts[usize::from(rating - 1)]
        } else {
            0
        }
    }
}

/// Bucket reviews by calendar day, oldest first.
///
/// Reviews with a rating outside 1-5 are skipped.
pub fn bucket_by_day(reviews: &[Review]) -> Vec<DailyBucket> {
    let mut buckets: BTreeMap<NaiveDate, DailyBucket> = BTreeMap::new();

    for review in reviews {
        let Some(stars) = review.stars() else {
            warn!(
                review_id = %review.review_id,
                rating = review.rating,
                "Skipping review with out-of-range rating"
            );
            continue;
        };
        let date = review.date();
        buckets
            .entry(date)
            .or_insert_with(|| DailyBucket::new(date))
            .record(stars);
    }

    buckets.into_values().collect()
}

/// Which days form the baseline the current day is measured against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BaselineMode {
    /// Every day, the current one included.
    #[default]
    IncludeCurrentDay,
    /// Every day before the current one.
    ExcludeCurrentDay,
}

/// Dynamic Z-score threshold selection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnomalyThresholds {
    /// Threshold used when the historical std is above `variability_cutoff`.
    pub high_variability: f64,
    /// Threshold used otherwise.
    pub low_variability: f64,
    pub variability_cutoff: f64,
}

impl Default for AnomalyThresholds {
    fn default() -> Self {
        Self {
            high_variability: 2.0,
            low_variability: 1.5,
            variability_cutoff: 1.0,
        }
    }
}

impl AnomalyThresholds {
    pub fn for_std_dev(&self, std_dev: f64) -> f64 {
        if std_dev > self.variability_cutoff {
            self.high_variability
        } else {
            self.low_variability
        }
    }
}

/// Statistics for one rating on the current day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatingStatistic {
    pub rating: u8,
    /// Mean daily count over the baseline.
    pub mean: f64,
    /// Sample standard deviation of the baseline daily counts.
    pub std_dev: f64,
    pub current_count: u32,
    pub z_score: f64,
    pub threshold: f64,
    pub anomalous: bool,
}

impl RatingStatistic {
    /// Score `current_count` against the baseline daily counts.
    pub fn evaluate(
        rating: u8,
        baseline_counts: &[f64],
        current_count: u32,
        thresholds: &AnomalyThresholds,
    ) -> Self {
        let mean = mean(baseline_counts);
        let std_dev = sample_std_dev(baseline_counts);
        let z_score = z_score(f64::from(current_count), mean, std_dev);
        let threshold = thresholds.for_std_dev(std_dev);

        Self {
            rating,
            mean,
            std_dev,
            current_count,
            z_score,
            threshold,
            anomalous: z_score.abs() > threshold,
        }
    }
}

/// Outcome of analysing a batch of reviews.
#[derive(Debug, Clone, Serialize)]
pub struct AnomalyReport {
    /// The most recent date with reviews.
    pub current_date: Option<NaiveDate>,
    /// Reviews on the current date.
    pub total_reviews: u32,
    pub distinct_days: usize,
    /// Calendar days from the first to the last review date, inclusive.
    pub days_covered: i64,
    /// One entry per rating 1-5.
    pub statistics: Vec<RatingStatistic>,
    /// Reviews on the current date whose rating was flagged.
    pub anomalous_reviews: Vec<Review>,
    pub no_anomaly_reasons: Vec<String>,
    pub skew_warning: Option<String>,
}

impl AnomalyReport {
    pub fn anomalies(&self) -> impl Iterator<Item = &RatingStatistic> {
        self.statistics.iter().filter(|s| s.anomalous)
    }

    pub fn has_anomalies(&self) -> bool {
        self.anomalies().next().is_some()
    }

    pub fn is_anomalous(&self, rating: u8) -> bool {
        self.anomalies().any(|s| s.rating == rating)
    }
}

/// Flags unusual rating counts on the most recent day of reviews.
#[derive(Debug, Clone)]
pub struct AnomalyDetector {
    pub thresholds: AnomalyThresholds,
    pub baseline: BaselineMode,
    /// Histories shorter than this many distinct days carry a skew warning.
    pub min_history_days: usize,
}

impl Default for AnomalyDetector {
    fn default() -> Self {
        Self {
            thresholds: AnomalyThresholds::default(),
            baseline: BaselineMode::default(),
            min_history_days: 4,
        }
    }
}

impl AnomalyDetector {
    pub fn new(
        thresholds: AnomalyThresholds,
        baseline: BaselineMode,
        min_history_days: usize,
    ) -> Self {
        Self {
            thresholds,
            baseline,
            min_history_days,
        }
    }

    pub fn analyze(&self, reviews: &[Review]) -> AnomalyReport {
        let buckets = bucket_by_day(reviews);
        let current = buckets.last();

        let days_covered = match (buckets.first(), buckets.last()) {
            (Some(first), Some(last)) => (last.date - first.date).num_days() + 1,
            _ => 0,
        };

        let skew_warning = (buckets.len() < self.min_history_days).then(|| {
            format!(
                "Reviews cover only {} distinct day(s); daily statistics may be skewed.",
                buckets.len()
            )
        });

        let baseline: &[DailyBucket] = match self.baseline {
            BaselineMode::IncludeCurrentDay => &buckets,
            BaselineMode::ExcludeCurrentDay => match buckets.split_last() {
                Some((_, history)) => history,
                None => &[],
            },
        };

        let total_reviews = current.map_or(0, |bucket| bucket.total);

        let statistics: Vec<RatingStatistic> = RATINGS
            .map(|rating| {
                let counts: Vec<f64> = baseline
                    .iter()
                    .map(|bucket| f64::from(bucket.count(rating)))
                    .collect();
                let current_count = current.map_or(0, |bucket| bucket.count(rating));
                let mut stat =
                    RatingStatistic::evaluate(rating, &counts, current_count, &self.thresholds);
                // Nothing to flag on a day without reviews.
                stat.anomalous &= total_reviews > 0;
                debug!(
                    rating,
                    mean = stat.mean,
                    std_dev = stat.std_dev,
                    count = stat.current_count,
                    z = stat.z_score,
                    "Scored rating"
                );
                stat
            })
            .collect();

        let current_date = current.map(|bucket| bucket.date);
        let anomalous_reviews: Vec<Review> = reviews
            .iter()
            .filter(|review| Some(review.date()) == current_date)
            .filter(|review| {
                statistics
                    .iter()
                    .any(|s| s.anomalous && Some(s.rating) == review.stars())
            })
            .cloned()
            .collect();

        let mut no_anomaly_reasons = Vec::new();
        if total_reviews == 0 {
            no_anomaly_reasons.push(NO_REVIEWS_REASON.to_string());
        } else if !statistics.iter().any(|s| s.anomalous) {
            no_anomaly_reasons.push(NO_DEVIATION_REASON.to_string());
        }

        AnomalyReport {
            current_date,
            total_reviews,
            distinct_days: buckets.len(),
            days_covered,
            statistics,
            anomalous_reviews,
            no_anomaly_reasons,
            skew_warning,
        }
    }
}
