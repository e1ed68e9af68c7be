//! Parsing of gradle-profiler benchmark CSV output.
//!
//! gradle-profiler's long CSV format has one row per (scenario, phase,
//! iteration, sample) with the duration in milliseconds. Only MEASURE rows
//! for the total execution time and task start samples are kept.

use std::io;
use std::path::{Path, PathBuf};

use opsstats_core::{aggregate, BenchmarkResult, BenchmarkSample, SampleKind, MEASURE_PHASE};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

/// Errors that can occur while reading a benchmark CSV.
#[derive(Debug, Error)]
pub enum CsvInputError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

#[derive(Debug, Deserialize)]
struct ProfilerRow {
    #[serde(rename = "Scenario")]
    scenario: Option<String>,
    #[serde(rename = "Phase")]
    phase: Option<String>,
    #[serde(rename = "Sample")]
    sample: Option<String>,
    #[serde(rename = "Duration")]
    duration: Option<String>,
}

impl ProfilerRow {
    /// Convert a row into a sample, or `None` if the row does not count.
    fn into_sample(self, line: u64) -> Option<BenchmarkSample> {
        let kind = self.sample.as_deref().and_then(SampleKind::parse)?;
        if self.phase.as_deref() != Some(MEASURE_PHASE) {
            return None;
        }
        let duration = self.duration.filter(|d| !d.trim().is_empty())?;
        let scenario = self.scenario.unwrap_or_default();

        match duration.trim().parse::<f64>() {
            Ok(millis) if millis.is_finite() => {
                Some(BenchmarkSample::from_millis(scenario, kind, millis))
            }
            _ => {
                warn!(
                    line,
                    scenario = %scenario,
                    duration = %duration,
                    "Could not parse duration, skipping row"
                );
                None
            }
        }
    }
}

/// Parse MEASURE samples from CSV data.
///
/// Malformed rows are logged and skipped; only I/O failures abort.
pub fn parse_samples<R: io::Read>(reader: R) -> Result<Vec<BenchmarkSample>, csv::Error> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::Headers).from_reader(reader);
    let mut samples = Vec::new();

    for (index, result) in rdr.deserialize::<ProfilerRow>().enumerate() {
        // Header is line 1.
        let line = index as u64 + 2;
        match result {
            Ok(row) => {
                if let Some(sample) = row.into_sample(line) {
                    samples.push(sample);
                }
            }
            Err(e) if e.is_io_error() => return Err(e),
            Err(e) => warn!(line, error = %e, "Skipping malformed CSV row"),
        }
    }

    debug!(count = samples.len(), "Parsed benchmark samples");
    Ok(samples)
}

/// Read MEASURE samples from a CSV file.
///
/// A missing file is not an error: a warning is logged and no samples are returned.
pub fn read_samples(path: &Path) -> Result<Vec<BenchmarkSample>, CsvInputError> {
    if !path.exists() {
        warn!(path = %path.display(), "CSV file not found");
        return Ok(Vec::new());
    }

    let file = std::fs::File::open(path).map_err(|e| CsvInputError::Read {
        path: path.to_path_buf(),
        source: e.into(),
    })?;

    parse_samples(file).map_err(|source| CsvInputError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Read a CSV file and aggregate it into per-(scenario, sample) results.
pub fn load_results(path: &Path) -> Result<Vec<BenchmarkResult>, CsvInputError> {
    Ok(aggregate(read_samples(path)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const PROFILER_CSV: &str = "\
Scenario,Version,Tasks,Phase,Iteration,Sample,Duration
assemble,Gradle 8.5,assembleDebug,WARM_UP,1,total execution time,99000
assemble,Gradle 8.5,assembleDebug,MEASURE,1,total execution time,60000
assemble,Gradle 8.5,assembleDebug,MEASURE,1,task start,4000
assemble,Gradle 8.5,assembleDebug,MEASURE,1,garbage collection time,700
assemble,Gradle 8.5,assembleDebug,MEASURE,2,total execution time,62000
assemble,Gradle 8.5,assembleDebug,MEASURE,2,task start,6000
assemble,Gradle 8.5,assembleDebug,MEASURE,3,total execution time,n/a
assemble,Gradle 8.5,assembleDebug,MEASURE,4,total execution time,
";

    #[test]
    fn test_parse_filters_phase_and_sample() {
        let samples = parse_samples(PROFILER_CSV.as_bytes()).unwrap();

        assert_eq!(samples.len(), 4);
        assert!(samples.iter().all(|s| s.scenario == "assemble"));
        let totals: Vec<f64> = samples
            .iter()
            .filter(|s| s.kind == SampleKind::TotalExecutionTime)
            .map(|s| s.seconds)
            .collect();
        assert_eq!(totals, vec![60.0, 62.0]);
    }

    #[test]
    fn test_warm_up_excluded_from_statistics() {
        let results = aggregate(parse_samples(PROFILER_CSV.as_bytes()).unwrap());

        let total = results
            .iter()
            .find(|r| r.kind == SampleKind::TotalExecutionTime)
            .unwrap();
        assert_eq!(total.summary.max, 62.0);
        assert_eq!(total.summary.count, 2);
    }

    #[test]
    fn test_malformed_row_skipped() {
        let csv = "\
Scenario,Phase,Sample,Duration
clean,MEASURE,total execution time,1000
clean,MEASURE
clean,MEASURE,total execution time,3000
";
        let samples = parse_samples(csv.as_bytes()).unwrap();

        assert_eq!(samples.len(), 2);
        assert_eq!(samples[1].seconds, 3.0);
    }

    #[test]
    fn test_missing_file_is_empty() {
        let samples = read_samples(Path::new("/nonexistent/benchmark.csv")).unwrap();
        assert!(samples.is_empty());
    }

    #[test]
    fn test_load_results_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(PROFILER_CSV.as_bytes()).unwrap();

        let results = load_results(file.path()).unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].kind, SampleKind::TotalExecutionTime);
        assert_eq!(results[0].summary.mean, 61.0);
        assert_eq!(results[1].kind, SampleKind::TaskStart);
        assert_eq!(results[1].summary.median, 5.0);
    }
}
