use std::collections::BTreeMap;
use std::path::PathBuf;

use super::outcome::ErrorKind;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to read scenario file `{}`: {source}", .path.display())]
    ScenarioFileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse scenario file `{}`: {message}", .path.display())]
    ScenarioFileParse { path: PathBuf, message: String },

    #[error("unsupported scenario file extension `{extension}` (expected .json, .yaml or .yml): {}", .path.display())]
    UnsupportedScenarioFile { path: PathBuf, extension: String },

    #[error("scenario `{scenario}` phase {phase}: `requests_per_second` must be a finite non-negative number (got {rate})")]
    InvalidRate {
        scenario: String,
        phase: usize,
        rate: f64,
    },

    #[error("`min_success_rate` must be within 0..=100 (got {0})")]
    InvalidSuccessThreshold(f64),

    #[error("failed to encode result record: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Raised after aggregation when a scenario's success rate is below the accepted minimum.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error(
    "scenario `{scenario}` success rate {success_rate:.2}% is below the minimum {min_success_rate:.2}% \
     ({successful_requests}/{total_requests} succeeded; status codes: {status_counts:?}; errors: {error_counts:?})"
)]
pub struct ThresholdViolation {
    pub scenario: String,
    pub success_rate: f64,
    pub min_success_rate: f64,
    pub successful_requests: u64,
    pub total_requests: u64,
    pub status_counts: BTreeMap<u16, u64>,
    pub error_counts: BTreeMap<ErrorKind, u64>,
}
