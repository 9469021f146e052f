use std::fmt;
use std::time::Duration;

/// Failure of a single variable's acquisition
#[derive(thiserror::Error, Debug)]
pub enum AcquireError {
    #[error("authentication failed: {0}")]
    Authentication(String),
    #[error("malformed response: {0}")]
    MalformedResponse(String),
    #[error("response header has no 'param_name' entry")]
    MissingParameterName,
    #[error("invalid timestamp '{value}' on line {line}")]
    InvalidTimestamp { line: usize, value: String },
    #[error("invalid value '{value}' on line {line}")]
    InvalidValue { line: usize, value: String },
    #[error("extraction failed: {0}")]
    Extraction(String),
    #[error("unsupported: {0}")]
    Unsupported(String),
    #[error("request failed: {0}")]
    Transport(String),
    #[error("unexpected status {status} from {url}")]
    Status { status: u16, url: String },
    #[error("failed to decode response: {0}")]
    Decode(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for AcquireError {
    fn from(e: reqwest::Error) -> Self {
        AcquireError::Transport(e.to_string())
    }
}

impl From<reqwest_middleware::Error> for AcquireError {
    fn from(e: reqwest_middleware::Error) -> Self {
        AcquireError::Transport(e.to_string())
    }
}

/// Why a variable is absent from a [`crate::WeatherDataset`]
#[derive(thiserror::Error, Debug)]
pub enum FailureReason {
    #[error("no data found for the query")]
    NoDataFound,
    #[error(transparent)]
    Acquire(#[from] AcquireError),
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    #[error("worker stopped without reporting: {0}")]
    WorkerPanicked(String),
}

#[derive(Debug)]
pub struct VariableFailure {
    pub variable: String,
    pub reason: FailureReason,
}

impl fmt::Display for VariableFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.variable, self.reason)
    }
}

/// Batch-level failure of a fetch
#[derive(thiserror::Error, Debug)]
pub enum FetchError {
    #[error("authentication failed while fetching '{variable}': {reason}")]
    Authentication { variable: String, reason: String },
    #[error("no weather variable could be fetched ({} failed)", failures.len())]
    NoDataAvailable { failures: Vec<VariableFailure> },
}
