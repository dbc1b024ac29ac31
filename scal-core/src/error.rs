//! Error types for scal.

use thiserror::Error;

/// Body returned to calendar clients when the upstream is unreachable.
pub const NO_WIFI_MSG: &str = "no wifi";

/// Errors that can occur in scal operations.
#[derive(Error, Debug)]
pub enum ScalError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Set {0} to use the Schoology API")]
    MissingCredentials(&'static str),

    /// Connection or timeout failure. Carries the low-level trigger for logs.
    #[error("no wifi")]
    Offline(String),

    #[error("Schoology API error {status} on {path}")]
    Upstream { status: u16, path: String },

    #[error("Failed to fetch ICS: {0}")]
    FeedUnavailable(String),

    #[error("Request error: {0}")]
    Request(String),

    #[error("ICS parse error: {0}")]
    IcsParse(String),

    #[error("ICS generation error: {0}")]
    IcsGenerate(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl From<serde_json::Error> for ScalError {
    fn from(err: serde_json::Error) -> Self {
        ScalError::Serialization(err.to_string())
    }
}

impl ScalError {
    pub fn is_offline(&self) -> bool {
        matches!(self, ScalError::Offline(_))
    }
}

/// Result type alias for scal operations.
pub type ScalResult<T> = Result<T, ScalError>;
