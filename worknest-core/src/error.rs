//! Error types for the worknest client.

use thiserror::Error;

/// Errors that can occur in worknest operations.
#[derive(Error, Debug)]
pub enum WorknestError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Session storage error: {0}")]
    Storage(String),

    #[error("Server responded with {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Server rejected the request: {0}")]
    Rejected(String),

    #[error("Could not decode response: {0}")]
    Decode(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("{0}")]
    Validation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl WorknestError {
    /// True for 5xx responses, the only class of failure worth retrying.
    pub fn is_server_error(&self) -> bool {
        matches!(self, WorknestError::Http { status, .. } if (500..600).contains(status))
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            WorknestError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for WorknestError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            WorknestError::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            WorknestError::Http {
                status: status.as_u16(),
                message: err.to_string(),
            }
        } else {
            WorknestError::Network(err.to_string())
        }
    }
}

/// Result type alias for worknest operations.
pub type WorknestResult<T> = Result<T, WorknestError>;
