//! Error types

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type
#[derive(Debug, Error)]
pub enum Error {
    /// The request never completed (connect failure, timeout, ...)
    #[error("Network error: {0}")]
    Network(String),

    /// The backend answered with a non-success status
    #[error("Backend error (status {status}): {}", .detail.as_deref().unwrap_or("no detail"))]
    Backend { status: u16, detail: Option<String> },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Machine-readable detail message parsed from the backend's error body
    pub fn detail(&self) -> Option<&str> {
        match self {
            Error::Backend { detail, .. } => detail.as_deref(),
            _ => None,
        }
    }

    /// Whether the backend answered 404 for the requested resource
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Backend { status: 404, .. })
    }
}
