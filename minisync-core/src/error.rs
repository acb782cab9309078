//! Error types for minisync-core.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise from configuration store operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Underlying I/O failure (permission denied, read-only filesystem, etc.).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error (write path).
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// Malformed document, missing field, or wrong-typed field on load.
    #[error("failed to parse configuration at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The configuration file did not exist at the expected path.
    #[error("configuration not found at {path}")]
    ConfigNotFound { path: PathBuf },

    /// A required field is present but empty.
    #[error("configuration field '{field}' is empty")]
    MissingField { field: &'static str },
}

/// Errors from decoding a transported [`LogicalClock`](crate::LogicalClock).
#[derive(Debug, Error)]
pub enum ClockError {
    /// The encoded form is not valid base64url.
    #[error("clock is not valid base64url: {0}")]
    Encoding(#[from] base64::DecodeError),

    /// The decoded bytes are not a clock document.
    #[error("clock document is malformed: {0}")]
    Json(#[from] serde_json::Error),
}
