//! Error types for gdpull
//!
//! The taxonomy mirrors the phases of a run:
//! - setup errors (configuration, authentication, pattern compilation) are
//!   fatal before any remote work starts
//! - listing errors abort the run before any download is attempted
//! - per-file download errors are *not* represented here — they are reported
//!   through [`crate::types::DownloadOutcome`] so one failed transfer never
//!   aborts its siblings

use thiserror::Error;

/// Result type alias for gdpull operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for gdpull
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key or environment variable that caused the error
        key: Option<String>,
    },

    /// OAuth authorization, token exchange, or token refresh failed
    #[error("authentication error: {0}")]
    Auth(String),

    /// The filter pattern failed to compile
    #[error("invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// The remote API answered with a non-success status
    #[error("remote API error: {endpoint} returned HTTP {status}")]
    RemoteApi {
        /// The endpoint path that was called
        endpoint: String,
        /// The HTTP status code the server returned
        status: u16,
    },

    /// A listing page contained no candidates
    ///
    /// Raised for *any* empty page, including the first one. The whole
    /// listing aborts and no downloads are attempted.
    #[error("no files found")]
    NoFilesFound,

    /// Network error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Build a configuration error tied to a specific key
    pub fn config(message: impl Into<String>, key: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.into()),
        }
    }
}
