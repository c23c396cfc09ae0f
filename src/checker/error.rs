//! Error types for the checker module

use crate::error::Error as CrateError;
use thiserror::Error;

/// Error type for content fetch operations
#[derive(Debug, Error)]
pub enum FetchError {
    /// The HTTP client could not be constructed
    #[error("HTTP client error: {0}")]
    Client(String),

    /// Request timed out
    #[error("Timeout fetching {0}")]
    Timeout(String),

    /// Network-level failure (DNS, connect, TLS, redirect limit)
    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),

    /// Final status code was outside [200, 400)
    #[error("HTTP {status} for {url}")]
    Status {
        /// Final HTTP status code
        status: u16,
        /// URL that was fetched
        url: String,
    },

    /// Response body could not be read
    #[error("Body read error: {0}")]
    Body(String),
}

impl From<FetchError> for CrateError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::Request(e) => CrateError::Http(e),
            _ => CrateError::Fetch(err.to_string()),
        }
    }
}

/// Error type for URL screening
#[derive(Debug, Error, PartialEq, Eq)]
pub enum UrlError {
    /// URL could not be parsed
    #[error("URL parsing error: {0}")]
    Parse(#[from] url::ParseError),

    /// URL has no host component
    #[error("URL has no host: {0}")]
    MissingHost(String),

    /// URL matched one of the suspicious patterns
    #[error("URL appears suspicious ({reason}): {url}")]
    Suspicious {
        /// Rejected URL
        url: String,
        /// Which check flagged it
        reason: &'static str,
    },
}

impl From<UrlError> for CrateError {
    fn from(err: UrlError) -> Self {
        CrateError::InvalidUrl(err.to_string())
    }
}
