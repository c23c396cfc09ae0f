//! Error types for the sitecheck crate

use thiserror::Error;

/// Result type for sitecheck operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for sitecheck operations
#[derive(Debug, Error)]
pub enum Error {
    /// HTTP client error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Invalid or missing configuration value
    #[error("Configuration error: {0}")]
    Config(String),

    /// Submission is missing a required field
    #[error("Invalid submission: {0}")]
    Validation(String),

    /// Submitted URL was rejected before any network call
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Submitted URL already exists in the directory
    #[error("Duplicate URL: {0}")]
    DuplicateUrl(String),

    /// Content fetch error
    #[error("Fetch error: {0}")]
    Fetch(String),

    /// Content classification error
    #[error("Classification error: {0}")]
    Classify(String),

    /// AI scanning is switched off or has no API key
    #[error("AI scanning is not enabled or API key is missing")]
    ScanDisabled,

    /// Result store error
    #[error("Store error: {0}")]
    Store(String),

    /// Terminal output error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Record not found
    #[error("Not found: {0}")]
    NotFound(String),
}
