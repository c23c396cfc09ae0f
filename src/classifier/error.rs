//! Error types for the classifier module

use crate::error::Error as CrateError;
use thiserror::Error;

/// Failure talking to the content classification service
///
/// An answer that arrives but cannot be parsed as a verdict is not an error;
/// it is recorded as [`ScanResult::Unparsed`](crate::classifier::ScanResult).
#[derive(Debug, Error)]
pub enum ClassifyError {
    /// Network failure or timeout reaching the service
    #[error("Transport error: {0}")]
    Transport(String),

    /// Service answered with a non-success status
    #[error("API error: {status_code} - {message}")]
    Status {
        /// HTTP status code
        status_code: u16,
        /// Response body or reason
        message: String,
    },

    /// Response body did not contain an answer
    #[error("Invalid AI response format: {0}")]
    MalformedResponse(String),

    /// Client could not be configured
    #[error("Classifier configuration error: {0}")]
    Config(String),
}

impl From<ClassifyError> for CrateError {
    fn from(err: ClassifyError) -> Self {
        CrateError::Classify(err.to_string())
    }
}
