//! # Store Error Types Module
//!
//! Structured errors for the result store. Any of these reaching the batch
//! runner aborts the batch: a store outage is the one failure that is not
//! item-scoped.

use crate::error::Error as CrateError;
use thiserror::Error;

/// Error type for store operations
#[derive(Debug, Error)]
pub enum StoreError {
    /// LibSQL error
    #[error("LibSQL error: {0}")]
    LibSql(#[from] libsql::Error),

    /// SQL query error
    #[error("SQL query error: {0}")]
    Query(String),

    /// Schema error
    #[error("Schema error: {0}")]
    Schema(String),

    /// Stored data could not be decoded
    #[error("Data error: {0}")]
    Data(String),

    /// Connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// A record with this URL already exists
    #[error("Duplicate URL: {0}")]
    Duplicate(String),
}

impl From<StoreError> for CrateError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate(url) => CrateError::DuplicateUrl(url),
            _ => CrateError::Store(err.to_string()),
        }
    }
}
