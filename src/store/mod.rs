//! Result store module
//!
//! This module defines the interface the pipeline consumes to read eligible
//! records and write verdicts back, plus a libsql implementation of it.

mod database;
pub mod error;
mod schema;

pub use database::Database;
pub use error::StoreError;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::checker::ProbeResult;
use crate::classifier::ScanResult;

/// Review lifecycle of a submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewStatus {
    /// Awaiting review
    Pending,
    /// Listed in the directory
    Approved,
    /// Refused
    Rejected,
}

impl ReviewStatus {
    /// Column value for this status
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewStatus::Pending => "pending",
            ReviewStatus::Approved => "approved",
            ReviewStatus::Rejected => "rejected",
        }
    }
}

impl std::str::FromStr for ReviewStatus {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ReviewStatus::Pending),
            "approved" => Ok(ReviewStatus::Approved),
            "rejected" => Ok(ReviewStatus::Rejected),
            other => Err(StoreError::Data(format!("Unknown review status: {}", other))),
        }
    }
}

/// A submitted website as stored
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubmissionRecord {
    /// ID of the record
    pub id: i64,

    /// Absolute, normalized URL (globally unique)
    pub url: String,

    /// Submitted title
    pub title: String,

    /// Submitted description
    pub description: String,

    /// Submitted category
    pub category_id: Option<i64>,

    /// Review lifecycle status
    pub status: ReviewStatus,

    /// Last probed HTTP status, 0 if unreachable
    pub http_status: Option<u16>,

    /// When the record was last probed
    pub last_checked_at: Option<DateTime<Utc>>,

    /// Last content analysis
    pub scan_result: Option<ScanResult>,

    /// When the last content analysis was stored
    pub scan_at: Option<DateTime<Utc>>,
}

/// Fields needed to add a submission
#[derive(Debug, Clone)]
pub struct NewSubmission {
    /// Normalized URL
    pub url: String,

    /// Submitted title
    pub title: String,

    /// Submitted description
    pub description: String,

    /// Submitted category
    pub category_id: Option<i64>,
}

/// A record selected for a status check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusCandidate {
    /// ID of the record
    pub id: i64,

    /// URL to probe
    pub url: String,
}

/// A record selected for a content scan, with its declared metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanCandidate {
    /// ID of the record
    pub id: i64,

    /// URL to fetch
    pub url: String,

    /// Submitted title
    pub title: String,

    /// Submitted description
    pub description: String,

    /// Submitted category
    pub category_id: Option<i64>,
}

/// A stored scan and when it was written
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredScan {
    /// The stored result
    pub analysis: ScanResult,

    /// When it was stored
    pub scan_at: Option<DateTime<Utc>>,
}

/// Aggregates over every record carrying a scan result
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanSummary {
    /// Records with any scan result, fallbacks and failures included
    pub total_scanned: u64,

    /// Mean content quality over parsed verdicts
    pub avg_content_quality: Option<f64>,

    /// Verdicts flagged malicious
    pub malicious_count: u64,

    /// Verdicts flagged adult content
    pub adult_content_count: u64,
}

/// The persistence service the pipeline reads from and writes to
///
/// Implementations provide per-row atomic updates; no multi-row
/// transactions are required.
#[async_trait]
pub trait ResultStore: Send + Sync {
    /// Insert a pending submission and return its ID
    ///
    /// Fails with `StoreError::Duplicate` if the URL is already stored.
    async fn add_submission(&self, submission: &NewSubmission) -> Result<i64, StoreError>;

    /// Records never checked, or last checked more than 24 hours ago
    async fn select_eligible_for_status_check(
        &self,
        limit: usize,
    ) -> Result<Vec<StatusCandidate>, StoreError>;

    /// Pending records with no scan result and a prior HTTP 200
    async fn select_eligible_for_scan(&self, limit: usize)
    -> Result<Vec<ScanCandidate>, StoreError>;

    /// Scan metadata for one record regardless of eligibility
    async fn get_scan_candidate(&self, id: i64) -> Result<Option<ScanCandidate>, StoreError>;

    /// Overwrite a record's probe fields
    async fn write_status(&self, id: i64, probe: &ProbeResult) -> Result<(), StoreError>;

    /// Overwrite a record's scan result and stamp the scan time
    ///
    /// Applies only while the record still exists with `http_status = 200`;
    /// returns whether the write happened.
    async fn write_scan(&self, id: i64, scan: &ScanResult) -> Result<bool, StoreError>;

    /// The stored scan for a record, if any
    async fn read_scan(&self, id: i64) -> Result<Option<StoredScan>, StoreError>;

    /// Aggregates over all scanned records
    async fn read_summary(&self) -> Result<ScanSummary, StoreError>;
}

#[async_trait]
impl<T: ResultStore + ?Sized> ResultStore for std::sync::Arc<T> {
    async fn add_submission(&self, submission: &NewSubmission) -> Result<i64, StoreError> {
        (**self).add_submission(submission).await
    }

    async fn select_eligible_for_status_check(
        &self,
        limit: usize,
    ) -> Result<Vec<StatusCandidate>, StoreError> {
        (**self).select_eligible_for_status_check(limit).await
    }

    async fn select_eligible_for_scan(
        &self,
        limit: usize,
    ) -> Result<Vec<ScanCandidate>, StoreError> {
        (**self).select_eligible_for_scan(limit).await
    }

    async fn get_scan_candidate(&self, id: i64) -> Result<Option<ScanCandidate>, StoreError> {
        (**self).get_scan_candidate(id).await
    }

    async fn write_status(&self, id: i64, probe: &ProbeResult) -> Result<(), StoreError> {
        (**self).write_status(id, probe).await
    }

    async fn write_scan(&self, id: i64, scan: &ScanResult) -> Result<bool, StoreError> {
        (**self).write_scan(id, scan).await
    }

    async fn read_scan(&self, id: i64) -> Result<Option<StoredScan>, StoreError> {
        (**self).read_scan(id).await
    }

    async fn read_summary(&self) -> Result<ScanSummary, StoreError> {
        (**self).read_summary().await
    }
}
