//! Database operations for the store module

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use libsql::{Connection, Row, Value, params};
use tracing::{debug, instrument};

use crate::checker::ProbeResult;
use crate::classifier::ScanResult;
use crate::store::error::StoreError;
use crate::store::schema;
use crate::store::{
    NewSubmission, ResultStore, ReviewStatus, ScanCandidate, ScanSummary, StatusCandidate,
    StoredScan, SubmissionRecord,
};

/// Records checked longer ago than this are due for another probe
pub const RECHECK_AFTER_SECS: i64 = 24 * 60 * 60;

// Extended result code for a UNIQUE constraint violation
const SQLITE_CONSTRAINT_UNIQUE: std::ffi::c_int = 2067;

const RECORD_COLUMNS: &str = "id, url, title, description, category_id, status, http_status, \
     last_checked, scan_result, scan_at";

/// libsql-backed result store
#[derive(Clone)]
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Create a new database manager
    #[instrument(skip(conn))]
    pub async fn new(conn: Connection) -> Result<Self, StoreError> {
        schema::initialize_schema(&conn).await?;

        Ok(Self { conn })
    }

    /// Create a new database manager from a path
    pub async fn new_from_path(path: &str) -> Result<Self, StoreError> {
        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| StoreError::Connection(format!("Failed to open database: {}", e)))?;

        let conn = db
            .connect()
            .map_err(|e| StoreError::Connection(format!("Failed to connect to database: {}", e)))?;

        Self::new(conn).await
    }

    /// Get a full record by ID
    pub async fn get_submission(&self, id: i64) -> Result<Option<SubmissionRecord>, StoreError> {
        let mut rows = self
            .conn
            .query(
                &format!("SELECT {} FROM websites WHERE id = ?", RECORD_COLUMNS),
                params![id],
            )
            .await
            .map_err(|e| StoreError::Query(format!("Failed to get submission: {}", e)))?;

        match rows.next().await? {
            Some(row) => Ok(Some(self.row_to_record(&row)?)),
            None => Ok(None),
        }
    }

    /// Set a record's review status; returns whether the record exists
    pub async fn set_review_status(
        &self,
        id: i64,
        status: ReviewStatus,
    ) -> Result<bool, StoreError> {
        let changed = self
            .conn
            .execute(
                "UPDATE websites SET status = ? WHERE id = ?",
                params![status.as_str(), id],
            )
            .await
            .map_err(|e| StoreError::Query(format!("Failed to update status: {}", e)))?;
        Ok(changed == 1)
    }

    fn row_to_record(&self, row: &Row) -> Result<SubmissionRecord, StoreError> {
        let status = required_text(row, 5)?.parse::<ReviewStatus>()?;
        let http_status = optional_integer_at(row, 6)?
            .map(|code| {
                u16::try_from(code)
                    .map_err(|_| StoreError::Data(format!("Invalid HTTP status: {}", code)))
            })
            .transpose()?;
        let scan_result = optional_text_at(row, 8)?
            .map(|json| decode_scan(&json))
            .transpose()?;

        Ok(SubmissionRecord {
            id: required_integer(row, 0)?,
            url: required_text(row, 1)?,
            title: required_text(row, 2)?,
            description: required_text(row, 3)?,
            category_id: optional_integer_at(row, 4)?,
            status,
            http_status,
            last_checked_at: optional_integer_at(row, 7)?.and_then(from_unix),
            scan_result,
            scan_at: optional_integer_at(row, 9)?.and_then(from_unix),
        })
    }

    fn row_to_scan_candidate(row: &Row) -> Result<ScanCandidate, StoreError> {
        Ok(ScanCandidate {
            id: required_integer(row, 0)?,
            url: required_text(row, 1)?,
            title: required_text(row, 2)?,
            description: required_text(row, 3)?,
            category_id: optional_integer_at(row, 4)?,
        })
    }
}

#[async_trait]
impl ResultStore for Database {
    #[instrument(skip(self, submission), fields(url = %submission.url))]
    async fn add_submission(&self, submission: &NewSubmission) -> Result<i64, StoreError> {
        self.conn
            .execute(
                "INSERT INTO websites (url, title, description, category_id, status, submitted_at)
                 VALUES (?, ?, ?, ?, 'pending', ?)",
                params![
                    submission.url.clone(),
                    submission.title.clone(),
                    submission.description.clone(),
                    optional_integer(submission.category_id),
                    Utc::now().timestamp(),
                ],
            )
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    StoreError::Duplicate(submission.url.clone())
                } else {
                    StoreError::Query(format!("Failed to add submission: {}", e))
                }
            })?;

        let mut rows = self
            .conn
            .query("SELECT last_insert_rowid()", params![])
            .await
            .map_err(|e| StoreError::Query(format!("Failed to get last insert ID: {}", e)))?;

        let row = rows
            .next()
            .await?
            .ok_or_else(|| StoreError::Data("No ID returned from last_insert_rowid()".to_string()))?;
        required_integer(&row, 0)
    }

    #[instrument(skip(self))]
    async fn select_eligible_for_status_check(
        &self,
        limit: usize,
    ) -> Result<Vec<StatusCandidate>, StoreError> {
        let cutoff = Utc::now().timestamp() - RECHECK_AFTER_SECS;
        let mut rows = self
            .conn
            .query(
                "SELECT id, url FROM websites
                 WHERE last_checked IS NULL OR last_checked < ?
                 ORDER BY last_checked IS NOT NULL, last_checked, id
                 LIMIT ?",
                params![cutoff, sql_limit(limit)],
            )
            .await
            .map_err(|e| StoreError::Query(format!("Failed to select status candidates: {}", e)))?;

        let mut candidates = Vec::new();
        while let Some(row) = rows.next().await? {
            candidates.push(StatusCandidate {
                id: required_integer(&row, 0)?,
                url: required_text(&row, 1)?,
            });
        }
        debug!("Selected {} records for status check", candidates.len());
        Ok(candidates)
    }

    #[instrument(skip(self))]
    async fn select_eligible_for_scan(
        &self,
        limit: usize,
    ) -> Result<Vec<ScanCandidate>, StoreError> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, url, title, description, category_id FROM websites
                 WHERE status = 'pending' AND scan_result IS NULL AND http_status = 200
                 ORDER BY id
                 LIMIT ?",
                params![sql_limit(limit)],
            )
            .await
            .map_err(|e| StoreError::Query(format!("Failed to select scan candidates: {}", e)))?;

        let mut candidates = Vec::new();
        while let Some(row) = rows.next().await? {
            candidates.push(Self::row_to_scan_candidate(&row)?);
        }
        debug!("Selected {} records for scan", candidates.len());
        Ok(candidates)
    }

    async fn get_scan_candidate(&self, id: i64) -> Result<Option<ScanCandidate>, StoreError> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, url, title, description, category_id FROM websites WHERE id = ?",
                params![id],
            )
            .await
            .map_err(|e| StoreError::Query(format!("Failed to get scan candidate: {}", e)))?;

        match rows.next().await? {
            Some(row) => Ok(Some(Self::row_to_scan_candidate(&row)?)),
            None => Ok(None),
        }
    }

    async fn write_status(&self, id: i64, probe: &ProbeResult) -> Result<(), StoreError> {
        let changed = self
            .conn
            .execute(
                "UPDATE websites SET http_status = ?, last_checked = ? WHERE id = ?",
                params![
                    i64::from(probe.status_code),
                    probe.checked_at.timestamp(),
                    id
                ],
            )
            .await
            .map_err(|e| StoreError::Query(format!("Failed to write status: {}", e)))?;
        if changed == 0 {
            debug!("No record {} to write status to", id);
        }
        Ok(())
    }

    async fn write_scan(&self, id: i64, scan: &ScanResult) -> Result<bool, StoreError> {
        let json = serde_json::to_string(scan)
            .map_err(|e| StoreError::Data(format!("Failed to encode scan result: {}", e)))?;

        let changed = self
            .conn
            .execute(
                "UPDATE websites SET scan_result = ?, scan_at = ? WHERE id = ? AND http_status = 200",
                params![json, Utc::now().timestamp(), id],
            )
            .await
            .map_err(|e| StoreError::Query(format!("Failed to write scan: {}", e)))?;
        Ok(changed == 1)
    }

    async fn read_scan(&self, id: i64) -> Result<Option<StoredScan>, StoreError> {
        let mut rows = self
            .conn
            .query(
                "SELECT scan_result, scan_at FROM websites WHERE id = ? AND scan_result IS NOT NULL",
                params![id],
            )
            .await
            .map_err(|e| StoreError::Query(format!("Failed to read scan: {}", e)))?;

        match rows.next().await? {
            Some(row) => Ok(Some(StoredScan {
                analysis: decode_scan(&required_text(&row, 0)?)?,
                scan_at: optional_integer_at(&row, 1)?.and_then(from_unix),
            })),
            None => Ok(None),
        }
    }

    #[instrument(skip(self))]
    async fn read_summary(&self) -> Result<ScanSummary, StoreError> {
        let mut rows = self
            .conn
            .query(
                "SELECT
                    COUNT(*),
                    AVG(CASE WHEN json_extract(scan_result, '$.outcome') = 'verdict'
                        THEN json_extract(scan_result, '$.content_quality') END),
                    COALESCE(SUM(CASE WHEN json_extract(scan_result, '$.is_malicious') = 1
                        THEN 1 ELSE 0 END), 0),
                    COALESCE(SUM(CASE WHEN json_extract(scan_result, '$.is_adult_content') = 1
                        THEN 1 ELSE 0 END), 0)
                 FROM websites
                 WHERE scan_result IS NOT NULL",
                params![],
            )
            .await
            .map_err(|e| StoreError::Query(format!("Failed to read summary: {}", e)))?;

        let row = rows
            .next()
            .await?
            .ok_or_else(|| StoreError::Data("Summary query returned no row".to_string()))?;

        let avg_content_quality = match row.get_value(1)? {
            Value::Null => None,
            Value::Real(avg) => Some(avg),
            Value::Integer(avg) => Some(avg as f64),
            other => {
                return Err(StoreError::Data(format!(
                    "Unexpected average type: {:?}",
                    other
                )));
            }
        };

        Ok(ScanSummary {
            total_scanned: count(&row, 0)?,
            avg_content_quality,
            malicious_count: count(&row, 2)?,
            adult_content_count: count(&row, 3)?,
        })
    }
}

fn is_unique_violation(err: &libsql::Error) -> bool {
    matches!(err, libsql::Error::SqliteFailure(code, _) if *code == SQLITE_CONSTRAINT_UNIQUE)
}

fn sql_limit(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

fn optional_integer(value: Option<i64>) -> Value {
    value.map_or(Value::Null, Value::Integer)
}

fn optional_integer_at(row: &Row, idx: i32) -> Result<Option<i64>, StoreError> {
    match row.get_value(idx)? {
        Value::Null => Ok(None),
        Value::Integer(value) => Ok(Some(value)),
        other => Err(StoreError::Data(format!(
            "Expected integer in column {}, got {:?}",
            idx, other
        ))),
    }
}

fn optional_text_at(row: &Row, idx: i32) -> Result<Option<String>, StoreError> {
    match row.get_value(idx)? {
        Value::Null => Ok(None),
        Value::Text(value) => Ok(Some(value)),
        other => Err(StoreError::Data(format!(
            "Expected text in column {}, got {:?}",
            idx, other
        ))),
    }
}

fn required_integer(row: &Row, idx: i32) -> Result<i64, StoreError> {
    optional_integer_at(row, idx)?
        .ok_or_else(|| StoreError::Data(format!("Column {} is NULL", idx)))
}

fn required_text(row: &Row, idx: i32) -> Result<String, StoreError> {
    optional_text_at(row, idx)?.ok_or_else(|| StoreError::Data(format!("Column {} is NULL", idx)))
}

fn count(row: &Row, idx: i32) -> Result<u64, StoreError> {
    let value = required_integer(row, idx)?;
    u64::try_from(value).map_err(|_| StoreError::Data(format!("Negative count: {}", value)))
}

fn from_unix(secs: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(secs, 0)
}

fn decode_scan(json: &str) -> Result<ScanResult, StoreError> {
    serde_json::from_str(json)
        .map_err(|e| StoreError::Data(format!("Failed to decode scan result: {}", e)))
}
