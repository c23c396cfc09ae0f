//! # Database Schema Module
//!
//! Creates the `websites` table holding submissions and the fields the
//! pipeline computes. Timestamps are stored as Unix seconds; the scan
//! result is stored as JSON text so SQLite's JSON functions can aggregate it.

use crate::store::error::StoreError;
use libsql::{Connection, params};

/// Initialize the database schema
pub async fn initialize_schema(conn: &Connection) -> Result<(), StoreError> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS websites (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            url TEXT NOT NULL UNIQUE,
            title TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            category_id INTEGER,
            status TEXT NOT NULL DEFAULT 'pending'
                CHECK (status IN ('pending', 'approved', 'rejected')),
            http_status INTEGER,
            last_checked INTEGER,
            scan_result TEXT,
            scan_at INTEGER,
            submitted_at INTEGER NOT NULL
        )",
        params![],
    )
    .await
    .map_err(|e| StoreError::Schema(format!("Failed to create websites table: {}", e)))?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_websites_last_checked ON websites(last_checked)",
        params![],
    )
    .await
    .map_err(|e| StoreError::Schema(format!("Failed to create index on last_checked: {}", e)))?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_websites_status ON websites(status, http_status)",
        params![],
    )
    .await
    .map_err(|e| StoreError::Schema(format!("Failed to create index on status: {}", e)))?;

    Ok(())
}
