//! # sitecheck - Website Verification and Content Analysis for Link Directories
//!
//! This crate checks the websites submitted to a link directory. It probes
//! each submission for reachability, extracts readable text from its pages,
//! optionally asks an external text-generation service for a structured
//! verdict on that text, and writes the results back to the directory's
//! store.
//!
//! ## Features
//!
//! - HEAD-only reachability probes with redirect, timeout and TLS policy
//! - Size-bounded page fetches with total HTML-to-text extraction
//! - Content classification with parse-then-default-fill of model output
//! - Sequential, paced batch runs with per-item outcomes
//! - LibSQL-backed result store
//! - URL normalization and screening for new submissions
//!
//! ## Example
//!
//! ```rust,no_run
//! use sitecheck::config::Settings;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let settings = Settings::from_env()?;
//!     let runner = settings.build_runner().await?;
//!
//!     for outcome in runner.run_status_batch(50).await? {
//!         println!("{} -> {}", outcome.url, outcome.is_success());
//!     }
//!
//!     if runner.scan_enabled() {
//!         let scans = runner.run_scan_batch(5).await?;
//!         println!("Scanned {} sites", scans.len());
//!     }
//!     Ok(())
//! }
//! ```

mod error;

pub mod batch;
pub mod checker;
pub mod classifier;
pub mod config;
pub mod report;
pub mod store;

pub use error::{Error, Result};

/// Re-export of the types most callers need
pub mod prelude {
    pub use crate::batch::{BatchConfig, BatchRunner, ItemOutcome, OutcomeDetail};
    pub use crate::checker::{CheckerConfig, ProbeResult};
    pub use crate::classifier::{AnalysisVerdict, Classifier, CompletionService, ScanResult};
    pub use crate::config::Settings;
    pub use crate::error::Error;
    pub use crate::error::Result;
    pub use crate::store::{Database, ResultStore};
}
