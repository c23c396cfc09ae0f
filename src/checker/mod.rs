//! # Website Checker Module
//!
//! This module talks to the submitted third-party sites. It is the first
//! stage of the pipeline and covers both lightweight reachability probes and
//! full content retrieval for analysis.
//!
//! ## Key Components
//!
//! - `CheckerConfig`: Shared HTTP policy (timeouts, redirects, TLS, user agent)
//! - `Prober`: HEAD-only status checks producing a `ProbeResult`
//! - `ContentFetcher`: Full GET with bounded body size, delegating to the extractor
//! - `extract`: Pure HTML-to-text extraction
//! - URL normalization and screening for new submissions
//!
//! Every response code, redirect chain and body is treated as untrusted input.

mod config;
mod error;
pub mod extract;
mod fetch;
mod probe;
pub mod url_policy;

pub use config::{CheckerConfig, CheckerConfigBuilder, DEFAULT_SITE_URL, user_agent_for};
pub use error::{FetchError, UrlError};
pub use extract::{ExtractedContent, extract};
pub use fetch::{ContentFetcher, TRUNCATION_MARKER};
pub use probe::Prober;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of a single reachability probe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeResult {
    /// Final HTTP status code, 0 if the site was unreachable
    pub status_code: u16,

    /// True iff 200 <= status_code < 400
    pub is_accessible: bool,

    /// Description of the network failure, if any
    pub error_detail: Option<String>,

    /// When the probe completed
    pub checked_at: DateTime<Utc>,
}
