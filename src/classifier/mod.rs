//! # Content Classifier Module
//!
//! This module submits extracted page text plus the submission's declared
//! metadata to an external text-generation service and turns the free-form
//! answer into a structured verdict.
//!
//! ## Key Components
//!
//! - `CompletionService`: The seam to the external service
//! - `OpenAiService`: Chat-completions implementation of that seam
//! - `Classifier`: Builds the prompt, calls the service, parses the answer
//! - `AnalysisVerdict` / `ScanResult`: What gets persisted on a record
//!
//! The service's output is never trusted to be complete. Missing verdict
//! fields are defaulted, and an answer with no JSON object is stored as
//! an `Unparsed` fallback so operators can audit it. A fetch or service
//! failure is stored as `Failed` with its diagnostic.

mod analyzer;
mod config;
mod error;
pub mod mock;
mod openai;
pub mod parse;
mod service;

pub use analyzer::{Classifier, build_prompt};
pub use config::{ClassifierConfig, ClassifierConfigBuilder, DEFAULT_MODEL};
pub use error::ClassifyError;
pub use openai::{DEFAULT_BASE_URL, OpenAiService};
pub use service::{CompletionRequest, CompletionService};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Structured outcome of a content analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisVerdict {
    /// Content quality, 1-10
    pub content_quality: u8,

    /// How well the submitted description matches the site, 1-10
    pub description_accuracy: u8,

    /// 10 is completely safe, 1 potentially harmful
    pub safety_score: u8,

    /// Fit with the submitted category, 1-10
    pub category_match: u8,

    /// Potentially harmful, spam or malicious
    pub is_malicious: bool,

    /// Contains adult content
    pub is_adult_content: bool,

    /// Detected primary language
    pub language: String,

    /// Improvement suggestions
    pub recommendations: Vec<String>,

    /// Potential issues found
    pub red_flags: Vec<String>,

    /// Brief summary of the analysis
    pub summary: String,

    /// When the analysis was made
    pub analyzed_at: DateTime<Utc>,

    /// Model identifier that produced the answer
    pub ai_model: String,
}

/// Fallback recorded when the answer held no parseable verdict
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnparsedResponse {
    /// Always [`parse::PARSE_FAILED_SUMMARY`]
    pub summary: String,

    /// The answer exactly as received
    pub raw_response: String,

    /// When the answer was received
    pub analyzed_at: DateTime<Utc>,
}

/// Marker recorded when a scan could not produce an analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanFailure {
    /// Fetch or classifier diagnostic
    pub reason: String,

    /// When the attempt failed
    pub analyzed_at: DateTime<Utc>,
}

impl ScanFailure {
    /// A failure stamped with the current time
    pub fn now(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            analyzed_at: Utc::now(),
        }
    }
}

/// What gets stored as a record's scan result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ScanResult {
    /// A parsed, defaulted verdict
    Verdict(AnalysisVerdict),

    /// The raw answer that could not be parsed
    Unparsed(UnparsedResponse),

    /// The page could not be fetched or the service call failed
    Failed(ScanFailure),
}

impl ScanResult {
    /// The verdict, if parsing succeeded
    pub fn verdict(&self) -> Option<&AnalysisVerdict> {
        match self {
            ScanResult::Verdict(verdict) => Some(verdict),
            ScanResult::Unparsed(_) | ScanResult::Failed(_) => None,
        }
    }

    /// One-line summary for reports
    pub fn summary(&self) -> &str {
        match self {
            ScanResult::Verdict(verdict) => &verdict.summary,
            ScanResult::Unparsed(unparsed) => &unparsed.summary,
            ScanResult::Failed(failure) => &failure.reason,
        }
    }

    /// The failure diagnostic, for attempts that produced no analysis
    pub fn failure(&self) -> Option<&str> {
        match self {
            ScanResult::Failed(failure) => Some(&failure.reason),
            _ => None,
        }
    }
}
