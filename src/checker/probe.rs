//! Lightweight reachability checks

use std::error::Error as StdError;

use chrono::Utc;
use reqwest::Client;
use tracing::{debug, instrument, warn};

use crate::checker::error::FetchError;
use crate::checker::{CheckerConfig, ProbeResult};

/// Issues header-only requests and reports a status verdict
#[derive(Debug, Clone)]
pub struct Prober {
    client: Client,
}

impl Prober {
    /// Create a prober applying the given HTTP policy
    pub fn new(config: &CheckerConfig) -> Result<Self, FetchError> {
        Ok(Self {
            client: config.http_client()?,
        })
    }

    /// Create a prober sharing an existing client
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// Probe a URL with a HEAD request
    ///
    /// Network failures are folded into the result (`status_code = 0`)
    /// and never returned as errors.
    #[instrument(skip(self))]
    pub async fn probe(&self, url: &str) -> ProbeResult {
        match self.client.head(url).send().await {
            Ok(response) => {
                let status = response.status().as_u16();
                debug!(status, final_url = %response.url(), "Probe completed");
                ProbeResult::from_status(status)
            }
            Err(e) => {
                let detail = describe_request_error(&e);
                warn!("Probe failed for {}: {}", url, detail);
                ProbeResult::unreachable(detail)
            }
        }
    }
}

/// Render a reqwest error with its source chain
pub(crate) fn describe_request_error(err: &reqwest::Error) -> String {
    let kind = if err.is_timeout() {
        "timeout"
    } else if err.is_connect() {
        "connect"
    } else if err.is_redirect() {
        "redirect"
    } else {
        "request"
    };

    let mut detail = format!("{}: {}", kind, err);
    let mut source = err.source();
    while let Some(cause) = source {
        detail.push_str(&format!(": {}", cause));
        source = cause.source();
    }
    detail
}

impl ProbeResult {
    /// Result for a response that arrived with the given final status
    pub fn from_status(status_code: u16) -> Self {
        Self {
            status_code,
            is_accessible: (200..400).contains(&status_code),
            error_detail: None,
            checked_at: Utc::now(),
        }
    }

    /// Result for a request that never produced a response
    pub fn unreachable(detail: impl Into<String>) -> Self {
        Self {
            status_code: 0,
            is_accessible: false,
            error_detail: Some(detail.into()),
            checked_at: Utc::now(),
        }
    }
}
