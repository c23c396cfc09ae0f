//! Full-content retrieval feeding the text extractor

use reqwest::Client;
use tracing::{debug, instrument, warn};

use crate::checker::error::FetchError;
use crate::checker::extract::{extract, truncate_chars};
use crate::checker::CheckerConfig;

/// Marker appended to text cut at the length limit
pub const TRUNCATION_MARKER: &str = "...";

/// Fetches pages under the checker's HTTP policy and extracts their text
#[derive(Debug, Clone)]
pub struct ContentFetcher {
    client: Client,
    max_body_bytes: usize,
}

impl ContentFetcher {
    /// Create a fetcher applying the given HTTP policy
    pub fn new(config: &CheckerConfig) -> Result<Self, FetchError> {
        Ok(Self::with_client(config.http_client()?, config))
    }

    /// Create a fetcher sharing an existing client
    pub fn with_client(client: Client, config: &CheckerConfig) -> Self {
        Self {
            client,
            max_body_bytes: config.max_body_bytes,
        }
    }

    /// Fetch a page and return its extracted text
    ///
    /// # Arguments
    ///
    /// * `url` - The page to fetch
    /// * `max_length` - Maximum characters of text to return
    ///
    /// # Returns
    ///
    /// The extracted text, cut to `max_length` and suffixed with
    /// [`TRUNCATION_MARKER`] when cut
    #[instrument(skip(self))]
    pub async fn fetch(&self, url: &str, max_length: usize) -> Result<String, FetchError> {
        let html = self.fetch_html(url).await?;
        let text = extract(&html).to_text();

        let truncated = truncate_chars(&text, max_length);
        if truncated.len() < text.len() {
            debug!("Truncated {} chars of text to {}", text.chars().count(), max_length);
            Ok(format!("{}{}", truncated, TRUNCATION_MARKER))
        } else {
            Ok(text)
        }
    }

    /// GET a page, reading at most `max_body_bytes` of its body
    async fn fetch_html(&self, url: &str) -> Result<String, FetchError> {
        let mut response = self.client.get(url).send().await.map_err(|e| {
            warn!("Fetch failed for {}: {}", url, e);
            if e.is_timeout() {
                FetchError::Timeout(url.to_string())
            } else {
                FetchError::Request(e)
            }
        })?;

        let status = response.status().as_u16();
        if !(200..400).contains(&status) {
            return Err(FetchError::Status {
                status,
                url: url.to_string(),
            });
        }

        let mut body: Vec<u8> = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout(url.to_string())
            } else {
                FetchError::Body(e.to_string())
            }
        })? {
            let room = self.max_body_bytes.saturating_sub(body.len());
            body.extend_from_slice(&chunk[..chunk.len().min(room)]);
            if body.len() >= self.max_body_bytes {
                debug!("Body of {} capped at {} bytes", url, self.max_body_bytes);
                break;
            }
        }

        Ok(String::from_utf8_lossy(&body).into_owned())
    }
}
