//! # Checker Configuration Module
//!
//! This module provides the HTTP policy shared by the prober and the content
//! fetcher: timeouts, redirect limits, TLS leniency and the identifying
//! user agent. It uses a builder pattern for flexible configuration.
//!
//! ## Key Components
//!
//! - `CheckerConfig`: The main configuration struct with checker parameters
//! - `CheckerConfigBuilder`: Builder pattern implementation for easier configuration
//!
//! Directory targets are arbitrary third-party sites, so certificate
//! validation is off by default.

use std::time::Duration;

use reqwest::Client;

use crate::checker::error::FetchError;

/// Default operator site URL advertised in the user agent
pub const DEFAULT_SITE_URL: &str = "https://yourdomain.com";

/// Configuration for the prober and fetcher
#[derive(Debug, Clone)]
pub struct CheckerConfig {
    /// Overall request timeout
    pub timeout: Duration,

    /// Timeout for establishing the TCP/TLS connection
    pub connect_timeout: Duration,

    /// Maximum number of redirects to follow
    pub max_redirects: usize,

    /// User agent to use for requests
    pub user_agent: String,

    /// Whether to accept invalid TLS certificates and host names
    pub accept_invalid_certs: bool,

    /// Maximum number of body bytes read by the fetcher
    pub max_body_bytes: usize,

    /// Maximum length in characters of fetched text
    pub max_content_length: usize,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            connect_timeout: Duration::from_secs(10),
            max_redirects: 5,
            user_agent: user_agent_for(DEFAULT_SITE_URL),
            accept_invalid_certs: true,
            max_body_bytes: 2 * 1024 * 1024,
            max_content_length: 5000,
        }
    }
}

/// Build the identifying user agent for an operator site
pub fn user_agent_for(site_url: &str) -> String {
    format!("DirectoryBot/1.0 (+{})", site_url)
}

/// Builder for CheckerConfig
#[derive(Debug, Default)]
pub struct CheckerConfigBuilder {
    config: CheckerConfig,
}

impl CheckerConfigBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self {
            config: CheckerConfig::default(),
        }
    }

    /// Set the overall request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set the connect timeout
    pub fn connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.config.connect_timeout = connect_timeout;
        self
    }

    /// Set the maximum number of redirects to follow
    pub fn max_redirects(mut self, max_redirects: usize) -> Self {
        self.config.max_redirects = max_redirects;
        self
    }

    /// Set the user agent from the operator's site URL
    pub fn site_url(mut self, site_url: &str) -> Self {
        self.config.user_agent = user_agent_for(site_url);
        self
    }

    /// Set the user agent to use for requests
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    /// Set whether invalid certificates are accepted
    pub fn accept_invalid_certs(mut self, accept_invalid_certs: bool) -> Self {
        self.config.accept_invalid_certs = accept_invalid_certs;
        self
    }

    /// Set the maximum number of body bytes to read
    pub fn max_body_bytes(mut self, max_body_bytes: usize) -> Self {
        self.config.max_body_bytes = max_body_bytes;
        self
    }

    /// Set the maximum length of fetched text
    pub fn max_content_length(mut self, max_content_length: usize) -> Self {
        self.config.max_content_length = max_content_length;
        self
    }

    /// Build the configuration
    pub fn build(self) -> CheckerConfig {
        self.config
    }
}

impl CheckerConfig {
    /// Create a new builder
    pub fn builder() -> CheckerConfigBuilder {
        CheckerConfigBuilder::new()
    }

    /// Build a reqwest client applying this policy
    pub fn http_client(&self) -> Result<Client, FetchError> {
        Client::builder()
            .timeout(self.timeout)
            .connect_timeout(self.connect_timeout)
            .redirect(reqwest::redirect::Policy::limited(self.max_redirects))
            .user_agent(&self.user_agent)
            .danger_accept_invalid_certs(self.accept_invalid_certs)
            .danger_accept_invalid_hostnames(self.accept_invalid_certs)
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))
    }
}
