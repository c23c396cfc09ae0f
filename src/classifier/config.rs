//! # Classifier Configuration Module
//!
//! Model selection and the fixed low-temperature, bounded-output settings
//! used for every classification request.

use std::time::Duration;

/// Default model identifier
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

/// Default system role sent with every request
pub const DEFAULT_SYSTEM_ROLE: &str = "You are a website content analyzer for a web directory. Analyze websites for quality, safety, and accuracy of descriptions.";

/// Configuration for the content classifier
#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    /// Model identifier sent to the service and recorded on verdicts
    pub model: String,

    /// System role preamble
    pub system_role: String,

    /// Cap on generated tokens
    pub max_tokens: u32,

    /// Sampling temperature
    pub temperature: f32,

    /// Timeout for one service call
    pub timeout: Duration,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            system_role: DEFAULT_SYSTEM_ROLE.to_string(),
            max_tokens: 500,
            temperature: 0.3,
            timeout: Duration::from_secs(30),
        }
    }
}

/// Builder for ClassifierConfig
#[derive(Debug, Default)]
pub struct ClassifierConfigBuilder {
    config: ClassifierConfig,
}

impl ClassifierConfigBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self {
            config: ClassifierConfig::default(),
        }
    }

    /// Set the model identifier
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    /// Set the system role preamble
    pub fn system_role(mut self, system_role: impl Into<String>) -> Self {
        self.config.system_role = system_role.into();
        self
    }

    /// Set the output token cap
    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.config.max_tokens = max_tokens;
        self
    }

    /// Set the sampling temperature
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.config.temperature = temperature;
        self
    }

    /// Set the service call timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Build the configuration
    pub fn build(self) -> ClassifierConfig {
        self.config
    }
}

impl ClassifierConfig {
    /// Create a new builder
    pub fn builder() -> ClassifierConfigBuilder {
        ClassifierConfigBuilder::new()
    }
}
