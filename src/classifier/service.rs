//! Seam for the external text-generation service

use async_trait::async_trait;
use serde::Serialize;

use crate::classifier::error::ClassifyError;

/// One prompt submission
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionRequest {
    /// Model identifier
    pub model: String,

    /// System role preamble
    pub system_role: String,

    /// The user prompt
    pub user_prompt: String,

    /// Cap on generated tokens
    pub max_tokens: u32,

    /// Sampling temperature
    pub temperature: f32,
}

/// A service that answers a prompt with free-form text
#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Submit a prompt and await the raw answer text
    async fn complete(&self, request: &CompletionRequest) -> Result<String, ClassifyError>;
}
