//! # Mock Completion Service for Testing
//!
//! Provides a `MockCompletionService` that implements the `CompletionService`
//! trait for use in tests. Responses and errors are scripted in order; once
//! the script runs out every call answers with an empty JSON object.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::classifier::error::ClassifyError;
use crate::classifier::service::{CompletionRequest, CompletionService};

/// A scripted completion service that records every request it receives
#[derive(Debug, Clone, Default)]
pub struct MockCompletionService {
    script: Arc<Mutex<VecDeque<Result<String, ClassifyError>>>>,
    requests: Arc<Mutex<Vec<CompletionRequest>>>,
}

impl MockCompletionService {
    /// Creates a mock with an empty script
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful answer
    pub async fn push_response(&self, text: &str) {
        self.script.lock().await.push_back(Ok(text.to_string()));
    }

    /// Queue a failure
    pub async fn push_error(&self, error: ClassifyError) {
        self.script.lock().await.push_back(Err(error));
    }

    /// Requests received so far
    pub async fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().await.clone()
    }
}

#[async_trait]
impl CompletionService for MockCompletionService {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, ClassifyError> {
        self.requests.lock().await.push(request.clone());
        self.script
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| Ok("{}".to_string()))
    }
}
