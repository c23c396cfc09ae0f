//! Content classification against the external analysis service

use chrono::Utc;
use tracing::{debug, error, instrument};

use crate::classifier::error::ClassifyError;
use crate::classifier::parse::parse_response;
use crate::classifier::service::{CompletionRequest, CompletionService};
use crate::classifier::{ClassifierConfig, ScanResult};
use crate::store::ScanCandidate;

/// Classifies extracted page text for a submission
#[derive(Debug, Clone)]
pub struct Classifier<S> {
    service: S,
    config: ClassifierConfig,
}

impl<S: CompletionService> Classifier<S> {
    /// Create a classifier over the given service
    pub fn new(service: S, config: ClassifierConfig) -> Self {
        Self { service, config }
    }

    /// The classifier's configuration
    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Classify page text for a submission
    ///
    /// # Arguments
    ///
    /// * `content` - Extracted page text
    /// * `submission` - The submission's declared metadata
    ///
    /// # Returns
    ///
    /// A verdict (defaults filled in) or a fallback holding the raw answer.
    /// Transport, status and missing-answer failures are returned as errors.
    #[instrument(skip(self, content, submission), fields(id = submission.id, url = %submission.url))]
    pub async fn classify(
        &self,
        content: &str,
        submission: &ScanCandidate,
    ) -> Result<ScanResult, ClassifyError> {
        let request = CompletionRequest {
            model: self.config.model.clone(),
            system_role: self.config.system_role.clone(),
            user_prompt: build_prompt(content, submission),
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        let raw = self.service.complete(&request).await.map_err(|e| {
            error!("AI analysis failed: {}", e);
            e
        })?;
        debug!("Received {} chars of analysis", raw.len());

        Ok(parse_response(&raw, &self.config.model, Utc::now()))
    }
}

/// Build the analysis prompt for a submission
pub fn build_prompt(content: &str, submission: &ScanCandidate) -> String {
    let category = submission
        .category_id
        .map_or_else(|| "unspecified".to_string(), |id| id.to_string());

    format!(
        "Analyze this website submission for a web directory:

URL: {url}
Submitted Title: {title}
Submitted Description: {description}
Category: {category}

Website Content:
{content}

Please analyze and provide a JSON response with the following fields:
1. 'content_quality': Rate 1-10 (10 being highest quality)
2. 'description_accuracy': Rate 1-10 (how well the submitted description matches the actual content)
3. 'safety_score': Rate 1-10 (10 being completely safe, 1 being potentially harmful)
4. 'category_match': Rate 1-10 (how well the site fits the intended category)
5. 'is_malicious': boolean (true if potentially harmful/spam/malicious)
6. 'is_adult_content': boolean (true if contains adult content)
7. 'language': detected primary language
8. 'recommendations': array of improvement suggestions
9. 'red_flags': array of potential issues found
10. 'summary': brief summary of the analysis

Respond only with valid JSON.",
        url = submission.url,
        title = submission.title,
        description = submission.description,
        category = category,
        content = content,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::mock::MockCompletionService;

    fn submission() -> ScanCandidate {
        ScanCandidate {
            id: 7,
            url: "https://example.org/".to_string(),
            title: "Example".to_string(),
            description: "An example site".to_string(),
            category_id: Some(3),
        }
    }

    #[test]
    fn test_prompt_embeds_submission() {
        let prompt = build_prompt("Title: Example", &submission());
        assert!(prompt.contains("URL: https://example.org/"));
        assert!(prompt.contains("Submitted Title: Example"));
        assert!(prompt.contains("Submitted Description: An example site"));
        assert!(prompt.contains("Category: 3"));
        assert!(prompt.contains("Website Content:\nTitle: Example"));
        assert!(prompt.ends_with("Respond only with valid JSON."));
    }

    #[tokio::test]
    async fn test_classify_sends_fixed_settings() {
        let service = MockCompletionService::new();
        service
            .push_response(r#"{"content_quality": 8, "summary": "Fine"}"#)
            .await;
        let classifier = Classifier::new(service.clone(), ClassifierConfig::default());

        let result = classifier.classify("Title: Example", &submission()).await.unwrap();

        let ScanResult::Verdict(verdict) = result else {
            panic!("Expected a verdict");
        };
        assert_eq!(verdict.content_quality, 8);
        assert!(!verdict.is_malicious);
        assert_eq!(verdict.ai_model, "gpt-3.5-turbo");

        let requests = service.requests().await;
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].max_tokens, 500);
        assert!((requests[0].temperature - 0.3).abs() < f32::EPSILON);
        assert!(requests[0].user_prompt.contains("https://example.org/"));
    }

    #[tokio::test]
    async fn test_classify_propagates_service_failure() {
        let service = MockCompletionService::new();
        service
            .push_error(ClassifyError::Status {
                status_code: 500,
                message: "boom".to_string(),
            })
            .await;
        let classifier = Classifier::new(service, ClassifierConfig::default());

        let result = classifier.classify("text", &submission()).await;
        assert!(matches!(
            result,
            Err(ClassifyError::Status {
                status_code: 500,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_classify_records_unparseable_answer() {
        let service = MockCompletionService::new();
        service.push_response("not json at all").await;
        let classifier = Classifier::new(service, ClassifierConfig::default());

        let result = classifier.classify("text", &submission()).await.unwrap();
        match result {
            ScanResult::Unparsed(unparsed) => assert_eq!(unparsed.raw_response, "not json at all"),
            other => panic!("Expected fallback, got {:?}", other),
        }
    }
}
