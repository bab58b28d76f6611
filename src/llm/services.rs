//! Classification and generation services backed by an `LlmProvider`.
//!
//! The router depends on `Classifier`, responders on `Generator`. Both
//! apply a call-level timeout and report expiry as `LlmError::Timeout`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::LlmError;
use crate::llm::provider::{ChatMessage, CompletionRequest, LlmProvider};

/// Picks one label out of a fixed vocabulary for a conversation.
#[async_trait]
pub trait Classifier: Send + Sync {
    /// Return the raw label chosen by the service. Callers validate it.
    async fn classify(
        &self,
        history: &[ChatMessage],
        allowed_labels: &[&str],
    ) -> Result<String, LlmError>;
}

/// Produces free text from a prompt context.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, context: &[ChatMessage]) -> Result<String, LlmError>;
}

/// Run a provider call under a timeout.
async fn complete_with_timeout(
    llm: &dyn LlmProvider,
    request: CompletionRequest,
    timeout: Duration,
    service: &str,
) -> Result<String, LlmError> {
    match tokio::time::timeout(timeout, llm.complete(request)).await {
        Ok(result) => result.map(|r| r.content),
        Err(_) => {
            warn!(service, timeout_secs = timeout.as_secs(), "Model call timed out");
            Err(LlmError::Timeout {
                service: service.to_string(),
                timeout,
            })
        }
    }
}

/// Structured classifier output.
#[derive(Deserialize)]
struct RouteChoice {
    next: String,
}

/// Pull the label out of a classifier reply.
///
/// Accepts `{"next": "..."}` (optionally wrapped in a markdown fence) or a bare label.
pub fn extract_label(raw: &str) -> String {
    let trimmed = raw.trim();
    let unfenced = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|s| s.strip_suffix("```"))
        .map(str::trim)
        .unwrap_or(trimmed);

    if let Ok(choice) = serde_json::from_str::<RouteChoice>(unfenced) {
        return choice.next.trim().to_string();
    }
    unfenced.trim_matches(|c: char| c == '"' || c == '\'').trim().to_string()
}

/// `Classifier` that asks an LLM for a JSON `{"next": label}` object.
pub struct LlmClassifier {
    llm: Arc<dyn LlmProvider>,
    timeout: Duration,
}

impl LlmClassifier {
    pub fn new(llm: Arc<dyn LlmProvider>, timeout: Duration) -> Self {
        Self { llm, timeout }
    }
}

#[async_trait]
impl Classifier for LlmClassifier {
    async fn classify(
        &self,
        history: &[ChatMessage],
        allowed_labels: &[&str],
    ) -> Result<String, LlmError> {
        let mut messages = history.to_vec();
        messages.push(ChatMessage::system(format!(
            "Reply with a JSON object of the form {{\"next\": \"<label>\"}} where <label> is exactly one of: {}.",
            allowed_labels.join(", ")
        )));

        let request = CompletionRequest::new(messages)
            .with_temperature(0.0)
            .with_max_tokens(32)
            .with_json_mode();

        let raw = complete_with_timeout(self.llm.as_ref(), request, self.timeout, "classifier").await?;
        let label = extract_label(&raw);
        debug!(label = %label, "Classifier decision");
        Ok(label)
    }
}

/// `Generator` that forwards the prompt context to an LLM.
pub struct LlmGenerator {
    llm: Arc<dyn LlmProvider>,
    timeout: Duration,
    max_tokens: u32,
}

impl LlmGenerator {
    pub fn new(llm: Arc<dyn LlmProvider>, timeout: Duration) -> Self {
        Self {
            llm,
            timeout,
            max_tokens: 1024,
        }
    }
}

#[async_trait]
impl Generator for LlmGenerator {
    async fn generate(&self, context: &[ChatMessage]) -> Result<String, LlmError> {
        let request = CompletionRequest::new(context.to_vec()).with_max_tokens(self.max_tokens);
        complete_with_timeout(self.llm.as_ref(), request, self.timeout, "generator").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::provider::{CompletionResponse, FinishReason};

    struct FixedLlm {
        reply: String,
        delay: Duration,
    }

    #[async_trait]
    impl LlmProvider for FixedLlm {
        fn model_name(&self) -> &str {
            "fixed"
        }

        async fn complete(&self, _request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
            tokio::time::sleep(self.delay).await;
            Ok(CompletionResponse {
                content: self.reply.clone(),
                input_tokens: 0,
                output_tokens: 0,
                finish_reason: FinishReason::Stop,
            })
        }
    }

    #[test]
    fn extract_label_variants() {
        assert_eq!(extract_label(r#"{"next": "fitness"}"#), "fitness");
        assert_eq!(extract_label("```json\n{\"next\":\"FINISH\"}\n```"), "FINISH");
        assert_eq!(extract_label("  wellness \n"), "wellness");
        assert_eq!(extract_label("\"nutrition\""), "nutrition");
    }

    #[tokio::test]
    async fn classifier_parses_json_reply() {
        let llm = Arc::new(FixedLlm {
            reply: r#"{"next":"nutrition"}"#.into(),
            delay: Duration::ZERO,
        });
        let classifier = LlmClassifier::new(llm, Duration::from_secs(1));
        let label = classifier
            .classify(&[ChatMessage::user("what should I eat?")], &["nutrition", "FINISH"])
            .await
            .unwrap();
        assert_eq!(label, "nutrition");
    }

    #[tokio::test]
    async fn generator_times_out() {
        let llm = Arc::new(FixedLlm {
            reply: "late".into(),
            delay: Duration::from_millis(200),
        });
        let generator = LlmGenerator::new(llm, Duration::from_millis(10));
        let err = generator.generate(&[ChatMessage::user("hi")]).await.unwrap_err();
        assert!(matches!(err, LlmError::Timeout { .. }));
        assert!(err.is_service_unavailable());
    }
}
