//! LLM integration for Health Assist.
//!
//! `provider` defines the transport-agnostic `LlmProvider` trait, `openai`
//! implements it for OpenAI-compatible endpoints, and `services` layers the
//! `Classifier` / `Generator` seams the agents depend on.

pub mod openai;
pub mod provider;
pub mod services;

pub use openai::OpenAiProvider;
pub use provider::*;
pub use services::{Classifier, Generator, LlmClassifier, LlmGenerator};

use std::sync::Arc;

use crate::config::LlmSettings;

/// Create the configured LLM provider.
pub fn create_provider(settings: &LlmSettings) -> Arc<dyn LlmProvider> {
    tracing::info!(
        "Using OpenAI-compatible endpoint {} (model: {})",
        settings.api_base,
        settings.model
    );
    Arc::new(OpenAiProvider::new(settings))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_provider_reports_model() {
        let settings = LlmSettings {
            api_key: secrecy::SecretString::from("sk-test"),
            api_base: crate::config::DEFAULT_API_BASE.to_string(),
            model: "gpt-4o".to_string(),
            temperature: 0.7,
        };
        let provider = create_provider(&settings);
        assert_eq!(provider.model_name(), "gpt-4o");
    }
}
