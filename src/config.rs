//! Configuration types.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

use crate::error::ConfigError;

/// Default OpenAI-compatible endpoint.
pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";

/// Settings for the model service.
#[derive(Debug, Clone)]
pub struct LlmSettings {
    pub api_key: SecretString,
    pub api_base: String,
    pub model: String,
    pub temperature: f32,
}

impl LlmSettings {
    /// Build from environment variables.
    ///
    /// `OPENAI_API_KEY` is required; everything else has a default.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| ConfigError::MissingEnvVar("OPENAI_API_KEY".to_string()))?;

        let api_base = std::env::var("OPENAI_API_BASE")
            .ok()
            .map(|s| s.trim_end_matches('/').to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());

        let model = std::env::var("HEALTH_ASSIST_MODEL").unwrap_or_else(|_| "gpt-4o".to_string());

        let temperature = parse_env("HEALTH_ASSIST_TEMPERATURE", 0.7_f32)?;

        Ok(Self {
            api_key: SecretString::from(api_key),
            api_base,
            model,
            temperature,
        })
    }
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AssistConfig {
    /// Path of the libSQL database file.
    pub db_path: PathBuf,
    /// User that owns goals, records, and the profile.
    pub user_id: String,
    /// Maximum dispatches per orchestration run.
    pub max_steps: usize,
    /// Call-level timeout for classification and generation.
    pub llm_timeout: Duration,
    /// Retries of a failed model call before the step is aborted.
    pub service_retries: u32,
}

impl Default for AssistConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("./data/health-assist.db"),
            user_id: "default".to_string(),
            max_steps: 15,
            llm_timeout: Duration::from_secs(60),
            service_retries: 1,
        }
    }
}

impl AssistConfig {
    /// Build from environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let db_path = std::env::var("HEALTH_ASSIST_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.db_path);

        let user_id = std::env::var("HEALTH_ASSIST_USER")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(defaults.user_id);

        let max_steps = parse_env("HEALTH_ASSIST_MAX_STEPS", defaults.max_steps)?;
        if max_steps == 0 {
            return Err(ConfigError::InvalidValue {
                key: "HEALTH_ASSIST_MAX_STEPS".to_string(),
                message: "must be at least 1".to_string(),
            });
        }

        let timeout_secs = parse_env(
            "HEALTH_ASSIST_LLM_TIMEOUT_SECS",
            defaults.llm_timeout.as_secs(),
        )?;

        let service_retries = parse_env("HEALTH_ASSIST_SERVICE_RETRIES", defaults.service_retries)?;

        Ok(Self {
            db_path,
            user_id,
            max_steps,
            llm_timeout: Duration::from_secs(timeout_secs),
            service_retries,
        })
    }
}

/// Parse an optional environment variable, keeping `default` when unset.
fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => {
            raw.trim()
                .parse()
                .map_err(|e: T::Err| ConfigError::InvalidValue {
                    key: key.to_string(),
                    message: e.to_string(),
                })
        }
        _ => Ok(default),
    }
}
