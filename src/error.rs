//! Error types for Health Assist.

use std::time::Duration;

/// Top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Goal error: {0}")]
    Goal(#[from] GoalError),

    #[error("Routing error: {0}")]
    Routing(#[from] RoutingError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Persistence errors. Any write that fails is rolled back by the store.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Connection pool error: {0}")]
    Pool(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Model-service errors.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Provider {provider} request failed: {reason}")]
    RequestFailed { provider: String, reason: String },

    #[error("Provider {provider} rate limited, retry after {retry_after:?}")]
    RateLimited {
        provider: String,
        retry_after: Option<Duration>,
    },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },

    #[error("Authentication failed for provider {provider}")]
    AuthFailed { provider: String },

    #[error("Call to {service} timed out after {timeout:?}")]
    Timeout { service: String, timeout: Duration },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl LlmError {
    /// Whether this failure means the service is unavailable (as opposed to
    /// a misconfiguration the user has to fix).
    pub fn is_service_unavailable(&self) -> bool {
        matches!(
            self,
            Self::RequestFailed { .. }
                | Self::RateLimited { .. }
                | Self::Timeout { .. }
                | Self::InvalidResponse { .. }
        )
    }
}

/// Goal lifecycle errors. None of these are retried.
#[derive(Debug, thiserror::Error)]
pub enum GoalError {
    #[error("Invalid goal input: {0}")]
    Validation(String),

    #[error("Goal {id} not found")]
    NotFound { id: String },

    #[error("Goal {id} is {state}, cannot transition to {target}")]
    InvalidState {
        id: String,
        state: String,
        target: String,
    },

    #[error("Persistence error: {0}")]
    Persistence(#[from] DatabaseError),
}

/// Router output that violates the routing protocol.
#[derive(Debug, thiserror::Error)]
pub enum RoutingError {
    #[error("Classifier returned unknown label '{label}' (allowed: {allowed})")]
    UnknownLabel { label: String, allowed: String },

    #[error("Classifier returned an empty decision")]
    EmptyDecision,
}

/// Result type alias.
pub type Result<T> = std::result::Result<T, Error>;
