//! Error types for llm-core
//!
//! Every failure the crate can produce is an [`LlmError`]. Nothing is retried or
//! swallowed here except by [`crate::output::json::extract_field`], whose contract
//! is to fall back to a default.

use thiserror::Error;

/// Maximum number of characters of offending text kept in extraction errors
pub const SNIPPET_CHARS: usize = 500;

/// Main error type for llm-core operations
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Unknown provider: '{name}'. Supported providers: {}", .supported.join(", "))]
    UnknownProvider {
        name: String,
        supported: Vec<&'static str>,
    },

    #[error("Provider '{provider}' is unavailable: {message}")]
    DependencyMissing { provider: String, message: String },

    #[error("{provider} request failed: {source}")]
    ProviderRequestFailed {
        provider: String,
        #[source]
        source: RequestFailure,
    },

    #[error("Invalid JSON in LLM response: {message}\nResponse text: {snippet}")]
    JsonExtractionFailed { message: String, snippet: String },

    #[error("Expected JSON object, got {found}")]
    UnexpectedJsonShape { found: &'static str },

    #[error("Validation failed: {0}")]
    Validation(#[from] serde_json::Error),

    #[error("Schema validation failed: {0}")]
    SchemaViolation(String),

    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),
}

/// Failure reported by a vendor client while serving a call
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RequestFailure {
    #[error("network error: {0}")]
    Network(String),
    #[error("API error: {status} - {body}")]
    Api { status: u16, body: String },
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    #[error("stream error: {0}")]
    Stream(String),
}

impl LlmError {
    /// Create unknown provider error listing the supported names
    pub fn unknown_provider<S: Into<String>>(name: S, supported: &[&'static str]) -> Self {
        Self::UnknownProvider {
            name: name.into(),
            supported: supported.to_vec(),
        }
    }

    /// Create dependency missing error
    pub fn dependency_missing<P: Into<String>, M: Into<String>>(provider: P, message: M) -> Self {
        Self::DependencyMissing {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Wrap a vendor failure for the given provider
    pub fn request_failed<P: Into<String>>(provider: P, source: RequestFailure) -> Self {
        Self::ProviderRequestFailed {
            provider: provider.into(),
            source,
        }
    }

    /// Create JSON extraction error, keeping the head of the offending text
    pub fn json_extraction_failed<S: Into<String>>(message: S, text: &str) -> Self {
        Self::JsonExtractionFailed {
            message: message.into(),
            snippet: text.chars().take(SNIPPET_CHARS).collect(),
        }
    }
}

/// Result type for llm-core operations
pub type LlmResult<T> = Result<T, LlmError>;
