//! Provider factory
//!
//! Resolves a provider name into a ready adapter. The set of names is closed
//! ([`ProviderKind`]); adding a provider means adding a variant, a dispatch arm
//! and the adapter itself.

use crate::error::{LlmError, LlmResult};
use crate::llm::provider::LlmProvider;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Known provider identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    Groq,
    OpenAi,
    Anthropic,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 3] = [ProviderKind::Groq, ProviderKind::OpenAi, ProviderKind::Anthropic];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Groq => "groq",
            ProviderKind::OpenAi => "openai",
            ProviderKind::Anthropic => "anthropic",
        }
    }

    /// Names accepted by [`create_provider`], in registration order
    pub fn supported_names() -> Vec<&'static str> {
        Self::ALL.iter().map(|kind| kind.as_str()).collect()
    }

    /// Cargo feature that compiles this provider's adapter
    pub fn feature(&self) -> &'static str {
        self.as_str()
    }

    /// Whether the adapter is compiled into this build
    pub fn is_available(&self) -> bool {
        match self {
            ProviderKind::Groq => cfg!(feature = "groq"),
            ProviderKind::OpenAi => cfg!(feature = "openai"),
            ProviderKind::Anthropic => cfg!(feature = "anthropic"),
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = LlmError;

    /// Exact, case-sensitive match
    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == name)
            .ok_or_else(|| LlmError::unknown_provider(name, &Self::supported_names()))
    }
}

/// Optional construction settings; unset fields take the provider's defaults
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderOptions {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default)]
    pub max_tokens: Option<u32>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub base_url: Option<String>,
    /// Anthropic only: value of the `anthropic-version` header
    #[serde(default)]
    pub anthropic_version: Option<String>,
}

/// Create an LLM provider by name
pub fn create_provider(
    name: &str,
    api_key: &str,
    options: ProviderOptions,
) -> LlmResult<Box<dyn LlmProvider>> {
    let kind: ProviderKind = name.parse()?;
    debug!(provider = %kind, model = ?options.model, "creating provider");

    match kind {
        ProviderKind::Groq => build_groq(api_key, options),
        ProviderKind::OpenAi => build_openai(api_key, options),
        ProviderKind::Anthropic => build_anthropic(api_key, options),
    }
}

#[cfg_attr(
    all(feature = "groq", feature = "openai", feature = "anthropic"),
    allow(dead_code)
)]
fn feature_disabled(kind: ProviderKind) -> LlmError {
    LlmError::dependency_missing(
        kind.as_str(),
        format!(
            "this build was compiled without the `{}` feature; rebuild with `--features {}`",
            kind.feature(),
            kind.feature()
        ),
    )
}

#[cfg(feature = "groq")]
fn build_groq(api_key: &str, options: ProviderOptions) -> LlmResult<Box<dyn LlmProvider>> {
    use crate::llm::providers::groq::{GroqConfig, GroqProvider};
    use std::time::Duration;

    let defaults = GroqConfig::default();
    let config = GroqConfig {
        api_key: api_key.to_string(),
        model: options.model.unwrap_or(defaults.model),
        temperature: options.temperature.unwrap_or(defaults.temperature),
        max_tokens: options.max_tokens.unwrap_or(defaults.max_tokens),
        timeout: options
            .timeout_secs
            .map(Duration::from_secs)
            .unwrap_or(defaults.timeout),
        base_url: options.base_url.unwrap_or(defaults.base_url),
    };
    Ok(Box::new(GroqProvider::new(config)?))
}

#[cfg(not(feature = "groq"))]
fn build_groq(_api_key: &str, _options: ProviderOptions) -> LlmResult<Box<dyn LlmProvider>> {
    Err(feature_disabled(ProviderKind::Groq))
}

#[cfg(feature = "openai")]
fn build_openai(api_key: &str, options: ProviderOptions) -> LlmResult<Box<dyn LlmProvider>> {
    use crate::llm::providers::openai::{OpenAiConfig, OpenAiProvider};
    use std::time::Duration;

    let defaults = OpenAiConfig::default();
    let config = OpenAiConfig {
        api_key: api_key.to_string(),
        model: options.model.unwrap_or(defaults.model),
        temperature: options.temperature.unwrap_or(defaults.temperature),
        max_tokens: options.max_tokens.unwrap_or(defaults.max_tokens),
        timeout: options
            .timeout_secs
            .map(Duration::from_secs)
            .unwrap_or(defaults.timeout),
        base_url: options.base_url.unwrap_or(defaults.base_url),
    };
    Ok(Box::new(OpenAiProvider::new(config)?))
}

#[cfg(not(feature = "openai"))]
fn build_openai(_api_key: &str, _options: ProviderOptions) -> LlmResult<Box<dyn LlmProvider>> {
    Err(feature_disabled(ProviderKind::OpenAi))
}

#[cfg(feature = "anthropic")]
fn build_anthropic(api_key: &str, options: ProviderOptions) -> LlmResult<Box<dyn LlmProvider>> {
    use crate::llm::providers::anthropic::{AnthropicConfig, AnthropicProvider};
    use std::time::Duration;

    let defaults = AnthropicConfig::default();
    let config = AnthropicConfig {
        api_key: api_key.to_string(),
        model: options.model.unwrap_or(defaults.model),
        temperature: options.temperature.unwrap_or(defaults.temperature),
        max_tokens: options.max_tokens.unwrap_or(defaults.max_tokens),
        timeout: options
            .timeout_secs
            .map(Duration::from_secs)
            .unwrap_or(defaults.timeout),
        base_url: options.base_url.unwrap_or(defaults.base_url),
        version: options.anthropic_version.unwrap_or(defaults.version),
    };
    Ok(Box::new(AnthropicProvider::new(config)?))
}

#[cfg(not(feature = "anthropic"))]
fn build_anthropic(_api_key: &str, _options: ProviderOptions) -> LlmResult<Box<dyn LlmProvider>> {
    Err(feature_disabled(ProviderKind::Anthropic))
}
