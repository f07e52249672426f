//! Configuration system for llm-core
//!
//! A TOML file names the active provider, per-provider settings and an optional
//! price table. API keys never live in the file: each provider section names the
//! environment variable that holds its key, and the variable is read at call time.

use crate::error::LlmResult;
use crate::llm::factory::{create_provider, ProviderKind, ProviderOptions};
use crate::llm::provider::LlmProvider;
use crate::output::cost::PriceTable;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Locations searched when no config path is given
pub const DEFAULT_CONFIG_PATHS: [&str; 2] = ["llm.toml", "config/llm.toml"];

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CoreConfig {
    pub llm: LlmSection,
    #[serde(default)]
    pub pricing: PricingSection,
}

/// LLM section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LlmSection {
    /// Active provider name (e.g., "groq", "openai")
    pub provider: String,
    /// Settings per provider, keyed by provider name
    #[serde(default)]
    pub providers: HashMap<String, ProviderSection>,
}

/// One provider's settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProviderSection {
    /// Environment variable containing the API key
    pub api_key_env: String,
    #[serde(flatten)]
    pub options: ProviderOptions,
}

/// Pricing section
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PricingSection {
    /// Price table overriding the built-in one
    pub path: Option<PathBuf>,
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("Environment variable not found: {0}")]
    EnvVarNotFound(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("No config file found (searched: {})", .0.join(", "))]
    NotFound(Vec<String>),
}

impl CoreConfig {
    /// Load configuration from a TOML file and validate it
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: CoreConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load the first existing file out of [`DEFAULT_CONFIG_PATHS`]
    pub fn discover() -> Result<Self, ConfigError> {
        DEFAULT_CONFIG_PATHS
            .iter()
            .map(Path::new)
            .find(|path| path.exists())
            .ok_or_else(|| {
                ConfigError::NotFound(DEFAULT_CONFIG_PATHS.iter().map(|p| p.to_string()).collect())
            })
            .and_then(Self::load_from_file)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let kind: ProviderKind = self
            .llm
            .provider
            .parse()
            .map_err(|e: crate::error::LlmError| ConfigError::InvalidConfig(e.to_string()))?;

        if !self.llm.providers.contains_key(kind.as_str()) {
            return Err(ConfigError::InvalidConfig(format!(
                "Active provider '{kind}' requires a [llm.providers.{kind}] section"
            )));
        }

        for name in self.llm.providers.keys() {
            name.parse::<ProviderKind>()
                .map_err(|e| ConfigError::InvalidConfig(e.to_string()))?;
        }

        Ok(())
    }

    /// Settings for the active provider
    pub fn active_section(&self) -> Result<&ProviderSection, ConfigError> {
        self.provider_section(&self.llm.provider)
    }

    pub fn provider_section(&self, provider: &str) -> Result<&ProviderSection, ConfigError> {
        self.llm.providers.get(provider).ok_or_else(|| {
            ConfigError::InvalidConfig(format!("No [llm.providers.{provider}] section"))
        })
    }

    /// Helper method to get environment variable with error propagation
    fn get_env_var_required(env_var_name: &str) -> Result<String, ConfigError> {
        std::env::var(env_var_name)
            .map_err(|_| ConfigError::EnvVarNotFound(env_var_name.to_string()))
    }

    /// Get a provider's API key from its environment variable
    pub fn api_key(&self, provider: &str) -> Result<String, ConfigError> {
        let section = self.provider_section(provider)?;
        Self::get_env_var_required(&section.api_key_env)
    }

    /// Build the active provider through the factory
    pub fn create_active_provider(&self) -> LlmResult<Box<dyn LlmProvider>> {
        self.create_active_provider_with(ProviderOptions::default())
    }

    /// Build the active provider, with `overrides` taking precedence over the file
    pub fn create_active_provider_with(
        &self,
        overrides: ProviderOptions,
    ) -> LlmResult<Box<dyn LlmProvider>> {
        let section = self.active_section()?;
        let api_key = self.api_key(&self.llm.provider)?;
        let options = merge_options(&section.options, overrides);
        create_provider(&self.llm.provider, &api_key, options)
    }

    /// The configured price table, or the built-in one
    pub fn price_table(&self) -> Result<PriceTable, ConfigError> {
        match &self.pricing.path {
            Some(path) => PriceTable::load_from_file(path),
            None => Ok(PriceTable::builtin().clone()),
        }
    }

    /// Create a test configuration for unit testing
    #[cfg(test)]
    pub fn test_config() -> Self {
        let toml_content = r#"
[llm]
provider = "groq"

[llm.providers.groq]
api_key_env = "LLM_CORE_TEST_GROQ_KEY"
temperature = 0.0

[llm.providers.openai]
api_key_env = "LLM_CORE_TEST_OPENAI_KEY"
model = "gpt-4o"
"#;
        Self::from_toml_str(toml_content).expect("Test config should parse")
    }
}

fn merge_options(base: &ProviderOptions, overrides: ProviderOptions) -> ProviderOptions {
    ProviderOptions {
        model: overrides.model.or_else(|| base.model.clone()),
        temperature: overrides.temperature.or(base.temperature),
        max_tokens: overrides.max_tokens.or(base.max_tokens),
        timeout_secs: overrides.timeout_secs.or(base.timeout_secs),
        base_url: overrides.base_url.or_else(|| base.base_url.clone()),
        anthropic_version: overrides
            .anthropic_version
            .or_else(|| base.anthropic_version.clone()),
    }
}
