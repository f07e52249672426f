//! Cost estimation for LLM usage
//!
//! Prices live in a [`PriceTable`] (USD per 1M tokens) rather than in code, so
//! they can be refreshed from a TOML file without a rebuild. A table dated
//! February 2026 is embedded as the default.

use crate::config::ConfigError;
use crate::llm::provider::TokenUsage;
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

const BUILTIN_PRICING: &str = include_str!("pricing.toml");

static BUILTIN_TABLE: Lazy<PriceTable> = Lazy::new(|| {
    PriceTable::from_toml_str(BUILTIN_PRICING).expect("embedded pricing table is valid TOML")
});

/// Input and output price for one model, USD per 1M tokens
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelPrice {
    pub input: f64,
    pub output: f64,
}

impl ModelPrice {
    pub fn cost(&self, usage: &TokenUsage) -> f64 {
        let input_cost = f64::from(usage.prompt_tokens) / 1_000_000.0 * self.input;
        let output_cost = f64::from(usage.completion_tokens) / 1_000_000.0 * self.output;
        input_cost + output_cost
    }
}

/// Versioned provider -> model -> price table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceTable {
    /// When the prices were last checked against the vendors
    pub updated: NaiveDate,
    #[serde(default)]
    pub providers: HashMap<String, HashMap<String, ModelPrice>>,
}

impl PriceTable {
    /// The embedded default table
    pub fn builtin() -> &'static PriceTable {
        &BUILTIN_TABLE
    }

    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let table = Self::from_toml_str(&content)?;
        debug!(path = %path.display(), updated = %table.updated, "loaded price table");
        Ok(table)
    }

    /// Find the price for a model
    ///
    /// Provider names are matched case-insensitively. Model names match exactly,
    /// otherwise the longest known name that prefixes `model` wins, so
    /// `gpt-4o-mini-2024-07-18` resolves to `gpt-4o-mini` rather than `gpt-4o`.
    pub fn lookup(&self, provider: &str, model: &str) -> Option<&ModelPrice> {
        let models = self.providers.get(&provider.to_lowercase())?;

        if let Some(price) = models.get(model) {
            return Some(price);
        }

        models
            .iter()
            .filter(|(known, _)| model.starts_with(known.as_str()))
            .max_by_key(|(known, _)| known.len())
            .map(|(_, price)| price)
    }

    /// Estimated USD cost, `0.0` when the provider or model is unknown
    pub fn estimate_cost(&self, provider: &str, model: &str, usage: &TokenUsage) -> f64 {
        self.lookup(provider, model)
            .map(|price| price.cost(usage))
            .unwrap_or(0.0)
    }
}

/// Estimate cost against the built-in table
pub fn estimate_cost(provider: &str, model: &str, usage: &TokenUsage) -> f64 {
    PriceTable::builtin().estimate_cost(provider, model, usage)
}

/// Human-readable cost; amounts under a tenth of a cent are shown in thousandths of a dollar
pub fn format_cost(usd: f64) -> String {
    if usd < 0.001 {
        format!("${:.4}m", usd * 1000.0)
    } else {
        format!("${usd:.4}")
    }
}
