//! llm-core - provider-neutral LLM chat layer
//!
//! One request/response model for chat completions across vendors, plus the
//! small utilities every caller ends up needing around it.
//!
//! # Overview
//!
//! - A neutral data model ([`ChatMessage`], [`ChatRequest`], [`ChatResponse`])
//! - Adapters for Groq, OpenAI and Anthropic behind the [`LlmProvider`] trait
//! - A factory that builds an adapter from a provider name
//! - JSON extraction from model text, output sanitization and cost estimates
//! - TOML configuration with API keys read from the environment
//!
//! # Quick Start
//!
//! ```rust
//! use llm_core::output::{estimate_cost, extract_json, format_cost};
//! use llm_core::{create_provider, ChatMessage, ChatRequest, LlmProvider, ProviderOptions, TokenUsage};
//! use serde_json::json;
//!
//! let provider = create_provider("groq", "gsk-test", ProviderOptions::default()).unwrap();
//! assert_eq!(provider.provider_name(), "groq");
//!
//! let request = ChatRequest::new(vec![
//!     ChatMessage::system("Answer in JSON."),
//!     ChatMessage::user("List three colors."),
//! ])
//! .with_temperature(0.0);
//! assert_eq!(request.temperature, Some(0.0));
//!
//! let value = extract_json("```json\n{\"colors\": [\"red\"]}\n```").unwrap();
//! assert_eq!(value, json!({"colors": ["red"]}));
//!
//! let usage = TokenUsage { prompt_tokens: 1_000, completion_tokens: 500, total_tokens: 1_500 };
//! let cost = estimate_cost("groq", "llama-3.3-70b-versatile", &usage);
//! assert!(format_cost(cost).starts_with('$'));
//! ```

pub mod config;
pub mod error;
pub mod llm;
pub mod observability;
pub mod output;
pub mod testing;

pub use config::{ConfigError, CoreConfig};
pub use error::{LlmError, LlmResult, RequestFailure};
pub use llm::{
    create_provider, ChatMessage, ChatRequest, ChatResponse, LlmProvider, MessageRole,
    ProviderKind, ProviderOptions, TextStream, TokenUsage,
};
