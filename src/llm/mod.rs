//! LLM provider abstraction layer
//!
//! This module provides a provider-agnostic interface for chat completions
//! with adapters for Groq, OpenAI and Anthropic, and a factory that picks one
//! by name.

pub mod client;
pub mod factory;
pub mod provider;
pub mod providers;
pub mod sse;

pub use client::{CompletionClient, HttpCompletionClient};
pub use factory::{create_provider, ProviderKind, ProviderOptions};
pub use provider::*;
pub use providers::*;
