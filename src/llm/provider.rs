//! LLM provider abstraction and trait definitions
//!
//! This module defines the neutral request/response types shared by every
//! provider adapter, and the [`LlmProvider`] trait the adapters implement.

use crate::error::LlmResult;
use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// A single message in a conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system<S: Into<String>>(content: S) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user<S: Into<String>>(content: S) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn assistant<S: Into<String>>(content: S) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

/// Message roles in a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::System => "system",
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }
}

/// Provider-agnostic chat request
///
/// `None` always means "not set by the caller"; adapters fall back to their
/// configured defaults only in that case, so `temperature: Some(0.0)` is honored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default)]
    pub max_tokens: Option<u32>,
    #[serde(default)]
    pub stream: bool,
    /// Extra vendor fields, forwarded verbatim into the request body
    #[serde(default)]
    pub extra: HashMap<String, Value>,
}

impl ChatRequest {
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            ..Default::default()
        }
    }

    pub fn with_model<S: Into<String>>(mut self, model: S) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_extra<K: Into<String>>(mut self, key: K, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }
}

/// Token usage statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Provider-agnostic chat response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub content: String,
    /// Model name as reported by the vendor
    pub model: String,
    /// Always the adapter's own provider name
    pub provider: String,
    #[serde(default)]
    pub usage: TokenUsage,
    pub finish_reason: Option<String>,
    #[serde(default)]
    pub raw: Map<String, Value>,
}

/// Lazy sequence of text deltas produced by [`LlmProvider::chat_stream`]
///
/// Dropping the stream closes the underlying vendor connection.
pub type TextStream = BoxStream<'static, LlmResult<String>>;

/// Construction-time call defaults shared by every adapter
#[derive(Debug, Clone, PartialEq)]
pub struct CallDefaults {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Call parameters after request values and adapter defaults are merged
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedParams {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl CallDefaults {
    /// Merge a request over these defaults
    ///
    /// Temperature falls back only when unset. Max tokens also falls back when
    /// the request asks for zero tokens.
    pub fn resolve(&self, request: &ChatRequest) -> ResolvedParams {
        ResolvedParams {
            model: request
                .model
                .clone()
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| self.model.clone()),
            temperature: request.temperature.unwrap_or(self.temperature),
            max_tokens: request
                .max_tokens
                .filter(|&n| n > 0)
                .unwrap_or(self.max_tokens),
        }
    }
}

/// LLM provider trait for dependency injection and testing
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Get the provider name (e.g., "groq", "openai")
    fn provider_name(&self) -> &str;

    /// Get the model used when a request does not name one
    fn default_model(&self) -> &str;

    /// Send a chat request and return the complete response
    async fn chat(&self, request: ChatRequest) -> LlmResult<ChatResponse>;

    /// Send a chat request and stream the response text
    async fn chat_stream(&self, request: ChatRequest) -> LlmResult<TextStream>;
}
