//! Chat-completions vendor client
//!
//! [`CompletionClient`] is the narrow surface adapters depend on: one call that
//! returns a complete payload and one that returns a stream of chunks. The
//! payload types follow the chat-completions wire format shared by OpenAI, Groq
//! and most compatible vendors. [`HttpCompletionClient`] is the reqwest-backed
//! implementation; tests substitute [`crate::testing::MockCompletionClient`].

use crate::error::RequestFailure;
use crate::llm::sse;
use async_trait::async_trait;
use futures::future;
use futures::stream::{BoxStream, StreamExt};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::warn;

/// Top-level request fields owned by the adapter; `extra` may not override them
pub const RESERVED_FIELDS: &[&str] = &["model", "messages", "temperature", "max_tokens", "stream"];

/// Stream end marker sent by chat-completions vendors
const DONE_MARKER: &str = "[DONE]";

/// Request body for a chat completion
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionParams {
    pub model: String,
    pub messages: Vec<WireMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
    pub stream: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Role/content pair in vendor format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireMessage {
    pub role: String,
    pub content: String,
}

/// Complete (non-streaming) vendor response
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompletionPayload {
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub choices: Vec<CompletionChoice>,
    #[serde(default)]
    pub usage: Option<UsagePayload>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompletionChoice {
    #[serde(default)]
    pub message: ChoiceMessage,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChoiceMessage {
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct UsagePayload {
    #[serde(default)]
    pub prompt_tokens: u32,
    #[serde(default)]
    pub completion_tokens: u32,
    #[serde(default)]
    pub total_tokens: u32,
}

/// One streamed chunk
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompletionChunk {
    #[serde(default)]
    pub choices: Vec<ChunkChoice>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChunkChoice {
    #[serde(default)]
    pub delta: ChunkDelta,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChunkDelta {
    #[serde(default)]
    pub content: Option<String>,
}

impl CompletionChunk {
    /// Text carried by the first choice, if any
    pub fn text(&self) -> Option<&str> {
        self.choices.first()?.delta.content.as_deref()
    }
}

pub type ChunkStream = BoxStream<'static, Result<CompletionChunk, RequestFailure>>;

/// Vendor client collaborator used by the chat-completions adapters
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Run one completion and return the full payload
    async fn create_completion(
        &self,
        params: &CompletionParams,
    ) -> Result<CompletionPayload, RequestFailure>;

    /// Run one completion and return its chunks as they arrive
    async fn create_completion_stream(
        &self,
        params: &CompletionParams,
    ) -> Result<ChunkStream, RequestFailure>;
}

/// reqwest-backed chat-completions client
#[derive(Debug, Clone)]
pub struct HttpCompletionClient {
    api_key: String,
    base_url: String,
    http: Client,
}

impl HttpCompletionClient {
    /// Build a client; the timeout bounds connecting and each read, so a
    /// stream that keeps delivering data may outlive it
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let http = Client::builder()
            .connect_timeout(timeout)
            .read_timeout(timeout)
            .build()?;
        Ok(Self {
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send the request and reject non-success statuses
    async fn send(&self, params: &CompletionParams) -> Result<reqwest::Response, RequestFailure> {
        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(params)
            .send()
            .await
            .map_err(|e| {
                RequestFailure::Network(format!(
                    "HTTP request failed: {} (is_connect: {}, is_timeout: {})",
                    e,
                    e.is_connect(),
                    e.is_timeout()
                ))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "chat completion rejected by vendor");
            return Err(RequestFailure::Api {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response)
    }
}

#[async_trait]
impl CompletionClient for HttpCompletionClient {
    async fn create_completion(
        &self,
        params: &CompletionParams,
    ) -> Result<CompletionPayload, RequestFailure> {
        self.send(params)
            .await?
            .json()
            .await
            .map_err(|e| RequestFailure::InvalidResponse(e.to_string()))
    }

    async fn create_completion_stream(
        &self,
        params: &CompletionParams,
    ) -> Result<ChunkStream, RequestFailure> {
        let response = self.send(params).await?;

        let chunks = sse::data_stream(response)
            .take_while(|item| {
                future::ready(!matches!(item, Ok(data) if data.trim() == DONE_MARKER))
            })
            .map(|item| {
                item.and_then(|data| {
                    serde_json::from_str::<CompletionChunk>(&data)
                        .map_err(|e| RequestFailure::InvalidResponse(e.to_string()))
                })
            });

        Ok(chunks.boxed())
    }
}
