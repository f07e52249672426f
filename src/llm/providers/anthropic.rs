//! Anthropic provider implementation
//!
//! Translates the neutral chat model to the Anthropic Messages API. System
//! messages move to the top-level `system` field and streamed text arrives as
//! `content_block_delta` events.

use crate::chat_span;
use crate::error::{LlmError, LlmResult, RequestFailure};
use crate::llm::client::RESERVED_FIELDS;
use crate::llm::provider::{
    CallDefaults, ChatMessage, ChatRequest, ChatResponse, LlmProvider, MessageRole, TextStream,
    TokenUsage,
};
use crate::llm::sse;
use async_trait::async_trait;
use futures::future;
use futures::stream::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::{debug, warn, Instrument};

pub const ANTHROPIC_PROVIDER: &str = "anthropic";

/// Anthropic provider configuration
#[derive(Debug, Clone)]
pub struct AnthropicConfig {
    pub api_key: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout: Duration,
    pub base_url: String,
    pub version: String,
}

impl Default for AnthropicConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: "claude-haiku-4-5-20251001".to_string(),
            temperature: 0.7,
            max_tokens: 2048,
            timeout: Duration::from_secs(30),
            base_url: "https://api.anthropic.com/v1".to_string(),
            version: "2023-06-01".to_string(),
        }
    }
}

/// Anthropic provider implementation
pub struct AnthropicProvider {
    api_key: String,
    base_url: String,
    version: String,
    defaults: CallDefaults,
    client: Client,
}

impl AnthropicProvider {
    /// Create a new Anthropic provider
    pub fn new(config: AnthropicConfig) -> LlmResult<Self> {
        let client = Client::builder()
            .connect_timeout(config.timeout)
            .read_timeout(config.timeout)
            .build()
            .map_err(|e| {
                LlmError::dependency_missing(
                    ANTHROPIC_PROVIDER,
                    format!("HTTP client could not be constructed: {e}"),
                )
            })?;

        Ok(Self {
            api_key: config.api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            version: config.version,
            defaults: CallDefaults {
                model: config.model,
                temperature: config.temperature,
                max_tokens: config.max_tokens,
            },
            client,
        })
    }

    /// Split neutral messages into the system prompt and the turn list
    fn convert_messages(messages: &[ChatMessage]) -> (Option<String>, Vec<AnthropicMessage>) {
        let mut system_parts = Vec::new();
        let mut anthropic_messages = Vec::new();

        for message in messages {
            match message.role {
                MessageRole::System => system_parts.push(message.content.as_str()),
                MessageRole::User | MessageRole::Assistant => {
                    anthropic_messages.push(AnthropicMessage {
                        role: message.role.as_str().to_string(),
                        content: message.content.clone(),
                    });
                }
            }
        }

        let system = (!system_parts.is_empty()).then(|| system_parts.join("\n\n"));
        (system, anthropic_messages)
    }

    fn build_request(&self, request: &ChatRequest, stream: bool) -> AnthropicRequest {
        let resolved = self.defaults.resolve(request);
        let (system, messages) = Self::convert_messages(&request.messages);

        let extra: Map<String, Value> = request
            .extra
            .iter()
            .filter(|(key, _)| {
                !RESERVED_FIELDS.contains(&key.as_str()) && key.as_str() != "system"
            })
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        AnthropicRequest {
            model: resolved.model,
            max_tokens: resolved.max_tokens,
            messages,
            system,
            temperature: resolved.temperature,
            stream,
            extra,
        }
    }

    fn convert_response(response: AnthropicResponse) -> ChatResponse {
        let content = response
            .content
            .into_iter()
            .filter(|block| block.content_type == "text")
            .filter_map(|block| block.text)
            .collect::<Vec<_>>()
            .join("");

        let usage = response
            .usage
            .map(|u| TokenUsage {
                prompt_tokens: u.input_tokens,
                completion_tokens: u.output_tokens,
                total_tokens: u.input_tokens.saturating_add(u.output_tokens),
            })
            .unwrap_or_default();

        ChatResponse {
            content,
            model: response.model,
            provider: ANTHROPIC_PROVIDER.to_string(),
            usage,
            finish_reason: response.stop_reason,
            raw: Map::new(),
        }
    }

    /// Text carried by one stream event, `Err` for vendor error events
    fn event_text(data: &str) -> Result<Option<String>, RequestFailure> {
        let event: AnthropicStreamEvent = serde_json::from_str(data)
            .map_err(|e| RequestFailure::InvalidResponse(e.to_string()))?;

        match event.event_type.as_str() {
            "content_block_delta" => Ok(event.delta.and_then(|d| d.text)),
            "error" => Err(RequestFailure::Stream(
                event
                    .error
                    .map(|e| e.to_string())
                    .unwrap_or_else(|| "unknown stream error".to_string()),
            )),
            _ => Ok(None),
        }
    }

    async fn send(&self, body: &AnthropicRequest) -> Result<reqwest::Response, RequestFailure> {
        let response = self
            .client
            .post(format!("{}/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", &self.version)
            .json(body)
            .send()
            .await
            .map_err(|e| RequestFailure::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RequestFailure::Api {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response)
    }
}

#[async_trait]
impl LlmProvider for AnthropicProvider {
    fn provider_name(&self) -> &str {
        ANTHROPIC_PROVIDER
    }

    fn default_model(&self) -> &str {
        &self.defaults.model
    }

    async fn chat(&self, request: ChatRequest) -> LlmResult<ChatResponse> {
        let body = self.build_request(&request, false);
        let span = chat_span!(provider = ANTHROPIC_PROVIDER, model = %body.model);

        async move {
            debug!(messages = body.messages.len(), "sending chat request");

            let result = match self.send(&body).await {
                Ok(response) => response
                    .json::<AnthropicResponse>()
                    .await
                    .map_err(|e| RequestFailure::InvalidResponse(e.to_string())),
                Err(e) => Err(e),
            };

            let response = result.map_err(|e| {
                warn!(error = %e, "chat request failed");
                LlmError::request_failed(ANTHROPIC_PROVIDER, e)
            })?;

            let response = Self::convert_response(response);
            debug!(
                prompt_tokens = response.usage.prompt_tokens,
                completion_tokens = response.usage.completion_tokens,
                finish_reason = ?response.finish_reason,
                "chat response received"
            );
            Ok(response)
        }
        .instrument(span)
        .await
    }

    async fn chat_stream(&self, request: ChatRequest) -> LlmResult<TextStream> {
        let body = self.build_request(&request, true);
        let span = chat_span!(provider = ANTHROPIC_PROVIDER, model = %body.model, stream = true);

        let response = async {
            debug!(messages = body.messages.len(), "opening chat stream");
            self.send(&body).await.map_err(|e| {
                warn!(error = %e, "chat stream request failed");
                LlmError::request_failed(ANTHROPIC_PROVIDER, e)
            })
        }
        .instrument(span)
        .await?;

        let deltas = sse::data_stream(response).filter_map(|item| {
            let delta = item.and_then(|data| Self::event_text(&data));
            future::ready(match delta {
                Ok(Some(text)) if !text.is_empty() => Some(Ok(text)),
                Ok(_) => None,
                Err(e) => Some(Err(LlmError::request_failed(ANTHROPIC_PROVIDER, e))),
            })
        });

        Ok(deltas.boxed())
    }
}

#[derive(Debug, Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<AnthropicMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    temperature: f32,
    stream: bool,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

#[derive(Debug, Serialize, Deserialize)]
struct AnthropicMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    #[serde(default)]
    content: Vec<AnthropicContent>,
    #[serde(default)]
    model: String,
    stop_reason: Option<String>,
    usage: Option<AnthropicUsage>,
}

#[derive(Debug, Deserialize)]
struct AnthropicContent {
    #[serde(rename = "type")]
    content_type: String,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AnthropicUsage {
    #[serde(default)]
    input_tokens: u32,
    #[serde(default)]
    output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct AnthropicStreamEvent {
    #[serde(rename = "type")]
    event_type: String,
    delta: Option<AnthropicDelta>,
    error: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct AnthropicDelta {
    text: Option<String>,
}
