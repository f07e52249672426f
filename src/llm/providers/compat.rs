//! Shared adapter for chat-completions vendors
//!
//! Groq and OpenAI speak the same wire format, so both adapters delegate to
//! [`ChatCompletionsAdapter`] and differ only in name and defaults. The
//! `chat_completions_provider!` macro generates each vendor's config and provider types from those defaults.

use crate::chat_span;
use crate::error::{LlmError, LlmResult};
use crate::llm::client::{CompletionClient, CompletionParams, CompletionPayload, WireMessage, RESERVED_FIELDS};
use crate::llm::provider::{CallDefaults, ChatMessage, ChatRequest, ChatResponse, TextStream, TokenUsage};
use futures::future;
use futures::stream::StreamExt;
use serde_json::Map;
use tracing::{debug, warn, Instrument};

/// Declare a vendor config and provider over [`ChatCompletionsAdapter`]
macro_rules! chat_completions_provider {
    (
        $(#[$config_meta:meta])*
        config $config:ident;
        $(#[$provider_meta:meta])*
        provider $provider:ident;
        name = $name:expr,
        model = $model:expr,
        temperature = $temperature:expr,
        base_url = $base_url:expr $(,)?
    ) => {
        $(#[$config_meta])*
        #[derive(Debug, Clone)]
        pub struct $config {
            pub api_key: String,
            pub model: String,
            pub temperature: f32,
            pub max_tokens: u32,
            pub timeout: ::std::time::Duration,
            pub base_url: String,
        }

        impl Default for $config {
            fn default() -> Self {
                Self {
                    api_key: String::new(),
                    model: $model.to_string(),
                    temperature: $temperature,
                    max_tokens: 2048,
                    timeout: ::std::time::Duration::from_secs(30),
                    base_url: $base_url.to_string(),
                }
            }
        }

        $(#[$provider_meta])*
        pub struct $provider<C = $crate::llm::client::HttpCompletionClient> {
            adapter: $crate::llm::providers::compat::ChatCompletionsAdapter<C>,
        }

        impl $provider {
            /// Create a provider backed by the HTTP client
            pub fn new(config: $config) -> $crate::error::LlmResult<Self> {
                let client = $crate::llm::client::HttpCompletionClient::new(
                    &config.api_key,
                    &config.base_url,
                    config.timeout,
                )
                .map_err(|e| {
                    $crate::error::LlmError::dependency_missing(
                        $name,
                        format!("HTTP client could not be constructed: {e}"),
                    )
                })?;

                Ok(Self::with_client(
                    client,
                    $crate::llm::provider::CallDefaults {
                        model: config.model,
                        temperature: config.temperature,
                        max_tokens: config.max_tokens,
                    },
                ))
            }
        }

        impl<C: $crate::llm::client::CompletionClient> $provider<C> {
            /// Create a provider over any chat-completions client
            pub fn with_client(client: C, defaults: $crate::llm::provider::CallDefaults) -> Self {
                Self {
                    adapter: $crate::llm::providers::compat::ChatCompletionsAdapter::new(
                        $name, defaults, client,
                    ),
                }
            }

            pub fn client(&self) -> &C {
                self.adapter.client()
            }
        }

        #[::async_trait::async_trait]
        impl<C: $crate::llm::client::CompletionClient> $crate::llm::provider::LlmProvider
            for $provider<C>
        {
            fn provider_name(&self) -> &str {
                self.adapter.provider_name()
            }

            fn default_model(&self) -> &str {
                self.adapter.default_model()
            }

            async fn chat(
                &self,
                request: $crate::llm::provider::ChatRequest,
            ) -> $crate::error::LlmResult<$crate::llm::provider::ChatResponse> {
                self.adapter.chat(request).await
            }

            async fn chat_stream(
                &self,
                request: $crate::llm::provider::ChatRequest,
            ) -> $crate::error::LlmResult<$crate::llm::provider::TextStream> {
                self.adapter.chat_stream(request).await
            }
        }
    };
}

#[allow(unused_imports)]
pub(crate) use chat_completions_provider;

/// Translation between the neutral model and a chat-completions client
pub struct ChatCompletionsAdapter<C> {
    provider_name: &'static str,
    defaults: CallDefaults,
    client: C,
}

impl<C: CompletionClient> ChatCompletionsAdapter<C> {
    pub fn new(provider_name: &'static str, defaults: CallDefaults, client: C) -> Self {
        Self {
            provider_name,
            defaults,
            client,
        }
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider_name
    }

    pub fn default_model(&self) -> &str {
        &self.defaults.model
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Convert neutral messages to vendor format (pure function)
    pub fn convert_messages(messages: &[ChatMessage]) -> Vec<WireMessage> {
        messages
            .iter()
            .map(|m| WireMessage {
                role: m.role.as_str().to_string(),
                content: m.content.clone(),
            })
            .collect()
    }

    /// Build the vendor request for a neutral request (pure function)
    pub fn build_params(&self, request: &ChatRequest, stream: bool) -> CompletionParams {
        let resolved = self.defaults.resolve(request);

        let extra: Map<String, serde_json::Value> = request
            .extra
            .iter()
            .filter(|(key, _)| !RESERVED_FIELDS.contains(&key.as_str()))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        CompletionParams {
            model: resolved.model,
            messages: Self::convert_messages(&request.messages),
            temperature: resolved.temperature,
            max_tokens: resolved.max_tokens,
            stream,
            extra,
        }
    }

    /// Map a vendor payload to a neutral response (pure function)
    pub fn convert_response(&self, payload: CompletionPayload) -> LlmResult<ChatResponse> {
        let choice = payload.choices.into_iter().next().ok_or_else(|| {
            LlmError::request_failed(
                self.provider_name,
                crate::error::RequestFailure::InvalidResponse(format!(
                    "No choices returned from {}",
                    self.provider_name
                )),
            )
        })?;

        let usage = payload
            .usage
            .map(|u| TokenUsage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            })
            .unwrap_or_default();

        Ok(ChatResponse {
            content: choice.message.content.unwrap_or_default(),
            model: payload.model,
            provider: self.provider_name.to_string(),
            usage,
            finish_reason: choice.finish_reason,
            raw: Map::new(),
        })
    }

    pub async fn chat(&self, request: ChatRequest) -> LlmResult<ChatResponse> {
        let params = self.build_params(&request, false);
        let span = chat_span!(provider = self.provider_name, model = %params.model);

        async move {
            debug!(
                messages = params.messages.len(),
                temperature = params.temperature,
                max_tokens = params.max_tokens,
                "sending chat request"
            );

            let payload = self.client.create_completion(&params).await.map_err(|e| {
                warn!(error = %e, "chat request failed");
                LlmError::request_failed(self.provider_name, e)
            })?;

            let response = self.convert_response(payload)?;
            debug!(
                prompt_tokens = response.usage.prompt_tokens,
                completion_tokens = response.usage.completion_tokens,
                total_tokens = response.usage.total_tokens,
                finish_reason = ?response.finish_reason,
                "chat response received"
            );
            Ok(response)
        }
        .instrument(span)
        .await
    }

    pub async fn chat_stream(&self, request: ChatRequest) -> LlmResult<TextStream> {
        let params = self.build_params(&request, true);
        let provider = self.provider_name;
        let span = chat_span!(provider = provider, model = %params.model, stream = true);

        let chunks = async {
            debug!(messages = params.messages.len(), "opening chat stream");
            self.client
                .create_completion_stream(&params)
                .await
                .map_err(|e| {
                    warn!(error = %e, "chat stream request failed");
                    LlmError::request_failed(provider, e)
                })
        }
        .instrument(span)
        .await?;

        let deltas = chunks.filter_map(move |item| {
            future::ready(match item {
                Ok(chunk) => chunk
                    .text()
                    .filter(|text| !text.is_empty())
                    .map(|text| Ok(text.to_string())),
                Err(e) => Some(Err(LlmError::request_failed(provider, e))),
            })
        });

        Ok(deltas.boxed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RequestFailure;
    use crate::llm::client::{ChoiceMessage, CompletionChoice, UsagePayload};
    use crate::llm::provider::MessageRole;
    use crate::testing::MockCompletionClient;
    use serde_json::json;

    fn adapter() -> ChatCompletionsAdapter<MockCompletionClient> {
        ChatCompletionsAdapter::new(
            "groq",
            CallDefaults {
                model: "llama-3.3-70b-versatile".to_string(),
                temperature: 0.3,
                max_tokens: 2048,
            },
            MockCompletionClient::new(),
        )
    }

    #[test]
    fn test_convert_messages_preserves_order_and_roles() {
        let messages = vec![
            ChatMessage::system("Be brief."),
            ChatMessage::user("Hi"),
            ChatMessage::assistant("Hello"),
            ChatMessage::user("Bye"),
        ];

        let wire = ChatCompletionsAdapter::<MockCompletionClient>::convert_messages(&messages);
        let roles: Vec<&str> = wire.iter().map(|m| m.role.as_str()).collect();
        assert_eq!(roles, vec!["system", "user", "assistant", "user"]);
        assert_eq!(wire[3].content, "Bye");
        assert_eq!(messages[0].role, MessageRole::System);
    }

    #[test]
    fn test_build_params_drops_reserved_extra_fields() {
        let request = ChatRequest::new(vec![ChatMessage::user("Hi")])
            .with_extra("model", json!("sneaky"))
            .with_extra("stream", json!(true))
            .with_extra("seed", json!(42));

        let params = adapter().build_params(&request, false);
        assert_eq!(params.model, "llama-3.3-70b-versatile");
        assert!(!params.stream);
        assert_eq!(params.extra.len(), 1);
        assert_eq!(params.extra["seed"], 42);
    }

    #[test]
    fn test_convert_response_forces_provider_and_defaults_usage() {
        let payload = CompletionPayload {
            model: "vendor-model".to_string(),
            choices: vec![CompletionChoice {
                message: ChoiceMessage { content: None },
                finish_reason: Some("length".to_string()),
            }],
            usage: None,
        };

        let response = adapter().convert_response(payload).unwrap();
        assert_eq!(response.provider, "groq");
        assert_eq!(response.model, "vendor-model");
        assert_eq!(response.content, "");
        assert_eq!(response.usage, TokenUsage::default());
        assert_eq!(response.finish_reason.as_deref(), Some("length"));
        assert!(response.raw.is_empty());
    }

    #[test]
    fn test_convert_response_trusts_vendor_total() {
        let payload = CompletionPayload {
            model: "m".to_string(),
            choices: vec![CompletionChoice::default()],
            usage: Some(UsagePayload {
                prompt_tokens: 3,
                completion_tokens: 4,
                total_tokens: 100,
            }),
        };

        let response = adapter().convert_response(payload).unwrap();
        assert_eq!(response.usage.total_tokens, 100);
    }

    #[test]
    fn test_convert_response_without_choices_fails() {
        let result = adapter().convert_response(CompletionPayload::default());
        assert!(matches!(
            result,
            Err(LlmError::ProviderRequestFailed {
                source: RequestFailure::InvalidResponse(_),
                ..
            })
        ));
    }
}
