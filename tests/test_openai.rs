//! Integration tests for the OpenAI provider
//!
//! Tests behavioral contracts without testing implementation details:
//! - API request/response handling
//! - Error scenarios (rate limits, auth failures)
//! - Token usage tracking
//! - Streaming and concurrent use of one adapter

use futures::StreamExt;
use llm_core::error::{LlmError, RequestFailure};
use llm_core::llm::providers::openai::{OpenAiConfig, OpenAiProvider};
use llm_core::llm::{ChatMessage, ChatRequest, LlmProvider};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_config(base_url: &str) -> OpenAiConfig {
    OpenAiConfig {
        api_key: "test-api-key".to_string(),
        base_url: base_url.to_string(),
        timeout: Duration::from_secs(5),
        ..Default::default()
    }
}

fn test_request() -> ChatRequest {
    ChatRequest::new(vec![ChatMessage::user("Hello")])
}

fn completion_body() -> Value {
    json!({
        "id": "chatcmpl-123",
        "object": "chat.completion",
        "created": 1677652288,
        "model": "gpt-4o-mini-2024-07-18",
        "choices": [
            {
                "index": 0,
                "message": {
                    "role": "assistant",
                    "content": "Hello! How can I assist you today?"
                },
                "finish_reason": "stop"
            }
        ],
        "usage": {
            "prompt_tokens": 10,
            "completion_tokens": 15,
            "total_tokens": 25
        }
    })
}

#[tokio::test]
async fn test_openai_provider_returns_successful_completion_with_valid_response() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("Authorization", "Bearer test-api-key"))
        .and(body_partial_json(json!({"model": "gpt-4o-mini", "max_tokens": 2048})))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body()))
        .mount(&mock_server)
        .await;

    let provider = OpenAiProvider::new(test_config(&mock_server.uri())).unwrap();
    let response = provider.chat(test_request()).await.unwrap();

    assert_eq!(response.content, "Hello! How can I assist you today?");
    assert_eq!(response.model, "gpt-4o-mini-2024-07-18");
    assert_eq!(response.provider, "openai");
    assert_eq!(response.usage.prompt_tokens, 10);
    assert_eq!(response.usage.completion_tokens, 15);
    assert_eq!(response.usage.total_tokens, 25);
}

#[tokio::test]
async fn test_openai_respects_zero_temperature_and_request_model() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(json!({"model": "gpt-4o", "temperature": 0.0, "max_tokens": 64})))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let provider = OpenAiProvider::new(test_config(&mock_server.uri())).unwrap();
    let request = test_request()
        .with_model("gpt-4o")
        .with_temperature(0.0)
        .with_max_tokens(64);

    assert!(provider.chat(request).await.is_ok());
}

#[tokio::test]
async fn test_openai_base_url_with_trailing_slash() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let base_url = format!("{}/", mock_server.uri());
    let provider = OpenAiProvider::new(test_config(&base_url)).unwrap();
    assert!(provider.chat(test_request()).await.is_ok());
}

#[tokio::test]
async fn test_openai_provider_handles_rate_limit_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({
            "error": {"message": "Rate limit exceeded", "type": "rate_limit_error"}
        })))
        .mount(&mock_server)
        .await;

    let provider = OpenAiProvider::new(test_config(&mock_server.uri())).unwrap();
    let result = provider.chat(test_request()).await;

    match result {
        Err(LlmError::ProviderRequestFailed {
            provider,
            source: RequestFailure::Api { status, body },
        }) => {
            assert_eq!(provider, "openai");
            assert_eq!(status, 429);
            assert!(body.contains("Rate limit exceeded"));
        }
        other => panic!("Expected ProviderRequestFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn test_openai_empty_choices_is_invalid_response() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"model": "gpt-4o", "choices": []})),
        )
        .mount(&mock_server)
        .await;

    let provider = OpenAiProvider::new(test_config(&mock_server.uri())).unwrap();
    let result = provider.chat(test_request()).await;

    assert!(matches!(
        result,
        Err(LlmError::ProviderRequestFailed {
            source: RequestFailure::InvalidResponse(_),
            ..
        })
    ));
}

#[tokio::test]
async fn test_openai_stream_concatenates_to_full_text() {
    let mock_server = MockServer::start().await;

    let sse_body = concat!(
        "data: {\"choices\":[{\"delta\":{\"content\":\"The \"}}]}\n\n",
        "data: {\"choices\":[{\"delta\":{\"content\":\"answer \"}}]}\n\n",
        "data: {\"choices\":[{\"delta\":{\"content\":\"is 42.\"}}]}\n\n",
        "data: {\"choices\":[{\"delta\":{},\"finish_reason\":\"stop\"}]}\n\n",
        "data: [DONE]\n\n",
    );

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(json!({"stream": true})))
        .respond_with(ResponseTemplate::new(200).set_body_string(sse_body))
        .mount(&mock_server)
        .await;

    let provider = OpenAiProvider::new(test_config(&mock_server.uri())).unwrap();
    let text: String = provider
        .chat_stream(test_request())
        .await
        .unwrap()
        .map(|item| item.unwrap())
        .collect::<Vec<_>>()
        .await
        .concat();

    assert_eq!(text, "The answer is 42.");
}

#[tokio::test]
async fn test_openai_stream_malformed_chunk_surfaces_error() {
    let mock_server = MockServer::start().await;

    let sse_body = concat!(
        "data: {\"choices\":[{\"delta\":{\"content\":\"ok\"}}]}\n\n",
        "data: {not json\n\n",
    );

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_string(sse_body))
        .mount(&mock_server)
        .await;

    let provider = OpenAiProvider::new(test_config(&mock_server.uri())).unwrap();
    let items: Vec<_> = provider
        .chat_stream(test_request())
        .await
        .unwrap()
        .collect()
        .await;

    assert_eq!(items.len(), 2);
    assert_eq!(items[0].as_ref().unwrap(), "ok");
    assert!(matches!(
        items[1],
        Err(LlmError::ProviderRequestFailed {
            source: RequestFailure::InvalidResponse(_),
            ..
        })
    ));
}

#[tokio::test]
async fn test_openai_adapter_serves_concurrent_calls() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body()))
        .expect(8)
        .mount(&mock_server)
        .await;

    let provider = Arc::new(OpenAiProvider::new(test_config(&mock_server.uri())).unwrap());

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let provider = Arc::clone(&provider);
            tokio::spawn(async move {
                provider
                    .chat(ChatRequest::new(vec![ChatMessage::user(format!("question {i}"))]))
                    .await
            })
        })
        .collect();

    for handle in handles {
        let response = handle.await.unwrap().unwrap();
        assert_eq!(response.provider, "openai");
    }
}
