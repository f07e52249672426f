//! Mock implementations for testing
//!
//! [`MockCompletionClient`] stands in for a chat-completions vendor so adapters
//! can be exercised without network access.

use crate::error::RequestFailure;
use crate::llm::client::{
    ChoiceMessage, ChunkChoice, ChunkDelta, ChunkStream, CompletionChoice, CompletionChunk,
    CompletionClient, CompletionParams, CompletionPayload, UsagePayload,
};
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

type ScriptedStream = Result<Vec<Result<CompletionChunk, RequestFailure>>, RequestFailure>;

/// Scriptable vendor client that records every request it receives
///
/// Scripted results are consumed in order; once a queue is empty the client
/// answers with a canned `"mock response"`. Clones share state, so a test can
/// keep a handle after moving the client into an adapter.
#[derive(Debug, Clone, Default)]
pub struct MockCompletionClient {
    completions: Arc<Mutex<VecDeque<Result<CompletionPayload, RequestFailure>>>>,
    streams: Arc<Mutex<VecDeque<ScriptedStream>>>,
    received: Arc<Mutex<Vec<CompletionParams>>>,
}

fn locked<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MockCompletionClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a complete payload for the next `create_completion`
    pub fn with_response(self, payload: CompletionPayload) -> Self {
        locked(&self.completions).push_back(Ok(payload));
        self
    }

    /// Queue a failure for the next `create_completion`
    pub fn with_failure(self, failure: RequestFailure) -> Self {
        locked(&self.completions).push_back(Err(failure));
        self
    }

    /// Queue chunk texts for the next `create_completion_stream`
    pub fn with_stream_texts(self, texts: &[&str]) -> Self {
        let chunks = texts.iter().map(|text| Ok(text_chunk(text))).collect();
        locked(&self.streams).push_back(Ok(chunks));
        self
    }

    /// Queue raw chunk results, including mid-stream failures
    pub fn with_stream(self, chunks: Vec<Result<CompletionChunk, RequestFailure>>) -> Self {
        locked(&self.streams).push_back(Ok(chunks));
        self
    }

    /// Queue a failure for the next `create_completion_stream`
    pub fn with_stream_failure(self, failure: RequestFailure) -> Self {
        locked(&self.streams).push_back(Err(failure));
        self
    }

    /// Every request received so far, in order
    pub fn received_params(&self) -> Vec<CompletionParams> {
        locked(&self.received).clone()
    }

    pub fn last_params(&self) -> Option<CompletionParams> {
        locked(&self.received).last().cloned()
    }

    pub fn clear_history(&self) {
        locked(&self.received).clear();
    }
}

/// Payload with one choice holding `content` and fixed usage of 10/5/15
pub fn text_response(content: &str, model: &str) -> CompletionPayload {
    CompletionPayload {
        model: model.to_string(),
        choices: vec![CompletionChoice {
            message: ChoiceMessage {
                content: Some(content.to_string()),
            },
            finish_reason: Some("stop".to_string()),
        }],
        usage: Some(UsagePayload {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        }),
    }
}

/// Streamed chunk whose first choice carries `text`
pub fn text_chunk(text: &str) -> CompletionChunk {
    CompletionChunk {
        choices: vec![ChunkChoice {
            delta: ChunkDelta {
                content: Some(text.to_string()),
            },
        }],
    }
}

#[async_trait]
impl CompletionClient for MockCompletionClient {
    async fn create_completion(
        &self,
        params: &CompletionParams,
    ) -> Result<CompletionPayload, RequestFailure> {
        locked(&self.received).push(params.clone());

        locked(&self.completions)
            .pop_front()
            .unwrap_or_else(|| Ok(text_response("mock response", &params.model)))
    }

    async fn create_completion_stream(
        &self,
        params: &CompletionParams,
    ) -> Result<ChunkStream, RequestFailure> {
        locked(&self.received).push(params.clone());

        let chunks = locked(&self.streams)
            .pop_front()
            .unwrap_or_else(|| Ok(vec![Ok(text_chunk("mock ")), Ok(text_chunk("response"))]))?;

        Ok(stream::iter(chunks).boxed())
    }
}
