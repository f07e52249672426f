//! Server-sent event framing for streaming completions
//!
//! Vendors push `data:` lines over a chunked HTTP body. [`SseDecoder`] turns raw
//! body chunks into data payloads, and [`data_stream`] wraps a response body in a
//! stream of those payloads. The stream owns the response, so dropping it closes
//! the connection.

use crate::error::RequestFailure;
use bytes::Bytes;
use futures::stream::{self, BoxStream, StreamExt};
use std::collections::VecDeque;

/// Incremental decoder for `text/event-stream` bodies
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    /// Feed one body chunk, returning the data payloads of every completed line
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);

        let mut payloads = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            if let Some(data) = Self::parse_line(&line) {
                payloads.push(data);
            }
        }
        payloads
    }

    /// Flush a trailing line that was not newline-terminated
    pub fn finish(&mut self) -> Option<String> {
        if self.buffer.is_empty() {
            return None;
        }
        let line = std::mem::take(&mut self.buffer);
        Self::parse_line(&line)
    }

    fn parse_line(line: &[u8]) -> Option<String> {
        let line = String::from_utf8_lossy(line);
        let line = line.trim_end_matches(['\n', '\r']);
        let data = line.strip_prefix("data:")?;
        Some(data.strip_prefix(' ').unwrap_or(data).to_string())
    }
}

struct DataStreamState {
    body: BoxStream<'static, reqwest::Result<Bytes>>,
    decoder: SseDecoder,
    pending: VecDeque<String>,
    finished: bool,
}

/// Stream the `data:` payloads of an event-stream response
pub fn data_stream(response: reqwest::Response) -> BoxStream<'static, Result<String, RequestFailure>> {
    let state = DataStreamState {
        body: response.bytes_stream().boxed(),
        decoder: SseDecoder::default(),
        pending: VecDeque::new(),
        finished: false,
    };

    stream::unfold(state, |mut state| async move {
        loop {
            if let Some(data) = state.pending.pop_front() {
                return Some((Ok(data), state));
            }
            if state.finished {
                return None;
            }
            match state.body.next().await {
                Some(Ok(chunk)) => {
                    let payloads = state.decoder.feed(&chunk);
                    state.pending.extend(payloads);
                }
                Some(Err(e)) => {
                    state.finished = true;
                    return Some((Err(RequestFailure::Stream(e.to_string())), state));
                }
                None => {
                    state.finished = true;
                    state.pending.extend(state.decoder.finish());
                }
            }
        }
    })
    .boxed()
}
