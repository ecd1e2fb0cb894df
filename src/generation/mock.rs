//! Mock model client for testing: returns preconfigured responses.

use super::client::{GenerateRequest, GenerationError, GenerationResult, ModelClient, TextStream};
use async_trait::async_trait;
use std::sync::Mutex;

/// Scripted [`ModelClient`] that records every request it receives.
pub struct MockModelClient {
    response: GenerationResult<String>,
    stream: GenerationResult<Vec<GenerationResult<String>>>,
    requests: Mutex<Vec<GenerateRequest>>,
}

impl Default for MockModelClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MockModelClient {
    /// A client with nothing scripted: `generate` fails with an empty
    /// response and streams end immediately.
    pub fn new() -> Self {
        Self {
            response: Err(GenerationError::EmptyResponse),
            stream: Ok(Vec::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Respond to `generate` with `text`.
    pub fn with_response(mut self, text: impl Into<String>) -> Self {
        self.response = Ok(text.into());
        self
    }

    /// Fail `generate` with `error`.
    pub fn with_failure(mut self, error: GenerationError) -> Self {
        self.response = Err(error);
        self
    }

    /// Stream these chunks, in order, then end.
    pub fn with_stream_chunks<S: Into<String>>(mut self, chunks: impl IntoIterator<Item = S>) -> Self {
        self.stream = Ok(chunks.into_iter().map(|c| Ok(c.into())).collect());
        self
    }

    /// Stream these items, errors included, in order.
    pub fn with_stream_items(mut self, items: Vec<GenerationResult<String>>) -> Self {
        self.stream = Ok(items);
        self
    }

    /// Fail `generate_stream` before any chunk is produced.
    pub fn with_stream_failure(mut self, error: GenerationError) -> Self {
        self.stream = Err(error);
        self
    }

    /// Requests received so far, in call order
    pub fn requests(&self) -> Vec<GenerateRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    fn record(&self, request: GenerateRequest) {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(request);
    }
}

#[async_trait]
impl ModelClient for MockModelClient {
    async fn generate(&self, request: GenerateRequest) -> GenerationResult<String> {
        self.record(request);
        self.response.clone()
    }

    async fn generate_stream(&self, request: GenerateRequest) -> GenerationResult<TextStream> {
        self.record(request);
        self.stream.clone().map(TextStream::from_items)
    }
}
