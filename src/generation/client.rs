//! Model client trait and request types

use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::sync::mpsc;

/// Errors from generation operations.
///
/// Payloads are plain strings so errors can be cloned into scripted mocks
/// and relayed across task boundaries.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GenerationError {
    #[error("No files found in path: {0}")]
    NoDocuments(String),
    #[error("document error: {0}")]
    Document(String),
    #[error("model request failed: {0}")]
    Request(String),
    #[error("model API error (status {status}): {body}")]
    Api { status: u16, body: String },
    #[error("response parse error: {0}")]
    Parse(String),
    #[error("model returned no text")]
    EmptyResponse,
    #[error("stream error: {0}")]
    Stream(String),
    #[error("generation timed out after {0:?}")]
    Timeout(Duration),
}

impl From<reqwest::Error> for GenerationError {
    fn from(e: reqwest::Error) -> Self {
        GenerationError::Request(e.to_string())
    }
}

impl From<crate::documents::DocumentError> for GenerationError {
    fn from(e: crate::documents::DocumentError) -> Self {
        GenerationError::Document(e.to_string())
    }
}

/// Result type for generation operations
pub type GenerationResult<T> = Result<T, GenerationError>;

/// One piece of request content
#[derive(Debug, Clone, PartialEq)]
pub enum RequestPart {
    Text(String),
    /// Raw bytes, base64-encoded on the wire
    InlineData { mime_type: String, data: Vec<u8> },
}

impl RequestPart {
    pub fn text(text: impl Into<String>) -> Self {
        RequestPart::Text(text.into())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            RequestPart::Text(t) => Some(t),
            RequestPart::InlineData { .. } => None,
        }
    }
}

/// A single-turn generation request
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GenerateRequest {
    /// Overrides the client's default model
    pub model: Option<String>,
    pub parts: Vec<RequestPart>,
    /// Augment generation with web search results
    pub grounding: bool,
    pub temperature: Option<f32>,
    pub max_output_tokens: Option<u32>,
    /// Turn every harm-category filter off
    pub disable_safety_filters: bool,
}

impl GenerateRequest {
    pub fn new(parts: Vec<RequestPart>) -> Self {
        Self {
            parts,
            ..Self::default()
        }
    }

    /// A request consisting of one text prompt
    pub fn text(prompt: impl Into<String>) -> Self {
        Self::new(vec![RequestPart::text(prompt)])
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_grounding(mut self, grounding: bool) -> Self {
        self.grounding = grounding;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_output_tokens(mut self, max_output_tokens: u32) -> Self {
        self.max_output_tokens = Some(max_output_tokens);
        self
    }

    pub fn without_safety_filters(mut self) -> Self {
        self.disable_safety_filters = true;
        self
    }

    /// All text parts joined with newlines
    pub fn prompt_text(&self) -> String {
        self.parts
            .iter()
            .filter_map(RequestPart::as_text)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Ordered text chunks from a streaming generation.
///
/// Backed by a channel fed by a producer task; dropping the stream closes
/// the channel, which the producer observes as a signal to stop.
pub struct TextStream {
    rx: mpsc::Receiver<GenerationResult<String>>,
}

impl TextStream {
    pub fn new(rx: mpsc::Receiver<GenerationResult<String>>) -> Self {
        Self { rx }
    }

    /// A bounded channel whose receiving half is a `TextStream`
    pub fn channel(capacity: usize) -> (mpsc::Sender<GenerationResult<String>>, Self) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (tx, Self::new(rx))
    }

    /// A finished stream yielding exactly `items`
    pub fn from_items(items: Vec<GenerationResult<String>>) -> Self {
        let (tx, stream) = Self::channel(items.len());
        for item in items {
            // Capacity equals the item count, so this cannot fill up.
            let _ = tx.try_send(item);
        }
        stream
    }

    pub async fn next_chunk(&mut self) -> Option<GenerationResult<String>> {
        self.rx.recv().await
    }
}

impl Stream for TextStream {
    type Item = GenerationResult<String>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

/// Client for a generative text model.
///
/// Abstracts over transport (Gemini REST, mock) so the analysis and chat
/// services don't depend on how the model is reached.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Generate a complete response.
    async fn generate(&self, request: GenerateRequest) -> GenerationResult<String>;

    /// Generate a response as a stream of text chunks.
    ///
    /// Errors that happen after the stream has started arrive in-band as
    /// `Err` items.
    async fn generate_stream(&self, request: GenerateRequest) -> GenerationResult<TextStream>;
}
