//! Gemini REST client
//!
//! Talks to `models/{model}:generateContent` for complete responses and
//! `models/{model}:streamGenerateContent?alt=sse` for streaming. Streamed
//! events are decoded on a spawned task and relayed through a bounded
//! channel as a [`TextStream`].

use super::client::{GenerateRequest, GenerationError, GenerationResult, ModelClient, RequestPart, TextStream};
use super::types::{
    Blob, Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig, GoogleSearch,
    Part, SafetySetting, Tool,
};
use async_trait::async_trait;
use base64::Engine;
use eventsource_stream::Eventsource;
use futures::StreamExt;
use reqwest::Client;
use tokio::sync::mpsc;
use tracing::{debug, trace};

pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-2.5-pro";
pub const DEFAULT_STREAM_MODEL: &str = "gemini-2.5-flash";

const STREAM_BUFFER: usize = 64;

#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    stream_model: String,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: GEMINI_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            stream_model: DEFAULT_STREAM_MODEL.to_string(),
        }
    }

    /// Point the client at another endpoint (a proxy, or a mock server in tests)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Model used by `generate` when the request names none
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Model used by `generate_stream` when the request names none
    pub fn with_stream_model(mut self, model: impl Into<String>) -> Self {
        self.stream_model = model.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn stream_model(&self) -> &str {
        &self.stream_model
    }

    fn endpoint(&self, model: &str, method: &str) -> String {
        format!("{}/models/{}:{}", self.base_url, model, method)
    }

    fn build_body(request: &GenerateRequest) -> GenerateContentRequest {
        let b64 = base64::engine::general_purpose::STANDARD;
        let parts = request
            .parts
            .iter()
            .map(|part| match part {
                RequestPart::Text(text) => Part::Text { text: text.clone() },
                RequestPart::InlineData { mime_type, data } => Part::InlineData {
                    inline_data: Blob {
                        mime_type: mime_type.clone(),
                        data: b64.encode(data),
                    },
                },
            })
            .collect();

        let tools = if request.grounding {
            vec![Tool {
                google_search: GoogleSearch::default(),
            }]
        } else {
            Vec::new()
        };

        let safety_settings = if request.disable_safety_filters {
            SafetySetting::all_off()
        } else {
            Vec::new()
        };

        let generation_config = (request.temperature.is_some()
            || request.max_output_tokens.is_some())
        .then(|| GenerationConfig {
            temperature: request.temperature,
            max_output_tokens: request.max_output_tokens,
        });

        GenerateContentRequest {
            contents: vec![Content {
                role: "user".to_string(),
                parts,
            }],
            tools,
            safety_settings,
            generation_config,
        }
    }

    async fn post(
        &self,
        url: &str,
        body: &GenerateContentRequest,
    ) -> GenerationResult<reqwest::Response> {
        let res = self
            .client
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(body)
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(GenerationError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(res)
    }
}

#[async_trait]
impl ModelClient for GeminiClient {
    async fn generate(&self, request: GenerateRequest) -> GenerationResult<String> {
        let model = request.model.as_deref().unwrap_or(&self.model);
        let url = self.endpoint(model, "generateContent");
        debug!(
            model,
            parts = request.parts.len(),
            grounding = request.grounding,
            "calling generateContent"
        );

        let res = self.post(&url, &Self::build_body(&request)).await?;
        let raw = res.text().await?;
        let body: GenerateContentResponse =
            serde_json::from_str(&raw).map_err(|e| GenerationError::Parse(e.to_string()))?;

        let text = body.text().ok_or(GenerationError::EmptyResponse)?;
        debug!(chars = text.len(), "response generated");
        Ok(text)
    }

    async fn generate_stream(&self, request: GenerateRequest) -> GenerationResult<TextStream> {
        let model = request.model.as_deref().unwrap_or(&self.stream_model);
        let url = format!("{}?alt=sse", self.endpoint(model, "streamGenerateContent"));
        debug!(model, grounding = request.grounding, "calling streamGenerateContent");

        let res = self.post(&url, &Self::build_body(&request)).await?;
        let (tx, stream) = TextStream::channel(STREAM_BUFFER);
        tokio::spawn(relay_sse(res, tx));
        Ok(stream)
    }
}

/// Decode SSE events into text chunks until the upstream ends, fails, or
/// the receiver goes away.
async fn relay_sse(res: reqwest::Response, tx: mpsc::Sender<GenerationResult<String>>) {
    let mut events = Box::pin(res.bytes_stream().eventsource());

    loop {
        let next = tokio::select! {
            _ = tx.closed() => {
                debug!("stream receiver dropped, closing upstream");
                return;
            }
            next = events.next() => next,
        };

        let event = match next {
            Some(Ok(event)) => event,
            Some(Err(e)) => {
                let _ = tx.send(Err(GenerationError::Stream(e.to_string()))).await;
                return;
            }
            None => return,
        };

        trace!("SSE event: {}", event.data);
        if event.data.trim().is_empty() {
            continue;
        }

        let chunk: GenerateContentResponse = match serde_json::from_str(&event.data) {
            Ok(chunk) => chunk,
            Err(e) => {
                debug!("Failed to parse SSE event: {e}, data: {}", &event.data);
                continue;
            }
        };

        let Some(text) = chunk.text() else {
            continue;
        };
        if tx.send(Ok(text)).await.is_err() {
            return;
        }
    }
}
