//! Document-grounded generation
//!
//! [`ContentGenerator`] is what the analysis orchestrator calls: given a
//! path identifier and a prompt it returns the model's raw text together
//! with the documents that went into the request.

use super::client::{GenerateRequest, GenerationError, GenerationResult, ModelClient, RequestPart};
use crate::documents::{extract_docx_text, DocumentInfo, DocumentSource};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Low temperature for factual analysis
pub const ANALYSIS_TEMPERATURE: f32 = 0.3;
pub const ANALYSIS_MAX_OUTPUT_TOKENS: u32 = 65535;

/// Raw output of one generation over a document bundle
#[derive(Debug, Clone, PartialEq)]
pub struct Generation {
    pub content: String,
    /// Documents included in the request, in request order
    pub files: Vec<DocumentInfo>,
}

impl Generation {
    pub fn files_processed(&self) -> usize {
        self.files.len()
    }
}

#[async_trait]
pub trait ContentGenerator: Send + Sync {
    /// Generate from every document under `path_id` plus `prompt`.
    ///
    /// An empty bundle is an error, reported as
    /// [`GenerationError::NoDocuments`].
    async fn generate(
        &self,
        path_id: &str,
        prompt: &str,
        grounding: bool,
    ) -> GenerationResult<Generation>;
}

/// Sends a bundle's documents and a prompt to a [`ModelClient`] in one request.
pub struct DocumentGenerator {
    documents: Arc<dyn DocumentSource>,
    model: Arc<dyn ModelClient>,
    temperature: f32,
    max_output_tokens: u32,
}

impl DocumentGenerator {
    pub fn new(documents: Arc<dyn DocumentSource>, model: Arc<dyn ModelClient>) -> Self {
        Self {
            documents,
            model,
            temperature: ANALYSIS_TEMPERATURE,
            max_output_tokens: ANALYSIS_MAX_OUTPUT_TOKENS,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_output_tokens(mut self, max_output_tokens: u32) -> Self {
        self.max_output_tokens = max_output_tokens;
        self
    }

    /// `.docx` files travel as extracted text, everything else as inline
    /// bytes. A docx that cannot be read is sent as bytes instead.
    async fn document_part(&self, doc: &DocumentInfo) -> GenerationResult<RequestPart> {
        let bytes = self.documents.load(doc).await?;

        if doc.is_docx() {
            match extract_docx_text(&bytes) {
                Ok(text) => {
                    debug!(file = %doc.filename, "added extracted docx text");
                    return Ok(RequestPart::Text(text));
                }
                Err(e) => {
                    warn!(file = %doc.filename, error = %e, "docx extraction failed, sending raw bytes");
                }
            }
        }

        debug!(file = %doc.filename, mime_type = %doc.mime_type, "added file");
        Ok(RequestPart::InlineData {
            mime_type: doc.mime_type.clone(),
            data: bytes,
        })
    }
}

#[async_trait]
impl ContentGenerator for DocumentGenerator {
    async fn generate(
        &self,
        path_id: &str,
        prompt: &str,
        grounding: bool,
    ) -> GenerationResult<Generation> {
        let files = self.documents.list(path_id).await?;
        if files.is_empty() {
            return Err(GenerationError::NoDocuments(path_id.to_string()));
        }

        let mut parts = Vec::with_capacity(files.len() + 1);
        for doc in &files {
            parts.push(self.document_part(doc).await?);
        }
        parts.push(RequestPart::text(prompt));

        let request = GenerateRequest::new(parts)
            .with_grounding(grounding)
            .with_temperature(self.temperature)
            .with_max_output_tokens(self.max_output_tokens)
            .without_safety_filters();

        let content = self.model.generate(request).await?;
        info!(
            path_id,
            files = files.len(),
            chars = content.len(),
            "generation complete"
        );

        Ok(Generation { content, files })
    }
}
