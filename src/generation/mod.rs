//! Generative-model access
//!
//! - [`ModelClient`]: single-request text generation, complete or streamed
//!   - [`GeminiClient`]: Gemini REST API (production)
//!   - [`MockModelClient`]: scripted responses (testing)
//! - [`ContentGenerator`]: generation over a document bundle, used by the
//!   analysis orchestrator
//!   - [`DocumentGenerator`]: lists and loads documents, then calls a
//!     `ModelClient`

mod client;
mod gemini;
mod generator;
mod mock;
pub mod types;

pub use client::{
    GenerateRequest, GenerationError, GenerationResult, ModelClient, RequestPart, TextStream,
};
pub use gemini::{GeminiClient, DEFAULT_MODEL, DEFAULT_STREAM_MODEL, GEMINI_BASE_URL};
pub use generator::{
    ContentGenerator, DocumentGenerator, Generation, ANALYSIS_MAX_OUTPUT_TOKENS,
    ANALYSIS_TEMPERATURE,
};
pub use mock::MockModelClient;
