//! Document bundles: listing, loading and text extraction
//!
//! A path identifier (`L1/L2`) names one startup's bundle of documents.
//! [`DocumentSource`] abstracts where bundles live; [`LocalDocumentStore`]
//! keeps them in a directory tree.

mod docx;
mod local;

pub use docx::extract_docx_text;
pub use local::{LocalDocumentStore, MAX_FILES};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors from document operations
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("Invalid path identifier: {0}")]
    InvalidPath(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Directory walk error: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("DOCX extraction error: {0}")]
    Docx(String),

    #[error("Background task failed: {0}")]
    Task(String),
}

/// Result type for document operations
pub type DocumentResult<T> = Result<T, DocumentError>;

/// One document in a bundle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentInfo {
    /// Store key, `/`-separated and starting with the path identifier
    pub name: String,
    /// Last segment of the key
    pub filename: String,
    /// Location as the backing store reports it
    pub full_path: String,
    pub size: u64,
    pub mime_type: String,
    pub updated: Option<DateTime<Utc>>,
}

impl DocumentInfo {
    pub fn is_docx(&self) -> bool {
        self.filename.to_lowercase().ends_with(".docx")
    }

    /// Top-level MIME category: `application`, `image`, `text`, ...
    pub fn category(&self) -> &str {
        mime_category(&self.mime_type)
    }
}

/// Where document bundles are stored
#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// Documents under `path_id`, in a stable order
    async fn list(&self, path_id: &str) -> DocumentResult<Vec<DocumentInfo>>;

    /// Full contents of one listed document
    async fn load(&self, document: &DocumentInfo) -> DocumentResult<Vec<u8>>;
}

pub fn mime_category(mime_type: &str) -> &str {
    mime_type.split('/').next().unwrap_or(mime_type)
}

/// Group documents by MIME category, keeping listing order within a group
pub fn group_by_category(documents: &[DocumentInfo]) -> BTreeMap<String, Vec<DocumentInfo>> {
    let mut groups: BTreeMap<String, Vec<DocumentInfo>> = BTreeMap::new();
    for doc in documents {
        groups
            .entry(doc.category().to_string())
            .or_default()
            .push(doc.clone());
    }
    groups
}
