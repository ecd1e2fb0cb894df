//! Directory-backed document store
//!
//! `<root>/<path_id>` plays the role of an object-store prefix: every
//! regular file below it belongs to the bundle, listed in file-name order.

use super::{DocumentError, DocumentInfo, DocumentResult, DocumentSource};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

/// Listing cap per path identifier
pub const MAX_FILES: usize = 100;

#[derive(Debug, Clone)]
pub struct LocalDocumentStore {
    root: PathBuf,
    max_files: usize,
}

impl LocalDocumentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            max_files: MAX_FILES,
        }
    }

    pub fn with_max_files(mut self, max_files: usize) -> Self {
        self.max_files = max_files;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a store key onto the filesystem, refusing anything that could
    /// leave the root.
    fn resolve(&self, key: &str) -> DocumentResult<PathBuf> {
        let relative = Path::new(key.trim_matches('/'));
        if relative.as_os_str().is_empty() {
            return Err(DocumentError::InvalidPath(key.to_string()));
        }
        if !relative
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
        {
            return Err(DocumentError::InvalidPath(key.to_string()));
        }
        Ok(self.root.join(relative))
    }

    /// Store key of a file under the root, `/`-separated
    fn key_for(&self, path: &Path) -> String {
        path.strip_prefix(&self.root)
            .unwrap_or(path)
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Blocking listing; [`DocumentSource::list`] runs this off the async runtime.
    pub fn list_blocking(&self, path_id: &str) -> DocumentResult<Vec<DocumentInfo>> {
        let dir = self.resolve(path_id)?;
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut documents = Vec::new();
        for entry in WalkDir::new(&dir).sort_by_file_name() {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            if documents.len() >= self.max_files {
                tracing::debug!(path_id, max = self.max_files, "listing truncated");
                break;
            }

            let metadata = entry.metadata()?;
            let filename = entry.file_name().to_string_lossy().into_owned();
            let mime_type = mime_guess::from_path(entry.path())
                .first_or_octet_stream()
                .to_string();

            documents.push(DocumentInfo {
                name: self.key_for(entry.path()),
                filename,
                full_path: entry.path().display().to_string(),
                size: metadata.len(),
                mime_type,
                updated: metadata.modified().ok().map(DateTime::<Utc>::from),
            });
        }

        Ok(documents)
    }
}

#[async_trait]
impl DocumentSource for LocalDocumentStore {
    async fn list(&self, path_id: &str) -> DocumentResult<Vec<DocumentInfo>> {
        let store = self.clone();
        let path_id = path_id.to_string();
        tokio::task::spawn_blocking(move || store.list_blocking(&path_id))
            .await
            .map_err(|e| DocumentError::Task(e.to_string()))?
    }

    async fn load(&self, document: &DocumentInfo) -> DocumentResult<Vec<u8>> {
        let path = self.resolve(&document.name)?;
        Ok(tokio::fs::read(path).await?)
    }
}
