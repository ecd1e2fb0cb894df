//! Test doubles for the generation and storage collaborators

use async_trait::async_trait;
use startup_analyst::generation::{Generation, GenerationError, GenerationResult};
use startup_analyst::storage::{
    AnalysisListing, AnalysisLookup, AnalysisRecord, ChatSessionSummary, ConversationTurn,
    StoredAnalysis,
};
use startup_analyst::{AnalysisStore, ContentGenerator, StorageError, StorageResult};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// [`ContentGenerator`] that returns one scripted result and records calls
pub struct ScriptedGenerator {
    result: GenerationResult<Generation>,
    calls: Mutex<Vec<(String, String, bool)>>,
}

impl ScriptedGenerator {
    pub fn returning(content: impl Into<String>) -> Self {
        Self {
            result: Ok(Generation {
                content: content.into(),
                files: Vec::new(),
            }),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(error: GenerationError) -> Self {
        Self {
            result: Err(error),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// `(path_id, prompt, grounding)` per call
    pub fn calls(&self) -> Vec<(String, String, bool)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ContentGenerator for ScriptedGenerator {
    async fn generate(
        &self,
        path_id: &str,
        prompt: &str,
        grounding: bool,
    ) -> GenerationResult<Generation> {
        self.calls
            .lock()
            .unwrap()
            .push((path_id.to_string(), prompt.to_string(), grounding));
        self.result.clone()
    }
}

/// Store whose writes always fail; reads find nothing unless an analysis
/// is supplied
#[derive(Default)]
pub struct FailingStore {
    writes: AtomicUsize,
    analysis: Option<StoredAnalysis>,
}

impl FailingStore {
    /// Serve `analysis` from every lookup
    pub fn with_analysis(mut self, analysis: StoredAnalysis) -> Self {
        self.analysis = Some(analysis);
        self
    }

    pub fn write_attempts(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn fail<T>(&self) -> StorageResult<T> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        Err(StorageError::Io(std::io::Error::new(
            std::io::ErrorKind::Other,
            "disk full",
        )))
    }
}

impl AnalysisStore for FailingStore {
    fn upsert_analysis(&self, _record: &AnalysisRecord) -> StorageResult<StoredAnalysis> {
        self.fail()
    }

    fn get_analysis(&self, _lookup: &AnalysisLookup) -> StorageResult<Option<StoredAnalysis>> {
        Ok(self.analysis.clone())
    }

    fn list_analyses(&self, _limit: usize) -> StorageResult<Vec<AnalysisListing>> {
        Ok(Vec::new())
    }

    fn append_turn(
        &self,
        _session_id: &str,
        _user_message: &str,
        _model_response: &str,
        _startup_name: Option<&str>,
    ) -> StorageResult<ConversationTurn> {
        self.fail()
    }

    fn list_turns(&self, _session_id: &str, _limit: usize) -> StorageResult<Vec<ConversationTurn>> {
        Ok(Vec::new())
    }

    fn list_chat_sessions(&self, _limit: usize) -> StorageResult<Vec<ChatSessionSummary>> {
        Ok(Vec::new())
    }
}
