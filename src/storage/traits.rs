//! Storage trait definitions

use crate::extract::{AnalysisSummary, PeerComparisonTable};
use crate::profile::ExtractedProfile;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Default cap for analysis listings
pub const ANALYSIS_LISTING_LIMIT: usize = 100;
/// Default cap for chat-session listings
pub const SESSION_LISTING_LIMIT: usize = 50;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Date parsing error: {0}")]
    DateParse(String),

    #[error("Invalid lookup: {0}")]
    InvalidLookup(String),

    #[error("Connection lock poisoned")]
    LockPoisoned,

    #[error("Background task failed: {0}")]
    Task(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Data written by an analysis run
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisRecord {
    pub path_id: String,
    pub startup_name: String,
    pub extracted_data: ExtractedProfile,
    pub analysis_summary: AnalysisSummary,
    pub peer_comparison_table: PeerComparisonTable,
    pub files_processed: usize,
}

/// A persisted analysis, unique per `(path_id, startup_name)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredAnalysis {
    pub id: i64,
    pub path_id: String,
    pub startup_name: String,
    pub extracted_data: ExtractedProfile,
    pub analysis_summary: AnalysisSummary,
    pub peer_comparison_table: PeerComparisonTable,
    pub files_processed: usize,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One row of the analysis listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisListing {
    pub path_id: String,
    pub startup_name: String,
    pub created_at: DateTime<Utc>,
    pub files_processed: usize,
}

/// A user message and the model's reply, stored as one row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub id: i64,
    pub session_id: String,
    pub startup_name: Option<String>,
    pub user_message: String,
    pub model_response: String,
    pub created_at: DateTime<Utc>,
}

/// Per-session aggregate for the chat-session listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatSessionSummary {
    pub session_id: String,
    pub startup_name: Option<String>,
    pub first_chat: DateTime<Utc>,
    pub last_chat: DateTime<Utc>,
    pub message_count: usize,
}

/// Which analysis to fetch; at least one criterion is required
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnalysisLookup {
    pub path_id: Option<String>,
    pub startup_name: Option<String>,
}

impl AnalysisLookup {
    pub fn by_path(path_id: impl Into<String>) -> Self {
        Self {
            path_id: Some(path_id.into()),
            startup_name: None,
        }
    }

    pub fn by_startup(startup_name: impl Into<String>) -> Self {
        Self {
            path_id: None,
            startup_name: Some(startup_name.into()),
        }
    }

    pub fn with_startup(mut self, startup_name: impl Into<String>) -> Self {
        self.startup_name = Some(startup_name.into());
        self
    }

    pub fn validate(&self) -> StorageResult<()> {
        if self.path_id.is_none() && self.startup_name.is_none() {
            return Err(StorageError::InvalidLookup(
                "either path_id or startup_name is required".to_string(),
            ));
        }
        Ok(())
    }
}

/// Trait for analysis and conversation storage backends
///
/// Implementations must be thread-safe (Send + Sync) to support
/// concurrent access from request handlers. Operations are blocking; async
/// callers go through [`run_blocking`].
pub trait AnalysisStore: Send + Sync {
    // === Analysis Operations ===

    /// Insert or fully overwrite the analysis for `(path_id, startup_name)`
    fn upsert_analysis(&self, record: &AnalysisRecord) -> StorageResult<StoredAnalysis>;

    /// Most recently updated analysis matching the lookup
    fn get_analysis(&self, lookup: &AnalysisLookup) -> StorageResult<Option<StoredAnalysis>>;

    /// Analyses, newest first
    fn list_analyses(&self, limit: usize) -> StorageResult<Vec<AnalysisListing>>;

    // === Conversation Operations ===

    /// Record one exchange in a session
    fn append_turn(
        &self,
        session_id: &str,
        user_message: &str,
        model_response: &str,
        startup_name: Option<&str>,
    ) -> StorageResult<ConversationTurn>;

    /// The most recent `limit` turns of a session, oldest first
    fn list_turns(&self, session_id: &str, limit: usize) -> StorageResult<Vec<ConversationTurn>>;

    /// Sessions with at least one turn, most recently active first
    fn list_chat_sessions(&self, limit: usize) -> StorageResult<Vec<ChatSessionSummary>>;
}

/// Extension trait for opening stores from paths
pub trait OpenStore: AnalysisStore + Sized {
    /// Open or create a store at the given path
    fn open(path: impl AsRef<Path>) -> StorageResult<Self>;

    /// Create an in-memory store (useful for testing)
    fn open_in_memory() -> StorageResult<Self>;
}

/// Run a store operation on the blocking worker pool.
pub async fn run_blocking<T, F>(store: Arc<dyn AnalysisStore>, op: F) -> StorageResult<T>
where
    T: Send + 'static,
    F: FnOnce(&dyn AnalysisStore) -> StorageResult<T> + Send + 'static,
{
    tokio::task::spawn_blocking(move || op(store.as_ref()))
        .await
        .map_err(|e| StorageError::Task(e.to_string()))?
}
