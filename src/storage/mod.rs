//! Storage backends for analyses and conversations
//!
//! Backends implement the `AnalysisStore` trait. The primary implementation
//! is `SqliteStore` for persistent storage.

mod sqlite;
mod traits;

pub use sqlite::SqliteStore;
pub use traits::{
    run_blocking, AnalysisListing, AnalysisLookup, AnalysisRecord, AnalysisStore,
    ChatSessionSummary, ConversationTurn, OpenStore, StorageError, StorageResult, StoredAnalysis,
    ANALYSIS_LISTING_LIMIT, SESSION_LISTING_LIMIT,
};
