//! Startup Analyst: document-grounded startup due diligence
//!
//! Turns a bundle of startup documents (pitch decks, memos, transcripts) into
//! a stored analysis, then answers follow-up questions about it.
//!
//! # Core Concepts
//!
//! - **Path identifier**: `L1/L2`, names one startup's document bundle and
//!   doubles as its chat session id
//! - **Extracted profile**: a fixed set of normalized startup fields, with
//!   `"Not specified"` for anything the model did not report
//! - **Analysis**: summary, profile and peer comparison for one bundle,
//!   stored per `(path_id, startup_name)`
//!
//! # Example
//!
//! ```
//! use startup_analyst::extract_sections_and_profile;
//!
//! let (summary, profile) = extract_sections_and_profile("");
//! assert!(summary.short_summary.is_empty());
//! assert_eq!(profile.get("company_name"), Some("Not specified"));
//! ```

pub mod analysis;
pub mod chat;
pub mod config;
pub mod documents;
pub mod extract;
pub mod generation;
pub mod profile;
pub mod server;
pub mod storage;

pub use analysis::{AnalysisConfig, AnalysisOrchestrator, AnalysisOutcome, AnalysisReport};
pub use chat::{ChatError, ChatService, ChatStream};
pub use documents::{DocumentInfo, DocumentSource, LocalDocumentStore};
pub use extract::{
    extract_analysis_and_profile, extract_sections_and_profile, parse_model_output,
    AnalysisSummary, ParsedOutput, PeerComparisonTable, ProfileExtractor,
};
pub use generation::{ContentGenerator, DocumentGenerator, GeminiClient, ModelClient};
pub use profile::{normalize_key, normalize_value, ExtractedProfile, PLACEHOLDER};
pub use storage::{AnalysisStore, OpenStore, SqliteStore, StorageError, StorageResult};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
