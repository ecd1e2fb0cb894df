//! Startup analysis pipeline
//!
//! One analysis turns a document bundle into a stored, structured report:
//!
//! 1. derive the startup name from the bundle's file names (unless given)
//! 2. send every document plus the analysis prompt to the model
//! 3. parse the response into summary, profile and peer table
//!    ([`crate::extract`])
//! 4. upsert the result keyed by `(path_id, startup_name)`
//!
//! # Example
//!
//! ```ignore
//! let orchestrator = AnalysisOrchestrator::new(generator, documents, store);
//! match orchestrator.run_analysis("acme/seed", None).await {
//!     AnalysisOutcome::Success(report) => println!("{}", report.analysis_summary.short_summary),
//!     AnalysisOutcome::Error(failure) => eprintln!("{}", failure.message),
//! }
//! ```

mod orchestrator;
pub mod prompts;
mod types;

pub use crate::extract::AnalysisSummary;
pub use orchestrator::{startup_name_from_files, AnalysisOrchestrator, UNKNOWN_STARTUP};
pub use prompts::analysis_prompt;
pub use types::{AnalysisConfig, AnalysisFailure, AnalysisOutcome, AnalysisReport};
