//! Core types for the analysis pipeline

use crate::documents::DocumentInfo;
use crate::extract::{AnalysisSummary, PeerComparisonTable};
use crate::profile::ExtractedProfile;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Orchestrator tuning
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisConfig {
    /// Maximum concurrent generation calls
    pub max_concurrent_generations: usize,
    /// Upper bound on one generation call
    pub generation_timeout: Duration,
    /// Ask the model to ground answers in web search
    pub grounding: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            max_concurrent_generations: 4,
            generation_timeout: Duration::from_secs(600),
            grounding: true,
        }
    }
}

/// Everything a successful analysis produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub path_id: String,
    pub startup_name: String,
    pub extracted_data: ExtractedProfile,
    pub analysis_summary: AnalysisSummary,
    pub peer_comparison_table: PeerComparisonTable,
    pub files_processed: usize,
    pub files_info: Vec<DocumentInfo>,
    /// False when persistence failed; the analysis itself still succeeded
    pub stored_in_database: bool,
    pub response_time_seconds: f64,
}

/// An analysis that failed upstream, before any parsing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisFailure {
    pub message: String,
    pub path_id: String,
    pub startup_name: String,
    pub response_time_seconds: f64,
}

/// Result of [`AnalysisOrchestrator::run_analysis`](super::AnalysisOrchestrator::run_analysis)
///
/// Serialized with a `status` tag of `success` or `error`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum AnalysisOutcome {
    Success(AnalysisReport),
    Error(AnalysisFailure),
}

impl AnalysisOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, AnalysisOutcome::Success(_))
    }

    pub fn report(&self) -> Option<&AnalysisReport> {
        match self {
            AnalysisOutcome::Success(report) => Some(report),
            AnalysisOutcome::Error(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&AnalysisFailure> {
        match self {
            AnalysisOutcome::Error(failure) => Some(failure),
            AnalysisOutcome::Success(_) => None,
        }
    }

    pub fn startup_name(&self) -> &str {
        match self {
            AnalysisOutcome::Success(r) => &r.startup_name,
            AnalysisOutcome::Error(f) => &f.startup_name,
        }
    }

    pub fn response_time_seconds(&self) -> f64 {
        match self {
            AnalysisOutcome::Success(r) => r.response_time_seconds,
            AnalysisOutcome::Error(f) => f.response_time_seconds,
        }
    }
}

/// Seconds since `start`, rounded to the millisecond
pub(crate) fn elapsed_seconds(start: Instant) -> f64 {
    (start.elapsed().as_secs_f64() * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn error_outcome_serializes_with_status_tag() {
        let outcome = AnalysisOutcome::Error(AnalysisFailure {
            message: "no files found".into(),
            path_id: "a/b".into(),
            startup_name: "b".into(),
            response_time_seconds: 0.012,
        });
        assert_eq!(
            serde_json::to_value(&outcome).unwrap(),
            json!({
                "status": "error",
                "message": "no files found",
                "path_id": "a/b",
                "startup_name": "b",
                "response_time_seconds": 0.012
            })
        );
        assert!(!outcome.is_success());
        assert_eq!(outcome.failure().unwrap().message, "no files found");
    }

    #[test]
    fn success_outcome_carries_every_field() {
        let outcome = AnalysisOutcome::Success(AnalysisReport {
            path_id: "a/b".into(),
            startup_name: "acme".into(),
            extracted_data: ExtractedProfile::placeholder(),
            analysis_summary: AnalysisSummary::default(),
            peer_comparison_table: PeerComparisonTable::empty(),
            files_processed: 2,
            files_info: Vec::new(),
            stored_in_database: true,
            response_time_seconds: 1.5,
        });
        let value = serde_json::to_value(&outcome).unwrap();
        assert_eq!(value["status"], "success");
        assert_eq!(value["extracted_data"]["company_name"], "Not specified");
        assert_eq!(value["analysis_summary"]["short_summary"], "");
        assert_eq!(value["peer_comparison_table"], json!({}));
        assert_eq!(value["stored_in_database"], true);

        let back: AnalysisOutcome = serde_json::from_value(value).unwrap();
        assert_eq!(back, outcome);
    }

    #[test]
    fn default_config() {
        let config = AnalysisConfig::default();
        assert_eq!(config.max_concurrent_generations, 4);
        assert_eq!(config.generation_timeout, Duration::from_secs(600));
        assert!(config.grounding);
    }
}
