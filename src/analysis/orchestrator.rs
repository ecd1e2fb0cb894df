//! Analysis orchestrator: generation, parsing and persistence for one path
//!
//! Generation calls are bounded by a semaphore and a timeout. Only a failed
//! generation fails the analysis; parsing degrades to placeholders and a
//! failed write is reported as `stored_in_database: false`.

use super::prompts::analysis_prompt;
use super::types::{elapsed_seconds, AnalysisConfig, AnalysisFailure, AnalysisOutcome, AnalysisReport};
use crate::documents::{DocumentInfo, DocumentSource};
use crate::extract::ProfileExtractor;
use crate::generation::{ContentGenerator, Generation, GenerationError, GenerationResult};
use crate::storage::{run_blocking, AnalysisLookup, AnalysisRecord, AnalysisStore, StorageResult, StoredAnalysis};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

/// Name used when nothing better can be derived
pub const UNKNOWN_STARTUP: &str = "unknown";

/// Derive a startup name from a bundle's file names.
///
/// The first file whose name contains `_` contributes its lowercased prefix
/// (`acme_pitch.pdf` gives `acme`). Otherwise the last segment of the path
/// identifier is used, or [`UNKNOWN_STARTUP`] if that is empty.
pub fn startup_name_from_files(path_id: &str, files: &[DocumentInfo]) -> String {
    let from_files = files.iter().find_map(|f| {
        let (prefix, _) = f.filename.split_once('_')?;
        let name = prefix.trim().to_lowercase();
        (!name.is_empty()).then_some(name)
    });

    from_files.unwrap_or_else(|| {
        path_id
            .rsplit('/')
            .next()
            .filter(|s| !s.is_empty())
            .unwrap_or(UNKNOWN_STARTUP)
            .to_string()
    })
}

/// Runs analyses over document bundles
pub struct AnalysisOrchestrator {
    generator: Arc<dyn ContentGenerator>,
    documents: Arc<dyn DocumentSource>,
    store: Arc<dyn AnalysisStore>,
    extractor: Arc<ProfileExtractor>,
    /// Semaphore to limit concurrent generation calls
    generation_semaphore: Arc<Semaphore>,
    config: AnalysisConfig,
}

impl AnalysisOrchestrator {
    pub fn new(
        generator: Arc<dyn ContentGenerator>,
        documents: Arc<dyn DocumentSource>,
        store: Arc<dyn AnalysisStore>,
    ) -> Self {
        let config = AnalysisConfig::default();
        Self {
            generator,
            documents,
            store,
            extractor: Arc::new(ProfileExtractor::default()),
            generation_semaphore: Arc::new(Semaphore::new(config.max_concurrent_generations)),
            config,
        }
    }

    pub fn with_config(mut self, config: AnalysisConfig) -> Self {
        self.generation_semaphore = Arc::new(Semaphore::new(config.max_concurrent_generations.max(1)));
        self.config = config;
        self
    }

    /// Replace the extraction pipeline (e.g. with custom narrative recognizers)
    pub fn with_extractor(mut self, extractor: ProfileExtractor) -> Self {
        self.extractor = Arc::new(extractor);
        self
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn AnalysisStore> {
        &self.store
    }

    /// Startup name for a bundle; never fails.
    pub async fn derive_startup_name(&self, path_id: &str) -> String {
        match self.documents.list(path_id).await {
            Ok(files) => startup_name_from_files(path_id, &files),
            Err(e) => {
                error!(path_id, error = %e, "could not list documents to derive startup name");
                UNKNOWN_STARTUP.to_string()
            }
        }
    }

    /// Analyze every document under `path_id`.
    ///
    /// `startup_name` defaults to one derived from the bundle's file names.
    pub async fn run_analysis(&self, path_id: &str, startup_name: Option<&str>) -> AnalysisOutcome {
        let start = Instant::now();

        let startup_name = match startup_name.map(str::trim).filter(|s| !s.is_empty()) {
            Some(name) => name.to_string(),
            None => self.derive_startup_name(path_id).await,
        };
        info!(path_id, startup_name = %startup_name, "starting analysis");

        let prompt = analysis_prompt(&startup_name);
        let generation = match self.generate(path_id, &prompt).await {
            Ok(generation) => generation,
            Err(e) => {
                warn!(path_id, error = %e, "generation failed");
                return AnalysisOutcome::Error(AnalysisFailure {
                    message: e.to_string(),
                    path_id: path_id.to_string(),
                    startup_name,
                    response_time_seconds: elapsed_seconds(start),
                });
            }
        };

        let parsed = self.extractor.parse_output(&generation.content);
        info!(
            path_id,
            specified = parsed.profile.specified_count(),
            fields = parsed.profile.len(),
            "extracted profile"
        );

        let files_processed = generation.files_processed();
        let stored = if !startup_name.is_empty() && !parsed.profile.is_empty() {
            self.persist(AnalysisRecord {
                path_id: path_id.to_string(),
                startup_name: startup_name.clone(),
                extracted_data: parsed.profile.clone(),
                analysis_summary: parsed.summary.clone(),
                peer_comparison_table: parsed.peer_comparison.clone(),
                files_processed,
            })
            .await
        } else {
            false
        };

        AnalysisOutcome::Success(AnalysisReport {
            path_id: path_id.to_string(),
            startup_name,
            extracted_data: parsed.profile,
            analysis_summary: parsed.summary,
            peer_comparison_table: parsed.peer_comparison,
            files_processed,
            files_info: generation.files,
            stored_in_database: stored,
            response_time_seconds: elapsed_seconds(start),
        })
    }

    /// The stored analysis for a path, if any
    pub async fn cached_analysis(&self, path_id: &str) -> StorageResult<Option<StoredAnalysis>> {
        let lookup = AnalysisLookup::by_path(path_id);
        run_blocking(self.store.clone(), move |store| store.get_analysis(&lookup)).await
    }

    /// Generation with concurrency limiting and timeout
    async fn generate(&self, path_id: &str, prompt: &str) -> GenerationResult<Generation> {
        let _permit = self
            .generation_semaphore
            .acquire()
            .await
            .map_err(|e| GenerationError::Request(format!("Semaphore error: {}", e)))?;

        let timeout = self.config.generation_timeout;
        match tokio::time::timeout(
            timeout,
            self.generator.generate(path_id, prompt, self.config.grounding),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(GenerationError::Timeout(timeout)),
        }
    }

    async fn persist(&self, record: AnalysisRecord) -> bool {
        let path_id = record.path_id.clone();
        match run_blocking(self.store.clone(), move |store| store.upsert_analysis(&record)).await {
            Ok(saved) => {
                info!(path_id = %path_id, id = saved.id, "analysis stored");
                true
            }
            Err(e) => {
                error!(path_id = %path_id, error = %e, "failed to store analysis");
                false
            }
        }
    }
}
