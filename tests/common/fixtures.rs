//! Fixtures: model responses, document bundles and seeded stores

use serde_json::{json, Map, Value};
use startup_analyst::extract::SECTION_SEPARATOR;
use startup_analyst::storage::{AnalysisRecord, StoredAnalysis};
use startup_analyst::{
    AnalysisStore, AnalysisSummary, ExtractedProfile, OpenStore, PeerComparisonTable, SqliteStore,
};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

/// Fresh in-memory store
pub fn create_test_store() -> Arc<SqliteStore> {
    Arc::new(SqliteStore::open_in_memory().expect("in-memory store"))
}

/// A JSON object with `count` schema fields filled in, starting from
/// `company_name`
pub fn profile_json(company: &str, count: usize) -> Value {
    let fields = [
        ("company_name", company),
        ("industry", "Robotics"),
        ("headquarters", "Bengaluru"),
        ("business_model", "B2B SaaS"),
        ("revenue", "$1.2M"),
        ("arr", "$1.5M"),
        ("burn_rate", "$80K/month"),
        ("runway", "18 months"),
        ("tam", "$40B"),
        ("number_of_employees", "25"),
        ("website_url", "https://example.com"),
        ("valuation", "$20M"),
    ];
    let map: Map<String, Value> = fields
        .iter()
        .take(count)
        .map(|(k, v)| (k.to_string(), json!(v)))
        .collect();
    Value::Object(map)
}

/// A well-formed three-section response for `company`
pub fn model_response(company: &str) -> String {
    let peers = json!({
        "comparison": {
            "columns": ["Metric", company, "Rival"],
            "companies": [{"name": company}, {"name": "Rival"}]
        }
    });
    format!(
        "{company} builds warehouse robots.\n{sep}\nDetailed view of {company}.\n\n\n{profile}\n\nStrong team.\n{sep}\n{peers}",
        sep = SECTION_SEPARATOR,
        profile = profile_json(company, 10),
        peers = peers,
    )
}

/// A document bundle rooted in a temporary directory
pub struct TestBundle {
    pub root: TempDir,
    pub path_id: String,
}

impl TestBundle {
    pub fn root_path(&self) -> &Path {
        self.root.path()
    }
}

/// Write `files` under `<tmp>/<path_id>/`
pub fn write_bundle(path_id: &str, files: &[(&str, &[u8])]) -> TestBundle {
    let root = TempDir::new().expect("temp dir");
    let dir = root.path().join(path_id);
    std::fs::create_dir_all(&dir).expect("bundle dir");
    for (name, contents) in files {
        std::fs::write(dir.join(name), contents).expect("bundle file");
    }
    TestBundle {
        root,
        path_id: path_id.to_string(),
    }
}

/// Store an analysis for `path_id` directly
pub fn seed_analysis(store: &dyn AnalysisStore, path_id: &str, startup_name: &str) -> StoredAnalysis {
    store
        .upsert_analysis(&AnalysisRecord {
            path_id: path_id.to_string(),
            startup_name: startup_name.to_string(),
            extracted_data: ExtractedProfile::placeholder(),
            analysis_summary: AnalysisSummary {
                short_summary: format!("{startup_name} makes robots."),
                detailed_analysis_summary: "Solid traction.".to_string(),
            },
            peer_comparison_table: PeerComparisonTable::empty(),
            files_processed: 1,
        })
        .expect("seed analysis")
}
