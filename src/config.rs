//! Process configuration: command-line flags with environment fallbacks

use crate::generation::{DEFAULT_MODEL, DEFAULT_STREAM_MODEL, GEMINI_BASE_URL};
use clap::Args;
use std::net::SocketAddr;
use std::path::PathBuf;

pub const DEFAULT_BIND: &str = "127.0.0.1:8000";

/// Where documents and analyses live
#[derive(Debug, Clone, Args)]
pub struct StorageArgs {
    /// Root directory holding `L1/L2` document bundles
    #[arg(long, env = "STARTUP_ANALYST_DOCUMENTS", default_value = "documents")]
    pub documents: PathBuf,

    /// Path to SQLite database file
    #[arg(long, env = "STARTUP_ANALYST_DB")]
    pub db: Option<PathBuf>,
}

impl StorageArgs {
    pub fn db_path(&self) -> PathBuf {
        self.db.clone().unwrap_or_else(default_db_path)
    }
}

/// Gemini credentials and model selection
#[derive(Debug, Clone, Args)]
pub struct ModelArgs {
    /// Gemini API key
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Model used for analyses and non-streaming chat
    #[arg(long, env = "STARTUP_ANALYST_MODEL", default_value = DEFAULT_MODEL)]
    pub model: String,

    /// Model used for streamed chat replies
    #[arg(long, env = "STARTUP_ANALYST_STREAM_MODEL", default_value = DEFAULT_STREAM_MODEL)]
    pub stream_model: String,

    /// Gemini REST base URL
    #[arg(long, env = "GEMINI_BASE_URL", default_value = GEMINI_BASE_URL)]
    pub base_url: String,
}

#[derive(Debug, Clone, Args)]
pub struct ServeArgs {
    /// Address to listen on
    #[arg(long, env = "STARTUP_ANALYST_BIND", default_value = DEFAULT_BIND)]
    pub bind: SocketAddr,
}

/// Default database path (`<data dir>/startup-analyst/analyses.db`)
pub fn default_db_path() -> PathBuf {
    let data_dir = dirs::data_dir()
        .unwrap_or_else(|| dirs::home_dir().unwrap_or_default().join(".local/share"));
    let app_dir = data_dir.join("startup-analyst");
    std::fs::create_dir_all(&app_dir).ok();
    app_dir.join("analyses.db")
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Cli {
        #[command(flatten)]
        storage: StorageArgs,
        #[command(flatten)]
        model: ModelArgs,
        #[command(flatten)]
        serve: ServeArgs,
    }

    #[test]
    fn flags_override_defaults() {
        let cli = Cli::parse_from([
            "test",
            "--documents",
            "/srv/docs",
            "--db",
            "/tmp/a.db",
            "--model",
            "m1",
            "--bind",
            "0.0.0.0:9000",
            "--api-key",
            "k",
        ]);
        assert_eq!(cli.storage.documents, PathBuf::from("/srv/docs"));
        assert_eq!(cli.storage.db_path(), PathBuf::from("/tmp/a.db"));
        assert_eq!(cli.model.model, "m1");
        assert_eq!(cli.model.api_key.as_deref(), Some("k"));
        assert_eq!(cli.serve.bind.port(), 9000);
    }

    #[test]
    fn default_db_path_is_under_app_dir() {
        let path = default_db_path();
        assert!(path.ends_with("startup-analyst/analyses.db"));
    }
}
