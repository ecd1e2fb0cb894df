//! Startup Analyst CLI: HTTP server plus one-shot analysis and chat commands.
//!
//! Usage:
//!   startup-analyst serve [--bind addr] [--documents dir] [--db path]
//!   startup-analyst analyze <L1/L2> [--startup-name name]
//!   startup-analyst chat <L1/L2> <message> [--stream]
//!   startup-analyst history <L1/L2>
//!   startup-analyst list-files <L1/L2>

use clap::{Parser, Subcommand};
use futures::StreamExt;
use startup_analyst::config::{ModelArgs, ServeArgs, StorageArgs};
use startup_analyst::documents::group_by_category;
use startup_analyst::server::{self, AppState};
use startup_analyst::{
    AnalysisOrchestrator, AnalysisOutcome, ChatService, DocumentGenerator, DocumentSource,
    GeminiClient, LocalDocumentStore, OpenStore, SqliteStore,
};
use std::io::Write;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "startup-analyst",
    version,
    about = "Document-grounded startup analysis and follow-up chat"
)]
struct Cli {
    #[command(flatten)]
    storage: StorageArgs,

    #[command(flatten)]
    model: ModelArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server
    Serve {
        #[command(flatten)]
        serve: ServeArgs,
    },
    /// Analyze a document bundle and store the result
    Analyze {
        /// Path identifier (L1/L2)
        path: String,
        /// Startup name (derived from file names when omitted)
        #[arg(long)]
        startup_name: Option<String>,
    },
    /// Ask a question about a stored analysis
    Chat {
        /// Path identifier (L1/L2)
        path: String,
        /// Question to ask
        message: String,
        /// Print the reply as it streams
        #[arg(long)]
        stream: bool,
    },
    /// Show the conversation stored for a path
    History {
        /// Path identifier (L1/L2)
        path: String,
    },
    /// List the documents in a bundle, grouped by type
    ListFiles {
        /// Path identifier (L1/L2)
        path: String,
    },
}

/// Everything the commands need, built once per process
struct App {
    documents: Arc<LocalDocumentStore>,
    orchestrator: Arc<AnalysisOrchestrator>,
    chat: Arc<ChatService>,
}

fn build_app(storage: &StorageArgs, model: &ModelArgs) -> Result<App, String> {
    let api_key = model
        .api_key
        .clone()
        .ok_or_else(|| "GEMINI_API_KEY is not set".to_string())?;
    let db_path = storage.db_path();
    let store = SqliteStore::open(&db_path)
        .map_err(|e| format!("failed to open database at {}: {}", db_path.display(), e))?;
    let store = Arc::new(store);

    let client = Arc::new(
        GeminiClient::new(api_key)
            .with_base_url(model.base_url.as_str())
            .with_model(model.model.as_str())
            .with_stream_model(model.stream_model.as_str()),
    );
    let documents = Arc::new(LocalDocumentStore::new(&storage.documents));
    let generator = Arc::new(DocumentGenerator::new(documents.clone(), client.clone()));
    let orchestrator = AnalysisOrchestrator::new(generator, documents.clone(), store.clone());
    let chat = ChatService::new(client, store);

    Ok(App {
        documents,
        orchestrator: Arc::new(orchestrator),
        chat: Arc::new(chat),
    })
}

fn print_json<T: serde::Serialize>(value: &T) -> i32 {
    match serde_json::to_string_pretty(value) {
        Ok(text) => {
            println!("{}", text);
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

async fn cmd_serve(app: App, serve: ServeArgs) -> i32 {
    let state = AppState {
        orchestrator: app.orchestrator,
        chat: app.chat,
        documents: app.documents,
    };
    match server::serve(serve.bind, state).await {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("Error: server failed on {}: {}", serve.bind, e);
            1
        }
    }
}

async fn cmd_analyze(app: &App, path: &str, startup_name: Option<&str>) -> i32 {
    let outcome = app.orchestrator.run_analysis(path, startup_name).await;
    let code = print_json(&outcome);
    match outcome {
        AnalysisOutcome::Success(report) if !report.stored_in_database => {
            eprintln!("Warning: analysis was not stored");
            code
        }
        AnalysisOutcome::Success(_) => code,
        AnalysisOutcome::Error(_) => 1,
    }
}

async fn cmd_chat(app: &App, path: &str, message: &str, stream: bool) -> i32 {
    if !stream {
        return match app.chat.respond(path, message).await {
            Ok(reply) => {
                println!("{}", reply.bot_response);
                0
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                1
            }
        };
    }

    let mut fragments = match app.chat.respond_stream(path, message).await {
        Ok(stream) => stream,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    let mut stdout = std::io::stdout();
    while let Some(fragment) = fragments.next().await {
        print!("{}", fragment);
        stdout.flush().ok();
    }
    println!();
    0
}

async fn cmd_history(app: &App, path: &str) -> i32 {
    match app.chat.history(path).await {
        Ok(history) => {
            if history.messages.is_empty() {
                println!("No conversation for '{}' ({})", path, history.startup_name);
                return 0;
            }
            for message in &history.messages {
                println!(
                    "[{}] {:?}: {}",
                    message.timestamp.format("%Y-%m-%d %H:%M:%S"),
                    message.sender,
                    message.message
                );
            }
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

async fn cmd_list_files(documents: &LocalDocumentStore, path: &str) -> i32 {
    match documents.list(path).await {
        Ok(files) => {
            println!("{} file(s) under '{}'", files.len(), path);
            for (category, group) in group_by_category(&files) {
                println!("{}:", category);
                for file in group {
                    println!("  {} ({} bytes, {})", file.name, file.size, file.mime_type);
                }
            }
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing();

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("failed to create tokio runtime: {}", e);
            std::process::exit(1);
        }
    };

    let code = rt.block_on(async move {
        if let Commands::ListFiles { path } = &cli.command {
            let documents = LocalDocumentStore::new(&cli.storage.documents);
            return cmd_list_files(&documents, path).await;
        }

        let app = match build_app(&cli.storage, &cli.model) {
            Ok(app) => app,
            Err(e) => {
                eprintln!("Error: {}", e);
                return 1;
            }
        };

        match cli.command {
            Commands::Serve { serve } => cmd_serve(app, serve).await,
            Commands::Analyze { path, startup_name } => {
                cmd_analyze(&app, &path, startup_name.as_deref()).await
            }
            Commands::Chat {
                path,
                message,
                stream,
            } => cmd_chat(&app, &path, &message, stream).await,
            Commands::History { path } => cmd_history(&app, &path).await,
            Commands::ListFiles { .. } => 0,
        }
    });
    std::process::exit(code);
}
