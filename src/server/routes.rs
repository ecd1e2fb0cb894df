use super::error::{ApiError, ApiResult};
use crate::analysis::{AnalysisOrchestrator, AnalysisOutcome};
use crate::chat::{ChatError, ChatMessage, ChatReply, ChatService};
use crate::documents::{group_by_category, DocumentError, DocumentInfo, DocumentSource};
use crate::storage::{AnalysisListing, ChatSessionSummary};
use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::convert::Infallible;
use std::sync::Arc;
use tracing::info;

/// Prefix every route is mounted under
pub const API_PREFIX: &str = "/genaiexchange";

const INVALID_PATH: &str =
    "Invalid path format. Expected format: L1/L2 (only one slash allowed, no leading/trailing slashes).";
const INVALID_MODE: &str = "Invalid mode parameter. Use 'new' or 'read'";

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<AnalysisOrchestrator>,
    pub chat: Arc<ChatService>,
    pub documents: Arc<dyn DocumentSource>,
}

/// Full application router with state applied
pub fn router(state: AppState) -> Router {
    Router::new().nest(API_PREFIX, api_routes()).with_state(state)
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/hello", get(hello))
        .route("/generate_summary", get(generate_summary))
        .route("/documents/list-all", get(list_all_files))
        .route("/chat/message", post(chat_message))
        .route("/chat/stream/message", post(chat_stream_message))
        .route("/history", get(chat_history))
        .route("/chat/startup-sessions", get(startup_sessions))
        .route("/chat/available-analyses", get(available_analyses))
}

/// `true` for exactly two non-empty `/`-separated segments
pub fn is_valid_path_id(path: &str) -> bool {
    match path.split_once('/') {
        Some((l1, l2)) => !l1.is_empty() && !l2.is_empty() && !l2.contains('/'),
        None => false,
    }
}

/// `{"status": "success", ...body}`
#[derive(Debug, Serialize)]
struct Success<T> {
    status: &'static str,
    #[serde(flatten)]
    body: T,
}

fn success<T: Serialize>(body: T) -> Json<Success<T>> {
    Json(Success {
        status: "success",
        body,
    })
}

// ---------------------------------------------------------------------------
// Query parameters
// ---------------------------------------------------------------------------

fn default_mode() -> String {
    "new".to_string()
}

#[derive(Debug, Deserialize)]
pub struct SummaryParams {
    pub path: String,
    #[serde(default = "default_mode")]
    pub mode: String,
}

#[derive(Debug, Deserialize)]
pub struct PathParams {
    #[serde(alias = "gcs_key")]
    pub path: String,
}

#[derive(Debug, Deserialize)]
pub struct ChatParams {
    #[serde(alias = "gcs_key")]
    pub path: String,
    pub message: String,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct Hello {
    message: &'static str,
}

async fn hello() -> Json<Success<Hello>> {
    success(Hello {
        message: "API test success!",
    })
}

async fn generate_summary(
    State(state): State<AppState>,
    Query(params): Query<SummaryParams>,
) -> ApiResult<Response> {
    if !is_valid_path_id(&params.path) {
        return Err(ApiError::BadRequest(INVALID_PATH.to_string()));
    }

    match params.mode.as_str() {
        "new" => match state.orchestrator.run_analysis(&params.path, None).await {
            AnalysisOutcome::Error(failure) => Err(ApiError::BadRequest(failure.message)),
            outcome => Ok(Json(outcome).into_response()),
        },
        "read" => {
            let cached = state
                .orchestrator
                .cached_analysis(&params.path)
                .await
                .map_err(|e| ApiError::Internal(e.to_string()))?;
            match cached {
                Some(record) => Ok(Json(record).into_response()),
                None => Err(ApiError::NotFound(format!(
                    "No cached analysis found for path: {}. Use mode='new' to generate fresh analysis.",
                    params.path
                ))),
            }
        }
        _ => Err(ApiError::BadRequest(INVALID_MODE.to_string())),
    }
}

#[derive(Debug, Serialize)]
struct FileListing {
    relative_path: String,
    total_files: usize,
    files_by_type: BTreeMap<String, Vec<DocumentInfo>>,
}

async fn list_all_files(
    State(state): State<AppState>,
    Query(params): Query<PathParams>,
) -> ApiResult<Json<Success<FileListing>>> {
    let files = state.documents.list(&params.path).await.map_err(|e| match e {
        DocumentError::InvalidPath(_) => ApiError::BadRequest(e.to_string()),
        other => ApiError::BadRequest(format!("Failed to list files: {}", other)),
    })?;
    info!(path = %params.path, total = files.len(), "listed documents");

    Ok(success(FileListing {
        relative_path: params.path,
        total_files: files.len(),
        files_by_type: group_by_category(&files),
    }))
}

async fn chat_message(
    State(state): State<AppState>,
    Query(params): Query<ChatParams>,
) -> ApiResult<Json<Success<ChatReply>>> {
    let reply = state
        .chat
        .respond(&params.path, &params.message)
        .await
        .map_err(|e| match e {
            ChatError::Storage(_) => ApiError::Internal(e.to_string()),
            other => ApiError::BadRequest(other.to_string()),
        })?;
    Ok(success(reply))
}

fn analysis_lookup_error(error: ChatError) -> ApiError {
    match error {
        ChatError::AnalysisNotFound(path) => {
            ApiError::NotFound(format!("No analysis found for path: {}", path))
        }
        other => ApiError::Internal(other.to_string()),
    }
}

async fn chat_stream_message(
    State(state): State<AppState>,
    Query(params): Query<ChatParams>,
) -> ApiResult<Response> {
    let stream = state
        .chat
        .respond_stream(&params.path, &params.message)
        .await
        .map_err(analysis_lookup_error)?;

    let body = Body::from_stream(stream.map(Ok::<_, Infallible>));
    Ok(([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], body).into_response())
}

#[derive(Debug, Serialize)]
struct HistoryBody {
    session_id: String,
    startup_name: String,
    messages: Vec<ChatMessage>,
}

async fn chat_history(
    State(state): State<AppState>,
    Query(params): Query<PathParams>,
) -> ApiResult<Json<Success<HistoryBody>>> {
    let history = state
        .chat
        .history(&params.path)
        .await
        .map_err(analysis_lookup_error)?;
    Ok(success(HistoryBody {
        session_id: history.session_id,
        startup_name: history.startup_name,
        messages: history.messages,
    }))
}

#[derive(Debug, Serialize)]
struct Sessions {
    sessions: Vec<ChatSessionSummary>,
}

async fn startup_sessions(State(state): State<AppState>) -> ApiResult<Json<Success<Sessions>>> {
    let sessions = state
        .chat
        .sessions()
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok(success(Sessions { sessions }))
}

#[derive(Debug, Serialize)]
struct Analyses {
    available_analyses: Vec<AnalysisListing>,
    message: &'static str,
}

async fn available_analyses(State(state): State<AppState>) -> ApiResult<Json<Success<Analyses>>> {
    let available_analyses = state
        .chat
        .available_analyses()
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok(success(Analyses {
        available_analyses,
        message: "Use any path from this list to start a chat session",
    }))
}
