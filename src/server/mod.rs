//! HTTP API
//!
//! A thin axum layer over [`AnalysisOrchestrator`](crate::analysis::AnalysisOrchestrator)
//! and [`ChatService`](crate::chat::ChatService). All routes live under
//! [`API_PREFIX`]; errors are JSON `{"detail": "..."}`.

mod error;
mod routes;

pub use error::{ApiError, ApiResult};
pub use routes::{
    is_valid_path_id, router, AppState, ChatParams, PathParams, SummaryParams, API_PREFIX,
};

use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::info;

/// Bind `addr` and serve until the process exits.
pub async fn serve(addr: SocketAddr, state: AppState) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    serve_on(listener, state).await
}

/// Serve on an already bound listener.
pub async fn serve_on(listener: TcpListener, state: AppState) -> std::io::Result<()> {
    info!(addr = %listener.local_addr()?, prefix = API_PREFIX, "HTTP server listening");
    axum::serve(listener, router(state)).await
}
