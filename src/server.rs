//! HTTP boundary: router and request handlers.
//!
//! Each inbound request runs on its own tokio task; the handlers share
//! nothing but the two ingestors, and the filesystem underneath them.

use crate::event;
use crate::ingest::{FileIngestor, IngestError};
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

/// Shared state for the request handlers
#[derive(Clone)]
pub struct AppState {
    /// Ingestor for FF binaries (CapturedFiles tree, detect trigger attached)
    pub ff: Arc<FileIngestor>,
    /// Ingestor for timelapse stacks (Stacks tree)
    pub stacks: Arc<FileIngestor>,
}

/// Build the receiver router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/event", post(recv_event))
        .route("/ff", post(recv_ff))
        .route("/stack", post(recv_stack))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "service": "meteor-receiver"
    }))
}

/// POST /event — log a detection event. Always acknowledged; a malformed
/// body degrades to an unknown event rather than failing the request.
async fn recv_event(body: Bytes) -> impl IntoResponse {
    let parsed = event::parse_event(&body, Utc::now());
    event::record(&parsed);
    Json(json!({"status": "ok"}))
}

/// POST /ff — save an FF binary into the CapturedFiles tree.
async fn recv_ff(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    save_upload(&state.ff, &headers, &body, "/ff").await
}

/// POST /stack — save a timelapse stack into the Stacks tree.
async fn recv_stack(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    save_upload(&state.stacks, &headers, &body, "/stack").await
}

/// Shared upload path for /ff and /stack. The filename comes from the
/// X-Filename header; a missing header is treated like an empty (unsafe)
/// filename.
async fn save_upload(
    ingestor: &FileIngestor,
    headers: &HeaderMap,
    body: &[u8],
    endpoint: &str,
) -> Response {
    let filename = headers
        .get("X-Filename")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    match ingestor.ingest(filename, body, Utc::now()).await {
        Ok(stored) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "path": stored.path.display().to_string()
            })),
        )
            .into_response(),
        Err(IngestError::BadFilename) => {
            warn!(endpoint, "missing or unsafe X-Filename header");
            (
                StatusCode::BAD_REQUEST,
                Json(json!({"status": "error", "msg": "bad filename"})),
            )
                .into_response()
        }
        Err(IngestError::Io(e)) => {
            error!(endpoint, error = %e, "failed to store upload");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"status": "error", "msg": "storage failure"})),
            )
                .into_response()
        }
    }
}
