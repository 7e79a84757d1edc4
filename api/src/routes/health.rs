use axum::extract::State;
use axum::response::IntoResponse;
use axum::{Json, Router, routing::get};
use serde::Serialize;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    /// RAG collaborator reachable
    pub rag: bool,
    /// Preferences collaborator reachable
    pub preferences: bool,
}

/// Health check endpoint — the service itself is always "ok" as long as
/// it answers; collaborator reachability is reported separately so a
/// degraded deployment is visible without failing the probe.
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is up", body = HealthResponse)
    ),
    tag = "system"
)]
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let (rag, preferences) =
        tokio::join!(state.rag.is_reachable(), state.prefs.is_reachable());

    let status = if rag && preferences { "ok" } else { "degraded" };
    Json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        rag,
        preferences,
    })
}
