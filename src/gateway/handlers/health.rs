//! Health check handler

use std::sync::Arc;

use axum::{Json, extract::State};
use serde::Serialize;
use utoipa::ToSchema;

use super::super::state::AppState;
use crate::content::StorageKind;
use crate::content::store::PersistenceFailure;

/// Health check response data
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    #[schema(example = "ok")]
    pub status: &'static str,
    /// Build revision
    pub version: &'static str,
    pub storage: StorageKind,
    /// Why the configured backend was not used, if it was not
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_reason: Option<String>,
    pub persistence_successes: u64,
    pub persistence_failures: u64,
    pub last_persistence_error: Option<PersistenceFailure>,
    /// True once any backend write has failed
    pub degraded: bool,
}

/// Health check endpoint
///
/// Always 200 while the process serves requests. Backend trouble shows up
/// as `degraded`, never as a failed content operation.
#[utoipa::path(
    get,
    path = "/api/health",
    responses(
        (status = 200, description = "Service up", body = HealthResponse, content_type = "application/json")
    ),
    tag = "System"
)]
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let stats = state.content.persistence();
    Json(HealthResponse {
        status: "ok",
        version: env!("GIT_HASH"),
        storage: state.content.storage_kind(),
        fallback_reason: state.content.fallback_reason().map(str::to_string),
        persistence_successes: stats.successes,
        persistence_failures: stats.failures,
        last_persistence_error: stats.last_failure,
        degraded: stats.degraded,
    })
}
