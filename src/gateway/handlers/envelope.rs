//! Single-endpoint dispatch used by the admin dashboard:
//! `POST /api/cms {url, method, data}` and `GET /api/cms?url=...`.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{HeaderMap, Method},
    response::Response,
};
use serde_json::Value;

use super::super::dispatch::Operation;
use super::super::state::AppState;
use super::super::types::{ApiError, EnvelopeQuery, EnvelopeRequest, ErrorBody};

/// Dispatch a read through the envelope
#[utoipa::path(
    get,
    path = "/api/cms",
    params(EnvelopeQuery),
    responses(
        (status = 200, description = "Same body as the target route"),
        (status = 404, description = "Unknown target", body = ErrorBody)
    ),
    tag = "Content"
)]
pub async fn envelope_get(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<EnvelopeQuery>,
) -> Result<Response, ApiError> {
    let url = query.url.ok_or(ApiError::RouteNotFound)?;
    let op = Operation::resolve(&Method::GET, &url).ok_or(ApiError::RouteNotFound)?;
    op.execute(&state, &headers, Value::Null).await
}

/// Dispatch any operation through the envelope
#[utoipa::path(
    post,
    path = "/api/cms",
    request_body = EnvelopeRequest,
    responses(
        (status = 200, description = "Same body as the target route"),
        (status = 401, description = "Bad secret or token", body = ErrorBody),
        (status = 404, description = "Unknown target or malformed envelope", body = ErrorBody)
    ),
    tag = "Content"
)]
pub async fn envelope_post(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    // Without a readable `url` there is no target to resolve.
    let envelope: EnvelopeRequest =
        serde_json::from_slice(&body).map_err(|_| ApiError::RouteNotFound)?;
    let method = match envelope.method.as_deref() {
        Some(m) => Method::from_bytes(m.to_ascii_uppercase().as_bytes())
            .map_err(|_| ApiError::RouteNotFound)?,
        None => Method::POST,
    };
    let op = Operation::resolve(&method, &envelope.url).ok_or(ApiError::RouteNotFound)?;
    tracing::debug!(target_url = %envelope.url, op = ?op, "envelope dispatch");
    op.execute(&state, &headers, envelope.data.unwrap_or(Value::Null))
        .await
}
