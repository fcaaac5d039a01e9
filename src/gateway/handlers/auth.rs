use std::sync::Arc;

use axum::{Json, body::Bytes, extract::State};
use serde_json::Value;

use super::super::state::AppState;
use super::super::types::{ApiError, ErrorBody, LoginRequest, LoginResponse};

/// Exchange the administrator secret for a session token.
pub fn issue_token(state: &AppState, body: Value) -> Result<LoginResponse, ApiError> {
    let request: LoginRequest = serde_json::from_value(body).unwrap_or_default();
    match state.auth.login(&request.secret) {
        Ok(issued) => {
            tracing::info!(token_id = %issued.token_id, "administrator logged in");
            Ok(LoginResponse {
                token: issued.token,
                expires_at: issued.expires_at.to_rfc3339(),
            })
        }
        Err(e) => {
            tracing::warn!(error = e.name(), "administrator login failed");
            Err(e.into())
        }
    }
}

/// Administrator login
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Token issued", body = LoginResponse),
        (status = 401, description = "Secret mismatch", body = ErrorBody)
    ),
    tag = "Auth"
)]
pub async fn login(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<LoginResponse>, ApiError> {
    issue_token(&state, super::json_or_null(&body)).map(Json)
}
