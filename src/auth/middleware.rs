use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request, header},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use super::service::{AuthVerdict, bearer_token};
use crate::gateway::{dispatch::Operation, state::AppState, types::ApiError};

/// Raw `Authorization` header value, if present and valid UTF-8.
pub fn authorization_header(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
}

/// Verdict for the bearer token carried by `headers`.
pub fn authenticate(state: &AppState, headers: &HeaderMap) -> AuthVerdict {
    state
        .auth
        .verify(bearer_token(authorization_header(headers)))
}

/// Guards write operations. Verified claims are inserted into request
/// extensions; anything else is rejected before the body is read.
/// Requests that do not resolve to a write pass through untouched, so an
/// unknown method or path still ends in the 404 fallback.
pub async fn require_admin(
    State(state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let guarded = Operation::resolve(request.method(), request.uri().path())
        .is_some_and(Operation::requires_auth);
    if !guarded {
        return Ok(next.run(request).await);
    }

    match authenticate(&state, request.headers()) {
        AuthVerdict::Authenticated(claims) => {
            request.extensions_mut().insert(claims);
            Ok(next.run(request).await)
        }
        AuthVerdict::Anonymous => {
            tracing::warn!(
                method = %request.method(),
                path = %request.uri().path(),
                "rejected unauthenticated write"
            );
            Err(ApiError::Unauthorized)
        }
    }
}
