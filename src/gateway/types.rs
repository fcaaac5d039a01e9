//! Request/response bodies and the HTTP error type.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use utoipa::ToSchema;

use crate::auth::AuthError;

/// Error body: `{ "error": "..." }`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    #[schema(example = "Unauthorized")]
    pub error: String,
}

#[derive(Debug, Deserialize, Default, ToSchema)]
#[serde(default)]
pub struct LoginRequest {
    /// Administrator secret. `password` is accepted as an alias.
    #[serde(alias = "password")]
    pub secret: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
    /// RFC 3339 expiry of the token.
    pub expires_at: String,
}

/// Body of a successful section write.
#[derive(Debug, Serialize, ToSchema)]
pub struct WriteResponse {
    pub success: bool,
    /// The section after the update.
    #[schema(value_type = Object)]
    pub data: Value,
}

/// Body of `POST /api/cms`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct EnvelopeRequest {
    #[schema(example = "/api/cms/hero")]
    pub url: String,
    /// Inner HTTP method, `POST` when absent.
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    #[schema(value_type = Object)]
    pub data: Option<Value>,
}

/// Query of `GET /api/cms`.
#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct EnvelopeQuery {
    /// Target route, e.g. `/api/cms/content`
    pub url: Option<String>,
}

// ============================================================================
// Documentation-only schemas for the seeded content shape
// ============================================================================

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HeroFields {
    #[schema(example = "The Conscious Architect")]
    pub subtitle: Option<String>,
    #[schema(example = "Karmic Intelligence")]
    pub title: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ServiceItem {
    pub id: i64,
    #[schema(example = "Astro-Vastu Consultation")]
    pub title: String,
    pub description: String,
    /// Icon name understood by the front end
    #[schema(example = "Building2")]
    pub icon: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PhilosophyFields {
    #[schema(example = "Our Philosophy")]
    pub title: Option<String>,
    pub content: Option<String>,
}

/// Full section mapping as returned by `GET /api/cms/content`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ContentDocument {
    pub hero: HeroFields,
    pub services: Vec<ServiceItem>,
    pub philosophy: PhilosophyFields,
}

// ============================================================================
// Errors
// ============================================================================

/// Every failure a request can end in. Client-facing bodies never carry
/// internal detail.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Invalid password")]
    InvalidCredential,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Not found")]
    RouteNotFound,

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidCredential | Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::RouteNotFound => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredential => Self::InvalidCredential,
            AuthError::Unauthorized => Self::Unauthorized,
            AuthError::TokenIssue(e) => Self::Internal(e.to_string()),
            e @ AuthError::ExpiryOutOfRange => Self::Internal(e.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let error = match &self {
            Self::Internal(detail) => {
                tracing::error!(error = %detail, "request failed");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };
        (self.status(), Json(ErrorBody { error })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_request_accepts_both_field_names() {
        let req: LoginRequest = serde_json::from_str(r#"{"secret":"s1"}"#).unwrap();
        assert_eq!(req.secret, "s1");
        let req: LoginRequest = serde_json::from_str(r#"{"password":"s2"}"#).unwrap();
        assert_eq!(req.secret, "s2");
        let req: LoginRequest = serde_json::from_str("{}").unwrap();
        assert!(req.secret.is_empty());
    }

    #[test]
    fn test_error_statuses() {
        assert_eq!(ApiError::InvalidCredential.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::Unauthorized.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::RouteNotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::Internal("x".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_client_messages() {
        assert_eq!(ApiError::InvalidCredential.to_string(), "Invalid password");
        assert_eq!(ApiError::RouteNotFound.to_string(), "Not found");
    }

    #[test]
    fn test_seed_content_matches_documented_shape() {
        let snapshot = crate::content::ContentSnapshot::defaults();
        let doc: ContentDocument = serde_json::from_value(snapshot.to_value()).unwrap();
        assert_eq!(doc.services.len(), 2);
        assert_eq!(doc.hero.title.as_deref(), Some("Karmic Intelligence"));
    }
}
