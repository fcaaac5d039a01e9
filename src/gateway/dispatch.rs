//! Method + path resolution shared by the router and the `/api/cms`
//! dispatch envelope.

use axum::{
    Json,
    http::{HeaderMap, Method},
    response::{IntoResponse, Response},
};
use serde_json::Value;

use super::handlers::{issue_token, read_all, write_section};
use super::state::AppState;
use super::types::ApiError;
use crate::auth::AuthVerdict;
use crate::auth::middleware::authenticate;
use crate::content::SectionName;

pub const LOGIN_PATH: &str = "/api/auth/login";
pub const CONTENT_PATH: &str = "/api/cms/content";
pub const HERO_PATH: &str = "/api/cms/hero";
pub const SERVICES_PATH: &str = "/api/cms/services";
pub const PHILOSOPHY_PATH: &str = "/api/cms/philosophy";
pub const HEALTH_PATH: &str = "/api/health";
pub const ENVELOPE_PATH: &str = "/api/cms";

/// A recognised content API operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Login,
    ReadAll,
    Write(SectionName),
}

impl Operation {
    pub const ALL: [Operation; 5] = [
        Operation::Login,
        Operation::ReadAll,
        Operation::Write(SectionName::Hero),
        Operation::Write(SectionName::Services),
        Operation::Write(SectionName::Philosophy),
    ];

    pub fn method(self) -> Method {
        match self {
            Self::ReadAll => Method::GET,
            Self::Login | Self::Write(_) => Method::POST,
        }
    }

    pub fn path(self) -> &'static str {
        match self {
            Self::Login => LOGIN_PATH,
            Self::ReadAll => CONTENT_PATH,
            Self::Write(SectionName::Hero) => HERO_PATH,
            Self::Write(SectionName::Services) => SERVICES_PATH,
            Self::Write(SectionName::Philosophy) => PHILOSOPHY_PATH,
        }
    }

    pub fn requires_auth(self) -> bool {
        matches!(self, Self::Write(_))
    }

    /// Exact match on method and path; a query string is ignored.
    pub fn resolve(method: &Method, target: &str) -> Option<Self> {
        let path = target.split_once('?').map_or(target, |(path, _)| path);
        Self::ALL
            .into_iter()
            .find(|op| op.method() == *method && op.path() == path)
    }

    /// Run the operation the way its direct route would. Write operations
    /// check the bearer token in `headers` before touching the store.
    pub async fn execute(
        self,
        state: &AppState,
        headers: &HeaderMap,
        body: Value,
    ) -> Result<Response, ApiError> {
        match self {
            Self::Login => Ok(Json(issue_token(state, body)?).into_response()),
            Self::ReadAll => Ok(Json(read_all(state)).into_response()),
            Self::Write(section) => {
                if let AuthVerdict::Anonymous = authenticate(state, headers) {
                    tracing::warn!(section = %section, "rejected unauthenticated write via envelope");
                    return Err(ApiError::Unauthorized);
                }
                Ok(Json(write_section(state, section, body).await).into_response())
            }
        }
    }
}
