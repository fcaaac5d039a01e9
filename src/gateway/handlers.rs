//! HTTP handlers.
//!
//! Each direct route is a thin wrapper over a shared operation function
//! that the dispatch envelope calls as well.

mod auth;
mod content;
mod envelope;
mod health;

pub use auth::{__path_login, issue_token, login};
pub use content::{
    __path_get_content, __path_write_hero, __path_write_philosophy, __path_write_services,
    get_content, read_all, write_hero, write_philosophy, write_section, write_services,
};
pub use envelope::{__path_envelope_get, __path_envelope_post, envelope_get, envelope_post};
pub use health::{__path_health_check, HealthResponse, health_check};

use serde_json::Value;

/// Body bytes as JSON; an empty or unparseable body is `Null`.
pub(crate) fn json_or_null(body: &[u8]) -> Value {
    serde_json::from_slice(body).unwrap_or(Value::Null)
}
