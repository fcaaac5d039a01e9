//! Karmic CMS - content backend for the Karmic Intelligence site
//!
//! # Modules
//!
//! - [`config`] - YAML configuration with environment overrides
//! - [`logging`] - tracing subscriber setup
//! - [`auth`] - Administrator login and bearer token verification
//! - [`content`] - Sections, cache, storage backends and `ContentStore`
//! - [`gateway`] - axum router, handlers and OpenAPI docs

pub mod auth;
pub mod config;
pub mod content;
pub mod gateway;
pub mod logging;

// Convenient re-exports at crate root
pub use auth::{AdminAuthService, AuthError, AuthVerdict};
pub use config::{AppConfig, ConfigError};
pub use content::{ContentSnapshot, ContentStore, Section, SectionName, SectionUpdate};
pub use gateway::state::AppState;
