//! Administrator authentication.
//!
//! One shared secret, exchanged at login for an HS256 session token.

pub mod error;
pub mod middleware;
pub mod service;

pub use error::AuthError;
pub use middleware::require_admin;
pub use service::{AdminAuthService, AuthVerdict, Claims, IssuedToken, bearer_token};
