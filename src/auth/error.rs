//! Authentication error types.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    /// Submitted secret does not match the administrator secret.
    #[error("invalid credential")]
    InvalidCredential,

    /// Token missing, malformed, wrongly signed or expired.
    #[error("missing, invalid or expired token")]
    Unauthorized,

    #[error("failed to sign token: {0}")]
    TokenIssue(#[from] jsonwebtoken::errors::Error),

    /// Issue time plus TTL is not a representable timestamp.
    #[error("token expiry out of range")]
    ExpiryOutOfRange,
}

impl AuthError {
    /// Error name safe to show to clients and to put in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::InvalidCredential => "INVALID_CREDENTIAL",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::TokenIssue(_) => "TOKEN_ISSUE",
            Self::ExpiryOutOfRange => "EXPIRY_OUT_OF_RANGE",
        }
    }
}
