use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::AuthError;
use crate::config::{AuthConfig, MAX_TOKEN_TTL_HOURS, MIN_TOKEN_TTL_HOURS};

/// Subject of every administrator token.
pub const ADMIN_SUBJECT: &str = "admin";
/// Role claim carried by administrator tokens.
pub const ADMIN_ROLE: &str = "administrator";

/// JWT Claims structure
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    pub sub: String,
    pub role: String,
    /// Token id, only used to correlate log lines.
    pub jti: String,
    pub exp: usize,
    pub iat: usize,
}

/// A freshly signed session token.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub token_id: String,
    pub expires_at: DateTime<Utc>,
}

/// Outcome of checking a bearer token. Never an error: anonymous callers
/// are a normal, read-only case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthVerdict {
    Authenticated(Claims),
    Anonymous,
}

impl AuthVerdict {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }
}

/// Single-administrator credential check and stateless token issue/verify.
///
/// There is no revocation: a token stays valid until `exp`, and rotating
/// `jwt_secret` (restart) is the only way to invalidate issued tokens.
pub struct AdminAuthService {
    admin_password: String,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    token_ttl: Duration,
}

impl AdminAuthService {
    pub fn new(admin_password: impl Into<String>, jwt_secret: &str, token_ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);
        validation.sub = Some(ADMIN_SUBJECT.to_string());

        Self {
            admin_password: admin_password.into(),
            encoding_key: EncodingKey::from_secret(jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(jwt_secret.as_bytes()),
            validation,
            token_ttl,
        }
    }

    /// The TTL is clamped to the range `AppConfig::validate` enforces.
    pub fn from_config(config: &AuthConfig) -> Self {
        let hours = config
            .token_ttl_hours
            .clamp(MIN_TOKEN_TTL_HOURS, MAX_TOKEN_TTL_HOURS);
        Self::new(
            config.admin_password.clone(),
            &config.jwt_secret,
            Duration::hours(hours),
        )
    }

    pub fn token_ttl(&self) -> Duration {
        self.token_ttl
    }

    /// Check the submitted secret and issue a token valid for the TTL.
    pub fn login(&self, secret: &str) -> Result<IssuedToken, AuthError> {
        self.login_at(secret, Utc::now())
    }

    /// `login` with an explicit issue time.
    pub fn login_at(&self, secret: &str, issued_at: DateTime<Utc>) -> Result<IssuedToken, AuthError> {
        // An empty configured password must not let an empty submission in.
        if self.admin_password.is_empty() || secret != self.admin_password {
            return Err(AuthError::InvalidCredential);
        }

        let expires_at = issued_at
            .checked_add_signed(self.token_ttl)
            .ok_or(AuthError::ExpiryOutOfRange)?;
        let token_id = Uuid::new_v4().to_string();
        let claims = Claims {
            sub: ADMIN_SUBJECT.to_string(),
            role: ADMIN_ROLE.to_string(),
            jti: token_id.clone(),
            exp: expires_at.timestamp().max(0) as usize,
            iat: issued_at.timestamp().max(0) as usize,
        };

        let token = encode(&Header::default(), &claims, &self.encoding_key)?;
        Ok(IssuedToken {
            token,
            token_id,
            expires_at,
        })
    }

    /// Verify JWT token: signature, expiry and administrator role.
    pub fn verify_token(&self, token: &str) -> Result<Claims, AuthError> {
        self.verify_token_at(token, Utc::now())
    }

    /// `verify_token` at an explicit time. A token is valid while
    /// `now < exp`; the library check alone still accepts `now == exp`.
    pub fn verify_token_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, AuthError> {
        let token_data = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|_| AuthError::Unauthorized)?;
        let claims = token_data.claims;
        if claims.role != ADMIN_ROLE || claims.exp as i64 <= now.timestamp() {
            return Err(AuthError::Unauthorized);
        }
        Ok(claims)
    }

    /// Absent, malformed, forged or expired tokens all yield `Anonymous`.
    pub fn verify(&self, token: Option<&str>) -> AuthVerdict {
        match token.map(|t| self.verify_token(t)) {
            Some(Ok(claims)) => AuthVerdict::Authenticated(claims),
            Some(Err(_)) | None => AuthVerdict::Anonymous,
        }
    }
}

/// Token part of an `Authorization: Bearer <token>` header value.
pub fn bearer_token(header: Option<&str>) -> Option<&str> {
    let value = header?.trim();
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET_KEY: &str = "test-signing-key-with-enough-length!";

    fn service() -> AdminAuthService {
        AdminAuthService::new("open sesame", SECRET_KEY, Duration::hours(24))
    }

    #[test]
    fn test_login_then_verify() {
        let auth = service();
        let issued = auth.login("open sesame").unwrap();

        let verdict = auth.verify(Some(issued.token.as_str()));
        let AuthVerdict::Authenticated(claims) = verdict else {
            panic!("fresh token should verify");
        };
        assert_eq!(claims.role, ADMIN_ROLE);
        assert_eq!(claims.jti, issued.token_id);
        assert_eq!(claims.exp - claims.iat, 24 * 3600);
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let auth = service();
        for secret in ["", "open", "open sesame ", "OPEN SESAME"] {
            assert!(matches!(auth.login(secret), Err(AuthError::InvalidCredential)));
        }
    }

    #[test]
    fn test_empty_configured_password_rejects_everything() {
        let auth = AdminAuthService::new("", SECRET_KEY, Duration::hours(24));
        assert!(matches!(auth.login(""), Err(AuthError::InvalidCredential)));
    }

    #[test]
    fn test_token_expires_after_ttl() {
        let auth = service();
        let still_valid = auth
            .login_at("open sesame", Utc::now() - Duration::hours(23))
            .unwrap();
        let expired = auth
            .login_at("open sesame", Utc::now() - Duration::hours(25))
            .unwrap();

        assert!(auth.verify(Some(still_valid.token.as_str())).is_authenticated());
        assert_eq!(auth.verify(Some(expired.token.as_str())), AuthVerdict::Anonymous);
    }

    #[test]
    fn test_token_is_rejected_at_exact_expiry() {
        let auth = service();
        let issued_at = Utc::now() - Duration::hours(1);
        let issued = auth.login_at("open sesame", issued_at).unwrap();
        let exp = issued_at + Duration::hours(24);

        assert!(auth
            .verify_token_at(&issued.token, exp - Duration::seconds(1))
            .is_ok());
        assert!(matches!(
            auth.verify_token_at(&issued.token, exp),
            Err(AuthError::Unauthorized)
        ));
    }

    #[test]
    fn test_token_expiring_this_second_is_anonymous() {
        let auth = service();
        let issued = auth
            .login_at("open sesame", Utc::now() - Duration::hours(24))
            .unwrap();
        assert_eq!(auth.verify(Some(issued.token.as_str())), AuthVerdict::Anonymous);
    }

    #[test]
    fn test_from_config_never_builds_an_unusable_ttl() {
        let mut config = AuthConfig {
            admin_password: "open sesame".to_string(),
            jwt_secret: SECRET_KEY.to_string(),
            token_ttl_hours: i64::MAX,
            strict_secrets: false,
        };
        let auth = AdminAuthService::from_config(&config);
        assert_eq!(auth.token_ttl(), Duration::hours(MAX_TOKEN_TTL_HOURS));
        assert!(auth.login("open sesame").is_ok());

        config.token_ttl_hours = -5;
        let auth = AdminAuthService::from_config(&config);
        let issued = auth.login("open sesame").unwrap();
        assert!(auth.verify(Some(issued.token.as_str())).is_authenticated());
    }

    #[test]
    fn test_overflowing_expiry_is_an_error() {
        let auth = AdminAuthService::new("open sesame", SECRET_KEY, Duration::MAX);
        assert!(matches!(
            auth.login("open sesame"),
            Err(AuthError::ExpiryOutOfRange)
        ));
    }

    #[test]
    fn test_token_from_other_key_is_rejected() {
        let issuer = AdminAuthService::new("open sesame", "another-key", Duration::hours(24));
        let token = issuer.login("open sesame").unwrap().token;
        assert_eq!(service().verify(Some(token.as_str())), AuthVerdict::Anonymous);
    }

    #[test]
    fn test_non_admin_role_is_rejected() {
        let claims = Claims {
            sub: ADMIN_SUBJECT.to_string(),
            role: "viewer".to_string(),
            jti: "x".to_string(),
            exp: (Utc::now() + Duration::hours(1)).timestamp() as usize,
            iat: Utc::now().timestamp() as usize,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SECRET_KEY.as_bytes()),
        )
        .unwrap();
        assert!(matches!(
            service().verify_token(&token),
            Err(AuthError::Unauthorized)
        ));
    }

    #[test]
    fn test_absent_or_malformed_token_is_anonymous() {
        let auth = service();
        assert_eq!(auth.verify(None), AuthVerdict::Anonymous);
        assert_eq!(auth.verify(Some("")), AuthVerdict::Anonymous);
        assert_eq!(auth.verify(Some("not.a.jwt")), AuthVerdict::Anonymous);
    }

    #[test]
    fn test_bearer_token_parsing() {
        assert_eq!(bearer_token(Some("Bearer abc.def")), Some("abc.def"));
        assert_eq!(bearer_token(Some("bearer  abc")), Some("abc"));
        assert_eq!(bearer_token(Some("Basic abc")), None);
        assert_eq!(bearer_token(Some("Bearer")), None);
        assert_eq!(bearer_token(Some("Bearer   ")), None);
        assert_eq!(bearer_token(None), None);
    }
}
