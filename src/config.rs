use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::content::StorageLayout;

/// Development fallback for the administrator password.
pub const DEV_ADMIN_PASSWORD: &str = "admin123";
/// Development fallback for the token signing key.
pub const DEV_JWT_SECRET: &str = "your-secret-key-change-this";
/// Shortest signing key accepted without a warning.
pub const MIN_JWT_SECRET_LEN: usize = 32;
/// Accepted range of `auth.token_ttl_hours` (one hour to one year).
pub const MIN_TOKEN_TTL_HOURS: i64 = 1;
pub const MAX_TOKEN_TTL_HOURS: i64 = 24 * 365;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config yaml: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("invalid value for {key}: {value}")]
    InvalidOverride { key: &'static str, value: String },

    #[error("refusing to start with weak secrets: {0}")]
    WeakSecret(String),

    #[error("{key} must be between {min} and {max}, got {value}")]
    OutOfRange {
        key: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct AppConfig {
    pub log_level: String,
    pub log_dir: String,
    pub log_file: String,
    pub use_json: bool,
    pub rotation: String,
    pub gateway: GatewayConfig,
    pub auth: AuthConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
    /// Serve Swagger UI at /docs
    pub docs_enabled: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct AuthConfig {
    pub admin_password: String,
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
    /// Fail startup instead of warning when a secret is weak
    pub strict_secrets: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    /// PostgreSQL URL; content is kept in memory only when unset
    pub database_url: Option<String>,
    pub layout: StorageLayout,
    pub backend_timeout_ms: u64,
    pub max_connections: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_dir: "./logs".to_string(),
            log_file: "karmic_cms.log".to_string(),
            use_json: false,
            rotation: "daily".to_string(),
            gateway: GatewayConfig::default(),
            auth: AuthConfig::default(),
            storage: StorageConfig::default(),
        }
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3001,
            docs_enabled: false,
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            admin_password: DEV_ADMIN_PASSWORD.to_string(),
            jwt_secret: DEV_JWT_SECRET.to_string(),
            token_ttl_hours: 24,
            strict_secrets: false,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            layout: StorageLayout::Document,
            backend_timeout_ms: 2000,
            max_connections: 5,
        }
    }
}

impl StorageConfig {
    pub fn backend_timeout(&self) -> Duration {
        Duration::from_millis(self.backend_timeout_ms)
    }
}

impl AppConfig {
    /// Load `config/{env}.yaml` (defaults if the file is absent), then apply
    /// environment overrides.
    pub fn load(env: &str) -> Result<Self, ConfigError> {
        let config_path = format!("config/{}.yaml", env);
        let mut config = if Path::new(&config_path).exists() {
            Self::from_file(&config_path)?
        } else {
            tracing::debug!("No config file at {}, using defaults", config_path);
            Self::default()
        };
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Range checks on numeric settings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let ttl = self.auth.token_ttl_hours;
        if !(MIN_TOKEN_TTL_HOURS..=MAX_TOKEN_TTL_HOURS).contains(&ttl) {
            return Err(ConfigError::OutOfRange {
                key: "auth.token_ttl_hours",
                value: ttl,
                min: MIN_TOKEN_TTL_HOURS,
                max: MAX_TOKEN_TTL_HOURS,
            });
        }
        Ok(())
    }

    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_string(),
            source,
        })?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Environment wins over the file: `ADMIN_PASSWORD`, `JWT_SECRET`,
    /// `DATABASE_URL`, `CMS_PORT`.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(password) = lookup("ADMIN_PASSWORD") {
            self.auth.admin_password = password;
        }
        if let Some(secret) = lookup("JWT_SECRET") {
            self.auth.jwt_secret = secret;
        }
        if let Some(url) = lookup("DATABASE_URL") {
            self.storage.database_url = Some(url).filter(|u| !u.is_empty());
        }
        if let Some(port) = lookup("CMS_PORT") {
            self.gateway.port = port.parse().map_err(|_| ConfigError::InvalidOverride {
                key: "CMS_PORT",
                value: port,
            })?;
        }
        Ok(())
    }

    /// Secrets still at development defaults, or too weak to sign tokens.
    pub fn secret_warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        let auth = &self.auth;
        if auth.admin_password.is_empty() {
            warnings.push("admin password is empty; every login will be rejected".to_string());
        } else if auth.admin_password == DEV_ADMIN_PASSWORD {
            warnings.push("admin password is the development default".to_string());
        }
        if auth.jwt_secret == DEV_JWT_SECRET {
            warnings.push("token signing key is the development default".to_string());
        } else if auth.jwt_secret.len() < MIN_JWT_SECRET_LEN {
            warnings.push(format!(
                "token signing key is shorter than {} bytes",
                MIN_JWT_SECRET_LEN
            ));
        }
        warnings
    }

    /// Returns the warnings to log, or an error when `strict_secrets` is set
    /// and any warning applies.
    pub fn check_secrets(&self) -> Result<Vec<String>, ConfigError> {
        let warnings = self.secret_warnings();
        if self.auth.strict_secrets && !warnings.is_empty() {
            return Err(ConfigError::WeakSecret(warnings.join("; ")));
        }
        Ok(warnings)
    }
}
