//! Karmic CMS server
//!
//! ```text
//! karmic_cms [--env|-e <name>] [--port <port>]
//! ```
//!
//! Reads `config/<name>.yaml` (default `dev`), connects the configured
//! storage backend (or stays in memory) and serves the content API.

use std::sync::Arc;

use karmic_cms::config::AppConfig;
use karmic_cms::gateway::{self, state::AppState};
use karmic_cms::{AdminAuthService, ContentStore};

fn get_env() -> String {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if (args[i] == "--env" || args[i] == "-e") && i + 1 < args.len() {
            return args[i + 1].clone();
        }
    }
    "dev".to_string()
}

/// Get port override from command line (--port argument)
fn get_port_override() -> Option<u16> {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if args[i] == "--port" && i + 1 < args.len() {
            return args[i + 1].parse().ok();
        }
    }
    None
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env = get_env();
    let mut app_config = AppConfig::load(&env)?;
    if let Some(port) = get_port_override() {
        app_config.gateway.port = port;
    }
    let _log_guard = karmic_cms::logging::init_logging(&app_config);

    tracing::info!(
        "Starting Karmic CMS in {} mode (build {})",
        env,
        env!("GIT_HASH")
    );

    for warning in app_config.check_secrets()? {
        tracing::warn!("[SECURITY] {}", warning);
    }

    let content = ContentStore::open(&app_config.storage).await;
    if let Some(reason) = content.fallback_reason() {
        tracing::warn!("Serving content from memory only: {}", reason);
    }
    tracing::info!("Content storage: {:?}", content.storage_kind());

    let auth = AdminAuthService::from_config(&app_config.auth);
    let state = Arc::new(AppState::new(Arc::new(content), Arc::new(auth)));

    gateway::run_server(&app_config.gateway, state).await
}
