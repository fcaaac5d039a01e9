//! HTTP gateway: routing, CORS, auth guard and server loop.

pub mod dispatch;
pub mod handlers;
pub mod openapi;
pub mod state;
pub mod types;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode},
    middleware::{Next, from_fn, from_fn_with_state},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::auth::require_admin;
use crate::config::GatewayConfig;
use crate::content::SectionName;
use dispatch::{ENVELOPE_PATH, HEALTH_PATH, Operation};
use state::AppState;
use types::ApiError;

/// Any `OPTIONS` request ends here with 200 and no body. CORS preflights
/// are answered one layer further out by `CorsLayer`.
async fn short_circuit_options(request: Request<Body>, next: Next) -> Response {
    if request.method() == Method::OPTIONS {
        return StatusCode::OK.into_response();
    }
    next.run(request).await
}

async fn not_found() -> ApiError {
    ApiError::RouteNotFound
}

/// Build the full application router.
pub fn router(state: Arc<AppState>, docs_enabled: bool) -> Router {
    let app = Router::new()
        .route(Operation::Login.path(), post(handlers::login))
        .route(Operation::ReadAll.path(), get(handlers::get_content))
        .route(
            Operation::Write(SectionName::Hero).path(),
            post(handlers::write_hero),
        )
        .route(
            Operation::Write(SectionName::Services).path(),
            post(handlers::write_services),
        )
        .route(
            Operation::Write(SectionName::Philosophy).path(),
            post(handlers::write_philosophy),
        )
        .route(
            ENVELOPE_PATH,
            get(handlers::envelope_get).post(handlers::envelope_post),
        )
        .route(HEALTH_PATH, get(handlers::health_check))
        .fallback(not_found)
        .method_not_allowed_fallback(not_found)
        .layer(from_fn_with_state(state.clone(), require_admin))
        .with_state(state);

    let app = if docs_enabled {
        app.merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", openapi::ApiDoc::openapi()))
    } else {
        app
    };

    app.layer(from_fn(short_circuit_options))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Bind and serve until the process is stopped.
pub async fn run_server(config: &GatewayConfig, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = router(state, config.docs_enabled);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&addr).await.map_err(|e| {
        anyhow::anyhow!(
            "failed to bind {}: {} (port {} may already be in use)",
            addr,
            e,
            config.port
        )
    })?;

    tracing::info!("Content API listening on http://{}", addr);
    if config.docs_enabled {
        tracing::info!("API docs: http://{}/docs", addr);
    }

    axum::serve(listener, app).await?;
    Ok(())
}
