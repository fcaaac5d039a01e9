use std::sync::Arc;

use axum::{Json, body::Bytes, extract::State};
use serde_json::Value;

use super::super::state::AppState;
use super::super::types::{
    ContentDocument, ErrorBody, HeroFields, PhilosophyFields, ServiceItem,
    WriteResponse,
};
use crate::content::{ContentSnapshot, SectionName, SectionUpdate};

pub fn read_all(state: &AppState) -> ContentSnapshot {
    state.content.get_all()
}

/// Apply a payload of any shape. The caller has already authenticated.
pub async fn write_section(state: &AppState, section: SectionName, payload: Value) -> WriteResponse {
    let updated = state
        .content
        .upsert(SectionUpdate::parse(section, payload))
        .await;
    WriteResponse {
        success: true,
        data: updated.to_value(),
    }
}

async fn write(state: &AppState, section: SectionName, body: &[u8]) -> Json<WriteResponse> {
    Json(write_section(state, section, super::json_or_null(body)).await)
}

/// All content sections
#[utoipa::path(
    get,
    path = "/api/cms/content",
    responses(
        (status = 200, description = "Every section keyed by name", body = ContentDocument)
    ),
    tag = "Content"
)]
pub async fn get_content(State(state): State<Arc<AppState>>) -> Json<ContentSnapshot> {
    Json(read_all(&state))
}

/// Merge fields into the hero section
#[utoipa::path(
    post,
    path = "/api/cms/hero",
    request_body = HeroFields,
    responses(
        (status = 200, description = "Merged hero section", body = WriteResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorBody)
    ),
    security(("bearer_jwt" = [])),
    tag = "Content"
)]
pub async fn write_hero(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Json<WriteResponse> {
    write(&state, SectionName::Hero, &body).await
}

/// Replace the service list
#[utoipa::path(
    post,
    path = "/api/cms/services",
    request_body = Vec<ServiceItem>,
    responses(
        (status = 200, description = "New service list", body = WriteResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorBody)
    ),
    security(("bearer_jwt" = [])),
    tag = "Content"
)]
pub async fn write_services(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Json<WriteResponse> {
    write(&state, SectionName::Services, &body).await
}

/// Merge fields into the philosophy section
#[utoipa::path(
    post,
    path = "/api/cms/philosophy",
    request_body = PhilosophyFields,
    responses(
        (status = 200, description = "Merged philosophy section", body = WriteResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorBody)
    ),
    security(("bearer_jwt" = [])),
    tag = "Content"
)]
pub async fn write_philosophy(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Json<WriteResponse> {
    write(&state, SectionName::Philosophy, &body).await
}
