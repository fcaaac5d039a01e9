//! OpenAPI / Swagger UI Documentation
//!
//! Served only when `gateway.docs_enabled` is set:
//!
//! - Swagger UI: `http://localhost:3001/docs`
//! - OpenAPI JSON: `http://localhost:3001/api-docs/openapi.json`

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::content::SectionName;
use crate::content::store::PersistenceFailure;
use crate::content::StorageKind;
use crate::gateway::handlers::HealthResponse;
use crate::gateway::types::{
    ContentDocument, EnvelopeRequest, ErrorBody, HeroFields, LoginRequest, LoginResponse,
    PhilosophyFields, ServiceItem, WriteResponse,
};

/// Bearer token returned by `/api/auth/login`
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_jwt",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some(
                            "Administrator session token from POST /api/auth/login, valid for 24 hours",
                        ))
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Karmic CMS API",
        version = "1.0.0",
        description = "Site content sections with single-administrator editing.",
        license(
            name = "MIT"
        )
    ),
    servers(
        (url = "http://localhost:3001", description = "Development"),
    ),
    paths(
        crate::gateway::handlers::login,
        crate::gateway::handlers::get_content,
        crate::gateway::handlers::write_hero,
        crate::gateway::handlers::write_services,
        crate::gateway::handlers::write_philosophy,
        crate::gateway::handlers::envelope_get,
        crate::gateway::handlers::envelope_post,
        crate::gateway::handlers::health_check,
    ),
    components(
        schemas(
            ErrorBody,
            LoginRequest,
            LoginResponse,
            WriteResponse,
            EnvelopeRequest,
            HeroFields,
            ServiceItem,
            PhilosophyFields,
            ContentDocument,
            SectionName,
            StorageKind,
            PersistenceFailure,
            HealthResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Administrator login"),
        (name = "Content", description = "Read all sections; section writes need a bearer token"),
        (name = "System", description = "Health and persistence status")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_spec_generates() {
        let doc = ApiDoc::openapi();
        assert_eq!(doc.info.title, "Karmic CMS API");
        assert_eq!(doc.info.version, "1.0.0");
    }

    #[test]
    fn test_openapi_json_serializable() {
        let json = ApiDoc::openapi().to_json().unwrap();
        assert!(json.contains("Karmic CMS API"));
    }

    #[test]
    fn test_routes_registered() {
        let paths = ApiDoc::openapi().paths;
        for path in [
            "/api/auth/login",
            "/api/cms/content",
            "/api/cms/hero",
            "/api/cms/services",
            "/api/cms/philosophy",
            "/api/cms",
            "/api/health",
        ] {
            assert!(paths.paths.contains_key(path), "missing {path}");
        }
    }

    #[test]
    fn test_security_scheme_registered() {
        let components = ApiDoc::openapi().components.unwrap();
        assert!(components.security_schemes.contains_key("bearer_jwt"));
    }
}
