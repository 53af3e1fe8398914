//! REST API layer: route handlers, DTOs, OpenAPI document, and router
//! composition.
//!
//! Resource endpoints are mounted under `/api/v1`; the health check and the
//! OpenAPI document live at the root.

pub mod dto;
pub mod handlers;

use axum::Router;
use utoipa::OpenApi;

use crate::app_state::AppState;

/// Path the OpenAPI JSON document is served from.
pub const OPENAPI_PATH: &str = "/api-docs/openapi.json";

/// OpenAPI description of every REST endpoint.
#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "booking-engine",
        description = "Registration engine for capacity-limited events with FIFO waitlist promotion"
    ),
    paths(
        handlers::registration::submit_registration,
        handlers::event::event_summary,
        handlers::event::list_participants,
        handlers::event::list_waitlist,
        handlers::event::get_registration,
        handlers::system::health_handler,
    ),
    components(schemas(
        dto::SubmitRegistrationRequest,
        dto::RegistrationResponse,
        dto::RegistrationDto,
        dto::EventSummaryResponse,
        dto::ParticipantListResponse,
        dto::WaitlistResponse,
        dto::WaitlistEntryDto,
        crate::error::ErrorResponse,
        crate::error::ErrorBody,
    )),
    tags(
        (name = "Registrations", description = "Register, waitlist, withdraw"),
        (name = "Events", description = "Read-only capacity and queue views"),
        (name = "System", description = "Service health"),
    )
)]
pub struct ApiDoc;

/// Builds the complete API router with all REST endpoints.
pub fn build_router() -> Router<AppState> {
    Router::new()
        .nest("/api/v1", handlers::routes())
        .merge(handlers::system::routes())
        .merge(docs_router())
}

#[cfg(feature = "swagger-ui")]
fn docs_router() -> Router<AppState> {
    Router::new().merge(
        utoipa_swagger_ui::SwaggerUi::new("/swagger-ui").url(OPENAPI_PATH, ApiDoc::openapi()),
    )
}

#[cfg(not(feature = "swagger-ui"))]
fn docs_router() -> Router<AppState> {
    use axum::Json;
    use axum::routing::get;

    Router::new().route(OPENAPI_PATH, get(|| async { Json(ApiDoc::openapi()) }))
}
