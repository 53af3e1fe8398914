//! Read-only event views: counts, participants, waitlist, single registration.
//!
//! These read committed data outside the event lock and may lag an
//! in-flight submit.

use axum::extract::rejection::PathRejection;
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::dto::{
    EventSummaryResponse, ParticipantListResponse, RegistrationDto, WaitlistResponse,
};
use crate::app_state::AppState;
use crate::domain::{EventId, UserId};
use crate::error::{BookingError, ErrorResponse};
use crate::service::registration_engine::positive_id;

/// `GET /events/:event_id/summary` — Capacity and per-status counts.
///
/// # Errors
///
/// Returns [`BookingError::EventNotFound`] if the event does not exist.
#[utoipa::path(
    get,
    path = "/api/v1/events/{event_id}/summary",
    tag = "Events",
    summary = "Event capacity summary",
    params(("event_id" = i64, Path, description = "Event id")),
    responses(
        (status = 200, description = "Counts", body = EventSummaryResponse),
        (status = 400, description = "Malformed event id", body = ErrorResponse),
        (status = 404, description = "Event not found", body = ErrorResponse),
    )
)]
pub async fn event_summary(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<impl IntoResponse, BookingError> {
    let event_id = event_id_from(path)?;
    let summary = state.engine.event_summary(event_id).await?;
    Ok(Json(EventSummaryResponse::from(summary)))
}

/// `GET /events/:event_id/participants` — Confirmed registrations.
///
/// # Errors
///
/// Returns [`BookingError::EventNotFound`] if the event does not exist.
#[utoipa::path(
    get,
    path = "/api/v1/events/{event_id}/participants",
    tag = "Events",
    summary = "List confirmed participants",
    params(("event_id" = i64, Path, description = "Event id")),
    responses(
        (status = 200, description = "Confirmed registrations in arrival order", body = ParticipantListResponse),
        (status = 404, description = "Event not found", body = ErrorResponse),
    )
)]
pub async fn list_participants(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<impl IntoResponse, BookingError> {
    let event_id = event_id_from(path)?;
    let participants = state.engine.participants(event_id).await?;
    Ok(Json(ParticipantListResponse {
        event_id,
        participants: participants.into_iter().map(RegistrationDto::from).collect(),
    }))
}

/// `GET /events/:event_id/waitlist` — Waitlist in promotion order.
///
/// # Errors
///
/// Returns [`BookingError::EventNotFound`] if the event does not exist.
#[utoipa::path(
    get,
    path = "/api/v1/events/{event_id}/waitlist",
    tag = "Events",
    summary = "List the waitlist",
    description = "Position 1 is the next member promoted when a slot frees up.",
    params(("event_id" = i64, Path, description = "Event id")),
    responses(
        (status = 200, description = "Waitlisted members", body = WaitlistResponse),
        (status = 404, description = "Event not found", body = ErrorResponse),
    )
)]
pub async fn list_waitlist(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<impl IntoResponse, BookingError> {
    let event_id = event_id_from(path)?;
    let queue = state.engine.waitlist(event_id).await?;
    Ok(Json(WaitlistResponse::from_queue(event_id, queue)))
}

/// `GET /events/:event_id/registrations/:user_id` — One member's registration.
///
/// # Errors
///
/// Returns [`BookingError::EventNotFound`] or
/// [`BookingError::RegistrationNotFound`].
#[utoipa::path(
    get,
    path = "/api/v1/events/{event_id}/registrations/{user_id}",
    tag = "Events",
    summary = "Get a member's registration",
    params(
        ("event_id" = i64, Path, description = "Event id"),
        ("user_id" = i64, Path, description = "Member id"),
    ),
    responses(
        (status = 200, description = "Registration", body = RegistrationDto),
        (status = 404, description = "Event or registration not found", body = ErrorResponse),
    )
)]
pub async fn get_registration(
    State(state): State<AppState>,
    path: Result<Path<(i64, i64)>, PathRejection>,
) -> Result<impl IntoResponse, BookingError> {
    let Path((raw_event, raw_user)) =
        path.map_err(|e| BookingError::InvalidRequest(e.body_text()))?;
    let event_id = positive_id(raw_event, EventId::label(), EventId::parse)?;
    let user_id = positive_id(raw_user, UserId::label(), UserId::parse)?;
    let registration = state.engine.registration(user_id, event_id).await?;
    Ok(Json(RegistrationDto::from(registration)))
}

/// Event routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/events/{event_id}/summary", get(event_summary))
        .route("/events/{event_id}/participants", get(list_participants))
        .route("/events/{event_id}/waitlist", get(list_waitlist))
        .route(
            "/events/{event_id}/registrations/{user_id}",
            get(get_registration),
        )
}

fn event_id_from(path: Result<Path<i64>, PathRejection>) -> Result<EventId, BookingError> {
    let Path(raw) = path.map_err(|e| BookingError::InvalidRequest(e.body_text()))?;
    positive_id(raw, EventId::label(), EventId::parse)
}
