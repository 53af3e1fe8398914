//! Registration submit handler.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};

use crate::api::dto::{
    EVENT_FULL_WAITLISTED, REGISTRATION_UPDATED, RegistrationResponse, SubmitRegistrationRequest,
};
use crate::app_state::AppState;
use crate::error::{BookingError, ErrorResponse};
use crate::service::{SubmitCommand, SubmitOutcome};

/// `POST /registrations` — Register for or withdraw from an event.
///
/// # Errors
///
/// Returns [`BookingError`] on invalid input, unknown event, or store
/// contention.
#[utoipa::path(
    post,
    path = "/api/v1/registrations",
    tag = "Registrations",
    summary = "Submit a registration",
    description = "Registers the member for the event (`confirmed`) or withdraws them (`withdrawn`). A full event places new registrants on the waitlist and answers 409 with the waitlist status. A withdrawal promotes the earliest waitlisted member into the freed slot.",
    request_body = SubmitRegistrationRequest,
    responses(
        (status = 200, description = "Registration applied", body = RegistrationResponse),
        (status = 204, description = "Withdrawal accepted"),
        (status = 400, description = "Missing or malformed fields", body = ErrorResponse),
        (status = 404, description = "Event not found", body = ErrorResponse),
        (status = 409, description = "Event full, added to the waitlist", body = RegistrationResponse),
        (status = 503, description = "Store contention, safe to retry", body = ErrorResponse),
    )
)]
pub async fn submit_registration(
    State(state): State<AppState>,
    payload: Result<Json<SubmitRegistrationRequest>, JsonRejection>,
) -> Result<Response, BookingError> {
    let Json(req) = payload.map_err(|e| BookingError::InvalidRequest(e.body_text()))?;
    let cmd = SubmitCommand::from_parts(req.user_id, req.event_id, req.status.as_deref())?;

    let response = match state.engine.submit(cmd).await? {
        SubmitOutcome::Registered(registration) => (
            StatusCode::OK,
            Json(RegistrationResponse {
                status: registration.status,
                message: REGISTRATION_UPDATED.to_string(),
            }),
        )
            .into_response(),
        SubmitOutcome::CapacityConflict(registration) => (
            StatusCode::CONFLICT,
            Json(RegistrationResponse {
                status: registration.status,
                message: EVENT_FULL_WAITLISTED.to_string(),
            }),
        )
            .into_response(),
        SubmitOutcome::Withdrawn { .. } => StatusCode::NO_CONTENT.into_response(),
    };

    Ok(response)
}

/// Registration routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/registrations", post(submit_registration))
}
