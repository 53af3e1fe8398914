//! Registration submit DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{EventId, Registration, RegistrationStatus, UserId};

/// Message returned when a registration is applied as requested.
pub const REGISTRATION_UPDATED: &str = "Registration updated";

/// Message returned when a full event puts the caller on the waitlist.
pub const EVENT_FULL_WAITLISTED: &str = "Event is full. You have been added to the waitlist.";

/// Request body for `POST /registrations`.
///
/// Every field is optional at the serde level so that a missing field is
/// reported as a validation error rather than a parse failure.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct SubmitRegistrationRequest {
    /// Member registering or withdrawing.
    #[serde(default, alias = "userId")]
    pub user_id: Option<i64>,
    /// Target event.
    #[serde(default, alias = "eventId")]
    pub event_id: Option<i64>,
    /// `"confirmed"` or `"withdrawn"`.
    #[serde(default)]
    pub status: Option<String>,
}

/// Response body for `POST /registrations` (200 and 409).
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RegistrationResponse {
    /// Final status of the caller's registration.
    pub status: RegistrationStatus,
    /// Human-readable outcome.
    pub message: String,
}

/// A registration as exposed by read endpoints.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RegistrationDto {
    /// Member.
    pub user_id: UserId,
    /// Event.
    pub event_id: EventId,
    /// Current status.
    pub status: RegistrationStatus,
    /// Arrival instant used for waitlist ordering.
    pub created_at: DateTime<Utc>,
    /// Last status change.
    pub updated_at: DateTime<Utc>,
}

impl From<Registration> for RegistrationDto {
    fn from(r: Registration) -> Self {
        Self {
            user_id: r.user_id,
            event_id: r.event_id,
            status: r.status,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}
