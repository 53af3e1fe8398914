//! Event read-view DTOs: counts, participants, and waitlist.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::RegistrationDto;
use crate::domain::{EventId, Registration, UserId};
use crate::persistence::EventSummary;

/// Response body for `GET /events/{event_id}/summary`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct EventSummaryResponse {
    /// Event identifier.
    pub event_id: EventId,
    /// Configured capacity.
    pub capacity: u32,
    /// Confirmed registrations.
    pub spots_filled: u32,
    /// Free slots.
    pub spots_remaining: u32,
    /// Waitlisted registrations.
    pub waitlist_count: u32,
    /// Withdrawn registrations.
    pub withdrawn_count: u32,
}

impl From<EventSummary> for EventSummaryResponse {
    fn from(s: EventSummary) -> Self {
        Self {
            event_id: s.event_id,
            capacity: s.capacity,
            spots_filled: s.confirmed,
            spots_remaining: s.spots_remaining(),
            waitlist_count: s.waitlist,
            withdrawn_count: s.withdrawn,
        }
    }
}

/// Response body for `GET /events/{event_id}/participants`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ParticipantListResponse {
    /// Event identifier.
    pub event_id: EventId,
    /// Confirmed registrations in arrival order.
    pub participants: Vec<RegistrationDto>,
}

/// One waitlisted member and their place in the queue.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct WaitlistEntryDto {
    /// 1-based queue position; 1 is promoted next.
    pub position: u32,
    /// Member.
    pub user_id: UserId,
    /// Arrival instant.
    pub created_at: DateTime<Utc>,
}

/// Response body for `GET /events/{event_id}/waitlist`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct WaitlistResponse {
    /// Event identifier.
    pub event_id: EventId,
    /// Waitlisted members in promotion order.
    pub waitlist: Vec<WaitlistEntryDto>,
}

impl WaitlistResponse {
    /// Numbers an already ordered queue from 1.
    #[must_use]
    pub fn from_queue(event_id: EventId, queue: Vec<Registration>) -> Self {
        let waitlist = queue
            .into_iter()
            .zip(1u32..)
            .map(|(r, position)| WaitlistEntryDto {
                position,
                user_id: r.user_id,
                created_at: r.created_at,
            })
            .collect();
        Self { event_id, waitlist }
    }
}
