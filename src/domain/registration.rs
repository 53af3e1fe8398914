//! Events, registrations, and the status values they move through.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{EventId, UserId};

/// Status of a member's registration for an event.
///
/// Exactly one value at any time. Only `Confirmed` counts against
/// capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationStatus {
    /// Holds a guaranteed slot.
    Confirmed,
    /// Queued in arrival order until a slot frees up.
    Waitlist,
    /// Released by the member; may register again later.
    Withdrawn,
}

impl RegistrationStatus {
    /// Storage and wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Confirmed => "confirmed",
            Self::Waitlist => "waitlist",
            Self::Withdrawn => "withdrawn",
        }
    }
}

impl fmt::Display for RegistrationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a status string is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognized registration status: {0:?}")]
pub struct UnknownStatus(pub String);

impl FromStr for RegistrationStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "confirmed" => Ok(Self::Confirmed),
            "waitlist" => Ok(Self::Waitlist),
            "withdrawn" => Ok(Self::Withdrawn),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

/// Status a caller may ask for when submitting.
///
/// A member cannot ask to be waitlisted; that placement is decided by
/// admission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DesiredStatus {
    /// Take a slot, or join the waitlist if the event is full.
    Confirmed,
    /// Release any slot or waitlist place.
    Withdrawn,
}

impl DesiredStatus {
    /// Wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Confirmed => "confirmed",
            Self::Withdrawn => "withdrawn",
        }
    }
}

impl fmt::Display for DesiredStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DesiredStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "confirmed" => Ok(Self::Confirmed),
            "withdrawn" => Ok(Self::Withdrawn),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

impl From<DesiredStatus> for RegistrationStatus {
    fn from(desired: DesiredStatus) -> Self {
        match desired {
            DesiredStatus::Confirmed => Self::Confirmed,
            DesiredStatus::Withdrawn => Self::Withdrawn,
        }
    }
}

/// The capacity view of an event that the engine reads. Never mutated by
/// the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Event {
    /// Event identifier.
    pub id: EventId,
    /// Maximum number of simultaneous confirmed registrations.
    pub capacity: u32,
}

/// One member's evolving registration for one event.
///
/// At most one exists per `(user_id, event_id)`. Rows are never deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Registration {
    /// Row sequence number; breaks `created_at` ties.
    pub id: i64,
    /// Registered member.
    pub user_id: UserId,
    /// Event registered for.
    pub event_id: EventId,
    /// Current status.
    pub status: RegistrationStatus,
    /// Arrival instant used for waitlist ordering.
    pub created_at: DateTime<Utc>,
    /// Last status change.
    pub updated_at: DateTime<Utc>,
}

impl Registration {
    /// Waitlist ordering key: arrival instant, then row sequence.
    #[must_use]
    pub fn queue_key(&self) -> (DateTime<Utc>, i64) {
        (self.created_at, self.id)
    }
}
