//! Row types shared by the store implementations.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::StoreError;
use crate::domain::{EventId, Registration, UserId};

/// Aggregated per-status counts for one event.
///
/// Read outside the event lock; independently consistent with the write
/// path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EventSummary {
    /// Event identifier.
    pub event_id: EventId,
    /// Configured capacity.
    pub capacity: u32,
    /// Confirmed registrations.
    pub confirmed: u32,
    /// Waitlisted registrations.
    pub waitlist: u32,
    /// Withdrawn registrations.
    pub withdrawn: u32,
}

impl EventSummary {
    /// Slots still free. Zero when full.
    #[must_use]
    pub const fn spots_remaining(&self) -> u32 {
        self.capacity.saturating_sub(self.confirmed)
    }
}

/// A row from the `registrations` table as returned by `sqlx`.
pub(crate) type RegistrationRow = (i64, i64, i64, String, DateTime<Utc>, DateTime<Utc>);

/// Column list matching [`RegistrationRow`].
pub(crate) const REGISTRATION_COLUMNS: &str =
    "id, user_id, event_id, status, created_at, updated_at";

/// Maps a raw row to a [`Registration`].
///
/// # Errors
///
/// Returns [`StoreError::Corrupt`] if the status column holds an unknown
/// value.
pub(crate) fn registration_from_row(row: RegistrationRow) -> Result<Registration, StoreError> {
    let (id, user_id, event_id, status, created_at, updated_at) = row;
    let status = status
        .parse()
        .map_err(|e| StoreError::Corrupt(format!("registration {id}: {e}")))?;
    Ok(Registration {
        id,
        user_id: UserId::new(user_id),
        event_id: EventId::new(event_id),
        status,
        created_at,
        updated_at,
    })
}

/// Narrows a database count or capacity to `u32`.
///
/// # Errors
///
/// Returns [`StoreError::Corrupt`] if the value is negative or too large.
pub(crate) fn to_u32(value: i64, what: &str) -> Result<u32, StoreError> {
    u32::try_from(value).map_err(|_| StoreError::Corrupt(format!("{what} out of range: {value}")))
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::RegistrationStatus;

    #[test]
    fn maps_row_to_registration() {
        let now = Utc::now();
        let row = (9, 2, 3, "waitlist".to_string(), now, now);
        let Ok(reg) = registration_from_row(row) else {
            panic!("valid row rejected");
        };
        assert_eq!(reg.status, RegistrationStatus::Waitlist);
        assert_eq!(reg.user_id, UserId::new(2));
        assert_eq!(reg.event_id, EventId::new(3));
    }

    #[test]
    fn unknown_status_is_corrupt() {
        let now = Utc::now();
        let row = (1, 1, 1, "cancelled".to_string(), now, now);
        assert!(matches!(
            registration_from_row(row),
            Err(StoreError::Corrupt(_))
        ));
    }

    #[test]
    fn negative_count_is_corrupt() {
        assert!(matches!(to_u32(-1, "count"), Err(StoreError::Corrupt(_))));
        assert!(matches!(to_u32(12, "count"), Ok(12)));
    }

    #[test]
    fn spots_remaining_saturates() {
        let summary = EventSummary {
            event_id: EventId::new(1),
            capacity: 2,
            confirmed: 3,
            waitlist: 0,
            withdrawn: 0,
        };
        assert_eq!(summary.spots_remaining(), 0);
    }
}
