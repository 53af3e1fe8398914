//! Admission and promotion rules.
//!
//! Pure functions over counts observed inside the event lock. The store
//! never caches these numbers; callers recompute them for every decision.

use super::RegistrationStatus;

/// Whether a waitlisted member's arrival priority survives a withdrawal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReentryPolicy {
    /// Re-registering keeps the original `created_at`.
    #[default]
    KeepOriginalPriority,
    /// Re-registering after a withdrawal restarts at the back of the queue.
    ResetPriority,
}

/// What a full event does with a withdrawn member who asks for a slot again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WithdrawnReentry {
    /// The row stays `withdrawn`, like any other existing registration.
    #[default]
    KeepStatus,
    /// The row moves back onto the waitlist.
    Requeue,
}

/// Admission knobs applied by the engine on every registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AdmissionPolicy {
    /// `created_at` handling on re-entry.
    pub reentry: ReentryPolicy,
    /// Full-event handling of withdrawn rows.
    pub withdrawn_reentry: WithdrawnReentry,
}

/// Returns `true` while fewer than `capacity` registrations are confirmed.
#[must_use]
pub const fn has_open_slot(confirmed: u32, capacity: u32) -> bool {
    confirmed < capacity
}

/// Decides the status a `confirmed` request ends up with.
///
/// A free slot always confirms. On a full event a first-time registrant is
/// waitlisted and an existing registration keeps its status, so a confirmed
/// member is never bumped and a waitlisted one keeps their place. A
/// withdrawn row is requeued only under [`WithdrawnReentry::Requeue`].
#[must_use]
pub fn decide(
    confirmed: u32,
    capacity: u32,
    existing: Option<RegistrationStatus>,
    withdrawn_reentry: WithdrawnReentry,
) -> RegistrationStatus {
    if has_open_slot(confirmed, capacity) {
        return RegistrationStatus::Confirmed;
    }
    match (existing, withdrawn_reentry) {
        (Some(RegistrationStatus::Withdrawn), WithdrawnReentry::Requeue) | (None, _) => {
            RegistrationStatus::Waitlist
        }
        (Some(status), _) => status,
    }
}

/// Returns `true` when the upsert must refresh `created_at`.
///
/// Only a re-entry from `withdrawn` into an active status is affected, and
/// only under [`ReentryPolicy::ResetPriority`].
#[must_use]
pub fn resets_priority(
    existing: Option<RegistrationStatus>,
    next: RegistrationStatus,
    policy: ReentryPolicy,
) -> bool {
    policy == ReentryPolicy::ResetPriority
        && existing == Some(RegistrationStatus::Withdrawn)
        && next != RegistrationStatus::Withdrawn
}
