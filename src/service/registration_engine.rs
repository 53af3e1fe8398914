//! Registration engine: admission, withdrawal, and waitlist promotion.

use std::sync::Arc;

use crate::domain::admission::{self, AdmissionPolicy};
use crate::domain::{DesiredStatus, EventId, Registration, RegistrationStatus, UserId};
use crate::error::BookingError;
use crate::persistence::{EventSummary, RegistrationStore, StoreTransaction};

/// A validated `submit` request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmitCommand {
    /// Member acting. Authorization is checked before the engine is called.
    pub user_id: UserId,
    /// Target event.
    pub event_id: EventId,
    /// Requested status.
    pub desired: DesiredStatus,
}

impl SubmitCommand {
    /// Validates raw request fields without touching the store.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::InvalidRequest`] if a field is missing, an id
    /// is not positive, or the status is not `confirmed` / `withdrawn`.
    pub fn from_parts(
        user_id: Option<i64>,
        event_id: Option<i64>,
        status: Option<&str>,
    ) -> Result<Self, BookingError> {
        let user_id = required_id(user_id, UserId::label(), UserId::parse)?;
        let event_id = required_id(event_id, EventId::label(), EventId::parse)?;
        let status =
            status.ok_or_else(|| BookingError::InvalidRequest("missing status".to_string()))?;
        let desired = status
            .parse()
            .map_err(|e| BookingError::InvalidRequest(format!("{e}")))?;
        Ok(Self {
            user_id,
            event_id,
            desired,
        })
    }
}

fn required_id<T>(
    raw: Option<i64>,
    field: &str,
    parse: fn(i64) -> Result<T, i64>,
) -> Result<T, BookingError> {
    let raw = raw.ok_or_else(|| BookingError::InvalidRequest(format!("missing {field}")))?;
    positive_id(raw, field, parse)
}

/// Validates a raw id taken from a request.
///
/// # Errors
///
/// Returns [`BookingError::InvalidRequest`] naming `field` if `parse`
/// rejects the value.
pub(crate) fn positive_id<T>(
    raw: i64,
    field: &str,
    parse: fn(i64) -> Result<T, i64>,
) -> Result<T, BookingError> {
    parse(raw).map_err(|bad| {
        BookingError::InvalidRequest(format!("{field} must be positive, got {bad}"))
    })
}

/// Result of a successful `submit`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The registration holds the returned status, which is what the caller
    /// asked for or an unchanged existing status.
    Registered(Registration),
    /// The caller asked for a slot but the event is full; the registration
    /// sits on the waitlist.
    CapacityConflict(Registration),
    /// The registration (if any) is withdrawn.
    Withdrawn {
        /// Member moved from the waitlist into the freed slot.
        promoted: Option<UserId>,
    },
}

/// Decides confirmed/waitlist placement under a per-event lock and promotes
/// waitlisted members when a slot frees up.
///
/// Every `submit` runs in one store transaction: lock the event, count,
/// decide, write, commit. Any error rolls the whole transaction back.
/// Capacity counts are never cached between calls.
#[derive(Debug, Clone)]
pub struct RegistrationEngine {
    store: Arc<dyn RegistrationStore>,
    policy: AdmissionPolicy,
}

impl RegistrationEngine {
    /// Creates an engine over `store`.
    #[must_use]
    pub fn new(store: Arc<dyn RegistrationStore>, policy: AdmissionPolicy) -> Self {
        Self { store, policy }
    }

    /// Returns the backing store.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn RegistrationStore> {
        &self.store
    }

    /// Applies a registration or withdrawal.
    ///
    /// # Errors
    ///
    /// - [`BookingError::EventNotFound`] if the event does not exist; nothing
    ///   is written.
    /// - [`BookingError::TransientFailure`] on lock timeout or storage
    ///   failure; the transaction is rolled back and the call may be retried.
    #[tracing::instrument(
        skip_all,
        fields(user_id = %cmd.user_id, event_id = %cmd.event_id, desired = %cmd.desired)
    )]
    pub async fn submit(&self, cmd: SubmitCommand) -> Result<SubmitOutcome, BookingError> {
        let mut tx = self.store.begin().await?;

        let result = match cmd.desired {
            DesiredStatus::Confirmed => self.register(tx.as_mut(), cmd).await,
            DesiredStatus::Withdrawn => withdraw(tx.as_mut(), cmd).await,
        };

        match result {
            Ok(outcome) => {
                tx.commit().await?;
                log_outcome(&outcome);
                Ok(outcome)
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback().await {
                    tracing::warn!(error = %rollback_err, "rollback failed");
                }
                tracing::warn!(error = %err, "submit rolled back");
                Err(err)
            }
        }
    }

    async fn register(
        &self,
        tx: &mut dyn StoreTransaction,
        cmd: SubmitCommand,
    ) -> Result<SubmitOutcome, BookingError> {
        let event = tx
            .lock_event(cmd.event_id)
            .await?
            .ok_or(BookingError::EventNotFound(cmd.event_id))?;

        let confirmed = tx.count_confirmed(event.id).await?;
        let existing = tx
            .find_registration(cmd.user_id, event.id)
            .await?
            .map(|r| r.status);

        let status = admission::decide(
            confirmed,
            event.capacity,
            existing,
            self.policy.withdrawn_reentry,
        );
        let reset = admission::resets_priority(existing, status, self.policy.reentry);
        let registration = tx
            .upsert_registration(cmd.user_id, event.id, status, reset)
            .await?;

        if status == RegistrationStatus::Waitlist {
            Ok(SubmitOutcome::CapacityConflict(registration))
        } else {
            Ok(SubmitOutcome::Registered(registration))
        }
    }

    /// Capacity and per-status counts for an event.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::EventNotFound`] or a translated store error.
    pub async fn event_summary(&self, event_id: EventId) -> Result<EventSummary, BookingError> {
        self.store
            .event_summary(event_id)
            .await?
            .ok_or(BookingError::EventNotFound(event_id))
    }

    /// Confirmed registrations in arrival order.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::EventNotFound`] or a translated store error.
    pub async fn participants(&self, event_id: EventId) -> Result<Vec<Registration>, BookingError> {
        self.list(event_id, RegistrationStatus::Confirmed).await
    }

    /// Waitlisted registrations in promotion order.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::EventNotFound`] or a translated store error.
    pub async fn waitlist(&self, event_id: EventId) -> Result<Vec<Registration>, BookingError> {
        self.list(event_id, RegistrationStatus::Waitlist).await
    }

    /// The caller's registration for an event.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::EventNotFound`],
    /// [`BookingError::RegistrationNotFound`], or a translated store error.
    pub async fn registration(
        &self,
        user_id: UserId,
        event_id: EventId,
    ) -> Result<Registration, BookingError> {
        self.event_summary(event_id).await?;
        self.store
            .registration(user_id, event_id)
            .await?
            .ok_or(BookingError::RegistrationNotFound { user_id, event_id })
    }

    async fn list(
        &self,
        event_id: EventId,
        status: RegistrationStatus,
    ) -> Result<Vec<Registration>, BookingError> {
        self.event_summary(event_id).await?;
        Ok(self
            .store
            .registrations_with_status(event_id, status)
            .await?)
    }
}

/// Withdraws the caller and promotes at most one waitlisted member.
async fn withdraw(
    tx: &mut dyn StoreTransaction,
    cmd: SubmitCommand,
) -> Result<SubmitOutcome, BookingError> {
    let event = tx
        .lock_event(cmd.event_id)
        .await?
        .ok_or(BookingError::EventNotFound(cmd.event_id))?;

    tx.update_status(cmd.user_id, event.id, RegistrationStatus::Withdrawn)
        .await?;

    let confirmed = tx.count_confirmed(event.id).await?;
    if !admission::has_open_slot(confirmed, event.capacity) {
        return Ok(SubmitOutcome::Withdrawn { promoted: None });
    }

    let Some(next) = tx.oldest_waitlisted(event.id).await? else {
        return Ok(SubmitOutcome::Withdrawn { promoted: None });
    };
    tx.update_status(next.user_id, event.id, RegistrationStatus::Confirmed)
        .await?;

    Ok(SubmitOutcome::Withdrawn {
        promoted: Some(next.user_id),
    })
}

fn log_outcome(outcome: &SubmitOutcome) {
    match outcome {
        SubmitOutcome::Registered(r) => {
            tracing::info!(status = %r.status, "registration updated");
        }
        SubmitOutcome::CapacityConflict(r) => {
            tracing::info!(registration_id = r.id, "event full, registration waitlisted");
        }
        SubmitOutcome::Withdrawn {
            promoted: Some(user_id),
        } => {
            tracing::info!(promoted_user_id = %user_id, "withdrawn, promoted from waitlist");
        }
        SubmitOutcome::Withdrawn { promoted: None } => {
            tracing::info!("withdrawn");
        }
    }
}
