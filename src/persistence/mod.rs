//! Persistence layer: transactional access to events and registrations.
//!
//! [`RegistrationStore`] hands out [`StoreTransaction`]s. A transaction owns
//! the per-event lock from [`StoreTransaction::lock_event`] until it is
//! committed, rolled back, or dropped; dropping an open transaction rolls it
//! back. Two implementations exist: [`postgres::PostgresStore`] for
//! deployments and [`memory::MemoryStore`] for tests and local runs.

pub mod memory;
pub mod models;
pub mod postgres;

use async_trait::async_trait;

use crate::domain::{Event, EventId, Registration, RegistrationStatus, UserId};

pub use memory::MemoryStore;
pub use models::EventSummary;
pub use postgres::PostgresStore;

/// Storage-level failure.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The database rejected a statement or the connection failed.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Waiting for the event lock exceeded the configured timeout.
    #[error("timed out waiting for lock on event {event_id}")]
    LockTimeout {
        /// Event whose lock could not be acquired.
        event_id: EventId,
    },

    /// The transaction touched an event it does not hold the lock for.
    #[error("event {event_id} is not locked by this transaction")]
    NotLocked {
        /// Event the operation referred to.
        event_id: EventId,
    },

    /// A stored row could not be mapped back to a domain value.
    #[error("corrupt row: {0}")]
    Corrupt(String),
}

/// Source of transactions and read-only views over registrations.
#[async_trait]
pub trait RegistrationStore: Send + Sync + std::fmt::Debug {
    /// Short backend name reported by the health endpoint.
    fn backend(&self) -> &'static str;

    /// Checks that the store can serve requests.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the backing database is unreachable.
    async fn ping(&self) -> Result<(), StoreError>;

    /// Opens a transaction with the store's lock timeout applied.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if no connection could be obtained.
    async fn begin(&self) -> Result<Box<dyn StoreTransaction>, StoreError>;

    /// Capacity and per-status counts, or `None` if the event is unknown.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] on storage failure.
    async fn event_summary(&self, event_id: EventId) -> Result<Option<EventSummary>, StoreError>;

    /// Registrations holding `status`, in arrival order.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] on storage failure.
    async fn registrations_with_status(
        &self,
        event_id: EventId,
        status: RegistrationStatus,
    ) -> Result<Vec<Registration>, StoreError>;

    /// The single registration for `(user_id, event_id)`, if any.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] on storage failure.
    async fn registration(
        &self,
        user_id: UserId,
        event_id: EventId,
    ) -> Result<Option<Registration>, StoreError>;
}

/// One unit of work scoped to a single event.
#[async_trait]
pub trait StoreTransaction: Send {
    /// Takes the exclusive lock on the event and returns its capacity, or
    /// `None` if it does not exist. Blocks concurrent transactions on the
    /// same event only.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::LockTimeout`] if the lock is not granted in
    /// time, or another [`StoreError`] on storage failure.
    async fn lock_event(&mut self, event_id: EventId) -> Result<Option<Event>, StoreError>;

    /// Counts confirmed registrations for the event.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] on storage failure.
    async fn count_confirmed(&mut self, event_id: EventId) -> Result<u32, StoreError>;

    /// Reads the caller's registration inside the transaction.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] on storage failure.
    async fn find_registration(
        &mut self,
        user_id: UserId,
        event_id: EventId,
    ) -> Result<Option<Registration>, StoreError>;

    /// Inserts the registration or updates its status in place.
    ///
    /// `created_at` is set on insert and otherwise only refreshed when
    /// `reset_created_at` is `true`.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] on storage failure.
    async fn upsert_registration(
        &mut self,
        user_id: UserId,
        event_id: EventId,
        status: RegistrationStatus,
        reset_created_at: bool,
    ) -> Result<Registration, StoreError>;

    /// Sets the status of an existing registration. Returns `false` when
    /// there is no row or it already has `status`.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] on storage failure.
    async fn update_status(
        &mut self,
        user_id: UserId,
        event_id: EventId,
        status: RegistrationStatus,
    ) -> Result<bool, StoreError>;

    /// The waitlisted registration with the smallest `(created_at, id)`.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] on storage failure.
    async fn oldest_waitlisted(
        &mut self,
        event_id: EventId,
    ) -> Result<Option<Registration>, StoreError>;

    /// Makes every write visible and releases the event lock.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the commit fails; nothing is applied.
    async fn commit(self: Box<Self>) -> Result<(), StoreError>;

    /// Discards every write and releases the event lock.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the rollback statement fails.
    async fn rollback(self: Box<Self>) -> Result<(), StoreError>;
}
