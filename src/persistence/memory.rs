//! In-memory registration store with per-event fine-grained locking.
//!
//! Each event lives in its own slot holding an admission mutex and the
//! committed ledger. A transaction takes the admission mutex, stages its
//! writes on a private copy of the ledger, and publishes the copy on commit.
//! Readers only ever see committed ledgers and never wait on admission.
//!
//! # Concurrency
//!
//! - Transactions on the same event are serialized.
//! - Transactions on different events never block each other.
//! - Reads never block on an in-flight transaction.

use std::collections::HashMap;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

use super::{EventSummary, RegistrationStore, StoreError, StoreTransaction};
use crate::domain::{Event, EventId, Registration, RegistrationStatus, UserId};

/// Lock wait used by [`MemoryStore::default`].
const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

type SlotMap = Arc<RwLock<HashMap<EventId, Arc<EventSlot>>>>;

#[derive(Debug, Clone)]
struct EventLedger {
    event: Event,
    registrations: HashMap<UserId, Registration>,
}

impl EventLedger {
    fn count(&self, status: RegistrationStatus) -> u32 {
        let n = self
            .registrations
            .values()
            .filter(|r| r.status == status)
            .count();
        u32::try_from(n).unwrap_or(u32::MAX)
    }

    fn in_queue_order(&self, status: RegistrationStatus) -> Vec<Registration> {
        let mut rows: Vec<Registration> = self
            .registrations
            .values()
            .filter(|r| r.status == status)
            .cloned()
            .collect();
        rows.sort_by_key(Registration::queue_key);
        rows
    }
}

#[derive(Debug)]
struct EventSlot {
    admission: Arc<Mutex<()>>,
    committed: RwLock<EventLedger>,
}

/// Registration store kept entirely in process memory.
///
/// Events are created with [`MemoryStore::insert_event`]; the store never
/// changes an event's capacity afterwards.
#[derive(Debug)]
pub struct MemoryStore {
    slots: SlotMap,
    next_event_id: AtomicI64,
    next_row_id: Arc<AtomicI64>,
    lock_timeout: Duration,
}

impl MemoryStore {
    /// Creates an empty store whose transactions wait at most
    /// `lock_timeout` for an event lock.
    #[must_use]
    pub fn new(lock_timeout: Duration) -> Self {
        Self {
            slots: Arc::new(RwLock::new(HashMap::new())),
            next_event_id: AtomicI64::new(1),
            next_row_id: Arc::new(AtomicI64::new(1)),
            lock_timeout,
        }
    }

    /// Registers a new event and returns it with its assigned id.
    pub async fn insert_event(&self, capacity: NonZeroU32) -> Event {
        let id = EventId::new(self.next_event_id.fetch_add(1, Ordering::Relaxed));
        let event = Event {
            id,
            capacity: capacity.get(),
        };
        let slot = EventSlot {
            admission: Arc::new(Mutex::new(())),
            committed: RwLock::new(EventLedger {
                event,
                registrations: HashMap::new(),
            }),
        };
        self.slots.write().await.insert(id, Arc::new(slot));
        event
    }

    /// Total number of registration rows across all events.
    pub async fn registration_rows(&self) -> usize {
        let slots = self.slots.read().await;
        let mut total = 0;
        for slot in slots.values() {
            total += slot.committed.read().await.registrations.len();
        }
        total
    }

    async fn slot(&self, event_id: EventId) -> Option<Arc<EventSlot>> {
        self.slots.read().await.get(&event_id).cloned()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(DEFAULT_LOCK_TIMEOUT)
    }
}

#[async_trait]
impl RegistrationStore for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn begin(&self) -> Result<Box<dyn StoreTransaction>, StoreError> {
        Ok(Box::new(MemoryTransaction {
            slots: Arc::clone(&self.slots),
            next_row_id: Arc::clone(&self.next_row_id),
            lock_timeout: self.lock_timeout,
            locked: None,
        }))
    }

    async fn event_summary(&self, event_id: EventId) -> Result<Option<EventSummary>, StoreError> {
        let Some(slot) = self.slot(event_id).await else {
            return Ok(None);
        };
        let ledger = slot.committed.read().await;
        Ok(Some(EventSummary {
            event_id,
            capacity: ledger.event.capacity,
            confirmed: ledger.count(RegistrationStatus::Confirmed),
            waitlist: ledger.count(RegistrationStatus::Waitlist),
            withdrawn: ledger.count(RegistrationStatus::Withdrawn),
        }))
    }

    async fn registrations_with_status(
        &self,
        event_id: EventId,
        status: RegistrationStatus,
    ) -> Result<Vec<Registration>, StoreError> {
        let Some(slot) = self.slot(event_id).await else {
            return Ok(Vec::new());
        };
        let ledger = slot.committed.read().await;
        Ok(ledger.in_queue_order(status))
    }

    async fn registration(
        &self,
        user_id: UserId,
        event_id: EventId,
    ) -> Result<Option<Registration>, StoreError> {
        let Some(slot) = self.slot(event_id).await else {
            return Ok(None);
        };
        let ledger = slot.committed.read().await;
        Ok(ledger.registrations.get(&user_id).cloned())
    }
}

struct LockedEvent {
    slot: Arc<EventSlot>,
    staged: EventLedger,
    _guard: OwnedMutexGuard<()>,
}

struct MemoryTransaction {
    slots: SlotMap,
    next_row_id: Arc<AtomicI64>,
    lock_timeout: Duration,
    locked: Option<LockedEvent>,
}

impl MemoryTransaction {
    fn staged(&mut self, event_id: EventId) -> Result<&mut EventLedger, StoreError> {
        match self.locked.as_mut() {
            Some(locked) if locked.staged.event.id == event_id => Ok(&mut locked.staged),
            _ => Err(StoreError::NotLocked { event_id }),
        }
    }
}

#[async_trait]
impl StoreTransaction for MemoryTransaction {
    async fn lock_event(&mut self, event_id: EventId) -> Result<Option<Event>, StoreError> {
        if let Some(locked) = &self.locked {
            if locked.staged.event.id == event_id {
                return Ok(Some(locked.staged.event));
            }
            return Err(StoreError::NotLocked { event_id });
        }

        let slot = self.slots.read().await.get(&event_id).cloned();
        let Some(slot) = slot else {
            return Ok(None);
        };

        let guard = tokio::time::timeout(
            self.lock_timeout,
            Arc::clone(&slot.admission).lock_owned(),
        )
        .await
        .map_err(|_| StoreError::LockTimeout { event_id })?;

        let staged = slot.committed.read().await.clone();
        let event = staged.event;
        self.locked = Some(LockedEvent {
            slot,
            staged,
            _guard: guard,
        });
        Ok(Some(event))
    }

    async fn count_confirmed(&mut self, event_id: EventId) -> Result<u32, StoreError> {
        Ok(self.staged(event_id)?.count(RegistrationStatus::Confirmed))
    }

    async fn find_registration(
        &mut self,
        user_id: UserId,
        event_id: EventId,
    ) -> Result<Option<Registration>, StoreError> {
        Ok(self.staged(event_id)?.registrations.get(&user_id).cloned())
    }

    async fn upsert_registration(
        &mut self,
        user_id: UserId,
        event_id: EventId,
        status: RegistrationStatus,
        reset_created_at: bool,
    ) -> Result<Registration, StoreError> {
        let next_row_id = Arc::clone(&self.next_row_id);
        let ledger = self.staged(event_id)?;
        let now = Utc::now();
        let row = ledger
            .registrations
            .entry(user_id)
            .and_modify(|r| {
                r.status = status;
                r.updated_at = now;
                if reset_created_at {
                    r.created_at = now;
                }
            })
            .or_insert_with(|| Registration {
                id: next_row_id.fetch_add(1, Ordering::Relaxed),
                user_id,
                event_id,
                status,
                created_at: now,
                updated_at: now,
            });
        Ok(row.clone())
    }

    async fn update_status(
        &mut self,
        user_id: UserId,
        event_id: EventId,
        status: RegistrationStatus,
    ) -> Result<bool, StoreError> {
        let ledger = self.staged(event_id)?;
        match ledger.registrations.get_mut(&user_id) {
            Some(row) if row.status != status => {
                row.status = status;
                row.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn oldest_waitlisted(
        &mut self,
        event_id: EventId,
    ) -> Result<Option<Registration>, StoreError> {
        let ledger = self.staged(event_id)?;
        Ok(ledger
            .registrations
            .values()
            .filter(|r| r.status == RegistrationStatus::Waitlist)
            .min_by_key(|r| r.queue_key())
            .cloned())
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        if let Some(locked) = self.locked {
            *locked.slot.committed.write().await = locked.staged;
        }
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        Ok(())
    }
}
