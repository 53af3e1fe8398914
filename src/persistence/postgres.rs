//! PostgreSQL implementation of the registration store.
//!
//! The event row is locked with `SELECT ... FOR UPDATE`; the lock is held by
//! the surrounding transaction until commit or rollback. Each transaction
//! sets a local `lock_timeout`, and Postgres reports an expired wait as
//! SQLSTATE `55P03`, which is mapped to [`StoreError::LockTimeout`].

use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, Transaction};

use super::models::{
    REGISTRATION_COLUMNS, RegistrationRow, registration_from_row, to_u32,
};
use super::{EventSummary, RegistrationStore, StoreError, StoreTransaction};
use crate::config::BookingConfig;
use crate::domain::{Event, EventId, Registration, RegistrationStatus, UserId};

/// SQLSTATE raised when `lock_timeout` expires.
const LOCK_NOT_AVAILABLE: &str = "55P03";

/// PostgreSQL-backed store using `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
    lock_timeout: Duration,
}

impl PostgresStore {
    /// Creates a store over an existing connection pool.
    #[must_use]
    pub fn new(pool: PgPool, lock_timeout: Duration) -> Self {
        Self { pool, lock_timeout }
    }

    /// Opens a connection pool sized from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if the database is unreachable.
    pub async fn connect(config: &BookingConfig) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .min_connections(config.database_min_connections)
            .acquire_timeout(Duration::from_secs(config.database_connect_timeout_secs))
            .connect(&config.database_url)
            .await?;
        Ok(Self::new(pool, config.lock_timeout()))
    }

    /// Applies the embedded schema migrations.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if a migration fails.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Database(sqlx::Error::Migrate(Box::new(e))))?;
        Ok(())
    }

    /// Returns the underlying connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl RegistrationStore for PostgresStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn begin(&self) -> Result<Box<dyn StoreTransaction>, StoreError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("SELECT set_config('lock_timeout', $1, true)")
            .bind(format!("{}ms", self.lock_timeout.as_millis()))
            .execute(&mut *tx)
            .await?;
        Ok(Box::new(PostgresTransaction { tx }))
    }

    async fn event_summary(&self, event_id: EventId) -> Result<Option<EventSummary>, StoreError> {
        let row = sqlx::query_as::<_, (i64, i32, i64, i64, i64)>(
            "SELECT e.id, e.capacity, \
                    COUNT(r.id) FILTER (WHERE r.status = 'confirmed'), \
                    COUNT(r.id) FILTER (WHERE r.status = 'waitlist'), \
                    COUNT(r.id) FILTER (WHERE r.status = 'withdrawn') \
             FROM events e LEFT JOIN registrations r ON r.event_id = e.id \
             WHERE e.id = $1 GROUP BY e.id, e.capacity",
        )
        .bind(event_id.get())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|(id, capacity, confirmed, waitlist, withdrawn)| {
            Ok(EventSummary {
                event_id: EventId::new(id),
                capacity: to_u32(i64::from(capacity), "capacity")?,
                confirmed: to_u32(confirmed, "confirmed count")?,
                waitlist: to_u32(waitlist, "waitlist count")?,
                withdrawn: to_u32(withdrawn, "withdrawn count")?,
            })
        })
        .transpose()
    }

    async fn registrations_with_status(
        &self,
        event_id: EventId,
        status: RegistrationStatus,
    ) -> Result<Vec<Registration>, StoreError> {
        let rows = sqlx::query_as::<_, RegistrationRow>(&format!(
            "SELECT {REGISTRATION_COLUMNS} FROM registrations \
             WHERE event_id = $1 AND status = $2 ORDER BY created_at ASC, id ASC"
        ))
        .bind(event_id.get())
        .bind(status.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(registration_from_row).collect()
    }

    async fn registration(
        &self,
        user_id: UserId,
        event_id: EventId,
    ) -> Result<Option<Registration>, StoreError> {
        let row = sqlx::query_as::<_, RegistrationRow>(&format!(
            "SELECT {REGISTRATION_COLUMNS} FROM registrations \
             WHERE user_id = $1 AND event_id = $2"
        ))
        .bind(user_id.get())
        .bind(event_id.get())
        .fetch_optional(&self.pool)
        .await?;

        row.map(registration_from_row).transpose()
    }
}

struct PostgresTransaction {
    tx: Transaction<'static, Postgres>,
}

/// Maps a lock wait failure to [`StoreError::LockTimeout`].
fn classify_lock_error(err: sqlx::Error, event_id: EventId) -> StoreError {
    if let sqlx::Error::Database(db) = &err
        && db.code().is_some_and(|code| code == LOCK_NOT_AVAILABLE)
    {
        return StoreError::LockTimeout { event_id };
    }
    StoreError::Database(err)
}

#[async_trait]
impl StoreTransaction for PostgresTransaction {
    async fn lock_event(&mut self, event_id: EventId) -> Result<Option<Event>, StoreError> {
        let row = sqlx::query_as::<_, (i64, i32)>(
            "SELECT id, capacity FROM events WHERE id = $1 FOR UPDATE",
        )
        .bind(event_id.get())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| classify_lock_error(e, event_id))?;

        row.map(|(id, capacity)| {
            Ok(Event {
                id: EventId::new(id),
                capacity: to_u32(i64::from(capacity), "capacity")?,
            })
        })
        .transpose()
    }

    async fn count_confirmed(&mut self, event_id: EventId) -> Result<u32, StoreError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM registrations WHERE event_id = $1 AND status = 'confirmed'",
        )
        .bind(event_id.get())
        .fetch_one(&mut *self.tx)
        .await?;
        to_u32(count, "confirmed count")
    }

    async fn find_registration(
        &mut self,
        user_id: UserId,
        event_id: EventId,
    ) -> Result<Option<Registration>, StoreError> {
        let row = sqlx::query_as::<_, RegistrationRow>(&format!(
            "SELECT {REGISTRATION_COLUMNS} FROM registrations \
             WHERE user_id = $1 AND event_id = $2"
        ))
        .bind(user_id.get())
        .bind(event_id.get())
        .fetch_optional(&mut *self.tx)
        .await?;

        row.map(registration_from_row).transpose()
    }

    async fn upsert_registration(
        &mut self,
        user_id: UserId,
        event_id: EventId,
        status: RegistrationStatus,
        reset_created_at: bool,
    ) -> Result<Registration, StoreError> {
        let row = sqlx::query_as::<_, RegistrationRow>(&format!(
            "INSERT INTO registrations (user_id, event_id, status) VALUES ($1, $2, $3) \
             ON CONFLICT (user_id, event_id) DO UPDATE SET \
                 status = EXCLUDED.status, \
                 updated_at = NOW(), \
                 created_at = CASE WHEN $4 THEN NOW() ELSE registrations.created_at END \
             RETURNING {REGISTRATION_COLUMNS}"
        ))
        .bind(user_id.get())
        .bind(event_id.get())
        .bind(status.as_str())
        .bind(reset_created_at)
        .fetch_one(&mut *self.tx)
        .await?;

        registration_from_row(row)
    }

    async fn update_status(
        &mut self,
        user_id: UserId,
        event_id: EventId,
        status: RegistrationStatus,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "UPDATE registrations SET status = $3, updated_at = NOW() \
             WHERE user_id = $1 AND event_id = $2 AND status <> $3",
        )
        .bind(user_id.get())
        .bind(event_id.get())
        .bind(status.as_str())
        .execute(&mut *self.tx)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn oldest_waitlisted(
        &mut self,
        event_id: EventId,
    ) -> Result<Option<Registration>, StoreError> {
        let row = sqlx::query_as::<_, RegistrationRow>(&format!(
            "SELECT {REGISTRATION_COLUMNS} FROM registrations \
             WHERE event_id = $1 AND status = 'waitlist' \
             ORDER BY created_at ASC, id ASC LIMIT 1"
        ))
        .bind(event_id.get())
        .fetch_optional(&mut *self.tx)
        .await?;

        row.map(registration_from_row).transpose()
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        self.tx.rollback().await?;
        Ok(())
    }
}
