//! Application assembly: store selection, state, and router layers.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::api;
use crate::app_state::AppState;
use crate::config::{BookingConfig, StorageBackend};
use crate::persistence::{MemoryStore, PostgresStore, RegistrationStore, StoreError};
use crate::service::RegistrationEngine;

/// Opens the configured store and wraps it in an engine.
///
/// # Errors
///
/// Returns a [`StoreError`] if PostgreSQL is unreachable or a migration
/// fails.
pub async fn build_state(config: &BookingConfig) -> Result<AppState, StoreError> {
    let store: Arc<dyn RegistrationStore> = match config.storage_backend {
        StorageBackend::Postgres => {
            let store = PostgresStore::connect(config).await?;
            if config.run_migrations {
                store.migrate().await?;
                tracing::info!("database migrations applied");
            }
            Arc::new(store)
        }
        StorageBackend::Memory => {
            tracing::warn!("using in-memory store; registrations are lost on restart");
            let store = MemoryStore::new(config.lock_timeout());
            for capacity in &config.memory_seed_events {
                let event = store.insert_event(*capacity).await;
                tracing::info!(event_id = %event.id, capacity = event.capacity, "seeded event");
            }
            Arc::new(store)
        }
    };

    Ok(AppState {
        engine: Arc::new(RegistrationEngine::new(store, config.admission)),
    })
}

/// Builds the full HTTP application with tracing, CORS and timeout layers.
pub fn build_app(state: AppState, request_timeout: Duration) -> Router {
    api::build_router()
        .layer(TimeoutLayer::new(request_timeout))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
