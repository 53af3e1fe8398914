//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::service::RegistrationEngine;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Registration engine for all booking logic.
    pub engine: Arc<RegistrationEngine>,
}
