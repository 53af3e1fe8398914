//! Service layer: the registration engine.
//!
//! [`RegistrationEngine`] owns the `submit` transaction and the read views
//! over registrations. Handlers never talk to the store directly.

pub mod registration_engine;

pub use registration_engine::{RegistrationEngine, SubmitCommand, SubmitOutcome};
