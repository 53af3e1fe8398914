//! Domain layer: identifiers, registration states, and admission rules.
//!
//! Nothing in here touches storage. The engine feeds counts and existing
//! states observed under the event lock into [`admission`] and writes back
//! whatever it decides.

pub mod admission;
pub mod ids;
pub mod registration;

pub use admission::{AdmissionPolicy, ReentryPolicy, WithdrawnReentry};
pub use ids::{EventId, UserId};
pub use registration::{DesiredStatus, Event, Registration, RegistrationStatus, UnknownStatus};
