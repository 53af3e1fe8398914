//! # booking-engine
//!
//! Booking backend for recurring, capacity-limited events.
//!
//! Members register for events; each event has a fixed capacity. Once it
//! is full, further registrants join a waitlist and are promoted in arrival
//! order whenever a confirmed member withdraws. Every decision runs inside
//! one transaction that holds an exclusive per-event lock, so concurrent
//! requests can never confirm more members than the event holds.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP)
//!     │
//!     ├── REST Handlers (api/)
//!     │
//!     ├── RegistrationEngine (service/)
//!     ├── Admission rules (domain/)
//!     │
//!     └── RegistrationStore (persistence/)
//!           ├── PostgreSQL (SELECT ... FOR UPDATE)
//!           └── In-memory (per-event mutex)
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod persistence;
pub mod server;
pub mod service;
