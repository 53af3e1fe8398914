//! Type-safe identifiers for events and members.
//!
//! Both wrap the store's integer primary keys so that an event id can never
//! be passed where a user id is expected.

use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

macro_rules! integer_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Wraps a raw key without validation.
            #[must_use]
            pub const fn new(raw: i64) -> Self {
                Self(raw)
            }

            /// Wraps a raw key taken from untrusted input.
            ///
            /// # Errors
            ///
            /// Returns the rejected value if it is not strictly positive.
            pub const fn parse(raw: i64) -> Result<Self, i64> {
                if raw > 0 { Ok(Self(raw)) } else { Err(raw) }
            }

            /// Returns the raw key.
            #[must_use]
            pub const fn get(self) -> i64 {
                self.0
            }

            /// Human readable field name used in validation messages.
            #[must_use]
            pub const fn label() -> &'static str {
                $label
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

integer_id!(
    /// Identifier of a capacity-limited event. Immutable once created.
    EventId,
    "event_id"
);

integer_id!(
    /// Identifier of a member registering for events.
    UserId,
    "user_id"
);
