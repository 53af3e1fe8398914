//! Booking error types with HTTP status code mapping.
//!
//! [`BookingError`] is the central error type. Each variant maps to an HTTP
//! status, a numeric code, and a retryability flag. Store failures never
//! reach a client untranslated: [`From<StoreError>`] decides which kind
//! they become.

use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::{EventId, UserId};
use crate::persistence::StoreError;

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 3001,
///     "message": "temporarily unavailable: timed out waiting for lock on event 4",
///     "retryable": true
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code.
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Whether the same request may succeed if retried with backoff.
    pub retryable: bool,
}

/// Failure kinds surfaced by the registration engine.
///
/// # Error Code Ranges
///
/// | Range     | Category        | HTTP Status                 |
/// |-----------|-----------------|-----------------------------|
/// | 1000–1999 | Validation      | 400 Bad Request             |
/// | 2000–2999 | Not Found       | 404 Not Found               |
/// | 3000–3999 | Server          | 500 / 503                   |
#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    /// Missing or malformed request fields. Not retryable.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The event does not exist. Not retryable.
    #[error("event not found: {0}")]
    EventNotFound(EventId),

    /// The member has never registered for the event.
    #[error("no registration for user {user_id} on event {event_id}")]
    RegistrationNotFound {
        /// Member looked up.
        user_id: UserId,
        /// Event looked up.
        event_id: EventId,
    },

    /// Store contention or connectivity loss. The transaction was rolled
    /// back; safe to retry.
    #[error("temporarily unavailable: {0}")]
    TransientFailure(String),

    /// Unexpected server-side fault.
    #[error("internal error: {0}")]
    Internal(String),
}

impl BookingError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidRequest(_) => 1001,
            Self::EventNotFound(_) => 2001,
            Self::RegistrationNotFound { .. } => 2002,
            Self::Internal(_) => 3000,
            Self::TransientFailure(_) => 3001,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::EventNotFound(_) | Self::RegistrationNotFound { .. } => StatusCode::NOT_FOUND,
            Self::TransientFailure(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether the caller may retry the same request.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::TransientFailure(_))
    }
}

impl From<StoreError> for BookingError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Database(_) | StoreError::LockTimeout { .. } => {
                Self::TransientFailure(err.to_string())
            }
            StoreError::NotLocked { .. } | StoreError::Corrupt(_) => Self::Internal(err.to_string()),
        }
    }
}

impl IntoResponse for BookingError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let retryable = self.is_retryable();
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                retryable,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        if retryable {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from_static("1"));
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lock_timeout_is_transient() {
        let err = BookingError::from(StoreError::LockTimeout {
            event_id: EventId::new(4),
        });
        assert!(err.is_retryable());
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(err.error_code(), 3001);
    }

    #[test]
    fn connection_loss_is_transient() {
        let err = BookingError::from(StoreError::Database(sqlx::Error::PoolTimedOut));
        assert!(matches!(err, BookingError::TransientFailure(_)));
    }

    #[test]
    fn corrupt_row_is_internal() {
        let err = BookingError::from(StoreError::Corrupt("bad status".to_string()));
        assert!(!err.is_retryable());
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn client_errors_are_not_retryable() {
        let invalid = BookingError::InvalidRequest("missing event_id".to_string());
        let missing = BookingError::EventNotFound(EventId::new(1));
        assert_eq!(invalid.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(missing.status_code(), StatusCode::NOT_FOUND);
        assert!(!invalid.is_retryable());
        assert!(!missing.is_retryable());
    }

    #[test]
    fn transient_response_sets_retry_after() {
        let response = BookingError::TransientFailure("busy".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            response.headers().get(header::RETRY_AFTER),
            Some(&HeaderValue::from_static("1"))
        );
    }
}
