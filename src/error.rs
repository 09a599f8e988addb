//! Server error types with HTTP status code mapping.
//!
//! [`FanstageError`] is the central error type for the backend. Each
//! variant maps to a specific HTTP status code and structured JSON error
//! response. Transport failures on live connections are intentionally
//! absent: they are absorbed by the connection registry, which silently
//! deregisters the dead connection.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 2002,
///     "message": "user user-42 already voted on this item",
///     "details": null
///   }
/// }
/// ```
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    /// Numeric error code (see code ranges on [`FanstageError`]).
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Server-side error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category              | HTTP Status                |
/// |-----------|-----------------------|----------------------------|
/// | 1000–1999 | Validation            | 400 Bad Request            |
/// | 2000–2999 | Not Found / State     | 404 Not Found / 409 Conflict |
/// | 3000–3999 | Server                | 500 Internal Server Error  |
/// | 4000–4999 | Domain                | 422 Unprocessable Entity   |
/// | 4010/4030 | Authentication        | 401 / 403                  |
#[derive(Debug, thiserror::Error)]
pub enum FanstageError {
    /// Requested entity (item, viewer, session, referral code) is absent.
    #[error("not found: {0}")]
    NotFound(String),

    /// Request validation failed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The submitted choice is not among the item's defined options.
    #[error("invalid choice: {0}")]
    InvalidChoice(String),

    /// The declared result is not among the item's defined options.
    #[error("invalid result: {0}")]
    InvalidResult(String),

    /// The user already voted on this item.
    #[error("user {0} already voted on this item")]
    DuplicateVote(String),

    /// The item is no longer accepting votes.
    #[error("item is not active")]
    ItemNotActive,

    /// The referred user already consumed a referral code.
    #[error("referral already used by {0}")]
    ReferralAlreadyUsed(String),

    /// The referral code exists but is no longer active.
    #[error("referral code {0} is inactive")]
    ReferralInactive(String),

    /// A debit would bring the viewer's balance below the floor.
    #[error("insufficient balance: required {required}, available {available}")]
    InsufficientBalance {
        /// Points required by the operation.
        required: i64,
        /// Points currently available.
        available: i64,
    },

    /// Missing or invalid session token.
    #[error("unauthorized")]
    Unauthorized,

    /// Valid session but insufficient role.
    #[error("forbidden")]
    Forbidden,

    /// Persistence layer failure.
    #[error("persistence error: {0}")]
    PersistenceError(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl FanstageError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidRequest(_) => 1001,
            Self::InvalidChoice(_) => 1002,
            Self::InvalidResult(_) => 1003,
            Self::NotFound(_) => 2001,
            Self::DuplicateVote(_) => 2002,
            Self::ItemNotActive => 2003,
            Self::ReferralAlreadyUsed(_) => 2004,
            Self::ReferralInactive(_) => 2005,
            Self::InsufficientBalance { .. } => 4001,
            Self::Unauthorized => 4010,
            Self::Forbidden => 4030,
            Self::PersistenceError(_) => 3001,
            Self::Internal(_) => 3000,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) | Self::InvalidChoice(_) | Self::InvalidResult(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::DuplicateVote(_)
            | Self::ItemNotActive
            | Self::ReferralAlreadyUsed(_)
            | Self::ReferralInactive(_) => StatusCode::CONFLICT,
            Self::InsufficientBalance { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::PersistenceError(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for FanstageError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(code = self.error_code(), error = %self, "request failed");
        }
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details: None,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_vote_is_conflict() {
        let err = FanstageError::DuplicateVote("user-1".to_string());
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
        assert_eq!(err.error_code(), 2002);
    }

    #[test]
    fn insufficient_balance_is_unprocessable() {
        let err = FanstageError::InsufficientBalance {
            required: 150,
            available: 100,
        };
        assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(err.to_string().contains("150"));
    }

    #[test]
    fn auth_errors_map_to_401_and_403() {
        assert_eq!(
            FanstageError::Unauthorized.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            FanstageError::Forbidden.status_code(),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn not_found_message_carries_subject() {
        let err = FanstageError::NotFound("item 123".to_string());
        assert!(err.to_string().contains("item 123"));
    }

    // The error body is referenced from path annotations, so it must
    // carry a schema.
    #[test]
    fn error_response_exposes_a_schema() {
        assert_eq!(<ErrorResponse as utoipa::ToSchema>::name(), "ErrorResponse");
        let _ = <ErrorResponse as utoipa::PartialSchema>::schema();
    }
}
