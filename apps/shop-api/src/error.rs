//! # API Errors
//!
//! The single error type HTTP clients ever see.
//!
//! ## Classification
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ValidationError ─┐                                                     │
//! │  CoreError ───────┤                                                     │
//! │  DbError ─────────┼──► ApiError { code, message } ──► (status, JSON)   │
//! │  AuthError ───────┤                                                     │
//! │  CheckoutError ───┘                                                     │
//! │                                                                         │
//! │  Storage internals are logged with error!() and replaced by a          │
//! │  generic message before they reach the response body.                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::error;

use shop_core::{CoreError, ValidationError};
use shop_db::DbError;

use crate::services::checkout::CheckoutError;
use crate::services::session::AuthError;

/// Machine-readable error code, serialized as SCREAMING_SNAKE_CASE.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    InvalidArgument,
    Unauthenticated,
    Forbidden,
    NotFound,
    Conflict,
    InsufficientStock,
    InsufficientBalance,
    NoItemsToCheckout,
    /// Lost a lock race or ran out of time; safe to retry.
    Busy,
    Internal,
}

impl ErrorCode {
    /// HTTP status for this code.
    pub fn status(self) -> StatusCode {
        match self {
            ErrorCode::InvalidArgument
            | ErrorCode::InsufficientStock
            | ErrorCode::InsufficientBalance
            | ErrorCode::NoItemsToCheckout => StatusCode::BAD_REQUEST,
            ErrorCode::Unauthenticated => StatusCode::UNAUTHORIZED,
            ErrorCode::Forbidden => StatusCode::FORBIDDEN,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::Conflict => StatusCode::CONFLICT,
            ErrorCode::Busy => StatusCode::SERVICE_UNAVAILABLE,
            ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Error body: `{"code": "...", "message": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
}

/// Convenience alias for handler results.
pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidArgument, message)
    }

    pub fn unauthenticated() -> Self {
        Self::new(ErrorCode::Unauthenticated, "Authentication required")
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    pub fn internal() -> Self {
        Self::new(ErrorCode::Internal, "Internal server error")
    }

    pub fn status(&self) -> StatusCode {
        self.code.status()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}

// =============================================================================
// Conversions
// =============================================================================

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::invalid_argument(err.to_string())
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        let code = match &err {
            CoreError::ProductNotFound(_) | CoreError::CartLineNotFound(_) => ErrorCode::NotFound,
            CoreError::CartLineForbidden(_) => ErrorCode::Forbidden,
            CoreError::InsufficientStock { .. } => ErrorCode::InsufficientStock,
            CoreError::InsufficientBalance { .. } => ErrorCode::InsufficientBalance,
            CoreError::EmptyCart => ErrorCode::NoItemsToCheckout,
            CoreError::UsernameTaken(_) => ErrorCode::Conflict,
            CoreError::Validation(inner) => {
                return ApiError::invalid_argument(inner.to_string());
            }
            CoreError::QuantityTooLarge { .. }
            | CoreError::CartFull { .. }
            | CoreError::AmountOverflow => {
                ErrorCode::InvalidArgument
            }
        };
        ApiError::new(code, err.to_string())
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => {
                ApiError::not_found(format!("{entity} not found: {id}"))
            }
            DbError::UniqueViolation { field, .. } => {
                ApiError::new(ErrorCode::Conflict, format!("{field} already exists"))
            }
            DbError::ForeignKeyViolation { .. } => ApiError::invalid_argument("Invalid reference"),
            DbError::Busy(_) | DbError::PoolExhausted => {
                ApiError::new(ErrorCode::Busy, "Service busy, please retry")
            }
            other => {
                error!(error = %other, "Database error");
                ApiError::internal()
            }
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingToken | AuthError::InvalidToken | AuthError::UnknownCustomer => {
                ApiError::unauthenticated()
            }
            AuthError::InvalidCredentials => {
                ApiError::new(ErrorCode::Unauthenticated, "Invalid username or password")
            }
            AuthError::Signing(detail) | AuthError::PasswordHash(detail) => {
                error!(error = %detail, "Credential processing failed");
                ApiError::internal()
            }
            AuthError::Db(db) => db.into(),
        }
    }
}

impl From<CheckoutError> for ApiError {
    fn from(err: CheckoutError) -> Self {
        match err {
            CheckoutError::Core(core) => core.into(),
            CheckoutError::Db(db) => db.into(),
            CheckoutError::UnknownCustomer => ApiError::unauthenticated(),
            CheckoutError::TimedOut(_) => {
                ApiError::new(ErrorCode::Busy, "Checkout timed out, please retry")
            }
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
