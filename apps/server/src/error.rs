//! # API Error Type
//!
//! Unified error type for HTTP handlers.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Stockroom                              │
//! │                                                                         │
//! │  Handler                                                                │
//! │  Result<Json<T>, ApiError>                                              │
//! │         │                                                               │
//! │         ├── DbError (repositories) ──► CoreError ──┐                    │
//! │         ├── CoreError (checkout, reports) ─────────┤                    │
//! │         ├── ValidationError (query params) ────────┤                    │
//! │         └── Json/Path/Query rejections ──► 400 ────┤                    │
//! │                                                    ▼                    │
//! │                                     ErrorKind ──► ApiError              │
//! │                                                    │                    │
//! │                      InvalidRequest    → 400       │                    │
//! │                      InsufficientStock → 400       │                    │
//! │                      NotFound          → 404       │                    │
//! │                      ConflictAborted   → 409       │                    │
//! │                      StillReferenced   → 409       │                    │
//! │                      StoreUnavailable  → 503       │                    │
//! │                      query / internal  → 500       ▼                    │
//! │                                                                         │
//! │  { "code": "INSUFFICIENT_STOCK",                                        │
//! │    "message": "insufficient stock for product Kopi. ..." }              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::{error, warn};

use stockroom_core::{CoreError, ErrorKind, ValidationError};
use stockroom_db::DbError;

/// API error returned from handlers.
///
/// ## Serialization
/// ```json
/// {
///   "code": "NOT_FOUND",
///   "message": "product ID 7 not found"
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Malformed or rule-breaking input (400)
    InvalidRequest,

    /// Not enough units on hand (400)
    InsufficientStock,

    /// Resource not found (404)
    NotFound,

    /// Lost a race or timed out; may be retried (409)
    Conflict,

    /// Record is still referenced by others and cannot be removed (409)
    StillReferenced,

    /// Store cannot be reached (503)
    StoreUnavailable,

    /// Internal server error (500)
    Internal,
}

impl ErrorCode {
    /// HTTP status for this code.
    pub fn status(self) -> StatusCode {
        match self {
            ErrorCode::InvalidRequest | ErrorCode::InsufficientStock => StatusCode::BAD_REQUEST,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::Conflict | ErrorCode::StillReferenced => StatusCode::CONFLICT,
            ErrorCode::StoreUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    /// Creates a validation error.
    pub fn invalid(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::InvalidRequest, message)
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }
}

/// Converts core errors to API errors by their kind.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        let code = match err.kind() {
            ErrorKind::InvalidRequest => ErrorCode::InvalidRequest,
            ErrorKind::InsufficientStock => ErrorCode::InsufficientStock,
            ErrorKind::NotFound => ErrorCode::NotFound,
            ErrorKind::ConflictAborted => {
                warn!(error = %err, "Request aborted, client may retry");
                ErrorCode::Conflict
            }
            ErrorKind::StillReferenced => ErrorCode::StillReferenced,
            ErrorKind::StoreUnavailable => {
                // Log the actual error but return a generic message
                error!(error = %err, "Store unavailable");
                return ApiError::new(ErrorCode::StoreUnavailable, "Store unavailable");
            }
        };

        ApiError::new(code, err.to_string())
    }
}

/// Converts database errors to API errors.
///
/// Query and internal failures are server faults (500); everything else
/// goes through the core taxonomy.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::QueryFailed(e) | DbError::Internal(e) | DbError::MigrationFailed(e) => {
                error!("Database operation failed: {}", e);
                ApiError::internal("Database operation failed")
            }
            other => CoreError::from(other).into(),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::invalid(err.to_string())
    }
}

/// Malformed request bodies, paths and query strings.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::invalid(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::invalid(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::invalid(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.code.status(), Json(self)).into_response()
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

/// Result type for handlers.
pub type ApiResult<T> = Result<T, ApiError>;
