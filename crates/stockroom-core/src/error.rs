//! # Error Types
//!
//! Domain-specific error types for stockroom-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  stockroom-core errors (this file)                                      │
//! │  ├── CoreError        - Checkout, lookup and report failures            │
//! │  ├── ValidationError  - Input validation failures                       │
//! │  └── ErrorKind        - Coarse taxonomy every CoreError maps onto       │
//! │                                                                         │
//! │  stockroom-db errors (separate crate)                                   │
//! │  └── DbError          - Database operation failures                     │
//! │                                                                         │
//! │  HTTP errors (apps/server)                                              │
//! │  └── ApiError         - What clients see (serialized)                   │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError ← DbError;  CoreError → ApiError     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (product id, name, quantities)
//! 3. Errors are enum variants, never String
//! 4. Every variant has exactly one `ErrorKind`

use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;

// =============================================================================
// Error Kind
// =============================================================================

/// Coarse classification of a failure, independent of the layer it came from.
///
/// ```text
/// ┌──────────────────────┬─────────────────────────────────────────────────┐
/// │ InvalidRequest       │ caller sent something malformed                 │
/// │ NotFound             │ an id does not exist                            │
/// │ InsufficientStock    │ a line asks for more than is on the shelf       │
/// │ ConflictAborted      │ lost a race or timed out; retrying may succeed  │
/// │ StillReferenced      │ other records point at it; retrying won't help  │
/// │ StoreUnavailable     │ the store could not be reached; fatal           │
/// └──────────────────────┴─────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidRequest,
    NotFound,
    InsufficientStock,
    ConflictAborted,
    StillReferenced,
    StoreUnavailable,
}

impl ErrorKind {
    /// Whether the same request may succeed if simply tried again.
    pub fn is_retryable(self) -> bool {
        matches!(self, ErrorKind::ConflictAborted)
    }
}

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These errors represent business rule violations or store failures seen
/// through the store traits. Boundaries translate them via [`CoreError::kind`].
#[derive(Debug, Error)]
pub enum CoreError {
    /// Checkout request had no lines.
    #[error("checkout items cannot be empty")]
    EmptyCheckout,

    /// A checkout line asked for zero or a negative quantity.
    #[error("invalid quantity {quantity} for product ID {product_id}")]
    InvalidQuantity { product_id: i64, quantity: i64 },

    /// Line subtotal or transaction total does not fit in the money type.
    #[error("amount overflow while pricing product ID {product_id}")]
    AmountOverflow { product_id: i64 },

    /// Malformed request that is not tied to one field.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Product cannot be found.
    ///
    /// ## When This Occurs
    /// - Product ID doesn't exist
    /// - Product was deleted between the read and the stock decrement
    #[error("product ID {0} not found")]
    ProductNotFound(i64),

    /// Category cannot be found.
    #[error("category ID {0} not found")]
    CategoryNotFound(i64),

    /// Transaction cannot be found.
    #[error("transaction ID {0} not found")]
    TransactionNotFound(i64),

    /// Insufficient stock to complete checkout.
    ///
    /// ## User Workflow
    /// ```text
    /// Checkout [A × 6]
    ///      │
    ///      ▼
    /// Read A inside the unit: stock=5
    ///      │
    ///      ▼
    /// InsufficientStock { name: "A", available: 5, requested: 6 }
    ///      │
    ///      ▼
    /// Unit rolled back, nothing persisted
    /// ```
    #[error("insufficient stock for product {name}. Available: {available}, Requested: {requested}")]
    InsufficientStock {
        name: String,
        available: i64,
        requested: i64,
    },

    /// A record is still referenced and cannot be removed.
    #[error("{entity} ID {id} is still referenced by {referenced_by}")]
    StillReferenced {
        entity: &'static str,
        id: i64,
        referenced_by: &'static str,
    },

    /// The unit of work lost a race against a concurrent writer.
    #[error("operation aborted by a concurrent update: {0}")]
    ConflictAborted(String),

    /// The caller's deadline passed before the unit committed.
    #[error("operation timed out after {after_ms}ms")]
    TimedOut { after_ms: u64 },

    /// The backing store could not be reached.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Maps the error onto the coarse taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::EmptyCheckout
            | CoreError::InvalidQuantity { .. }
            | CoreError::AmountOverflow { .. }
            | CoreError::InvalidRequest(_)
            | CoreError::Validation(_) => ErrorKind::InvalidRequest,

            CoreError::ProductNotFound(_)
            | CoreError::CategoryNotFound(_)
            | CoreError::TransactionNotFound(_) => ErrorKind::NotFound,

            CoreError::InsufficientStock { .. } => ErrorKind::InsufficientStock,

            CoreError::ConflictAborted(_) | CoreError::TimedOut { .. } => {
                ErrorKind::ConflictAborted
            }

            CoreError::StillReferenced { .. } => ErrorKind::StillReferenced,

            CoreError::StoreUnavailable(_) => ErrorKind::StoreUnavailable,
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Used for early validation before anything touches the store.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} cannot be negative")]
    Negative { field: String },

    /// Invalid format (e.g., invalid date).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Duplicate value (e.g., duplicate category name).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
