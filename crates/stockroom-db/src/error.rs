//! # Database Error Types
//!
//! Error types for database operations.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  SQLite Error (sqlx::Error)                                             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DbError (this module) ← Adds context and categorization                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  CoreError ← What the checkout engine and aggregator see                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ApiError (in apps/server) ← Serialized for HTTP clients                │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::fmt;

use stockroom_core::{CoreError, ValidationError};
use thiserror::Error;

/// The kind of record a [`DbError`] is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Category,
    Product,
    Transaction,
}

impl Entity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Entity::Category => "category",
            Entity::Product => "product",
            Entity::Transaction => "transaction",
        }
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Database operation errors.
///
/// These errors wrap sqlx errors and provide additional context
/// for debugging and for mapping onto [`CoreError`].
#[derive(Debug, Error)]
pub enum DbError {
    /// Entity not found in database.
    ///
    /// ## When This Occurs
    /// - `fetch_one` returns no rows
    /// - ID doesn't exist
    #[error("{entity} not found: {id}")]
    NotFound { entity: Entity, id: i64 },

    /// Unique constraint violation.
    ///
    /// ## When This Occurs
    /// - Inserting a duplicate category name
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// Row is still referenced by another table.
    ///
    /// ## When This Occurs
    /// - Deleting a category that still has products
    /// - Deleting a product that appears in a transaction
    #[error("{entity} {id} is still referenced by {referenced_by}")]
    InUse {
        entity: Entity,
        id: i64,
        referenced_by: &'static str,
    },

    /// Foreign key constraint violation.
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// CHECK constraint violation (negative price or stock).
    #[error("Constraint violation: {message}")]
    CheckViolation { message: String },

    /// Input rejected before reaching SQL.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// SQLite is busy or locked by another writer.
    ///
    /// ## When This Occurs
    /// - Two checkouts race for the write lock and this one lost
    /// - The busy timeout expired while waiting for the lock
    #[error("Database busy: {0}")]
    Busy(String),

    /// Database connection failed.
    ///
    /// ## When This Occurs
    /// - Database file doesn't exist and can't be created
    /// - File permissions issue
    /// - Pool closed during shutdown
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    ///
    /// ## When This Occurs
    /// - Invalid SQL in migration
    /// - Migration version conflict
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Pool exhausted (all connections in use).
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// Internal database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: Entity, id: i64) -> Self {
        DbError::NotFound { entity, id }
    }

    /// Creates a UniqueViolation error.
    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        DbError::UniqueViolation {
            field: field.into(),
            value: value.into(),
        }
    }
}

/// SQLITE_BUSY (5) and SQLITE_LOCKED (6), including extended codes such as
/// SQLITE_BUSY_SNAPSHOT (517).
fn is_busy_code(code: &str) -> bool {
    code.parse::<i32>()
        .map(|c| matches!(c & 0xff, 5 | 6))
        .unwrap_or(false)
}

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::RowNotFound    → DbError::Internal (callers use fetch_optional)
/// sqlx::Error::Database       → busy/locked, or analyze message for constraint
/// sqlx::Error::PoolTimedOut   → DbError::PoolExhausted
/// sqlx::Error::PoolClosed     → DbError::ConnectionFailed
/// sqlx::Error::Io             → DbError::ConnectionFailed
/// Other                       → DbError::Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();

                if db_err.code().as_deref().is_some_and(is_busy_code)
                    || msg.contains("database is locked")
                    || msg.contains("database is busy")
                {
                    return DbError::Busy(msg.to_string());
                }

                // SQLite error messages for constraints:
                // UNIQUE constraint: "UNIQUE constraint failed: <table>.<column>"
                // FK constraint: "FOREIGN KEY constraint failed"
                // CHECK constraint: "CHECK constraint failed: <expr>"
                if msg.contains("UNIQUE constraint failed") {
                    let field = msg
                        .split("UNIQUE constraint failed: ")
                        .nth(1)
                        .unwrap_or("unknown")
                        .to_string();
                    DbError::UniqueViolation {
                        field,
                        value: "unknown".to_string(),
                    }
                } else if msg.contains("FOREIGN KEY constraint failed") {
                    DbError::ForeignKeyViolation {
                        message: msg.to_string(),
                    }
                } else if msg.contains("CHECK constraint failed") {
                    DbError::CheckViolation {
                        message: msg.to_string(),
                    }
                } else {
                    DbError::QueryFailed(msg.to_string())
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),

            sqlx::Error::Io(e) => DbError::ConnectionFailed(e.to_string()),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

/// Maps database failures onto the core taxonomy.
///
/// ```text
/// NotFound           → {Category,Product,Transaction}NotFound
/// UniqueViolation    → Validation(Duplicate)
/// InUse              → StillReferenced
/// Busy               → ConflictAborted
/// FK / CHECK         → InvalidRequest
/// Connection / Pool  → StoreUnavailable
/// anything else      → StoreUnavailable
/// ```
impl From<DbError> for CoreError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => match entity {
                Entity::Category => CoreError::CategoryNotFound(id),
                Entity::Product => CoreError::ProductNotFound(id),
                Entity::Transaction => CoreError::TransactionNotFound(id),
            },
            DbError::UniqueViolation { field, value } => {
                CoreError::Validation(ValidationError::Duplicate { field, value })
            }
            DbError::InUse {
                entity,
                id,
                referenced_by,
            } => CoreError::StillReferenced {
                entity: entity.as_str(),
                id,
                referenced_by,
            },
            DbError::Validation(e) => CoreError::Validation(e),
            DbError::Busy(msg) => CoreError::ConflictAborted(msg),
            DbError::ForeignKeyViolation { message } | DbError::CheckViolation { message } => {
                CoreError::InvalidRequest(message)
            }
            other @ (DbError::ConnectionFailed(_)
            | DbError::MigrationFailed(_)
            | DbError::QueryFailed(_)
            | DbError::PoolExhausted
            | DbError::Internal(_)) => CoreError::StoreUnavailable(other.to_string()),
        }
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;
