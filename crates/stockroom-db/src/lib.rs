//! # stockroom-db: Database Layer for Stockroom
//!
//! SQLite persistence for categories, products and transactions, plus the
//! implementations of the core store contracts the checkout engine and the
//! sales aggregator run against.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Stockroom Data Flow                              │
//! │                                                                         │
//! │  HTTP handler (POST /api/checkout)                                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SalesService<Database>  (stockroom-core)                               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  stockroom-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │  category.rs  │    │  (embedded)  │  │   │
//! │  │   │               │    │  product.rs   │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ transaction.rs│    │ 001_initial  │  │   │
//! │  │   └───────┬───────┘    └───────────────┘    └──────────────┘  │   │
//! │  │           │                                                     │   │
//! │  │   ┌───────▼───────┐                                            │   │
//! │  │   │  SqliteUnit   │  Store / UnitOfWork / TransactionStore     │   │
//! │  │   │   (unit.rs)   │                                            │   │
//! │  │   └───────────────┘                                            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite database file (WAL)                                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations
//! - [`unit`] - Store contracts over sqlx transactions
//!
//! ## Usage
//!
//! ```rust,ignore
//! use stockroom_core::{CheckoutItem, SalesService};
//! use stockroom_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("./stockroom.db")).await?;
//! let service = SalesService::new(db.clone());
//!
//! let tx = service.checkout(&[CheckoutItem::new(1, 2)]).await?;
//! let kopi = db.products().search_by_name("kopi").await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod unit;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult, Entity};
pub use pool::{Database, DbConfig};
pub use unit::SqliteUnit;

// Repository re-exports for convenience
pub use repository::category::CategoryRepository;
pub use repository::product::ProductRepository;
pub use repository::transaction::TransactionRepository;
