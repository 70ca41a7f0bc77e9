//! # stockroom-core: Checkout and Sales Logic for Stockroom
//!
//! This crate is the **heart** of Stockroom. It prices and commits
//! checkouts and summarizes sales, reaching persistence only through the
//! traits in [`store`].
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Stockroom Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    HTTP boundary (apps/server)                  │   │
//! │  │    /api/checkout, /api/transactions/{id}, /api/report, ...      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ stockroom-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │ checkout  │  │  report   │  │   types   │  │   money   │  │   │
//! │  │   │ Checkout  │  │   Sales   │  │  Product  │  │   Money   │  │   │
//! │  │   │  Engine   │  │Aggregator │  │Transaction│  │  (cents)  │  │   │
//! │  │   └─────┬─────┘  └─────┬─────┘  └───────────┘  └───────────┘  │   │
//! │  │         └──────┬───────┘                                       │   │
//! │  │          ┌─────▼─────┐   ┌───────────┐                         │   │
//! │  │          │   store   │◄──│  memory   │  (in-process double)    │   │
//! │  │          │  traits   │   └───────────┘                         │   │
//! │  │          └─────▲─────┘                                         │   │
//! │  └────────────────┼────────────────────────────────────────────────┘   │
//! │                   │ implements                                          │
//! │  ┌────────────────┴────────────────────────────────────────────────┐   │
//! │  │                stockroom-db (Database Layer)                    │   │
//! │  │           SQLite queries, migrations, repositories              │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Category, Product, Transaction, SalesSummary)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`error`] - Domain error types and the `ErrorKind` taxonomy
//! - [`validation`] - Business rule validation
//! - [`store`] - Persistence contracts and the unit of work
//! - [`checkout`] - The checkout engine
//! - [`report`] - The sales aggregator
//! - [`service`] - Checkout + reports behind one handle
//! - [`memory`] - In-memory store
//!
//! ## Design Principles
//!
//! 1. **No direct I/O**: the store is passed in, never looked up globally
//! 2. **Integer Money**: All monetary values are in cents (i64) to avoid float errors
//! 3. **Explicit Errors**: All errors are typed, never strings or panics
//! 4. **All or nothing**: a checkout either commits fully or leaves no trace
//!
//! ## Example Usage
//!
//! ```rust
//! use stockroom_core::money::Money;
//!
//! // Create money from cents (never from floats!)
//! let price = Money::from_cents(350); // $3.50
//!
//! // Line subtotal is price × quantity, exactly
//! assert_eq!(price.multiply_quantity(2), Money::from_cents(700));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod checkout;
pub mod error;
pub mod memory;
pub mod money;
pub mod report;
pub mod service;
pub mod store;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use stockroom_core::Money` instead of
// `use stockroom_core::money::Money`

pub use checkout::CheckoutEngine;
pub use error::{CoreError, CoreResult, ErrorKind, ValidationError};
pub use money::Money;
pub use report::SalesAggregator;
pub use service::SalesService;
pub use store::{Clock, InventoryStore, Store, TransactionStore, TransactionWriter, UnitOfWork};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum length of a category name, in characters.
pub const MAX_CATEGORY_NAME_LEN: usize = 100;

/// Maximum length of a product name, in characters.
pub const MAX_PRODUCT_NAME_LEN: usize = 200;

/// Format of report window dates (`2024-01-31`).
pub const REPORT_DATE_FORMAT: &str = "%Y-%m-%d";
