//! # Store Contracts
//!
//! The capabilities the checkout engine and the sales aggregator need from
//! persistence. stockroom-db implements them over SQLite; [`crate::memory`]
//! implements them in memory for tests.
//!
//! ## Unit of Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Store::begin() ──► Box<dyn UnitOfWork>                                 │
//! │                        │                                                │
//! │                        ├── InventoryStore                               │
//! │                        │     get_product(id)                            │
//! │                        │     decrement_stock(id, amount)                │
//! │                        │                                                │
//! │                        ├── TransactionWriter                            │
//! │                        │     create_transaction(total, created_at)      │
//! │                        │     create_detail(tx_id, product_id, qty, sub) │
//! │                        │                                                │
//! │                        ├── commit()   ──► everything becomes visible    │
//! │                        └── rollback() ──► nothing happened              │
//! │                                                                         │
//! │  Dropping a unit without committing is the same as rolling it back.     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Read-side queries ([`TransactionStore`]) run outside any unit and see
//! committed data only.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use crate::error::CoreResult;
use crate::money::Money;
use crate::types::{BestSellingProduct, Product, RevenueAndCount, Transaction, TransactionDetail};

// =============================================================================
// Clock
// =============================================================================

/// Source of "now" for stamping transactions and resolving "today".
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// The wall clock, in UTC.
pub fn system_clock() -> Clock {
    Arc::new(Utc::now)
}

/// A clock frozen at `at`.
pub fn fixed_clock(at: DateTime<Utc>) -> Clock {
    Arc::new(move || at)
}

// =============================================================================
// Write Side (inside a unit)
// =============================================================================

/// Product lookup and stock mutation, scoped to one unit of work.
#[async_trait]
pub trait InventoryStore: Send {
    /// Reads the product as currently visible inside the unit.
    ///
    /// Fails with `ProductNotFound` when the id does not exist.
    async fn get_product(&mut self, id: i64) -> CoreResult<Product>;

    /// Takes `amount` units off the product's stock, only if that many are
    /// on hand.
    ///
    /// Fails with `ProductNotFound` when the row is gone and with
    /// `InsufficientStock` when the conditional update matched nothing.
    async fn decrement_stock(&mut self, id: i64, amount: i64) -> CoreResult<()>;
}

/// Transaction persistence, scoped to one unit of work.
#[async_trait]
pub trait TransactionWriter: Send {
    /// Inserts a transaction header and returns it with its new id.
    async fn create_transaction(
        &mut self,
        total: Money,
        created_at: DateTime<Utc>,
    ) -> CoreResult<Transaction>;

    /// Inserts one line item of `transaction_id`.
    async fn create_detail(
        &mut self,
        transaction_id: i64,
        product_id: i64,
        quantity: i64,
        subtotal: Money,
    ) -> CoreResult<TransactionDetail>;
}

/// An open atomic unit of work.
#[async_trait]
pub trait UnitOfWork: InventoryStore + TransactionWriter {
    /// Makes every write of the unit visible at once.
    async fn commit(self: Box<Self>) -> CoreResult<()>;

    /// Discards every write of the unit.
    async fn rollback(self: Box<Self>) -> CoreResult<()>;
}

/// Opens units of work against a shared store.
#[async_trait]
pub trait Store: Send + Sync {
    async fn begin(&self) -> CoreResult<Box<dyn UnitOfWork>>;
}

// =============================================================================
// Read Side
// =============================================================================

/// Lookups and aggregates over committed transactions.
///
/// Date windows are inclusive calendar dates compared against the UTC
/// creation date of each transaction.
#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// Loads a transaction with its details (each carrying its product).
    async fn find_transaction(&self, id: i64) -> CoreResult<Option<Transaction>>;

    /// Sum of totals and number of transactions in the window.
    async fn aggregate_revenue_and_count(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> CoreResult<RevenueAndCount>;

    /// Product with the highest summed quantity in the window.
    /// Ties go to the lowest product id.
    async fn aggregate_best_seller(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> CoreResult<Option<BestSellingProduct>>;
}
