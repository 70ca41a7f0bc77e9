//! # Checkout Engine
//!
//! Turns a list of (product, quantity) lines into one committed transaction.
//!
//! ## Checkout Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  checkout([A×2, B×2])                                                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  1. Reject empty list / non-positive quantities   (nothing opened yet)  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  2. begin() unit of work                                                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  3. For each line: re-read product, check running stock,               │
//! │     subtotal = price × qty, total += subtotal                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  4. create_transaction(total) ──► id                                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  5. For each line: create_detail(id, ...) + decrement_stock(...)        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  6. commit()                                                            │
//! │                                                                         │
//! │  Any error after step 2 rolls the whole unit back.                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Duplicate Lines
//! `[A×2, A×3]` is two independent lines. The running-stock map is seeded
//! from the first read of A inside the unit, so the second line sees only
//! what the first one left.

use std::collections::HashMap;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::store::{system_clock, Clock, Store, UnitOfWork};
use crate::types::{CheckoutItem, Product, Transaction};
use crate::validation::validate_quantity;

/// A priced line waiting for its transaction id.
#[derive(Debug)]
struct PendingDetail {
    product: Product,
    quantity: i64,
    subtotal: Money,
}

/// Validates the request shape before any unit is opened.
///
/// ## Rules
/// - At least one line
/// - Every quantity is positive
pub fn validate_checkout_items(items: &[CheckoutItem]) -> CoreResult<()> {
    if items.is_empty() {
        return Err(CoreError::EmptyCheckout);
    }

    for item in items {
        if validate_quantity(item.quantity).is_err() {
            return Err(CoreError::InvalidQuantity {
                product_id: item.product_id,
                quantity: item.quantity,
            });
        }
    }

    Ok(())
}

/// Orchestrates validation, pricing and atomic persistence for checkouts.
///
/// ## Usage
/// ```rust
/// use stockroom_core::checkout::CheckoutEngine;
/// use stockroom_core::memory::MemoryStore;
/// use stockroom_core::{CheckoutItem, NewProduct};
///
/// # tokio_test_block(async {
/// let store = MemoryStore::new();
/// let drinks = store.insert_category("Drinks", "").await;
/// let kopi = store
///     .insert_product(NewProduct {
///         name: "Kopi".into(),
///         price_cents: 1000,
///         stock: 5,
///         category_id: drinks.id,
///     })
///     .await;
///
/// let engine = CheckoutEngine::new(store);
/// let tx = engine.checkout(&[CheckoutItem::new(kopi.id, 2)]).await.unwrap();
/// assert_eq!(tx.total_cents, 2000);
/// # });
/// # fn tokio_test_block<F: std::future::Future>(f: F) -> F::Output {
/// #     tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(f)
/// # }
/// ```
pub struct CheckoutEngine<S> {
    store: S,
    clock: Clock,
}

impl<S: Store> CheckoutEngine<S> {
    pub fn new(store: S) -> Self {
        CheckoutEngine {
            store,
            clock: system_clock(),
        }
    }

    /// Replaces the clock used to stamp `created_at`.
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Runs one checkout as a single atomic unit.
    ///
    /// ## Errors
    /// - `EmptyCheckout` / `InvalidQuantity` before anything is opened
    /// - `ProductNotFound` for an unknown id
    /// - `InsufficientStock` when a line asks for more than remains
    /// - whatever the store reports (`ConflictAborted`, `StoreUnavailable`)
    pub async fn checkout(&self, items: &[CheckoutItem]) -> CoreResult<Transaction> {
        if let Err(e) = validate_checkout_items(items) {
            warn!(error = %e, "Checkout rejected");
            return Err(e);
        }

        let mut unit = self.store.begin().await?;

        match self.run(unit.as_mut(), items).await {
            Ok(transaction) => {
                unit.commit().await?;
                info!(
                    transaction_id = transaction.id,
                    total = %transaction.total(),
                    lines = transaction.details.len(),
                    "Checkout committed"
                );
                Ok(transaction)
            }
            Err(e) => {
                if let Err(rollback_err) = unit.rollback().await {
                    warn!(error = %rollback_err, "Rollback failed");
                }
                warn!(error = %e, "Checkout rejected");
                Err(e)
            }
        }
    }

    /// Like [`checkout`](Self::checkout) but gives up after `timeout`.
    ///
    /// The unit is dropped uncommitted when the deadline passes, which rolls
    /// it back. Reported as `TimedOut` (kind `ConflictAborted`).
    pub async fn checkout_within(
        &self,
        items: &[CheckoutItem],
        timeout: Duration,
    ) -> CoreResult<Transaction> {
        match tokio::time::timeout(timeout, self.checkout(items)).await {
            Ok(result) => result,
            Err(_) => {
                let after_ms = timeout.as_millis() as u64;
                warn!(after_ms, "Checkout timed out");
                Err(CoreError::TimedOut { after_ms })
            }
        }
    }

    async fn run(
        &self,
        unit: &mut dyn UnitOfWork,
        items: &[CheckoutItem],
    ) -> CoreResult<Transaction> {
        let mut remaining: HashMap<i64, i64> = HashMap::new();
        let mut pending = Vec::with_capacity(items.len());
        let mut total = Money::zero();

        for item in items {
            let product = unit.get_product(item.product_id).await?;

            let available = remaining.entry(product.id).or_insert(product.stock);
            if *available < item.quantity {
                return Err(CoreError::InsufficientStock {
                    name: product.name,
                    available: *available,
                    requested: item.quantity,
                });
            }
            *available -= item.quantity;

            let subtotal = product
                .price()
                .checked_multiply_quantity(item.quantity)
                .ok_or(CoreError::AmountOverflow {
                    product_id: product.id,
                })?;
            total = total.checked_add(subtotal).ok_or(CoreError::AmountOverflow {
                product_id: product.id,
            })?;

            debug!(
                product_id = product.id,
                quantity = item.quantity,
                subtotal = %subtotal,
                "Line priced"
            );

            pending.push(PendingDetail {
                product,
                quantity: item.quantity,
                subtotal,
            });
        }

        let mut transaction = unit.create_transaction(total, (self.clock)()).await?;

        for line in pending {
            let mut detail = unit
                .create_detail(
                    transaction.id,
                    line.product.id,
                    line.quantity,
                    line.subtotal,
                )
                .await?;
            unit.decrement_stock(line.product.id, line.quantity).await?;

            detail.product = Some(line.product);
            transaction.details.push(detail);
        }

        Ok(transaction)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
