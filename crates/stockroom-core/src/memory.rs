//! # In-Memory Store
//!
//! A [`Store`] + [`TransactionStore`] that keeps everything in process
//! memory. Used by the core tests and by anything that wants the engine
//! without a database.
//!
//! ## Isolation Model
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Arc<Mutex<State>>                                                      │
//! │       │                                                                 │
//! │       │ begin(): lock_owned()  ── one writer at a time                  │
//! │       ▼                                                                 │
//! │  MemoryUnit { guard, working: State (clone) }                           │
//! │       │                                                                 │
//! │       ├── commit():   *guard = working                                  │
//! │       └── rollback(): working dropped, guard released                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//! Readers take the same lock, so they only ever see committed state.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::store::{InventoryStore, Store, TransactionStore, TransactionWriter, UnitOfWork};
use crate::types::{
    BestSellingProduct, Category, NewProduct, Product, RevenueAndCount, Transaction,
    TransactionDetail,
};

#[derive(Debug, Clone, Default)]
struct State {
    categories: BTreeMap<i64, Category>,
    products: BTreeMap<i64, Product>,
    transactions: BTreeMap<i64, Transaction>,
    details: Vec<TransactionDetail>,
    next_id: i64,
    failing_decrements: HashSet<i64>,
}

impl State {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn product_with_category(&self, id: i64) -> Option<Product> {
        let mut product = self.products.get(&id)?.clone();
        product.category = self.categories.get(&product.category_id).cloned();
        Some(product)
    }

    fn in_window(&self, from: NaiveDate, to: NaiveDate) -> impl Iterator<Item = &Transaction> {
        self.transactions.values().filter(move |t| {
            let day = t.created_at.date_naive();
            day >= from && day <= to
        })
    }
}

/// In-memory store. Cloning shares the same underlying state.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<State>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a category and returns it.
    pub async fn insert_category(&self, name: &str, description: &str) -> Category {
        let mut state = self.state.lock().await;
        let category = Category {
            id: state.next_id(),
            name: name.to_string(),
            description: description.to_string(),
        };
        state.categories.insert(category.id, category.clone());
        category
    }

    /// Adds a product and returns it. The category is not checked.
    pub async fn insert_product(&self, new: NewProduct) -> Product {
        let mut state = self.state.lock().await;
        let product = Product {
            id: state.next_id(),
            name: new.name,
            price_cents: new.price_cents,
            stock: new.stock,
            category_id: new.category_id,
            category: None,
        };
        state.products.insert(product.id, product.clone());
        product
    }

    /// Inserts an already-built transaction, keeping its `created_at`.
    ///
    /// Details are stamped with fresh ids and the new transaction id.
    pub async fn insert_transaction(
        &self,
        created_at: DateTime<Utc>,
        lines: &[(i64, i64, Money)],
    ) -> Transaction {
        let mut state = self.state.lock().await;
        let id = state.next_id();
        let mut details = Vec::with_capacity(lines.len());
        for &(product_id, quantity, subtotal) in lines {
            let detail = TransactionDetail {
                id: state.next_id(),
                transaction_id: id,
                product_id,
                quantity,
                subtotal_cents: subtotal.cents(),
                product: None,
            };
            state.details.push(detail.clone());
            details.push(detail);
        }
        let transaction = Transaction {
            id,
            total_cents: lines.iter().map(|l| l.2).sum::<Money>().cents(),
            created_at,
            details: Vec::new(),
        };
        state.transactions.insert(id, transaction.clone());
        Transaction {
            details,
            ..transaction
        }
    }

    /// Current committed product, with its category.
    pub async fn product(&self, id: i64) -> Option<Product> {
        self.state.lock().await.product_with_category(id)
    }

    pub async fn transaction_count(&self) -> usize {
        self.state.lock().await.transactions.len()
    }

    pub async fn detail_count(&self) -> usize {
        self.state.lock().await.details.len()
    }

    /// Makes every later stock decrement of `product_id` fail as a conflict.
    pub async fn fail_decrements_of(&self, product_id: i64) {
        self.state
            .lock()
            .await
            .failing_decrements
            .insert(product_id);
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn begin(&self) -> CoreResult<Box<dyn UnitOfWork>> {
        let guard = Arc::clone(&self.state).lock_owned().await;
        let working = guard.clone();
        Ok(Box::new(MemoryUnit { guard, working }))
    }
}

#[async_trait]
impl TransactionStore for MemoryStore {
    async fn find_transaction(&self, id: i64) -> CoreResult<Option<Transaction>> {
        let state = self.state.lock().await;
        let Some(transaction) = state.transactions.get(&id) else {
            return Ok(None);
        };

        let details = state
            .details
            .iter()
            .filter(|d| d.transaction_id == id)
            .map(|d| TransactionDetail {
                product: state.product_with_category(d.product_id),
                ..d.clone()
            })
            .collect();

        Ok(Some(Transaction {
            details,
            ..transaction.clone()
        }))
    }

    async fn aggregate_revenue_and_count(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> CoreResult<RevenueAndCount> {
        let state = self.state.lock().await;
        Ok(state
            .in_window(from, to)
            .fold(RevenueAndCount::default(), |acc, t| RevenueAndCount {
                revenue_cents: acc.revenue_cents + t.total_cents,
                transaction_count: acc.transaction_count + 1,
            }))
    }

    async fn aggregate_best_seller(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> CoreResult<Option<BestSellingProduct>> {
        let state = self.state.lock().await;
        let ids: HashSet<i64> = state.in_window(from, to).map(|t| t.id).collect();

        let mut sold: HashMap<i64, i64> = HashMap::new();
        for detail in state.details.iter().filter(|d| ids.contains(&d.transaction_id)) {
            *sold.entry(detail.product_id).or_default() += detail.quantity;
        }

        let best = sold
            .into_iter()
            .max_by(|(a_id, a_qty), (b_id, b_qty)| a_qty.cmp(b_qty).then(b_id.cmp(a_id)));

        Ok(best.and_then(|(product_id, qty_sold)| {
            state.products.get(&product_id).map(|p| BestSellingProduct {
                product_id,
                name: p.name.clone(),
                qty_sold,
            })
        }))
    }
}

/// One open unit against a [`MemoryStore`].
struct MemoryUnit {
    guard: OwnedMutexGuard<State>,
    working: State,
}

#[async_trait]
impl InventoryStore for MemoryUnit {
    async fn get_product(&mut self, id: i64) -> CoreResult<Product> {
        self.working
            .product_with_category(id)
            .ok_or(CoreError::ProductNotFound(id))
    }

    async fn decrement_stock(&mut self, id: i64, amount: i64) -> CoreResult<()> {
        if self.working.failing_decrements.contains(&id) {
            return Err(CoreError::ConflictAborted(format!(
                "stock update of product {id} was rejected"
            )));
        }

        let product = self
            .working
            .products
            .get_mut(&id)
            .ok_or(CoreError::ProductNotFound(id))?;

        if product.stock < amount {
            return Err(CoreError::InsufficientStock {
                name: product.name.clone(),
                available: product.stock,
                requested: amount,
            });
        }

        product.stock -= amount;
        Ok(())
    }
}

#[async_trait]
impl TransactionWriter for MemoryUnit {
    async fn create_transaction(
        &mut self,
        total: Money,
        created_at: DateTime<Utc>,
    ) -> CoreResult<Transaction> {
        let transaction = Transaction {
            id: self.working.next_id(),
            total_cents: total.cents(),
            created_at,
            details: Vec::new(),
        };
        self.working
            .transactions
            .insert(transaction.id, transaction.clone());
        Ok(transaction)
    }

    async fn create_detail(
        &mut self,
        transaction_id: i64,
        product_id: i64,
        quantity: i64,
        subtotal: Money,
    ) -> CoreResult<TransactionDetail> {
        if !self.working.transactions.contains_key(&transaction_id) {
            return Err(CoreError::TransactionNotFound(transaction_id));
        }
        let detail = TransactionDetail {
            id: self.working.next_id(),
            transaction_id,
            product_id,
            quantity,
            subtotal_cents: subtotal.cents(),
            product: None,
        };
        self.working.details.push(detail.clone());
        Ok(detail)
    }
}

#[async_trait]
impl UnitOfWork for MemoryUnit {
    async fn commit(self: Box<Self>) -> CoreResult<()> {
        let MemoryUnit { mut guard, working } = *self;
        *guard = working;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> CoreResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[tokio::test]
    async fn test_uncommitted_unit_is_invisible() {
        let store = MemoryStore::new();
        let cat = store.insert_category("Snacks", "").await;
        let p = store
            .insert_product(NewProduct {
                name: "Chips".into(),
                price_cents: 250,
                stock: 4,
                category_id: cat.id,
            })
            .await;

        let mut unit = store.begin().await.unwrap();
        unit.decrement_stock(p.id, 3).await.unwrap();
        assert_eq!(unit.get_product(p.id).await.unwrap().stock, 1);
        drop(unit);

        assert_eq!(store.product(p.id).await.unwrap().stock, 4);

        let mut unit = store.begin().await.unwrap();
        unit.decrement_stock(p.id, 3).await.unwrap();
        unit.commit().await.unwrap();
        assert_eq!(store.product(p.id).await.unwrap().stock, 1);
    }

    #[tokio::test]
    async fn test_decrement_is_conditional() {
        let store = MemoryStore::new();
        let p = store
            .insert_product(NewProduct {
                name: "Gum".into(),
                price_cents: 50,
                stock: 1,
                category_id: 0,
            })
            .await;

        let mut unit = store.begin().await.unwrap();
        assert!(matches!(
            unit.decrement_stock(p.id, 2).await,
            Err(CoreError::InsufficientStock { .. })
        ));
        assert!(matches!(
            unit.decrement_stock(p.id + 100, 1).await,
            Err(CoreError::ProductNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_best_seller_tie_goes_to_lowest_id() {
        let store = MemoryStore::new();
        let a = store.insert_product(NewProduct { name: "A".into(), ..Default::default() }).await;
        let b = store.insert_product(NewProduct { name: "B".into(), ..Default::default() }).await;
        let day = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();

        store
            .insert_transaction(day, &[(b.id, 2, Money::zero()), (a.id, 2, Money::zero())])
            .await;

        let d = day.date_naive();
        let best = store.aggregate_best_seller(d, d).await.unwrap().unwrap();
        assert_eq!(best.product_id, a.id);
        assert_eq!(best.qty_sold, 2);
    }
}
