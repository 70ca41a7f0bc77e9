//! # SQLite Unit of Work
//!
//! Implements the core store contracts on top of [`Database`]:
//! [`Store`] opens an sqlx transaction, [`TransactionStore`] delegates to
//! [`TransactionRepository`].
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Database::begin() ── BEGIN IMMEDIATE ──► SqliteUnit { tx }             │
//! │                                           │                             │
//! │     get_product       SELECT ... WHERE p.id = ?       (on &mut *tx)     │
//! │     decrement_stock   UPDATE ... AND stock >= ?       (on &mut *tx)     │
//! │     create_*          INSERT ... RETURNING id         (on &mut *tx)     │
//! │                                           │                             │
//! │     commit()   ── tx.commit()                                           │
//! │     rollback() ── tx.rollback()                                         │
//! │     drop       ── sqlx rolls back                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The unit takes the SQLite write lock before its first read
//! (`BEGIN IMMEDIATE`), so competing checkouts queue on the busy timeout.
//! Only a writer that holds the lock past it surfaces as `DbError::Busy`,
//! which the core sees as `ConflictAborted`.
//!
//! [`TransactionRepository`]: crate::TransactionRepository

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::Sqlite;
use tracing::debug;

use crate::error::{DbError, Entity};
use crate::pool::Database;
use crate::repository::product::{fetch_product, try_decrement_stock};
use crate::repository::transaction::{insert_detail, insert_transaction};
use stockroom_core::{
    BestSellingProduct, CoreError, CoreResult, InventoryStore, Money, Product, RevenueAndCount,
    Store, Transaction, TransactionDetail, TransactionStore, TransactionWriter, UnitOfWork,
};

/// Opens a write transaction up front.
pub(crate) const BEGIN_IMMEDIATE: &str = "BEGIN IMMEDIATE";

/// One open SQLite transaction.
pub struct SqliteUnit {
    tx: sqlx::Transaction<'static, Sqlite>,
}

#[async_trait]
impl InventoryStore for SqliteUnit {
    async fn get_product(&mut self, id: i64) -> CoreResult<Product> {
        fetch_product(&mut *self.tx, id)
            .await?
            .ok_or(CoreError::ProductNotFound(id))
    }

    async fn decrement_stock(&mut self, id: i64, amount: i64) -> CoreResult<()> {
        if try_decrement_stock(&mut *self.tx, id, amount).await? {
            debug!(product_id = id, amount, "Stock decremented");
            return Ok(());
        }

        match fetch_product(&mut *self.tx, id).await? {
            None => Err(DbError::not_found(Entity::Product, id).into()),
            Some(product) => Err(CoreError::InsufficientStock {
                name: product.name,
                available: product.stock,
                requested: amount,
            }),
        }
    }
}

#[async_trait]
impl TransactionWriter for SqliteUnit {
    async fn create_transaction(
        &mut self,
        total: Money,
        created_at: DateTime<Utc>,
    ) -> CoreResult<Transaction> {
        Ok(insert_transaction(&mut *self.tx, total, created_at).await?)
    }

    async fn create_detail(
        &mut self,
        transaction_id: i64,
        product_id: i64,
        quantity: i64,
        subtotal: Money,
    ) -> CoreResult<TransactionDetail> {
        Ok(insert_detail(&mut *self.tx, transaction_id, product_id, quantity, subtotal).await?)
    }
}

#[async_trait]
impl UnitOfWork for SqliteUnit {
    async fn commit(self: Box<Self>) -> CoreResult<()> {
        self.tx.commit().await.map_err(DbError::from)?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> CoreResult<()> {
        self.tx.rollback().await.map_err(DbError::from)?;
        Ok(())
    }
}

#[async_trait]
impl Store for Database {
    async fn begin(&self) -> CoreResult<Box<dyn UnitOfWork>> {
        let tx = self
            .pool()
            .begin_with(BEGIN_IMMEDIATE)
            .await
            .map_err(DbError::from)?;
        Ok(Box::new(SqliteUnit { tx }))
    }
}

#[async_trait]
impl TransactionStore for Database {
    async fn find_transaction(&self, id: i64) -> CoreResult<Option<Transaction>> {
        Ok(self.transactions().get_by_id(id).await?)
    }

    async fn aggregate_revenue_and_count(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> CoreResult<RevenueAndCount> {
        Ok(self.transactions().revenue_and_count(from, to).await?)
    }

    async fn aggregate_best_seller(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> CoreResult<Option<BestSellingProduct>> {
        Ok(self.transactions().best_seller(from, to).await?)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::DbConfig;
    use chrono::TimeZone;
    use std::sync::Arc;
    use std::time::Duration;
    use stockroom_core::store::fixed_clock;
    use stockroom_core::{
        CheckoutEngine, CheckoutItem, ErrorKind, NewCategory, NewProduct, SalesService,
    };

    /// A{10.00, stock 5}, B{3.50, stock 2}
    async fn setup() -> (Database, Product, Product) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let cat = db
            .categories()
            .create(&NewCategory {
                name: "Groceries".into(),
                description: String::new(),
            })
            .await
            .unwrap();
        let a = db
            .products()
            .create(&NewProduct {
                name: "A".into(),
                price_cents: 1000,
                stock: 5,
                category_id: cat.id,
            })
            .await
            .unwrap();
        let b = db
            .products()
            .create(&NewProduct {
                name: "B".into(),
                price_cents: 350,
                stock: 2,
                category_id: cat.id,
            })
            .await
            .unwrap();
        (db, a, b)
    }

    async fn stock_of(db: &Database, id: i64) -> i64 {
        db.products().get(id).await.unwrap().stock
    }

    #[tokio::test]
    async fn test_checkout_commits_everything() {
        let (db, a, b) = setup().await;
        let engine = CheckoutEngine::new(db.clone());

        let tx = engine
            .checkout(&[CheckoutItem::new(a.id, 2), CheckoutItem::new(b.id, 2)])
            .await
            .unwrap();

        assert_eq!(tx.total_cents, 2700);
        assert_eq!(tx.details[0].subtotal_cents, 2000);
        assert_eq!(tx.details[1].subtotal_cents, 700);
        assert_eq!(stock_of(&db, a.id).await, 3);
        assert_eq!(stock_of(&db, b.id).await, 0);

        let loaded = db.transactions().get(tx.id).await.unwrap();
        assert_eq!(loaded.total_cents, 2700);
        assert_eq!(
            loaded.details.iter().map(|d| d.subtotal_cents).sum::<i64>(),
            loaded.total_cents
        );
    }

    #[tokio::test]
    async fn test_insufficient_stock_rolls_back() {
        let (db, a, b) = setup().await;
        let engine = CheckoutEngine::new(db.clone());

        let err = engine
            .checkout(&[CheckoutItem::new(a.id, 6)])
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InsufficientStock);
        assert_eq!(stock_of(&db, a.id).await, 5);

        let err = engine
            .checkout(&[CheckoutItem::new(a.id, 1), CheckoutItem::new(b.id, 3)])
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InsufficientStock);

        assert_eq!(stock_of(&db, a.id).await, 5);
        assert_eq!(stock_of(&db, b.id).await, 2);
        assert_eq!(db.transactions().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_unit_decrement_reports_cause() {
        let (db, a, _) = setup().await;

        let mut unit = db.begin().await.unwrap();
        assert!(matches!(
            unit.decrement_stock(a.id, 6).await,
            Err(CoreError::InsufficientStock { available: 5, .. })
        ));
        assert!(matches!(
            unit.decrement_stock(999, 1).await,
            Err(CoreError::ProductNotFound(999))
        ));
        unit.decrement_stock(a.id, 5).await.unwrap();
        assert_eq!(unit.get_product(a.id).await.unwrap().stock, 0);
        unit.rollback().await.unwrap();

        assert_eq!(stock_of(&db, a.id).await, 5);
    }

    #[tokio::test]
    async fn test_dropped_unit_rolls_back() {
        let (db, a, _) = setup().await;

        let mut unit = db.begin().await.unwrap();
        let header = unit
            .create_transaction(Money::from_cents(1000), Utc::now())
            .await
            .unwrap();
        unit.create_detail(header.id, a.id, 1, Money::from_cents(1000))
            .await
            .unwrap();
        unit.decrement_stock(a.id, 1).await.unwrap();
        drop(unit);

        assert_eq!(stock_of(&db, a.id).await, 5);
        assert_eq!(db.transactions().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_checkouts_for_last_unit() {
        let (db, _, b) = setup().await;
        db.products()
            .update(
                b.id,
                &stockroom_core::ProductUpdate {
                    stock: Some(1),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let engine = Arc::new(CheckoutEngine::new(db.clone()));

        let handles: Vec<_> = (0..2)
            .map(|_| {
                let engine = Arc::clone(&engine);
                tokio::spawn(async move { engine.checkout(&[CheckoutItem::new(b.id, 1)]).await })
            })
            .collect();

        let mut successes = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => successes += 1,
                Err(e) => assert!(matches!(
                    e.kind(),
                    ErrorKind::InsufficientStock | ErrorKind::ConflictAborted
                )),
            }
        }

        assert_eq!(successes, 1);
        assert_eq!(stock_of(&db, b.id).await, 0);
        assert_eq!(db.transactions().count().await.unwrap(), 1);
    }

    /// A file database shared by several pooled connections.
    async fn file_db(
        dir: &tempfile::TempDir,
        products: usize,
        stock: i64,
    ) -> (Database, Vec<Product>) {
        let config = DbConfig::new(dir.path().join("stockroom.db")).max_connections(8);
        let db = Database::new(config).await.unwrap();
        let cat = db
            .categories()
            .create(&NewCategory {
                name: "Groceries".into(),
                description: String::new(),
            })
            .await
            .unwrap();

        let mut created = Vec::with_capacity(products);
        for i in 0..products {
            let product = db
                .products()
                .create(&NewProduct {
                    name: format!("Item {i}"),
                    price_cents: 500,
                    stock,
                    category_id: cat.id,
                })
                .await
                .unwrap();
            created.push(product);
        }
        (db, created)
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_checkouts_of_different_products_all_commit() {
        let dir = tempfile::tempdir().unwrap();
        let (db, products) = file_db(&dir, 8, 100).await;
        let engine = Arc::new(CheckoutEngine::new(db.clone()));

        let handles: Vec<_> = products
            .iter()
            .map(|p| {
                let engine = Arc::clone(&engine);
                let id = p.id;
                tokio::spawn(async move { engine.checkout(&[CheckoutItem::new(id, 1)]).await })
            })
            .collect();

        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        for p in &products {
            assert_eq!(stock_of(&db, p.id).await, 99);
        }
        assert_eq!(db.transactions().count().await.unwrap(), 8);
        db.close().await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_checkouts_never_oversell() {
        let dir = tempfile::tempdir().unwrap();
        let (db, products) = file_db(&dir, 1, 3).await;
        let id = products[0].id;
        let engine = Arc::new(CheckoutEngine::new(db.clone()));

        let handles: Vec<_> = (0..20)
            .map(|_| {
                let engine = Arc::clone(&engine);
                tokio::spawn(async move { engine.checkout(&[CheckoutItem::new(id, 1)]).await })
            })
            .collect();

        let mut successes = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => successes += 1,
                Err(e) => assert_eq!(e.kind(), ErrorKind::InsufficientStock),
            }
        }

        assert_eq!(successes, 3);
        assert_eq!(stock_of(&db, id).await, 0);
        assert_eq!(db.transactions().count().await.unwrap(), 3);
        db.close().await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_price_update_keeps_committed_decrement() {
        let dir = tempfile::tempdir().unwrap();
        let (db, products) = file_db(&dir, 1, 5).await;
        let id = products[0].id;

        let mut unit = db.begin().await.unwrap();
        let header = unit
            .create_transaction(Money::from_cents(500), Utc::now())
            .await
            .unwrap();
        unit.create_detail(header.id, id, 1, Money::from_cents(500))
            .await
            .unwrap();
        unit.decrement_stock(id, 1).await.unwrap();

        let repricing = {
            let db = db.clone();
            tokio::spawn(async move {
                db.products()
                    .update(
                        id,
                        &stockroom_core::ProductUpdate {
                            price_cents: Some(200),
                            ..Default::default()
                        },
                    )
                    .await
            })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        unit.commit().await.unwrap();

        let repriced = repricing.await.unwrap().unwrap();
        assert_eq!(repriced.price_cents, 200);
        assert_eq!(repriced.stock, 4);
        assert_eq!(stock_of(&db, id).await, 4);
        assert_eq!(db.transactions().count().await.unwrap(), 1);
        db.close().await;
    }

    #[tokio::test]
    async fn test_timeout_leaves_nothing_behind() {
        let (db, a, _) = setup().await;
        let service =
            SalesService::new(db.clone()).with_checkout_timeout(Duration::from_millis(50));

        // The single in-memory connection is taken, so begin() cannot finish.
        let held = db.begin().await.unwrap();
        let err = service
            .checkout(&[CheckoutItem::new(a.id, 1)])
            .await
            .unwrap_err();
        held.rollback().await.unwrap();

        assert_eq!(err.kind(), ErrorKind::ConflictAborted);
        assert_eq!(stock_of(&db, a.id).await, 5);
        assert_eq!(db.transactions().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_service_reports_over_sqlite() {
        let (db, a, b) = setup().await;
        let now = Utc.with_ymd_and_hms(2024, 1, 5, 12, 0, 0).unwrap();
        let service = SalesService::new(db.clone()).with_clock(fixed_clock(now));

        service
            .checkout(&[CheckoutItem::new(a.id, 2), CheckoutItem::new(b.id, 2)])
            .await
            .unwrap();
        db.transactions()
            .record(
                Utc.with_ymd_and_hms(2024, 1, 3, 8, 0, 0).unwrap(),
                &[(a.id, 1, Money::from_cents(1000)), (b.id, 1, Money::from_cents(500))],
            )
            .await
            .unwrap();

        let today = service.today_summary().await.unwrap();
        assert_eq!(today.total_revenue_cents, 2700);
        assert_eq!(today.total_transactions, 1);

        let range = service
            .range_summary(
                NaiveDate::from_ymd_opt(2024, 1, 1),
                NaiveDate::from_ymd_opt(2024, 1, 31),
            )
            .await
            .unwrap();
        assert_eq!(range.total_revenue_cents, 4200);
        assert_eq!(range.total_transactions, 2);
        assert_eq!(range.best_selling_product.unwrap().product_id, a.id);

        let empty = service
            .range_summary(
                NaiveDate::from_ymd_opt(2023, 1, 1),
                NaiveDate::from_ymd_opt(2023, 12, 31),
            )
            .await
            .unwrap();
        assert_eq!(empty.total_revenue_cents, 0);
        assert!(empty.best_selling_product.is_none());

        let err = service.get_transaction(999).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
