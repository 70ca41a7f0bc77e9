//! # Transaction Repository
//!
//! Read side of transactions: lookup with details and the date-window
//! aggregates behind the sales reports. Writes happen only inside a
//! checkout unit (see [`crate::unit`]).
//!
//! ## Date Windows
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  created_at is stored as UTC RFC 3339 text                              │
//! │       "2024-01-05T23:59:59.123+00:00"                                   │
//! │                │                                                        │
//! │                ▼  DATE(created_at)                                      │
//! │           "2024-01-05"  BETWEEN :from AND :to   (inclusive)             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{SqliteExecutor, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult, Entity};
use crate::repository::product::fetch_product;
use crate::unit::BEGIN_IMMEDIATE;
use stockroom_core::{BestSellingProduct, Money, RevenueAndCount, Transaction, TransactionDetail};

/// Inserts a transaction header and returns it with its new id.
pub(crate) async fn insert_transaction<'e, E>(
    executor: E,
    total: Money,
    created_at: DateTime<Utc>,
) -> DbResult<Transaction>
where
    E: SqliteExecutor<'e>,
{
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO transactions (total_cents, created_at) VALUES (?1, ?2) RETURNING id",
    )
    .bind(total.cents())
    .bind(created_at)
    .fetch_one(executor)
    .await?;

    debug!(transaction_id = id, total = %total, "Transaction header created");

    Ok(Transaction {
        id,
        total_cents: total.cents(),
        created_at,
        details: Vec::new(),
    })
}

/// Inserts one line item.
pub(crate) async fn insert_detail<'e, E>(
    executor: E,
    transaction_id: i64,
    product_id: i64,
    quantity: i64,
    subtotal: Money,
) -> DbResult<TransactionDetail>
where
    E: SqliteExecutor<'e>,
{
    let id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO transaction_details (transaction_id, product_id, quantity, subtotal_cents)
        VALUES (?1, ?2, ?3, ?4)
        RETURNING id
        "#,
    )
    .bind(transaction_id)
    .bind(product_id)
    .bind(quantity)
    .bind(subtotal.cents())
    .fetch_one(executor)
    .await?;

    Ok(TransactionDetail {
        id,
        transaction_id,
        product_id,
        quantity,
        subtotal_cents: subtotal.cents(),
        product: None,
    })
}

/// Repository for reading transactions.
#[derive(Debug, Clone)]
pub struct TransactionRepository {
    pool: SqlitePool,
}

impl TransactionRepository {
    /// Creates a new TransactionRepository.
    pub fn new(pool: SqlitePool) -> Self {
        TransactionRepository { pool }
    }

    /// Loads a transaction with its details, each carrying its product.
    ///
    /// ## Returns
    /// * `Ok(Some(Transaction))` - Transaction found
    /// * `Ok(None)` - Transaction not found
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Transaction>> {
        let Some(mut transaction) = sqlx::query_as::<_, Transaction>(
            "SELECT id, total_cents, created_at FROM transactions WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        else {
            return Ok(None);
        };

        let mut details = sqlx::query_as::<_, TransactionDetail>(
            r#"
            SELECT id, transaction_id, product_id, quantity, subtotal_cents
            FROM transaction_details
            WHERE transaction_id = ?1
            ORDER BY id
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        let mut products = HashMap::new();
        for detail in &mut details {
            if !products.contains_key(&detail.product_id) {
                let product = fetch_product(&self.pool, detail.product_id).await?;
                products.insert(detail.product_id, product);
            }
            detail.product = products.get(&detail.product_id).cloned().flatten();
        }

        debug!(transaction_id = id, lines = details.len(), "Loaded transaction");

        transaction.details = details;
        Ok(Some(transaction))
    }

    /// Loads a transaction, failing with NotFound.
    pub async fn get(&self, id: i64) -> DbResult<Transaction> {
        self.get_by_id(id)
            .await?
            .ok_or(DbError::not_found(Entity::Transaction, id))
    }

    /// Sum of totals and count of transactions whose UTC date is in the window.
    pub async fn revenue_and_count(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> DbResult<RevenueAndCount> {
        let totals = sqlx::query_as::<_, RevenueAndCount>(
            r#"
            SELECT
                COALESCE(SUM(total_cents), 0) AS revenue_cents,
                COUNT(id) AS transaction_count
            FROM transactions
            WHERE DATE(created_at) BETWEEN ?1 AND ?2
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_one(&self.pool)
        .await?;

        Ok(totals)
    }

    /// Product with the highest summed quantity in the window.
    /// Ties go to the lowest product id.
    pub async fn best_seller(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> DbResult<Option<BestSellingProduct>> {
        let best = sqlx::query_as::<_, BestSellingProduct>(
            r#"
            SELECT
                d.product_id AS product_id,
                p.name AS name,
                SUM(d.quantity) AS qty_sold
            FROM transaction_details d
            INNER JOIN transactions t ON t.id = d.transaction_id
            INNER JOIN products p ON p.id = d.product_id
            WHERE DATE(t.created_at) BETWEEN ?1 AND ?2
            GROUP BY d.product_id, p.name
            ORDER BY qty_sold DESC, d.product_id ASC
            LIMIT 1
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_optional(&self.pool)
        .await?;

        Ok(best)
    }

    /// Records a finished sale with an explicit timestamp, in one transaction.
    ///
    /// Stock is not touched. Used to backfill history (seed data, imports).
    pub async fn record(
        &self,
        created_at: DateTime<Utc>,
        lines: &[(i64, i64, Money)],
    ) -> DbResult<Transaction> {
        let total: Money = lines.iter().map(|line| line.2).sum();

        let mut tx = self.pool.begin_with(BEGIN_IMMEDIATE).await?;
        let mut transaction = insert_transaction(&mut *tx, total, created_at).await?;
        for &(product_id, quantity, subtotal) in lines {
            let detail =
                insert_detail(&mut *tx, transaction.id, product_id, quantity, subtotal).await?;
            transaction.details.push(detail);
        }
        tx.commit().await?;

        Ok(transaction)
    }

    /// Counts all transactions.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM transactions")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
