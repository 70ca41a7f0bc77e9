//! # Product Repository
//!
//! Database operations for products.
//!
//! ## Key Operations
//! - CRUD with a partial update
//! - Case-insensitive name search
//! - Listing by category
//! - The product read and conditional stock decrement used inside a
//!   checkout unit (see [`crate::unit`])
//!
//! ## Stock Decrement
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  UPDATE products SET stock = stock - :q                                 │
//! │  WHERE id = :id AND stock >= :q                                         │
//! │       │                                                                 │
//! │       ├── 1 row  ──► done                                               │
//! │       └── 0 rows ──► re-read: row gone     → NotFound                   │
//! │                               row present  → InsufficientStock          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::{SqliteExecutor, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult, Entity};
use stockroom_core::validation::{
    validate_price_cents, validate_product_name, validate_search_query, validate_stock,
};
use stockroom_core::{Category, NewProduct, Product, ProductUpdate};

/// A product row joined with its category.
#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    #[sqlx(flatten)]
    product: Product,
    category_name: String,
    category_description: String,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        let mut product = row.product;
        product.category = Some(Category {
            id: product.category_id,
            name: row.category_name,
            description: row.category_description,
        });
        product
    }
}

/// `SELECT` of a product joined with its category, followed by `$tail`.
macro_rules! select_product {
    ($tail:literal) => {
        concat!(
            "SELECT p.id, p.name, p.price_cents, p.stock, p.category_id, ",
            "c.name AS category_name, c.description AS category_description ",
            "FROM products p INNER JOIN categories c ON c.id = p.category_id ",
            $tail
        )
    };
}

/// Reads one product with its category on any executor (pool or open unit).
pub(crate) async fn fetch_product<'e, E>(executor: E, id: i64) -> DbResult<Option<Product>>
where
    E: SqliteExecutor<'e>,
{
    let row = sqlx::query_as::<_, ProductRow>(select_product!("WHERE p.id = ?1"))
        .bind(id)
        .fetch_optional(executor)
        .await?;

    Ok(row.map(Product::from))
}

/// Takes `amount` off the stock only if that many are on hand.
///
/// ## Returns
/// `true` when the row was updated, `false` when the condition matched
/// nothing (missing row or not enough stock).
pub(crate) async fn try_decrement_stock<'e, E>(executor: E, id: i64, amount: i64) -> DbResult<bool>
where
    E: SqliteExecutor<'e>,
{
    let result =
        sqlx::query("UPDATE products SET stock = stock - ?2 WHERE id = ?1 AND stock >= ?2")
            .bind(id)
            .bind(amount)
            .execute(executor)
            .await?;

    Ok(result.rows_affected() == 1)
}

/// Escapes LIKE wildcards so a fragment matches literally.
fn like_pattern(fragment: &str) -> String {
    let escaped = fragment
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = ProductRepository::new(pool);
///
/// // Search products
/// let results = repo.search_by_name("kopi").await?;
///
/// // Get by ID
/// let product = repo.get(42).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Lists all products with their categories, ordered by id.
    pub async fn list(&self) -> DbResult<Vec<Product>> {
        let rows = sqlx::query_as::<_, ProductRow>(select_product!("ORDER BY p.id"))
            .fetch_all(&self.pool)
            .await?;

        debug!(count = rows.len(), "Listed products");
        Ok(rows.into_iter().map(Product::from).collect())
    }

    /// Case-insensitive substring search on the product name.
    ///
    /// An empty fragment lists everything.
    pub async fn search_by_name(&self, fragment: &str) -> DbResult<Vec<Product>> {
        let Some(fragment) = validate_search_query(fragment)? else {
            return self.list().await;
        };

        debug!(query = %fragment, "Searching products");

        // LIKE is case-insensitive for ASCII in SQLite
        let rows = sqlx::query_as::<_, ProductRow>(select_product!(
            "WHERE p.name LIKE ?1 ESCAPE '\\' ORDER BY p.id"
        ))
        .bind(like_pattern(&fragment))
        .fetch_all(&self.pool)
        .await?;

        debug!(count = rows.len(), "Search returned products");
        Ok(rows.into_iter().map(Product::from).collect())
    }

    /// Lists the products of one category.
    ///
    /// ## Errors
    /// `NotFound` when the category does not exist.
    pub async fn list_by_category(&self, category_id: i64) -> DbResult<Vec<Product>> {
        self.ensure_category(category_id).await?;

        let rows = sqlx::query_as::<_, ProductRow>(select_product!(
            "WHERE p.category_id = ?1 ORDER BY p.id"
        ))
        .bind(category_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    /// Gets a product by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found (with category)
    /// * `Ok(None)` - Product not found
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Product>> {
        fetch_product(&self.pool, id).await
    }

    /// Gets a product by its ID, failing with NotFound.
    pub async fn get(&self, id: i64) -> DbResult<Product> {
        self.get_by_id(id)
            .await?
            .ok_or(DbError::not_found(Entity::Product, id))
    }

    async fn ensure_category(&self, category_id: i64) -> DbResult<()> {
        let found: Option<i64> = sqlx::query_scalar("SELECT id FROM categories WHERE id = ?1")
            .bind(category_id)
            .fetch_optional(&self.pool)
            .await?;

        match found {
            Some(_) => Ok(()),
            None => Err(DbError::not_found(Entity::Category, category_id)),
        }
    }

    /// Creates a product.
    ///
    /// ## Errors
    /// - `Validation` for a bad name, negative price or negative stock
    /// - `NotFound` when the category does not exist
    pub async fn create(&self, new: &NewProduct) -> DbResult<Product> {
        let name = validate_product_name(&new.name)?;
        validate_price_cents(new.price_cents)?;
        validate_stock(new.stock)?;
        self.ensure_category(new.category_id).await?;

        debug!(name = %name, category_id = new.category_id, "Creating product");

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO products (name, price_cents, stock, category_id)
            VALUES (?1, ?2, ?3, ?4)
            RETURNING id
            "#,
        )
        .bind(&name)
        .bind(new.price_cents)
        .bind(new.stock)
        .bind(new.category_id)
        .fetch_one(&self.pool)
        .await?;

        self.get(id).await
    }

    /// Applies a partial update.
    ///
    /// Only the supplied fields are written, each in place, so a concurrent
    /// checkout's stock decrement is never overwritten by a price or name
    /// change. A blank name keeps the current one.
    pub async fn update(&self, id: i64, update: &ProductUpdate) -> DbResult<Product> {
        let name = update
            .name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .map(validate_product_name)
            .transpose()?;
        if let Some(price_cents) = update.price_cents {
            validate_price_cents(price_cents)?;
        }
        if let Some(stock) = update.stock {
            validate_stock(stock)?;
        }
        if let Some(category_id) = update.category_id {
            self.ensure_category(category_id).await?;
        }

        debug!(id, ?update, "Updating product");

        let result = sqlx::query(
            r#"
            UPDATE products
            SET name        = COALESCE(?2, name),
                price_cents = COALESCE(?3, price_cents),
                stock       = COALESCE(?4, stock),
                category_id = COALESCE(?5, category_id)
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(update.price_cents)
        .bind(update.stock)
        .bind(update.category_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found(Entity::Product, id));
        }

        self.get(id).await
    }

    /// Deletes a product.
    ///
    /// ## Errors
    /// - `NotFound` when the id does not exist
    /// - `InUse` while transaction details reference it
    pub async fn delete(&self, id: i64) -> DbResult<()> {
        self.get(id).await?;

        let sold: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM transaction_details WHERE product_id = ?1")
                .bind(id)
                .fetch_one(&self.pool)
                .await?;
        if sold > 0 {
            return Err(DbError::InUse {
                entity: Entity::Product,
                id,
                referenced_by: "transaction details",
            });
        }

        debug!(id, "Deleting product");

        sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Counts all products.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use stockroom_core::NewCategory;

    async fn setup() -> (Database, Category) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let category = db
            .categories()
            .create(&NewCategory {
                name: "Drinks".into(),
                description: String::new(),
            })
            .await
            .unwrap();
        (db, category)
    }

    fn new_product(name: &str, category_id: i64) -> NewProduct {
        NewProduct {
            name: name.to_string(),
            price_cents: 1000,
            stock: 5,
            category_id,
        }
    }

    #[tokio::test]
    async fn test_create_loads_category() {
        let (db, cat) = setup().await;
        let p = db.products().create(&new_product("Kopi Susu", cat.id)).await.unwrap();

        assert_eq!(p.name, "Kopi Susu");
        assert_eq!(p.price_cents, 1000);
        assert_eq!(p.category.as_ref().map(|c| c.name.as_str()), Some("Drinks"));
        assert_eq!(db.products().count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_create_rules() {
        let (db, cat) = setup().await;

        let mut bad = new_product("Kopi", cat.id);
        bad.price_cents = -1;
        assert!(matches!(
            db.products().create(&bad).await,
            Err(DbError::Validation(_))
        ));

        let mut bad = new_product("Kopi", cat.id);
        bad.stock = -1;
        assert!(matches!(
            db.products().create(&bad).await,
            Err(DbError::Validation(_))
        ));

        assert!(matches!(
            db.products().create(&new_product("", cat.id)).await,
            Err(DbError::Validation(_))
        ));
        assert!(matches!(
            db.products().create(&new_product("Kopi", 999)).await,
            Err(DbError::NotFound {
                entity: Entity::Category,
                id: 999
            })
        ));
    }

    #[tokio::test]
    async fn test_search_is_case_insensitive_and_literal() {
        let (db, cat) = setup().await;
        db.products().create(&new_product("Kopi Susu", cat.id)).await.unwrap();
        db.products().create(&new_product("Teh Manis", cat.id)).await.unwrap();
        db.products().create(&new_product("100% Jus", cat.id)).await.unwrap();

        let found = db.products().search_by_name("kopi").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Kopi Susu");

        let found = db.products().search_by_name("%").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "100% Jus");

        assert_eq!(db.products().search_by_name("  ").await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_list_by_category() {
        let (db, cat) = setup().await;
        let snacks = db
            .categories()
            .create(&NewCategory {
                name: "Snacks".into(),
                description: String::new(),
            })
            .await
            .unwrap();
        db.products().create(&new_product("Kopi", cat.id)).await.unwrap();
        db.products().create(&new_product("Chips", snacks.id)).await.unwrap();

        let drinks = db.products().list_by_category(cat.id).await.unwrap();
        assert_eq!(drinks.len(), 1);
        assert_eq!(drinks[0].name, "Kopi");

        assert!(matches!(
            db.products().list_by_category(999).await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_partial_update() {
        let (db, cat) = setup().await;
        let p = db.products().create(&new_product("Kopi", cat.id)).await.unwrap();

        let updated = db
            .products()
            .update(
                p.id,
                &ProductUpdate {
                    price_cents: Some(1250),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.price_cents, 1250);
        assert_eq!(updated.name, "Kopi");
        assert_eq!(updated.stock, 5);

        assert!(matches!(
            db.products()
                .update(
                    p.id,
                    &ProductUpdate {
                        stock: Some(-3),
                        ..Default::default()
                    }
                )
                .await,
            Err(DbError::Validation(_))
        ));
        assert!(matches!(
            db.products()
                .update(
                    p.id,
                    &ProductUpdate {
                        category_id: Some(999),
                        ..Default::default()
                    }
                )
                .await,
            Err(DbError::NotFound { .. })
        ));
        assert!(matches!(
            db.products().update(999, &ProductUpdate::default()).await,
            Err(DbError::NotFound {
                entity: Entity::Product,
                id: 999
            })
        ));
    }

    #[tokio::test]
    async fn test_conditional_decrement() {
        let (db, cat) = setup().await;
        let p = db.products().create(&new_product("Kopi", cat.id)).await.unwrap();

        assert!(try_decrement_stock(db.pool(), p.id, 5).await.unwrap());
        assert!(!try_decrement_stock(db.pool(), p.id, 1).await.unwrap());
        assert!(!try_decrement_stock(db.pool(), 999, 1).await.unwrap());
        assert_eq!(db.products().get(p.id).await.unwrap().stock, 0);
    }

    #[test]
    fn test_like_pattern() {
        assert_eq!(like_pattern("kopi"), "%kopi%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
    }
}
