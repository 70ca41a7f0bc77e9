//! # Category Repository
//!
//! Database operations for categories.
//!
//! ## Rules
//! - Names are trimmed, required, at most 100 characters and unique
//! - A category cannot be deleted while products reference it

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult, Entity};
use stockroom_core::validation::validate_category_name;
use stockroom_core::{Category, CategoryUpdate, NewCategory};

/// Repository for category database operations.
#[derive(Debug, Clone)]
pub struct CategoryRepository {
    pool: SqlitePool,
}

impl CategoryRepository {
    /// Creates a new CategoryRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CategoryRepository { pool }
    }

    /// Lists all categories ordered by id.
    pub async fn list(&self) -> DbResult<Vec<Category>> {
        let categories = sqlx::query_as::<_, Category>(
            "SELECT id, name, description FROM categories ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        debug!(count = categories.len(), "Listed categories");
        Ok(categories)
    }

    /// Gets a category by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Category))` - Category found
    /// * `Ok(None)` - Category not found
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Category>> {
        let category = sqlx::query_as::<_, Category>(
            "SELECT id, name, description FROM categories WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(category)
    }

    /// Gets a category by its ID, failing with NotFound.
    pub async fn get(&self, id: i64) -> DbResult<Category> {
        self.get_by_id(id)
            .await?
            .ok_or(DbError::not_found(Entity::Category, id))
    }

    /// Checks whether a category with this ID exists.
    pub async fn exists(&self, id: i64) -> DbResult<bool> {
        let found: Option<i64> = sqlx::query_scalar("SELECT id FROM categories WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(found.is_some())
    }

    async fn name_taken(&self, name: &str, except_id: Option<i64>) -> DbResult<bool> {
        let found: Option<i64> = sqlx::query_scalar(
            "SELECT id FROM categories WHERE name = ?1 AND id != COALESCE(?2, -1)",
        )
        .bind(name)
        .bind(except_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(found.is_some())
    }

    /// Creates a category.
    ///
    /// ## Errors
    /// - `Validation` for an empty or too long name
    /// - `UniqueViolation` when the name is taken
    pub async fn create(&self, new: &NewCategory) -> DbResult<Category> {
        let name = validate_category_name(&new.name)?;

        if self.name_taken(&name, None).await? {
            return Err(DbError::duplicate("name", name));
        }

        debug!(name = %name, "Creating category");

        let id: i64 = sqlx::query_scalar(
            "INSERT INTO categories (name, description) VALUES (?1, ?2) RETURNING id",
        )
        .bind(&name)
        .bind(&new.description)
        .fetch_one(&self.pool)
        .await?;

        Ok(Category {
            id,
            name,
            description: new.description.clone(),
        })
    }

    /// Applies a partial update. Empty fields keep their current value.
    ///
    /// Only the supplied columns are written.
    pub async fn update(&self, id: i64, update: &CategoryUpdate) -> DbResult<Category> {
        let name = update
            .name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .map(validate_category_name)
            .transpose()?;
        if let Some(name) = &name {
            if self.name_taken(name, Some(id)).await? {
                return Err(DbError::duplicate("name", name.clone()));
            }
        }
        let description = update.description.as_deref().filter(|d| !d.is_empty());

        debug!(id, ?name, "Updating category");

        let result = sqlx::query(
            r#"
            UPDATE categories
            SET name        = COALESCE(?2, name),
                description = COALESCE(?3, description)
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(&name)
        .bind(description)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found(Entity::Category, id));
        }

        self.get(id).await
    }

    /// Deletes a category.
    ///
    /// ## Errors
    /// - `NotFound` when the id does not exist
    /// - `InUse` while products still belong to it
    pub async fn delete(&self, id: i64) -> DbResult<()> {
        if !self.exists(id).await? {
            return Err(DbError::not_found(Entity::Category, id));
        }

        let products: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE category_id = ?1")
                .bind(id)
                .fetch_one(&self.pool)
                .await?;
        if products > 0 {
            return Err(DbError::InUse {
                entity: Entity::Category,
                id,
                referenced_by: "products",
            });
        }

        debug!(id, "Deleting category");

        sqlx::query("DELETE FROM categories WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Counts all categories.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM categories")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use stockroom_core::NewProduct;

    async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn new_category(name: &str) -> NewCategory {
        NewCategory {
            name: name.to_string(),
            description: "desc".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let db = db().await;
        let created = db.categories().create(&new_category("  Drinks ")).await.unwrap();

        assert_eq!(created.name, "Drinks");
        assert_eq!(db.categories().get(created.id).await.unwrap(), created);
        assert_eq!(db.categories().list().await.unwrap(), vec![created]);
    }

    #[tokio::test]
    async fn test_name_rules() {
        let db = db().await;
        db.categories().create(&new_category("Drinks")).await.unwrap();

        assert!(matches!(
            db.categories().create(&new_category("Drinks")).await,
            Err(DbError::UniqueViolation { .. })
        ));
        assert!(matches!(
            db.categories().create(&new_category("  ")).await,
            Err(DbError::Validation(_))
        ));
        assert!(matches!(
            db.categories().create(&new_category(&"x".repeat(101))).await,
            Err(DbError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_partial_update() {
        let db = db().await;
        let c = db.categories().create(&new_category("Drinks")).await.unwrap();
        db.categories().create(&new_category("Snacks")).await.unwrap();

        let updated = db
            .categories()
            .update(
                c.id,
                &CategoryUpdate {
                    name: Some(String::new()),
                    description: Some("Cold ones".into()),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "Drinks");
        assert_eq!(updated.description, "Cold ones");

        let err = db
            .categories()
            .update(
                c.id,
                &CategoryUpdate {
                    name: Some("Snacks".into()),
                    description: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));

        assert!(matches!(
            db.categories().update(999, &CategoryUpdate::default()).await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_update_writes_only_supplied_columns() {
        let db = db().await;
        let c = db.categories().create(&new_category("Drinks")).await.unwrap();

        // Rename lands between our read and our description update
        let stale = db.categories().get(c.id).await.unwrap();
        db.categories()
            .update(
                c.id,
                &CategoryUpdate {
                    name: Some("Beverages".into()),
                    description: None,
                },
            )
            .await
            .unwrap();

        let updated = db
            .categories()
            .update(
                stale.id,
                &CategoryUpdate {
                    name: None,
                    description: Some("Hot and cold".into()),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "Beverages");
        assert_eq!(updated.description, "Hot and cold");
    }

    #[tokio::test]
    async fn test_delete_refused_while_products_exist() {
        let db = db().await;
        let c = db.categories().create(&new_category("Drinks")).await.unwrap();
        let p = db
            .products()
            .create(&NewProduct {
                name: "Kopi".into(),
                price_cents: 1000,
                stock: 1,
                category_id: c.id,
            })
            .await
            .unwrap();

        assert!(matches!(
            db.categories().delete(c.id).await,
            Err(DbError::InUse { .. })
        ));

        db.products().delete(p.id).await.unwrap();
        db.categories().delete(c.id).await.unwrap();
        assert!(db.categories().get_by_id(c.id).await.unwrap().is_none());
        assert!(matches!(
            db.categories().delete(c.id).await,
            Err(DbError::NotFound { .. })
        ));
    }
}
