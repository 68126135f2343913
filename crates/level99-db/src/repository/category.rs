//! # Category Repository
//!
//! Database operations for categories (game genres).
//!
//! ## Deletion Guard
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    delete(id)                                           │
//! │                                                                         │
//! │  BEGIN                                                                 │
//! │    │                                                                    │
//! │    ▼                                                                    │
//! │  SELECT COUNT(*) FROM products WHERE category_id = ?                   │
//! │    │                                                                    │
//! │    ├── > 0 ──► ROLLBACK, Err(CategoryInUse)      row kept              │
//! │    │                                                                    │
//! │    ▼                                                                    │
//! │  DELETE FROM categories WHERE id = ?                                   │
//! │    │                                                                    │
//! │    ├── 0 rows ──► ROLLBACK, Err(NotFound)                              │
//! │    ├── FK error ─► ROLLBACK, Err(CategoryInUse)  (product raced in)    │
//! │    ▼                                                                    │
//! │  COMMIT                                                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::SqlitePool;
use tracing::{debug, warn};

use crate::error::{DbError, DbResult};
use level99_core::Category;

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

    /// Lists every category in creation order.
    pub async fn list(&self) -> DbResult<Vec<Category>> {
        let categories =
            sqlx::query_as::<_, Category>("SELECT id, name FROM categories ORDER BY id")
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
        let category =
            sqlx::query_as::<_, Category>("SELECT id, name FROM categories WHERE id = ?1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(category)
    }

    /// Inserts a category and returns it with its assigned id.
    ///
    /// `name` is expected to be validated already.
    pub async fn insert(&self, name: &str) -> DbResult<Category> {
        debug!(name = %name, "Inserting category");

        let category = sqlx::query_as::<_, Category>(
            "INSERT INTO categories (name) VALUES (?1) RETURNING id, name",
        )
        .bind(name)
        .fetch_one(&self.pool)
        .await?;

        Ok(category)
    }

    /// Renames a category. The id never changes.
    pub async fn update_name(&self, id: i64, name: &str) -> DbResult<Category> {
        debug!(id, name = %name, "Renaming category");

        sqlx::query_as::<_, Category>(
            "UPDATE categories SET name = ?1 WHERE id = ?2 RETURNING id, name",
        )
        .bind(name)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("Category", id))
    }

    /// Number of products that reference the category.
    pub async fn product_count(&self, id: i64) -> DbResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE category_id = ?1")
                .bind(id)
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }

    /// Deletes a category only if no product references it.
    ///
    /// The check and the delete share one transaction, and the schema's
    /// `ON DELETE RESTRICT` catches a product inserted by another connection
    /// in between. Both paths report [`DbError::CategoryInUse`] and leave the
    /// row in place.
    pub async fn delete(&self, id: i64) -> DbResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let products: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE category_id = ?1")
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;

        if products > 0 {
            warn!(id, products, "Refusing to delete category in use");
            return Err(DbError::CategoryInUse { id, products });
        }

        let result = sqlx::query("DELETE FROM categories WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| match DbError::from(e) {
                DbError::ForeignKeyViolation { .. } => {
                    warn!(id, "Category gained a product during delete");
                    DbError::CategoryInUse { id, products: 1 }
                }
                other => other,
            })?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Category", id));
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        debug!(id, "Deleted category");
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use level99_core::{Money, ProductInput};

    async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_insert_and_list() {
        let db = db().await;
        let repo = db.categories();

        let rpg = repo.insert("RPG").await.unwrap();
        let action = repo.insert("Action").await.unwrap();

        assert!(rpg.id > 0);
        assert_ne!(rpg.id, action.id);

        let all = repo.list().await.unwrap();
        assert_eq!(all, vec![rpg.clone(), action]);
        assert_eq!(repo.get_by_id(rpg.id).await.unwrap(), Some(rpg));
    }

    #[tokio::test]
    async fn test_update_name_keeps_id() {
        let db = db().await;
        let repo = db.categories();
        let created = repo.insert("Platfromer").await.unwrap();

        let renamed = repo.update_name(created.id, "Platformer").await.unwrap();

        assert_eq!(renamed.id, created.id);
        assert_eq!(renamed.name, "Platformer");
    }

    #[tokio::test]
    async fn test_update_missing_category() {
        let db = db().await;
        let err = db.categories().update_name(999, "Nope").await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_delete_unused_category() {
        let db = db().await;
        let repo = db.categories();
        let puzzle = repo.insert("Puzzle").await.unwrap();

        repo.delete(puzzle.id).await.unwrap();

        assert_eq!(repo.get_by_id(puzzle.id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_delete_category_in_use_keeps_row() {
        let db = db().await;
        let repo = db.categories();
        let rpg = repo.insert("RPG").await.unwrap();
        db.products()
            .insert(&ProductInput {
                name: "Chrono Trigger".to_string(),
                price: Money::from_cents(4999),
                category_id: Some(rpg.id),
            })
            .await
            .unwrap();

        let err = repo.delete(rpg.id).await.unwrap_err();

        assert!(matches!(
            err,
            DbError::CategoryInUse { products: 1, .. }
        ));
        assert_eq!(repo.get_by_id(rpg.id).await.unwrap(), Some(rpg));
    }

    #[tokio::test]
    async fn test_delete_after_products_move_away() {
        let db = db().await;
        let repo = db.categories();
        let rpg = repo.insert("RPG").await.unwrap();
        let product = db
            .products()
            .insert(&ProductInput {
                name: "Chrono Trigger".to_string(),
                price: Money::from_cents(4999),
                category_id: Some(rpg.id),
            })
            .await
            .unwrap();

        db.products()
            .update(
                product.id,
                &ProductInput {
                    name: product.name.clone(),
                    price: product.price,
                    category_id: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(repo.product_count(rpg.id).await.unwrap(), 0);
        repo.delete(rpg.id).await.unwrap();
    }

    #[tokio::test]
    async fn test_delete_missing_category() {
        let db = db().await;
        let err = db.categories().delete(42).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_restrict_blocks_raw_delete() {
        let db = db().await;
        let rpg = db.categories().insert("RPG").await.unwrap();
        sqlx::query("INSERT INTO products (name, price_cents, category_id) VALUES ('FF6', 100, ?1)")
            .bind(rpg.id)
            .execute(db.pool())
            .await
            .unwrap();

        // Bypassing the count still cannot orphan the product.
        let err: DbError = sqlx::query("DELETE FROM categories WHERE id = ?1")
            .bind(rpg.id)
            .execute(db.pool())
            .await
            .unwrap_err()
            .into();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
    }

    #[tokio::test]
    async fn test_product_added_after_the_count_still_blocks_delete() {
        let db = db().await;
        let rpg = db.categories().insert("RPG").await.unwrap();

        // Lands a product between the in-use count and the DELETE.
        sqlx::query(
            "CREATE TRIGGER late_product BEFORE DELETE ON categories BEGIN \
             INSERT INTO products (name, price_cents, category_id) VALUES ('FF6', 100, OLD.id); \
             END",
        )
        .execute(db.pool())
        .await
        .unwrap();

        let err = db.categories().delete(rpg.id).await.unwrap_err();
        assert!(matches!(err, DbError::CategoryInUse { id, .. } if id == rpg.id));
        assert!(db.categories().get_by_id(rpg.id).await.unwrap().is_some());
    }
}
