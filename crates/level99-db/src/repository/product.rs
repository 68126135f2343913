//! # Product Repository
//!
//! Database operations for the game catalog.
//!
//! ## Key Operations
//! - Listing joined with the category (what the POS screen shows)
//! - CRUD operations
//!
//! ## Listing Join
//! ```text
//! products p LEFT JOIN categories c ON c.id = p.category_id
//!
//! ┌────┬────────────────┬───────┬─────────────┬───────────────┐
//! │ id │ name           │ price │ category_id │ category_name │
//! ├────┼────────────────┼───────┼─────────────┼───────────────┤
//! │  1 │ Chrono Trigger │  4999 │           2 │ RPG           │ ─► category: Some
//! │  2 │ Demo Disc      │     0 │        NULL │ NULL          │ ─► category: None
//! └────┴────────────────┴───────┴─────────────┴───────────────┘
//! ```

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use level99_core::{Category, Money, Product, ProductInput, ProductWithCategory};

const SELECT_WITH_CATEGORY: &str = r#"
    SELECT
        p.id,
        p.name,
        p.price_cents,
        p.category_id,
        c.name AS category_name
    FROM products p
    LEFT JOIN categories c ON c.id = p.category_id
"#;

/// Flat row of the listing join.
#[derive(Debug, sqlx::FromRow)]
struct ProductCategoryRow {
    id: i64,
    name: String,
    price_cents: Money,
    category_id: Option<i64>,
    category_name: Option<String>,
}

impl From<ProductCategoryRow> for ProductWithCategory {
    fn from(row: ProductCategoryRow) -> Self {
        let category = match (row.category_id, row.category_name) {
            (Some(id), Some(name)) => Some(Category { id, name }),
            _ => None,
        };

        ProductWithCategory {
            product: Product::new(row.id, row.name, row.price_cents, row.category_id),
            category,
        }
    }
}

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.products();
///
/// let listing = repo.list_with_category().await?;
/// let product = repo.get_by_id(7).await?;
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

    /// Lists every product with its category, in creation order.
    pub async fn list_with_category(&self) -> DbResult<Vec<ProductWithCategory>> {
        let sql = format!("{} ORDER BY p.id", SELECT_WITH_CATEGORY);
        let rows = sqlx::query_as::<_, ProductCategoryRow>(&sql)
            .fetch_all(&self.pool)
            .await?;

        debug!(count = rows.len(), "Listed products");
        Ok(rows.into_iter().map(ProductWithCategory::from).collect())
    }

    /// Gets one product with its category.
    pub async fn get_with_category(&self, id: i64) -> DbResult<Option<ProductWithCategory>> {
        let sql = format!("{} WHERE p.id = ?1", SELECT_WITH_CATEGORY);
        let row = sqlx::query_as::<_, ProductCategoryRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(ProductWithCategory::from))
    }

    /// Gets a product by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found
    /// * `Ok(None)` - Product not found
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            "SELECT id, name, price_cents, category_id FROM products WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Inserts a new product.
    ///
    /// `input` is expected to be validated already. A `category_id` that
    /// doesn't exist fails with `NotFound`.
    pub async fn insert(&self, input: &ProductInput) -> DbResult<Product> {
        debug!(name = %input.name, price = input.price.cents(), "Inserting product");

        sqlx::query_as::<_, Product>(
            r#"
            INSERT INTO products (name, price_cents, category_id)
            VALUES (?1, ?2, ?3)
            RETURNING id, name, price_cents, category_id
            "#,
        )
        .bind(&input.name)
        .bind(input.price)
        .bind(input.category_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| missing_category(e, input.category_id))
    }

    /// Replaces every editable field of a product.
    pub async fn update(&self, id: i64, input: &ProductInput) -> DbResult<Product> {
        debug!(id, name = %input.name, "Updating product");

        sqlx::query_as::<_, Product>(
            r#"
            UPDATE products
            SET name = ?1,
                price_cents = ?2,
                category_id = ?3,
                updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
            WHERE id = ?4
            RETURNING id, name, price_cents, category_id
            "#,
        )
        .bind(&input.name)
        .bind(input.price)
        .bind(input.category_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| missing_category(e, input.category_id))?
        .ok_or_else(|| DbError::not_found("Product", id))
    }

    /// Deletes a product.
    ///
    /// Carts hold their own snapshot, so an open cart keeps the line.
    pub async fn delete(&self, id: i64) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        debug!(id, "Deleted product");
        Ok(())
    }

    /// Counts products.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

/// Maps a foreign-key failure on write to "category not found".
fn missing_category(err: sqlx::Error, category_id: Option<i64>) -> DbError {
    match (DbError::from(err), category_id) {
        (DbError::ForeignKeyViolation { .. }, Some(id)) => DbError::not_found("Category", id),
        (other, _) => other,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};

    async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn input(name: &str, cents: i64, category_id: Option<i64>) -> ProductInput {
        ProductInput {
            name: name.to_string(),
            price: Money::from_cents(cents),
            category_id,
        }
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let db = db().await;
        let repo = db.products();

        let created = repo.insert(&input("Tetris", 999, None)).await.unwrap();
        assert!(created.id > 0);
        assert_eq!(created.price.cents(), 999);

        let fetched = repo.get_by_id(created.id).await.unwrap();
        assert_eq!(fetched, Some(created));
    }

    #[tokio::test]
    async fn test_list_with_category_join() {
        let db = db().await;
        let rpg = db.categories().insert("RPG").await.unwrap();
        let repo = db.products();
        repo.insert(&input("Chrono Trigger", 4999, Some(rpg.id)))
            .await
            .unwrap();
        repo.insert(&input("Demo Disc", 0, None)).await.unwrap();

        let listing = repo.list_with_category().await.unwrap();

        assert_eq!(listing.len(), 2);
        assert_eq!(listing[0].product.name, "Chrono Trigger");
        assert_eq!(listing[0].category, Some(rpg));
        assert_eq!(listing[1].product.name, "Demo Disc");
        assert_eq!(listing[1].category, None);
    }

    #[tokio::test]
    async fn test_insert_with_unknown_category() {
        let db = db().await;
        let err = db
            .products()
            .insert(&input("Ghost", 100, Some(77)))
            .await
            .unwrap_err();

        assert!(matches!(err, DbError::NotFound { ref entity, .. } if entity == "Category"));
        assert_eq!(db.products().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_update_replaces_fields() {
        let db = db().await;
        let action = db.categories().insert("Action").await.unwrap();
        let repo = db.products();
        let created = repo.insert(&input("Metroid", 2500, None)).await.unwrap();

        let updated = repo
            .update(created.id, &input("Super Metroid", 3000, Some(action.id)))
            .await
            .unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.name, "Super Metroid");
        assert_eq!(updated.price.cents(), 3000);
        assert_eq!(updated.category_id, Some(action.id));

        let listed = repo.get_with_category(created.id).await.unwrap().unwrap();
        assert_eq!(listed.category.map(|c| c.name), Some("Action".to_string()));
    }

    #[tokio::test]
    async fn test_update_missing_product() {
        let db = db().await;
        let err = db
            .products()
            .update(5, &input("Nope", 1, None))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_delete() {
        let db = db().await;
        let repo = db.products();
        let created = repo.insert(&input("Pong", 100, None)).await.unwrap();

        repo.delete(created.id).await.unwrap();
        assert_eq!(repo.get_by_id(created.id).await.unwrap(), None);

        let err = repo.delete(created.id).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_negative_price_rejected_by_schema() {
        let db = db().await;
        let err = db
            .products()
            .insert(&input("Broken", -1, None))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::ConstraintViolation(_)));
    }
}
