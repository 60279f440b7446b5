//! # Product Repository
//!
//! The product catalog: one menu per user.
//!
//! ## Key Operations
//! - CRUD scoped by owner (`user_id`)
//! - Soft delete (rows are never removed; past line items still point here)
//! - Partial update through a fixed statement
//!
//! ## Ownership and Visibility
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Who Sees Which Product                               │
//! │                                                                         │
//! │                     owner, active   owner, inactive   other user       │
//! │  get / update          ✅               NotFound        NotFound       │
//! │  soft_delete           ✅               NotFound        NotFound       │
//! │  list(active_only)     ✅               hidden          hidden         │
//! │  list(all)             ✅               ✅              hidden         │
//! │                                                                         │
//! │  Cross-user access never reveals that the row exists.                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Partial Updates Without Dynamic SQL
//! ```text
//! UPDATE products SET name = COALESCE(?1, name), ... WHERE id = ?6 ...
//!
//! Some(value) → bound → replaces the column
//! None        → NULL  → COALESCE keeps the current value
//!
//! description is nullable, so it carries its own "present" flag (?9):
//! a blank description in the patch clears the column.
//! ```

use chrono::Utc;
use kopi_core::validation::{validate_new_product, validate_product_patch};
use kopi_core::{CoreError, NewProduct, Product, ProductPatch};
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::DbResult;

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.products();
///
/// let latte = repo.create(user_id, &new_product).await?;
/// let menu = repo.list(user_id, true).await?;
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

    /// Adds a product to the user's menu.
    ///
    /// ## Errors
    /// * `DbError::Validation` - name, description, price or stock rejected
    pub async fn create(&self, user_id: i64, input: &NewProduct) -> DbResult<Product> {
        let draft = validate_new_product(input)?;

        debug!(user_id, name = %draft.name, "Inserting product");

        let now = Utc::now();

        let product = sqlx::query_as::<_, Product>(
            r#"
            INSERT INTO products (
                user_id, name, description, category,
                price_cents, stock, is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1, ?7, ?7)
            RETURNING
                id, user_id, name, description, category,
                price_cents, stock, is_active, created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(&draft.name)
        .bind(&draft.description)
        .bind(draft.category)
        .bind(draft.price.cents())
        .bind(draft.stock)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        info!(user_id, product_id = product.id, "Product created");
        Ok(product)
    }

    /// Gets an active product owned by `user_id`.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - missing, inactive, or owned by someone else
    pub async fn get(&self, id: i64, user_id: i64) -> DbResult<Product> {
        sqlx::query_as::<_, Product>(
            r#"
            SELECT
                id, user_id, name, description, category,
                price_cents, stock, is_active, created_at, updated_at
            FROM products
            WHERE id = ?1 AND user_id = ?2 AND is_active = 1
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| CoreError::ProductNotFound(id).into())
    }

    /// Lists the user's products, newest first.
    ///
    /// With `active_only = false` soft-deleted products are included.
    pub async fn list(&self, user_id: i64, active_only: bool) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT
                id, user_id, name, description, category,
                price_cents, stock, is_active, created_at, updated_at
            FROM products
            WHERE user_id = ?1 AND (is_active = 1 OR ?2 = 0)
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(user_id)
        .bind(active_only)
        .fetch_all(&self.pool)
        .await?;

        debug!(user_id, active_only, count = products.len(), "Listed products");
        Ok(products)
    }

    /// Applies a partial update and returns the updated product.
    ///
    /// Past line items keep their own price snapshot, so a price change
    /// here never alters committed totals.
    ///
    /// ## Errors
    /// * `DbError::Validation` - empty patch or a rejected field
    /// * `DbError::NotFound` - missing, inactive, or owned by someone else
    pub async fn update(&self, id: i64, user_id: i64, patch: &ProductPatch) -> DbResult<Product> {
        let changes = validate_product_patch(patch)?;

        debug!(user_id, product_id = id, "Updating product");

        let product = sqlx::query_as::<_, Product>(
            r#"
            UPDATE products SET
                name        = COALESCE(?1, name),
                description = CASE WHEN ?9 THEN ?2 ELSE description END,
                category    = COALESCE(?3, category),
                price_cents = COALESCE(?4, price_cents),
                stock       = COALESCE(?5, stock),
                updated_at  = ?6
            WHERE id = ?7 AND user_id = ?8 AND is_active = 1
            RETURNING
                id, user_id, name, description, category,
                price_cents, stock, is_active, created_at, updated_at
            "#,
        )
        .bind(&changes.name)
        .bind(changes.description.clone().flatten())
        .bind(changes.category)
        .bind(changes.price.map(|p| p.cents()))
        .bind(changes.stock)
        .bind(Utc::now())
        .bind(id)
        .bind(user_id)
        .bind(changes.description.is_some())
        .fetch_optional(&self.pool)
        .await?
        .ok_or(CoreError::ProductNotFound(id))?;

        info!(user_id, product_id = id, "Product updated");
        Ok(product)
    }

    /// Soft-deletes a product by setting is_active = 0.
    ///
    /// ## Why Soft Delete?
    /// - Historical line items still reference this product
    /// - Reports keep showing its name
    pub async fn soft_delete(&self, id: i64, user_id: i64) -> DbResult<()> {
        debug!(user_id, product_id = id, "Soft-deleting product");

        let result = sqlx::query(
            r#"
            UPDATE products
            SET is_active = 0, updated_at = ?1
            WHERE id = ?2 AND user_id = ?3 AND is_active = 1
            "#,
        )
        .bind(Utc::now())
        .bind(id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::ProductNotFound(id).into());
        }

        info!(user_id, product_id = id, "Product deactivated");
        Ok(())
    }

    /// Counts the user's active products.
    pub async fn count(&self, user_id: i64) -> DbResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE user_id = ?1 AND is_active = 1")
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use kopi_core::{ErrorKind, Money, ProductCategory};

    async fn setup() -> ProductRepository {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.products()
    }

    fn latte() -> NewProduct {
        NewProduct {
            name: "Kopi Susu".to_string(),
            description: Some("Espresso, milk, palm sugar".to_string()),
            category: ProductCategory::Coffee,
            price: 25000.0,
            stock: 10,
        }
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let repo = setup().await;

        let created = repo.create(1, &latte()).await.unwrap();
        assert_eq!(created.price(), Money::from_cents(2_500_000));
        assert_eq!(created.stock, 10);
        assert!(created.is_active);

        let fetched = repo.get(created.id, 1).await.unwrap();
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn test_create_rejects_bad_input() {
        let repo = setup().await;

        let free = NewProduct {
            price: 0.0,
            ..latte()
        };
        let err = repo.create(1, &free).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(repo.count(1).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_cross_user_access_is_not_found() {
        let repo = setup().await;
        let product = repo.create(1, &latte()).await.unwrap();

        let err = repo.get(product.id, 2).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let patch = ProductPatch {
            stock: Some(99),
            ..Default::default()
        };
        assert_eq!(
            repo.update(product.id, 2, &patch).await.unwrap_err().kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            repo.soft_delete(product.id, 2).await.unwrap_err().kind(),
            ErrorKind::NotFound
        );

        // untouched
        assert_eq!(repo.get(product.id, 1).await.unwrap().stock, 10);
    }

    #[tokio::test]
    async fn test_update_only_present_fields() {
        let repo = setup().await;
        let product = repo.create(1, &latte()).await.unwrap();

        let patch = ProductPatch {
            price: Some(27000.0),
            ..Default::default()
        };
        let updated = repo.update(product.id, 1, &patch).await.unwrap();

        assert_eq!(updated.price_cents, 2_700_000);
        assert_eq!(updated.name, "Kopi Susu");
        assert_eq!(updated.description, product.description);
        assert_eq!(updated.stock, 10);
        assert!(updated.updated_at >= product.updated_at);
    }

    #[tokio::test]
    async fn test_blank_description_clears_it() {
        let repo = setup().await;
        let product = repo.create(1, &latte()).await.unwrap();

        let rename = ProductPatch {
            name: Some("Kopi Susu Gula Aren".to_string()),
            ..Default::default()
        };
        let renamed = repo.update(product.id, 1, &rename).await.unwrap();
        assert_eq!(renamed.description, product.description);

        let clear = ProductPatch {
            description: Some("   ".to_string()),
            ..Default::default()
        };
        let cleared = repo.update(product.id, 1, &clear).await.unwrap();
        assert_eq!(cleared.description, None);
        assert_eq!(cleared.name, "Kopi Susu Gula Aren");
    }

    #[tokio::test]
    async fn test_empty_patch_is_validation_error() {
        let repo = setup().await;
        let product = repo.create(1, &latte()).await.unwrap();

        let err = repo
            .update(product.id, 1, &ProductPatch::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_soft_delete_hides_product() {
        let repo = setup().await;
        let product = repo.create(1, &latte()).await.unwrap();

        repo.soft_delete(product.id, 1).await.unwrap();

        assert_eq!(
            repo.get(product.id, 1).await.unwrap_err().kind(),
            ErrorKind::NotFound
        );
        assert!(repo.list(1, true).await.unwrap().is_empty());

        let all = repo.list(1, false).await.unwrap();
        assert_eq!(all.len(), 1);
        assert!(!all[0].is_active);

        // second delete sees nothing active
        assert!(repo.soft_delete(product.id, 1).await.is_err());
    }

    #[tokio::test]
    async fn test_list_newest_first_per_user() {
        let repo = setup().await;
        let first = repo.create(1, &latte()).await.unwrap();
        let second = repo
            .create(
                1,
                &NewProduct {
                    name: "Croissant".to_string(),
                    category: ProductCategory::Food,
                    ..latte()
                },
            )
            .await
            .unwrap();
        repo.create(2, &latte()).await.unwrap();

        let ids: Vec<i64> = repo.list(1, true).await.unwrap().iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);
        assert_eq!(repo.count(1).await.unwrap(), 2);
    }
}
