//! # Product Repository
//!
//! Database operations for products.
//!
//! ## Key Operations
//! - CRUD operations
//! - Restocking (with an inventory adjustment)
//! - Stock primitives used inside the sale and replacement transactions
//!
//! ## Guarded Stock Updates
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Stock Update Strategy                                │
//! │                                                                         │
//! │  ❌ WRONG: check, then write                                           │
//! │     SELECT quantity_in_stock ...      (two requests both see 1)        │
//! │     UPDATE ... SET quantity_in_stock = quantity_in_stock - 1           │
//! │     → stock goes to -1                                                  │
//! │                                                                         │
//! │  ✅ CORRECT: lock, check, conditional write                            │
//! │     1. lock_product():  no-op UPDATE ... RETURNING                     │
//! │        → takes the SQLite write lock for the transaction               │
//! │     2. ensure_stock(available, requested)                              │
//! │     3. decrement_stock():                                              │
//! │        UPDATE ... SET quantity_in_stock = quantity_in_stock - ?1       │
//! │        WHERE product_id = ?2 AND quantity_in_stock >= ?1               │
//! │                                                                         │
//! │  The second request waits on busy_timeout, then sees stock 0.          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::sales_order::insert_adjustment;
use stockwise_core::replacement::ensure_stock;
use stockwise_core::validation::{validate_cents, validate_quantity, validate_required_text};
use stockwise_core::{CoreError, InventoryAdjustment, NewProduct, Product};

const PRODUCT_COLUMNS: &str = r#"
    product_id, name, description, category_id, brand_id, supplier_id,
    quantity_in_stock, unit_price_cents, cost_price_cents,
    size, color, status, created_at, updated_at
"#;

/// Reason recorded on restock adjustments.
pub const RESTOCK_REASON: &str = "Restock";

/// Stock and price of a product row locked inside a transaction.
#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct LockedProduct {
    pub product_id: i64,
    pub name: String,
    pub unit_price_cents: i64,
    pub quantity_in_stock: i64,
}

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = ProductRepository::new(pool);
///
/// let page = repo.list(50, 0).await?;
/// let product = repo.get(7).await?;
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

    /// Lists products ordered by name.
    pub async fn list(&self, limit: u32, offset: u32) -> DbResult<Vec<Product>> {
        debug!(limit = %limit, offset = %offset, "Listing products");

        let sql = format!(
            "SELECT {} FROM products ORDER BY name, product_id LIMIT ?1 OFFSET ?2",
            PRODUCT_COLUMNS
        );
        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        Ok(products)
    }

    /// Gets a product by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found
    /// * `Ok(None)` - Product not found
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Product>> {
        let sql = format!("SELECT {} FROM products WHERE product_id = ?1", PRODUCT_COLUMNS);
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Gets a product by its ID, failing with `ProductNotFound`.
    pub async fn get(&self, id: i64) -> DbResult<Product> {
        self.get_by_id(id)
            .await?
            .ok_or_else(|| CoreError::ProductNotFound(id).into())
    }

    /// Inserts a new product.
    ///
    /// ## Returns
    /// * `Ok(Product)` - Inserted product with generated id and timestamps
    /// * `Err(DbError::ForeignKeyViolation)` - Unknown category/brand/supplier
    pub async fn insert(&self, product: &NewProduct) -> DbResult<Product> {
        let name = validate_required_text("name", &product.name, 200)?;
        validate_cents("unit_price", product.unit_price_cents)?;
        validate_cents("cost_price", product.cost_price_cents)?;
        validate_cents("quantity_in_stock", product.quantity_in_stock)?;

        debug!(name = %name, "Inserting product");

        let now = Utc::now();
        let sql = format!(
            r#"
            INSERT INTO products (
                name, description, category_id, brand_id, supplier_id,
                quantity_in_stock, unit_price_cents, cost_price_cents,
                size, color, status, created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5,
                ?6, ?7, ?8,
                ?9, ?10, ?11, ?12, ?12
            )
            RETURNING {}
            "#,
            PRODUCT_COLUMNS
        );

        let inserted = sqlx::query_as::<_, Product>(&sql)
            .bind(&name)
            .bind(&product.description)
            .bind(product.category_id)
            .bind(product.brand_id)
            .bind(product.supplier_id)
            .bind(product.quantity_in_stock)
            .bind(product.unit_price_cents)
            .bind(product.cost_price_cents)
            .bind(&product.size)
            .bind(&product.color)
            .bind(product.status)
            .bind(now)
            .fetch_one(&self.pool)
            .await?;

        Ok(inserted)
    }

    /// Adds stock to a product and logs the adjustment.
    ///
    /// Both writes happen in one transaction.
    pub async fn restock(
        &self,
        product_id: i64,
        quantity: i64,
        adjusted_by: i64,
    ) -> DbResult<InventoryAdjustment> {
        validate_quantity(quantity)?;

        debug!(product_id = %product_id, quantity = %quantity, "Restocking product");

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE products
            SET quantity_in_stock = quantity_in_stock + ?1, updated_at = ?2
            WHERE product_id = ?3
            "#,
        )
        .bind(quantity)
        .bind(Utc::now())
        .bind(product_id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::ProductNotFound(product_id).into());
        }

        let adjustment =
            insert_adjustment(&mut *tx, product_id, quantity, RESTOCK_REASON, adjusted_by).await?;

        tx.commit().await?;
        Ok(adjustment)
    }

    /// Current stock of a product.
    pub async fn stock_of(&self, product_id: i64) -> DbResult<i64> {
        sqlx::query_scalar::<_, i64>("SELECT quantity_in_stock FROM products WHERE product_id = ?1")
            .bind(product_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| CoreError::ProductNotFound(product_id).into())
    }

    /// Counts total products (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Transaction Primitives
// =============================================================================

/// Locks a product row for the rest of the transaction.
///
/// SQLite has no `SELECT ... FOR UPDATE`. A no-op UPDATE makes the
/// transaction a writer, so concurrent writers queue behind it until commit.
///
/// ## Returns
/// * `Ok(None)` - Product does not exist
pub(crate) async fn lock_product(
    conn: &mut SqliteConnection,
    product_id: i64,
) -> DbResult<Option<LockedProduct>> {
    let locked = sqlx::query_as::<_, LockedProduct>(
        r#"
        UPDATE products
        SET quantity_in_stock = quantity_in_stock
        WHERE product_id = ?1
        RETURNING product_id, name, unit_price_cents, quantity_in_stock
        "#,
    )
    .bind(product_id)
    .fetch_optional(conn)
    .await?;

    Ok(locked)
}

/// Locks a product and checks it has `quantity` units.
pub(crate) async fn lock_product_with_stock(
    conn: &mut SqliteConnection,
    product_id: i64,
    quantity: i64,
) -> DbResult<LockedProduct> {
    let locked = lock_product(conn, product_id)
        .await?
        .ok_or(CoreError::ProductNotFound(product_id))?;

    ensure_stock(product_id, locked.quantity_in_stock, quantity)?;
    Ok(locked)
}

/// Takes `quantity` units out of stock, only if that many are on hand.
///
/// ## Returns
/// The remaining stock.
///
/// ## Errors
/// * `ProductNotFound` - No such product
/// * `InsufficientStock` - Fewer than `quantity` units on hand
pub(crate) async fn decrement_stock(
    conn: &mut SqliteConnection,
    product_id: i64,
    quantity: i64,
) -> DbResult<i64> {
    debug!(product_id = %product_id, quantity = %quantity, "Decrementing stock");

    let remaining: Option<i64> = sqlx::query_scalar(
        r#"
        UPDATE products
        SET quantity_in_stock = quantity_in_stock - ?1, updated_at = ?2
        WHERE product_id = ?3 AND quantity_in_stock >= ?1
        RETURNING quantity_in_stock
        "#,
    )
    .bind(quantity)
    .bind(Utc::now())
    .bind(product_id)
    .fetch_optional(&mut *conn)
    .await?;

    if let Some(remaining) = remaining {
        return Ok(remaining);
    }

    // Nothing updated: tell a missing product apart from a short one.
    let available: Option<i64> =
        sqlx::query_scalar("SELECT quantity_in_stock FROM products WHERE product_id = ?1")
            .bind(product_id)
            .fetch_optional(&mut *conn)
            .await?;

    Err(match available {
        None => DbError::from(CoreError::ProductNotFound(product_id)),
        Some(available) => DbError::from(CoreError::InsufficientStock {
            product_id,
            available,
            requested: quantity,
        }),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::fixtures::{seed_fixture, test_db};
    use stockwise_core::ProductStatus;

    #[tokio::test]
    async fn test_insert_and_get() {
        let db = test_db().await;
        let fx = seed_fixture(&db).await;

        let product = db
            .products()
            .insert(&NewProduct {
                name: "  Denim Jacket ".to_string(),
                description: None,
                category_id: fx.category_id,
                brand_id: fx.brand_id,
                supplier_id: None,
                quantity_in_stock: 4,
                unit_price_cents: 5_999,
                cost_price_cents: 3_000,
                size: Some("L".to_string()),
                color: Some("Blue".to_string()),
                status: ProductStatus::Available,
            })
            .await
            .unwrap();

        assert_eq!(product.name, "Denim Jacket");
        let fetched = db.products().get(product.product_id).await.unwrap();
        assert_eq!(fetched.quantity_in_stock, 4);
        assert_eq!(fetched.size.as_deref(), Some("L"));
        assert_eq!(fetched.status, ProductStatus::Available);
    }

    #[tokio::test]
    async fn test_get_missing_product() {
        let db = test_db().await;
        assert!(db.products().get_by_id(999).await.unwrap().is_none());

        let err = db.products().get(999).await.unwrap_err();
        assert_eq!(err.domain(), Some(&CoreError::ProductNotFound(999)));
    }

    #[tokio::test]
    async fn test_list_is_ordered_by_name() {
        let db = test_db().await;
        seed_fixture(&db).await;

        let products = db.products().list(10, 0).await.unwrap();
        let names: Vec<&str> = products.iter().map(|p| p.name.as_str()).collect();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
        assert_eq!(db.products().count().await.unwrap(), products.len() as i64);
    }

    #[tokio::test]
    async fn test_restock_logs_adjustment() {
        let db = test_db().await;
        let fx = seed_fixture(&db).await;

        let before = db.products().stock_of(fx.tee_id).await.unwrap();
        let adjustment = db.products().restock(fx.tee_id, 5, fx.admin_id).await.unwrap();

        assert_eq!(adjustment.quantity_changed, 5);
        assert_eq!(adjustment.reason, RESTOCK_REASON);
        assert_eq!(db.products().stock_of(fx.tee_id).await.unwrap(), before + 5);
    }

    #[tokio::test]
    async fn test_decrement_is_conditional() {
        let db = test_db().await;
        let fx = seed_fixture(&db).await;
        let stock = db.products().stock_of(fx.tee_id).await.unwrap();

        let mut conn = db.pool().acquire().await.unwrap();
        let err = decrement_stock(&mut conn, fx.tee_id, stock + 1)
            .await
            .unwrap_err();
        assert_eq!(
            err.domain(),
            Some(&CoreError::InsufficientStock {
                product_id: fx.tee_id,
                available: stock,
                requested: stock + 1,
            })
        );

        let remaining = decrement_stock(&mut conn, fx.tee_id, stock).await.unwrap();
        assert_eq!(remaining, 0);

        let err = decrement_stock(&mut conn, 4242, 1).await.unwrap_err();
        assert_eq!(err.domain(), Some(&CoreError::ProductNotFound(4242)));
    }
}
