//! # Sales Order Repository
//!
//! Database operations for sales orders, order items and inventory
//! adjustments.
//!
//! ## Order Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Order Lifecycle                                   │
//! │                                                                         │
//! │  create_sale(NewSale)            (one transaction)                     │
//! │     ├── lock every product, check stock                                │
//! │     ├── insert_order()  → SalesOrder { order_code: ORD-XXXXXXXX }      │
//! │     └── per line:                                                       │
//! │           ├── insert_item()        (unit price snapshot)               │
//! │           ├── insert_adjustment()  (-quantity, "Sale")                 │
//! │           └── decrement_stock()                                        │
//! │                                                                         │
//! │  Order replacements reuse the same primitives from the                 │
//! │  replacement repository, with reason "Replacement Order".              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Snapshot Pattern
//! Unit prices are copied onto the order item. This preserves the order
//! history even if the product price changes later.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use crate::repository::product::{decrement_stock, lock_product_with_stock, LockedProduct};
use stockwise_core::order_code::generate_order_code;
use stockwise_core::replacement::validate_order_lines;
use stockwise_core::validation::validate_cents;
use stockwise_core::{
    CoreError, InventoryAdjustment, Money, NewSale, OrderItem, SalesOrder, SalesOrderDetail,
    ValidationError, SALE_ADJUSTMENT_REASON,
};

/// Attempts at finding an unused order code before giving up.
pub const MAX_ORDER_CODE_ATTEMPTS: usize = 3;

const ORDER_COLUMNS: &str = r#"
    order_id, order_code, user_id, payment_method_id,
    amount_given_cents, change_cents, total_price_cents,
    discount_percentage, discounted_total_cents, created_at
"#;

const ITEM_COLUMNS: &str =
    "order_item_id, order_id, product_id, quantity, unit_price_cents, total_price_cents";

const ADJUSTMENT_COLUMNS: &str =
    "adjustment_id, product_id, quantity_changed, reason, adjusted_by, created_at";

/// Header fields of a new sales order.
#[derive(Debug, Clone)]
pub(crate) struct OrderHeader {
    pub user_id: i64,
    pub payment_method_id: Option<i64>,
    pub amount_given_cents: i64,
    pub change_cents: i64,
    pub total_price_cents: i64,
    pub discount_percentage: Option<i64>,
    pub discounted_total_cents: Option<i64>,
}

/// Repository for sales order database operations.
#[derive(Debug, Clone)]
pub struct SalesOrderRepository {
    pool: SqlitePool,
}

impl SalesOrderRepository {
    /// Creates a new SalesOrderRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SalesOrderRepository { pool }
    }

    /// Gets an order and its items by ID.
    pub async fn get_by_id(&self, order_id: i64) -> DbResult<Option<SalesOrderDetail>> {
        let sql = format!("SELECT {} FROM sales_orders WHERE order_id = ?1", ORDER_COLUMNS);
        let order = sqlx::query_as::<_, SalesOrder>(&sql)
            .bind(order_id)
            .fetch_optional(&self.pool)
            .await?;

        self.with_items(order).await
    }

    /// Gets an order and its items by its `ORD-XXXXXXXX` code.
    pub async fn get_by_code(&self, order_code: &str) -> DbResult<Option<SalesOrderDetail>> {
        let sql = format!("SELECT {} FROM sales_orders WHERE order_code = ?1", ORDER_COLUMNS);
        let order = sqlx::query_as::<_, SalesOrder>(&sql)
            .bind(order_code.trim().to_ascii_uppercase())
            .fetch_optional(&self.pool)
            .await?;

        self.with_items(order).await
    }

    /// Most recent orders first (headers only).
    pub async fn list_recent(&self, limit: u32) -> DbResult<Vec<SalesOrder>> {
        let sql = format!(
            "SELECT {} FROM sales_orders ORDER BY created_at DESC, order_id DESC LIMIT ?1",
            ORDER_COLUMNS
        );
        let orders = sqlx::query_as::<_, SalesOrder>(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(orders)
    }

    /// Gets all items for an order.
    pub async fn get_items(&self, order_id: i64) -> DbResult<Vec<OrderItem>> {
        let mut conn = self.pool.acquire().await?;
        fetch_items(&mut conn, order_id).await
    }

    /// Stock movements of a product, newest first.
    pub async fn adjustments_for_product(
        &self,
        product_id: i64,
    ) -> DbResult<Vec<InventoryAdjustment>> {
        let sql = format!(
            "SELECT {} FROM inventory_adjustments WHERE product_id = ?1 \
             ORDER BY created_at DESC, adjustment_id DESC",
            ADJUSTMENT_COLUMNS
        );
        let adjustments = sqlx::query_as::<_, InventoryAdjustment>(&sql)
            .bind(product_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(adjustments)
    }

    /// Rings up a regular sale.
    ///
    /// ## What This Does
    /// 1. Locks every product and checks its stock
    /// 2. Prices each line from the product row
    /// 3. Inserts the order, items and adjustments, decrements stock
    ///
    /// All-or-nothing: a failure on any line leaves every table unchanged.
    ///
    /// ## Errors
    /// * `ProductNotFound` / `InsufficientStock` - A line can't be filled
    /// * `Validation` - Bad lines, or `amount_given` below the total
    pub async fn create_sale(&self, sale: &NewSale) -> DbResult<SalesOrderDetail> {
        validate_order_lines(&sale.lines)?;
        validate_cents("amount_given", sale.amount_given_cents)?;

        let mut tx = self.pool.begin().await?;

        let mut priced: Vec<(LockedProduct, i64)> = Vec::with_capacity(sale.lines.len());
        for line in &sale.lines {
            let locked = lock_product_with_stock(&mut tx, line.product_id, line.quantity).await?;
            priced.push((locked, line.quantity));
        }

        let mut total = Money::zero();
        for (product, quantity) in &priced {
            total += line_total(product, *quantity)?;
        }

        let amount_given = Money::from_cents(sale.amount_given_cents);
        if amount_given < total {
            return Err(ValidationError::Mismatch {
                field: "amount_given".to_string(),
                reason: format!("{} is less than the total of {}", amount_given, total),
            }
            .into());
        }

        let header = OrderHeader {
            user_id: sale.user_id,
            payment_method_id: sale.payment_method_id,
            amount_given_cents: amount_given.cents(),
            change_cents: (amount_given - total).cents(),
            total_price_cents: total.cents(),
            discount_percentage: None,
            discounted_total_cents: None,
        };
        let order = insert_order(&mut tx, &header, generate_order_code).await?;

        let mut items = Vec::with_capacity(priced.len());
        for (product, quantity) in &priced {
            items.push(
                fulfil_line(&mut tx, &order, product, *quantity, SALE_ADJUSTMENT_REASON, sale.user_id)
                    .await?,
            );
        }

        tx.commit().await?;

        info!(
            order_id = %order.order_id,
            order_code = %order.order_code,
            total = %total,
            lines = items.len(),
            "Sale recorded"
        );

        Ok(SalesOrderDetail { order, items })
    }

    async fn with_items(&self, order: Option<SalesOrder>) -> DbResult<Option<SalesOrderDetail>> {
        match order {
            Some(order) => {
                let items = self.get_items(order.order_id).await?;
                Ok(Some(SalesOrderDetail { order, items }))
            }
            None => Ok(None),
        }
    }
}

// =============================================================================
// Transaction Primitives
// =============================================================================

pub(crate) fn line_total(product: &LockedProduct, quantity: i64) -> DbResult<Money> {
    Money::from_cents(product.unit_price_cents)
        .checked_mul(quantity)
        .ok_or_else(|| {
            ValidationError::OutOfRange {
                field: "line total".to_string(),
                min: 0,
                max: i64::MAX,
            }
            .into()
        })
}

/// Inserts a sales order under a fresh order code.
///
/// ## Code Collisions
/// The UNIQUE index on `order_code` rejects a duplicate without aborting the
/// transaction, so a colliding code is simply retried with a new one, up to
/// [`MAX_ORDER_CODE_ATTEMPTS`] times.
pub(crate) async fn insert_order(
    conn: &mut SqliteConnection,
    header: &OrderHeader,
    mut next_code: impl FnMut() -> String,
) -> DbResult<SalesOrder> {
    let sql = format!(
        r#"
        INSERT INTO sales_orders (
            order_code, user_id, payment_method_id,
            amount_given_cents, change_cents, total_price_cents,
            discount_percentage, discounted_total_cents, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        RETURNING {}
        "#,
        ORDER_COLUMNS
    );

    let mut last_err = None;
    for attempt in 1..=MAX_ORDER_CODE_ATTEMPTS {
        let code = next_code();
        debug!(order_code = %code, attempt, "Inserting sales order");

        let inserted = sqlx::query_as::<_, SalesOrder>(&sql)
            .bind(&code)
            .bind(header.user_id)
            .bind(header.payment_method_id)
            .bind(header.amount_given_cents)
            .bind(header.change_cents)
            .bind(header.total_price_cents)
            .bind(header.discount_percentage)
            .bind(header.discounted_total_cents)
            .bind(Utc::now())
            .fetch_one(&mut *conn)
            .await
            .map_err(DbError::from);

        match inserted {
            Ok(order) => return Ok(order),
            Err(err) if err.is_unique_violation_on("sales_orders.order_code") => {
                warn!(order_code = %code, attempt, "Order code collision, retrying");
                last_err = Some(err);
            }
            Err(err) => return Err(err),
        }
    }

    Err(last_err.unwrap_or_else(|| {
        DbError::Internal("order code generation made no attempts".to_string())
    }))
}

/// Inserts an order item priced from the locked product row.
pub(crate) async fn insert_item(
    conn: &mut SqliteConnection,
    order_id: i64,
    product: &LockedProduct,
    quantity: i64,
) -> DbResult<OrderItem> {
    let total = line_total(product, quantity)?;

    let sql = format!(
        r#"
        INSERT INTO order_items (order_id, product_id, quantity, unit_price_cents, total_price_cents)
        VALUES (?1, ?2, ?3, ?4, ?5)
        RETURNING {}
        "#,
        ITEM_COLUMNS
    );

    let item = sqlx::query_as::<_, OrderItem>(&sql)
        .bind(order_id)
        .bind(product.product_id)
        .bind(quantity)
        .bind(product.unit_price_cents)
        .bind(total.cents())
        .fetch_one(conn)
        .await?;

    Ok(item)
}

/// Logs a signed stock change.
pub(crate) async fn insert_adjustment(
    conn: &mut SqliteConnection,
    product_id: i64,
    quantity_changed: i64,
    reason: &str,
    adjusted_by: i64,
) -> DbResult<InventoryAdjustment> {
    let sql = format!(
        r#"
        INSERT INTO inventory_adjustments (product_id, quantity_changed, reason, adjusted_by, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5)
        RETURNING {}
        "#,
        ADJUSTMENT_COLUMNS
    );

    let adjustment = sqlx::query_as::<_, InventoryAdjustment>(&sql)
        .bind(product_id)
        .bind(quantity_changed)
        .bind(reason)
        .bind(adjusted_by)
        .bind(Utc::now())
        .fetch_one(conn)
        .await?;

    Ok(adjustment)
}

/// Writes one order line: item, adjustment, then the guarded decrement.
pub(crate) async fn fulfil_line(
    conn: &mut SqliteConnection,
    order: &SalesOrder,
    product: &LockedProduct,
    quantity: i64,
    reason: &str,
    adjusted_by: i64,
) -> DbResult<OrderItem> {
    let item = insert_item(conn, order.order_id, product, quantity).await?;
    insert_adjustment(conn, product.product_id, -quantity, reason, adjusted_by).await?;
    decrement_stock(conn, product.product_id, quantity).await?;
    Ok(item)
}

pub(crate) async fn fetch_items(
    conn: &mut SqliteConnection,
    order_id: i64,
) -> DbResult<Vec<OrderItem>> {
    let sql = format!(
        "SELECT {} FROM order_items WHERE order_id = ?1 ORDER BY order_item_id",
        ITEM_COLUMNS
    );
    let items = sqlx::query_as::<_, OrderItem>(&sql)
        .bind(order_id)
        .fetch_all(conn)
        .await?;

    Ok(items)
}

/// Whether an order exists.
pub(crate) async fn order_exists(conn: &mut SqliteConnection, order_id: i64) -> DbResult<bool> {
    let found: Option<i64> =
        sqlx::query_scalar("SELECT order_id FROM sales_orders WHERE order_id = ?1")
            .bind(order_id)
            .fetch_optional(conn)
            .await?;

    Ok(found.is_some())
}

/// Fails with `OrderNotFound` / `ProductNotInOrder` unless `product_id` (when
/// given) was sold on order `order_id`.
pub(crate) async fn ensure_order_has_product(
    conn: &mut SqliteConnection,
    order_id: i64,
    product_id: Option<i64>,
) -> DbResult<()> {
    if !order_exists(conn, order_id).await? {
        return Err(CoreError::OrderNotFound(order_id).into());
    }

    let Some(product_id) = product_id else {
        return Ok(());
    };

    let lines: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM order_items WHERE order_id = ?1 AND product_id = ?2",
    )
    .bind(order_id)
    .bind(product_id)
    .fetch_one(conn)
    .await?;

    if lines == 0 {
        return Err(CoreError::ProductNotInOrder {
            product_id,
            order_id,
        }
        .into());
    }

    Ok(())
}
