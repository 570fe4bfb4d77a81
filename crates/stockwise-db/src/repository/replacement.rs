//! # Replacement Repository
//!
//! The two replacement workflows, the replacement list, and the rows behind
//! the monthly replacement report.
//!
//! ## Transaction Layout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  replace_product()                     replace_with_order()            │
//! │                                                                         │
//! │  validate (no I/O)                      validate (no I/O)              │
//! │  BEGIN                                  BEGIN                          │
//! │  ├── lock replacement product           ├── lock replacement product   │
//! │  │   stock >= quantity?                 │   stock >= quantity?         │
//! │  ├── original order exists?             ├── original order has the     │
//! │  │   original product on it?            │   original product?          │
//! │  ├── decrement stock (guarded)          ├── lock + check every line    │
//! │  └── INSERT replacements                ├── INSERT sales_orders        │
//! │  COMMIT                                 ├── per line: item,            │
//! │                                         │   adjustment, decrement      │
//! │                                         └── INSERT replacements        │
//! │                                         COMMIT                         │
//! │                                                                         │
//! │  Any error drops the transaction → SQLite rolls every write back.      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Concurrency
//! The first statement of each transaction is a write against the
//! replacement product row, so two requests for the same last unit are
//! serialized by SQLite's write lock: the second one waits (busy timeout),
//! then sees the decremented stock and fails with `InsufficientStock`.

use chrono::{NaiveDate, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use crate::repository::product::{decrement_stock, lock_product_with_stock, LockedProduct};
use crate::repository::sales_order::{
    ensure_order_has_product, fulfil_line, insert_order, line_total, OrderHeader,
};
use stockwise_core::order_code::generate_order_code;
use stockwise_core::replacement::{
    OrderReplacementOutcome, OrderReplacementRequest, ProductReplacementOutcome,
    ProductReplacementRequest,
};
use stockwise_core::report::{build_report, ReplacementReport, ReplacementReportRow, ReportPeriod};
use stockwise_core::{
    Money, Replacement, ReplacementKind, ReplacementSummary, SalesOrderDetail, ValidationError,
    REPLACEMENT_ORDER_ADJUSTMENT_REASON,
};

const REPLACEMENT_COLUMNS: &str = r#"
    replace_id, original_order_id, original_product_id, replacement_product_id,
    replacement_order_id, quantity, reason, processed_by_id, created_at, updated_at
"#;

/// Fields of a new replacements row.
struct NewReplacement<'a> {
    original_order_id: i64,
    original_product_id: Option<i64>,
    replacement_product_id: i64,
    replacement_order_id: Option<i64>,
    quantity: i64,
    reason: &'a str,
    processed_by_id: i64,
}

/// Flattened list row before the kind is derived.
#[derive(Debug, sqlx::FromRow)]
struct SummaryRow {
    replace_id: i64,
    quantity: i64,
    reason: String,
    original_product_name: Option<String>,
    replacement_product_name: Option<String>,
    original_order: Option<String>,
    replacement_order: Option<String>,
}

impl From<SummaryRow> for ReplacementSummary {
    fn from(row: SummaryRow) -> Self {
        ReplacementSummary {
            kind: ReplacementKind::from_replacement_order(row.replacement_order.as_ref()),
            replace_id: row.replace_id,
            quantity: row.quantity,
            reason: row.reason,
            original_product_name: row.original_product_name,
            replacement_product_name: row.replacement_product_name,
            original_order: row.original_order,
            replacement_order: row.replacement_order,
        }
    }
}

/// Repository for replacements.
#[derive(Debug, Clone)]
pub struct ReplacementRepository {
    pool: SqlitePool,
}

impl ReplacementRepository {
    /// Creates a new ReplacementRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ReplacementRepository { pool }
    }

    // =========================================================================
    // Workflows
    // =========================================================================

    /// Swaps sold units for units of another product (no new order).
    ///
    /// ## Effect
    /// Exactly one `replacements` row, and the replacement product's stock
    /// drops by `quantity`. Nothing else is written.
    ///
    /// ## Errors
    /// * `Validation` - Bad quantity or reason
    /// * `ProductNotFound` / `InsufficientStock` - Replacement product
    /// * `OrderNotFound` / `ProductNotInOrder` - Original order
    pub async fn replace_product(
        &self,
        request: &ProductReplacementRequest,
    ) -> DbResult<ProductReplacementOutcome> {
        let valid = request.validate()?;

        debug!(
            original_order_id = %valid.original_order_id,
            replacement_product_id = %valid.replacement_product_id,
            quantity = %valid.quantity,
            "Processing product replacement"
        );

        let result: DbResult<ProductReplacementOutcome> = async {
            let mut tx = self.pool.begin().await?;

            lock_product_with_stock(&mut tx, valid.replacement_product_id, valid.quantity)
                .await?;
            ensure_order_has_product(&mut tx, valid.original_order_id, valid.original_product_id)
                .await?;

            let remaining_stock =
                decrement_stock(&mut tx, valid.replacement_product_id, valid.quantity).await?;

            let replacement = insert_replacement(
                &mut tx,
                &NewReplacement {
                    original_order_id: valid.original_order_id,
                    original_product_id: valid.original_product_id,
                    replacement_product_id: valid.replacement_product_id,
                    replacement_order_id: None,
                    quantity: valid.quantity,
                    reason: &valid.reason,
                    processed_by_id: valid.processed_by_id,
                },
            )
            .await?;

            tx.commit().await?;

            Ok(ProductReplacementOutcome {
                replacement,
                remaining_stock,
            })
        }
        .await;

        match &result {
            Ok(outcome) => info!(
                replace_id = %outcome.replacement.replace_id,
                replacement_product_id = %valid.replacement_product_id,
                quantity = %valid.quantity,
                remaining_stock = %outcome.remaining_stock,
                "Product replacement recorded"
            ),
            Err(err) => log_rejection("product", err),
        }

        result
    }

    /// Replaces a product by ringing up a new sales order.
    ///
    /// ## Effect
    /// One `sales_orders` row, one `order_items` row and one
    /// `inventory_adjustments` row (reason `Replacement Order`) per line,
    /// one guarded stock decrement per line, and one `replacements` row
    /// pointing at the new order.
    ///
    /// ## Errors
    /// As [`Self::replace_product`], plus a `ProductNotFound` /
    /// `InsufficientStock` from any other line, and a `Validation` error when
    /// `total_price_cents` differs from the sum of the line prices. Either way
    /// nothing is written.
    pub async fn replace_with_order(
        &self,
        request: &OrderReplacementRequest,
    ) -> DbResult<OrderReplacementOutcome> {
        let valid = request.validate()?;

        debug!(
            original_order_id = %valid.original_order_id,
            replacement_product_id = %valid.replacement_product_id,
            lines = valid.lines.len(),
            "Processing order replacement"
        );

        let result: DbResult<OrderReplacementOutcome> = async {
            let mut tx = self.pool.begin().await?;

            // Step 1: lock and check the replacement product first.
            lock_product_with_stock(&mut tx, valid.replacement_product_id, valid.quantity)
                .await?;
            ensure_order_has_product(
                &mut tx,
                valid.original_order_id,
                Some(valid.original_product_id),
            )
            .await?;

            let mut locked: Vec<(LockedProduct, i64)> = Vec::with_capacity(valid.lines.len());
            for line in &valid.lines {
                let product = lock_product_with_stock(&mut tx, line.product_id, line.quantity).await?;
                locked.push((product, line.quantity));
            }

            // The header total must match the items priced from the locked rows.
            let mut priced_total = Money::zero();
            for (product, quantity) in &locked {
                priced_total += line_total(product, *quantity)?;
            }
            if priced_total != valid.total_price {
                return Err(ValidationError::Mismatch {
                    field: "total_price_cents".to_string(),
                    reason: format!(
                        "{} does not match the item total of {}",
                        valid.total_price, priced_total
                    ),
                }
                .into());
            }

            // Steps 2-3: the new order under a fresh code.
            let header = OrderHeader {
                user_id: valid.processed_by_id,
                payment_method_id: Some(valid.payment_method_id),
                amount_given_cents: valid.amount_given.cents(),
                change_cents: valid.change.cents(),
                total_price_cents: valid.total_price.cents(),
                discount_percentage: valid.discount_percentage.map(i64::from),
                discounted_total_cents: valid.discounted_total.map(|m| m.cents()),
            };
            let order = insert_order(&mut tx, &header, generate_order_code).await?;

            // Step 4: item, adjustment and decrement per line.
            let mut items = Vec::with_capacity(locked.len());
            for (product, quantity) in &locked {
                let item = fulfil_line(
                    &mut tx,
                    &order,
                    product,
                    *quantity,
                    REPLACEMENT_ORDER_ADJUSTMENT_REASON,
                    valid.processed_by_id,
                )
                .await?;
                items.push(item);
            }

            // Step 5: the replacement record itself.
            let replacement = insert_replacement(
                &mut tx,
                &NewReplacement {
                    original_order_id: valid.original_order_id,
                    original_product_id: Some(valid.original_product_id),
                    replacement_product_id: valid.replacement_product_id,
                    replacement_order_id: Some(order.order_id),
                    quantity: valid.quantity,
                    reason: &valid.reason,
                    processed_by_id: valid.processed_by_id,
                },
            )
            .await?;

            tx.commit().await?;

            Ok(OrderReplacementOutcome {
                order_code: order.order_code.clone(),
                order: SalesOrderDetail { order, items },
                replacement,
            })
        }
        .await;

        match &result {
            Ok(outcome) => info!(
                replace_id = %outcome.replacement.replace_id,
                order_code = %outcome.order_code,
                lines = outcome.order.items.len(),
                "Order replacement recorded"
            ),
            Err(err) => log_rejection("order", err),
        }

        result
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub async fn get_by_id(&self, replace_id: i64) -> DbResult<Option<Replacement>> {
        let sql = format!(
            "SELECT {} FROM replacements WHERE replace_id = ?1",
            REPLACEMENT_COLUMNS
        );
        let replacement = sqlx::query_as::<_, Replacement>(&sql)
            .bind(replace_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(replacement)
    }

    /// All replacements, newest first, flattened for the list view.
    pub async fn list(&self) -> DbResult<Vec<ReplacementSummary>> {
        let rows = sqlx::query_as::<_, SummaryRow>(
            r#"
            SELECT
                r.replace_id,
                r.quantity,
                r.reason,
                op.name       AS original_product_name,
                rp.name       AS replacement_product_name,
                oo.order_code AS original_order,
                ro.order_code AS replacement_order
            FROM replacements r
            LEFT JOIN products op     ON op.product_id = r.original_product_id
            LEFT JOIN products rp     ON rp.product_id = r.replacement_product_id
            LEFT JOIN sales_orders oo ON oo.order_id   = r.original_order_id
            LEFT JOIN sales_orders ro ON ro.order_id   = r.replacement_order_id
            ORDER BY r.created_at DESC, r.replace_id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        debug!(count = rows.len(), "Listed replacements");
        Ok(rows.into_iter().map(ReplacementSummary::from).collect())
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM replacements")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Report rows created between `from` and `to` (inclusive days).
    ///
    /// A missing bound leaves that side of the range open.
    pub async fn report_rows(
        &self,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> DbResult<Vec<ReplacementReportRow>> {
        let rows = sqlx::query_as::<_, ReplacementReportRow>(
            r#"
            SELECT
                r.created_at AS created_at,
                r.reason     AS reason,
                o.order_code AS order_code,
                u.name       AS processed_by,
                p.name       AS replacement_product_name
            FROM replacements r
            LEFT JOIN sales_orders o ON o.order_id   = r.original_order_id
            LEFT JOIN users u        ON u.user_id    = r.processed_by_id
            LEFT JOIN products p     ON p.product_id = r.replacement_product_id
            WHERE (?1 IS NULL OR substr(r.created_at, 1, 10) >= ?1)
              AND (?2 IS NULL OR substr(r.created_at, 1, 10) <= ?2)
            ORDER BY r.created_at DESC, r.replace_id DESC
            "#,
        )
        .bind(from.map(|d| d.format("%Y-%m-%d").to_string()))
        .bind(to.map(|d| d.format("%Y-%m-%d").to_string()))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Monthly counts for the period's year plus the detail rows in range.
    pub async fn report(&self, period: &ReportPeriod) -> DbResult<ReplacementReport> {
        let (from, to) = report_window(period)?;
        let rows = self.report_rows(from, to).await?;

        debug!(year = period.year, rows = rows.len(), "Building replacement report");
        Ok(build_report(period, &rows))
    }
}

// =============================================================================
// Helpers
// =============================================================================

async fn insert_replacement(
    conn: &mut SqliteConnection,
    new: &NewReplacement<'_>,
) -> DbResult<Replacement> {
    let sql = format!(
        r#"
        INSERT INTO replacements (
            original_order_id, original_product_id, replacement_product_id,
            replacement_order_id, quantity, reason, processed_by_id, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        RETURNING {}
        "#,
        REPLACEMENT_COLUMNS
    );

    let replacement = sqlx::query_as::<_, Replacement>(&sql)
        .bind(new.original_order_id)
        .bind(new.original_product_id)
        .bind(new.replacement_product_id)
        .bind(new.replacement_order_id)
        .bind(new.quantity)
        .bind(new.reason)
        .bind(new.processed_by_id)
        .bind(Utc::now())
        .fetch_one(conn)
        .await?;

    Ok(replacement)
}

/// Day range covering the report year and the detail range.
///
/// An open side of the detail range stays open, so detail rows from any
/// year are fetched.
pub(crate) fn report_window(
    period: &ReportPeriod,
) -> DbResult<(Option<NaiveDate>, Option<NaiveDate>)> {
    let year_start = NaiveDate::from_ymd_opt(period.year, 1, 1)
        .ok_or_else(|| DbError::Internal(format!("invalid report year {}", period.year)))?;
    let year_end = NaiveDate::from_ymd_opt(period.year, 12, 31)
        .ok_or_else(|| DbError::Internal(format!("invalid report year {}", period.year)))?;

    let from = period.start.map(|start| start.min(year_start));
    let to = period.end.map(|end| end.max(year_end));

    Ok((from, to))
}

fn log_rejection(workflow: &str, err: &DbError) {
    match err {
        DbError::Domain(rule) => warn!(workflow, reason = %rule, "Replacement rejected"),
        other => tracing::error!(workflow, error = %other, "Replacement failed"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::fixtures::{seed_fixture, test_db, Fixture, CAP_PRICE_CENTS};
    use crate::{Database, DbConfig};
    use chrono::{Datelike, TimeZone};
    use stockwise_core::{CoreError, OrderLine};

    fn product_request(fx: &Fixture, product_id: i64, quantity: i64) -> ProductReplacementRequest {
        ProductReplacementRequest {
            original_order_id: fx.original_order_id,
            original_product_id: Some(fx.tee_id),
            replacement_product_id: product_id,
            quantity,
            reason: "Defective".to_string(),
            reason_detail: None,
            processed_by_id: fx.manager_id,
        }
    }

    fn order_request(fx: &Fixture) -> OrderReplacementRequest {
        let total = 2 * CAP_PRICE_CENTS;
        OrderReplacementRequest {
            processed_by_id: fx.manager_id,
            lines: vec![OrderLine {
                product_id: fx.cap_id,
                quantity: 2,
            }],
            total_price_cents: total,
            change_cents: 5_000 - total,
            amount_given_cents: 5_000,
            original_order_id: fx.original_order_id,
            original_product_id: fx.tee_id,
            replacement_product_id: fx.cap_id,
            quantity: 2,
            reason: "Wrong Item".to_string(),
            reason_detail: None,
            payment_method_id: fx.cash_id,
            discount_percentage: None,
        }
    }

    async fn table_count(db: &Database, table: &str) -> i64 {
        sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
            .fetch_one(db.pool())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_product_replacement_decrements_and_records() {
        let db = test_db().await;
        let fx = seed_fixture(&db).await;
        let before = db.products().stock_of(fx.cap_id).await.unwrap();
        let adjustments_before = table_count(&db, "inventory_adjustments").await;

        let outcome = db
            .replacements()
            .replace_product(&product_request(&fx, fx.cap_id, 2))
            .await
            .unwrap();

        assert_eq!(outcome.remaining_stock, before - 2);
        assert_eq!(db.products().stock_of(fx.cap_id).await.unwrap(), before - 2);
        assert_eq!(outcome.replacement.reason, "Defective");
        assert_eq!(outcome.replacement.replacement_order_id, None);
        assert_eq!(outcome.replacement.kind(), ReplacementKind::ProductReplacement);
        assert_eq!(db.replacements().count().await.unwrap(), 1);
        // A simple swap logs no inventory adjustment.
        assert_eq!(table_count(&db, "inventory_adjustments").await, adjustments_before);
    }

    #[tokio::test]
    async fn test_product_replacement_stores_other_detail() {
        let db = test_db().await;
        let fx = seed_fixture(&db).await;

        let mut request = product_request(&fx, fx.cap_id, 1);
        request.reason = "Other".to_string();
        request.reason_detail = Some("Customer found a stain".to_string());

        let outcome = db.replacements().replace_product(&request).await.unwrap();
        assert_eq!(outcome.replacement.reason, "Customer found a stain");
    }

    #[tokio::test]
    async fn test_insufficient_stock_writes_nothing() {
        let db = test_db().await;
        let fx = seed_fixture(&db).await;
        let stock = db.products().stock_of(fx.cap_id).await.unwrap();

        let err = db
            .replacements()
            .replace_product(&product_request(&fx, fx.cap_id, stock + 1))
            .await
            .unwrap_err();

        assert_eq!(
            err.domain(),
            Some(&CoreError::InsufficientStock {
                product_id: fx.cap_id,
                available: stock,
                requested: stock + 1,
            })
        );
        assert_eq!(db.products().stock_of(fx.cap_id).await.unwrap(), stock);
        assert_eq!(db.replacements().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_product_replacement_typed_failures() {
        let db = test_db().await;
        let fx = seed_fixture(&db).await;

        let err = db
            .replacements()
            .replace_product(&product_request(&fx, 9_999, 1))
            .await
            .unwrap_err();
        assert_eq!(err.domain(), Some(&CoreError::ProductNotFound(9_999)));

        let mut request = product_request(&fx, fx.cap_id, 1);
        request.original_order_id = 9_999;
        let err = db.replacements().replace_product(&request).await.unwrap_err();
        assert_eq!(err.domain(), Some(&CoreError::OrderNotFound(9_999)));

        let mut request = product_request(&fx, fx.cap_id, 1);
        request.original_product_id = Some(fx.sneaker_id);
        let err = db.replacements().replace_product(&request).await.unwrap_err();
        assert!(matches!(
            err.domain(),
            Some(CoreError::ProductNotInOrder { .. })
        ));

        let mut request = product_request(&fx, fx.cap_id, 1);
        request.reason = "Other".to_string();
        let err = db.replacements().replace_product(&request).await.unwrap_err();
        assert!(matches!(err.domain(), Some(CoreError::Validation(_))));

        assert_eq!(db.replacements().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_order_replacement_row_counts() {
        let db = test_db().await;
        let fx = seed_fixture(&db).await;
        let cap_before = db.products().stock_of(fx.cap_id).await.unwrap();
        let tee_before = db.products().stock_of(fx.tee_id).await.unwrap();

        let orders = table_count(&db, "sales_orders").await;
        let items = table_count(&db, "order_items").await;
        let adjustments = table_count(&db, "inventory_adjustments").await;

        let mut request = order_request(&fx);
        request.lines.push(OrderLine {
            product_id: fx.tee_id,
            quantity: 1,
        });
        request.total_price_cents += crate::repository::fixtures::TEE_PRICE_CENTS;
        request.amount_given_cents = request.total_price_cents;
        request.change_cents = 0;
        request.discount_percentage = Some(10);

        let outcome = db.replacements().replace_with_order(&request).await.unwrap();

        assert_eq!(table_count(&db, "sales_orders").await, orders + 1);
        assert_eq!(table_count(&db, "order_items").await, items + 2);
        assert_eq!(table_count(&db, "inventory_adjustments").await, adjustments + 2);
        assert_eq!(db.replacements().count().await.unwrap(), 1);

        assert_eq!(db.products().stock_of(fx.cap_id).await.unwrap(), cap_before - 2);
        assert_eq!(db.products().stock_of(fx.tee_id).await.unwrap(), tee_before - 1);

        assert_eq!(outcome.order.order.order_code, outcome.order_code);
        assert_eq!(outcome.order.order.discount_percentage, Some(10));
        assert_eq!(
            outcome.replacement.replacement_order_id,
            Some(outcome.order.order.order_id)
        );
        assert_eq!(outcome.replacement.kind(), ReplacementKind::OrderReplacement);
        assert_eq!(outcome.order.items[0].unit_price_cents, CAP_PRICE_CENTS);

        let adjustments = db.orders().adjustments_for_product(fx.cap_id).await.unwrap();
        assert_eq!(adjustments[0].quantity_changed, -2);
        assert_eq!(adjustments[0].reason, REPLACEMENT_ORDER_ADJUSTMENT_REASON);
        assert_eq!(adjustments[0].adjusted_by, fx.manager_id);
    }

    #[tokio::test]
    async fn test_failing_later_line_rolls_everything_back() {
        let db = test_db().await;
        let fx = seed_fixture(&db).await;
        let cap_before = db.products().stock_of(fx.cap_id).await.unwrap();
        let sneaker_stock = db.products().stock_of(fx.sneaker_id).await.unwrap();

        let orders = table_count(&db, "sales_orders").await;
        let items = table_count(&db, "order_items").await;
        let adjustments = table_count(&db, "inventory_adjustments").await;

        let mut request = order_request(&fx);
        request.lines.push(OrderLine {
            product_id: fx.sneaker_id,
            quantity: sneaker_stock + 1,
        });

        let err = db
            .replacements()
            .replace_with_order(&request)
            .await
            .unwrap_err();
        assert!(matches!(
            err.domain(),
            Some(CoreError::InsufficientStock { product_id, .. }) if *product_id == fx.sneaker_id
        ));

        assert_eq!(db.products().stock_of(fx.cap_id).await.unwrap(), cap_before);
        assert_eq!(db.products().stock_of(fx.sneaker_id).await.unwrap(), sneaker_stock);
        assert_eq!(table_count(&db, "sales_orders").await, orders);
        assert_eq!(table_count(&db, "order_items").await, items);
        assert_eq!(table_count(&db, "inventory_adjustments").await, adjustments);
        assert_eq!(db.replacements().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_order_replacement_validation_runs_first() {
        let db = test_db().await;
        let fx = seed_fixture(&db).await;

        let mut request = order_request(&fx);
        request.change_cents += 1;
        let err = db.replacements().replace_with_order(&request).await.unwrap_err();
        assert!(matches!(err.domain(), Some(CoreError::Validation(_))));

        let mut request = order_request(&fx);
        request.original_product_id = fx.sneaker_id;
        let err = db.replacements().replace_with_order(&request).await.unwrap_err();
        assert!(matches!(
            err.domain(),
            Some(CoreError::ProductNotInOrder { .. })
        ));
    }

    #[tokio::test]
    async fn test_order_total_must_match_item_prices() {
        let db = test_db().await;
        let fx = seed_fixture(&db).await;
        let cap_before = db.products().stock_of(fx.cap_id).await.unwrap();
        let orders = table_count(&db, "sales_orders").await;

        let mut request = order_request(&fx);
        request.total_price_cents = 0;
        request.change_cents = request.amount_given_cents;

        let err = db.replacements().replace_with_order(&request).await.unwrap_err();
        assert!(matches!(
            err.domain(),
            Some(CoreError::Validation(ValidationError::Mismatch { field, .. }))
                if field == "total_price_cents"
        ));

        assert_eq!(db.products().stock_of(fx.cap_id).await.unwrap(), cap_before);
        assert_eq!(table_count(&db, "sales_orders").await, orders);
        assert_eq!(db.replacements().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_list_flattens_both_kinds() {
        let db = test_db().await;
        let fx = seed_fixture(&db).await;

        db.replacements()
            .replace_product(&product_request(&fx, fx.cap_id, 1))
            .await
            .unwrap();
        let outcome = db
            .replacements()
            .replace_with_order(&order_request(&fx))
            .await
            .unwrap();

        let list = db.replacements().list().await.unwrap();
        assert_eq!(list.len(), 2);

        let newest = &list[0];
        assert_eq!(newest.kind, ReplacementKind::OrderReplacement);
        assert_eq!(newest.replacement_order.as_deref(), Some(outcome.order_code.as_str()));
        assert_eq!(newest.original_order.as_deref(), Some(fx.original_order_code.as_str()));
        assert_eq!(newest.replacement_product_name.as_deref(), Some("Bucket Cap"));

        let oldest = &list[1];
        assert_eq!(oldest.kind, ReplacementKind::ProductReplacement);
        assert_eq!(oldest.replacement_order, None);
        assert_eq!(oldest.original_product_name.as_deref(), Some("Classic Tee"));
    }

    #[tokio::test]
    async fn test_report_for_empty_year() {
        let db = test_db().await;
        let period = ReportPeriod {
            year: 2021,
            start: None,
            end: None,
        };

        let report = db.replacements().report(&period).await.unwrap();
        assert_eq!(report.months.len(), 12);
        assert!(report.months.iter().all(|m| m.total() == 0));
        assert!(report.replacements.is_empty());
    }

    #[tokio::test]
    async fn test_report_counts_current_year() {
        let db = test_db().await;
        let fx = seed_fixture(&db).await;

        db.replacements()
            .replace_product(&product_request(&fx, fx.cap_id, 1))
            .await
            .unwrap();
        let mut request = product_request(&fx, fx.cap_id, 1);
        request.reason = "Too big".to_string();
        db.replacements().replace_product(&request).await.unwrap();

        let today = Utc::now().date_naive();
        let period = ReportPeriod::from_query(None, None, today).unwrap();
        let report = db.replacements().report(&period).await.unwrap();

        let month = &report.months[today.month0() as usize];
        assert_eq!(month.defective, 1);
        assert_eq!(month.other, 1);

        assert_eq!(report.replacements.len(), 2);
        assert_eq!(report.replacements[0].status, "Too big");
        assert_eq!(report.replacements[0].sku, fx.original_order_code);
        assert_eq!(report.replacements[0].name, "Mara Manager");
        assert_eq!(report.replacements[0].item_name, "Bucket Cap");
        assert_eq!(report.replacements[0].date, today.format("%Y-%m-%d").to_string());
    }

    #[test]
    fn test_report_window_covers_year_and_range() {
        let day = |y, m, d| NaiveDate::from_ymd_opt(y, m, d).unwrap();

        let period = ReportPeriod {
            year: 2024,
            start: Some(day(2024, 3, 1)),
            end: Some(day(2024, 3, 31)),
        };
        assert_eq!(
            report_window(&period).unwrap(),
            (Some(day(2024, 1, 1)), Some(day(2024, 12, 31)))
        );

        let stamp = Utc.with_ymd_and_hms(2024, 3, 5, 0, 0, 0).unwrap();
        assert!(period.contains(&stamp));

        let open = ReportPeriod {
            year: 2026,
            start: None,
            end: Some(day(2025, 12, 31)),
        };
        assert_eq!(report_window(&open).unwrap(), (None, Some(day(2026, 12, 31))));
    }

    async fn backdate_replacements(db: &Database, at: chrono::DateTime<Utc>) {
        sqlx::query("UPDATE replacements SET created_at = ?1")
            .bind(at)
            .execute(db.pool())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_report_keeps_rows_from_past_years() {
        let db = test_db().await;
        let fx = seed_fixture(&db).await;

        db.replacements()
            .replace_product(&product_request(&fx, fx.cap_id, 1))
            .await
            .unwrap();
        let last_year = Utc::now().year() - 1;
        backdate_replacements(&db, Utc.with_ymd_and_hms(last_year, 6, 15, 9, 0, 0).unwrap())
            .await;

        let today = Utc::now().date_naive();
        let june = format!("{}-06-15", last_year);
        let year_end = format!("{}-12-31", last_year);
        let after = format!("{}-07-01", last_year);

        // No parameters: the chart is this year, the table lists everything.
        let period = ReportPeriod::from_query(None, None, today).unwrap();
        let report = db.replacements().report(&period).await.unwrap();
        assert_eq!(report.replacements.len(), 1);
        assert_eq!(report.replacements[0].date, june);
        assert!(report.months.iter().all(|m| m.total() == 0));

        // End date only, in the past year.
        let period = ReportPeriod::from_query(None, Some(year_end.as_str()), today).unwrap();
        let report = db.replacements().report(&period).await.unwrap();
        assert_eq!(report.replacements.len(), 1);

        // Start date only: the chart moves to that year.
        let period = ReportPeriod::from_query(Some(june.as_str()), None, today).unwrap();
        let report = db.replacements().report(&period).await.unwrap();
        assert_eq!(report.replacements.len(), 1);
        assert_eq!(report.months[5].defective, 1);

        // Start date after the row: chart still counts it, table does not.
        let period = ReportPeriod::from_query(Some(after.as_str()), None, today).unwrap();
        let report = db.replacements().report(&period).await.unwrap();
        assert!(report.replacements.is_empty());
        assert_eq!(report.months[5].defective, 1);
    }

    /// Two requests racing for the last units: one wins, one is told
    /// there is not enough stock, and stock never goes negative.
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_replacements_for_last_units() {
        let dir = tempfile::tempdir().unwrap();
        let config = DbConfig::new(dir.path().join("race.db")).max_connections(4);
        let db = Database::new(config).await.unwrap();
        let fx = seed_fixture(&db).await;

        let stock = db.products().stock_of(fx.sneaker_id).await.unwrap();
        let request = product_request(&fx, fx.sneaker_id, stock);

        let (a, b) = tokio::join!(
            {
                let db = db.clone();
                let request = request.clone();
                tokio::spawn(async move { db.replacements().replace_product(&request).await })
            },
            {
                let db = db.clone();
                let request = request.clone();
                tokio::spawn(async move { db.replacements().replace_product(&request).await })
            }
        );
        let results = [a.unwrap(), b.unwrap()];

        let successes = results.iter().filter(|r| r.is_ok()).count();
        let short = results
            .iter()
            .filter(|r| {
                matches!(
                    r.as_ref().err().and_then(|e| e.domain()),
                    Some(CoreError::InsufficientStock { .. })
                )
            })
            .count();

        assert_eq!(successes, 1);
        assert_eq!(short, 1);
        assert_eq!(db.products().stock_of(fx.sneaker_id).await.unwrap(), 0);
        assert_eq!(db.replacements().count().await.unwrap(), 1);
    }
}
