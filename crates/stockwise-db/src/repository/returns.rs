//! # Return Repository
//!
//! Records customer returns and reads them back for the monthly defect
//! report. Stock is not touched: returned units are written off.
//!
//! ## Recording
//! ```text
//! validate (no I/O)
//! BEGIN
//! ├── lock product row          missing → ProductNotFound
//! ├── order given?
//! │   ├── product on the order? missing → OrderNotFound / ProductNotInOrder
//! │   └── sold - already returned >= quantity?
//! └── INSERT returns
//! COMMIT
//! ```

use chrono::{NaiveDate, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use crate::repository::product::lock_product;
use crate::repository::sales_order::ensure_order_has_product;
use stockwise_core::report::ReportPeriod;
use stockwise_core::returns::{build_return_report, ReturnReport, ReturnReportRow, ReturnRequest};
use stockwise_core::{CoreError, ProductReturn, ValidationError};

const RETURN_COLUMNS: &str = r#"
    return_id, order_id, product_id, quantity, reason, processed_by_id,
    created_at, updated_at
"#;

/// Repository for product returns.
#[derive(Debug, Clone)]
pub struct ReturnRepository {
    pool: SqlitePool,
}

impl ReturnRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ReturnRepository { pool }
    }

    /// Records a return.
    ///
    /// ## Errors
    /// * `Validation` - Bad quantity or reason, or more units than the order
    ///   has left to return
    /// * `ProductNotFound` - No such product
    /// * `OrderNotFound` / `ProductNotInOrder` - The order doesn't hold the product
    pub async fn record(&self, request: &ReturnRequest) -> DbResult<ProductReturn> {
        let valid = request.validate()?;

        let result: DbResult<ProductReturn> = async {
            let mut tx = self.pool.begin().await?;

            lock_product(&mut tx, valid.product_id)
                .await?
                .ok_or(CoreError::ProductNotFound(valid.product_id))?;

            if let Some(order_id) = valid.order_id {
                ensure_order_has_product(&mut tx, order_id, Some(valid.product_id)).await?;
                ensure_returnable(&mut tx, order_id, valid.product_id, valid.quantity).await?;
            }

            let sql = format!(
                r#"
                INSERT INTO returns (
                    order_id, product_id, quantity, reason, processed_by_id, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                RETURNING {}
                "#,
                RETURN_COLUMNS
            );
            let recorded = sqlx::query_as::<_, ProductReturn>(&sql)
                .bind(valid.order_id)
                .bind(valid.product_id)
                .bind(valid.quantity)
                .bind(&valid.reason)
                .bind(valid.processed_by_id)
                .bind(Utc::now())
                .fetch_one(&mut *tx)
                .await?;

            tx.commit().await?;
            Ok(recorded)
        }
        .await;

        match &result {
            Ok(recorded) => info!(
                return_id = %recorded.return_id,
                product_id = %valid.product_id,
                quantity = %valid.quantity,
                reason = %recorded.reason,
                "Return recorded"
            ),
            Err(DbError::Domain(rule)) => warn!(reason = %rule, "Return rejected"),
            Err(err) => tracing::error!(error = %err, "Return failed"),
        }

        result
    }

    /// All returns, newest first.
    pub async fn list(&self) -> DbResult<Vec<ProductReturn>> {
        let sql = format!(
            "SELECT {} FROM returns ORDER BY created_at DESC, return_id DESC",
            RETURN_COLUMNS
        );
        let returns = sqlx::query_as::<_, ProductReturn>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(returns)
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM returns")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Monthly lost / refund / other counts for the period's year.
    pub async fn report(&self, period: &ReportPeriod) -> DbResult<ReturnReport> {
        let from = NaiveDate::from_ymd_opt(period.year, 1, 1)
            .ok_or_else(|| DbError::Internal(format!("invalid report year {}", period.year)))?;
        let to = NaiveDate::from_ymd_opt(period.year, 12, 31)
            .ok_or_else(|| DbError::Internal(format!("invalid report year {}", period.year)))?;

        let rows = sqlx::query_as::<_, ReturnReportRow>(
            r#"
            SELECT created_at, reason
            FROM returns
            WHERE substr(created_at, 1, 10) BETWEEN ?1 AND ?2
            "#,
        )
        .bind(from.format("%Y-%m-%d").to_string())
        .bind(to.format("%Y-%m-%d").to_string())
        .fetch_all(&self.pool)
        .await?;

        debug!(year = period.year, rows = rows.len(), "Building return report");
        Ok(build_return_report(period.year, &rows))
    }
}

/// Fails unless the order still has `quantity` unreturned units of the product.
async fn ensure_returnable(
    conn: &mut SqliteConnection,
    order_id: i64,
    product_id: i64,
    quantity: i64,
) -> DbResult<()> {
    let sold: i64 = sqlx::query_scalar(
        "SELECT COALESCE(SUM(quantity), 0) FROM order_items WHERE order_id = ?1 AND product_id = ?2",
    )
    .bind(order_id)
    .bind(product_id)
    .fetch_one(&mut *conn)
    .await?;

    let returned: i64 = sqlx::query_scalar(
        "SELECT COALESCE(SUM(quantity), 0) FROM returns WHERE order_id = ?1 AND product_id = ?2",
    )
    .bind(order_id)
    .bind(product_id)
    .fetch_one(&mut *conn)
    .await?;

    if returned + quantity > sold {
        return Err(ValidationError::Mismatch {
            field: "quantity".to_string(),
            reason: format!(
                "{} returned, but only {} of {} sold on order {} remain",
                quantity,
                sold - returned,
                sold,
                order_id
            ),
        }
        .into());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::fixtures::{seed_fixture, test_db, Fixture};
    use chrono::{Datelike, TimeZone};

    fn return_request(fx: &Fixture, reason: &str) -> ReturnRequest {
        ReturnRequest {
            order_id: Some(fx.original_order_id),
            product_id: fx.tee_id,
            quantity: 1,
            reason: reason.to_string(),
            reason_detail: None,
            processed_by_id: fx.manager_id,
        }
    }

    #[tokio::test]
    async fn test_record_return_leaves_stock_alone() {
        let db = test_db().await;
        let fx = seed_fixture(&db).await;
        let stock = db.products().stock_of(fx.tee_id).await.unwrap();

        let recorded = db.returns().record(&return_request(&fx, "Refund")).await.unwrap();

        assert_eq!(recorded.order_id, Some(fx.original_order_id));
        assert_eq!(recorded.product_id, Some(fx.tee_id));
        assert_eq!(recorded.reason, "Refund");
        assert_eq!(recorded.processed_by_id, Some(fx.manager_id));
        assert_eq!(db.products().stock_of(fx.tee_id).await.unwrap(), stock);
        assert_eq!(db.returns().list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_cannot_return_more_than_sold() {
        let db = test_db().await;
        let fx = seed_fixture(&db).await;

        // The fixture order sold a single tee.
        db.returns().record(&return_request(&fx, "Lost")).await.unwrap();
        let err = db.returns().record(&return_request(&fx, "Refund")).await.unwrap_err();

        assert!(matches!(
            err.domain(),
            Some(CoreError::Validation(ValidationError::Mismatch { field, .. })) if field == "quantity"
        ));
        assert_eq!(db.returns().count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_record_typed_failures() {
        let db = test_db().await;
        let fx = seed_fixture(&db).await;

        let mut request = return_request(&fx, "Refund");
        request.product_id = 9_999;
        let err = db.returns().record(&request).await.unwrap_err();
        assert_eq!(err.domain(), Some(&CoreError::ProductNotFound(9_999)));

        let mut request = return_request(&fx, "Refund");
        request.product_id = fx.cap_id;
        let err = db.returns().record(&request).await.unwrap_err();
        assert!(matches!(err.domain(), Some(CoreError::ProductNotInOrder { .. })));

        // Without a receipt any product can come back.
        request.order_id = None;
        db.returns().record(&request).await.unwrap();
        assert_eq!(db.returns().count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_report_buckets_by_month() {
        let db = test_db().await;
        let fx = seed_fixture(&db).await;

        let mut request = return_request(&fx, "Refund");
        request.order_id = None;
        db.returns().record(&request).await.unwrap();
        request.reason = "Lost".to_string();
        db.returns().record(&request).await.unwrap();
        request.reason = "Stitching came loose".to_string();
        db.returns().record(&request).await.unwrap();

        let today = Utc::now().date_naive();
        let period = ReportPeriod::from_query(None, None, today).unwrap();
        let report = db.returns().report(&period).await.unwrap();

        let month = &report.months[today.month0() as usize];
        assert_eq!((month.lost, month.refund, month.other), (1, 1, 1));

        // A year with no returns still has twelve zero months.
        sqlx::query("UPDATE returns SET created_at = ?1")
            .bind(Utc.with_ymd_and_hms(today.year() - 1, 3, 1, 8, 0, 0).unwrap())
            .execute(db.pool())
            .await
            .unwrap();
        let report = db.returns().report(&period).await.unwrap();
        assert_eq!(report.months.len(), 12);
        assert!(report.months.iter().all(|m| m.total() == 0));
    }
}
