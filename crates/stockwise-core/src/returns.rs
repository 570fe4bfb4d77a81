//! # Product Returns
//!
//! Customer returns and the monthly defect report built from them.
//!
//! A return only records what came back and why; returned units are not put
//! back on the shelf.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ReturnRequest ──validate()──► ValidReturn ──► 1 returns row            │
//! │                                                                         │
//! │  months (always 12 entries, Jan..Dec of the report year)               │
//! │                                                                         │
//! │   month │ lost │ refund │ other                                        │
//! │   ──────┼──────┼────────┼──────                                        │
//! │   Jan   │  0   │   2    │   1                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::CoreResult;
use crate::report::MONTH_LABELS;
use crate::validation::{validate_quantity, validate_reason};

// =============================================================================
// Recording
// =============================================================================

/// A return handed in at the counter.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ReturnRequest {
    /// Order the units were sold on, when the receipt is at hand.
    #[serde(default)]
    pub order_id: Option<i64>,
    pub product_id: i64,
    pub quantity: i64,
    /// `Lost`, `Refund`, or `Other` with a detail.
    pub reason: String,
    #[serde(default)]
    pub reason_detail: Option<String>,
    /// Filled from the authenticated user by the HTTP layer.
    #[serde(default)]
    pub processed_by_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidReturn {
    pub order_id: Option<i64>,
    pub product_id: i64,
    pub quantity: i64,
    pub reason: String,
    pub processed_by_id: i64,
}

impl ReturnRequest {
    pub fn validate(&self) -> CoreResult<ValidReturn> {
        validate_quantity(self.quantity)?;
        let reason = validate_reason(&self.reason, self.reason_detail.as_deref())?;

        Ok(ValidReturn {
            order_id: self.order_id,
            product_id: self.product_id,
            quantity: self.quantity,
            reason,
            processed_by_id: self.processed_by_id,
        })
    }
}

// =============================================================================
// Report
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnBucket {
    Lost,
    Refund,
    Other,
}

impl ReturnBucket {
    pub fn from_reason(reason: &str) -> Self {
        match reason.trim() {
            "Lost" => ReturnBucket::Lost,
            "Refund" => ReturnBucket::Refund,
            _ => ReturnBucket::Other,
        }
    }
}

/// Timestamp and reason of one return, as read for the report.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct ReturnReportRow {
    pub created_at: DateTime<Utc>,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct MonthlyReturnCounts {
    pub month: String,
    pub lost: i64,
    pub refund: i64,
    pub other: i64,
}

impl MonthlyReturnCounts {
    fn empty(month: &str) -> Self {
        Self {
            month: month.to_string(),
            lost: 0,
            refund: 0,
            other: 0,
        }
    }

    pub fn total(&self) -> i64 {
        self.lost + self.refund + self.other
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ReturnReport {
    pub months: Vec<MonthlyReturnCounts>,
}

/// Counts `rows` from `year` into a zero-filled Jan..Dec skeleton.
pub fn build_return_report(year: i32, rows: &[ReturnReportRow]) -> ReturnReport {
    let mut months: Vec<MonthlyReturnCounts> = MONTH_LABELS
        .iter()
        .map(|label| MonthlyReturnCounts::empty(label))
        .collect();

    for row in rows.iter().filter(|r| r.created_at.year() == year) {
        let month = &mut months[row.created_at.month0() as usize];
        match ReturnBucket::from_reason(&row.reason) {
            ReturnBucket::Lost => month.lost += 1,
            ReturnBucket::Refund => month.refund += 1,
            ReturnBucket::Other => month.other += 1,
        }
    }

    ReturnReport { months }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CoreError, ValidationError};
    use chrono::TimeZone;

    fn row(y: i32, m: u32, reason: &str) -> ReturnReportRow {
        ReturnReportRow {
            created_at: Utc.with_ymd_and_hms(y, m, 10, 12, 0, 0).unwrap(),
            reason: reason.to_string(),
        }
    }

    #[test]
    fn test_buckets() {
        assert_eq!(ReturnBucket::from_reason("Lost"), ReturnBucket::Lost);
        assert_eq!(ReturnBucket::from_reason(" Refund "), ReturnBucket::Refund);
        assert_eq!(ReturnBucket::from_reason("Torn seam"), ReturnBucket::Other);
    }

    #[test]
    fn test_report_counts_one_year() {
        let rows = vec![
            row(2024, 2, "Refund"),
            row(2024, 2, "Refund"),
            row(2024, 2, "Lost"),
            row(2024, 11, "Torn seam"),
            row(2023, 2, "Refund"),
        ];
        let report = build_return_report(2024, &rows);

        assert_eq!(report.months.len(), 12);
        assert_eq!(report.months[1].month, "Feb");
        assert_eq!(report.months[1].refund, 2);
        assert_eq!(report.months[1].lost, 1);
        assert_eq!(report.months[10].other, 1);
        assert_eq!(report.months.iter().map(|m| m.total()).sum::<i64>(), 4);
    }

    #[test]
    fn test_report_serializes_lowercase_buckets() {
        let json = serde_json::to_value(build_return_report(2024, &[])).unwrap();
        assert_eq!(json["months"][0]["month"], "Jan");
        assert_eq!(json["months"][0]["lost"], 0);
        assert_eq!(json["months"][0]["refund"], 0);
        assert_eq!(json["months"][0]["other"], 0);
    }

    #[test]
    fn test_request_validation() {
        let request = ReturnRequest {
            order_id: None,
            product_id: 4,
            quantity: 1,
            reason: "Other".to_string(),
            reason_detail: Some("Wrong colour".to_string()),
            processed_by_id: 2,
        };
        assert_eq!(request.validate().unwrap().reason, "Wrong colour");

        let err = ReturnRequest {
            quantity: 0,
            ..request.clone()
        }
        .validate()
        .unwrap_err();
        assert!(matches!(err, CoreError::Validation(ValidationError::MustBePositive { .. })));

        let err = ReturnRequest {
            reason_detail: None,
            ..request
        }
        .validate()
        .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }
}
