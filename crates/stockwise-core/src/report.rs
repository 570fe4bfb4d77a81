//! # Replacement Report
//!
//! Aggregates replacement rows into the monthly chart and detail table shown
//! on the reports page.
//!
//! ## Shape
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  months (always 12 entries, Jan..Dec of the report year)               │
//! │                                                                         │
//! │   month │ Defective │ Wrong Item │ Damaged │ Other                      │
//! │   ──────┼───────────┼────────────┼─────────┼──────                      │
//! │   Jan   │     0     │     1      │    0    │   2                        │
//! │   Feb   │     0     │     0      │    0    │   0   ◄── zero-filled      │
//! │   ...                                                                   │
//! │                                                                         │
//! │  replacements (detail rows, newest first)                               │
//! │                                                                         │
//! │   sku (order code) │ status (reason) │ date │ name │ item_name          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Reasons outside the four known buckets are counted as `Other`.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreResult, ValidationError};
use crate::validation::validate_date;

pub const MONTH_LABELS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Placeholder for missing order codes, users and product names.
pub const NOT_AVAILABLE: &str = "N/A";

// =============================================================================
// Reason Buckets
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReasonBucket {
    Defective,
    WrongItem,
    Damaged,
    Other,
}

impl ReasonBucket {
    pub fn from_reason(reason: &str) -> Self {
        match reason.trim() {
            "Defective" => ReasonBucket::Defective,
            "Wrong Item" => ReasonBucket::WrongItem,
            "Damaged" => ReasonBucket::Damaged,
            _ => ReasonBucket::Other,
        }
    }
}

// =============================================================================
// Input / Output Rows
// =============================================================================

/// A replacement joined with the names the report needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct ReplacementReportRow {
    pub created_at: DateTime<Utc>,
    pub reason: String,
    pub order_code: Option<String>,
    pub processed_by: Option<String>,
    pub replacement_product_name: Option<String>,
}

/// Counts for one calendar month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct MonthlyReplacementCounts {
    pub month: String,
    #[serde(rename = "Defective")]
    pub defective: i64,
    #[serde(rename = "Wrong Item")]
    pub wrong_item: i64,
    #[serde(rename = "Damaged")]
    pub damaged: i64,
    #[serde(rename = "Other")]
    pub other: i64,
}

impl MonthlyReplacementCounts {
    fn empty(month: &str) -> Self {
        Self {
            month: month.to_string(),
            defective: 0,
            wrong_item: 0,
            damaged: 0,
            other: 0,
        }
    }

    fn bump(&mut self, bucket: ReasonBucket) {
        match bucket {
            ReasonBucket::Defective => self.defective += 1,
            ReasonBucket::WrongItem => self.wrong_item += 1,
            ReasonBucket::Damaged => self.damaged += 1,
            ReasonBucket::Other => self.other += 1,
        }
    }

    pub fn total(&self) -> i64 {
        self.defective + self.wrong_item + self.damaged + self.other
    }
}

/// One line of the report's detail table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ReplacementDetailRow {
    /// Original order code.
    pub sku: String,
    /// Replacement reason.
    pub status: String,
    /// `YYYY-MM-DD`.
    pub date: String,
    /// Processing user.
    pub name: String,
    /// Replacement product.
    pub item_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ReplacementReport {
    pub months: Vec<MonthlyReplacementCounts>,
    pub replacements: Vec<ReplacementDetailRow>,
}

// =============================================================================
// Report Period
// =============================================================================

/// Year for the monthly chart plus the optional date range for detail rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportPeriod {
    pub year: i32,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl ReportPeriod {
    /// Parses `startDate` / `endDate` query values.
    ///
    /// The chart year is the year of `start`, or the year of `today` when no
    /// start is given.
    ///
    /// ```rust
    /// use chrono::NaiveDate;
    /// use stockwise_core::report::ReportPeriod;
    ///
    /// let today = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
    /// let period = ReportPeriod::from_query(Some("2024-01-01"), Some("2024-12-31"), today).unwrap();
    /// assert_eq!(period.year, 2024);
    /// assert_eq!(ReportPeriod::from_query(None, None, today).unwrap().year, 2025);
    /// ```
    pub fn from_query(
        start: Option<&str>,
        end: Option<&str>,
        today: NaiveDate,
    ) -> CoreResult<Self> {
        let start = non_blank(start)
            .map(|s| validate_date("startDate", s))
            .transpose()?;
        let end = non_blank(end)
            .map(|s| validate_date("endDate", s))
            .transpose()?;

        if let (Some(s), Some(e)) = (start, end) {
            if s > e {
                return Err(ValidationError::Mismatch {
                    field: "endDate".to_string(),
                    reason: format!("{} is before startDate {}", e, s),
                }
                .into());
            }
        }

        Ok(Self {
            year: start.map(|d| d.year()).unwrap_or_else(|| today.year()),
            start,
            end,
        })
    }

    /// Whether a timestamp falls inside the detail range (inclusive days).
    pub fn contains(&self, at: &DateTime<Utc>) -> bool {
        let day = at.date_naive();
        self.start.map_or(true, |s| day >= s) && self.end.map_or(true, |e| day <= e)
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

// =============================================================================
// Aggregation
// =============================================================================

/// Builds the 12-month skeleton for `year` and counts `rows` into it.
///
/// Rows from other years are ignored.
pub fn build_monthly_counts(year: i32, rows: &[ReplacementReportRow]) -> Vec<MonthlyReplacementCounts> {
    let mut months: Vec<MonthlyReplacementCounts> = MONTH_LABELS
        .iter()
        .map(|label| MonthlyReplacementCounts::empty(label))
        .collect();

    for row in rows.iter().filter(|r| r.created_at.year() == year) {
        let idx = row.created_at.month0() as usize;
        months[idx].bump(ReasonBucket::from_reason(&row.reason));
    }

    months
}

/// Detail rows inside `period`, newest first.
pub fn build_detail_rows(period: &ReportPeriod, rows: &[ReplacementReportRow]) -> Vec<ReplacementDetailRow> {
    let mut selected: Vec<&ReplacementReportRow> =
        rows.iter().filter(|r| period.contains(&r.created_at)).collect();
    selected.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    selected
        .into_iter()
        .map(|row| ReplacementDetailRow {
            sku: or_na(row.order_code.as_deref()),
            status: row.reason.clone(),
            date: row.created_at.format("%Y-%m-%d").to_string(),
            name: or_na(row.processed_by.as_deref()),
            item_name: or_na(row.replacement_product_name.as_deref()),
        })
        .collect()
}

pub fn build_report(period: &ReportPeriod, rows: &[ReplacementReportRow]) -> ReplacementReport {
    ReplacementReport {
        months: build_monthly_counts(period.year, rows),
        replacements: build_detail_rows(period, rows),
    }
}

fn or_na(value: Option<&str>) -> String {
    value.unwrap_or(NOT_AVAILABLE).to_string()
}
