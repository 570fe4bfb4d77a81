//! # Replacement Requests
//!
//! Request types for the two replacement workflows and the business rules
//! that run before any database work.
//!
//! ## Workflows
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Product Replacement (simple swap)                                      │
//! │                                                                         │
//! │    ProductReplacementRequest ──validate()──► ValidProductReplacement    │
//! │         │                                         │                     │
//! │         │                                         ▼                     │
//! │         │                            1 Replace row + 1 stock decrement  │
//! │                                                                         │
//! │  Order Replacement (new sales order)                                    │
//! │                                                                         │
//! │    OrderReplacementRequest ──validate()──► ValidOrderReplacement        │
//! │                                                   │                     │
//! │                                                   ▼                     │
//! │              1 SalesOrder + N OrderItems + N InventoryAdjustments       │
//! │              + N stock decrements + 1 Replace row                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Validation never touches stock. Stock checks happen inside the database
//! transaction (see `stockwise-db`), where [`ensure_stock`] is applied to the
//! locked product row.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{OrderLine, Replacement, SalesOrderDetail};
use crate::validation::{
    validate_cents, validate_discount_percentage, validate_quantity, validate_reason,
};
use crate::MAX_ORDER_LINES;

// =============================================================================
// Product Replacement
// =============================================================================

/// Swap sold units for units of another product without a new order.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProductReplacementRequest {
    pub original_order_id: i64,
    /// Product being given back, when the clerk records it.
    #[serde(default)]
    pub original_product_id: Option<i64>,
    pub replacement_product_id: i64,
    pub quantity: i64,
    /// One of `Defective`, `Wrong Item`, `Damaged`, `Other` in practice.
    pub reason: String,
    /// Free text required when `reason` is `Other`.
    #[serde(default)]
    pub reason_detail: Option<String>,
    /// Filled from the authenticated user by the HTTP layer.
    #[serde(default)]
    pub processed_by_id: i64,
}

/// A product replacement that passed field validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidProductReplacement {
    pub original_order_id: i64,
    pub original_product_id: Option<i64>,
    pub replacement_product_id: i64,
    pub quantity: i64,
    /// Resolved reason (the detail text when the reason was `Other`).
    pub reason: String,
    pub processed_by_id: i64,
}

impl ProductReplacementRequest {
    pub fn validate(&self) -> CoreResult<ValidProductReplacement> {
        validate_quantity(self.quantity)?;
        let reason = validate_reason(&self.reason, self.reason_detail.as_deref())?;

        Ok(ValidProductReplacement {
            original_order_id: self.original_order_id,
            original_product_id: self.original_product_id,
            replacement_product_id: self.replacement_product_id,
            quantity: self.quantity,
            reason,
            processed_by_id: self.processed_by_id,
        })
    }
}

// =============================================================================
// Order Replacement
// =============================================================================

/// Replace a product by ringing up a new sales order.
///
/// ## Totals
/// `total_price_cents`, `amount_given_cents` and `change_cents` come from the
/// till. They are recorded as given, after checking that they agree with
/// each other:
///
/// ```text
/// amount_given >= total_price
/// change       == amount_given - total_price
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderReplacementRequest {
    #[serde(default)]
    pub processed_by_id: i64,
    pub lines: Vec<OrderLine>,
    pub total_price_cents: i64,
    pub change_cents: i64,
    pub amount_given_cents: i64,
    pub original_order_id: i64,
    pub original_product_id: i64,
    pub replacement_product_id: i64,
    pub quantity: i64,
    pub reason: String,
    #[serde(default)]
    pub reason_detail: Option<String>,
    pub payment_method_id: i64,
    /// Whole percent, 0..=100.
    #[serde(default)]
    pub discount_percentage: Option<i64>,
}

/// An order replacement that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidOrderReplacement {
    pub processed_by_id: i64,
    pub lines: Vec<OrderLine>,
    pub total_price: Money,
    pub change: Money,
    pub amount_given: Money,
    pub discount_percentage: Option<u8>,
    /// `total_price` with the discount applied.
    pub discounted_total: Option<Money>,
    pub original_order_id: i64,
    pub original_product_id: i64,
    pub replacement_product_id: i64,
    pub quantity: i64,
    pub reason: String,
    pub payment_method_id: i64,
}

impl OrderReplacementRequest {
    pub fn validate(&self) -> CoreResult<ValidOrderReplacement> {
        validate_quantity(self.quantity)?;
        let reason = validate_reason(&self.reason, self.reason_detail.as_deref())?;
        validate_lines(&self.lines, self.replacement_product_id, self.quantity)?;

        validate_cents("total_price", self.total_price_cents)?;
        validate_cents("amount_given", self.amount_given_cents)?;
        validate_cents("change", self.change_cents)?;

        let total_price = Money::from_cents(self.total_price_cents);
        let amount_given = Money::from_cents(self.amount_given_cents);
        let change = Money::from_cents(self.change_cents);

        if amount_given < total_price {
            return Err(ValidationError::Mismatch {
                field: "amount_given".to_string(),
                reason: format!("{} is less than the total of {}", amount_given, total_price),
            }
            .into());
        }

        if change != amount_given - total_price {
            return Err(ValidationError::Mismatch {
                field: "change".to_string(),
                reason: format!("expected {}, got {}", amount_given - total_price, change),
            }
            .into());
        }

        let discount_percentage = self
            .discount_percentage
            .map(validate_discount_percentage)
            .transpose()?;
        let discounted_total = discount_percentage.map(|p| total_price.apply_percentage_discount(p));

        Ok(ValidOrderReplacement {
            processed_by_id: self.processed_by_id,
            lines: self.lines.clone(),
            total_price,
            change,
            amount_given,
            discount_percentage,
            discounted_total,
            original_order_id: self.original_order_id,
            original_product_id: self.original_product_id,
            replacement_product_id: self.replacement_product_id,
            quantity: self.quantity,
            reason,
            payment_method_id: self.payment_method_id,
        })
    }
}

/// Line rules shared by every new order.
///
/// ## Rules
/// - At least one line, at most MAX_ORDER_LINES
/// - Every line quantity in `1..=999`
/// - Each product appears on one line only
pub fn validate_order_lines(lines: &[OrderLine]) -> Result<(), ValidationError> {
    if lines.is_empty() {
        return Err(ValidationError::Required {
            field: "lines".to_string(),
        });
    }

    if lines.len() > MAX_ORDER_LINES {
        return Err(ValidationError::OutOfRange {
            field: "lines".to_string(),
            min: 1,
            max: MAX_ORDER_LINES as i64,
        });
    }

    let mut seen = HashSet::with_capacity(lines.len());
    for line in lines {
        validate_quantity(line.quantity)?;
        if !seen.insert(line.product_id) {
            return Err(ValidationError::Duplicate {
                field: "product_id".to_string(),
                value: line.product_id.to_string(),
            });
        }
    }

    Ok(())
}

/// Line rules for an order replacement: the shared order rules, plus the
/// replacement product has a line whose quantity is `quantity`.
pub fn validate_lines(
    lines: &[OrderLine],
    replacement_product_id: i64,
    quantity: i64,
) -> Result<(), ValidationError> {
    validate_order_lines(lines)?;

    match lines.iter().find(|l| l.product_id == replacement_product_id) {
        None => Err(ValidationError::Mismatch {
            field: "lines".to_string(),
            reason: format!(
                "replacement product {} has no line",
                replacement_product_id
            ),
        }),
        Some(line) if line.quantity != quantity => Err(ValidationError::Mismatch {
            field: "quantity".to_string(),
            reason: format!(
                "line for product {} has quantity {}, expected {}",
                replacement_product_id, line.quantity, quantity
            ),
        }),
        Some(_) => Ok(()),
    }
}

// =============================================================================
// Stock Rule
// =============================================================================

/// Checks that `available` units cover `requested`.
///
/// ```rust
/// use stockwise_core::replacement::ensure_stock;
///
/// assert!(ensure_stock(1, 5, 5).is_ok());
/// assert!(ensure_stock(1, 4, 5).is_err());
/// ```
pub fn ensure_stock(product_id: i64, available: i64, requested: i64) -> CoreResult<()> {
    if available < requested {
        return Err(CoreError::InsufficientStock {
            product_id,
            available,
            requested,
        });
    }
    Ok(())
}

// =============================================================================
// Outcomes
// =============================================================================

/// Result of a completed product replacement.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProductReplacementOutcome {
    pub replacement: Replacement,
    /// Stock left on the replacement product after the decrement.
    pub remaining_stock: i64,
}

/// Result of a completed order replacement.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderReplacementOutcome {
    pub order_code: String,
    pub order: SalesOrderDetail,
    pub replacement: Replacement,
}
