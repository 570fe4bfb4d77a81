//! # Domain Types
//!
//! Core domain types used throughout Stockwise.
//!
//! ## Entity Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  Category ─┐                                                            │
//! │  Brand ────┼──► Product ◄──── OrderItem ────► SalesOrder ◄── User       │
//! │  Supplier ─┘      ▲  ▲                            ▲   │                 │
//! │                   │  └── InventoryAdjustment      │   └─► PaymentMethod │
//! │                   │                               │                     │
//! │                   ├──────── Replacement ──────────┤                     │
//! │                   │  original / replacement   original / replacement    │
//! │                   │  product                  order (new order optional)│
//! │                   │                               │                     │
//! │                   └──────── ProductReturn ────────┘ (order optional)    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Sales orders carry both:
//! - `order_id`: integer surrogate key, used for relations
//! - `order_code`: human-facing `ORD-XXXXXXXX`, printed on receipts and reports
//!
//! Monetary columns end in `_cents` and hold integer cents (see [`Money`]).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Users & Roles
// =============================================================================

/// Role of an authenticated user. Drives page access (see [`crate::access`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[ts(export)]
pub enum Role {
    Admin,
    Manager,
    Staff,
}

impl Role {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::Manager => "Manager",
            Role::Staff => "Staff",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Admin" => Ok(Role::Admin),
            "Manager" => Ok(Role::Manager),
            "Staff" => Ok(Role::Staff),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}

/// A back-office user. The password hash never leaves the database layer.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct User {
    pub user_id: i64,
    pub name: String,
    pub email: String,
    pub role: Role,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}

// =============================================================================
// Catalog
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Category {
    pub category_id: i64,
    pub name: String,
    pub description: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Brand {
    pub brand_id: i64,
    pub name: String,
    pub description: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Supplier {
    pub supplier_id: i64,
    pub name: String,
    pub contact_person: Option<String>,
    pub phone_number: Option<String>,
    pub email_address: Option<String>,
    pub address: Option<String>,
    /// Free-text description of what the supplier delivers.
    pub supplied_products: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewSupplier {
    pub name: String,
    pub contact_person: Option<String>,
    pub phone_number: Option<String>,
    pub email_address: Option<String>,
    pub address: Option<String>,
    pub supplied_products: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct PaymentMethod {
    pub payment_method_id: i64,
    pub name: String,
    pub description: Option<String>,
}

// =============================================================================
// Product
// =============================================================================

/// Shelf status of a product.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[ts(export)]
pub enum ProductStatus {
    #[default]
    Available,
    Discontinued,
    #[serde(rename = "Out of Stock")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "Out of Stock"))]
    OutOfStock,
}

/// A product in the inventory.
///
/// `quantity_in_stock` never goes negative: every decrement is conditional
/// and the column carries a `CHECK (quantity_in_stock >= 0)` constraint.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    pub product_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub category_id: i64,
    pub brand_id: i64,
    pub supplier_id: Option<i64>,
    pub quantity_in_stock: i64,
    pub unit_price_cents: i64,
    pub cost_price_cents: i64,
    /// Apparel size (S, M, L, XL, ...).
    pub size: Option<String>,
    pub color: Option<String>,
    pub status: ProductStatus,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    /// Whether `quantity` units can be taken out of stock.
    #[inline]
    pub fn has_stock_for(&self, quantity: i64) -> bool {
        self.quantity_in_stock >= quantity
    }
}

/// Fields needed to insert a product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub description: Option<String>,
    pub category_id: i64,
    pub brand_id: i64,
    pub supplier_id: Option<i64>,
    pub quantity_in_stock: i64,
    pub unit_price_cents: i64,
    pub cost_price_cents: i64,
    pub size: Option<String>,
    pub color: Option<String>,
    pub status: ProductStatus,
}

// =============================================================================
// Sales Orders
// =============================================================================

/// A completed sale.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SalesOrder {
    pub order_id: i64,
    /// Human-facing `ORD-XXXXXXXX` code.
    pub order_code: String,
    /// Cashier who rang up the order.
    pub user_id: i64,
    pub payment_method_id: Option<i64>,
    pub amount_given_cents: i64,
    pub change_cents: i64,
    pub total_price_cents: i64,
    /// Promo discount in whole percent (10 = 10%).
    pub discount_percentage: Option<i64>,
    pub discounted_total_cents: Option<i64>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// A line of a sales order. Price fields are snapshots taken at sale time.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct OrderItem {
    pub order_item_id: i64,
    pub order_id: i64,
    pub product_id: i64,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub total_price_cents: i64,
}

/// A product and quantity to put on a new order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderLine {
    pub product_id: i64,
    pub quantity: i64,
}

/// Input for ringing up a regular sale. Prices come from the product rows.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewSale {
    pub user_id: i64,
    pub payment_method_id: Option<i64>,
    pub lines: Vec<OrderLine>,
    pub amount_given_cents: i64,
}

/// A sales order together with its lines.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SalesOrderDetail {
    #[serde(flatten)]
    pub order: SalesOrder,
    pub items: Vec<OrderItem>,
}

impl SalesOrderDetail {
    /// Whether any line of the order sold `product_id`.
    pub fn contains_product(&self, product_id: i64) -> bool {
        self.items.iter().any(|item| item.product_id == product_id)
    }
}

// =============================================================================
// Inventory Adjustments
// =============================================================================

/// A logged delta to a product's stock count, attributed to a user.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct InventoryAdjustment {
    pub adjustment_id: i64,
    pub product_id: i64,
    /// Signed change: negative when stock leaves the shelf.
    pub quantity_changed: i64,
    pub reason: String,
    /// User who made the adjustment.
    pub adjusted_by: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Returns
// =============================================================================

/// Units a customer brought back, with the reason.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct ProductReturn {
    pub return_id: i64,
    pub order_id: Option<i64>,
    pub product_id: Option<i64>,
    pub quantity: i64,
    pub reason: String,
    pub processed_by_id: Option<i64>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub updated_at: Option<DateTime<Utc>>,
}

// =============================================================================
// Replacements
// =============================================================================

/// A recorded replacement of one product for another against an order.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Replacement {
    pub replace_id: i64,
    pub original_order_id: i64,
    /// Missing on simple swaps recorded without naming the returned product.
    pub original_product_id: Option<i64>,
    pub replacement_product_id: i64,
    /// Set when the replacement generated a new sales order.
    pub replacement_order_id: Option<i64>,
    pub quantity: i64,
    pub reason: String,
    pub processed_by_id: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Replacement {
    pub fn kind(&self) -> ReplacementKind {
        ReplacementKind::from_replacement_order(self.replacement_order_id)
    }
}

/// Whether a replacement produced a new sales order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum ReplacementKind {
    #[serde(rename = "Product Replacement")]
    ProductReplacement,
    #[serde(rename = "Order Replacement")]
    OrderReplacement,
}

impl ReplacementKind {
    pub fn from_replacement_order<T>(replacement_order: Option<T>) -> Self {
        match replacement_order {
            Some(_) => ReplacementKind::OrderReplacement,
            None => ReplacementKind::ProductReplacement,
        }
    }
}

/// Flattened replacement row for list views.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ReplacementSummary {
    pub replace_id: i64,
    pub quantity: i64,
    pub reason: String,
    pub original_product_name: Option<String>,
    pub replacement_product_name: Option<String>,
    /// Order code of the original order.
    pub original_order: Option<String>,
    /// Order code of the generated order, if any.
    pub replacement_order: Option<String>,
    #[serde(rename = "type")]
    pub kind: ReplacementKind,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trips_through_str() {
        for role in [Role::Admin, Role::Manager, Role::Staff] {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
        assert!("admin".parse::<Role>().is_err());
    }

    #[test]
    fn test_product_status_serialization() {
        let json = serde_json::to_string(&ProductStatus::OutOfStock).unwrap();
        assert_eq!(json, "\"Out of Stock\"");
        assert_eq!(ProductStatus::default(), ProductStatus::Available);
    }

    #[test]
    fn test_replacement_kind() {
        assert_eq!(
            ReplacementKind::from_replacement_order(Some(3)),
            ReplacementKind::OrderReplacement
        );
        assert_eq!(
            ReplacementKind::from_replacement_order::<i64>(None),
            ReplacementKind::ProductReplacement
        );
        let json = serde_json::to_string(&ReplacementKind::OrderReplacement).unwrap();
        assert_eq!(json, "\"Order Replacement\"");
    }

    #[test]
    fn test_order_detail_contains_product() {
        let now = Utc::now();
        let detail = SalesOrderDetail {
            order: SalesOrder {
                order_id: 1,
                order_code: "ORD-0000ABCD".to_string(),
                user_id: 1,
                payment_method_id: Some(1),
                amount_given_cents: 1_000,
                change_cents: 0,
                total_price_cents: 1_000,
                discount_percentage: None,
                discounted_total_cents: None,
                created_at: now,
            },
            items: vec![OrderItem {
                order_item_id: 1,
                order_id: 1,
                product_id: 42,
                quantity: 1,
                unit_price_cents: 1_000,
                total_price_cents: 1_000,
            }],
        };
        assert!(detail.contains_product(42));
        assert!(!detail.contains_product(7));

        let json = serde_json::to_value(&detail).unwrap();
        assert_eq!(json["order_code"], "ORD-0000ABCD");
        assert_eq!(json["items"][0]["product_id"], 42);
    }
}
