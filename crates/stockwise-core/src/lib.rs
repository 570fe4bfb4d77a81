//! # stockwise-core: Pure Business Logic for Stockwise
//!
//! Domain types and rules for the inventory / point-of-sale backend, with
//! zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Stockwise Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Web Frontend                                 │   │
//! │  │    Inventory ──► Sales Orders ──► Replacements ──► Reports     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ HTTP / JSON                            │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    apps/server (axum)                           │   │
//! │  │    access guard, routes, error envelope                         │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ stockwise-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │  ┌─────────┐ ┌────────┐ ┌─────────────┐ ┌────────┐ ┌────────┐  │   │
//! │  │  │  types  │ │ money  │ │ replacement │ │ report │ │ access │  │   │
//! │  │  └─────────┘ └────────┘ └─────────────┘ └────────┘ └────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 stockwise-db (Database Layer)                   │   │
//! │  │        SQLite queries, migrations, replacement transactions     │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Entity rows (Product, SalesOrder, Replacement, ...)
//! - [`money`] - Integer-cent money type
//! - [`error`] - Domain error types
//! - [`validation`] - Field-level validators
//! - [`replacement`] - Replacement requests and their business rules
//! - [`order_code`] - Human-facing order code generation
//! - [`report`] - Monthly replacement report aggregation
//! - [`returns`] - Product returns and the monthly defect report
//! - [`access`] - Route → role access table
//!
//! ## Example Usage
//!
//! ```rust
//! use stockwise_core::money::Money;
//!
//! let unit = Money::from_cents(2_499);
//! let line_total = unit * 3;
//! assert_eq!(line_total.cents(), 7_497);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod access;
pub mod error;
pub mod money;
pub mod order_code;
pub mod replacement;
pub mod report;
pub mod returns;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum quantity of a single line in a replacement.
///
/// Guards against typos (1000 instead of 10) reaching the stock counters.
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Maximum number of lines in a replacement order.
pub const MAX_ORDER_LINES: usize = 100;

/// Reason recorded on inventory adjustments created by order replacements.
pub const REPLACEMENT_ORDER_ADJUSTMENT_REASON: &str = "Replacement Order";

/// Reason recorded on inventory adjustments created by regular sales.
pub const SALE_ADJUSTMENT_REASON: &str = "Sale";
