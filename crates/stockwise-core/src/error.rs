//! # Error Types
//!
//! Domain-specific error types for stockwise-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  stockwise-core errors (this file)                                     │
//! │  ├── CoreError        - Business rule rejections (typed failures)      │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  stockwise-db errors                                                   │
//! │  └── DbError          - Database failures + Domain(CoreError)          │
//! │                                                                         │
//! │  server errors                                                         │
//! │  └── ApiError         - { success: false, error, code } envelope       │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ApiError → Client       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Business rule rejections.
///
/// These are the *expected* failures of a workflow: the request was well
/// formed but the current state of the inventory does not allow it. They are
/// returned to the caller as typed failures, never raised as panics.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// Product does not exist.
    #[error("Product not found: {0}")]
    ProductNotFound(i64),

    /// Sales order does not exist.
    #[error("Sales order not found: {0}")]
    OrderNotFound(i64),

    /// Not enough stock to take `requested` units out of a product.
    ///
    /// ## User Workflow
    /// ```text
    /// Replace 5 × Sneaker (stock: 3)
    ///      │
    ///      ▼
    /// InsufficientStock { product_id: 12, available: 3, requested: 5 }
    ///      │
    ///      ▼
    /// UI shows: "Not enough stock to replace the product"
    /// ```
    #[error("Insufficient stock for product {product_id}: available {available}, requested {requested}")]
    InsufficientStock {
        product_id: i64,
        available: i64,
        requested: i64,
    },

    /// The named original product was never sold on the original order.
    #[error("Product {product_id} is not part of order {order_id}")]
    ProductNotInOrder { product_id: i64, order_id: i64 },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised before any database work starts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., malformed date).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Two values that must agree do not.
    #[error("{field} does not match: {reason}")]
    Mismatch { field: String, reason: String },

    /// Duplicate value in a collection.
    #[error("{field} '{value}' appears more than once")]
    Duplicate { field: String, value: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;
