//! # Validation Module
//!
//! Input validation utilities for Stockwise.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Frontend (TypeScript)                                        │
//! │  ├── Basic format checks (empty, length)                               │
//! │  └── Immediate user feedback                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: HTTP handler (Rust)                                          │
//! │  ├── Type validation (JSON deserialization)                            │
//! │  └── THIS MODULE: field rules, run before any transaction opens        │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / UNIQUE / foreign key constraints                       │
//! │  └── CHECK (quantity_in_stock >= 0)                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use stockwise_core::validation::{validate_quantity, validate_reason};
//!
//! validate_quantity(5).unwrap();
//! assert_eq!(validate_reason("Defective", None).unwrap(), "Defective");
//! ```

use chrono::NaiveDate;

use crate::error::ValidationError;
use crate::MAX_ITEM_QUANTITY;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Reason value that requires a free-text detail.
pub const OTHER_REASON: &str = "Other";

const MAX_REASON_LEN: usize = 500;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a required free-text field and returns it trimmed.
///
/// ```rust
/// use stockwise_core::validation::validate_required_text;
///
/// assert_eq!(validate_required_text("name", "  Sneaker ", 200).unwrap(), "Sneaker");
/// assert!(validate_required_text("name", "   ", 200).is_err());
/// ```
pub fn validate_required_text(field: &str, value: &str, max: usize) -> ValidationResult<String> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(value.to_string())
}

/// Resolves the reason recorded on a replacement.
///
/// ## Rules
/// - Must not be empty
/// - `Other` requires a non-empty `detail`, which is stored instead of the
///   literal `Other`
///
/// ```text
/// reason = "Defective"               → "Defective"
/// reason = "Other", detail = "Torn"  → "Torn"
/// reason = "Other", detail = None    → Error: detail is required
/// ```
pub fn validate_reason(reason: &str, detail: Option<&str>) -> ValidationResult<String> {
    let reason = validate_required_text("reason", reason, MAX_REASON_LEN)?;

    if reason == OTHER_REASON {
        return validate_required_text("reason detail", detail.unwrap_or_default(), MAX_REASON_LEN);
    }

    Ok(reason)
}

/// Minimal email shape check: `local@domain.tld`.
pub fn validate_email(email: &str) -> ValidationResult<String> {
    let email = validate_required_text("email", email, 254)?;

    let well_formed = email
        .split_once('@')
        .map(|(local, domain)| !local.is_empty() && domain.contains('.') && !domain.starts_with('.'))
        .unwrap_or(false);

    if !well_formed {
        return Err(ValidationError::InvalidFormat {
            field: "email".to_string(),
            reason: "must look like name@example.com".to_string(),
        });
    }

    Ok(email.to_lowercase())
}

/// Parses a `YYYY-MM-DD` date.
pub fn validate_date(field: &str, value: &str) -> ValidationResult<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
        ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "expected YYYY-MM-DD".to_string(),
        }
    })
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a quantity value.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_ITEM_QUANTITY (999)
///
/// ## User Workflow
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Replacements: Replace Product                                          │
/// │                                                                         │
/// │  User enters quantity: 5                                               │
/// │       │                                                                 │
/// │       ▼                                                                 │
/// │  validate_quantity(5) ← THIS FUNCTION                                  │
/// │       │                                                                 │
/// │       ├── qty <= 0? → Error: "quantity must be positive"               │
/// │       │                                                                 │
/// │       ├── qty > 999? → Error: "quantity must be between 1 and 999"     │
/// │       │                                                                 │
/// │       └── OK → open the replacement transaction                        │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a non-negative amount in cents.
///
/// ```rust
/// use stockwise_core::validation::validate_cents;
///
/// assert!(validate_cents("total_price", 1099).is_ok());
/// assert!(validate_cents("total_price", 0).is_ok());
/// assert!(validate_cents("total_price", -100).is_err());
/// ```
pub fn validate_cents(field: &str, cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates a discount in whole percent.
pub fn validate_discount_percentage(percent: i64) -> ValidationResult<u8> {
    u8::try_from(percent)
        .ok()
        .filter(|p| *p <= 100)
        .ok_or_else(|| ValidationError::OutOfRange {
            field: "discount_percentage".to_string(),
            min: 0,
            max: 100,
        })
}

// =============================================================================
// Unit Tests
// =============================================================================
