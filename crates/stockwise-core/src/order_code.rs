//! Human-facing sales order codes.
//!
//! Codes look like `ORD-1A2B3C4D`: the prefix plus the first eight hex
//! digits of a random v4 UUID, uppercased. The database keeps a UNIQUE index
//! on the column; callers retry generation on the rare collision.

use uuid::Uuid;

pub const ORDER_CODE_PREFIX: &str = "ORD-";

const CODE_HEX_LEN: usize = 8;

/// Generates a fresh order code.
///
/// ```rust
/// use stockwise_core::order_code::{generate_order_code, is_valid_order_code};
///
/// let code = generate_order_code();
/// assert!(is_valid_order_code(&code));
/// ```
pub fn generate_order_code() -> String {
    order_code_from_uuid(Uuid::new_v4())
}

/// Derives the order code for a given UUID.
pub fn order_code_from_uuid(id: Uuid) -> String {
    let hex = id.simple().to_string();
    format!(
        "{}{}",
        ORDER_CODE_PREFIX,
        hex[..CODE_HEX_LEN].to_ascii_uppercase()
    )
}

/// Whether `code` has the `ORD-XXXXXXXX` shape.
pub fn is_valid_order_code(code: &str) -> bool {
    code.strip_prefix(ORDER_CODE_PREFIX)
        .map(|rest| {
            rest.len() == CODE_HEX_LEN
                && rest
                    .chars()
                    .all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c))
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_from_known_uuid() {
        let id = Uuid::parse_str("1a2b3c4d-0000-4000-8000-000000000000").unwrap();
        assert_eq!(order_code_from_uuid(id), "ORD-1A2B3C4D");
    }

    #[test]
    fn test_generated_codes_are_well_formed() {
        for _ in 0..50 {
            let code = generate_order_code();
            assert!(is_valid_order_code(&code), "bad code {}", code);
        }
    }

    #[test]
    fn test_is_valid_order_code() {
        assert!(is_valid_order_code("ORD-00FF00FF"));
        assert!(!is_valid_order_code("ORD-00ff00ff"));
        assert!(!is_valid_order_code("ORD-123"));
        assert!(!is_valid_order_code("INV-00FF00FF"));
        assert!(!is_valid_order_code("ORD-00FF00FG"));
    }
}
