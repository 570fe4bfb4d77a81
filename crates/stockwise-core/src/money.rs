//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  Order total in floats:                                                 │
//! │    amount_given 100.0 - total 89.7 = 10.299999999999997  ❌             │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents                                            │
//! │    10000 - 8970 = 1030 cents  → change is exactly 10.30                │
//! │                                                                         │
//! │  Every price, total, tender and change column is stored in cents.      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub};
use ts_rs::TS;

/// A monetary value in the smallest currency unit (cents).
///
/// Signed, so inventory write-downs and refunds can be expressed; the
/// replacement workflow itself only ever produces non-negative amounts.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, TS,
)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents.
    ///
    /// ```rust
    /// use stockwise_core::money::Money;
    ///
    /// let price = Money::from_cents(1099);
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Zero.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Multiplies by a line quantity, returning `None` on overflow.
    ///
    /// ```rust
    /// use stockwise_core::money::Money;
    ///
    /// assert_eq!(Money::from_cents(299).checked_mul(3), Some(Money::from_cents(897)));
    /// assert_eq!(Money::from_cents(i64::MAX).checked_mul(2), None);
    /// ```
    #[inline]
    pub fn checked_mul(&self, qty: i64) -> Option<Self> {
        self.0.checked_mul(qty).map(Money)
    }

    /// Applies a whole-percent discount (10 = 10% off), rounding half up.
    ///
    /// ```rust
    /// use stockwise_core::money::Money;
    ///
    /// let total = Money::from_cents(10_000);
    /// assert_eq!(total.apply_percentage_discount(15).cents(), 8_500);
    /// ```
    pub fn apply_percentage_discount(&self, percent: u8) -> Money {
        let discount = (self.0 as i128 * percent as i128 + 50) / 100;
        Money(self.0 - discount as i64)
    }
}

/// Shows `12.50` / `-3.05`. Currency symbols are a frontend concern.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{}{}.{:02}", sign, abs / 100, abs % 100)
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(Money::from_cents(1099).to_string(), "10.99");
        assert_eq!(Money::from_cents(500).to_string(), "5.00");
        assert_eq!(Money::from_cents(-305).to_string(), "-3.05");
        assert_eq!(Money::zero().to_string(), "0.00");
    }

    #[test]
    fn test_change_is_exact() {
        let given = Money::from_cents(10_000);
        let total = Money::from_cents(8_970);
        assert_eq!((given - total).cents(), 1_030);
    }

    #[test]
    fn test_sum_of_lines() {
        let total: Money = [Money::from_cents(250), Money::from_cents(1_000) * 2]
            .into_iter()
            .sum();
        assert_eq!(total.cents(), 2_250);
    }

    #[test]
    fn test_discount_rounds_half_up() {
        // 10% of 1.05 is 0.105 → 0.11 off
        assert_eq!(Money::from_cents(105).apply_percentage_discount(10).cents(), 94);
        assert_eq!(Money::from_cents(999).apply_percentage_discount(0).cents(), 999);
        assert_eq!(Money::from_cents(999).apply_percentage_discount(100).cents(), 0);
    }

    #[test]
    fn test_serializes_as_plain_cents() {
        let json = serde_json::to_string(&Money::from_cents(1234)).unwrap();
        assert_eq!(json, "1234");
    }
}
