//! # Money Module
//!
//! Provides the `Money` type for rupiah amounts.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Rupiah has no minor unit in day-to-day trade, so every price, total  │
//! │  and ledger amount is a whole number of rupiah stored as i64.         │
//! │                                                                         │
//! │    Size.price ──► SaleItem.price ──► SaleItem.total ──┐               │
//! │                                                       ▼               │
//! │    RawMaterial.unit_price × qty ──► EXPENSE     SalesHeader.total     │
//! │                                                       │               │
//! │                                                       ▼               │
//! │                                                 INCOME amount         │
//! │                                                                         │
//! │  No floats anywhere: sums over a month of sales stay exact.           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use kulino_core::money::Money;
//!
//! let price = Money::from_rupiah(12_500);
//! let total: Money = [price, price * 2].into_iter().sum();
//! assert_eq!(total.rupiah(), 37_500);
//! assert_eq!(total.to_string(), "Rp 37.500");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in whole rupiah.
///
/// Signed so that `income - expense` can go below zero in reports.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from whole rupiah.
    #[inline]
    pub const fn from_rupiah(rupiah: i64) -> Self {
        Money(rupiah)
    }

    /// Returns the value in whole rupiah.
    #[inline]
    pub const fn rupiah(&self) -> i64 {
        self.0
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Multiplies a unit price by a quantity, saturating at the i64 bounds.
    ///
    /// ## Example
    /// ```rust
    /// use kulino_core::money::Money;
    ///
    /// let line_total = Money::from_rupiah(8_000).multiply_quantity(3);
    /// assert_eq!(line_total.rupiah(), 24_000);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0.saturating_mul(qty))
    }

    /// `None` when the product does not fit in i64.
    #[inline]
    pub const fn checked_mul(self, qty: i64) -> Option<Self> {
        match self.0.checked_mul(qty) {
            Some(v) => Some(Money(v)),
            None => None,
        }
    }

    /// `None` when the sum does not fit in i64.
    #[inline]
    pub const fn checked_add(self, other: Self) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(v) => Some(Money(v)),
            None => None,
        }
    }

    /// Sums `values`, or `None` on the first overflow.
    pub fn checked_sum<I: IntoIterator<Item = Money>>(values: I) -> Option<Self> {
        values
            .into_iter()
            .try_fold(Money::zero(), |acc, v| acc.checked_add(v))
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

// Operators saturate. Paths that turn request input into amounts use the
// checked_* methods and report overflow instead.

/// Formats as `Rp 15.000` (dot as thousands separator, as printed on receipts).
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = self.0.unsigned_abs().to_string();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, ch) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push('.');
            }
            grouped.push(ch);
        }
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}Rp {}", sign, grouped)
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0.saturating_add(other.0))
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_add(other.0);
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0.saturating_sub(other.0))
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_sub(other.0);
    }
}

/// Multiplication by quantity.
impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0.saturating_mul(qty))
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
