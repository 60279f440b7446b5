//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  Cashier UI sends prices as JSON numbers:                              │
//! │    25000.1 + 0.2 = 25000.300000000003  ❌ WRONG!                        │
//! │                                                                         │
//! │  OUR SOLUTION: Integer minor units (1/100 of the currency unit)        │
//! │    2_500_010 + 20 = 2_500_030                                          │
//! │                                                                         │
//! │  Floats are accepted ONCE, at the input boundary, then rounded.        │
//! │  Every sum in the ledger and in the reports is integer arithmetic.     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use kopi_core::money::Money;
//!
//! // From minor units (preferred)
//! let latte = Money::from_cents(2_500_000); // 25000.00
//!
//! // From a client-supplied number, validated and rounded once
//! let espresso = Money::from_major_f64(18000.0).unwrap();
//!
//! let total = latte.checked_multiply_quantity(2).unwrap() + espresso;
//! assert_eq!(total.cents(), 6_800_000);
//!
//! // JSON carries major units, the same unit the cart sends
//! assert_eq!(serde_json::to_string(&total).unwrap(), "68000");
//! ```

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::ops::{Add, AddAssign};
use ts_rs::TS;

// =============================================================================
// Money Type
// =============================================================================

/// Largest major-unit amount accepted from a float.
///
/// Keeps `major * 100` well inside both `i64` and the 53-bit exact-integer
/// range of `f64`.
const MAX_MAJOR_F64: f64 = 1.0e13;

/// Represents a monetary value in minor units (1/100 of the currency unit).
///
/// ## Design Decisions
/// - **i64 (signed)**: Sums never overflow in practice, and signed math
///   keeps differences (e.g. report deltas) simple
/// - **Single field tuple struct**: Zero-cost abstraction over i64
/// - **Serde**: Serialized in major units (`80000`, `12.5`), the same unit
///   the cashier UI sends in `CartLine.price`
///
/// ## Where Money is Used
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  CartLine.price (f64) ──► from_major_f64 ──► TransactionItem.price     │
/// │                                                  │                      │
/// │                                  × quantity ─────┘                      │
/// │                                       │                                 │
/// │                                       ▼                                 │
/// │                          TransactionItem.subtotal ──► Σ ──► total      │
/// │                                                                         │
/// │  DailySummary.total_sales / MonthlySummary.total_revenue = Σ totals    │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, TS)]
#[ts(export)]
pub struct Money(#[ts(type = "number")] i64);

impl Money {
    /// Creates a Money value from minor units.
    ///
    /// ## Example
    /// ```rust
    /// use kopi_core::money::Money;
    ///
    /// let price = Money::from_cents(2_500_000); // 25000.00
    /// assert_eq!(price.cents(), 2_500_000);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Converts a client-supplied major-unit number into minor units.
    ///
    /// Returns `None` for NaN, infinities and magnitudes beyond
    /// `MAX_MAJOR_F64`. Rounds half away from zero to the nearest minor
    /// unit, so `0.125` becomes `13`.
    ///
    /// ## Example
    /// ```rust
    /// use kopi_core::money::Money;
    ///
    /// assert_eq!(Money::from_major_f64(25000.0).unwrap().cents(), 2_500_000);
    /// assert_eq!(Money::from_major_f64(0.1 + 0.2).unwrap().cents(), 30);
    /// assert!(Money::from_major_f64(f64::NAN).is_none());
    /// ```
    pub fn from_major_f64(major: f64) -> Option<Self> {
        if !major.is_finite() || major.abs() > MAX_MAJOR_F64 {
            return None;
        }
        // Bounded above, so the cast cannot saturate.
        Some(Money((major * 100.0).round() as i64))
    }

    /// Returns the value in minor units.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit portion.
    #[inline]
    pub const fn major(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit portion (always 0-99).
    #[inline]
    pub const fn cents_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns the value as a major-unit float, for JSON consumers that
    /// expect a plain number. Never feed the result back into arithmetic.
    #[inline]
    pub fn as_major_f64(&self) -> f64 {
        self.0 as f64 / 100.0
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

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Multiplies money by a quantity, returning `None` on overflow.
    ///
    /// Used when the quantity comes straight from a request body.
    #[inline]
    pub const fn checked_multiply_quantity(&self, qty: i64) -> Option<Self> {
        match self.0.checked_mul(qty) {
            Some(v) => Some(Money(v)),
            None => None,
        }
    }

    /// Adds two values, returning `None` on overflow.
    #[inline]
    pub const fn checked_add(&self, other: Money) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(v) => Some(Money(v)),
            None => None,
        }
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Plain decimal rendering, e.g. `80000.00`.
///
/// ## Note
/// No currency symbol or grouping: the cashier UI formats for display.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:02}", sign, self.major().abs(), self.cents_part())
    }
}

/// Whole amounts serialize as integers (`80000`), the rest as decimals
/// (`12.5`).
impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.0 % 100 == 0 {
            serializer.serialize_i64(self.0 / 100)
        } else {
            serializer.serialize_f64(self.as_major_f64())
        }
    }
}

/// Accepts any JSON number in major units, rounded once like
/// [`Money::from_major_f64`].
impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let major = f64::deserialize(deserializer)?;
        Money::from_major_f64(major)
            .ok_or_else(|| D::Error::custom(format!("amount out of range: {major}")))
    }
}

/// `#[serde(with = "...")]` adapter for record fields stored as minor
/// units (`price_cents`), so they reach JSON in major units like [`Money`].
pub mod major_units {
    use super::Money;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(cents: &i64, serializer: S) -> Result<S::Ok, S::Error> {
        Money::from_cents(*cents).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
        Money::deserialize(deserializer).map(|m| m.cents())
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
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

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
