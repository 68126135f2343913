//! # Money
//!
//! Prices and totals are whole cents in an `i64`. Sums are exact; only the
//! display code divides by 100.
//!
//! ```text
//! Product.price ──► CartLine::line_total() ──► Cart::compute_total()
//!                     price × quantity              │
//!                                                   ▼
//!                                     Sale.total ──► ticket "Total:" line
//! ```
//!
//! ```rust
//! use level99_core::money::Money;
//!
//! let zelda = Money::from_cents(5999);
//! assert_eq!(zelda.multiply_quantity(2).to_string(), "$119.98");
//! ```

use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign};

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// An amount in cents.
///
/// Serializes as a bare integer (`2500`) and is stored in `INTEGER` columns.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(transparent))]
#[ts(export)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    #[inline]
    pub const fn cents(self) -> i64 {
        self.0
    }

    #[inline]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// `self × quantity`, saturating instead of wrapping on overflow.
    #[inline]
    pub const fn multiply_quantity(self, quantity: i64) -> Self {
        Money(self.0.saturating_mul(quantity))
    }

    /// Two-decimal amount behind `symbol`, sign first.
    ///
    /// ```rust
    /// use level99_core::money::Money;
    ///
    /// assert_eq!(Money::from_cents(2500).format_with("S/ "), "S/ 25.00");
    /// assert_eq!(Money::from_cents(-550).format_with("$"), "-$5.50");
    /// ```
    pub fn format_with(self, symbol: &str) -> String {
        let sign = if self.is_negative() { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        format!("{sign}{symbol}{}.{:02}", abs / 100, abs % 100)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format_with("$"))
    }
}

impl Add for Money {
    type Output = Money;

    #[inline]
    fn add(self, other: Money) -> Money {
        Money(self.0.saturating_add(other.0))
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Money) {
        *self = *self + other;
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, Add::add)
    }
}
