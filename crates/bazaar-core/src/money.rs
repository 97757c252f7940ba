//! # Money Module
//!
//! Provides `Money` for monetary values and `Rate` for percentages.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In JavaScript/floating point:                                          │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  Summing thousands of order totals in floats drifts by paise.           │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Paise + Basis Points                             │
//! │    ₹118.00  = Money(11800)                                              │
//! │    18.00 %  = Rate(1800)                                                │
//! │    tax      = (paise × bps + 5000) / 10000   (round half up)            │
//! │                                                                         │
//! │  Every amount has exactly two fractional digits by construction.       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use bazaar_core::money::{Money, Rate};
//!
//! let price: Money = "499.50".parse().unwrap();
//! assert_eq!(price.paise(), 49950);
//!
//! let tax = price.percentage_of(Rate::from_percent(18));
//! assert_eq!(tax.to_string(), "89.91");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;

/// Basis points in 100 %.
pub const BPS_PER_WHOLE: u32 = 10_000;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in paise (1/100 rupee).
///
/// ## Design Decisions
/// - **i64 (signed)**: differences such as `payable - reserved` can go
///   negative and must stay representable
/// - **Single field tuple struct**: zero-cost abstraction over i64
/// - **Stored as INTEGER**: the database never sees a float
///
/// ## Where Money Flows
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Product.cost_price ──► derive_sell_price ──► Product.sell_price        │
/// │         │                                                               │
/// │         └──► CartLineItem.unit_price ──► CartTotals ──► Order totals    │
/// │                                                                         │
/// │  delivered Order.total_amount ──► payable revenue ──► Payout.amount     │
/// │                                              commission ──► net_amount  │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(transparent))]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from paise.
    ///
    /// ```rust
    /// use bazaar_core::money::Money;
    ///
    /// let price = Money::from_paise(11800); // ₹118.00
    /// assert_eq!(price.paise(), 11800);
    /// ```
    #[inline]
    pub const fn from_paise(paise: i64) -> Self {
        Money(paise)
    }

    /// Creates a Money value from whole rupees.
    #[inline]
    pub const fn from_rupees(rupees: i64) -> Self {
        Money(rupees * 100)
    }

    /// Returns the value in paise.
    #[inline]
    pub const fn paise(&self) -> i64 {
        self.0
    }

    /// Returns the whole-rupee portion (truncated toward zero).
    #[inline]
    pub const fn rupees(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the paise portion (always 0-99).
    #[inline]
    pub const fn paise_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Applies a rate to this amount, rounding half away from zero to the
    /// nearest paisa.
    ///
    /// This one function backs tax, sell-price markup and commission, so all
    /// three round identically.
    ///
    /// ```rust
    /// use bazaar_core::money::{Money, Rate};
    ///
    /// // ₹0.25 at 10 % = 2.5 paise → 3 paise
    /// let m = Money::from_paise(25);
    /// assert_eq!(m.percentage_of(Rate::from_percent(10)).paise(), 3);
    /// ```
    pub fn percentage_of(&self, rate: Rate) -> Money {
        // i128 so that large balances times 10_000 cannot overflow
        let magnitude = (self.0.unsigned_abs() as i128 * rate.bps() as i128
            + (BPS_PER_WHOLE / 2) as i128)
            / BPS_PER_WHOLE as i128;
        let magnitude = magnitude as i64;
        if self.0 < 0 {
            Money(-magnitude)
        } else {
            Money(magnitude)
        }
    }

    /// Multiplies money by a quantity.
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// `self + other`, or `None` past the representable range.
    #[inline]
    pub const fn checked_add(&self, other: Money) -> Option<Money> {
        match self.0.checked_add(other.0) {
            Some(paise) => Some(Money(paise)),
            None => None,
        }
    }

    /// `self × qty`, or `None` past the representable range.
    #[inline]
    pub const fn checked_multiply_quantity(&self, qty: i64) -> Option<Money> {
        match self.0.checked_mul(qty) {
            Some(paise) => Some(Money(paise)),
            None => None,
        }
    }

    /// Formats with the rupee sign and Indian digit grouping
    /// (lakh/crore: last three digits, then pairs).
    ///
    /// ```rust
    /// use bazaar_core::money::Money;
    ///
    /// assert_eq!(Money::from_paise(12345678).format_inr(), "₹1,23,456.78");
    /// assert_eq!(Money::from_rupees(999).format_inr(), "₹999.00");
    /// ```
    pub fn format_inr(&self) -> String {
        let digits = self.rupees().unsigned_abs().to_string();
        let grouped = group_indian(&digits);
        let sign = if self.0 < 0 { "-" } else { "" };
        format!("{}₹{}.{:02}", sign, grouped, self.paise_part())
    }
}

fn group_indian(digits: &str) -> String {
    if digits.len() <= 3 {
        return digits.to_string();
    }
    let (head, tail) = digits.split_at(digits.len() - 3);
    let mut groups: Vec<&str> = Vec::new();
    let mut end = head.len();
    while end > 0 {
        let start = end.saturating_sub(2);
        groups.push(&head[start..end]);
        end = start;
    }
    groups.reverse();
    format!("{},{}", groups.join(","), tail)
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Plain two-decimal rendering (`118.00`, `-5.50`).
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(
            f,
            "{}{}.{:02}",
            sign,
            self.rupees().unsigned_abs(),
            self.paise_part()
        )
    }
}

/// Parses decimal rupee strings: `"118"`, `"118.5"`, `"118.50"`, `"-5.50"`.
///
/// More than two fractional digits is rejected rather than rounded.
impl FromStr for Money {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| ValidationError::InvalidFormat {
            field: "amount".to_string(),
            reason: reason.to_string(),
        };

        let s = s.trim();
        let (negative, body) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s),
        };

        let (whole, frac) = match body.split_once('.') {
            Some((w, f)) => (w, f),
            None => (body, ""),
        };

        if whole.is_empty() || !whole.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid("expected digits before the decimal point"));
        }
        if frac.len() > 2 || !frac.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid("at most two decimal places"));
        }

        let rupees: i64 = whole
            .parse()
            .map_err(|_| invalid("amount is too large"))?;
        let paise: i64 = match frac.len() {
            0 => 0,
            1 => frac.parse::<i64>().map_err(|_| invalid("bad fraction"))? * 10,
            _ => frac.parse().map_err(|_| invalid("bad fraction"))?,
        };

        let total = rupees
            .checked_mul(100)
            .and_then(|r| r.checked_add(paise))
            .ok_or_else(|| invalid("amount is too large"))?;

        Ok(Money(if negative { -total } else { total }))
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

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Neg for Money {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Money(-self.0)
    }
}

/// Multiplication by i64 (for quantity calculations).
impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

// =============================================================================
// Rate
// =============================================================================

/// A percentage in basis points (1 bp = 0.01 %).
///
/// Used for both product tax rates and the platform commission rate.
/// `Rate(1800)` is 18 %, `Rate(1000)` is 10 %.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(transparent))]
#[ts(export)]
pub struct Rate(u32);

impl Rate {
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        Rate(bps)
    }

    /// Creates a rate from a whole percentage (`18` → 18 %).
    #[inline]
    pub const fn from_percent(percent: u32) -> Self {
        Rate(percent * 100)
    }

    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn zero() -> Self {
        Rate(0)
    }

    /// Whether the rate lies in 0 %..=100 %.
    #[inline]
    pub const fn is_valid_percentage(&self) -> bool {
        self.0 <= BPS_PER_WHOLE
    }
}

/// Renders as `18.00%`.
impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}%", self.0 / 100, self.0 % 100)
    }
}

/// Parses `"18"`, `"18.5"`, `"18.50"` and an optional trailing `%`.
impl FromStr for Rate {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().trim_end_matches('%').trim();
        let as_money: Money = trimmed.parse().map_err(|_| ValidationError::InvalidFormat {
            field: "rate".to_string(),
            reason: format!("'{}' is not a percentage", s.trim()),
        })?;
        // A percentage with two decimals is numerically the same as paise
        let bps = u32::try_from(as_money.paise()).map_err(|_| ValidationError::OutOfRange {
            field: "rate".to_string(),
            min: 0,
            max: BPS_PER_WHOLE as i64,
        })?;
        Ok(Rate(bps))
    }
}

impl Default for Rate {
    fn default() -> Self {
        Rate::zero()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_paise() {
        let money = Money::from_paise(1099);
        assert_eq!(money.paise(), 1099);
        assert_eq!(money.rupees(), 10);
        assert_eq!(money.paise_part(), 99);
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_paise(11800).to_string(), "118.00");
        assert_eq!(Money::from_paise(5).to_string(), "0.05");
        assert_eq!(Money::from_paise(-550).to_string(), "-5.50");
        assert_eq!(Money::zero().to_string(), "0.00");
    }

    #[test]
    fn test_parse() {
        assert_eq!("118".parse::<Money>().unwrap(), Money::from_paise(11800));
        assert_eq!("118.5".parse::<Money>().unwrap(), Money::from_paise(11850));
        assert_eq!("0.01".parse::<Money>().unwrap(), Money::from_paise(1));
        assert_eq!(" -5.50 ".parse::<Money>().unwrap(), Money::from_paise(-550));

        assert!("".parse::<Money>().is_err());
        assert!("1.234".parse::<Money>().is_err());
        assert!(".50".parse::<Money>().is_err());
        assert!("12a".parse::<Money>().is_err());
        assert!("99999999999999999999".parse::<Money>().is_err());
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_paise(1000);
        let b = Money::from_paise(500);

        assert_eq!((a + b).paise(), 1500);
        assert_eq!((a - b).paise(), 500);
        assert_eq!((b - a).paise(), -500);
        assert_eq!((a * 3).paise(), 3000);
        assert_eq!(vec![a, b, b].into_iter().sum::<Money>().paise(), 2000);
    }

    #[test]
    fn test_percentage_rounds_half_up() {
        // ₹100.00 at 18 % = ₹18.00 exactly
        assert_eq!(Money::from_rupees(100).percentage_of(Rate::from_percent(18)).paise(), 1800);
        // 1 paisa at 50 % = 0.5 → 1
        assert_eq!(Money::from_paise(1).percentage_of(Rate::from_percent(50)).paise(), 1);
        // 1 paisa at 49.99 % = 0.4999 → 0
        assert_eq!(Money::from_paise(1).percentage_of(Rate::from_bps(4999)).paise(), 0);
        // symmetric for negatives
        assert_eq!(Money::from_paise(-1).percentage_of(Rate::from_percent(50)).paise(), -1);
    }

    #[test]
    fn test_checked_arithmetic_at_the_edge() {
        let max = Money::from_paise(i64::MAX);
        assert_eq!(max.checked_add(Money::zero()), Some(max));
        assert_eq!(max.checked_add(Money::from_paise(1)), None);
        assert_eq!(
            Money::from_rupees(5).checked_multiply_quantity(3),
            Some(Money::from_rupees(15))
        );
        assert_eq!(Money::from_paise(i64::MAX / 2 + 1).checked_multiply_quantity(2), None);
    }

    #[test]
    fn test_format_inr() {
        assert_eq!(Money::zero().format_inr(), "₹0.00");
        assert_eq!(Money::from_rupees(1000).format_inr(), "₹1,000.00");
        assert_eq!(Money::from_rupees(100000).format_inr(), "₹1,00,000.00");
        assert_eq!(Money::from_rupees(12345678).format_inr(), "₹1,23,45,678.00");
        assert_eq!(Money::from_paise(-360000).format_inr(), "-₹3,600.00");
    }

    #[test]
    fn test_rate() {
        assert_eq!(Rate::from_percent(18).bps(), 1800);
        assert_eq!(Rate::from_bps(1850).to_string(), "18.50%");
        assert_eq!("10".parse::<Rate>().unwrap(), Rate::from_percent(10));
        assert_eq!("12.5%".parse::<Rate>().unwrap(), Rate::from_bps(1250));
        assert!("-1".parse::<Rate>().is_err());
        assert!(Rate::from_percent(100).is_valid_percentage());
        assert!(!Rate::from_bps(10_001).is_valid_percentage());
    }
}
