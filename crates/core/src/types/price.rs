//! Type-safe price representation using decimal arithmetic.

use core::fmt;
use core::iter::Sum;
use core::ops::{Add, Mul};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A monetary amount.
///
/// The backend reports prices as plain decimal numbers in the store
/// currency; this wrapper keeps arithmetic exact and stops raw floats from
/// leaking into totals.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    /// A price of zero.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a new price from a decimal amount.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Get the underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }
}

impl From<Decimal> for Price {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

impl From<u32> for Price {
    fn from(amount: u32) -> Self {
        Self(Decimal::from(amount))
    }
}

impl Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Mul<u32> for Price {
    type Output = Self;

    fn mul(self, quantity: u32) -> Self {
        Self(self.0 * Decimal::from(quantity))
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_display_two_places() {
        let price = Price::new(Decimal::new(1995, 2));
        assert_eq!(price.to_string(), "19.95");
        assert_eq!(Price::from(5u32).to_string(), "5.00");
    }

    #[test]
    fn test_line_total() {
        let unit = Price::new(Decimal::new(250, 1)); // 25.0
        assert_eq!(unit * 3, Price::new(Decimal::new(750, 1)));
    }

    #[test]
    fn test_sum() {
        let total: Price = [Price::from(1u32), Price::from(2u32), Price::from(3u32)]
            .into_iter()
            .sum();
        assert_eq!(total, Price::from(6u32));
    }

    #[test]
    fn test_deserialize_from_number() {
        let price: Price = serde_json::from_str("149.5").unwrap();
        assert_eq!(price.amount(), Decimal::new(1495, 1));
    }
}
