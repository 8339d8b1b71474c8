//! Fixed-precision prices using decimal arithmetic.
//!
//! Prices are entered by operators as text and must match the catalog's
//! storage precision: at most six integer digits and at most two fractional
//! digits (`NUMERIC(8, 2)` in the database).

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Accepted textual form of a price.
static PRICE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{1,6}(\.\d{0,2})?$").expect("Invalid regex"));

/// Errors produced when parsing a price.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PriceError {
    #[error("price must have at most 6 digits before and 2 digits after the decimal point")]
    InvalidFormat,
}

/// A non-negative price with at most two decimal places.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    /// Zero price.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Parse a price from operator input.
    ///
    /// # Errors
    ///
    /// Returns `PriceError::InvalidFormat` if the input does not match the
    /// price pattern (e.g. `"1234567"` or `"12.345"`).
    pub fn parse(input: &str) -> Result<Self, PriceError> {
        let input = input.trim();
        if !PRICE_RE.is_match(input) {
            return Err(PriceError::InvalidFormat);
        }
        let normalized = input.strip_suffix('.').unwrap_or(input);
        Decimal::from_str(normalized)
            .map(|d| Self(d.round_dp(2)))
            .map_err(|_| PriceError::InvalidFormat)
    }

    /// Build a price from a stored decimal, rounding to two places.
    #[must_use]
    pub fn from_decimal(amount: Decimal) -> Self {
        Self(amount.round_dp(2))
    }

    /// The decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl FromStr for Price {
    type Err = PriceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Total of an order line: `quantity × unit_price`.
///
/// Totals are never persisted; every read recomputes them from the stored
/// quantity and unit price. Returns `None` when the product does not fit in
/// a `Decimal`.
#[must_use]
pub fn line_total(quantity: i32, unit_price: Decimal) -> Option<Decimal> {
    Decimal::from(quantity)
        .checked_mul(unit_price)
        .map(|total| total.round_dp(2))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_valid_prices() {
        for input in ["12.50", "999999.99", "0", "7", "12.5", "12."] {
            assert!(Price::parse(input).is_ok(), "expected {input} to parse");
        }
    }

    #[test]
    fn test_rejects_invalid_prices() {
        for input in ["1234567", "12.345", "-1", "", "abc", ".50", "1,50"] {
            assert_eq!(
                Price::parse(input),
                Err(PriceError::InvalidFormat),
                "expected {input} to be rejected"
            );
        }
    }

    #[test]
    fn test_display_uses_two_decimals() {
        let price = Price::parse("12.5").unwrap_or(Price::ZERO);
        assert_eq!(price.to_string(), "12.50");
    }

    #[test]
    fn test_line_total() {
        let unit = Decimal::new(2500, 2);
        assert_eq!(line_total(3, unit), Some(Decimal::new(7500, 2)));
        assert_eq!(line_total(0, unit), Some(Decimal::ZERO));
    }

    #[test]
    fn test_line_total_overflow_is_none() {
        assert_eq!(line_total(i32::MAX, Decimal::MAX), None);
        let largest = Price::parse("999999.99").unwrap_or(Price::ZERO);
        assert!(line_total(i32::MAX, largest.amount()).is_some());
    }
}
