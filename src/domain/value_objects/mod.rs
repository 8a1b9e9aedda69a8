//! Value objects for the catalog

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

pub const MAX_NAME_LEN: usize = 255;

/// Prices are stored as NUMERIC(12, 2).
pub const PRICE_SCALE: u32 = 2;
pub const PRICE_INTEGER_DIGITS: u32 = 10;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueError {
    #[error("name can't be blank")]
    BlankName,
    #[error("name is longer than {MAX_NAME_LEN} characters")]
    NameTooLong,
    #[error("price must be greater than or equal to 0")]
    NegativePrice,
    #[error("price can't have more than {PRICE_SCALE} decimal places")]
    PriceTooPrecise,
    #[error("price can't have more than {PRICE_INTEGER_DIGITS} digits before the decimal point")]
    PriceTooLarge,
    #[error("inventory must be greater than or equal to 0")]
    NegativeInventory,
    #[error("inventory is too large")]
    InventoryTooLarge,
}

/// Display name of a product or category. Trimmed, never blank.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Name(String);

impl Name {
    pub fn new(value: impl Into<String>) -> Result<Self, ValueError> {
        let value = value.into().trim().to_string();
        if value.is_empty() { return Err(ValueError::BlankName); }
        if value.chars().count() > MAX_NAME_LEN { return Err(ValueError::NameTooLong); }
        Ok(Self(value))
    }
    pub fn as_str(&self) -> &str { &self.0 }
    pub fn into_inner(self) -> String { self.0 }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

/// Unit price, never negative. Bounded so that a line total always fits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price(Decimal);

impl Price {
    pub fn new(amount: Decimal) -> Result<Self, ValueError> {
        if amount.is_sign_negative() && !amount.is_zero() { return Err(ValueError::NegativePrice); }
        if amount.normalize().scale() > PRICE_SCALE { return Err(ValueError::PriceTooPrecise); }
        if amount.trunc() >= Decimal::from(10_i64.pow(PRICE_INTEGER_DIGITS)) { return Err(ValueError::PriceTooLarge); }
        Ok(Self(amount))
    }
    pub fn amount(&self) -> Decimal { self.0 }
    pub fn multiply(&self, qty: u32) -> Option<Decimal> { self.0.checked_mul(Decimal::from(qty)) }
}

/// Stock count or requested amount; non-negative by construction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Quantity(u32);

impl Quantity {
    pub fn new(value: u32) -> Self { Self(value) }

    /// Parses a stock level coming from a request or a database column.
    pub fn from_signed(value: i64) -> Result<Self, ValueError> {
        if value < 0 { return Err(ValueError::NegativeInventory); }
        // Stored as INTEGER.
        if value > i64::from(i32::MAX) { return Err(ValueError::InventoryTooLarge); }
        Ok(Self(value as u32))
    }

    pub fn value(&self) -> u32 { self.0 }
    pub fn as_i32(&self) -> i32 { self.0 as i32 }
    pub fn is_zero(&self) -> bool { self.0 == 0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_trims() {
        let name = Name::new("  Crisp Pickles ").unwrap();
        assert_eq!(name.as_str(), "Crisp Pickles");
    }

    #[test]
    fn test_blank_name_rejected() {
        assert_eq!(Name::new("   "), Err(ValueError::BlankName));
        assert_eq!(Name::new("x".repeat(MAX_NAME_LEN + 1)), Err(ValueError::NameTooLong));
    }

    #[test]
    fn test_price() {
        assert!(Price::new(Decimal::ZERO).is_ok());
        assert_eq!(Price::new(Decimal::new(-1, 2)), Err(ValueError::NegativePrice));
        let p = Price::new(Decimal::new(250, 2)).unwrap();
        assert_eq!(p.multiply(3), Some(Decimal::new(750, 2)));
    }

    #[test]
    fn test_price_bounds() {
        assert_eq!(Price::new(Decimal::new(1999, 3)), Err(ValueError::PriceTooPrecise));
        assert!(Price::new(Decimal::new(2500, 3)).is_ok());
        assert_eq!(Price::new(Decimal::MAX), Err(ValueError::PriceTooLarge));
        assert_eq!(Price::new(Decimal::new(10_000_000_000, 0)), Err(ValueError::PriceTooLarge));

        let top = Price::new(Decimal::new(999_999_999_999, 2)).unwrap();
        assert!(top.multiply(u32::MAX).is_some());
    }

    #[test]
    fn test_quantity_bounds() {
        assert_eq!(Quantity::from_signed(-1), Err(ValueError::NegativeInventory));
        assert_eq!(Quantity::from_signed(i64::from(i32::MAX) + 1), Err(ValueError::InventoryTooLarge));
        let q = Quantity::from_signed(40).unwrap();
        assert_eq!(q.value(), 40);
        assert!(Quantity::default().is_zero());
    }
}
