//! Stock checks applied before any cart mutation.

use thiserror::Error;

use crate::domain::aggregates::Product;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InventoryViolation {
    #[error("quantity must be greater than 0, got {requested}")]
    NonPositiveQuantity { requested: i64 },
    #[error("product {product_id} is out of stock")]
    OutOfStock { product_id: i64 },
    #[error("only {available} of product {product_id} in stock, requested {requested}")]
    ExceedsInventory { product_id: i64, requested: i64, available: u32 },
}

/// Returns the quantity to store for `product`, or why it can't be stored.
///
/// Stock is read, not reserved: it can change between this check and checkout.
pub fn check(product: &Product, requested: i64) -> Result<u32, InventoryViolation> {
    if requested <= 0 {
        return Err(InventoryViolation::NonPositiveQuantity { requested });
    }
    let available = product.inventory.value();
    if available == 0 {
        return Err(InventoryViolation::OutOfStock { product_id: product.id });
    }
    if requested > i64::from(available) {
        return Err(InventoryViolation::ExceedsInventory { product_id: product.id, requested, available });
    }
    Ok(requested as u32)
}
