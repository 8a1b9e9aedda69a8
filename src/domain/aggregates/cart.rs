//! Cart Aggregate
//!
//! The cart lives in session state, not in the catalog. It only remembers
//! which products a visitor wants and how many; prices and names are joined
//! in from the catalog whenever the cart is displayed.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::aggregates::Product;

/// Product id → desired quantity. Serializes as `{"12": 2}`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    entries: BTreeMap<i64, u32>,
}

impl Cart {
    pub fn new() -> Self { Self::default() }

    pub fn quantity_of(&self, product_id: i64) -> Option<u32> { self.entries.get(&product_id).copied() }
    pub fn len(&self) -> usize { self.entries.len() }
    pub fn is_empty(&self) -> bool { self.entries.is_empty() }
    pub fn iter(&self) -> impl Iterator<Item = (i64, u32)> + '_ { self.entries.iter().map(|(id, q)| (*id, *q)) }

    /// Overwrites the quantity for `product_id`. A zero quantity removes the entry.
    pub fn set(&mut self, product_id: i64, quantity: u32) {
        if quantity == 0 {
            self.entries.remove(&product_id);
        } else {
            self.entries.insert(product_id, quantity);
        }
    }

    /// Returns whether an entry was present.
    pub fn remove(&mut self, product_id: i64) -> bool { self.entries.remove(&product_id).is_some() }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CartLine {
    pub product_id: i64,
    pub name: String,
    pub unit_price: Decimal,
    pub quantity: u32,
    pub line_total: Decimal,
    pub active: bool,
}

/// Cart contents joined with live product data.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct CartView {
    pub lines: Vec<CartLine>,
    pub item_count: u64,
    pub subtotal: Decimal,
}

impl CartView {
    /// Products missing from `products` are skipped. `None` when the
    /// subtotal doesn't fit in a `Decimal`.
    pub fn build(cart: &Cart, products: &[Product]) -> Option<Self> {
        let mut view = CartView::default();
        for (product_id, quantity) in cart.iter() {
            let Some(product) = products.iter().find(|p| p.id == product_id) else { continue };
            let line_total = product.price.multiply(quantity)?;
            view.item_count += u64::from(quantity);
            view.subtotal = view.subtotal.checked_add(line_total)?;
            view.lines.push(CartLine {
                product_id,
                name: product.name.to_string(),
                unit_price: product.price.amount(),
                quantity,
                line_total,
                active: product.active,
            });
        }
        Some(view)
    }
}
