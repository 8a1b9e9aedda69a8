//! Session cart mutations, gated on current stock.

use std::sync::Arc;

use crate::domain::aggregates::{Cart, CartView, Product};
use crate::error::{AppError, Result};
use crate::services::inventory::{self, InventoryViolation};
use crate::store::{CatalogStore, SessionStore};

/// Outcome of a quantity update. A rejected update keeps the previous entry.
#[derive(Debug, Clone, PartialEq)]
pub enum QuantityUpdate {
    Applied(Cart),
    Kept { cart: Cart, reason: InventoryViolation },
}

#[derive(Clone)]
pub struct CartService {
    catalog: Arc<dyn CatalogStore>,
    sessions: Arc<dyn SessionStore>,
}

impl CartService {
    pub fn new(catalog: Arc<dyn CatalogStore>, sessions: Arc<dyn SessionStore>) -> Self {
        Self { catalog, sessions }
    }

    async fn product(&self, id: i64) -> Result<Product> {
        self.catalog.find_product(id).await?.ok_or_else(|| AppError::not_found("Product", id))
    }

    /// Sets `cart[product_id] = quantity`. Rejected requests leave the cart untouched.
    pub async fn add(&self, token: &str, product_id: i64, quantity: i64) -> Result<Cart> {
        let product = self.product(product_id).await?;
        let approved = inventory::check(&product, quantity).map_err(|reason| {
            tracing::info!(product_id, quantity, %reason, "add to cart rejected");
            reason
        })?;

        let mut session = self.sessions.load(token).await?;
        session.cart.set(product_id, approved);
        self.sessions.save(token, &session).await?;
        tracing::info!(product_id, quantity = approved, "cart entry set");
        Ok(session.cart)
    }

    /// Like [`CartService::add`], but a stock violation is reported as
    /// [`QuantityUpdate::Kept`] instead of an error.
    pub async fn update_quantity(&self, token: &str, product_id: i64, quantity: i64) -> Result<QuantityUpdate> {
        let product = self.product(product_id).await?;
        let mut session = self.sessions.load(token).await?;

        match inventory::check(&product, quantity) {
            Ok(approved) => {
                session.cart.set(product_id, approved);
                self.sessions.save(token, &session).await?;
                tracing::info!(product_id, quantity = approved, "cart quantity updated");
                Ok(QuantityUpdate::Applied(session.cart))
            }
            Err(reason) => {
                tracing::info!(product_id, quantity, %reason, "cart quantity update ignored");
                Ok(QuantityUpdate::Kept { cart: session.cart, reason })
            }
        }
    }

    /// Idempotent.
    pub async fn remove(&self, token: &str, product_id: i64) -> Result<Cart> {
        let mut session = self.sessions.load(token).await?;
        if session.cart.remove(product_id) {
            self.sessions.save(token, &session).await?;
            tracing::info!(product_id, "cart entry removed");
        }
        Ok(session.cart)
    }

    /// Current cart with live names and prices. Stock is not re-checked.
    pub async fn lookup(&self, token: &str) -> Result<CartView> {
        let cart = self.sessions.load(token).await?.cart;
        if cart.is_empty() {
            return Ok(CartView::default());
        }
        let ids: Vec<i64> = cart.iter().map(|(id, _)| id).collect();
        let products = self.catalog.find_products(&ids).await?;
        CartView::build(&cart, &products)
            .ok_or_else(|| AppError::Validation("cart total is too large".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::{NewProduct, ProductChanges};
    use crate::domain::value_objects::{Name, Price, Quantity};
    use crate::store::{MemoryCatalogStore, MemorySessionStore};
    use rust_decimal::Decimal;
    use std::collections::BTreeSet;

    const TOKEN: &str = "session-a";

    struct Fixture {
        carts: CartService,
        catalog: Arc<MemoryCatalogStore>,
        pickles: i64,
        tent: i64,
    }

    async fn fixture() -> Fixture {
        let catalog = Arc::new(MemoryCatalogStore::new());
        let merchant = catalog.add_merchant("blacksmith", None).await;
        let mut ids = Vec::new();
        for (name, inventory, price) in [("Pickles", 5, 3), ("Tent", 2, 150)] {
            let product = catalog
                .insert_product(NewProduct {
                    merchant_id: merchant.id,
                    name: Name::new(name).unwrap(),
                    description: None,
                    img_url: None,
                    inventory: Quantity::new(inventory),
                    price: Price::new(Decimal::new(price, 0)).unwrap(),
                    category_ids: BTreeSet::new(),
                })
                .await
                .unwrap();
            ids.push(product.id);
        }
        let carts = CartService::new(catalog.clone(), Arc::new(MemorySessionStore::new()));
        Fixture { carts, catalog, pickles: ids[0], tent: ids[1] }
    }

    async fn set_inventory(f: &Fixture, product_id: i64, inventory: u32) {
        f.catalog
            .update_product(product_id, ProductChanges { inventory: Some(Quantity::new(inventory)), ..Default::default() })
            .await
            .unwrap();
    }

    async fn cart(f: &Fixture) -> CartView {
        f.carts.lookup(TOKEN).await.unwrap()
    }

    #[tokio::test]
    async fn test_add_overwrites() {
        let f = fixture().await;
        f.carts.add(TOKEN, f.pickles, 2).await.unwrap();
        let cart = f.carts.add(TOKEN, f.pickles, 3).await.unwrap();
        assert_eq!(cart.len(), 1);
        assert_eq!(cart.quantity_of(f.pickles), Some(3));
    }

    #[tokio::test]
    async fn test_add_out_of_stock_leaves_cart() {
        let f = fixture().await;
        set_inventory(&f, f.pickles, 0).await;
        let err = f.carts.add(TOKEN, f.pickles, 2).await.unwrap_err();
        assert!(matches!(err, AppError::Inventory(InventoryViolation::OutOfStock { .. })));
        assert!(cart(&f).await.lines.is_empty());
    }

    #[tokio::test]
    async fn test_add_rejects_non_positive() {
        let f = fixture().await;
        for quantity in [0, -1] {
            let err = f.carts.add(TOKEN, f.pickles, quantity).await.unwrap_err();
            assert!(matches!(err, AppError::Inventory(InventoryViolation::NonPositiveQuantity { .. })));
        }
    }

    #[tokio::test]
    async fn test_add_unknown_product() {
        let f = fixture().await;
        assert!(f.carts.add(TOKEN, -5, 1).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_pickles_scenario() {
        let f = fixture().await;
        set_inventory(&f, f.pickles, 1).await;

        let err = f.carts.add(TOKEN, f.pickles, 2).await.unwrap_err();
        assert!(matches!(err, AppError::Inventory(InventoryViolation::ExceedsInventory { .. })));
        assert!(cart(&f).await.lines.is_empty());

        let added = f.carts.add(TOKEN, f.pickles, 1).await.unwrap();
        assert_eq!(added.quantity_of(f.pickles), Some(1));

        match f.carts.update_quantity(TOKEN, f.pickles, 4).await.unwrap() {
            QuantityUpdate::Kept { cart, reason } => {
                assert_eq!(cart.quantity_of(f.pickles), Some(1));
                assert!(matches!(reason, InventoryViolation::ExceedsInventory { requested: 4, .. }));
            }
            other => panic!("expected the update to be kept, got {other:?}"),
        }
        assert_eq!(cart(&f).await.lines[0].quantity, 1);
    }

    #[tokio::test]
    async fn test_update_applies_within_stock() {
        let f = fixture().await;
        f.carts.add(TOKEN, f.pickles, 2).await.unwrap();
        let outcome = f.carts.update_quantity(TOKEN, f.pickles, 4).await.unwrap();
        assert!(matches!(outcome, QuantityUpdate::Applied(ref c) if c.quantity_of(f.pickles) == Some(4)));
    }

    #[tokio::test]
    async fn test_update_after_stock_runs_out_keeps_entry() {
        let f = fixture().await;
        f.carts.add(TOKEN, f.pickles, 2).await.unwrap();
        set_inventory(&f, f.pickles, 0).await;
        let outcome = f.carts.update_quantity(TOKEN, f.pickles, 4).await.unwrap();
        assert!(matches!(outcome, QuantityUpdate::Kept { reason: InventoryViolation::OutOfStock { .. }, .. }));
        assert_eq!(cart(&f).await.lines[0].quantity, 2);
    }

    #[tokio::test]
    async fn test_update_to_non_positive_keeps_entry() {
        let f = fixture().await;
        f.carts.add(TOKEN, f.pickles, 2).await.unwrap();
        for quantity in [0, -1] {
            let outcome = f.carts.update_quantity(TOKEN, f.pickles, quantity).await.unwrap();
            assert!(
                matches!(outcome, QuantityUpdate::Kept { reason: InventoryViolation::NonPositiveQuantity { .. }, .. }),
                "quantity {quantity}: {outcome:?}"
            );
        }
        assert_eq!(cart(&f).await.lines[0].quantity, 2);
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let f = fixture().await;
        f.carts.add(TOKEN, f.pickles, 2).await.unwrap();
        f.carts.add(TOKEN, f.tent, 1).await.unwrap();

        let once = f.carts.remove(TOKEN, f.pickles).await.unwrap();
        let twice = f.carts.remove(TOKEN, f.pickles).await.unwrap();
        assert_eq!(once, twice);
        assert_eq!(twice.len(), 1);
        assert_eq!(twice.quantity_of(f.tent), Some(1));
        f.carts.remove(TOKEN, -5).await.unwrap();
    }

    #[tokio::test]
    async fn test_lookup_uses_live_prices() {
        let f = fixture().await;
        f.carts.add(TOKEN, f.pickles, 2).await.unwrap();
        f.carts.add(TOKEN, f.tent, 1).await.unwrap();
        let view = cart(&f).await;
        assert_eq!(view.item_count, 3);
        assert_eq!(view.subtotal, Decimal::new(156, 0));
        assert!(f.carts.lookup("other-session").await.unwrap().lines.is_empty());
    }
}
