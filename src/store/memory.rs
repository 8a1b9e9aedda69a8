//! In-process stores.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tokio::sync::RwLock;

use super::{CatalogStore, ProductScope, SessionData, SessionStore};
use crate::domain::aggregates::{
    Category, Merchant, NewCategory, NewProduct, Product, ProductChanges,
};
use crate::error::{AppError, Result};

#[derive(Default)]
struct Tables {
    products: BTreeMap<i64, Product>,
    categories: BTreeMap<i64, Category>,
    merchants: BTreeMap<i64, Merchant>,
    last_id: i64,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }

    fn known_categories(&self, ids: &BTreeSet<i64>) -> BTreeSet<i64> {
        ids.iter().copied().filter(|id| self.categories.contains_key(id)).collect()
    }
}

#[derive(Default)]
pub struct MemoryCatalogStore {
    tables: RwLock<Tables>,
}

impl MemoryCatalogStore {
    pub fn new() -> Self { Self::default() }

    /// Merchants normally arrive through sign-in; this registers one directly.
    pub async fn add_merchant(&self, username: &str, email: Option<&str>) -> Merchant {
        let mut tables = self.tables.write().await;
        let merchant = Merchant {
            id: tables.next_id(),
            username: username.to_string(),
            email: email.map(str::to_string),
            created_at: Utc::now(),
        };
        tables.merchants.insert(merchant.id, merchant.clone());
        merchant
    }
}

#[async_trait]
impl CatalogStore for MemoryCatalogStore {
    async fn list_products(&self, scope: ProductScope) -> Result<Vec<Product>> {
        let tables = self.tables.read().await;
        let products = tables
            .products
            .values()
            .filter(|p| match scope {
                ProductScope::All => true,
                ProductScope::Merchant(id) => p.merchant_id == id,
                ProductScope::Category(id) => p.in_category(id),
            })
            .cloned()
            .collect();
        Ok(products)
    }

    async fn find_product(&self, id: i64) -> Result<Option<Product>> {
        Ok(self.tables.read().await.products.get(&id).cloned())
    }

    async fn find_products(&self, ids: &[i64]) -> Result<Vec<Product>> {
        let tables = self.tables.read().await;
        Ok(ids.iter().filter_map(|id| tables.products.get(id).cloned()).collect())
    }

    async fn insert_product(&self, new: NewProduct) -> Result<Product> {
        let mut tables = self.tables.write().await;
        if !tables.merchants.contains_key(&new.merchant_id) {
            return Err(AppError::not_found("Merchant", new.merchant_id));
        }
        let categories = tables.known_categories(&new.category_ids);
        let id = tables.next_id();
        let product = Product::from_new(id, new, categories);
        tables.products.insert(id, product.clone());
        Ok(product)
    }

    async fn update_product(&self, id: i64, mut changes: ProductChanges) -> Result<Option<Product>> {
        let mut tables = self.tables.write().await;
        if let Some(ids) = changes.category_ids.take() {
            changes.category_ids = Some(tables.known_categories(&ids));
        }
        Ok(tables.products.get_mut(&id).map(|product| {
            product.apply(changes);
            product.clone()
        }))
    }

    async fn toggle_active(&self, id: i64) -> Result<Option<Product>> {
        let mut tables = self.tables.write().await;
        Ok(tables.products.get_mut(&id).map(|product| {
            product.toggle_active();
            product.clone()
        }))
    }

    async fn deactivate(&self, id: i64) -> Result<Option<Product>> {
        let mut tables = self.tables.write().await;
        Ok(tables.products.get_mut(&id).map(|product| {
            product.deactivate();
            product.clone()
        }))
    }

    async fn list_categories(&self) -> Result<Vec<Category>> {
        let mut categories: Vec<Category> = self.tables.read().await.categories.values().cloned().collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    async fn find_category(&self, id: i64) -> Result<Option<Category>> {
        Ok(self.tables.read().await.categories.get(&id).cloned())
    }

    async fn insert_category(&self, new: NewCategory) -> Result<Category> {
        let mut tables = self.tables.write().await;
        if tables.categories.values().any(|c| c.name == new.name.as_str()) {
            return Err(AppError::Conflict(format!("category {} already exists", new.name)));
        }
        let category = Category { id: tables.next_id(), name: new.name.into_inner(), created_at: Utc::now() };
        tables.categories.insert(category.id, category.clone());
        Ok(category)
    }

    async fn list_merchants(&self) -> Result<Vec<Merchant>> {
        Ok(self.tables.read().await.merchants.values().cloned().collect())
    }

    async fn find_merchant(&self, id: i64) -> Result<Option<Merchant>> {
        Ok(self.tables.read().await.merchants.get(&id).cloned())
    }
}

/// Sessions held in a map keyed by token. Concurrent writers for one token
/// race and the last save wins.
#[derive(Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<String, SessionData>>,
}

impl MemorySessionStore {
    pub fn new() -> Self { Self::default() }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self, token: &str) -> Result<SessionData> {
        Ok(self.sessions.read().await.get(token).cloned().unwrap_or_default())
    }

    async fn save(&self, token: &str, data: &SessionData) -> Result<()> {
        self.sessions.write().await.insert(token.to_string(), data.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::{Name, Price, Quantity};
    use rust_decimal::Decimal;

    fn new_product(merchant_id: i64, category_ids: &[i64]) -> NewProduct {
        NewProduct {
            merchant_id,
            name: Name::new("Tent").unwrap(),
            description: None,
            img_url: None,
            inventory: Quantity::new(4),
            price: Price::new(Decimal::new(120, 0)).unwrap(),
            category_ids: category_ids.iter().copied().collect(),
        }
    }

    #[tokio::test]
    async fn test_unknown_categories_are_dropped() {
        let store = MemoryCatalogStore::new();
        let merchant = store.add_merchant("blacksmith", None).await;
        let food = store.insert_category(NewCategory { name: Name::new("food").unwrap() }).await.unwrap();

        let product = store.insert_product(new_product(merchant.id, &[food.id, 999])).await.unwrap();
        assert_eq!(product.categories, BTreeSet::from([food.id]));

        let listed = store.list_products(ProductScope::Category(food.id)).await.unwrap();
        assert_eq!(listed.len(), 1);
    }

    #[tokio::test]
    async fn test_insert_for_unknown_merchant_fails() {
        let store = MemoryCatalogStore::new();
        let err = store.insert_product(new_product(42, &[])).await.unwrap_err();
        assert!(err.is_not_found());
        assert!(store.list_products(ProductScope::All).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_category_conflicts() {
        let store = MemoryCatalogStore::new();
        store.insert_category(NewCategory { name: Name::new("food").unwrap() }).await.unwrap();
        let err = store.insert_category(NewCategory { name: Name::new("food").unwrap() }).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_sessions_are_isolated() {
        let store = MemorySessionStore::new();
        let mut data = SessionData::default();
        data.cart.set(1, 2);
        store.save("a", &data).await.unwrap();
        assert_eq!(store.load("a").await.unwrap().cart.quantity_of(1), Some(2));
        assert!(store.load("b").await.unwrap().cart.is_empty());
    }
}
