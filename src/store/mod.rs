//! Persistence ports.
//!
//! Services only talk to these traits. `postgres` backs them with sqlx for
//! production; `memory` keeps everything in process for tests and for
//! running without a database.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::aggregates::{
    Cart, Category, Merchant, NewCategory, NewProduct, Product, ProductChanges,
};
use crate::error::Result;

pub use memory::{MemoryCatalogStore, MemorySessionStore};
pub use postgres::{PgCatalogStore, PgSessionStore};

/// Which products a listing covers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProductScope {
    All,
    Merchant(i64),
    Category(i64),
}

#[async_trait]
pub trait CatalogStore: Send + Sync {
    // ── Products ──

    /// Active and inactive products in `scope`, ordered by id.
    async fn list_products(&self, scope: ProductScope) -> Result<Vec<Product>>;
    async fn find_product(&self, id: i64) -> Result<Option<Product>>;
    async fn find_products(&self, ids: &[i64]) -> Result<Vec<Product>>;

    /// Stores the product and its category links in one unit. Category ids
    /// that don't resolve are dropped.
    async fn insert_product(&self, new: NewProduct) -> Result<Product>;

    /// Returns `None` when `id` doesn't resolve.
    async fn update_product(&self, id: i64, changes: ProductChanges) -> Result<Option<Product>>;
    async fn toggle_active(&self, id: i64) -> Result<Option<Product>>;
    async fn deactivate(&self, id: i64) -> Result<Option<Product>>;

    // ── Categories ──

    async fn list_categories(&self) -> Result<Vec<Category>>;
    async fn find_category(&self, id: i64) -> Result<Option<Category>>;
    /// Fails with `AppError::Conflict` when the name is taken.
    async fn insert_category(&self, new: NewCategory) -> Result<Category>;

    // ── Merchants ──

    async fn list_merchants(&self) -> Result<Vec<Merchant>>;
    async fn find_merchant(&self, id: i64) -> Result<Option<Merchant>>;
}

/// Server-side state attached to one session token.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionData {
    #[serde(default)]
    pub cart: Cart,
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Unknown tokens load as an empty session.
    async fn load(&self, token: &str) -> Result<SessionData>;
    async fn save(&self, token: &str, data: &SessionData) -> Result<()>;
}
