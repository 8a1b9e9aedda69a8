//! Product listing, creation, updates and visibility.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

use crate::domain::aggregates::{Category, Merchant, NewProduct, Product, ProductChanges};
use crate::domain::events::ProductEvent;
use crate::domain::value_objects::{Name, Price, Quantity, MAX_NAME_LEN};
use crate::error::{AppError, Result};
use crate::services::events::EventPublisher;
use crate::store::{CatalogStore, ProductScope};

/// Attributes submitted from the new-product form.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct ProductForm {
    #[validate(required, length(min = 1, max = 255))]
    pub name: Option<String>,
    pub description: Option<String>,
    pub img_url: Option<String>,
    #[validate(required, range(min = 0))]
    pub inventory: Option<i64>,
    #[validate(required)]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub category_ids: Vec<i64>,
}

/// Partial update. `category_ids`, when present, replaces the product's categories.
/// A blank `description` or `img_url` clears it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct ProductUpdateForm {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    pub description: Option<String>,
    pub img_url: Option<String>,
    #[validate(range(min = 0))]
    pub inventory: Option<i64>,
    pub price: Option<Decimal>,
    pub category_ids: Option<Vec<i64>>,
}

/// What the new-product page needs to render.
#[derive(Debug, Clone, Serialize)]
pub struct ProductTemplate {
    pub merchant: Merchant,
    pub categories: Vec<Category>,
    pub product: ProductForm,
    pub max_name_length: usize,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

impl ProductForm {
    fn into_new_product(self, merchant_id: i64) -> Result<NewProduct> {
        self.validate()?;
        let missing = |field: &str| AppError::Validation(format!("{field} is required"));
        Ok(NewProduct {
            merchant_id,
            name: Name::new(self.name.ok_or_else(|| missing("name"))?)?,
            description: non_blank(self.description),
            img_url: non_blank(self.img_url),
            inventory: Quantity::from_signed(self.inventory.ok_or_else(|| missing("inventory"))?)?,
            price: Price::new(self.price.ok_or_else(|| missing("price"))?)?,
            category_ids: self.category_ids.into_iter().collect(),
        })
    }
}

impl ProductUpdateForm {
    fn into_changes(self) -> Result<ProductChanges> {
        self.validate()?;
        Ok(ProductChanges {
            name: self.name.map(Name::new).transpose()?,
            description: self.description.map(|d| non_blank(Some(d))),
            img_url: self.img_url.map(|u| non_blank(Some(u))),
            inventory: self.inventory.map(Quantity::from_signed).transpose()?,
            price: self.price.map(Price::new).transpose()?,
            category_ids: self.category_ids.map(|ids| ids.into_iter().collect()),
        })
    }
}

#[derive(Clone)]
pub struct ProductService {
    catalog: Arc<dyn CatalogStore>,
    events: EventPublisher,
}

impl ProductService {
    pub fn new(catalog: Arc<dyn CatalogStore>, events: EventPublisher) -> Self {
        Self { catalog, events }
    }

    /// Fails with `NotFound` when the scoping merchant or category doesn't exist.
    pub async fn list(&self, scope: ProductScope) -> Result<Vec<Product>> {
        match scope {
            ProductScope::All => {}
            ProductScope::Merchant(id) => {
                self.catalog.find_merchant(id).await?.ok_or_else(|| AppError::not_found("Merchant", id))?;
            }
            ProductScope::Category(id) => {
                self.catalog.find_category(id).await?.ok_or_else(|| AppError::not_found("Category", id))?;
            }
        }
        self.catalog.list_products(scope).await
    }

    pub async fn show(&self, id: i64) -> Result<Product> {
        self.catalog.find_product(id).await?.ok_or_else(|| AppError::not_found("Product", id))
    }

    pub async fn new_form(&self, merchant_id: i64) -> Result<ProductTemplate> {
        let merchant = self
            .catalog
            .find_merchant(merchant_id)
            .await?
            .ok_or_else(|| AppError::not_found("Merchant", merchant_id))?;
        Ok(ProductTemplate {
            merchant,
            categories: self.catalog.list_categories().await?,
            product: ProductForm::default(),
            max_name_length: MAX_NAME_LEN,
        })
    }

    /// New products start active. Unknown category ids are ignored.
    pub async fn create(&self, merchant_id: i64, form: ProductForm) -> Result<Product> {
        let new = form.into_new_product(merchant_id)?;
        let product = self.catalog.insert_product(new).await?;
        tracing::info!(
            product_id = product.id,
            merchant_id,
            categories = product.categories.len(),
            "product created"
        );
        self.events.publish(&ProductEvent::Created { product_id: product.id, merchant_id }).await;
        Ok(product)
    }

    pub async fn update(&self, id: i64, form: ProductUpdateForm) -> Result<Product> {
        let changes = form.into_changes()?;
        let product = self
            .catalog
            .update_product(id, changes)
            .await?
            .ok_or_else(|| AppError::not_found("Product", id))?;
        tracing::info!(product_id = id, "product updated");
        self.events.publish(&ProductEvent::Updated { product_id: id }).await;
        Ok(product)
    }

    // TODO: restrict to the owning merchant once sign-in is wired through to this service.
    pub async fn toggle_active(&self, id: i64) -> Result<Product> {
        let product = self
            .catalog
            .toggle_active(id)
            .await?
            .ok_or_else(|| AppError::not_found("Product", id))?;
        tracing::info!(product_id = id, active = product.active, "product visibility toggled");
        self.events
            .publish(&ProductEvent::ActivityToggled { product_id: id, active: product.active })
            .await;
        Ok(product)
    }

    /// Products are never removed; deleting one hides it.
    pub async fn deactivate(&self, id: i64) -> Result<Product> {
        let product = self
            .catalog
            .deactivate(id)
            .await?
            .ok_or_else(|| AppError::not_found("Product", id))?;
        tracing::info!(product_id = id, "product deactivated");
        self.events
            .publish(&ProductEvent::ActivityToggled { product_id: id, active: false })
            .await;
        Ok(product)
    }
}
