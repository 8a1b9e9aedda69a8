//! Categories and merchant storefronts.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

use crate::domain::aggregates::{Category, Merchant, NewCategory, Product};
use crate::domain::value_objects::Name;
use crate::error::{AppError, Result};
use crate::store::{CatalogStore, ProductScope};

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CategoryForm {
    #[validate(required, length(min = 1, max = 255))]
    pub name: Option<String>,
}

/// A merchant together with everything it sells.
#[derive(Debug, Clone, Serialize)]
pub struct Storefront {
    pub merchant: Merchant,
    pub products: Vec<Product>,
}

#[derive(Clone)]
pub struct CatalogService {
    catalog: Arc<dyn CatalogStore>,
}

impl CatalogService {
    pub fn new(catalog: Arc<dyn CatalogStore>) -> Self { Self { catalog } }

    pub async fn categories(&self) -> Result<Vec<Category>> {
        self.catalog.list_categories().await
    }

    pub async fn create_category(&self, form: CategoryForm) -> Result<Category> {
        form.validate()?;
        let name = Name::new(form.name.unwrap_or_default())?;
        let category = self.catalog.insert_category(NewCategory { name }).await?;
        tracing::info!(category_id = category.id, name = %category.name, "category created");
        Ok(category)
    }

    pub async fn merchants(&self) -> Result<Vec<Merchant>> {
        self.catalog.list_merchants().await
    }

    pub async fn storefront(&self, merchant_id: i64) -> Result<Storefront> {
        let merchant = self
            .catalog
            .find_merchant(merchant_id)
            .await?
            .ok_or_else(|| AppError::not_found("Merchant", merchant_id))?;
        let products = self.catalog.list_products(ProductScope::Merchant(merchant_id)).await?;
        Ok(Storefront { merchant, products })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryCatalogStore;

    fn form(name: Option<&str>) -> CategoryForm {
        CategoryForm { name: name.map(str::to_string) }
    }

    #[tokio::test]
    async fn test_create_and_list_categories() {
        let service = CatalogService::new(Arc::new(MemoryCatalogStore::new()));
        service.create_category(form(Some("lifestyle"))).await.unwrap();
        service.create_category(form(Some(" food "))).await.unwrap();
        let names: Vec<String> = service.categories().await.unwrap().into_iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["food", "lifestyle"]);
    }

    #[tokio::test]
    async fn test_category_name_rules() {
        let service = CatalogService::new(Arc::new(MemoryCatalogStore::new()));
        assert!(matches!(service.create_category(form(None)).await, Err(AppError::Validation(_))));
        assert!(matches!(service.create_category(form(Some("  "))).await, Err(AppError::Validation(_))));
        service.create_category(form(Some("food"))).await.unwrap();
        assert!(matches!(service.create_category(form(Some("food"))).await, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_storefront() {
        let store = Arc::new(MemoryCatalogStore::new());
        let merchant = store.add_merchant("blacksmith", None).await;
        let service = CatalogService::new(store);
        let storefront = service.storefront(merchant.id).await.unwrap();
        assert_eq!(storefront.merchant.username, "blacksmith");
        assert!(storefront.products.is_empty());
        assert_eq!(service.merchants().await.unwrap().len(), 1);
        assert!(service.storefront(-5).await.unwrap_err().is_not_found());
    }
}
