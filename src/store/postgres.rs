//! PostgreSQL stores.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{types::Json, PgConnection, PgPool};
use std::collections::{BTreeSet, HashMap};

use super::{CatalogStore, ProductScope, SessionData, SessionStore};
use crate::domain::aggregates::{
    Category, Merchant, NewCategory, NewProduct, Product, ProductChanges,
};
use crate::domain::value_objects::{Name, Price, Quantity, ValueError};
use crate::error::{AppError, Result};

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: i64,
    merchant_id: i64,
    name: String,
    description: Option<String>,
    img_url: Option<String>,
    inventory: i32,
    price: Decimal,
    active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ProductRow {
    fn into_product(self, categories: BTreeSet<i64>) -> Result<Product> {
        let corrupt = |e: ValueError| AppError::Internal(format!("product {} has invalid data: {e}", self.id));
        Ok(Product {
            id: self.id,
            merchant_id: self.merchant_id,
            name: Name::new(self.name.clone()).map_err(corrupt)?,
            description: self.description,
            img_url: self.img_url,
            inventory: Quantity::from_signed(i64::from(self.inventory)).map_err(corrupt)?,
            price: Price::new(self.price).map_err(corrupt)?,
            active: self.active,
            categories,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

pub struct PgCatalogStore {
    pool: PgPool,
}

impl PgCatalogStore {
    pub fn new(pool: PgPool) -> Self { Self { pool } }

    async fn hydrate(&self, rows: Vec<ProductRow>) -> Result<Vec<Product>> {
        let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
        let links = sqlx::query_as::<_, (i64, i64)>(
            "SELECT product_id, category_id FROM product_categories WHERE product_id = ANY($1)",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut by_product: HashMap<i64, BTreeSet<i64>> = HashMap::new();
        for (product_id, category_id) in links {
            by_product.entry(product_id).or_default().insert(category_id);
        }
        rows.into_iter()
            .map(|row| {
                let categories = by_product.remove(&row.id).unwrap_or_default();
                row.into_product(categories)
            })
            .collect()
    }
}

async fn category_ids_for(conn: &mut PgConnection, product_id: i64) -> Result<BTreeSet<i64>> {
    let ids = sqlx::query_scalar::<_, i64>("SELECT category_id FROM product_categories WHERE product_id = $1")
        .bind(product_id)
        .fetch_all(conn)
        .await?;
    Ok(ids.into_iter().collect())
}

/// Links `product_id` to every id in `category_ids` that names an existing
/// category and returns the ids actually linked.
async fn link_categories(conn: &mut PgConnection, product_id: i64, category_ids: &BTreeSet<i64>) -> Result<BTreeSet<i64>> {
    if category_ids.is_empty() {
        return Ok(BTreeSet::new());
    }
    let ids: Vec<i64> = category_ids.iter().copied().collect();
    let linked = sqlx::query_scalar::<_, i64>(
        "INSERT INTO product_categories (product_id, category_id)
         SELECT $1, c.id FROM categories c WHERE c.id = ANY($2)
         ON CONFLICT DO NOTHING
         RETURNING category_id",
    )
    .bind(product_id)
    .bind(&ids)
    .fetch_all(conn)
    .await?;
    Ok(linked.into_iter().collect())
}

#[async_trait]
impl CatalogStore for PgCatalogStore {
    async fn list_products(&self, scope: ProductScope) -> Result<Vec<Product>> {
        let rows = match scope {
            ProductScope::All => {
                sqlx::query_as::<_, ProductRow>("SELECT * FROM products ORDER BY id")
                    .fetch_all(&self.pool)
                    .await?
            }
            ProductScope::Merchant(id) => {
                sqlx::query_as::<_, ProductRow>("SELECT * FROM products WHERE merchant_id = $1 ORDER BY id")
                    .bind(id)
                    .fetch_all(&self.pool)
                    .await?
            }
            ProductScope::Category(id) => {
                sqlx::query_as::<_, ProductRow>(
                    "SELECT p.* FROM products p
                     JOIN product_categories pc ON pc.product_id = p.id
                     WHERE pc.category_id = $1 ORDER BY p.id",
                )
                .bind(id)
                .fetch_all(&self.pool)
                .await?
            }
        };
        self.hydrate(rows).await
    }

    async fn find_product(&self, id: i64) -> Result<Option<Product>> {
        let row = sqlx::query_as::<_, ProductRow>("SELECT * FROM products WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(self.hydrate(row.into_iter().collect()).await?.pop())
    }

    async fn find_products(&self, ids: &[i64]) -> Result<Vec<Product>> {
        let rows = sqlx::query_as::<_, ProductRow>("SELECT * FROM products WHERE id = ANY($1) ORDER BY id")
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;
        self.hydrate(rows).await
    }

    async fn insert_product(&self, new: NewProduct) -> Result<Product> {
        let mut tx = self.pool.begin().await?;

        let merchant_exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM merchants WHERE id = $1)")
            .bind(new.merchant_id)
            .fetch_one(&mut *tx)
            .await?;
        if !merchant_exists {
            return Err(AppError::not_found("Merchant", new.merchant_id));
        }

        let row = sqlx::query_as::<_, ProductRow>(
            "INSERT INTO products (merchant_id, name, description, img_url, inventory, price, active, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, TRUE, NOW(), NOW()) RETURNING *",
        )
        .bind(new.merchant_id)
        .bind(new.name.as_str())
        .bind(&new.description)
        .bind(&new.img_url)
        .bind(new.inventory.as_i32())
        .bind(new.price.amount())
        .fetch_one(&mut *tx)
        .await?;

        let categories = link_categories(&mut tx, row.id, &new.category_ids).await?;
        tx.commit().await?;
        row.into_product(categories)
    }

    async fn update_product(&self, id: i64, mut changes: ProductChanges) -> Result<Option<Product>> {
        let mut tx = self.pool.begin().await?;

        let Some(row) = sqlx::query_as::<_, ProductRow>("SELECT * FROM products WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
        else {
            return Ok(None);
        };

        let current = category_ids_for(&mut tx, id).await?;
        let mut product = row.into_product(current)?;

        if let Some(ids) = changes.category_ids.take() {
            sqlx::query("DELETE FROM product_categories WHERE product_id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            changes.category_ids = Some(link_categories(&mut tx, id, &ids).await?);
        }
        product.apply(changes);

        sqlx::query(
            "UPDATE products SET name = $2, description = $3, img_url = $4, inventory = $5, price = $6, updated_at = $7
             WHERE id = $1",
        )
        .bind(id)
        .bind(product.name.as_str())
        .bind(&product.description)
        .bind(&product.img_url)
        .bind(product.inventory.as_i32())
        .bind(product.price.amount())
        .bind(product.updated_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some(product))
    }

    async fn toggle_active(&self, id: i64) -> Result<Option<Product>> {
        let row = sqlx::query_as::<_, ProductRow>(
            "UPDATE products SET active = NOT active, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(self.hydrate(row.into_iter().collect()).await?.pop())
    }

    async fn deactivate(&self, id: i64) -> Result<Option<Product>> {
        let row = sqlx::query_as::<_, ProductRow>(
            "UPDATE products SET active = FALSE, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(self.hydrate(row.into_iter().collect()).await?.pop())
    }

    async fn list_categories(&self) -> Result<Vec<Category>> {
        let categories = sqlx::query_as::<_, Category>("SELECT * FROM categories ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        Ok(categories)
    }

    async fn find_category(&self, id: i64) -> Result<Option<Category>> {
        let category = sqlx::query_as::<_, Category>("SELECT * FROM categories WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(category)
    }

    async fn insert_category(&self, new: NewCategory) -> Result<Category> {
        let result = sqlx::query_as::<_, Category>(
            "INSERT INTO categories (name, created_at) VALUES ($1, NOW()) RETURNING *",
        )
        .bind(new.name.as_str())
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(category) => Ok(category),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(AppError::Conflict(format!("category {} already exists", new.name)))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn list_merchants(&self) -> Result<Vec<Merchant>> {
        let merchants = sqlx::query_as::<_, Merchant>("SELECT * FROM merchants ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(merchants)
    }

    async fn find_merchant(&self, id: i64) -> Result<Option<Merchant>> {
        let merchant = sqlx::query_as::<_, Merchant>("SELECT * FROM merchants WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(merchant)
    }
}

/// One JSONB row per session token.
pub struct PgSessionStore {
    pool: PgPool,
}

impl PgSessionStore {
    pub fn new(pool: PgPool) -> Self { Self { pool } }
}

#[async_trait]
impl SessionStore for PgSessionStore {
    async fn load(&self, token: &str) -> Result<SessionData> {
        let data = sqlx::query_scalar::<_, Json<SessionData>>("SELECT data FROM sessions WHERE token = $1")
            .bind(token)
            .fetch_optional(&self.pool)
            .await?;
        Ok(data.map(|Json(d)| d).unwrap_or_default())
    }

    async fn save(&self, token: &str, data: &SessionData) -> Result<()> {
        sqlx::query(
            "INSERT INTO sessions (token, data, updated_at) VALUES ($1, $2, NOW())
             ON CONFLICT (token) DO UPDATE SET data = EXCLUDED.data, updated_at = NOW()",
        )
        .bind(token)
        .bind(Json(data))
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
