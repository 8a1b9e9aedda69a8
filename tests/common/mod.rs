//! Shared harness for the HTTP tests. Everything runs against the in-memory
//! stores, so no database is needed.

#![allow(dead_code)]

use std::collections::BTreeSet;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use rust_decimal::Decimal;
use tower::ServiceExt;

use marketplace::domain::aggregates::{Category, Merchant, NewCategory, NewProduct, Product, ProductChanges};
use marketplace::domain::value_objects::{Name, Price, Quantity};
use marketplace::services::EventPublisher;
use marketplace::store::{CatalogStore, MemoryCatalogStore, MemorySessionStore, ProductScope};
use marketplace::{build_router, AppState};

pub const COOKIE_NAME: &str = "storefront_session";

pub struct TestApp {
    pub router: Router,
    pub catalog: Arc<MemoryCatalogStore>,
    pub merchant: Merchant,
    pub food: Category,
    pub lifestyle: Category,
    pub pickles: Product,
    pub tent: Product,
}

impl TestApp {
    pub async fn new() -> Self {
        let catalog = Arc::new(MemoryCatalogStore::new());
        let merchant = catalog.add_merchant("blacksmith", Some("smith@example.com")).await;
        let food = catalog.insert_category(NewCategory { name: Name::new("food").unwrap() }).await.unwrap();
        let lifestyle = catalog.insert_category(NewCategory { name: Name::new("lifestyle").unwrap() }).await.unwrap();

        let pickles = seed_product(&catalog, merchant.id, "Pickles", 10, 3, &[food.id]).await;
        let tent = seed_product(&catalog, merchant.id, "Tent", 5, 120, &[lifestyle.id]).await;

        let state = AppState::new(
            catalog.clone(),
            Arc::new(MemorySessionStore::new()),
            EventPublisher::disabled(),
            COOKIE_NAME,
        );
        let router = build_router(state).expect("route table is valid");

        Self { router, catalog, merchant, food, lifestyle, pickles, tent }
    }

    pub async fn send(&self, method: Method, uri: &str, body: Option<serde_json::Value>, cookie: Option<&str>) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn get(&self, uri: &str) -> Response {
        self.send(Method::GET, uri, None, None).await
    }

    pub async fn set_inventory(&self, product_id: i64, inventory: u32) {
        self.catalog
            .update_product(product_id, ProductChanges { inventory: Some(Quantity::new(inventory)), ..Default::default() })
            .await
            .unwrap()
            .expect("product exists");
    }

    pub async fn product(&self, id: i64) -> Product {
        self.catalog.find_product(id).await.unwrap().expect("product exists")
    }

    pub async fn product_count(&self) -> usize {
        self.catalog.list_products(ProductScope::All).await.unwrap().len()
    }

    /// Cart entries for the session behind `cookie`, as served by the cart page.
    pub async fn cart_lines(&self, cookie: &str) -> Vec<(i64, u64)> {
        let response = self.send(Method::GET, "/orders/cart", None, Some(cookie)).await;
        assert_eq!(response.status(), StatusCode::OK);
        let view = body_json(response).await;
        view["lines"]
            .as_array()
            .unwrap()
            .iter()
            .map(|line| (line["product_id"].as_i64().unwrap(), line["quantity"].as_u64().unwrap()))
            .collect()
    }

    /// Opens a session and returns its cookie.
    pub async fn open_session(&self) -> String {
        let response = self.get("/orders/cart").await;
        session_cookie(&response).expect("a session cookie is issued")
    }
}

async fn seed_product(
    catalog: &MemoryCatalogStore,
    merchant_id: i64,
    name: &str,
    inventory: u32,
    price: i64,
    category_ids: &[i64],
) -> Product {
    catalog
        .insert_product(NewProduct {
            merchant_id,
            name: Name::new(name).unwrap(),
            description: None,
            img_url: None,
            inventory: Quantity::new(inventory),
            price: Price::new(Decimal::new(price, 0)).unwrap(),
            category_ids: category_ids.iter().copied().collect::<BTreeSet<_>>(),
        })
        .await
        .unwrap()
}

pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap_or_else(|_| serde_json::json!({ "raw": String::from_utf8_lossy(&bytes).to_string() }))
}

/// The `name=value` part of a `Set-Cookie` header for the session cookie.
pub fn session_cookie(response: &Response) -> Option<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|v| v.split(';').next())
        .find(|pair| pair.starts_with(COOKIE_NAME))
        .map(str::to_string)
}

pub fn location(response: &Response) -> &str {
    response.headers().get(header::LOCATION).and_then(|v| v.to_str().ok()).unwrap_or_default()
}
