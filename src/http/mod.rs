//! HTTP surface: shared state, the route table and router assembly.

pub mod cart;
pub mod catalog;
pub mod products;
pub mod session;

use axum::{
    extract::rejection::JsonRejection,
    handler::Handler,
    middleware,
    routing::{delete, get, patch, post, MethodRouter},
    Json, Router,
};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::error::{AppError, Result};
use crate::services::{CartService, CatalogService, EventPublisher, ProductService};
use crate::store::{CatalogStore, SessionStore};

pub use session::SessionToken;

pub const CART_PATH: &str = "/orders/cart";

#[derive(Clone)]
pub struct AppState {
    pub products: ProductService,
    pub carts: CartService,
    pub catalog: CatalogService,
    pub session_cookie: Arc<str>,
}

impl AppState {
    pub fn new(
        catalog: Arc<dyn CatalogStore>,
        sessions: Arc<dyn SessionStore>,
        events: EventPublisher,
        session_cookie: &str,
    ) -> Self {
        Self {
            products: ProductService::new(catalog.clone(), events),
            carts: CartService::new(catalog.clone(), sessions),
            catalog: CatalogService::new(catalog),
            session_cookie: Arc::from(session_cookie),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Verb {
    Get,
    Post,
    Patch,
    Delete,
}

pub struct Route {
    pub verb: Verb,
    pub path: &'static str,
    handler: MethodRouter<AppState>,
}

impl Route {
    fn new<H, T>(verb: Verb, path: &'static str, handler: H) -> Self
    where
        H: Handler<T, AppState>,
        T: 'static,
    {
        let handler = match verb {
            Verb::Get => get(handler),
            Verb::Post => post(handler),
            Verb::Patch => patch(handler),
            Verb::Delete => delete(handler),
        };
        Self { verb, path, handler }
    }
}

pub fn route_table() -> Vec<Route> {
    use Verb::*;
    vec![
        Route::new(Get, "/health", catalog::health),
        Route::new(Get, "/products", products::index),
        Route::new(Get, "/products/:id", products::show),
        Route::new(Patch, "/products/:id", products::update),
        Route::new(Delete, "/products/:id", products::destroy),
        Route::new(Patch, "/products/:id/active", products::toggle_active),
        Route::new(Get, "/merchants/:id/products", products::merchant_index),
        Route::new(Get, "/merchants/:id/products/new", products::new),
        Route::new(Post, "/merchants/:id/products", products::create),
        Route::new(Get, "/categories/:id/products", products::category_index),
        Route::new(Patch, "/products/cart", cart::add),
        Route::new(Patch, "/cart/update/:id", cart::update_quantity),
        Route::new(Patch, "/remove/:id", cart::remove),
        Route::new(Get, CART_PATH, cart::show),
        Route::new(Get, "/categories", catalog::categories),
        Route::new(Post, "/categories", catalog::create_category),
        Route::new(Get, "/merchants", catalog::merchants),
        Route::new(Get, "/merchants/:id", catalog::merchant),
    ]
}

/// Rejects duplicate (verb, path) pairs and paths the router can't hold
/// side by side. Path parameters are always named `id`.
pub fn validate(routes: &[Route]) -> Result<()> {
    let mut seen = HashSet::new();
    for route in routes {
        let path = route.path;
        if !path.starts_with('/') || (path.len() > 1 && path.ends_with('/')) {
            return Err(AppError::Config(format!("route {path} must start with '/' and not end with one")));
        }
        for segment in path.split('/').skip(1) {
            if segment.is_empty() && path != "/" {
                return Err(AppError::Config(format!("route {path} has an empty segment")));
            }
            if segment.starts_with(':') && segment != ":id" {
                return Err(AppError::Config(format!("route {path} uses parameter {segment}, expected :id")));
            }
        }
        if !seen.insert((route.verb, path)) {
            return Err(AppError::Config(format!("route {:?} {path} is declared twice", route.verb)));
        }
    }
    Ok(())
}

/// Assembles the router from `routes` after validating them.
pub fn build_router_from(state: AppState, routes: Vec<Route>) -> Result<Router> {
    validate(&routes)?;

    let mut by_path: BTreeMap<&'static str, MethodRouter<AppState>> = BTreeMap::new();
    for route in routes {
        let merged = match by_path.remove(route.path) {
            Some(existing) => existing.merge(route.handler),
            None => route.handler,
        };
        by_path.insert(route.path, merged);
    }

    let router = by_path
        .into_iter()
        .fold(Router::new(), |router, (path, handler)| router.route(path, handler))
        .layer(middleware::from_fn_with_state(state.clone(), session::resolve))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    Ok(router)
}

pub fn build_router(state: AppState) -> Result<Router> {
    build_router_from(state, route_table())
}

/// Path ids that aren't numbers can't name a record, so they read as missing
/// rather than as a malformed request.
pub(crate) fn parse_id(raw: &str, what: &str) -> Result<i64> {
    raw.parse().map_err(|_| AppError::NotFound(format!("{what} {raw} not found")))
}

/// Malformed bodies are client errors like any other invalid input.
pub(crate) fn json_body<T>(payload: std::result::Result<Json<T>, JsonRejection>) -> Result<T> {
    payload.map(|Json(body)| body).map_err(|rejection| AppError::Validation(rejection.body_text()))
}
