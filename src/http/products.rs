use axum::{
    extract::{rejection::JsonRejection, Path, State},
    response::{IntoResponse, Redirect, Response},
    Json,
};

use super::{json_body, parse_id, AppState};
use crate::domain::aggregates::Product;
use crate::error::{AppError, Result};
use crate::services::{ProductForm, ProductTemplate, ProductUpdateForm};
use crate::store::ProductScope;

/// Sends a missing parent back to its index instead of a 404.
fn redirect_on_missing<T: IntoResponse>(result: Result<T>, index: &'static str) -> Result<Response> {
    match result {
        Ok(body) => Ok(body.into_response()),
        Err(e) if e.is_not_found() => {
            tracing::debug!(error = %e, %index, "scope not found, redirecting");
            Ok(Redirect::to(index).into_response())
        }
        Err(e) => Err(e),
    }
}

pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<Product>>> {
    Ok(Json(state.products.list(ProductScope::All).await?))
}

pub async fn merchant_index(State(state): State<AppState>, Path(raw): Path<String>) -> Result<Response> {
    let listed = async {
        let id = parse_id(&raw, "Merchant")?;
        state.products.list(ProductScope::Merchant(id)).await.map(Json)
    };
    redirect_on_missing(listed.await, "/merchants")
}

pub async fn category_index(State(state): State<AppState>, Path(raw): Path<String>) -> Result<Response> {
    let listed = async {
        let id = parse_id(&raw, "Category")?;
        state.products.list(ProductScope::Category(id)).await.map(Json)
    };
    redirect_on_missing(listed.await, "/categories")
}

pub async fn show(State(state): State<AppState>, Path(raw): Path<String>) -> Result<Json<Product>> {
    let id = parse_id(&raw, "Product")?;
    Ok(Json(state.products.show(id).await?))
}

pub async fn new(State(state): State<AppState>, Path(raw): Path<String>) -> Result<Response> {
    let template = async {
        let merchant_id = parse_id(&raw, "Merchant")?;
        state.products.new_form(merchant_id).await.map(Json::<ProductTemplate>)
    };
    redirect_on_missing(template.await, "/merchants")
}

pub async fn create(
    State(state): State<AppState>,
    Path(raw): Path<String>,
    payload: std::result::Result<Json<ProductForm>, JsonRejection>,
) -> Result<Response> {
    let form = json_body(payload)?;
    let created = async {
        let merchant_id = parse_id(&raw, "Merchant")?;
        let product = state.products.create(merchant_id, form).await?;
        Ok::<_, AppError>(Redirect::to(&format!("/products/{}", product.id)))
    };
    redirect_on_missing(created.await, "/merchants")
}

pub async fn update(
    State(state): State<AppState>,
    Path(raw): Path<String>,
    payload: std::result::Result<Json<ProductUpdateForm>, JsonRejection>,
) -> Result<Redirect> {
    let id = parse_id(&raw, "Product")?;
    let form = json_body(payload)?;
    let product = state.products.update(id, form).await?;
    Ok(Redirect::to(&format!("/products/{}", product.id)))
}

pub async fn destroy(State(state): State<AppState>, Path(raw): Path<String>) -> Result<Redirect> {
    state.products.deactivate(parse_id(&raw, "Product")?).await?;
    Ok(Redirect::to("/products"))
}

pub async fn toggle_active(State(state): State<AppState>, Path(raw): Path<String>) -> Result<Redirect> {
    state.products.toggle_active(parse_id(&raw, "Product")?).await?;
    Ok(Redirect::to("/products"))
}
