use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;

use super::{json_body, parse_id, AppState};
use crate::domain::aggregates::{Category, Merchant};
use crate::error::Result;
use crate::services::{CategoryForm, Storefront};

pub async fn health() -> impl IntoResponse {
    Json(json!({ "status": "healthy", "service": "marketplace" }))
}

pub async fn categories(State(state): State<AppState>) -> Result<Json<Vec<Category>>> {
    Ok(Json(state.catalog.categories().await?))
}

pub async fn create_category(
    State(state): State<AppState>,
    payload: std::result::Result<Json<CategoryForm>, JsonRejection>,
) -> Result<(StatusCode, Json<Category>)> {
    let form = json_body(payload)?;
    let category = state.catalog.create_category(form).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

pub async fn merchants(State(state): State<AppState>) -> Result<Json<Vec<Merchant>>> {
    Ok(Json(state.catalog.merchants().await?))
}

pub async fn merchant(State(state): State<AppState>, Path(raw): Path<String>) -> Result<Json<Storefront>> {
    let id = parse_id(&raw, "Merchant")?;
    Ok(Json(state.catalog.storefront(id).await?))
}
