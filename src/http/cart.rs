use axum::{
    extract::{rejection::JsonRejection, Path, State},
    response::Redirect,
    Extension, Json,
};
use serde::Deserialize;

use super::{json_body, parse_id, AppState, SessionToken, CART_PATH};
use crate::domain::aggregates::{Cart, CartView};
use crate::error::Result;
use crate::services::QuantityUpdate;

#[derive(Debug, Deserialize)]
pub struct AddToCartRequest {
    pub product_id: i64,
    pub quantity: i64,
}

#[derive(Debug, Deserialize)]
pub struct QuantityRequest {
    pub quantity: i64,
}

/// Stock violations are a 400 here and the cart is left as it was.
pub async fn add(
    State(state): State<AppState>,
    Extension(session): Extension<SessionToken>,
    payload: std::result::Result<Json<AddToCartRequest>, JsonRejection>,
) -> Result<Json<Cart>> {
    let request = json_body(payload)?;
    let cart = state.carts.add(session.as_str(), request.product_id, request.quantity).await?;
    Ok(Json(cart))
}

/// Always lands on the cart page; an update the stock can't cover keeps
/// the previous quantity.
pub async fn update_quantity(
    State(state): State<AppState>,
    Extension(session): Extension<SessionToken>,
    Path(raw): Path<String>,
    payload: std::result::Result<Json<QuantityRequest>, JsonRejection>,
) -> Result<Redirect> {
    let product_id = parse_id(&raw, "Product")?;
    let request = json_body(payload)?;
    if let QuantityUpdate::Kept { reason, .. } =
        state.carts.update_quantity(session.as_str(), product_id, request.quantity).await?
    {
        tracing::debug!(product_id, %reason, "kept previous cart quantity");
    }
    Ok(Redirect::to(CART_PATH))
}

/// An id that isn't in the cart, numeric or not, leaves it unchanged.
pub async fn remove(
    State(state): State<AppState>,
    Extension(session): Extension<SessionToken>,
    Path(raw): Path<String>,
) -> Result<Redirect> {
    if let Ok(product_id) = parse_id(&raw, "Product") {
        state.carts.remove(session.as_str(), product_id).await?;
    }
    Ok(Redirect::to(CART_PATH))
}

pub async fn show(State(state): State<AppState>, Extension(session): Extension<SessionToken>) -> Result<Json<CartView>> {
    Ok(Json(state.carts.lookup(session.as_str()).await?))
}
