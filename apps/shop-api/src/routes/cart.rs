//! Cart routes. All require a bearer token.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use shop_core::CartLine;

use super::MessageResponse;
use crate::error::ApiResult;
use crate::extract::{CurrentCustomer, ValidJson};
use crate::services::cart;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartRequest {
    pub product_id: String,
    pub quantity: i64,
}

#[derive(Debug, Serialize)]
pub struct ClearCartResponse {
    pub message: String,
    pub removed: u64,
}

/// `GET /api/cart`
pub async fn view(
    State(state): State<AppState>,
    CurrentCustomer(customer): CurrentCustomer,
) -> ApiResult<Json<Vec<CartLine>>> {
    Ok(Json(cart::view(state.db(), &customer.id).await?))
}

/// `POST /api/cart`
pub async fn add(
    State(state): State<AppState>,
    CurrentCustomer(customer): CurrentCustomer,
    ValidJson(body): ValidJson<AddToCartRequest>,
) -> ApiResult<(StatusCode, Json<CartLine>)> {
    let line = cart::add(state.db(), &customer.id, &body.product_id, body.quantity).await?;
    Ok((StatusCode::CREATED, Json(line)))
}

/// `DELETE /api/cart/{line_id}`
pub async fn remove(
    State(state): State<AppState>,
    CurrentCustomer(customer): CurrentCustomer,
    Path(line_id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    cart::remove(state.db(), &customer.id, &line_id).await?;
    Ok(Json(MessageResponse::new("Cart item deleted")))
}

/// `DELETE /api/cart`
pub async fn clear(
    State(state): State<AppState>,
    CurrentCustomer(customer): CurrentCustomer,
) -> ApiResult<Json<ClearCartResponse>> {
    let removed = cart::clear(state.db(), &customer.id).await?;
    Ok(Json(ClearCartResponse {
        message: "Cart cleared".to_string(),
        removed,
    }))
}
