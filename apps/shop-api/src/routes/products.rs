//! Catalog routes. Public, read-only.

use axum::extract::{Path, State};
use axum::Json;

use shop_core::{CoreError, Product};

use crate::error::ApiResult;
use crate::state::AppState;

/// `GET /api/products`
pub async fn list(State(state): State<AppState>) -> ApiResult<Json<Vec<Product>>> {
    let products = state.db().products().list().await?;
    Ok(Json(products))
}

/// `GET /api/products/{id}`
pub async fn get(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Product>> {
    let product = state
        .db()
        .products()
        .get_by_id(&id)
        .await?
        .ok_or(CoreError::ProductNotFound(id))?;
    Ok(Json(product))
}
