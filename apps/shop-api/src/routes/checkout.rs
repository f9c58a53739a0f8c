//! Checkout route.

use axum::extract::State;
use axum::Json;

use shop_core::CheckoutReceipt;

use crate::error::ApiResult;
use crate::extract::CurrentCustomer;
use crate::state::AppState;

/// `POST /api/checkout`
///
/// If the client disconnects mid-request the handler future is dropped
/// and the open transaction rolls back with it.
pub async fn checkout(
    State(state): State<AppState>,
    CurrentCustomer(customer): CurrentCustomer,
) -> ApiResult<Json<CheckoutReceipt>> {
    let receipt = state.checkout().checkout(&customer).await?;
    Ok(Json(receipt))
}
