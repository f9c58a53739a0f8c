//! Registration, login and account routes.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use shop_core::{CustomerProfile, Order};

use crate::error::ApiResult;
use crate::extract::{CurrentCustomer, ValidJson};
use crate::services::accounts;
use crate::state::AppState;

/// Body of both `/api/register` and `/api/login`.
#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
}

/// `POST /api/register`
pub async fn register(
    State(state): State<AppState>,
    ValidJson(body): ValidJson<CredentialsRequest>,
) -> ApiResult<(StatusCode, Json<CustomerProfile>)> {
    let profile = accounts::register(&state, body.username, body.password).await?;
    Ok((StatusCode::CREATED, Json(profile)))
}

/// `POST /api/login`
pub async fn login(
    State(state): State<AppState>,
    ValidJson(body): ValidJson<CredentialsRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let issued = accounts::login(&state, body.username, body.password).await?;
    Ok(Json(LoginResponse {
        token: issued.token,
        token_type: "Bearer",
        expires_in: issued.expires_in,
    }))
}

/// `GET /api/account`
pub async fn profile(CurrentCustomer(customer): CurrentCustomer) -> Json<CustomerProfile> {
    Json(customer.profile())
}

/// `GET /api/orders`
pub async fn orders(
    State(state): State<AppState>,
    CurrentCustomer(customer): CurrentCustomer,
) -> ApiResult<Json<Vec<Order>>> {
    Ok(Json(state.db().orders().list_for_customer(&customer.id).await?))
}
