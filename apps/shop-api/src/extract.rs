//! Request extractors.

use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, FromRequestParts, Request};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::Json;

use shop_core::Customer;

use crate::error::ApiError;
use crate::services::session::{extract_bearer_token, AuthError};
use crate::state::AppState;

/// Extractor that requires a valid bearer token for an existing customer.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(CurrentCustomer(customer): CurrentCustomer) -> String {
///     customer.username
/// }
/// ```
pub struct CurrentCustomer(pub Customer);

impl FromRequestParts<AppState> for CurrentCustomer {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(extract_bearer_token)
            .ok_or(AuthError::MissingToken)?;

        let customer = state.tokens().resolve(state.db(), token).await?;
        Ok(Self(customer))
    }
}

/// `Json<T>` whose rejections use the API error body.
pub struct ValidJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(ApiError::invalid_argument(rejection.body_text())),
        }
    }
}
