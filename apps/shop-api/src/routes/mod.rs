//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                - Liveness
//! GET    /health/ready          - Readiness (database ping)
//!
//! # Catalog
//! GET    /api/products          - Product listing
//! GET    /api/products/{id}     - Product detail
//!
//! # Accounts
//! POST   /api/register          - Create account
//! POST   /api/login             - Exchange credentials for a bearer token
//! GET    /api/account           - Profile and balance (auth)
//! GET    /api/orders            - Order history, newest first (auth)
//!
//! # Cart (auth)
//! GET    /api/cart              - List lines
//! POST   /api/cart              - Add or merge a line
//! DELETE /api/cart              - Remove every line
//! DELETE /api/cart/{lineId}     - Remove one line
//!
//! # Checkout (auth)
//! POST   /api/checkout          - Purchase the whole cart
//! ```

pub mod account;
pub mod cart;
pub mod checkout;
pub mod health;
pub mod products;

use axum::routing::{delete, get, post};
use axum::Router;
use serde::Serialize;

use crate::state::AppState;

/// Body for endpoints that only confirm an action.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        MessageResponse {
            message: message.into(),
        }
    }
}

/// Create the `/api` router.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(products::list))
        .route("/products/{id}", get(products::get))
        .route("/register", post(account::register))
        .route("/login", post(account::login))
        .route("/account", get(account::profile))
        .route("/orders", get(account::orders))
        .route("/cart", get(cart::view).post(cart::add).delete(cart::clear))
        .route("/cart/{line_id}", delete(cart::remove))
        .route("/checkout", post(checkout::checkout))
}

/// Create the health check router.
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::live))
        .route("/health/ready", get(health::ready))
}
