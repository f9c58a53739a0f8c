//! # shop-api
//!
//! HTTP/JSON server for the storefront: catalog, accounts, cart and checkout.
//!
//! ## Request Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  POST /api/checkout  Authorization: Bearer <jwt>                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  TraceLayer (per-request span)                                          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  CurrentCustomer extractor ── TokenAuthority::resolve ── 401 on failure │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  routes::checkout ──► CheckoutEngine ──► shop_db::UnitOfWork            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Json(receipt)  or  ApiError { code, message }                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod extract;
pub mod routes;
pub mod services;
pub mod state;

use axum::Router;
use tower_http::trace::TraceLayer;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult, ErrorCode};
pub use state::AppState;

/// Build the complete application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .nest("/api", routes::api_routes())
        .merge(routes::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
