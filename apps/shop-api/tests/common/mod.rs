//! Shared helpers for the integration tests.

#![allow(dead_code)]

use std::path::Path;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;

use shop_api::{router, ApiConfig, AppState};
use shop_core::Product;
use shop_db::Database;

pub const PASSWORD: &str = "password123";

/// Config with cheap password hashing and a fast retry loop.
pub fn test_config() -> ApiConfig {
    ApiConfig {
        database_path: ":memory:".into(),
        jwt_secret: "integration-test-secret".to_string(),
        password_hash_memory_kib: 8,
        password_hash_iterations: 1,
        checkout_timeout: Duration::from_secs(30),
        checkout_max_attempts: 50,
        checkout_retry_backoff: Duration::from_millis(5),
        checkout_max_backoff: Duration::from_millis(50),
        ..ApiConfig::default()
    }
}

pub struct TestApp {
    pub state: AppState,
    pub app: Router,
}

impl TestApp {
    /// App over a private in-memory database.
    pub async fn new() -> Self {
        Self::with_config(test_config()).await
    }

    /// App over a database file with a multi-connection pool.
    pub async fn with_file(path: &Path, max_connections: u32) -> Self {
        Self::with_config(ApiConfig {
            database_path: path.to_path_buf(),
            db_max_connections: max_connections,
            ..test_config()
        })
        .await
    }

    pub async fn with_config(config: ApiConfig) -> Self {
        let db = Database::new(config.db_config()).await.unwrap();
        let state = AppState::new(config, db).unwrap();
        let app = router(state.clone());
        TestApp { state, app }
    }

    pub fn db(&self) -> &Database {
        self.state.db()
    }

    /// Send one request through the router, returning status and JSON body.
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&json).unwrap()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.send(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, token, Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.send(Method::DELETE, uri, token, None).await
    }

    /// Register through the API, credit the balance directly, log in.
    pub async fn register_and_login(&self, username: &str, balance_cents: i64) -> String {
        let (status, _) = self
            .post(
                "/api/register",
                None,
                serde_json::json!({ "username": username, "password": PASSWORD }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);

        if balance_cents > 0 {
            self.db()
                .customers()
                .credit(username, balance_cents)
                .await
                .unwrap();
        }

        let (status, body) = self
            .post(
                "/api/login",
                None,
                serde_json::json!({ "username": username, "password": PASSWORD }),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        body["token"].as_str().unwrap().to_string()
    }

    /// Insert a customer without going through registration; returns a token.
    pub async fn customer_with_token(&self, username: &str, balance_cents: i64) -> String {
        let hash = self.state.passwords().hash(PASSWORD).unwrap();
        self.db()
            .customers()
            .insert(username, &hash, balance_cents)
            .await
            .unwrap();
        self.state.tokens().issue(username).unwrap().token
    }

    pub async fn product(&self, name: &str, price_cents: i64, quantity: i64) -> Product {
        self.db()
            .products()
            .insert(name, "", "", price_cents, quantity)
            .await
            .unwrap()
    }

    pub async fn stock(&self, product_id: &str) -> i64 {
        self.db()
            .products()
            .get_by_id(product_id)
            .await
            .unwrap()
            .unwrap()
            .quantity
    }

    pub async fn balance(&self, username: &str) -> i64 {
        self.db()
            .customers()
            .get_by_username(username)
            .await
            .unwrap()
            .unwrap()
            .balance_cents
    }

    pub async fn add_to_cart(&self, token: &str, product_id: &str, quantity: i64) -> Value {
        let (status, body) = self
            .post(
                "/api/cart",
                Some(token),
                serde_json::json!({ "productId": product_id, "quantity": quantity }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "add to cart failed: {body}");
        body
    }
}
