//! Concurrent requests against a file-backed database with several
//! pooled connections.

mod common;

use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use proptest::prelude::*;
use serde_json::{json, Value};
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::{Connection, SqliteConnection};

use common::{test_config, TestApp};

const POOL_SIZE: u32 = 8;

async fn checkout_all(app: &Arc<TestApp>, tokens: &[String]) -> Vec<(StatusCode, Value)> {
    let handles: Vec<_> = tokens
        .iter()
        .cloned()
        .map(|token| {
            let app = Arc::clone(app);
            tokio::spawn(async move { app.post("/api/checkout", Some(&token), json!({})).await })
        })
        .collect();

    let mut results = Vec::with_capacity(handles.len());
    for handle in handles {
        results.push(handle.await.unwrap());
    }
    results
}

async fn units_ordered(app: &TestApp) -> i64 {
    sqlx::query_scalar::<_, i64>("SELECT COALESCE(SUM(quantity), 0) FROM orders")
        .fetch_one(app.db().pool())
        .await
        .unwrap()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_last_unit_goes_to_exactly_one_customer() {
    let dir = tempfile::tempdir().unwrap();
    let app = Arc::new(TestApp::with_file(&dir.path().join("shop.db"), POOL_SIZE).await);
    let last = app.product("Last One", 999, 1).await;

    let alice = app.customer_with_token("alice", 10_000).await;
    let bob = app.customer_with_token("bob", 10_000).await;
    app.add_to_cart(&alice, &last.id, 1).await;
    app.add_to_cart(&bob, &last.id, 1).await;

    let results = checkout_all(&app, &[alice, bob]).await;

    let winners = results.iter().filter(|(status, _)| *status == StatusCode::OK).count();
    let losers: Vec<_> = results
        .iter()
        .filter(|(status, _)| *status != StatusCode::OK)
        .collect();
    assert_eq!(winners, 1, "{results:?}");
    assert_eq!(losers.len(), 1);
    assert_eq!(losers[0].0, StatusCode::BAD_REQUEST);
    assert_eq!(losers[0].1["code"], "INSUFFICIENT_STOCK");

    assert_eq!(app.stock(&last.id).await, 0);
    assert_eq!(units_ordered(&app).await, 1);
    assert_eq!(
        app.balance("alice").await + app.balance("bob").await,
        20_000 - 999
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_adds_merge_into_one_line() {
    let dir = tempfile::tempdir().unwrap();
    let app = Arc::new(TestApp::with_file(&dir.path().join("shop.db"), POOL_SIZE).await);
    let mug = app.product("Mug", 1299, 10).await;
    let token = app.customer_with_token("alice", 0).await;

    let handles: Vec<_> = (0..10)
        .map(|_| {
            let app = Arc::clone(&app);
            let token = token.clone();
            let product_id = mug.id.clone();
            tokio::spawn(async move { app.add_to_cart(&token, &product_id, 1).await })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap();
    }

    let (_, cart) = app.get("/api/cart", Some(&token)).await;
    assert_eq!(cart.as_array().unwrap().len(), 1);
    assert_eq!(cart[0]["quantity"], 10);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_racing_adds_cannot_overfill_the_cart() {
    let dir = tempfile::tempdir().unwrap();
    let app = Arc::new(TestApp::with_file(&dir.path().join("shop.db"), POOL_SIZE).await);
    let token = app.customer_with_token("alice", 0).await;
    let alice = app.db().customers().get_by_username("alice").await.unwrap().unwrap();

    let room = 2;
    for i in 0..shop_core::MAX_CART_LINES - room {
        let product = app.product(&format!("Filler {i}"), 100, 1).await;
        app.db().cart().add(&alice.id, &product.id, 1).await.unwrap().unwrap();
    }

    let mut handles = Vec::new();
    for i in 0..10 {
        let product = app.product(&format!("Contender {i}"), 100, 1).await;
        let app = Arc::clone(&app);
        let token = token.clone();
        handles.push(tokio::spawn(async move {
            app.post(
                "/api/cart",
                Some(&token),
                json!({ "productId": product.id, "quantity": 1 }),
            )
            .await
        }));
    }

    let mut created = 0;
    for handle in handles {
        let (status, body) = handle.await.unwrap();
        match status {
            StatusCode::CREATED => created += 1,
            StatusCode::BAD_REQUEST => assert_eq!(body["code"], "INVALID_ARGUMENT"),
            other => panic!("unexpected status {other}: {body}"),
        }
    }

    assert_eq!(created, room);
    assert_eq!(
        app.db().cart().count_for_customer(&alice.id).await.unwrap(),
        shop_core::MAX_CART_LINES as i64
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_same_customer_double_submit_charges_once() {
    let dir = tempfile::tempdir().unwrap();
    let app = Arc::new(TestApp::with_file(&dir.path().join("shop.db"), POOL_SIZE).await);
    let mug = app.product("Mug", 1000, 10).await;
    let token = app.customer_with_token("alice", 10_000).await;
    app.add_to_cart(&token, &mug.id, 2).await;

    let results = checkout_all(&app, &[token.clone(), token]).await;

    let codes: Vec<_> = results
        .iter()
        .map(|(status, body)| (*status, body["code"].clone()))
        .collect();
    assert!(codes.contains(&(StatusCode::OK, Value::Null)), "{codes:?}");
    assert!(codes.contains(&(StatusCode::BAD_REQUEST, json!("NO_ITEMS_TO_CHECKOUT"))));

    assert_eq!(app.stock(&mug.id).await, 8);
    assert_eq!(app.balance("alice").await, 8_000);
    assert_eq!(units_ordered(&app).await, 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_checkout_times_out_while_another_writer_holds_the_lock() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("shop.db");
    let app = TestApp::with_config(shop_api::ApiConfig {
        database_path: path.clone(),
        db_max_connections: POOL_SIZE,
        checkout_timeout: Duration::from_millis(300),
        ..test_config()
    })
    .await;
    let mug = app.product("Mug", 1000, 5).await;
    let token = app.customer_with_token("alice", 10_000).await;
    app.add_to_cart(&token, &mug.id, 2).await;

    // a writer outside the pool takes SQLite's write lock and keeps it
    let mut holder = SqliteConnection::connect_with(&SqliteConnectOptions::new().filename(&path))
        .await
        .unwrap();
    sqlx::query("BEGIN IMMEDIATE").execute(&mut holder).await.unwrap();

    let (status, body) = app.post("/api/checkout", Some(&token), json!({})).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE, "{body}");
    assert_eq!(body["code"], "BUSY");

    sqlx::query("ROLLBACK").execute(&mut holder).await.unwrap();
    holder.close().await.unwrap();

    assert_eq!(app.stock(&mug.id).await, 5);
    assert_eq!(app.balance("alice").await, 10_000);
    assert_eq!(units_ordered(&app).await, 0);
    let (_, cart) = app.get("/api/cart", Some(&token)).await;
    assert_eq!(cart.as_array().unwrap().len(), 1);
    assert_eq!(cart[0]["quantity"], 2);

    let (status, receipt) = app.post("/api/checkout", Some(&token), json!({})).await;
    assert_eq!(status, StatusCode::OK, "{receipt}");
    assert_eq!(app.stock(&mug.id).await, 3);
    assert_eq!(app.balance("alice").await, 8_000);
}

struct RaceOutcome {
    final_stock: i64,
    units_ordered: i64,
    units_in_receipts: i64,
    successes: usize,
    stock_failures: usize,
}

async fn race(stock: i64, wants: Vec<i64>) -> RaceOutcome {
    let dir = tempfile::tempdir().unwrap();
    let app = Arc::new(TestApp::with_file(&dir.path().join("shop.db"), POOL_SIZE).await);
    let product = app.product("Contested", 100, stock).await;

    let mut tokens = Vec::with_capacity(wants.len());
    for (i, quantity) in wants.iter().enumerate() {
        let token = app.customer_with_token(&format!("buyer{i}"), 100_000).await;
        app.add_to_cart(&token, &product.id, *quantity).await;
        tokens.push(token);
    }

    let results = checkout_all(&app, &tokens).await;

    let mut outcome = RaceOutcome {
        final_stock: app.stock(&product.id).await,
        units_ordered: units_ordered(&app).await,
        units_in_receipts: 0,
        successes: 0,
        stock_failures: 0,
    };
    for (status, body) in results {
        if status == StatusCode::OK {
            outcome.successes += 1;
            outcome.units_in_receipts += body["orders"]
                .as_array()
                .unwrap()
                .iter()
                .map(|order| order["quantity"].as_i64().unwrap())
                .sum::<i64>();
        } else if body["code"] == "INSUFFICIENT_STOCK" {
            outcome.stock_failures += 1;
        }
    }
    outcome
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(8))]

    #[test]
    fn prop_concurrent_checkouts_never_oversell(
        stock in 0i64..6,
        wants in prop::collection::vec(1i64..4, 2..6),
    ) {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(4)
            .enable_all()
            .build()
            .unwrap();
        let outcome = runtime.block_on(race(stock, wants.clone()));

        prop_assert!(outcome.final_stock >= 0);
        let sold = stock - outcome.final_stock;
        prop_assert!(sold <= stock);
        prop_assert_eq!(sold, outcome.units_ordered);
        prop_assert_eq!(sold, outcome.units_in_receipts);
        // every checkout either bought its line or was refused for stock
        prop_assert_eq!(outcome.successes + outcome.stock_failures, wants.len());
    }
}
