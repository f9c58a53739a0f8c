//! # Checkout Engine
//!
//! Turns a customer's cart into orders, all or nothing.
//!
//! ## One Attempt
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  UnitOfWork::begin                                                      │
//! │       │                                                                 │
//! │       ├── lock_customer          write lock first, fresh snapshot       │
//! │       ├── cart_lines             empty → NoItemsToCheckout              │
//! │       ├── product × N            authoritative prices                   │
//! │       ├── Σ price × qty          checked, overflow → INVALID_ARGUMENT   │
//! │       ├── balance < total?       → InsufficientBalance                  │
//! │       │   ─────────── nothing has changed up to here ───────────        │
//! │       ├── reserve_stock × N      CAS; miss → InsufficientStock          │
//! │       ├── insert_order × N       unit price frozen                      │
//! │       ├── debit_balance          conditional on balance >= total        │
//! │       ├── delete_cart_lines      only the lines read above              │
//! │       ▼                                                                 │
//! │  commit ── any earlier `?` drops the UnitOfWork and rolls back          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Retries
//! An attempt that loses a write-lock race (`DbError::Busy`) is thrown away
//! and run again after a jittered exponential delay, up to `max_attempts`.
//! ```text
//!   delay₁ ≈ retry_backoff ± 50%
//!   delayₙ ≈ min(delayₙ₋₁ × 2, max_backoff) ± 50%
//!   no delay once `timeout` has elapsed → last error is returned
//! ```
//! The jitter keeps checkouts that collided once from colliding again in
//! lockstep. All attempts together run under `timeout`; when it fires, the
//! in-flight attempt future is dropped, which rolls its transaction back.

use std::time::Duration;

use backoff::backoff::Backoff;
use backoff::ExponentialBackoff;
use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use shop_core::{CheckoutReceipt, CoreError, Customer, Money, Order};
use shop_db::{Database, DbError};

/// Timeout and retry settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckoutPolicy {
    pub timeout: Duration,
    pub max_attempts: u32,
    pub retry_backoff: Duration,
    pub max_backoff: Duration,
}

impl CheckoutPolicy {
    /// Fresh retry schedule for one checkout.
    pub fn backoff(&self) -> ExponentialBackoff {
        let mut backoff = ExponentialBackoff {
            initial_interval: self.retry_backoff,
            max_interval: self.max_backoff.max(self.retry_backoff),
            multiplier: 2.0,
            max_elapsed_time: Some(self.timeout),
            ..Default::default()
        };
        // starts the elapsed clock and the first interval from initial_interval
        backoff.reset();
        backoff
    }
}

/// Checkout failures.
#[derive(Debug, thiserror::Error)]
pub enum CheckoutError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Db(#[from] DbError),

    #[error("Customer no longer exists")]
    UnknownCustomer,

    #[error("Checkout did not finish within {0:?}")]
    TimedOut(Duration),
}

impl CheckoutError {
    /// Whether running the whole attempt again may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, CheckoutError::Db(err) if err.is_retryable())
    }
}

/// Runs checkouts against the database.
#[derive(Debug, Clone)]
pub struct CheckoutEngine {
    db: Database,
    policy: CheckoutPolicy,
}

impl CheckoutEngine {
    pub fn new(db: Database, policy: CheckoutPolicy) -> Self {
        CheckoutEngine { db, policy }
    }

    /// Purchase everything in `customer`'s cart.
    pub async fn checkout(&self, customer: &Customer) -> Result<CheckoutReceipt, CheckoutError> {
        match tokio::time::timeout(self.policy.timeout, self.checkout_with_retry(customer)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    customer_id = %customer.id,
                    timeout_ms = self.policy.timeout.as_millis() as u64,
                    "Checkout timed out"
                );
                Err(CheckoutError::TimedOut(self.policy.timeout))
            }
        }
    }

    async fn checkout_with_retry(
        &self,
        customer: &Customer,
    ) -> Result<CheckoutReceipt, CheckoutError> {
        let mut backoff = self.policy.backoff();
        let mut attempt = 1;
        loop {
            match self.attempt(customer).await {
                Err(err) if err.is_retryable() && attempt < self.policy.max_attempts => {
                    let Some(delay) = backoff.next_backoff() else {
                        return Err(err);
                    };
                    warn!(
                        customer_id = %customer.id,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Checkout lost a lock race, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                result => return result,
            }
        }
    }

    async fn attempt(&self, customer: &Customer) -> Result<CheckoutReceipt, CheckoutError> {
        let mut uow = self.db.begin_unit_of_work().await?;

        if !uow.lock_customer(&customer.id).await? {
            return Err(CheckoutError::UnknownCustomer);
        }

        let lines = uow.cart_lines(&customer.id).await?;
        if lines.is_empty() {
            return Err(CoreError::EmptyCart.into());
        }

        let mut priced = Vec::with_capacity(lines.len());
        for line in &lines {
            let product = uow
                .product(&line.product_id)
                .await?
                .ok_or_else(|| CoreError::ProductNotFound(line.product_id.clone()))?;
            let line_total = product
                .price()
                .checked_mul_quantity(line.quantity)
                .ok_or(CoreError::AmountOverflow)?;
            priced.push((line, product, line_total));
        }

        let total = Money::checked_sum(priced.iter().map(|(_, _, line_total)| *line_total))
            .ok_or(CoreError::AmountOverflow)?;

        let balance = uow
            .customer_balance(&customer.id)
            .await?
            .ok_or(CheckoutError::UnknownCustomer)?;
        if total.cents() > balance {
            return Err(CoreError::InsufficientBalance {
                required: total.cents(),
                available: balance,
            }
            .into());
        }

        let checkout_id = Uuid::new_v4().to_string();
        let now = Utc::now();
        let mut orders = Vec::with_capacity(priced.len());

        for (line, product, line_total) in &priced {
            if !uow.reserve_stock(&product.id, line.quantity).await? {
                let available = uow
                    .product(&product.id)
                    .await?
                    .map(|p| p.quantity)
                    .unwrap_or(0);
                return Err(CoreError::InsufficientStock {
                    product_id: product.id.clone(),
                    available,
                    requested: line.quantity,
                }
                .into());
            }

            let order = Order {
                id: Uuid::new_v4().to_string(),
                checkout_id: checkout_id.clone(),
                customer_id: customer.id.clone(),
                product_id: product.id.clone(),
                quantity: line.quantity,
                unit_price_cents: product.price_cents,
                total_cents: line_total.cents(),
                created_at: now,
            };
            uow.insert_order(&order).await?;
            orders.push(order);
        }

        let new_balance = uow
            .debit_balance(&customer.id, total.cents())
            .await?
            .ok_or(CoreError::InsufficientBalance {
                required: total.cents(),
                available: balance,
            })?;

        let line_ids: Vec<String> = lines.iter().map(|line| line.id.clone()).collect();
        uow.delete_cart_lines(&customer.id, &line_ids).await?;

        uow.commit().await?;

        info!(
            checkout_id = %checkout_id,
            customer_id = %customer.id,
            lines = orders.len(),
            total = %total,
            balance_cents = new_balance,
            "Checkout complete"
        );

        Ok(CheckoutReceipt {
            checkout_id,
            orders,
            total_cents: total.cents(),
            balance_cents: new_balance,
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use shop_db::DbConfig;

    fn policy() -> CheckoutPolicy {
        CheckoutPolicy {
            timeout: Duration::from_secs(5),
            max_attempts: 3,
            retry_backoff: Duration::from_millis(10),
            max_backoff: Duration::from_millis(40),
        }
    }

    async fn setup(balance_cents: i64) -> (Database, CheckoutEngine, Customer) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let customer = db
            .customers()
            .insert("alice", "hash", balance_cents)
            .await
            .unwrap();
        let engine = CheckoutEngine::new(db.clone(), policy());
        (db, engine, customer)
    }

    #[test]
    fn test_backoff_schedule() {
        let policy = policy();
        let mut backoff = policy.backoff();
        assert_eq!(backoff.initial_interval, Duration::from_millis(10));
        assert_eq!(backoff.max_elapsed_time, Some(policy.timeout));

        // ±50% jitter around 10ms, 20ms, 40ms, then capped at 40ms
        let delays: Vec<Duration> = (0..6).map(|_| backoff.next_backoff().unwrap()).collect();
        assert!(delays[0] >= Duration::from_millis(5) && delays[0] <= Duration::from_millis(16));
        assert!(delays[1] >= Duration::from_millis(10) && delays[1] <= Duration::from_millis(31));
        for delay in &delays[2..] {
            assert!(*delay >= Duration::from_millis(20) && *delay <= Duration::from_millis(61));
        }
    }

    #[test]
    fn test_backoff_stops_after_timeout() {
        let policy = CheckoutPolicy {
            timeout: Duration::from_millis(1),
            ..policy()
        };
        let mut backoff = policy.backoff();
        std::thread::sleep(Duration::from_millis(10));
        assert_eq!(backoff.next_backoff(), None);
    }

    #[test]
    fn test_max_backoff_never_below_initial() {
        let policy = CheckoutPolicy {
            max_backoff: Duration::from_millis(1),
            ..policy()
        };
        assert_eq!(policy.backoff().max_interval, Duration::from_millis(10));
    }

    #[test]
    fn test_only_busy_is_retryable() {
        assert!(CheckoutError::Db(DbError::Busy("locked".into())).is_retryable());
        assert!(!CheckoutError::Core(CoreError::EmptyCart).is_retryable());
        assert!(!CheckoutError::Db(DbError::QueryFailed("x".into())).is_retryable());
    }

    #[tokio::test]
    async fn test_checkout_success() {
        let (db, engine, alice) = setup(10_000).await;
        let mug = db.products().insert("Mug", "", "", 1299, 5).await.unwrap();
        let pen = db.products().insert("Pen", "", "", 150, 10).await.unwrap();
        db.cart().add(&alice.id, &mug.id, 2).await.unwrap();
        db.cart().add(&alice.id, &pen.id, 3).await.unwrap();

        let receipt = engine.checkout(&alice).await.unwrap();

        assert_eq!(receipt.orders.len(), 2);
        assert_eq!(receipt.total_cents, 2 * 1299 + 3 * 150);
        assert_eq!(receipt.balance_cents, 10_000 - receipt.total_cents);
        assert!(receipt
            .orders
            .iter()
            .all(|order| order.checkout_id == receipt.checkout_id));

        assert_eq!(db.products().get_by_id(&mug.id).await.unwrap().unwrap().quantity, 3);
        assert_eq!(db.products().get_by_id(&pen.id).await.unwrap().unwrap().quantity, 7);
        assert!(db.cart().list_for_customer(&alice.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_cart() {
        let (_db, engine, alice) = setup(0).await;

        for _ in 0..2 {
            let err = engine.checkout(&alice).await.unwrap_err();
            assert!(matches!(err, CheckoutError::Core(CoreError::EmptyCart)));
        }
    }

    #[tokio::test]
    async fn test_insufficient_balance_changes_nothing() {
        let (db, engine, alice) = setup(1000).await;
        let mug = db.products().insert("Mug", "", "", 1299, 5).await.unwrap();
        db.cart().add(&alice.id, &mug.id, 1).await.unwrap();

        let err = engine.checkout(&alice).await.unwrap_err();
        assert!(matches!(
            err,
            CheckoutError::Core(CoreError::InsufficientBalance {
                required: 1299,
                available: 1000
            })
        ));

        assert_eq!(db.products().get_by_id(&mug.id).await.unwrap().unwrap().quantity, 5);
        assert_eq!(db.cart().count_for_customer(&alice.id).await.unwrap(), 1);
        assert_eq!(db.orders().count_for_customer(&alice.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_insufficient_stock_rolls_back_earlier_lines() {
        let (db, engine, alice) = setup(100_000).await;
        let plenty = db.products().insert("Plenty", "", "", 100, 50).await.unwrap();
        let scarce = db.products().insert("Scarce", "", "", 100, 1).await.unwrap();
        db.cart().add(&alice.id, &plenty.id, 4).await.unwrap();
        db.cart().add(&alice.id, &scarce.id, 2).await.unwrap();

        let err = engine.checkout(&alice).await.unwrap_err();
        match err {
            CheckoutError::Core(CoreError::InsufficientStock {
                product_id,
                available,
                requested,
            }) => {
                assert_eq!(product_id, scarce.id);
                assert_eq!(available, 1);
                assert_eq!(requested, 2);
            }
            other => panic!("unexpected error: {other:?}"),
        }

        assert_eq!(db.products().get_by_id(&plenty.id).await.unwrap().unwrap().quantity, 50);
        assert_eq!(db.orders().count_for_customer(&alice.id).await.unwrap(), 0);
        assert_eq!(db.cart().count_for_customer(&alice.id).await.unwrap(), 2);
        let alice_now = db.customers().get_by_id(&alice.id).await.unwrap().unwrap();
        assert_eq!(alice_now.balance_cents, 100_000);
    }

    #[tokio::test]
    async fn test_deleted_customer() {
        let (db, engine, alice) = setup(0).await;
        db.customers().delete(&alice.id).await.unwrap();

        let err = engine.checkout(&alice).await.unwrap_err();
        assert!(matches!(err, CheckoutError::UnknownCustomer));
    }
}
