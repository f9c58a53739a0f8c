//! # Order Repository
//!
//! Read access to order history. Orders are only ever written by a checkout
//! [`UnitOfWork`](crate::unit_of_work::UnitOfWork) and never updated.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use shop_core::Order;

/// Repository for order history.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    /// Creates a new OrderRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// A customer's orders, newest first.
    pub async fn list_for_customer(&self, customer_id: &str) -> DbResult<Vec<Order>> {
        debug!(customer_id = %customer_id, "Listing orders");

        let orders = sqlx::query_as::<_, Order>(
            r#"
            SELECT id, checkout_id, customer_id, product_id, quantity,
                   unit_price_cents, total_cents, created_at
            FROM orders
            WHERE customer_id = ?1
            ORDER BY created_at DESC, rowid DESC
            "#,
        )
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(orders)
    }

    /// Total number of orders for a customer.
    pub async fn count_for_customer(&self, customer_id: &str) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE customer_id = ?1")
            .bind(customer_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}
