//! # Checkout Unit of Work
//!
//! One SQLite transaction holding exactly the reads and writes a checkout
//! needs. Nothing it writes is visible to other connections until
//! [`UnitOfWork::commit`]; dropping it (early return, `?`, timeout,
//! cancelled request future) rolls everything back.
//!
//! ## Checkout Inside One Transaction
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  BEGIN                                                                  │
//! │    lock_customer(customer)         no-op write, takes the write lock    │
//! │    cart_lines(customer)            read                                 │
//! │    product(id) × N                 read (authoritative price)           │
//! │    customer_balance(customer)      read                                 │
//! │    reserve_stock(id, n) × N        UPDATE ... WHERE quantity >= n       │
//! │    insert_order(order) × N         INSERT                               │
//! │    debit_balance(customer, total)  UPDATE ... WHERE balance >= total    │
//! │    delete_cart_lines(ids)          DELETE purchased lines only          │
//! │  COMMIT                                                                 │
//! │                                                                         │
//! │  Any conditional write that matches zero rows → caller drops the        │
//! │  UnitOfWork → ROLLBACK, no partial order set is ever visible            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{Sqlite, Transaction};
use tracing::debug;

use crate::error::DbResult;
use shop_core::{CartLine, Order, Product};

/// A single checkout transaction.
#[derive(Debug)]
pub struct UnitOfWork {
    tx: Transaction<'static, Sqlite>,
}

impl UnitOfWork {
    pub(crate) fn new(tx: Transaction<'static, Sqlite>) -> Self {
        UnitOfWork { tx }
    }

    /// Claims the database write lock before any read.
    ///
    /// SQLite cannot upgrade a read transaction to a writer once another
    /// connection has committed, and the busy handler is skipped for that
    /// case. Writing first makes the transaction wait on `busy_timeout`
    /// instead and every later read sees the latest committed state.
    ///
    /// ## Returns
    /// `false` when the customer row no longer exists.
    pub async fn lock_customer(&mut self, customer_id: &str) -> DbResult<bool> {
        let result = sqlx::query("UPDATE customers SET balance_cents = balance_cents WHERE id = ?1")
            .bind(customer_id)
            .execute(&mut *self.tx)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    /// The customer's cart lines as seen by this transaction.
    pub async fn cart_lines(&mut self, customer_id: &str) -> DbResult<Vec<CartLine>> {
        let lines = sqlx::query_as::<_, CartLine>(
            r#"
            SELECT id, customer_id, product_id, quantity, created_at, updated_at
            FROM cart_lines
            WHERE customer_id = ?1
            ORDER BY created_at, rowid
            "#,
        )
        .bind(customer_id)
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(lines)
    }

    /// Reads a product's current price and stock.
    pub async fn product(&mut self, product_id: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, description, category, price_cents, quantity, created_at, updated_at
            FROM products
            WHERE id = ?1
            "#,
        )
        .bind(product_id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(product)
    }

    /// Reads the customer's balance; `None` if the customer no longer exists.
    pub async fn customer_balance(&mut self, customer_id: &str) -> DbResult<Option<i64>> {
        let balance: Option<i64> =
            sqlx::query_scalar("SELECT balance_cents FROM customers WHERE id = ?1")
                .bind(customer_id)
                .fetch_optional(&mut *self.tx)
                .await?;

        Ok(balance)
    }

    /// Takes `quantity` units out of stock if and only if that many are on hand.
    ///
    /// ## Returns
    /// `false` when fewer than `quantity` units remain; nothing was changed.
    pub async fn reserve_stock(&mut self, product_id: &str, quantity: i64) -> DbResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE products
            SET quantity = quantity - ?2, updated_at = ?3
            WHERE id = ?1 AND quantity >= ?2
            "#,
        )
        .bind(product_id)
        .bind(quantity)
        .bind(Utc::now())
        .execute(&mut *self.tx)
        .await?;

        let reserved = result.rows_affected() == 1;
        debug!(product_id = %product_id, quantity, reserved, "Reserve stock");
        Ok(reserved)
    }

    /// Records one purchased line.
    pub async fn insert_order(&mut self, order: &Order) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO orders (
                id, checkout_id, customer_id, product_id, quantity,
                unit_price_cents, total_cents, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&order.id)
        .bind(&order.checkout_id)
        .bind(&order.customer_id)
        .bind(&order.product_id)
        .bind(order.quantity)
        .bind(order.unit_price_cents)
        .bind(order.total_cents)
        .bind(order.created_at)
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }

    /// Debits `amount_cents` if the balance covers it.
    ///
    /// ## Returns
    /// * `Some(new_balance)` - Debit applied
    /// * `None` - Balance too low (or customer gone); nothing was changed
    pub async fn debit_balance(
        &mut self,
        customer_id: &str,
        amount_cents: i64,
    ) -> DbResult<Option<i64>> {
        let balance: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE customers
            SET balance_cents = balance_cents - ?2
            WHERE id = ?1 AND balance_cents >= ?2
            RETURNING balance_cents
            "#,
        )
        .bind(customer_id)
        .bind(amount_cents)
        .fetch_optional(&mut *self.tx)
        .await?;

        debug!(customer_id = %customer_id, amount_cents, applied = balance.is_some(), "Debit balance");
        Ok(balance)
    }

    /// Deletes exactly the given lines of the customer's cart.
    ///
    /// Lines added by a concurrent request after this checkout read the
    /// cart are not in `line_ids` and survive.
    pub async fn delete_cart_lines(&mut self, customer_id: &str, line_ids: &[String]) -> DbResult<u64> {
        let mut deleted = 0;
        for line_id in line_ids {
            let result = sqlx::query("DELETE FROM cart_lines WHERE id = ?1 AND customer_id = ?2")
                .bind(line_id)
                .bind(customer_id)
                .execute(&mut *self.tx)
                .await?;
            deleted += result.rows_affected();
        }

        Ok(deleted)
    }

    /// Commits every write made through this unit of work.
    pub async fn commit(self) -> DbResult<()> {
        self.tx.commit().await?;
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
