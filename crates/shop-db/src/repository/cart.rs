//! # Cart Repository
//!
//! Pending cart lines. Adds and clears are single SQL statements, so
//! concurrent adds for the same customer never interleave half-way and
//! neither cap can be overshot by racing requests.
//!
//! ## Merge Semantics
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  add(alice, widget, 2)                                                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  INSERT ... ON CONFLICT (customer_id, product_id)                       │
//! │       │                                                                 │
//! │       ├── no line yet  → new line, quantity 2                           │
//! │       │                                                                 │
//! │  add(alice, widget, 3)                                                  │
//! │       │                                                                 │
//! │       └── line exists  → DO UPDATE quantity = 2 + 3 = 5                 │
//! │                          (skipped if the sum would exceed the cap)      │
//! │                                                                         │
//! │  add(alice, gadget, 1) with MAX_CART_LINES lines already              │
//! │       └── SELECT ... WHERE count < cap → no row, nothing inserted       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use shop_core::{CartLine, MAX_CART_LINES, MAX_ITEM_QUANTITY};

/// Outcome of an owner-checked removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartRemoval {
    /// The line existed, belonged to the caller, and is gone.
    Removed,
    /// No line with that id exists.
    NotFound,
    /// The line belongs to someone else and was left untouched.
    Forbidden,
}

/// Repository for cart line operations.
#[derive(Debug, Clone)]
pub struct CartRepository {
    pool: SqlitePool,
}

impl CartRepository {
    /// Creates a new CartRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CartRepository { pool }
    }

    /// Lists a customer's lines in the order they were first added.
    pub async fn list_for_customer(&self, customer_id: &str) -> DbResult<Vec<CartLine>> {
        debug!(customer_id = %customer_id, "Listing cart");

        let lines = sqlx::query_as::<_, CartLine>(
            r#"
            SELECT id, customer_id, product_id, quantity, created_at, updated_at
            FROM cart_lines
            WHERE customer_id = ?1
            ORDER BY created_at, rowid
            "#,
        )
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(lines)
    }

    /// Gets a single line by id, regardless of owner.
    pub async fn get(&self, line_id: &str) -> DbResult<Option<CartLine>> {
        let line = sqlx::query_as::<_, CartLine>(
            r#"
            SELECT id, customer_id, product_id, quantity, created_at, updated_at
            FROM cart_lines
            WHERE id = ?1
            "#,
        )
        .bind(line_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(line)
    }

    /// Finds the customer's line for a product, if any.
    pub async fn find(&self, customer_id: &str, product_id: &str) -> DbResult<Option<CartLine>> {
        let line = sqlx::query_as::<_, CartLine>(
            r#"
            SELECT id, customer_id, product_id, quantity, created_at, updated_at
            FROM cart_lines
            WHERE customer_id = ?1 AND product_id = ?2
            "#,
        )
        .bind(customer_id)
        .bind(product_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(line)
    }

    /// Number of distinct lines in a customer's cart.
    pub async fn count_for_customer(&self, customer_id: &str) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM cart_lines WHERE customer_id = ?1")
            .bind(customer_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Adds `quantity` units of a product, merging into an existing line.
    ///
    /// ## Returns
    /// * `Ok(Some(line))` - The created or grown line
    /// * `Ok(None)` - The merged quantity would exceed `MAX_ITEM_QUANTITY`,
    ///   or a new line would exceed `MAX_CART_LINES`; nothing was written
    /// * `Err(DbError::ForeignKeyViolation)` - Unknown product or customer
    ///
    /// Callers validate `quantity > 0` first.
    pub async fn add(
        &self,
        customer_id: &str,
        product_id: &str,
        quantity: i64,
    ) -> DbResult<Option<CartLine>> {
        debug!(
            customer_id = %customer_id,
            product_id = %product_id,
            quantity,
            "Adding to cart"
        );

        let line = sqlx::query_as::<_, CartLine>(
            r#"
            INSERT INTO cart_lines (id, customer_id, product_id, quantity, created_at, updated_at)
            SELECT ?1, ?2, ?3, ?4, ?5, ?5
            WHERE (SELECT COUNT(*) FROM cart_lines WHERE customer_id = ?2) < ?7
               OR EXISTS (SELECT 1 FROM cart_lines WHERE customer_id = ?2 AND product_id = ?3)
            ON CONFLICT (customer_id, product_id) DO UPDATE SET
                quantity = cart_lines.quantity + excluded.quantity,
                updated_at = excluded.updated_at
            WHERE cart_lines.quantity + excluded.quantity <= ?6
            RETURNING id, customer_id, product_id, quantity, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(customer_id)
        .bind(product_id)
        .bind(quantity)
        .bind(Utc::now())
        .bind(MAX_ITEM_QUANTITY)
        .bind(MAX_CART_LINES as i64)
        .fetch_optional(&self.pool)
        .await?;

        Ok(line)
    }

    /// Removes a line if and only if it belongs to `customer_id`.
    ///
    /// Ownership is checked on the stored line before anything is deleted.
    /// The delete repeats the owner predicate; a line that vanished in
    /// between reports `NotFound`.
    pub async fn remove_owned(&self, customer_id: &str, line_id: &str) -> DbResult<CartRemoval> {
        debug!(customer_id = %customer_id, line_id = %line_id, "Removing cart line");

        let Some(line) = self.get(line_id).await? else {
            return Ok(CartRemoval::NotFound);
        };
        if !line.is_owned_by(customer_id) {
            return Ok(CartRemoval::Forbidden);
        }

        let result = sqlx::query("DELETE FROM cart_lines WHERE id = ?1 AND customer_id = ?2")
            .bind(line_id)
            .bind(customer_id)
            .execute(&self.pool)
            .await?;

        Ok(if result.rows_affected() > 0 {
            CartRemoval::Removed
        } else {
            CartRemoval::NotFound
        })
    }

    /// Deletes every line in a customer's cart.
    ///
    /// ## Returns
    /// Number of lines removed.
    pub async fn clear(&self, customer_id: &str) -> DbResult<u64> {
        debug!(customer_id = %customer_id, "Clearing cart");

        let result = sqlx::query("DELETE FROM cart_lines WHERE customer_id = ?1")
            .bind(customer_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
