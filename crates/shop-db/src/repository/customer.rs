//! # Customer Repository
//!
//! Registration inserts, lookups for login and token resolution, and
//! balance credits. Balance debits only happen inside a checkout
//! [`UnitOfWork`](crate::unit_of_work::UnitOfWork).

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use shop_core::Customer;

/// Repository for customer database operations.
#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
}

impl CustomerRepository {
    /// Creates a new CustomerRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CustomerRepository { pool }
    }

    /// Inserts a new customer.
    ///
    /// ## Returns
    /// * `Ok(Customer)` - The stored customer
    /// * `Err(DbError::UniqueViolation)` - Username already taken
    ///
    /// Uniqueness is decided by the `UNIQUE (username)` index, so two
    /// concurrent registrations of the same name cannot both succeed.
    pub async fn insert(
        &self,
        username: &str,
        password_hash: &str,
        balance_cents: i64,
    ) -> DbResult<Customer> {
        let customer = Customer {
            id: Uuid::new_v4().to_string(),
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            balance_cents,
            created_at: Utc::now(),
        };

        debug!(id = %customer.id, username = %customer.username, "Inserting customer");

        sqlx::query(
            r#"
            INSERT INTO customers (id, username, password_hash, balance_cents, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&customer.id)
        .bind(&customer.username)
        .bind(&customer.password_hash)
        .bind(customer.balance_cents)
        .bind(customer.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } => DbError::UniqueViolation {
                field,
                value: username.to_string(),
            },
            other => other,
        })?;

        Ok(customer)
    }

    /// Gets a customer by id.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Customer>> {
        let customer = sqlx::query_as::<_, Customer>(
            r#"
            SELECT id, username, password_hash, balance_cents, created_at
            FROM customers
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(customer)
    }

    /// Gets a customer by username (exact, case-sensitive match).
    pub async fn get_by_username(&self, username: &str) -> DbResult<Option<Customer>> {
        let customer = sqlx::query_as::<_, Customer>(
            r#"
            SELECT id, username, password_hash, balance_cents, created_at
            FROM customers
            WHERE username = ?1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(customer)
    }

    /// Adds `cents` to a customer's balance and returns the updated record.
    pub async fn credit(&self, username: &str, cents: i64) -> DbResult<Customer> {
        info!(username = %username, cents, "Crediting customer balance");

        let customer = sqlx::query_as::<_, Customer>(
            r#"
            UPDATE customers SET balance_cents = balance_cents + ?2
            WHERE username = ?1
            RETURNING id, username, password_hash, balance_cents, created_at
            "#,
        )
        .bind(username)
        .bind(cents)
        .fetch_optional(&self.pool)
        .await?;

        customer.ok_or_else(|| DbError::not_found("Customer", username))
    }

    /// Deletes a customer and (by cascade) their cart.
    ///
    /// ## Returns
    /// `true` if a row was deleted.
    pub async fn delete(&self, id: &str) -> DbResult<bool> {
        info!(id = %id, "Deleting customer");

        let result = sqlx::query("DELETE FROM customers WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
