//! # Domain Types
//!
//! Core domain types used throughout the storefront.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │    CartLine     │   │     Order       │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │◄──│  product_id     │   │  checkout_id    │       │
//! │  │  name           │   │  customer_id ───┼─┐ │  product_id     │       │
//! │  │  price_cents    │   │  quantity > 0   │ │ │  unit_price     │       │
//! │  │  quantity >= 0  │   └─────────────────┘ │ │  total_cents    │       │
//! │  └─────────────────┘                       │ └─────────────────┘       │
//! │                        ┌─────────────────┐ │                            │
//! │                        │    Customer     │◄┘  CheckoutReceipt          │
//! │                        │  username (uniq)│    = orders + new balance   │
//! │                        │  password_hash  │                              │
//! │                        │  balance_cents  │                              │
//! │                        └─────────────────┘                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Identity
//! Every entity is keyed by a UUID v4 string generated by the writer.
//! Usernames are the only business key and are unique.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Product
// =============================================================================

/// A product available for purchase.
///
/// `quantity` is mutated only by checkout, and never below zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name.
    pub name: String,

    /// Free-form description, may be empty.
    pub description: String,

    /// Catalog section, may be empty. Display only.
    pub category: String,

    /// Current unit price in cents.
    pub price_cents: i64,

    /// Units on hand.
    pub quantity: i64,

    /// When the product was created.
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    /// When the product was last updated (price or stock change).
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }
}

// =============================================================================
// Customer
// =============================================================================

/// A registered customer as stored.
///
/// Deliberately not `Serialize`: the password hash must never reach a
/// response body. Use [`CustomerProfile`] for that.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Customer {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Login name, unique across all customers.
    pub username: String,

    /// Argon2id PHC string (`$argon2id$v=19$...`).
    pub password_hash: String,

    /// Spendable balance in cents.
    pub balance_cents: i64,

    /// When the customer registered.
    pub created_at: DateTime<Utc>,
}

impl Customer {
    /// Returns the balance as a Money type.
    #[inline]
    pub fn balance(&self) -> Money {
        Money::from_cents(self.balance_cents)
    }

    /// Public view of this customer.
    pub fn profile(&self) -> CustomerProfile {
        CustomerProfile {
            id: self.id.clone(),
            username: self.username.clone(),
            balance_cents: self.balance_cents,
            created_at: self.created_at,
        }
    }
}

/// What clients see of a customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CustomerProfile {
    pub id: String,
    pub username: String,
    pub balance_cents: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Cart Line
// =============================================================================

/// One pending (customer, product, quantity) entry in a cart.
///
/// At most one line exists per (customer, product); adding the same product
/// again grows the existing line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Owner of the line.
    pub customer_id: String,

    /// Product being purchased.
    pub product_id: String,

    /// Units requested, always > 0.
    pub quantity: i64,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl CartLine {
    /// Whether `customer_id` owns this line.
    #[inline]
    pub fn is_owned_by(&self, customer_id: &str) -> bool {
        self.customer_id == customer_id
    }
}

// =============================================================================
// Order
// =============================================================================

/// An immutable record of one purchased cart line.
///
/// ## Price Capture
/// ```text
/// Checkout at 10:00, Widget costs $2.99, qty 3
///      │
///      ▼
/// Order { unit_price_cents: 299, total_cents: 897 }
///      │
///      ▼
/// Price changes to $3.49 at 11:00 → this order still says 299/897
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Groups all orders created by the same checkout.
    pub checkout_id: String,

    pub customer_id: String,

    pub product_id: String,

    /// Units purchased.
    pub quantity: i64,

    /// Unit price charged, frozen at purchase time.
    pub unit_price_cents: i64,

    /// `unit_price_cents × quantity`.
    pub total_cents: i64,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Returns the amount charged as a Money type.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

// =============================================================================
// Checkout Receipt
// =============================================================================

/// Result of a successful checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutReceipt {
    pub checkout_id: String,
    pub orders: Vec<Order>,
    /// Sum of every order's `total_cents`.
    pub total_cents: i64,
    /// Customer balance after the debit.
    pub balance_cents: i64,
}

// =============================================================================
// Unit Tests
// =============================================================================
