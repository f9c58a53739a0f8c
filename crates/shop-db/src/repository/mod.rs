//! # Repository Module
//!
//! Database repository implementations for the storefront.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Service (shop-api)                                                     │
//! │       │                                                                 │
//! │       │  db.cart().add(customer, product, 2)                            │
//! │       ▼                                                                 │
//! │  CartRepository                                                        │
//! │  ├── list_for_customer / get / find                                    │
//! │  ├── add          (single UPSERT)                                      │
//! │  ├── remove_owned (owner-checked DELETE)                               │
//! │  └── clear                                                             │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each repository statement runs on its own pooled connection. Work that
//! must commit together goes through [`crate::unit_of_work::UnitOfWork`].
//!
//! ## Available Repositories
//!
//! - [`ProductRepository`](product::ProductRepository) - Catalog reads, seeding
//! - [`CustomerRepository`](customer::CustomerRepository) - Accounts and balance credits
//! - [`CartRepository`](cart::CartRepository) - Pending cart lines
//! - [`OrderRepository`](order::OrderRepository) - Order history

pub mod cart;
pub mod customer;
pub mod order;
pub mod product;
