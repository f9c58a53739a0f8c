//! Service layer between the HTTP routes and shop-db.

pub mod accounts;
pub mod cart;
pub mod checkout;
pub mod passwords;
pub mod session;
