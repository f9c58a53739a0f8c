//! Application state shared across handlers.

use std::sync::Arc;

use shop_db::Database;

use crate::config::ApiConfig;
use crate::services::checkout::CheckoutEngine;
use crate::services::passwords::PasswordHasher;
use crate::services::session::{AuthError, TokenAuthority};

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`; built once at startup.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ApiConfig,
    db: Database,
    tokens: TokenAuthority,
    passwords: PasswordHasher,
    checkout: CheckoutEngine,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the password hashing parameters are invalid.
    pub fn new(config: ApiConfig, db: Database) -> Result<Self, AuthError> {
        let tokens = TokenAuthority::new(&config.jwt_secret, config.jwt_lifetime_secs);
        let passwords =
            PasswordHasher::new(config.password_hash_memory_kib, config.password_hash_iterations)?;
        let checkout = CheckoutEngine::new(db.clone(), config.checkout_policy());

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                db,
                tokens,
                passwords,
                checkout,
            }),
        })
    }

    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn db(&self) -> &Database {
        &self.inner.db
    }

    #[must_use]
    pub fn tokens(&self) -> &TokenAuthority {
        &self.inner.tokens
    }

    #[must_use]
    pub fn passwords(&self) -> &PasswordHasher {
        &self.inner.passwords
    }

    #[must_use]
    pub fn checkout(&self) -> &CheckoutEngine {
        &self.inner.checkout
    }
}
