//! API server configuration module.
//!
//! Configuration is loaded from environment variables with fallback to defaults.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::Serialize;
use shop_db::DbConfig;

use crate::services::checkout::CheckoutPolicy;

/// Secret used when `JWT_SECRET` is unset. Startup logs a warning.
pub const DEV_JWT_SECRET: &str = "storefront-dev-secret-change-in-production";

/// Longest accepted session token lifetime (one year).
pub const MAX_JWT_LIFETIME_SECS: i64 = 365 * 24 * 60 * 60;

/// API server configuration.
#[derive(Debug, Clone, Serialize)]
pub struct ApiConfig {
    /// Interface to bind
    pub host: String,

    /// HTTP port
    pub port: u16,

    /// SQLite database file (`:memory:` for a private in-memory database)
    pub database_path: PathBuf,

    /// Connection pool size
    pub db_max_connections: u32,

    /// HS256 signing secret for session tokens
    #[serde(skip_serializing)]
    pub jwt_secret: String,

    /// Session token lifetime in seconds
    pub jwt_lifetime_secs: i64,

    /// Upper bound on one checkout, all retries included
    pub checkout_timeout: Duration,

    /// Attempts per checkout when the database reports a lock conflict
    pub checkout_max_attempts: u32,

    /// First delay between attempts; later delays double, with jitter
    pub checkout_retry_backoff: Duration,

    /// Ceiling for the delay between attempts
    pub checkout_max_backoff: Duration,

    /// Balance granted to newly registered accounts
    pub signup_credit_cents: i64,

    /// Argon2id memory cost in KiB
    pub password_hash_memory_kib: u32,

    /// Argon2id iteration count
    pub password_hash_iterations: u32,
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            host: "127.0.0.1".to_string(),
            port: 8080,
            database_path: PathBuf::from("./shop.db"),
            db_max_connections: 5,
            jwt_secret: DEV_JWT_SECRET.to_string(),
            jwt_lifetime_secs: shop_core::SESSION_TOKEN_LIFETIME_SECS,
            checkout_timeout: Duration::from_millis(5000),
            checkout_max_attempts: 5,
            checkout_retry_backoff: Duration::from_millis(20),
            checkout_max_backoff: Duration::from_millis(500),
            signup_credit_cents: 0,
            // OWASP baseline for Argon2id: m=19 MiB, t=2, p=1
            password_hash_memory_kib: 19 * 1024,
            password_hash_iterations: 2,
        }
    }
}

impl ApiConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// Unset variables keep their default; set but unparseable ones are errors.
    pub fn load_from<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = ApiConfig::default();

        let config = ApiConfig {
            host: lookup("SHOP_HOST").unwrap_or(defaults.host),

            port: parse_var(&lookup, "SHOP_PORT", defaults.port)?,

            database_path: lookup("SHOP_DATABASE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.database_path),

            db_max_connections: parse_var(
                &lookup,
                "SHOP_DB_MAX_CONNECTIONS",
                defaults.db_max_connections,
            )?,

            jwt_secret: lookup("JWT_SECRET").unwrap_or(defaults.jwt_secret),

            jwt_lifetime_secs: parse_var(&lookup, "JWT_LIFETIME_SECS", defaults.jwt_lifetime_secs)?,

            checkout_timeout: Duration::from_millis(parse_var(
                &lookup,
                "CHECKOUT_TIMEOUT_MS",
                defaults.checkout_timeout.as_millis() as u64,
            )?),

            checkout_max_attempts: parse_var(
                &lookup,
                "CHECKOUT_MAX_ATTEMPTS",
                defaults.checkout_max_attempts,
            )?,

            checkout_retry_backoff: Duration::from_millis(parse_var(
                &lookup,
                "CHECKOUT_RETRY_BACKOFF_MS",
                defaults.checkout_retry_backoff.as_millis() as u64,
            )?),

            checkout_max_backoff: Duration::from_millis(parse_var(
                &lookup,
                "CHECKOUT_MAX_BACKOFF_MS",
                defaults.checkout_max_backoff.as_millis() as u64,
            )?),

            signup_credit_cents: parse_var(
                &lookup,
                "SIGNUP_CREDIT_CENTS",
                defaults.signup_credit_cents,
            )?,

            password_hash_memory_kib: parse_var(
                &lookup,
                "PASSWORD_HASH_MEMORY_KIB",
                defaults.password_hash_memory_kib,
            )?,

            password_hash_iterations: parse_var(
                &lookup,
                "PASSWORD_HASH_ITERATIONS",
                defaults.password_hash_iterations,
            )?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Rejects values that parse but cannot work.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.db_max_connections == 0 {
            return Err(ConfigError::InvalidValue("SHOP_DB_MAX_CONNECTIONS".to_string()));
        }
        if !(1..=MAX_JWT_LIFETIME_SECS).contains(&self.jwt_lifetime_secs) {
            return Err(ConfigError::InvalidValue("JWT_LIFETIME_SECS".to_string()));
        }
        if self.checkout_timeout.is_zero() {
            return Err(ConfigError::InvalidValue("CHECKOUT_TIMEOUT_MS".to_string()));
        }
        if self.checkout_max_attempts == 0 {
            return Err(ConfigError::InvalidValue("CHECKOUT_MAX_ATTEMPTS".to_string()));
        }
        if self.signup_credit_cents < 0 {
            return Err(ConfigError::InvalidValue("SIGNUP_CREDIT_CENTS".to_string()));
        }
        Ok(())
    }

    /// Whether the built-in development secret is in use.
    pub fn uses_dev_secret(&self) -> bool {
        self.jwt_secret == DEV_JWT_SECRET
    }

    /// Address to bind the listener to.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|_| ConfigError::InvalidValue("SHOP_HOST".to_string()))
    }

    /// Database pool settings derived from this configuration.
    pub fn db_config(&self) -> DbConfig {
        if self.database_path.as_os_str() == ":memory:" {
            DbConfig::in_memory()
        } else {
            DbConfig::new(&self.database_path).max_connections(self.db_max_connections)
        }
    }

    /// Retry and timeout settings for the checkout engine.
    pub fn checkout_policy(&self) -> CheckoutPolicy {
        CheckoutPolicy {
            timeout: self.checkout_timeout,
            max_attempts: self.checkout_max_attempts,
            retry_backoff: self.checkout_retry_backoff,
            max_backoff: self.checkout_max_backoff,
        }
    }
}

fn parse_var<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key.to_string())),
        None => Ok(default),
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ApiConfig::load_from(lookup(&[])).unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.db_max_connections, 5);
        assert_eq!(config.jwt_lifetime_secs, 86_400);
        assert_eq!(config.checkout_timeout, Duration::from_millis(5000));
        assert_eq!(config.checkout_max_attempts, 5);
        assert_eq!(config.checkout_max_backoff, Duration::from_millis(500));
        assert_eq!(config.signup_credit_cents, 0);
        assert!(config.uses_dev_secret());
        assert_eq!(config.socket_addr().unwrap().port(), 8080);
    }

    #[test]
    fn test_overrides() {
        let config = ApiConfig::load_from(lookup(&[
            ("SHOP_PORT", "9090"),
            ("JWT_SECRET", "s3cret"),
            ("CHECKOUT_RETRY_BACKOFF_MS", "5"),
            ("CHECKOUT_MAX_BACKOFF_MS", "80"),
            ("SIGNUP_CREDIT_CENTS", "10000"),
            ("SHOP_DATABASE_PATH", ":memory:"),
        ]))
        .unwrap();

        assert_eq!(config.port, 9090);
        assert!(!config.uses_dev_secret());
        assert_eq!(config.checkout_retry_backoff, Duration::from_millis(5));
        assert_eq!(config.checkout_policy().max_backoff, Duration::from_millis(80));
        assert_eq!(config.signup_credit_cents, 10_000);
        assert!(config.db_config().is_in_memory());
    }

    #[test]
    fn test_invalid_values() {
        let err = ApiConfig::load_from(lookup(&[("SHOP_PORT", "eighty")])).unwrap_err();
        assert_eq!(err.to_string(), "Invalid value for SHOP_PORT");

        assert!(ApiConfig::load_from(lookup(&[("CHECKOUT_MAX_ATTEMPTS", "0")])).is_err());
        assert!(ApiConfig::load_from(lookup(&[("SIGNUP_CREDIT_CENTS", "-1")])).is_err());
    }

    #[test]
    fn test_jwt_lifetime_bounds() {
        let max = MAX_JWT_LIFETIME_SECS.to_string();
        let config = ApiConfig::load_from(lookup(&[("JWT_LIFETIME_SECS", max.as_str())])).unwrap();
        assert_eq!(config.jwt_lifetime_secs, MAX_JWT_LIFETIME_SECS);

        let too_long = (MAX_JWT_LIFETIME_SECS + 1).to_string();
        let err = ApiConfig::load_from(lookup(&[("JWT_LIFETIME_SECS", too_long.as_str())])).unwrap_err();
        assert_eq!(err.to_string(), "Invalid value for JWT_LIFETIME_SECS");

        let huge = i64::MAX.to_string();
        assert!(ApiConfig::load_from(lookup(&[("JWT_LIFETIME_SECS", huge.as_str())])).is_err());
        assert!(ApiConfig::load_from(lookup(&[("JWT_LIFETIME_SECS", "0")])).is_err());
    }

    #[test]
    fn test_secret_not_serialized() {
        let json = serde_json::to_string(&ApiConfig::default()).unwrap();
        assert!(!json.contains(DEV_JWT_SECRET));
    }
}
