//! Registration and login.
//!
//! Argon2 is deliberately slow, so hashing and verification run on the
//! blocking pool instead of an async worker thread.

use tokio::task;
use tracing::{info, warn};

use shop_core::validation::{validate_password, validate_username};
use shop_core::{CoreError, CustomerProfile};
use shop_db::DbError;

use super::session::{AuthError, IssuedToken};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Create an account and return its public profile.
///
/// New accounts start with the configured signup credit.
pub async fn register(state: &AppState, username: String, password: String) -> ApiResult<CustomerProfile> {
    validate_username(&username)?;
    validate_password(&password)?;

    let hasher = state.passwords().clone();
    let password_hash = task::spawn_blocking(move || hasher.hash(&password))
        .await
        .map_err(|e| AuthError::PasswordHash(e.to_string()))??;

    let credit = state.config().signup_credit_cents;
    let customer = match state
        .db()
        .customers()
        .insert(&username, &password_hash, credit)
        .await
    {
        Ok(customer) => customer,
        Err(DbError::UniqueViolation { .. }) => {
            return Err(CoreError::UsernameTaken(username).into());
        }
        Err(e) => return Err(e.into()),
    };

    info!(customer_id = %customer.id, username = %customer.username, "Customer registered");
    Ok(customer.profile())
}

/// Check credentials and issue a session token.
///
/// Unknown usernames and wrong passwords produce the same error after the
/// same amount of hashing work.
pub async fn login(state: &AppState, username: String, password: String) -> ApiResult<IssuedToken> {
    let stored_hash = state
        .db()
        .customers()
        .get_by_username(&username)
        .await?
        .map(|customer| customer.password_hash);

    let hasher = state.passwords().clone();
    let verified = task::spawn_blocking(move || match stored_hash {
        Some(hash) => hasher.verify(&password, &hash),
        None => hasher.verify_dummy(&password),
    })
    .await
    .map_err(|e| AuthError::PasswordHash(e.to_string()))?;

    if !verified {
        warn!(username = %username, "Login failed");
        return Err(ApiError::from(AuthError::InvalidCredentials));
    }

    let issued = state.tokens().issue(&username)?;
    info!(username = %username, "Login succeeded");
    Ok(issued)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ApiConfig;
    use crate::error::ErrorCode;
    use shop_db::{Database, DbConfig};

    async fn state(signup_credit_cents: i64) -> AppState {
        let config = ApiConfig {
            database_path: ":memory:".into(),
            jwt_secret: "test-secret".to_string(),
            signup_credit_cents,
            password_hash_memory_kib: 8,
            password_hash_iterations: 1,
            ..ApiConfig::default()
        };
        let db = Database::new(config.db_config()).await.unwrap();
        AppState::new(config, db).unwrap()
    }

    #[tokio::test]
    async fn test_register_grants_signup_credit() {
        let state = state(2500).await;

        let profile = register(&state, "alice".into(), "password123".into())
            .await
            .unwrap();
        assert_eq!(profile.username, "alice");
        assert_eq!(profile.balance_cents, 2500);

        let stored = state
            .db()
            .customers()
            .get_by_username("alice")
            .await
            .unwrap()
            .unwrap();
        assert!(stored.password_hash.starts_with("$argon2id$"));
    }

    #[tokio::test]
    async fn test_register_duplicate_username() {
        let state = state(0).await;
        register(&state, "alice".into(), "password123".into())
            .await
            .unwrap();

        let err = register(&state, "alice".into(), "different-pass".into())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::Conflict);
    }

    #[tokio::test]
    async fn test_register_rejects_invalid_input() {
        let state = state(0).await;

        let err = register(&state, "a b".into(), "password123".into())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidArgument);

        let err = register(&state, "alice".into(), "short".into())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidArgument);
    }

    #[tokio::test]
    async fn test_login() {
        let state = state(0).await;
        register(&state, "alice".into(), "password123".into())
            .await
            .unwrap();

        let issued = login(&state, "alice".into(), "password123".into())
            .await
            .unwrap();
        let claims = state.tokens().verify(&issued.token).unwrap();
        assert_eq!(claims.sub, "alice");

        let wrong_password = login(&state, "alice".into(), "password124".into())
            .await
            .unwrap_err();
        let unknown_user = login(&state, "bob".into(), "password123".into())
            .await
            .unwrap_err();
        assert_eq!(wrong_password, unknown_user);
        assert_eq!(wrong_password.code, ErrorCode::Unauthenticated);
    }
}
