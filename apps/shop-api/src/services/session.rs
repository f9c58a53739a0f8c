//! Session token authority.
//!
//! Issues and verifies HS256 JWTs binding a request to a customer username.
//! Tokens are stateless; expiry is the only way one stops working, apart
//! from the customer being deleted.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use shop_core::Customer;
use shop_db::{Database, DbError};

/// JWT claims structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (username)
    pub sub: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration (Unix timestamp)
    pub exp: i64,

    /// JWT ID (unique identifier for this token)
    pub jti: String,
}

/// A freshly issued token and its lifetime in seconds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub token: String,
    pub expires_in: i64,
}

/// Authentication errors.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Missing bearer token")]
    MissingToken,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Token subject no longer exists")]
    UnknownCustomer,

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Failed to sign token: {0}")]
    Signing(String),

    #[error("Password hashing failed: {0}")]
    PasswordHash(String),

    #[error(transparent)]
    Db(#[from] DbError),
}

/// Issues and verifies session tokens.
pub struct TokenAuthority {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    lifetime_secs: i64,
    has_secret: bool,
}

impl TokenAuthority {
    /// Create a new token authority.
    pub fn new(secret: &str, lifetime_secs: i64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub", "iat"]);

        TokenAuthority {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            lifetime_secs,
            has_secret: !secret.is_empty(),
        }
    }

    /// Issue a token asserting `username`.
    pub fn issue(&self, username: &str) -> Result<IssuedToken, AuthError> {
        let now = Utc::now();
        let exp = Duration::try_seconds(self.lifetime_secs)
            .and_then(|lifetime| now.checked_add_signed(lifetime))
            .ok_or_else(|| {
                AuthError::Signing(format!("token lifetime {}s is out of range", self.lifetime_secs))
            })?;

        let claims = Claims {
            sub: username.to_string(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        let token = self.sign(&claims)?;
        Ok(IssuedToken {
            token,
            expires_in: self.lifetime_secs,
        })
    }

    fn sign(&self, claims: &Claims) -> Result<String, AuthError> {
        if !self.has_secret {
            return Err(AuthError::Signing("signing secret is empty".to_string()));
        }

        encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|e| AuthError::Signing(e.to_string()))
    }

    /// Check signature and expiry, returning the claims.
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                debug!(error = %e, "Token rejected");
                AuthError::InvalidToken
            })
    }

    /// Verify a token and load the customer it names.
    pub async fn resolve(&self, db: &Database, token: &str) -> Result<Customer, AuthError> {
        let claims = self.verify(token)?;

        match db.customers().get_by_username(&claims.sub).await? {
            Some(customer) => Ok(customer),
            None => {
                warn!(username = %claims.sub, "Valid token for a customer that no longer exists");
                Err(AuthError::UnknownCustomer)
            }
        }
    }
}

/// Extract bearer token from authorization header.
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use shop_db::DbConfig;

    fn authority() -> TokenAuthority {
        TokenAuthority::new("test-secret", 3600)
    }

    #[test]
    fn test_token_roundtrip() {
        let issued = authority().issue("alice").unwrap();
        assert_eq!(issued.expires_in, 3600);

        let claims = authority().verify(&issued.token).unwrap();
        assert_eq!(claims.sub, "alice");
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_expired_token_rejected() {
        let authority = authority();
        let now = Utc::now().timestamp();
        let token = authority
            .sign(&Claims {
                sub: "alice".to_string(),
                iat: now - 120,
                exp: now - 60,
                jti: Uuid::new_v4().to_string(),
            })
            .unwrap();

        assert!(matches!(authority.verify(&token), Err(AuthError::InvalidToken)));
    }

    #[test]
    fn test_tampered_token_rejected() {
        let authority = authority();
        let alice = authority.issue("alice").unwrap().token;
        let mallory = authority.issue("mallory").unwrap().token;

        // alice's header and signature around mallory's claims
        let a: Vec<&str> = alice.split('.').collect();
        let m: Vec<&str> = mallory.split('.').collect();
        let forged = format!("{}.{}.{}", a[0], m[1], a[2]);

        assert!(matches!(authority.verify(&forged), Err(AuthError::InvalidToken)));
        assert!(matches!(authority.verify("not-a-jwt"), Err(AuthError::InvalidToken)));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = TokenAuthority::new("other-secret", 3600)
            .issue("alice")
            .unwrap()
            .token;

        assert!(matches!(authority().verify(&token), Err(AuthError::InvalidToken)));
    }

    #[test]
    fn test_empty_secret_cannot_sign() {
        let result = TokenAuthority::new("", 3600).issue("alice");
        assert!(matches!(result, Err(AuthError::Signing(_))));
    }

    #[test]
    fn test_out_of_range_lifetime_is_an_error() {
        for lifetime in [i64::MAX, i64::MAX / 1000] {
            let result = TokenAuthority::new("test-secret", lifetime).issue("alice");
            assert!(matches!(result, Err(AuthError::Signing(_))));
        }
    }

    #[tokio::test]
    async fn test_resolve_deleted_customer() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let customer = db.customers().insert("alice", "hash", 0).await.unwrap();
        let authority = authority();
        let token = authority.issue("alice").unwrap().token;

        let resolved = authority.resolve(&db, &token).await.unwrap();
        assert_eq!(resolved.id, customer.id);

        db.customers().delete(&customer.id).await.unwrap();
        assert!(matches!(
            authority.resolve(&db, &token).await,
            Err(AuthError::UnknownCustomer)
        ));
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token("Bearer abc.def.ghi"), Some("abc.def.ghi"));
        assert_eq!(extract_bearer_token("Basic dXNlcjpwYXNz"), None);
        assert_eq!(extract_bearer_token("Bearer "), None);
        assert_eq!(extract_bearer_token("bearer abc"), None);
    }
}
