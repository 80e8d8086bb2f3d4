use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::SecurityConfig;

/// What a token is good for. Password-reset tokens are short-lived and must
/// not be accepted as access tokens (and vice versa).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenScope {
    Access,
    PasswordReset,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub scope: TokenScope,
    pub exp: i64,
    pub iat: i64,
    pub jti: Uuid,
}

impl Claims {
    fn new(user_id: Uuid, scope: TokenScope, lifetime: Duration) -> Self {
        let now = Utc::now();
        Self {
            sub: user_id,
            scope,
            exp: (now + lifetime).timestamp(),
            iat: now.timestamp(),
            jti: Uuid::new_v4(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("JWT secret not configured")]
    MissingSecret,
    #[error("Token generation failed: {0}")]
    TokenGeneration(String),
    #[error("Token expired")]
    TokenExpired,
    #[error("Invalid token")]
    InvalidToken,
    #[error("Password hashing failed: {0}")]
    Hashing(String),
}

impl From<AuthError> for crate::error::ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::TokenExpired => crate::error::ApiError::unauthorized("Token expired"),
            AuthError::InvalidToken => crate::error::ApiError::unauthorized("Invalid token"),
            AuthError::MissingSecret => {
                tracing::error!("JWT secret not configured");
                crate::error::ApiError::service_unavailable("Authentication not configured")
            }
            AuthError::TokenGeneration(msg) | AuthError::Hashing(msg) => {
                tracing::error!("Auth failure: {}", msg);
                crate::error::ApiError::internal_server_error("Authentication failure")
            }
        }
    }
}

/// Issue an access token for an authenticated user.
pub fn generate_access_token(security: &SecurityConfig, user_id: Uuid) -> Result<String, AuthError> {
    sign(
        security,
        Claims::new(
            user_id,
            TokenScope::Access,
            Duration::hours(security.jwt_expiry_hours),
        ),
    )
}

/// Issue a short-lived token that may only be used to reset a password.
pub fn generate_reset_token(security: &SecurityConfig, user_id: Uuid) -> Result<String, AuthError> {
    sign(
        security,
        Claims::new(
            user_id,
            TokenScope::PasswordReset,
            Duration::minutes(security.reset_token_expiry_mins),
        ),
    )
}

fn sign(security: &SecurityConfig, claims: Claims) -> Result<String, AuthError> {
    if security.jwt_secret.is_empty() {
        return Err(AuthError::MissingSecret);
    }

    let key = EncodingKey::from_secret(security.jwt_secret.as_bytes());
    encode(&Header::default(), &claims, &key)
        .map_err(|e| AuthError::TokenGeneration(e.to_string()))
}

/// Validate signature and expiry, returning the claims.
pub fn decode_token(security: &SecurityConfig, token: &str) -> Result<Claims, AuthError> {
    if security.jwt_secret.is_empty() {
        return Err(AuthError::MissingSecret);
    }

    let key = DecodingKey::from_secret(security.jwt_secret.as_bytes());
    let data = decode::<Claims>(token, &key, &Validation::default()).map_err(|e| {
        match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => AuthError::InvalidToken,
        }
    })?;

    Ok(data.claims)
}

/// Hash a password with Argon2id and a per-password random salt. Returns a
/// PHC-formatted string safe for database storage.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::Hashing(e.to_string()))
}

/// Verify a password against a stored PHC hash.
pub fn verify_password(password: &str, password_hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(password_hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn security() -> SecurityConfig {
        SecurityConfig {
            jwt_secret: "test-secret".to_string(),
            jwt_expiry_hours: 1,
            reset_token_expiry_mins: 30,
        }
    }

    #[test]
    fn access_token_round_trips() {
        let security = security();
        let user_id = Uuid::new_v4();

        let token = generate_access_token(&security, user_id).unwrap();
        let claims = decode_token(&security, &token).unwrap();

        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.scope, TokenScope::Access);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn reset_token_carries_reset_scope() {
        let security = security();
        let token = generate_reset_token(&security, Uuid::new_v4()).unwrap();
        let claims = decode_token(&security, &token).unwrap();
        assert_eq!(claims.scope, TokenScope::PasswordReset);
    }

    #[test]
    fn tampered_token_is_rejected() {
        let security = security();
        let token = generate_access_token(&security, Uuid::new_v4()).unwrap();

        let other = SecurityConfig {
            jwt_secret: "another-secret".to_string(),
            ..security
        };
        assert!(matches!(
            decode_token(&other, &token),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn empty_secret_refuses_to_sign() {
        let security = SecurityConfig {
            jwt_secret: String::new(),
            jwt_expiry_hours: 1,
            reset_token_expiry_mins: 30,
        };
        assert!(matches!(
            generate_access_token(&security, Uuid::new_v4()),
            Err(AuthError::MissingSecret)
        ));
    }

    #[test]
    fn password_hash_verifies() {
        let hash = hash_password("hunter2-but-longer").unwrap();
        assert_ne!(hash, "hunter2-but-longer");
        assert!(verify_password("hunter2-but-longer", &hash));
        assert!(!verify_password("wrong-password", &hash));
    }

    #[test]
    fn garbage_hash_never_verifies() {
        assert!(!verify_password("anything", "not-a-phc-string"));
    }
}
