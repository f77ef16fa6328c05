use argon2::password_hash::{rand_core::OsRng, PasswordHash, SaltString};
use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use modlike_db::users::UserRow;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::CoreError;

/// Signed session credential payload. `kind` tags the account kind so
/// clients (and logs) can tell Google sessions from local ones; the
/// authoritative user record is always re-resolved by id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i64,
    pub role: String,
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    pub iat: i64,
    pub exp: i64,
}

/// Validation failures are split so clients can be told "Token expired"
/// vs "Invalid token".
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("token expired")]
    Expired,
    #[error("invalid token")]
    Invalid,
}

pub fn issue_token(
    user: &UserRow,
    secret: &str,
    expiry_seconds: u64,
) -> Result<String, CoreError> {
    let now = Utc::now().timestamp();
    let claims = Claims {
        sub: user.id,
        role: user.role.clone(),
        kind: user.account_kind.clone(),
        email: user.email.clone(),
        username: user.username.clone(),
        iat: now,
        exp: now + expiry_seconds as i64,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| CoreError::Internal(format!("token encoding failed: {e}")))
}

pub fn validate_token(token: &str, secret: &str) -> Result<Claims, AuthError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::Expired,
        _ => AuthError::Invalid,
    })
}

/// Salted argon2id hash in PHC string form.
pub fn hash_password(password: &str) -> Result<String, CoreError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| CoreError::Internal(format!("password hashing failed: {e}")))
}

pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored_hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}
