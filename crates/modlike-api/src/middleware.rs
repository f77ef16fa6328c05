use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use modlike_core::{auth, AppState};
use modlike_db::users::{self, UserRow};

use crate::error::ApiError;

/// Authenticated requester. The token proves identity; the user row is
/// re-resolved from the database on every request so role changes take
/// effect immediately and deleted accounts are locked out.
pub struct AuthUser {
    pub user: UserRow,
}

fn extract_bearer(parts: &Parts) -> Result<&str, ApiError> {
    let raw = parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("Authorization header missing".into()))?;

    raw.strip_prefix("Bearer ")
        .ok_or_else(|| ApiError::Unauthorized("Token missing".into()))
}

async fn resolve_user(parts: &Parts, state: &AppState) -> Result<UserRow, ApiError> {
    let token = extract_bearer(parts)?;
    let claims =
        auth::validate_token(token, &state.config.jwt_secret).map_err(|e| match e {
            auth::AuthError::Expired => ApiError::Unauthorized("Token expired".into()),
            auth::AuthError::Invalid => ApiError::Unauthorized("Invalid token".into()),
        })?;

    users::get_user_by_id(&state.db, claims.sub)
        .await
        .map_err(|_| ApiError::Internal(anyhow::anyhow!("database error")))?
        .ok_or_else(|| ApiError::Unauthorized("User not found".into()))
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = resolve_user(parts, state).await?;
        Ok(AuthUser { user })
    }
}

/// Extractor that requires the authenticated user to hold the admin role.
pub struct AdminUser {
    pub user: UserRow,
}

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = resolve_user(parts, state).await?;
        require_role(&user, &[users::ROLE_ADMIN])?;
        Ok(AdminUser { user })
    }
}

/// Check the resolved role against the allowed set for an operation,
/// reporting required vs actual on mismatch.
pub fn require_role(user: &UserRow, allowed: &[&str]) -> Result<(), ApiError> {
    if allowed.contains(&user.role.as_str()) {
        return Ok(());
    }
    Err(ApiError::Forbidden(format!(
        "insufficient permissions: required role {:?}, your role is {}",
        allowed, user.role
    )))
}
