use modlike_db::{users, DbPool};

use crate::auth::{hash_password, verify_password};
use crate::error::CoreError;

/// Verified profile handed back by the identity provider after the
/// OAuth handshake. The handshake itself is out of scope; callers only
/// see this triple.
#[derive(Debug, Clone)]
pub struct GoogleProfile {
    pub google_id: String,
    pub email: String,
    pub name: String,
}

/// Map an external Google identity to an internal user record, creating
/// one with the default `user` role on first sight.
pub async fn resolve_google(
    pool: &DbPool,
    profile: &GoogleProfile,
) -> Result<users::UserRow, CoreError> {
    if let Some(existing) = users::get_user_by_google_id(pool, &profile.google_id).await? {
        tracing::debug!(user_id = existing.id, "google user logged in");
        return Ok(existing);
    }

    let created =
        users::create_google_user(pool, &profile.google_id, &profile.name, &profile.email).await?;
    tracing::info!(user_id = created.id, "created user for new google identity");
    Ok(created)
}

/// Validate a local credential pair. Unknown usernames and wrong
/// passwords produce the same error, and the unknown-username path still
/// burns a hash so the two are not trivially distinguishable by timing.
pub async fn authenticate_local(
    pool: &DbPool,
    username: &str,
    password: &str,
) -> Result<users::UserRow, CoreError> {
    let user = users::get_user_by_username(pool, username).await?;

    let Some(user) = user else {
        let _ = hash_password(password);
        return Err(CoreError::InvalidCredentials);
    };
    let Some(stored_hash) = user.password_hash.as_deref() else {
        return Err(CoreError::InvalidCredentials);
    };
    if !verify_password(password, stored_hash) {
        return Err(CoreError::InvalidCredentials);
    }

    tracing::debug!(user_id = user.id, "local user logged in");
    Ok(user)
}
