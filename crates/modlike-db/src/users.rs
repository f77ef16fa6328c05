use crate::{DbError, DbPool};
use chrono::{DateTime, Utc};

pub const ROLE_USER: &str = "user";
pub const ROLE_ADMIN: &str = "admin";

pub const KIND_GOOGLE: &str = "google";
pub const KIND_LOCAL: &str = "local";

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRow {
    pub id: i64,
    pub account_kind: String,
    pub google_id: Option<String>,
    pub username: Option<String>,
    pub password_hash: Option<String>,
    pub name: String,
    pub email: Option<String>,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

impl UserRow {
    pub fn is_admin(&self) -> bool {
        self.role == ROLE_ADMIN
    }
}

pub async fn get_user_by_id(pool: &DbPool, id: i64) -> Result<Option<UserRow>, DbError> {
    let row = sqlx::query_as::<_, UserRow>(
        "SELECT id, account_kind, google_id, username, password_hash, name, email, role, created_at
         FROM users WHERE id = ?1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn get_user_by_google_id(
    pool: &DbPool,
    google_id: &str,
) -> Result<Option<UserRow>, DbError> {
    let row = sqlx::query_as::<_, UserRow>(
        "SELECT id, account_kind, google_id, username, password_hash, name, email, role, created_at
         FROM users WHERE google_id = ?1",
    )
    .bind(google_id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn get_user_by_username(
    pool: &DbPool,
    username: &str,
) -> Result<Option<UserRow>, DbError> {
    let row = sqlx::query_as::<_, UserRow>(
        "SELECT id, account_kind, google_id, username, password_hash, name, email, role, created_at
         FROM users WHERE username = ?1",
    )
    .bind(username)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Create a user record for a Google identity seen for the first time.
/// New external users always start with the default `user` role.
pub async fn create_google_user(
    pool: &DbPool,
    google_id: &str,
    name: &str,
    email: &str,
) -> Result<UserRow, DbError> {
    let row = sqlx::query_as::<_, UserRow>(
        "INSERT INTO users (account_kind, google_id, name, email, role)
         VALUES ('google', ?1, ?2, ?3, 'user')
         RETURNING id, account_kind, google_id, username, password_hash, name, email, role, created_at",
    )
    .bind(google_id)
    .bind(name)
    .bind(email)
    .fetch_one(pool)
    .await?;
    Ok(row)
}

/// Insert or update a pre-provisioned local account. The password is
/// stored as an argon2 PHC string produced by the caller.
pub async fn upsert_local_user(
    pool: &DbPool,
    username: &str,
    password_hash: &str,
    name: &str,
    role: &str,
) -> Result<UserRow, DbError> {
    let row = sqlx::query_as::<_, UserRow>(
        "INSERT INTO users (account_kind, username, password_hash, name, role)
         VALUES ('local', ?1, ?2, ?3, ?4)
         ON CONFLICT (username) DO UPDATE SET
             password_hash = excluded.password_hash,
             name = excluded.name,
             role = excluded.role
         RETURNING id, account_kind, google_id, username, password_hash, name, email, role, created_at",
    )
    .bind(username)
    .bind(password_hash)
    .bind(name)
    .bind(role)
    .fetch_one(pool)
    .await?;
    Ok(row)
}
