use axum::{
    extract::{Query, State},
    response::Redirect,
    Json,
};
use modlike_core::{auth, identity, AppState, GoogleConfig};
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::middleware::AuthUser;

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<Value>, ApiError> {
    if body.username.trim().is_empty() || body.password.is_empty() {
        return Err(ApiError::BadRequest("Missing username or password".into()));
    }

    let user = identity::authenticate_local(&state.db, body.username.trim(), &body.password)
        .await?;
    let token = auth::issue_token(
        &user,
        &state.config.jwt_secret,
        state.config.jwt_expiry_seconds,
    )?;

    tracing::info!(user_id = user.id, "local user logged in");
    Ok(Json(json!({
        "message": "Login successful",
        "token": token,
        "role": user.role,
    })))
}

pub async fn me(auth: AuthUser) -> Json<Value> {
    let user = auth.user;
    Json(json!({
        "message": "User authenticated",
        "user": {
            "id": user.id,
            "name": user.name,
            "email": user.email,
            "username": user.username,
            "role": user.role,
            "account_kind": user.account_kind,
        },
    }))
}

fn google_config(state: &AppState) -> Result<&GoogleConfig, ApiError> {
    state.config.google.as_ref().ok_or_else(|| {
        ApiError::ServiceUnavailable("google login is not configured".into())
    })
}

pub async fn google_login(State(state): State<AppState>) -> Result<Redirect, ApiError> {
    let google = google_config(&state)?;

    let nonce: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect();
    let url = url::Url::parse_with_params(
        "https://accounts.google.com/o/oauth2/v2/auth",
        &[
            ("client_id", google.client_id.as_str()),
            ("redirect_uri", google.callback_url.as_str()),
            ("response_type", "code"),
            ("scope", "openid email profile"),
            ("state", nonce.as_str()),
        ],
    )
    .map_err(|e| ApiError::Internal(anyhow::anyhow!("authorize url: {e}")))?;

    Ok(Redirect::temporary(url.as_str()))
}

#[derive(Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub error: Option<String>,
    #[allow(dead_code)]
    pub state: Option<String>,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Deserialize)]
struct UserInfo {
    id: String,
    email: String,
    name: String,
}

/// Exchange the authorization code for a verified `{id, email, name}`
/// profile. The provider is a black box beyond this call pair.
async fn fetch_google_profile(
    google: &GoogleConfig,
    code: &str,
) -> anyhow::Result<identity::GoogleProfile> {
    let client = reqwest::Client::new();
    let token: TokenResponse = client
        .post("https://oauth2.googleapis.com/token")
        .form(&[
            ("code", code),
            ("client_id", google.client_id.as_str()),
            ("client_secret", google.client_secret.as_str()),
            ("redirect_uri", google.callback_url.as_str()),
            ("grant_type", "authorization_code"),
        ])
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    let info: UserInfo = client
        .get("https://www.googleapis.com/oauth2/v2/userinfo")
        .bearer_auth(&token.access_token)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    Ok(identity::GoogleProfile {
        google_id: info.id,
        email: info.email,
        name: info.name,
    })
}

/// OAuth callback: failures redirect back to the SPA login page rather
/// than rendering an API error, since the browser is mid-navigation.
pub async fn google_callback(
    State(state): State<AppState>,
    Query(query): Query<CallbackQuery>,
) -> Result<Redirect, ApiError> {
    let google = google_config(&state)?;
    let frontend = state.config.frontend_url.trim_end_matches('/');

    let code = match (query.code, query.error) {
        (Some(code), None) => code,
        (_, error) => {
            tracing::warn!(error = error.as_deref().unwrap_or("missing code"), "oauth callback failed");
            return Ok(Redirect::temporary(&format!(
                "{frontend}/login?error=auth_failed"
            )));
        }
    };

    let profile = match fetch_google_profile(google, &code).await {
        Ok(profile) => profile,
        Err(e) => {
            tracing::warn!("google code exchange failed: {e:#}");
            return Ok(Redirect::temporary(&format!(
                "{frontend}/login?error=auth_failed"
            )));
        }
    };

    let user = identity::resolve_google(&state.db, &profile).await?;
    let token = auth::issue_token(
        &user,
        &state.config.jwt_secret,
        state.config.jwt_expiry_seconds,
    )?;

    Ok(Redirect::temporary(&format!(
        "{frontend}/dashboard?token={token}&role={}",
        user.role
    )))
}
