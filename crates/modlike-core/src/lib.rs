pub mod auth;
pub mod enrollment;
pub mod error;
pub mod identity;
pub mod lifecycle;

use modlike_db::DbPool;
use modlike_media::ImageStore;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub config: AppConfig,
    /// Local image store backing the public `uploads/` prefix.
    pub images: Arc<ImageStore>,
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub jwt_secret: String,
    pub jwt_expiry_seconds: u64,
    /// Origin of the SPA, used for CORS and OAuth redirects
    /// (e.g. http://localhost:5173).
    pub frontend_url: String,
    pub storage_path: String,
    pub max_upload_size: u64,
    /// Google OAuth is optional; local login works without it.
    pub google: Option<GoogleConfig>,
}

#[derive(Clone, Debug)]
pub struct GoogleConfig {
    pub client_id: String,
    pub client_secret: String,
    pub callback_url: String,
}
