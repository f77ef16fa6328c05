use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub storage: StorageConfig,
    pub google: Option<GoogleConfig>,
    /// Local accounts upserted at startup. There is no self-service
    /// registration; this is the only way local credentials exist.
    #[serde(rename = "account")]
    pub accounts: Vec<AccountConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AccountConfig {
    pub username: String,
    pub password: String,
    pub name: String,
    #[serde(default = "default_role")]
    pub role: String,
}

fn default_role() -> String {
    "user".to_string()
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: String,
    /// Origin of the SPA, used for CORS and OAuth redirects.
    pub frontend_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8080".to_string(),
            frontend_url: "http://localhost:5173".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://data/modlike.db".to_string(),
            max_connections: 8,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_expiry_seconds: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            jwt_expiry_seconds: 24 * 60 * 60,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub path: String,
    pub max_upload_size: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: "data/uploads".to_string(),
            max_upload_size: 5 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct GoogleConfig {
    pub client_id: String,
    pub client_secret: String,
    pub callback_url: String,
}

impl Config {
    /// Load the config file, falling back to defaults when it does not
    /// exist. A missing `jwt_secret` is an error so tokens are never
    /// signed with an empty key.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("reading config file {}", path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("parsing config file {}", path.display()))?
        } else {
            tracing::warn!("config file {} not found, using defaults", path.display());
            Config::default()
        };

        if let Ok(secret) = std::env::var("MODLIKE_JWT_SECRET") {
            config.auth.jwt_secret = secret;
        }
        if let Ok(secret) = std::env::var("MODLIKE_GOOGLE_CLIENT_SECRET") {
            if let Some(google) = config.google.as_mut() {
                google.client_secret = secret;
            }
        }
        if config.auth.jwt_secret.is_empty() {
            anyhow::bail!(
                "auth.jwt_secret is not set (config file or MODLIKE_JWT_SECRET)"
            );
        }
        Ok(config)
    }
}
