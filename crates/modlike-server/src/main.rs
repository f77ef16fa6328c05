use anyhow::Result;
use axum::http::{header, HeaderValue, Method};
use clap::Parser;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

mod cli;
mod config;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("modlike=info,tower_http=debug")),
        )
        .init();

    let args = cli::Args::parse();
    let mut config = config::Config::load(&args.config)?;
    if let Some(bind) = args.bind {
        config.server.bind_address = bind;
    }

    ensure_data_dirs(&config);

    let db = modlike_db::create_pool(&config.database.url, config.database.max_connections).await?;
    modlike_db::run_migrations(&db).await?;
    provision_accounts(&db, &config.accounts).await?;

    let images = Arc::new(modlike_media::ImageStore::new(modlike_media::StorageConfig {
        base_path: config.storage.path.clone().into(),
        max_file_size: config.storage.max_upload_size,
    }));

    let state = modlike_core::AppState {
        db,
        config: modlike_core::AppConfig {
            jwt_secret: config.auth.jwt_secret.clone(),
            jwt_expiry_seconds: config.auth.jwt_expiry_seconds,
            frontend_url: config.server.frontend_url.clone(),
            storage_path: config.storage.path.clone(),
            max_upload_size: config.storage.max_upload_size,
            google: config.google.as_ref().map(|g| modlike_core::GoogleConfig {
                client_id: g.client_id.clone(),
                client_secret: g.client_secret.clone(),
                callback_url: g.callback_url.clone(),
            }),
        },
        images,
    };

    let cors = CorsLayer::new()
        .allow_origin(
            config
                .server
                .frontend_url
                .parse::<HeaderValue>()
                .map_err(|e| anyhow::anyhow!("invalid frontend_url: {e}"))?,
        )
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    let app = modlike_api::build_router()
        .with_state(state)
        .nest_service("/uploads", ServeDir::new(&config.storage.path))
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(&config.server.bind_address).await?;
    print_startup_banner(&config);

    let shutdown_signal = async {
        let _ = tokio::signal::ctrl_c().await;
        println!();
        tracing::info!("Shutting down...");
    };

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    Ok(())
}

/// Upsert the configured local accounts. Passwords are re-hashed on
/// every boot so a changed config value takes effect.
async fn provision_accounts(
    db: &modlike_db::DbPool,
    accounts: &[config::AccountConfig],
) -> Result<()> {
    for account in accounts {
        let hash = modlike_core::auth::hash_password(&account.password)
            .map_err(|e| anyhow::anyhow!("hashing password for {}: {e}", account.username))?;
        let user = modlike_db::users::upsert_local_user(
            db,
            &account.username,
            &hash,
            &account.name,
            &account.role,
        )
        .await?;
        tracing::info!(user_id = user.id, username = %account.username, role = %account.role, "local account provisioned");
    }
    Ok(())
}

/// Ensure the upload and database directories exist before the server
/// starts accepting requests.
fn ensure_data_dirs(config: &config::Config) {
    if let Err(e) = std::fs::create_dir_all(&config.storage.path) {
        tracing::warn!("Could not create directory '{}': {}", config.storage.path, e);
    }

    if let Some(db_path) = config
        .database
        .url
        .strip_prefix("sqlite://")
        .and_then(|s| s.split('?').next())
    {
        if let Some(parent) = std::path::Path::new(db_path).parent() {
            if !parent.as_os_str().is_empty() {
                let _ = std::fs::create_dir_all(parent);
            }
        }
    }
}

fn print_startup_banner(config: &config::Config) {
    println!();
    println!("  __  __           _ _ _ _");
    println!(" |  \\/  | ___   __| | (_) | _____");
    println!(" | |\\/| |/ _ \\ / _` | | | |/ / _ \\");
    println!(" | |  | | (_) | (_| | | |   <  __/");
    println!(" |_|  |_|\\___/ \\__,_|_|_|_|\\_\\___|");
    println!();
    println!("  Listening:   http://{}", config.server.bind_address);
    println!("  Frontend:    {}", config.server.frontend_url);
    println!("  Database:    {}", config.database.url);
    println!("  Uploads:     {}", config.storage.path);
    println!(
        "  Google SSO:  {}",
        if config.google.is_some() {
            "Configured"
        } else {
            "Disabled"
        }
    );
    println!();
}
