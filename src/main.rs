// src/main.rs
use axum::{extract::Extension, middleware, Router};
use dotenv::dotenv;
use reqwest::Client;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::path::PathBuf;
use std::time::Duration;
use std::{net::SocketAddr, str::FromStr, sync::Arc};
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod auth;
mod common;
mod logging_middleware;
mod services;
mod users;

use common::config::Settings;
use common::AppState;
use services::{InMemoryOAuthStateStore, OAuthProviders, TokenCipher};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    // ========================================================================
    // CONFIGURATION
    // ========================================================================

    let settings = Settings::from_env()?;

    // ========================================================================
    // DATABASE SETUP
    // ========================================================================

    if let Some(path_part) = settings.database_url.strip_prefix("sqlite://") {
        let path_without_params = path_part.split('?').next().unwrap_or("");
        if !path_without_params.is_empty() && !path_without_params.starts_with(':') {
            let db_path = PathBuf::from(path_without_params);
            if let Some(parent) = db_path.parent() {
                if !parent.as_os_str().is_empty() {
                    tokio::fs::create_dir_all(parent).await?;
                }
            }
        }
    }

    let connect_options =
        SqliteConnectOptions::from_str(&settings.database_url)?.create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .connect_with(connect_options)
        .await?;

    common::migrations::run_migrations(&pool).await?;

    // ========================================================================
    // SERVICE INITIALIZATION
    // ========================================================================

    let http_client = Client::builder()
        .timeout(Duration::from_secs(30))
        .build()?;

    let users = users::repository::UserRepository::new(pool.clone());
    let identities = auth::identity::AuthIdentityRepository::new(pool.clone());

    let oauth_providers = OAuthProviders::from_settings(
        settings.google.clone(),
        settings.github.clone(),
        &http_client,
    );
    if oauth_providers.google.is_some() {
        info!("Google OAuth provider configured");
    }
    if oauth_providers.github.is_some() {
        info!("GitHub OAuth provider configured");
    }

    let oauth_state = Arc::new(InMemoryOAuthStateStore::new(Duration::from_secs(
        settings.oauth_state_ttl_secs,
    )));

    let token_cipher = match settings.token_encryption_key.as_deref() {
        Some(key) => match TokenCipher::from_key(key) {
            Ok(cipher) => {
                info!("Provider token encryption enabled");
                Some(Arc::new(cipher))
            }
            Err(e) => {
                warn!(error = %e, "Invalid TOKEN_ENCRYPTION_KEY, provider tokens will not be stored");
                None
            }
        },
        None => {
            info!("TOKEN_ENCRYPTION_KEY not set, provider tokens will not be stored");
            None
        }
    };

    // ========================================================================
    // APPLICATION STATE
    // ========================================================================

    let cors_origins = settings.cors_origins.clone();
    let port = settings.port;

    let app_state = AppState {
        settings,
        users,
        identities,
        oauth_providers,
        oauth_state,
        token_cipher,
    };

    let shared = Arc::new(app_state);

    // ========================================================================
    // ROUTER COMPOSITION
    // ========================================================================

    let app = Router::new()
        .merge(auth::auth_routes())
        .merge(users::users_routes())
        .layer(middleware::from_fn(logging_middleware::log_request_response))
        .layer(Extension(shared))
        .layer({
            let origins: Vec<axum::http::HeaderValue> = cors_origins
                .split(',')
                .filter_map(|origin| origin.trim().parse().ok())
                .collect();

            CorsLayer::new()
                .allow_origin(origins)
                .allow_methods([
                    axum::http::Method::GET,
                    axum::http::Method::POST,
                    axum::http::Method::PUT,
                    axum::http::Method::DELETE,
                    axum::http::Method::OPTIONS,
                ])
                .allow_headers([
                    axum::http::header::CONTENT_TYPE,
                    axum::http::header::AUTHORIZATION,
                ])
                .allow_credentials(true)
        })
        .layer(TraceLayer::new_for_http());

    // ========================================================================
    // SERVER STARTUP
    // ========================================================================

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}
