// src/common/config.rs
//! Application configuration loaded from environment variables

use anyhow::Context;
use std::env;

/// OAuth client credentials for one identity provider.
///
/// A provider is only usable when all three values are present; a partially
/// configured provider is treated as not configured at all.
#[derive(Debug, Clone)]
pub struct OAuthClientConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
}

impl OAuthClientConfig {
    fn from_env(id_key: &str, secret_key: &str, redirect_key: &str) -> Option<Self> {
        let client_id = env::var(id_key).ok().filter(|v| !v.is_empty())?;
        let client_secret = env::var(secret_key).ok().filter(|v| !v.is_empty())?;
        let redirect_uri = env::var(redirect_key).ok().filter(|v| !v.is_empty())?;
        Some(Self {
            client_id,
            client_secret,
            redirect_uri,
        })
    }
}

/// Application settings resolved once at startup.
#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_access_expires_min: i64,
    pub password_pepper: String,
    pub frontend_url: Option<String>,
    pub cors_origins: String,
    pub port: u16,
    pub oauth_state_ttl_secs: u64,
    pub google: Option<OAuthClientConfig>,
    pub github: Option<OAuthClientConfig>,
    pub token_encryption_key: Option<String>,
}

impl Settings {
    /// Reads configuration from the environment.
    ///
    /// `JWT_SECRET` and `PASSWORD_PEPPER` have no safe default and are
    /// required; everything else falls back to development defaults.
    pub fn from_env() -> anyhow::Result<Self> {
        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET must be set")?;
        let password_pepper =
            env::var("PASSWORD_PEPPER").context("PASSWORD_PEPPER must be set")?;

        let jwt_access_expires_min = env::var("JWT_ACCESS_EXPIRES_MIN")
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(30);

        let oauth_state_ttl_secs = env::var("OAUTH_STATE_TTL_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(600);

        let port = env::var("PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(8080);

        Ok(Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://wishy_api.db".to_string()),
            jwt_secret,
            jwt_access_expires_min,
            password_pepper,
            frontend_url: env::var("FRONTEND_URL").ok().filter(|v| !v.is_empty()),
            cors_origins: env::var("CORS_ORIGINS").unwrap_or_else(|_| {
                "http://localhost:3000,http://localhost:5173".to_string()
            }),
            port,
            oauth_state_ttl_secs,
            google: OAuthClientConfig::from_env(
                "GOOGLE_CLIENT_ID",
                "GOOGLE_CLIENT_SECRET",
                "OAUTH_GOOGLE_REDIRECT_URI",
            ),
            github: OAuthClientConfig::from_env(
                "GITHUB_CLIENT_ID",
                "GITHUB_CLIENT_SECRET",
                "OAUTH_GITHUB_REDIRECT_URI",
            ),
            token_encryption_key: env::var("TOKEN_ENCRYPTION_KEY")
                .ok()
                .filter(|v| !v.is_empty()),
        })
    }
}
