// src/services/oauth.rs
//! OAuth 2.0 Authorization Code + PKCE exchange clients
//!
//! One `OAuthProvider` implementation per identity provider, all returning
//! the same normalized `ProviderProfile` shape so the identity reconciler
//! stays provider-agnostic.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error};

use crate::auth::models::Provider;
use crate::common::config::OAuthClientConfig;

const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v2/userinfo";

const GITHUB_AUTH_URL: &str = "https://github.com/login/oauth/authorize";
const GITHUB_TOKEN_URL: &str = "https://github.com/login/oauth/access_token";
const GITHUB_USERINFO_URL: &str = "https://api.github.com/user";

#[derive(Debug, Error)]
pub enum OAuthError {
    #[error("OAuth provider not configured: {0}")]
    NotConfigured(&'static str),

    #[error("provider returned HTTP {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("request to provider failed: {0}")]
    Transport(String),

    #[error("malformed provider response: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for OAuthError {
    fn from(e: reqwest::Error) -> Self {
        OAuthError::Transport(e.to_string())
    }
}

/// Token endpoint response, as returned by the provider
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderTokens {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in: Option<i64>,
    pub token_type: Option<String>,
    pub scope: Option<String>,
    pub id_token: Option<String>,
}

/// Profile attributes normalized across providers
#[derive(Debug, Clone, Default)]
pub struct ProviderProfile {
    /// Provider-assigned stable subject identifier ("sub" / "id")
    pub subject: Option<String>,
    pub email: Option<String>,
    pub email_verified: Option<bool>,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub locale: Option<String>,
}

/// Capability interface for one identity provider.
///
/// Each call is an independent outbound request; implementations hold no
/// mutable state beyond configuration and the shared HTTP client.
#[async_trait]
pub trait OAuthProvider: Send + Sync {
    fn kind(&self) -> Provider;

    /// Builds the provider's consent screen URL for the authorization
    /// redirect.
    fn authorization_url(&self, state: &str, nonce: &str, code_challenge: &str) -> String;

    /// Exchanges an authorization code (plus the PKCE verifier) for provider
    /// tokens.
    async fn exchange_code(
        &self,
        code: &str,
        code_verifier: &str,
    ) -> Result<ProviderTokens, OAuthError>;

    /// Fetches the provider's profile for an access token, normalized to
    /// `ProviderProfile`.
    async fn fetch_profile(&self, access_token: &str) -> Result<ProviderProfile, OAuthError>;
}

/// Reads a token endpoint response, surfacing upstream HTTP errors (provider
/// said no) distinctly from transport errors (we never got an answer).
async fn read_token_response(response: reqwest::Response) -> Result<ProviderTokens, OAuthError> {
    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_string());
        error!(status = %status, "Token exchange failed");
        return Err(OAuthError::Upstream {
            status: status.as_u16(),
            body,
        });
    }

    response
        .json::<ProviderTokens>()
        .await
        .map_err(|e| OAuthError::Malformed(e.to_string()))
}

// ---- Google ----

pub struct GoogleProvider {
    config: OAuthClientConfig,
    http: Client,
}

impl GoogleProvider {
    pub fn new(config: OAuthClientConfig, http: Client) -> Self {
        Self { config, http }
    }
}

/// Google userinfo v2 payload (note: `id` and `verified_email`, not the OIDC
/// `sub`/`email_verified` names)
#[derive(Debug, Deserialize)]
struct GoogleUserInfo {
    id: Option<String>,
    sub: Option<String>,
    email: Option<String>,
    verified_email: Option<bool>,
    name: Option<String>,
    picture: Option<String>,
    locale: Option<String>,
}

#[async_trait]
impl OAuthProvider for GoogleProvider {
    fn kind(&self) -> Provider {
        Provider::Google
    }

    fn authorization_url(&self, state: &str, nonce: &str, code_challenge: &str) -> String {
        let params = [
            ("client_id", self.config.client_id.as_str()),
            ("redirect_uri", self.config.redirect_uri.as_str()),
            ("response_type", "code"),
            ("scope", "openid email profile"),
            ("state", state),
            ("nonce", nonce),
            ("code_challenge", code_challenge),
            ("code_challenge_method", "S256"),
            ("access_type", "offline"),
            ("prompt", "consent"),
        ];

        let query: Vec<String> = params
            .iter()
            .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
            .collect();

        format!("{}?{}", GOOGLE_AUTH_URL, query.join("&"))
    }

    async fn exchange_code(
        &self,
        code: &str,
        code_verifier: &str,
    ) -> Result<ProviderTokens, OAuthError> {
        let params = [
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("code", code),
            ("grant_type", "authorization_code"),
            ("redirect_uri", self.config.redirect_uri.as_str()),
            ("code_verifier", code_verifier),
        ];

        debug!(provider = "google", "Exchanging authorization code for tokens");

        let response = self.http.post(GOOGLE_TOKEN_URL).form(&params).send().await?;
        read_token_response(response).await
    }

    async fn fetch_profile(&self, access_token: &str) -> Result<ProviderProfile, OAuthError> {
        let response = self
            .http
            .get(GOOGLE_USERINFO_URL)
            .bearer_auth(access_token)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(OAuthError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let info = response
            .json::<GoogleUserInfo>()
            .await
            .map_err(|e| OAuthError::Malformed(e.to_string()))?;

        Ok(ProviderProfile {
            subject: info.id.or(info.sub),
            email: info.email,
            email_verified: info.verified_email,
            display_name: info.name,
            avatar_url: info.picture,
            locale: info.locale,
        })
    }
}

// ---- GitHub ----

pub struct GithubProvider {
    config: OAuthClientConfig,
    http: Client,
}

impl GithubProvider {
    pub fn new(config: OAuthClientConfig, http: Client) -> Self {
        Self { config, http }
    }
}

#[derive(Debug, Deserialize)]
struct GithubUserInfo {
    id: Option<i64>,
    login: Option<String>,
    name: Option<String>,
    email: Option<String>,
    avatar_url: Option<String>,
}

#[async_trait]
impl OAuthProvider for GithubProvider {
    fn kind(&self) -> Provider {
        Provider::Github
    }

    fn authorization_url(&self, state: &str, _nonce: &str, code_challenge: &str) -> String {
        let params = [
            ("client_id", self.config.client_id.as_str()),
            ("redirect_uri", self.config.redirect_uri.as_str()),
            ("scope", "read:user user:email"),
            ("state", state),
            ("code_challenge", code_challenge),
            ("code_challenge_method", "S256"),
        ];

        let query: Vec<String> = params
            .iter()
            .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
            .collect();

        format!("{}?{}", GITHUB_AUTH_URL, query.join("&"))
    }

    async fn exchange_code(
        &self,
        code: &str,
        code_verifier: &str,
    ) -> Result<ProviderTokens, OAuthError> {
        let params = [
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("code", code),
            ("redirect_uri", self.config.redirect_uri.as_str()),
            ("code_verifier", code_verifier),
        ];

        debug!(provider = "github", "Exchanging authorization code for tokens");

        // GitHub answers with form-encoded data unless asked for JSON
        let response = self
            .http
            .post(GITHUB_TOKEN_URL)
            .header(reqwest::header::ACCEPT, "application/json")
            .form(&params)
            .send()
            .await?;
        read_token_response(response).await
    }

    async fn fetch_profile(&self, access_token: &str) -> Result<ProviderProfile, OAuthError> {
        // GitHub's API rejects requests without a User-Agent
        let response = self
            .http
            .get(GITHUB_USERINFO_URL)
            .bearer_auth(access_token)
            .header(reqwest::header::USER_AGENT, "wishy-api")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(OAuthError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let info = response
            .json::<GithubUserInfo>()
            .await
            .map_err(|e| OAuthError::Malformed(e.to_string()))?;

        Ok(ProviderProfile {
            subject: info.id.map(|id| id.to_string()),
            email: info.email,
            // GitHub does not expose a verified flag on the user endpoint
            email_verified: None,
            display_name: info.name.or(info.login),
            avatar_url: info.avatar_url,
            locale: None,
        })
    }
}

// ---- Registry ----

/// The set of providers configured for this deployment.
///
/// An unconfigured provider simply resolves to None; Facebook and Apple are
/// valid identity rows but have no exchange client yet.
#[derive(Clone, Default)]
pub struct OAuthProviders {
    pub google: Option<Arc<GoogleProvider>>,
    pub github: Option<Arc<GithubProvider>>,
}

impl OAuthProviders {
    pub fn from_settings(
        google: Option<OAuthClientConfig>,
        github: Option<OAuthClientConfig>,
        http: &Client,
    ) -> Self {
        Self {
            google: google.map(|c| Arc::new(GoogleProvider::new(c, http.clone()))),
            github: github.map(|c| Arc::new(GithubProvider::new(c, http.clone()))),
        }
    }

    pub fn get(&self, kind: Provider) -> Option<Arc<dyn OAuthProvider>> {
        match kind {
            Provider::Google => self
                .google
                .clone()
                .map(|p| p as Arc<dyn OAuthProvider>),
            Provider::Github => self
                .github
                .clone()
                .map(|p| p as Arc<dyn OAuthProvider>),
            Provider::Facebook | Provider::Apple => None,
        }
    }
}
