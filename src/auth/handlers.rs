//! Authentication handlers

use axum::extract::{Extension, Json, Path, Query};
use axum::http::StatusCode;
use axum::response::Redirect;
use chrono::{Duration, Utc};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::models::{OAuthCallbackParams, Provider, RegisterRequest};
use super::password::hash_password;
use super::reconciler::reconcile;
use super::tokens::issue_access_token;
use super::validators::RegisterValidator;
use super::{identity::IdentityUpdate, pkce};
use crate::common::{safe_email_log, safe_token_log, ApiError, AppState, Validator};
use crate::services::{OAuthError, OAuthTransaction, ProviderTokens};
use crate::users::models::{NewUser, User};

impl From<OAuthError> for ApiError {
    fn from(e: OAuthError) -> Self {
        match e {
            // The provider answered with an error: the failure is upstream,
            // not local
            OAuthError::Upstream { status, body } => {
                error!(status = status, body = %body, "OAuth provider returned an error");
                ApiError::BadGateway("Error al comunicarse con el proveedor OAuth".to_string())
            }
            OAuthError::Transport(msg) => {
                error!(error = %msg, "Transport failure talking to OAuth provider");
                ApiError::InternalServer("Error interno del servidor".to_string())
            }
            OAuthError::Malformed(msg) => {
                error!(error = %msg, "Malformed OAuth provider response");
                ApiError::BadRequest("Respuesta del proveedor OAuth no válida".to_string())
            }
            OAuthError::NotConfigured(which) => {
                ApiError::InternalServer(format!("OAuth provider not configured: {}", which))
            }
        }
    }
}

/// POST /auth/register
/// Creates a local password account
///
/// # Request Body
/// ```json
/// {
///   "email": "alice@example.com",
///   "username": "alice",
///   "password": "...",
///   "confirm_password": "..."
/// }
/// ```
pub async fn register_handler(
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    info!(
        username = %payload.username,
        email = %safe_email_log(&payload.email),
        "Registration attempt"
    );

    let validation = RegisterValidator.validate(&payload);
    if !validation.is_valid {
        return Err(validation.into());
    }

    if state.users.get_by_email(&payload.email).await?.is_some() {
        return Err(ApiError::AlreadyExists {
            resource: "Usuario",
            field: "email",
            value: payload.email,
        });
    }

    if state
        .users
        .get_by_username(&payload.username)
        .await?
        .is_some()
    {
        return Err(ApiError::AlreadyExists {
            resource: "Usuario",
            field: "username",
            value: payload.username,
        });
    }

    let hashed = hash_password(&payload.password, &state.settings.password_pepper)
        .map_err(|e| ApiError::InternalServer(e.to_string()))?;

    let user = state
        .users
        .create(NewUser {
            email: Some(payload.email),
            username: Some(payload.username),
            hashed_password: Some(hashed),
            ..NewUser::default()
        })
        .await?;

    info!(user_id = %user.id, "User registered successfully");

    Ok((StatusCode::CREATED, Json(user)))
}

/// GET /auth/oauth/:provider/start
/// Starts the Authorization Code + PKCE flow: generates the PKCE material,
/// stores it under a fresh state value, and redirects to the provider's
/// consent screen.
pub async fn oauth_start_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(provider): Path<String>,
) -> Result<Redirect, ApiError> {
    let provider = parse_provider(&provider)?;

    let client = state
        .oauth_providers
        .get(provider)
        .ok_or(OAuthError::NotConfigured(provider.as_str()))?;

    let code_verifier = pkce::generate_code_verifier();
    let code_challenge = pkce::derive_code_challenge(&code_verifier);
    let oauth_state = pkce::generate_state();
    let nonce = pkce::generate_nonce();

    state
        .oauth_state
        .put(
            oauth_state.clone(),
            OAuthTransaction {
                code_verifier,
                nonce: nonce.clone(),
            },
        )
        .await;

    let url = client.authorization_url(&oauth_state, &nonce, &code_challenge);

    info!(
        provider = %provider,
        state = %safe_token_log(&oauth_state),
        "Starting OAuth flow, redirecting to provider consent screen"
    );

    Ok(Redirect::to(&url))
}

/// GET /auth/oauth/callback/:provider
/// Consumes the stored state, exchanges the code, reconciles the profile to
/// a local user, and redirects to the frontend with a freshly minted JWT.
pub async fn oauth_callback_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(provider): Path<String>,
    Query(params): Query<OAuthCallbackParams>,
) -> Result<Redirect, ApiError> {
    let provider = parse_provider(&provider)?;

    // The user denied consent, or the provider reported a flow error
    if let Some(error) = params.error.as_deref() {
        warn!(provider = %provider, oauth_error = %error, "OAuth callback carried an error");
        return Err(ApiError::BadRequest(format!(
            "Error en autenticación OAuth: {}",
            error
        )));
    }

    // Validate state (CSRF protection); take() consumes it so a replay of
    // the same callback fails here
    let oauth_state = params
        .state
        .as_deref()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::BadRequest("State inválido o expirado".to_string()))?;

    let transaction = state.oauth_state.take(oauth_state).await.ok_or_else(|| {
        warn!(
            provider = %provider,
            state = %safe_token_log(oauth_state),
            "OAuth state not found or expired"
        );
        ApiError::BadRequest("State inválido o expirado".to_string())
    })?;

    let code = params
        .code
        .as_deref()
        .filter(|c| !c.is_empty())
        .ok_or_else(|| {
            ApiError::BadRequest("No se recibió código de autorización".to_string())
        })?;

    let client = state
        .oauth_providers
        .get(provider)
        .ok_or(OAuthError::NotConfigured(provider.as_str()))?;

    debug!(provider = %provider, "Exchanging authorization code for tokens");
    let tokens = client
        .exchange_code(code, &transaction.code_verifier)
        .await?;

    debug!(provider = %provider, "Fetching provider profile");
    let profile = client.fetch_profile(&tokens.access_token).await?;

    let (user, identity, is_new_user) =
        reconcile(&state.users, &state.identities, provider, &profile).await?;

    // Persist provider tokens only when encryption at rest is available
    if let Some(cipher) = &state.token_cipher {
        if let Err(e) = store_provider_tokens(&state, cipher, &identity.id, &tokens).await {
            // Token storage is best-effort; the login itself already succeeded
            warn!(error = %e, identity_id = %identity.id, "Failed to store provider tokens");
        }
    }

    let jwt = issue_access_token(
        &user.id,
        &state.settings.jwt_secret,
        Duration::minutes(state.settings.jwt_access_expires_min),
    )
    .map_err(|e| {
        error!(error = %e, user_id = %user.id, "JWT encoding error during OAuth login");
        ApiError::InternalServer("jwt error".to_string())
    })?;

    info!(
        user_id = %user.id,
        email = %safe_email_log(user.email.as_deref().unwrap_or("")),
        provider = %provider,
        is_new_user = is_new_user,
        "OAuth login successful"
    );

    let frontend_url = state
        .settings
        .frontend_url
        .as_deref()
        .ok_or_else(|| ApiError::InternalServer("FRONTEND_URL is not configured".to_string()))?;

    Ok(Redirect::to(&format!(
        "{}/oauth/callback?token={}",
        frontend_url, jwt
    )))
}

fn parse_provider(raw: &str) -> Result<Provider, ApiError> {
    Provider::from_str(raw).map_err(|_| ApiError::NotFound {
        resource: "Proveedor OAuth",
        identifier: raw.to_string(),
    })
}

async fn store_provider_tokens(
    state: &AppState,
    cipher: &crate::services::TokenCipher,
    identity_id: &str,
    tokens: &ProviderTokens,
) -> Result<(), ApiError> {
    let access_token_enc = cipher
        .encrypt(&tokens.access_token)
        .map_err(|e| ApiError::InternalServer(e.to_string()))?;

    let refresh_token_enc = match tokens.refresh_token.as_deref() {
        Some(rt) => Some(
            cipher
                .encrypt(rt)
                .map_err(|e| ApiError::InternalServer(e.to_string()))?,
        ),
        None => None,
    };

    let token_expires_at = tokens
        .expires_in
        .map(|secs| (Utc::now() + Duration::seconds(secs)).to_rfc3339());

    state
        .identities
        .update(
            identity_id,
            IdentityUpdate {
                access_token_enc: Some(access_token_enc),
                refresh_token_enc,
                token_expires_at,
                ..IdentityUpdate::default()
            },
        )
        .await?;

    Ok(())
}
