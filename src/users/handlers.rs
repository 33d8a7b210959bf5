//! User-facing handlers: password login and the current-user endpoint

use axum::extract::{Extension, Json};
use chrono::Duration;
use std::sync::Arc;
use tracing::{info, warn};

use crate::auth::extractors::AuthedUser;
use crate::auth::models::{AccessTokenResponse, LoginRequest};
use crate::auth::password::verify_password;
use crate::auth::tokens::issue_access_token;
use crate::common::{safe_email_log, ApiError, AppState};
use crate::users::models::User;

/// POST /users/login
/// Authenticates username/password credentials and returns a bearer token.
///
/// The failure message never reveals whether the username exists, whether
/// the account is OAuth-only, or whether the password was wrong.
pub async fn login_handler(
    Extension(state): Extension<Arc<AppState>>,
    Json(credentials): Json<LoginRequest>,
) -> Result<Json<AccessTokenResponse>, ApiError> {
    info!(username = %credentials.username, "Login attempt");

    let user = state.users.get_by_username(&credentials.username).await?;

    let user = match user {
        Some(u) => u,
        None => {
            warn!(username = %credentials.username, "Login failed: unknown username");
            return Err(ApiError::Authentication("Credenciales incorrectas".to_string()));
        }
    };

    // OAuth-only accounts have no password to check; indistinguishable from
    // a wrong password on purpose
    let Some(stored_hash) = user.hashed_password.as_deref() else {
        warn!(user_id = %user.id, "Login failed: account has no password");
        return Err(ApiError::Authentication("Credenciales incorrectas".to_string()));
    };

    if !verify_password(&credentials.password, &state.settings.password_pepper, stored_hash) {
        state.users.record_login_failure(&user.id).await?;
        warn!(user_id = %user.id, "Login failed: wrong password");
        return Err(ApiError::Authentication("Credenciales incorrectas".to_string()));
    }

    if !user.is_active {
        warn!(user_id = %user.id, "Login rejected: inactive user");
        return Err(ApiError::Authorization("Usuario inactivo".to_string()));
    }

    state.users.record_login_success(&user.id).await?;

    let token = issue_access_token(
        &user.id,
        &state.settings.jwt_secret,
        Duration::minutes(state.settings.jwt_access_expires_min),
    )
    .map_err(|e| {
        warn!(error = %e, user_id = %user.id, "JWT encoding error during login");
        ApiError::InternalServer("jwt error".to_string())
    })?;

    info!(
        user_id = %user.id,
        email = %safe_email_log(user.email.as_deref().unwrap_or("")),
        "Login successful"
    );

    Ok(Json(AccessTokenResponse::bearer(token)))
}

/// GET /users/me
/// Returns the current authenticated user
pub async fn me_handler(authed: AuthedUser) -> Json<User> {
    Json(authed.user)
}
