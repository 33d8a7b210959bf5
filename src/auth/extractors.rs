//! Authentication extractors for Axum

use async_trait::async_trait;
use axum::{
    extract::{Extension, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use std::sync::Arc;
use tracing::{error, warn};

use super::tokens::validate_access_token;
use crate::common::{ApiError, AppState};
use crate::users::models::User;

/// Authenticated user extractor
///
/// Validates the bearer token, loads the user, and rejects inactive
/// accounts. All token failures (missing header, bad signature, expiry,
/// missing subject, unknown user) collapse into the same 401.
#[derive(Debug)]
pub struct AuthedUser {
    pub user: User,
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthedUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Extension(app_state): Extension<Arc<AppState>> =
            Extension::from_request_parts(parts, state)
                .await
                .map_err(|_| ApiError::InternalServer("missing app state".to_string()))?;

        // Extract Bearer token from Authorization header
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .map(|s| s.to_string());

        let token = match token {
            Some(t) => t,
            None => {
                warn!("Authentication failed: missing Authorization header");
                return Err(ApiError::Authentication(
                    "Token inválido o expirado".to_string(),
                ));
            }
        };

        // Handle "Bearer <token>" format or raw token
        let bare_token = token.strip_prefix("Bearer ").unwrap_or(&token);

        let claims = match validate_access_token(bare_token, &app_state.settings.jwt_secret) {
            Some(c) => c,
            None => {
                return Err(ApiError::Authentication(
                    "Token inválido o expirado".to_string(),
                ));
            }
        };

        if claims.sub.is_empty() {
            warn!("Authentication failed: token without subject");
            return Err(ApiError::Authentication(
                "Token inválido o expirado".to_string(),
            ));
        }

        let user = app_state.users.get(&claims.sub).await.map_err(|e| {
            error!(
                error = %e,
                user_id = %claims.sub,
                "Database error during user lookup in authentication"
            );
            ApiError::DatabaseError(e)
        })?;

        let user = match user {
            Some(u) => u,
            None => {
                warn!(user_id = %claims.sub, "Authentication failed: user not found");
                return Err(ApiError::Authentication(
                    "Usuario no encontrado".to_string(),
                ));
            }
        };

        if !user.is_active {
            warn!(user_id = %user.id, "Access attempt by inactive user");
            return Err(ApiError::Authorization("Usuario inactivo".to_string()));
        }

        Ok(AuthedUser { user })
    }
}
