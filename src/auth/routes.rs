//! Authentication routes

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers;

/// Creates and returns the authentication router
///
/// # Routes
/// - `POST /auth/register` - Local password registration
/// - `GET /auth/oauth/:provider/start` - Start the OAuth consent flow
/// - `GET /auth/oauth/callback/:provider` - OAuth provider callback
pub fn auth_routes() -> Router {
    Router::new()
        .route("/auth/register", post(handlers::register_handler))
        .route(
            "/auth/oauth/:provider/start",
            get(handlers::oauth_start_handler),
        )
        .route(
            "/auth/oauth/callback/:provider",
            get(handlers::oauth_callback_handler),
        )
}
