//! User routes

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers;

/// Creates and returns the users router
///
/// # Routes
/// - `POST /users/login` - Password login, returns a bearer token
/// - `GET /users/me` - Current authenticated user
pub fn users_routes() -> Router {
    Router::new()
        .route("/users/login", post(handlers::login_handler))
        .route("/users/me", get(handlers::me_handler))
}
