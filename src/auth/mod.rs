// Auth module - password, token, PKCE, and OAuth identity handling

pub mod extractors;
pub mod handlers;
pub mod identity;
pub mod models;
pub mod password;
pub mod pkce;
pub mod reconciler;
pub mod routes;
pub mod tokens;
pub mod validators;

#[cfg(test)]
mod tests;

pub use routes::auth_routes;
