// Users module - account model, repository, and login endpoints

pub mod handlers;
pub mod models;
pub mod repository;
pub mod routes;

#[cfg(test)]
mod tests;

pub use routes::users_routes;
