use axum::{
    routing::{get, post},
    Router,
};

pub mod auth;
pub mod profile;
pub mod system;

/// Every route, unprefixed. The app mounts this both at `/` and under the API prefix.
pub fn router() -> Router {
    Router::new()
        .route("/health", get(system::health))
        .route("/status", get(system::status))
        .route("/login", post(auth::login))
        .route("/profile", get(profile::profile))
}
