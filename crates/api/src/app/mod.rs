//! HTTP API application wiring (Axum router + middleware stack).
//!
//! - `services.rs`: codec, authenticator and credential store wiring
//! - `routes/`: HTTP routes + handlers
//! - `dto.rs`: request/response DTOs
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{Extension, Router};
use tower::ServiceBuilder;

use crate::authz::{self, AccessPolicy, API_PREFIX};
use crate::config::{AuthSettings, CorsSettings};
use crate::cors;
use crate::middleware::{self, GateState};

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

pub use services::AppServices;

/// Build the full HTTP router (public entrypoint used by `main.rs` and tests).
///
/// Request flow, outermost first: request id, CORS (answers preflights),
/// authentication gate, access policy, handler.
pub fn build_app(
    settings: &AuthSettings,
    cors_settings: &CorsSettings,
    services: AppServices,
    policy: AccessPolicy,
) -> Router {
    let gate = GateState::new(services.authenticator.clone(), settings);
    let services = Arc::new(services);

    let routes = routes::router();

    Router::new()
        .merge(routes.clone())
        .nest(API_PREFIX, routes)
        .layer(Extension(services))
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn(middleware::request_id))
                .layer(cors::cors_layer(cors_settings))
                .layer(axum::middleware::from_fn_with_state(
                    gate,
                    middleware::authentication_gate,
                ))
                .layer(axum::middleware::from_fn_with_state(
                    Arc::new(policy),
                    authz::enforce,
                )),
        )
}
