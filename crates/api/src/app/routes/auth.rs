use std::sync::Arc;

use axum::{
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use quantumsave_auth::verify_password;

use crate::app::dto::{AuthResponse, LoginRequest, UserView};
use crate::app::errors;
use crate::app::services::AppServices;

const INVALID_CREDENTIALS: &str = "Invalid email or password";
const LOGIN_OK: &str = "Login successful";
const VERIFY_EMAIL: &str = "Please verify your email to activate your account";

/// `POST /login`: exchange email and password for a token.
///
/// Unknown emails and wrong passwords get the same 400 answer, and both pay
/// for one Argon2 verification.
pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<LoginRequest>,
) -> Response {
    let principal = match services.authenticator.lookup(&body.email).await {
        Ok(p) => p,
        Err(e) => {
            tracing::warn!(error = %e, "credential store unavailable during login");
            return errors::json_error(
                StatusCode::SERVICE_UNAVAILABLE,
                "service_unavailable",
                "authentication temporarily unavailable",
            );
        }
    };

    let hash = principal
        .as_ref()
        .map(|p| p.credential_hash.clone())
        .or_else(|| services.dummy_hash.clone());
    let password = body.password;
    let password_ok = match hash {
        Some(hash) => tokio::task::spawn_blocking(move || verify_password(&hash, &password))
            .await
            .unwrap_or(false),
        None => false,
    };

    let principal = match principal {
        Some(p) if password_ok => p,
        _ => {
            tracing::info!("login rejected");
            return (
                StatusCode::BAD_REQUEST,
                Json(AuthResponse::failed(INVALID_CREDENTIALS)),
            )
                .into_response();
        }
    };

    let token = match services.codec.issue_default(&principal.identifier) {
        Ok(t) => t,
        Err(e) => {
            tracing::error!(error = %e, "token issuance failed");
            return errors::json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "could not issue token",
            );
        }
    };

    let message = if principal.enabled { LOGIN_OK } else { VERIFY_EMAIL };
    Json(AuthResponse {
        token: Some(token),
        user: Some(UserView::from(&principal)),
        is_active: principal.enabled,
        message: Some(message.to_string()),
    })
    .into_response()
}
