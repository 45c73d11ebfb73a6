//! Request/response DTOs for the auth endpoints.

use serde::{Deserialize, Serialize};

use quantumsave_auth::Principal;

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Login response. On failure only `is_active` and `message` are present.
#[derive(Debug, Clone, Serialize)]
pub struct AuthResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserView>,
    /// Lets the client show a "verify your email" banner.
    pub is_active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl AuthResponse {
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            token: None,
            user: None,
            is_active: false,
            message: Some(message.into()),
        }
    }
}

/// Public view of a principal (never includes the credential hash).
#[derive(Debug, Clone, Serialize)]
pub struct UserView {
    pub email: String,
    pub authorities: Vec<String>,
    pub is_active: bool,
}

impl From<&Principal> for UserView {
    fn from(p: &Principal) -> Self {
        Self {
            email: p.identifier.clone(),
            authorities: p.authorities.iter().map(|a| a.as_str().to_string()).collect(),
            is_active: p.enabled,
        }
    }
}
