//! Route-level access policy.
//!
//! Runs after the authentication gate. The gate never rejects; this layer is
//! what turns an empty security context into a 401 on protected routes, and an
//! insufficient principal into a 403.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{Method, StatusCode},
    middleware::Next,
    response::Response,
};
use thiserror::Error;

use quantumsave_auth::{Authority, SecurityContext};

use crate::app::errors::{json_error, unauthorized};

/// Versioned mount point; every route is also reachable under it.
pub const API_PREFIX: &str = "/api/v1.0";

pub const PUBLIC_PATHS: &[&str] = &[
    "/login",
    "/register",
    "/activate",
    "/resend-verification",
    "/status",
    "/health",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Requirement {
    Authority(Authority),
    /// Principal must have activated its account.
    Enabled,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyDenial {
    #[error("authentication required")]
    Unauthenticated,

    #[error("missing authority {0}")]
    MissingAuthority(String),

    #[error("account is not active")]
    Inactive,
}

#[derive(Debug, Clone, Default)]
pub struct AccessPolicy {
    public: Vec<String>,
    rules: Vec<(String, Requirement)>,
}

impl AccessPolicy {
    /// Empty policy: every path needs an authenticated principal.
    pub fn new() -> Self {
        Self::default()
    }

    /// The stock public allow-list, no extra rules.
    pub fn standard() -> Self {
        PUBLIC_PATHS
            .iter()
            .fold(Self::new(), |policy, path| policy.permit(*path))
    }

    pub fn permit(mut self, path: impl Into<String>) -> Self {
        self.public.push(path.into());
        self
    }

    /// Attach a requirement to every path at or below `prefix`.
    pub fn require(mut self, prefix: impl Into<String>, requirement: Requirement) -> Self {
        self.rules.push((prefix.into(), requirement));
        self
    }

    pub fn is_public(&self, path: &str) -> bool {
        let path = strip_api_prefix(path);
        self.public.iter().any(|p| p == path)
    }

    pub fn decide(
        &self,
        method: &Method,
        path: &str,
        context: &SecurityContext,
    ) -> Result<(), PolicyDenial> {
        if *method == Method::OPTIONS || self.is_public(path) {
            return Ok(());
        }

        let principal = context.current().ok_or(PolicyDenial::Unauthenticated)?;
        let path = strip_api_prefix(path);

        for (prefix, requirement) in &self.rules {
            if !under_prefix(path, prefix) {
                continue;
            }
            match requirement {
                Requirement::Authority(authority) if !principal.has_authority(authority) => {
                    return Err(PolicyDenial::MissingAuthority(authority.to_string()));
                }
                Requirement::Enabled if !principal.enabled => {
                    return Err(PolicyDenial::Inactive);
                }
                _ => {}
            }
        }

        Ok(())
    }
}

fn strip_api_prefix(path: &str) -> &str {
    match path.strip_prefix(API_PREFIX) {
        Some("") => "/",
        Some(rest) if rest.starts_with('/') => rest,
        _ => path,
    }
}

fn under_prefix(path: &str, prefix: &str) -> bool {
    let prefix = prefix.trim_end_matches('/');
    prefix.is_empty()
        || path == prefix
        || path
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with('/'))
}

/// Axum middleware applying an [`AccessPolicy`] to the request's security context.
pub async fn enforce(
    State(policy): State<Arc<AccessPolicy>>,
    req: Request,
    next: Next,
) -> Response {
    let context = req
        .extensions()
        .get::<SecurityContext>()
        .cloned()
        .unwrap_or_default();

    let decision = policy.decide(req.method(), req.uri().path(), &context);
    match decision {
        Ok(()) => next.run(req).await,
        Err(PolicyDenial::Unauthenticated) => unauthorized(),
        Err(denial) => {
            tracing::warn!(path = %req.uri().path(), reason = %denial, "access denied");
            json_error(StatusCode::FORBIDDEN, "forbidden", "insufficient permissions")
        }
    }
}
