use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::response::Response;

use quantumsave_auth::{Principal, SecurityContext};

use crate::app::errors::unauthorized;

/// Principal bound to the current request by the authentication gate.
///
/// Extracting it on a request with an empty security context yields 401, so
/// handlers behind it can assume an authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentPrincipal(pub Principal);

impl CurrentPrincipal {
    pub fn principal(&self) -> &Principal {
        &self.0
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for CurrentPrincipal
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<SecurityContext>()
            .and_then(SecurityContext::current)
            .map(CurrentPrincipal)
            .ok_or_else(unauthorized)
    }
}
