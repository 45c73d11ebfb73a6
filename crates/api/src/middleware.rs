use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode, header::AUTHORIZATION},
    middleware::Next,
    response::Response,
};
use tracing::Instrument;

use quantumsave_auth::{AuthFailure, Authenticator, SecurityContext};

use crate::app::errors::json_error;
use crate::config::{AuthSettings, StoreOutagePolicy};

pub const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

/// Correlation id for the current request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(pub String);

/// Tag every request with a correlation id and run it inside a span carrying it.
///
/// An incoming `X-Request-Id` is reused; otherwise a short random id is generated.
pub async fn request_id(mut req: Request, next: Next) -> Response {
    let id = req
        .headers()
        .get(&REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty() && v.len() <= 64)
        .map(str::to_owned)
        .unwrap_or_else(|| uuid::Uuid::new_v4().simple().to_string()[..8].to_string());

    req.extensions_mut().insert(RequestId(id.clone()));
    let span = tracing::info_span!("request", rid = %id);

    let mut resp = next.run(req).instrument(span).await;
    if let Ok(value) = HeaderValue::from_str(&id) {
        resp.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    resp
}

/// Shared state of the authentication gate.
#[derive(Clone)]
pub struct GateState {
    authenticator: Arc<Authenticator>,
    scheme: Arc<str>,
    log_identifiers: bool,
    store_outage: StoreOutagePolicy,
}

impl GateState {
    pub fn new(authenticator: Arc<Authenticator>, settings: &AuthSettings) -> Self {
        Self {
            authenticator,
            scheme: Arc::from(settings.scheme.as_str()),
            log_identifiers: settings.log_identifiers,
            store_outage: settings.store_outage,
        }
    }

    /// Run the gate's checks for one request, binding into `context` on success.
    pub async fn evaluate(
        &self,
        method: &Method,
        headers: &HeaderMap,
        context: &SecurityContext,
    ) -> GateOutcome {
        if *method == Method::OPTIONS {
            return GateOutcome::Preflight;
        }
        if context.is_authenticated() {
            return GateOutcome::AlreadyAuthenticated;
        }

        let token = match extract_credential(headers, &self.scheme) {
            Credential::Absent => return GateOutcome::NoCredential,
            Credential::Unsupported => return GateOutcome::UnsupportedScheme,
            Credential::Token(token) => token,
        };

        match self.authenticator.authenticate(token).await {
            Ok(principal) => {
                let identifier = self.log_identifiers.then(|| principal.identifier.clone());
                context.bind(principal);
                GateOutcome::Bound { identifier }
            }
            Err(failure) => GateOutcome::Rejected(failure),
        }
    }
}

/// Where a request ended up in the gate. Everything except `Bound` leaves the
/// security context as it was.
#[derive(Debug, Clone, PartialEq)]
pub enum GateOutcome {
    Preflight,
    AlreadyAuthenticated,
    NoCredential,
    UnsupportedScheme,
    /// `identifier` is only populated when identifier logging is enabled.
    Bound { identifier: Option<String> },
    Rejected(AuthFailure),
}

/// Authentication gate: populate (or leave empty) the request's security
/// context, then always hand over to the next stage.
///
/// The context is created here, inserted into the request extensions, and
/// cleared when this future completes or is dropped.
pub async fn authentication_gate(
    State(gate): State<GateState>,
    mut req: Request,
    next: Next,
) -> Response {
    let (context, owned) = match req.extensions().get::<SecurityContext>() {
        Some(existing) => (existing.clone(), false),
        None => (SecurityContext::new(), true),
    };
    let _clear = owned.then(|| context.clear_on_drop());
    if owned {
        req.extensions_mut().insert(context.clone());
    }

    // Only the head is borrowed across the lookup; the body is not `Sync`.
    let (parts, body) = req.into_parts();
    tracing::debug!(method = %parts.method, path = %parts.uri.path(), "auth gate");

    let outcome = gate.evaluate(&parts.method, &parts.headers, &context).await;
    let req = Request::from_parts(parts, body);
    match &outcome {
        GateOutcome::Preflight => tracing::debug!("preflight request; authentication skipped"),
        GateOutcome::AlreadyAuthenticated => tracing::debug!("security context already authenticated"),
        GateOutcome::NoCredential => tracing::debug!("no credential presented"),
        GateOutcome::UnsupportedScheme => {
            tracing::warn!(reason = "unsupported_scheme", "credential rejected")
        }
        GateOutcome::Bound { identifier: Some(id) } => {
            tracing::debug!(principal = %id, "security context authenticated")
        }
        GateOutcome::Bound { identifier: None } => tracing::debug!("security context authenticated"),
        GateOutcome::Rejected(failure) => {
            tracing::warn!(reason = failure.kind(), "credential rejected")
        }
    }

    if let GateOutcome::Rejected(failure) = &outcome {
        if failure.is_store_outage() && gate.store_outage == StoreOutagePolicy::FailClosed {
            return json_error(
                StatusCode::SERVICE_UNAVAILABLE,
                "service_unavailable",
                "authentication temporarily unavailable",
            );
        }
    }

    next.run(req).await
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Credential<'a> {
    Absent,
    Unsupported,
    Token(&'a str),
}

/// Split `"<scheme> <token>"`. Header-name lookup is case-insensitive; the
/// scheme match is exact.
fn extract_credential<'a>(headers: &'a HeaderMap, scheme: &str) -> Credential<'a> {
    let Some(value) = headers.get(AUTHORIZATION) else {
        return Credential::Absent;
    };
    let Ok(value) = value.to_str() else {
        return Credential::Unsupported;
    };

    match value
        .strip_prefix(scheme)
        .and_then(|rest| rest.strip_prefix(' '))
    {
        Some(token) if !token.trim().is_empty() => Credential::Token(token.trim()),
        _ => Credential::Unsupported,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration};
    use quantumsave_auth::{
        CredentialHash, InMemoryCredentialStore, ManualClock, Principal, SigningKey, TokenCodec,
    };

    fn headers(value: &str) -> HeaderMap {
        let mut h = HeaderMap::new();
        h.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        h
    }

    fn gate(log_identifiers: bool) -> (GateState, Arc<TokenCodec>) {
        let key = SigningKey::from_bytes(vec![9u8; 32]).unwrap();
        let clock = Arc::new(ManualClock::new(DateTime::from_timestamp(1_700_000_000, 0).unwrap()));
        let codec = Arc::new(TokenCodec::new(&key, clock, Duration::hours(24)));
        let store = Arc::new(InMemoryCredentialStore::from_principals([Principal::new(
            "alice@example.com",
            CredentialHash::new("h"),
        )]));
        let authenticator = Arc::new(Authenticator::new(codec.clone(), store));
        let mut settings = AuthSettings::new(key);
        settings.log_identifiers = log_identifiers;
        (GateState::new(authenticator, &settings), codec)
    }

    #[test]
    fn credential_extraction() {
        assert_eq!(extract_credential(&HeaderMap::new(), "Bearer"), Credential::Absent);
        assert_eq!(extract_credential(&headers("Bearer abc"), "Bearer"), Credential::Token("abc"));
        assert_eq!(extract_credential(&headers("bearer abc"), "Bearer"), Credential::Unsupported);
        assert_eq!(extract_credential(&headers("Bearerabc"), "Bearer"), Credential::Unsupported);
        assert_eq!(extract_credential(&headers("Bearer "), "Bearer"), Credential::Unsupported);
        assert_eq!(extract_credential(&headers("Basic dXNlcjpwdw=="), "Bearer"), Credential::Unsupported);
        assert_eq!(extract_credential(&headers("Token abc"), "Token"), Credential::Token("abc"));
    }

    #[tokio::test]
    async fn binds_valid_token() {
        let (gate, codec) = gate(false);
        let token = codec.issue_default("alice@example.com").unwrap();
        let ctx = SecurityContext::new();

        let outcome = gate
            .evaluate(&Method::GET, &headers(&format!("Bearer {token}")), &ctx)
            .await;

        assert_eq!(outcome, GateOutcome::Bound { identifier: None });
        assert_eq!(ctx.current().unwrap().identifier, "alice@example.com");
    }

    #[tokio::test]
    async fn identifier_only_surfaces_when_enabled() {
        let (gate, codec) = gate(true);
        let token = codec.issue_default("alice@example.com").unwrap();

        let outcome = gate
            .evaluate(&Method::GET, &headers(&format!("Bearer {token}")), &SecurityContext::new())
            .await;

        assert_eq!(
            outcome,
            GateOutcome::Bound {
                identifier: Some("alice@example.com".to_string())
            }
        );
    }

    #[tokio::test]
    async fn preflight_skips_everything() {
        let (gate, _) = gate(false);
        let ctx = SecurityContext::new();
        let outcome = gate.evaluate(&Method::OPTIONS, &headers("Bearer junk"), &ctx).await;
        assert_eq!(outcome, GateOutcome::Preflight);
        assert!(!ctx.is_authenticated());
    }

    #[tokio::test]
    async fn already_bound_context_is_left_alone() {
        let (gate, _) = gate(false);
        let ctx = SecurityContext::new();
        ctx.bind(Principal::new("bob@example.com", CredentialHash::new("h")));

        let outcome = gate.evaluate(&Method::GET, &headers("Bearer junk"), &ctx).await;
        assert_eq!(outcome, GateOutcome::AlreadyAuthenticated);
        assert_eq!(ctx.current().unwrap().identifier, "bob@example.com");
    }

    #[tokio::test]
    async fn rejections_leave_context_empty() {
        let (gate, codec) = gate(false);
        let ghost = codec.issue_default("ghost@example.com").unwrap();

        for (value, expected) in [
            ("Bearer junk".to_string(), GateOutcome::Rejected(AuthFailure::Malformed)),
            (format!("Bearer {ghost}"), GateOutcome::Rejected(AuthFailure::PrincipalNotFound)),
            ("Digest abc".to_string(), GateOutcome::UnsupportedScheme),
        ] {
            let ctx = SecurityContext::new();
            let outcome = gate.evaluate(&Method::GET, &headers(&value), &ctx).await;
            assert_eq!(outcome, expected);
            assert!(!ctx.is_authenticated());
        }

        let ctx = SecurityContext::new();
        assert_eq!(
            gate.evaluate(&Method::GET, &HeaderMap::new(), &ctx).await,
            GateOutcome::NoCredential
        );
    }
}
