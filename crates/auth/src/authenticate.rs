//! Token-to-principal resolution.
//!
//! Drives the credential checks of the request gate in a fixed order:
//! verify token, require a subject, look the subject up, then re-check the
//! token/principal binding. Transport concerns (headers, preflight, logging
//! policy) stay with the caller.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::claims::TokenError;
use crate::codec::TokenCodec;
use crate::store::{CredentialStore, StoreError};
use crate::Principal;

/// Why a credential did not produce a principal.
///
/// Kinds are kept for diagnostics only; callers must expose them all as the
/// same "unauthenticated" outcome.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AuthFailure {
    #[error("malformed token")]
    Malformed,

    #[error("token signature is invalid")]
    SignatureInvalid,

    #[error("token has expired")]
    Expired,

    #[error("token has no subject")]
    SubjectMissing,

    #[error("no principal for token subject")]
    PrincipalNotFound,

    #[error("token subject does not match principal")]
    SubjectMismatch,

    #[error("credential store unavailable")]
    StoreUnavailable(StoreError),
}

impl AuthFailure {
    /// Stable label for structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            AuthFailure::Malformed => "malformed",
            AuthFailure::SignatureInvalid => "signature_invalid",
            AuthFailure::Expired => "expired",
            AuthFailure::SubjectMissing => "subject_missing",
            AuthFailure::PrincipalNotFound => "principal_not_found",
            AuthFailure::SubjectMismatch => "subject_mismatch",
            AuthFailure::StoreUnavailable(_) => "store_unavailable",
        }
    }

    pub fn is_store_outage(&self) -> bool {
        matches!(self, AuthFailure::StoreUnavailable(_))
    }
}

impl From<TokenError> for AuthFailure {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Malformed => AuthFailure::Malformed,
            TokenError::SignatureInvalid => AuthFailure::SignatureInvalid,
            TokenError::Expired(_) => AuthFailure::Expired,
        }
    }
}

pub const DEFAULT_LOOKUP_TIMEOUT: Duration = Duration::from_secs(2);

pub struct Authenticator {
    codec: Arc<TokenCodec>,
    store: Arc<dyn CredentialStore>,
    lookup_timeout: Duration,
}

impl Authenticator {
    pub fn new(codec: Arc<TokenCodec>, store: Arc<dyn CredentialStore>) -> Self {
        Self {
            codec,
            store,
            lookup_timeout: DEFAULT_LOOKUP_TIMEOUT,
        }
    }

    pub fn with_lookup_timeout(mut self, timeout: Duration) -> Self {
        self.lookup_timeout = timeout;
        self
    }

    pub fn codec(&self) -> &Arc<TokenCodec> {
        &self.codec
    }

    pub fn store(&self) -> &Arc<dyn CredentialStore> {
        &self.store
    }

    /// Resolve a raw bearer token to the principal it may be bound as.
    ///
    /// Disabled principals are returned as-is; restricting them is route
    /// policy, not authentication.
    pub async fn authenticate(&self, token: &str) -> Result<Principal, AuthFailure> {
        let claims = self.codec.verify(token)?;

        if claims.subject().trim().is_empty() {
            return Err(AuthFailure::SubjectMissing);
        }

        let principal = self
            .lookup(claims.subject())
            .await
            .map_err(AuthFailure::StoreUnavailable)?
            .ok_or(AuthFailure::PrincipalNotFound)?;

        if principal.identifier != claims.subject() {
            return Err(AuthFailure::SubjectMismatch);
        }
        // The lookup may have taken a while; expiry is checked again at binding time.
        if self.codec.is_expired(&claims) {
            return Err(AuthFailure::Expired);
        }

        Ok(principal)
    }

    /// Store lookup bounded by the configured timeout. Dropping the returned
    /// future drops the in-flight lookup with it.
    pub async fn lookup(&self, identifier: &str) -> Result<Option<Principal>, StoreError> {
        match tokio::time::timeout(self.lookup_timeout, self.store.lookup(identifier)).await {
            Ok(result) => result,
            Err(_) => {
                tracing::debug!(
                    timeout_ms = self.lookup_timeout.as_millis() as u64,
                    "credential lookup timed out"
                );
                Err(StoreError::Timeout)
            }
        }
    }
}

impl core::fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Authenticator")
            .field("codec", &self.codec)
            .field("lookup_timeout", &self.lookup_timeout)
            .finish_non_exhaustive()
    }
}
