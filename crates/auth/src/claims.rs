use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Claim names owned by the codec; callers cannot override them via extra claims.
pub const RESERVED_CLAIMS: [&str; 3] = ["sub", "iat", "exp"];

/// Signed claim set carried inside a token.
///
/// Timestamps travel as JWT NumericDate (whole seconds since the epoch).
/// Any additional claims are flattened next to the registered ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (the principal identifier, e.g. an email address).
    ///
    /// Defaults to empty so a token without `sub` still parses and is rejected
    /// later as subject-missing rather than as malformed.
    #[serde(default)]
    pub sub: String,

    #[serde(rename = "iat", with = "chrono::serde::ts_seconds")]
    pub issued_at: DateTime<Utc>,

    #[serde(rename = "exp", with = "chrono::serde::ts_seconds")]
    pub expires_at: DateTime<Utc>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Claims {
    pub fn subject(&self) -> &str {
        &self.sub
    }

    /// Expiry is exclusive of the boundary and measured at the token's own
    /// one-second resolution: a token is live for the whole second named by
    /// `expires_at` and expired from the next one.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now.trunc_subsecs(0) > self.expires_at
    }

    pub fn has_valid_window(&self) -> bool {
        self.expires_at >= self.issued_at
    }
}

/// Outcome of a failed token verification.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TokenError {
    /// Wrong shape, bad encoding, unsupported algorithm or incoherent claims.
    #[error("malformed token")]
    Malformed,

    /// Structure parses but the signature does not match the claims under the
    /// configured key.
    #[error("token signature is invalid")]
    SignatureInvalid,

    /// Signature is valid but the token is past its expiry. The claims are kept
    /// for diagnostics only.
    #[error("token has expired")]
    Expired(Box<Claims>),
}

impl TokenError {
    pub fn kind(&self) -> &'static str {
        match self {
            TokenError::Malformed => "malformed",
            TokenError::SignatureInvalid => "signature_invalid",
            TokenError::Expired(_) => "expired",
        }
    }
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match err.kind() {
            ErrorKind::InvalidSignature => TokenError::SignatureInvalid,
            _ => TokenError::Malformed,
        }
    }
}
