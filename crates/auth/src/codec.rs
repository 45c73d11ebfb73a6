//! Signed, time-bounded bearer tokens (compact JWS, HS256).

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{Duration, SubsecRound};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::claims::{Claims, RESERVED_CLAIMS, TokenError};
use crate::clock::Clock;

/// Minimum HMAC-SHA256 key length in bytes.
pub const MIN_KEY_LEN: usize = 32;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum KeyError {
    #[error("signing key is not valid base64")]
    InvalidEncoding,

    #[error("signing key too short: {len} bytes (need at least {MIN_KEY_LEN})")]
    TooShort { len: usize },
}

#[derive(Debug, Error)]
pub enum IssueError {
    #[error("failed to sign token: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),

    #[error("token lifetime {ttl} is out of range")]
    TtlOutOfRange { ttl: Duration },
}

/// Process-wide secret used to sign and verify tokens.
///
/// Never printed: `Debug` is redacted.
#[derive(Clone, PartialEq, Eq)]
pub struct SigningKey(Vec<u8>);

impl SigningKey {
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Result<Self, KeyError> {
        let bytes = bytes.into();
        if bytes.len() < MIN_KEY_LEN {
            return Err(KeyError::TooShort { len: bytes.len() });
        }
        Ok(Self(bytes))
    }

    pub fn from_base64(encoded: &str) -> Result<Self, KeyError> {
        let bytes = STANDARD
            .decode(encoded.trim())
            .map_err(|_| KeyError::InvalidEncoding)?;
        Self::from_bytes(bytes)
    }

    fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl core::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("SigningKey(<redacted>)")
    }
}

/// Issues and verifies tokens under one signing key and one clock.
///
/// Both operations are pure functions of their inputs, the key and the clock,
/// so a single codec is shared by every request without locking.
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    clock: Arc<dyn Clock>,
    default_ttl: Duration,
}

impl TokenCodec {
    pub fn new(key: &SigningKey, clock: Arc<dyn Clock>, default_ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked against the injected clock, not the system time.
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["exp"]);

        Self {
            encoding: EncodingKey::from_secret(key.as_bytes()),
            decoding: DecodingKey::from_secret(key.as_bytes()),
            validation,
            clock,
            default_ttl,
        }
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Sign a token for `subject` valid for `ttl` from now.
    ///
    /// Reserved claim names in `extra` are dropped; a negative `ttl` is
    /// treated as zero. Both timestamps are whole seconds. A `ttl` that runs
    /// past the representable date range is [`IssueError::TtlOutOfRange`].
    pub fn issue(
        &self,
        subject: &str,
        mut extra: Map<String, Value>,
        ttl: Duration,
    ) -> Result<String, IssueError> {
        for reserved in RESERVED_CLAIMS {
            extra.remove(reserved);
        }

        let issued_at = self.clock.now().trunc_subsecs(0);
        let ttl = ttl.max(Duration::zero());
        let expires_at = issued_at
            .checked_add_signed(ttl)
            .ok_or(IssueError::TtlOutOfRange { ttl })?
            .trunc_subsecs(0);
        let claims = Claims {
            sub: subject.to_string(),
            issued_at,
            expires_at,
            extra,
        };

        let token = jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?;
        Ok(token)
    }

    /// Issue with the configured TTL and no extra claims.
    pub fn issue_default(&self, subject: &str) -> Result<String, IssueError> {
        self.issue(subject, Map::new(), self.default_ttl)
    }

    /// Parse, check the signature, then check expiry against the clock.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let data = jsonwebtoken::decode::<Claims>(token, &self.decoding, &self.validation)?;
        let claims = data.claims;

        if !claims.has_valid_window() {
            return Err(TokenError::Malformed);
        }
        if self.is_expired(&claims) {
            return Err(TokenError::Expired(Box::new(claims)));
        }

        Ok(claims)
    }

    /// Subject of a valid, live token. Every verification failure propagates.
    pub fn extract_subject(&self, token: &str) -> Result<String, TokenError> {
        self.verify(token).map(|claims| claims.sub)
    }

    /// Expiry check against the codec's clock at the moment of the call.
    pub fn is_expired(&self, claims: &Claims) -> bool {
        claims.is_expired_at(self.clock.now())
    }
}

impl core::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("default_ttl", &self.default_ttl)
            .finish_non_exhaustive()
    }
}
