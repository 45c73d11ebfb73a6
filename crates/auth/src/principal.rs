use std::borrow::Cow;
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Granted authority (e.g. `"ROLE_USER"`, `"reports.export"`).
///
/// Authorities are opaque strings at this layer; route policies decide what
/// they mean.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Authority(Cow<'static, str>);

impl Authority {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Authority {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Stored password hash (PHC string). Opaque to the auth core.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CredentialHash(String);

impl CredentialHash {
    pub fn new(phc: impl Into<String>) -> Self {
        Self(phc.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Debug for CredentialHash {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("CredentialHash(<redacted>)")
    }
}

/// An identity as resolved from the credential store.
///
/// Owned by the profile subsystem; the auth core only reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// Unique identifier (the login email).
    pub identifier: String,
    pub credential_hash: CredentialHash,
    #[serde(default)]
    pub authorities: BTreeSet<Authority>,
    /// `false` until the account has been activated.
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}

fn enabled_by_default() -> bool {
    true
}

impl Principal {
    pub fn new(identifier: impl Into<String>, credential_hash: CredentialHash) -> Self {
        Self {
            identifier: identifier.into(),
            credential_hash,
            authorities: BTreeSet::new(),
            enabled: true,
        }
    }

    pub fn with_authority(mut self, authority: Authority) -> Self {
        self.authorities.insert(authority);
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn has_authority(&self, authority: &Authority) -> bool {
        self.authorities.contains(authority)
    }
}
