use std::path::Path;
use std::sync::Arc;

use anyhow::Context as _;

use quantumsave_auth::{
    Authenticator, Clock, CredentialHash, CredentialStore, InMemoryCredentialStore, Principal,
    TokenCodec, hash_password,
};

use crate::config::AuthSettings;

/// Shared, immutable services handed to every request.
pub struct AppServices {
    pub codec: Arc<TokenCodec>,
    pub authenticator: Arc<Authenticator>,
    pub store: Arc<dyn CredentialStore>,
    /// Hash verified against for unknown identifiers so login timing does not
    /// reveal which emails exist.
    pub dummy_hash: Option<CredentialHash>,
}

impl AppServices {
    pub fn build(
        settings: &AuthSettings,
        store: Arc<dyn CredentialStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let codec = Arc::new(TokenCodec::new(
            &settings.signing_key,
            clock,
            settings.token_ttl,
        ));
        let authenticator = Arc::new(
            Authenticator::new(codec.clone(), store.clone())
                .with_lookup_timeout(settings.lookup_timeout),
        );

        let dummy_hash = match hash_password("quantumsave-login-placeholder") {
            Ok(hash) => Some(hash),
            Err(e) => {
                tracing::warn!(error = %e, "could not prepare placeholder password hash");
                None
            }
        };

        Self {
            codec,
            authenticator,
            store,
            dummy_hash,
        }
    }
}

impl core::fmt::Debug for AppServices {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AppServices")
            .field("codec", &self.codec)
            .field("authenticator", &self.authenticator)
            .finish_non_exhaustive()
    }
}

/// Seed an in-memory store from a JSON array of principals.
pub fn load_credentials(path: &Path) -> anyhow::Result<InMemoryCredentialStore> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading credentials file {}", path.display()))?;
    let principals: Vec<Principal> = serde_json::from_str(&raw)
        .with_context(|| format!("parsing credentials file {}", path.display()))?;
    Ok(InMemoryCredentialStore::from_principals(principals))
}
