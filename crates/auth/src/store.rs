//! Credential store boundary.
//!
//! The real store belongs to the profile subsystem. The auth core only needs
//! a lookup by identifier; an in-memory implementation backs tests and dev.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use thiserror::Error;

use crate::Principal;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("credential store unavailable: {0}")]
    Unavailable(String),

    #[error("credential store lookup timed out")]
    Timeout,
}

#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// `Ok(None)` means the identifier is unknown; `Err` means the store could
    /// not answer.
    async fn lookup(&self, identifier: &str) -> Result<Option<Principal>, StoreError>;
}

#[async_trait]
impl<S> CredentialStore for Arc<S>
where
    S: CredentialStore + ?Sized,
{
    async fn lookup(&self, identifier: &str) -> Result<Option<Principal>, StoreError> {
        (**self).lookup(identifier).await
    }
}

/// In-memory credential store for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryCredentialStore {
    inner: RwLock<HashMap<String, Principal>>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_principals(principals: impl IntoIterator<Item = Principal>) -> Self {
        let store = Self::new();
        for p in principals {
            store.upsert(p);
        }
        store
    }

    pub fn upsert(&self, principal: Principal) {
        if let Ok(mut map) = self.inner.write() {
            map.insert(principal.identifier.clone(), principal);
        }
    }

    pub fn remove(&self, identifier: &str) -> Option<Principal> {
        self.inner.write().ok()?.remove(identifier)
    }

    pub fn len(&self) -> usize {
        self.inner.read().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn lookup(&self, identifier: &str) -> Result<Option<Principal>, StoreError> {
        let map = self
            .inner
            .read()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))?;
        Ok(map.get(identifier).cloned())
    }
}
