//! Request-scoped security context.
//!
//! One `SecurityContext` is created per request and travels with it; clones
//! share the same slot, distinct requests never do. The owner holds a
//! [`ClearGuard`] so the slot is emptied on every exit path, including
//! panics and dropped (cancelled) futures.

use std::sync::{Arc, RwLock};

use crate::Principal;

#[derive(Debug, Clone, Default)]
pub struct SecurityContext {
    slot: Arc<RwLock<Option<Principal>>>,
}

impl SecurityContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(&self, principal: Principal) {
        match self.slot.write() {
            Ok(mut slot) => *slot = Some(principal),
            Err(poisoned) => *poisoned.into_inner() = Some(principal),
        }
    }

    pub fn current(&self) -> Option<Principal> {
        match self.slot.read() {
            Ok(slot) => slot.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        match self.slot.read() {
            Ok(slot) => slot.is_some(),
            Err(poisoned) => poisoned.into_inner().is_some(),
        }
    }

    pub fn clear(&self) {
        match self.slot.write() {
            Ok(mut slot) => *slot = None,
            Err(poisoned) => *poisoned.into_inner() = None,
        }
    }

    /// Guard that clears this context when dropped.
    #[must_use = "the context is cleared as soon as the guard is dropped"]
    pub fn clear_on_drop(&self) -> ClearGuard {
        ClearGuard {
            context: self.clone(),
        }
    }
}

#[derive(Debug)]
pub struct ClearGuard {
    context: SecurityContext,
}

impl Drop for ClearGuard {
    fn drop(&mut self) {
        self.context.clear();
    }
}
