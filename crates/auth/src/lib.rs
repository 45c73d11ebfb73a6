//! `quantumsave-auth`: stateless bearer-token authentication core.
//!
//! Token codec, credential-store boundary, request-scoped security context and
//! the token-to-principal pipeline. Decoupled from HTTP; the API crate wires
//! it into the request path.

pub mod authenticate;
pub mod claims;
pub mod clock;
pub mod codec;
pub mod context;
pub mod password;
pub mod principal;
pub mod store;

pub use authenticate::{AuthFailure, Authenticator};
pub use claims::{Claims, TokenError};
pub use clock::{Clock, ManualClock, SystemClock};
pub use codec::{IssueError, KeyError, SigningKey, TokenCodec};
pub use context::{ClearGuard, SecurityContext};
pub use password::{PasswordError, hash_password, verify_password};
pub use principal::{Authority, CredentialHash, Principal};
pub use store::{CredentialStore, InMemoryCredentialStore, StoreError};
