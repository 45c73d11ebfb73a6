//! Startup configuration (environment variables).
//!
//! Read once at process start; everything downstream receives plain values.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use quantumsave_auth::{KeyError, SigningKey};
use thiserror::Error;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_TOKEN_TTL_MS: i64 = 86_400_000;
pub const DEFAULT_SCHEME: &str = "Bearer";
pub const DEFAULT_LOOKUP_TIMEOUT_MS: u64 = 2_000;
/// Ten years.
pub const MAX_TOKEN_TTL_MS: i64 = 315_360_000_000;
pub const DEFAULT_CORS_ORIGINS: &[&str] = &["http://localhost:5173", "https://*.vercel.app"];

/// Used only when `JWT_SECRET` is unset (local development).
const DEV_SIGNING_KEY: &[u8] = b"quantumsave-insecure-development-signing-key";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var}: {reason}")]
    Invalid { var: &'static str, reason: String },

    #[error("JWT_SECRET: {0}")]
    SigningKey(#[from] KeyError),
}

impl ConfigError {
    fn invalid(var: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            var,
            reason: reason.into(),
        }
    }
}

/// What the gate does when the credential store cannot answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreOutagePolicy {
    /// Continue unauthenticated; protected routes answer 401.
    #[default]
    FailOpen,
    /// Answer 503 immediately.
    FailClosed,
}

impl StoreOutagePolicy {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fail-open" | "open" => Some(Self::FailOpen),
            "fail-closed" | "closed" => Some(Self::FailClosed),
            _ => None,
        }
    }
}

/// Settings consumed by the token codec and the authentication gate.
#[derive(Debug, Clone)]
pub struct AuthSettings {
    pub signing_key: SigningKey,
    pub token_ttl: chrono::Duration,
    /// Credential scheme literal, matched case-sensitively.
    pub scheme: String,
    /// Include principal identifiers in auth log lines.
    pub log_identifiers: bool,
    pub store_outage: StoreOutagePolicy,
    pub lookup_timeout: Duration,
}

impl AuthSettings {
    pub fn new(signing_key: SigningKey) -> Self {
        Self {
            signing_key,
            token_ttl: chrono::Duration::milliseconds(DEFAULT_TOKEN_TTL_MS),
            scheme: DEFAULT_SCHEME.to_string(),
            log_identifiers: false,
            store_outage: StoreOutagePolicy::default(),
            lookup_timeout: Duration::from_millis(DEFAULT_LOOKUP_TIMEOUT_MS),
        }
    }
}

/// Cross-origin settings for browser clients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorsSettings {
    /// Exact origins, or patterns with a single `*` standing for one host label
    /// run (e.g. `https://*.vercel.app`).
    pub allowed_origins: Vec<String>,
}

impl Default for CorsSettings {
    fn default() -> Self {
        Self {
            allowed_origins: DEFAULT_CORS_ORIGINS.iter().map(|o| o.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub bind_addr: SocketAddr,
    pub auth: AuthSettings,
    pub cors: CorsSettings,
    /// JSON seed file for the in-memory credential store.
    pub credentials_file: Option<PathBuf>,
}

impl ApiConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from an arbitrary variable source. Blank values count as unset.
    pub fn from_lookup<F>(get: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| get(var).filter(|v| !v.trim().is_empty());

        let bind_addr = get("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::invalid("BIND_ADDR", e.to_string()))?;

        let signing_key = match get("JWT_SECRET") {
            Some(encoded) => SigningKey::from_base64(&encoded)?,
            None => {
                tracing::warn!("JWT_SECRET not set; using insecure dev signing key");
                SigningKey::from_bytes(DEV_SIGNING_KEY)?
            }
        };

        let mut auth = AuthSettings::new(signing_key);

        if let Some(raw) = get("JWT_EXPIRATION_MS") {
            let ms: i64 = raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::invalid("JWT_EXPIRATION_MS", "expected milliseconds"))?;
            if !(0..=MAX_TOKEN_TTL_MS).contains(&ms) {
                return Err(ConfigError::invalid(
                    "JWT_EXPIRATION_MS",
                    format!("must be between 0 and {MAX_TOKEN_TTL_MS}"),
                ));
            }
            auth.token_ttl = chrono::Duration::milliseconds(ms);
        }

        if let Some(scheme) = get("AUTH_SCHEME") {
            let scheme = scheme.trim();
            if scheme.contains(char::is_whitespace) {
                return Err(ConfigError::invalid("AUTH_SCHEME", "must be a single token"));
            }
            auth.scheme = scheme.to_string();
        }

        if let Some(raw) = get("AUTH_LOG_IDENTIFIERS") {
            auth.log_identifiers = parse_bool(&raw)
                .ok_or_else(|| ConfigError::invalid("AUTH_LOG_IDENTIFIERS", "expected true/false"))?;
        }

        if let Some(raw) = get("AUTH_STORE_OUTAGE") {
            auth.store_outage = StoreOutagePolicy::parse(&raw).ok_or_else(|| {
                ConfigError::invalid("AUTH_STORE_OUTAGE", "expected fail-open or fail-closed")
            })?;
        }

        if let Some(raw) = get("AUTH_LOOKUP_TIMEOUT_MS") {
            let ms: u64 = raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::invalid("AUTH_LOOKUP_TIMEOUT_MS", "expected milliseconds"))?;
            auth.lookup_timeout = Duration::from_millis(ms);
        }

        let mut cors = CorsSettings::default();
        if let Some(raw) = get("CORS_ALLOWED_ORIGINS") {
            let origins: Vec<String> = raw
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(str::to_string)
                .collect();
            if origins.iter().any(|o| o.matches('*').count() > 1) {
                return Err(ConfigError::invalid(
                    "CORS_ALLOWED_ORIGINS",
                    "at most one `*` per origin",
                ));
            }
            cors.allowed_origins = origins;
        }

        Ok(Self {
            bind_addr,
            auth,
            cors,
            credentials_file: get("CREDENTIALS_FILE").map(PathBuf::from),
        })
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
