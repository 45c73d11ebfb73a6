use std::sync::Arc;

use anyhow::Context as _;

use quantumsave_api::app::{build_app, services};
use quantumsave_api::authz::AccessPolicy;
use quantumsave_api::config::ApiConfig;
use quantumsave_auth::{CredentialStore, InMemoryCredentialStore, SystemClock};
use quantumsave_observability::LogFormat;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let format = std::env::var("LOG_FORMAT")
        .ok()
        .and_then(|v| LogFormat::parse(&v))
        .unwrap_or_default();
    quantumsave_observability::init_with(format);

    let config = ApiConfig::from_env().context("invalid configuration")?;

    let store: Arc<dyn CredentialStore> = match &config.credentials_file {
        Some(path) => {
            let store = services::load_credentials(path)?;
            tracing::info!(principals = store.len(), "credential store seeded");
            Arc::new(store)
        }
        None => {
            tracing::warn!("CREDENTIALS_FILE not set; starting with an empty credential store");
            Arc::new(InMemoryCredentialStore::new())
        }
    };

    let services = services::AppServices::build(&config.auth, store, Arc::new(SystemClock));
    let app = build_app(&config.auth, &config.cors, services, AccessPolicy::standard());

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
