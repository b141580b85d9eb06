//! # murmur-server
//!
//! HTTP backend for Murmur direct messaging.
//!
//! This binary provides:
//! - **Chat list** per user, derived on every request from the message log
//! - **Message submission** and two-person thread retrieval
//! - **User directory** with profile metadata and presence
//! - **Per-client rate limiting** to protect against abuse
//!
//! Authentication is expected upstream: a proxy sets the caller's user id in
//! the identity header.

mod api;
mod auth;
mod chats;
mod config;
mod directory;
mod error;
mod messaging;
mod rate_limit;

use std::sync::Arc;
use std::time::Duration;

use tracing::info;
use tracing_subscriber::EnvFilter;

use murmur_shared::constants::APP_NAME;
use murmur_store::{ChatStore, Database, MemoryStore, SqliteStore};

use crate::api::AppState;
use crate::config::{ServerConfig, StoreBackend};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // -----------------------------------------------------------------------
    // 1. Initialize tracing (respects RUST_LOG env var)
    // -----------------------------------------------------------------------
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("info,murmur_server=debug,murmur_store=info")
        }))
        .init();

    info!("Starting {} server v{}", APP_NAME, env!("CARGO_PKG_VERSION"));

    // -----------------------------------------------------------------------
    // 2. Load configuration
    // -----------------------------------------------------------------------
    let config = ServerConfig::from_env();
    info!(?config, "Loaded configuration");

    // -----------------------------------------------------------------------
    // 3. Open the store
    // -----------------------------------------------------------------------
    let store = open_store(&config)?;
    info!(backend = %config.store_backend, "Store ready");

    let http_addr = config.http_addr;
    let app_state = AppState::new(store, config);

    // -----------------------------------------------------------------------
    // 4. Spawn background tasks
    // -----------------------------------------------------------------------

    // Every 5 minutes, drop rate-limit buckets idle for more than 10 minutes
    let limiter = app_state.rate_limiter.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(300));
        loop {
            interval.tick().await;
            limiter.evict_idle(Duration::from_secs(600)).await;
        }
    });

    // -----------------------------------------------------------------------
    // 5. Run the HTTP API server until it fails or Ctrl+C arrives
    // -----------------------------------------------------------------------
    tokio::select! {
        result = api::serve(app_state, http_addr) => {
            if let Err(e) = result {
                tracing::error!(error = %e, "HTTP server failed");
                return Err(e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}

fn open_store(config: &ServerConfig) -> anyhow::Result<Arc<dyn ChatStore>> {
    let store: Arc<dyn ChatStore> = match config.store_backend {
        StoreBackend::Memory => Arc::new(MemoryStore::new()),
        StoreBackend::Sqlite => {
            let db = match &config.database_path {
                Some(path) => Database::open_at(path)?,
                None => Database::new()?,
            };
            if let Some(path) = db.path() {
                info!(path = %path.display(), "SQLite store ready");
            }
            Arc::new(SqliteStore::new(db))
        }
    };
    Ok(store)
}
