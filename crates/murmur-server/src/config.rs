//! Server configuration loaded from environment variables.
//!
//! All settings have sensible defaults so the server can start with zero
//! configuration for local development.

use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

use murmur_shared::constants::{DEFAULT_HTTP_PORT, DEFAULT_IDENTITY_HEADER, DEFAULT_MAX_MESSAGE_LEN};

/// Which [`ChatStore`](murmur_store::ChatStore) implementation backs the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    /// In-process maps; everything is lost on restart.
    Memory,
    /// SQLite file.
    Sqlite,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" | "mem" => Ok(Self::Memory),
            "sqlite" => Ok(Self::Sqlite),
            other => Err(format!("unknown store backend: {other}")),
        }
    }
}

impl fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Memory => f.write_str("memory"),
            Self::Sqlite => f.write_str("sqlite"),
        }
    }
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Socket address for the HTTP (axum) API server.
    /// Env: `HTTP_ADDR`
    /// Default: `0.0.0.0:8080`
    pub http_addr: SocketAddr,

    /// Env: `STORE_BACKEND` (`memory` / `sqlite`)
    /// Default: `memory`
    pub store_backend: StoreBackend,

    /// SQLite file, used when `store_backend` is `sqlite`.
    /// Env: `DATABASE_PATH`
    /// Default: none (platform data directory).
    pub database_path: Option<PathBuf>,

    /// Request header carrying the caller's user id, set by the
    /// authenticating proxy in front of this server.
    /// Env: `IDENTITY_HEADER`
    /// Default: `x-user-id`
    pub identity_header: String,

    /// Maximum message length in characters.
    /// Env: `MAX_MESSAGE_LEN`
    /// Default: `4096`
    pub max_message_len: usize,

    /// Sustained requests per second per client.
    /// Env: `RATE_LIMIT_PER_SEC`
    /// Default: `10`
    pub rate_limit_per_sec: f64,

    /// Token bucket capacity per client.
    /// Env: `RATE_LIMIT_BURST`
    /// Default: `30`
    pub rate_limit_burst: f64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: ([0, 0, 0, 0], DEFAULT_HTTP_PORT).into(),
            store_backend: StoreBackend::Memory,
            database_path: None,
            identity_header: DEFAULT_IDENTITY_HEADER.to_string(),
            max_message_len: DEFAULT_MAX_MESSAGE_LEN,
            rate_limit_per_sec: 10.0,
            rate_limit_burst: 30.0,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup. Invalid values
    /// are logged and replaced by their defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(addr) = lookup("HTTP_ADDR") {
            parse_into(&mut config.http_addr, "HTTP_ADDR", &addr);
        }

        if let Some(backend) = lookup("STORE_BACKEND") {
            parse_into(&mut config.store_backend, "STORE_BACKEND", &backend);
        }

        if let Some(path) = lookup("DATABASE_PATH") {
            if !path.trim().is_empty() {
                config.database_path = Some(PathBuf::from(path));
            }
        }

        if let Some(header) = lookup("IDENTITY_HEADER") {
            let header = header.trim().to_ascii_lowercase();
            if header.is_empty() {
                tracing::warn!("Empty IDENTITY_HEADER, using default");
            } else {
                config.identity_header = header;
            }
        }

        if let Some(val) = lookup("MAX_MESSAGE_LEN") {
            parse_into(&mut config.max_message_len, "MAX_MESSAGE_LEN", &val);
        }

        if let Some(val) = lookup("RATE_LIMIT_PER_SEC") {
            parse_rate(&mut config.rate_limit_per_sec, "RATE_LIMIT_PER_SEC", &val, 0.0);
        }

        if let Some(val) = lookup("RATE_LIMIT_BURST") {
            parse_rate(&mut config.rate_limit_burst, "RATE_LIMIT_BURST", &val, 1.0);
        }

        // RUST_LOG is handled directly by tracing-subscriber's EnvFilter,
        // so we do not store it here.

        config
    }
}

fn parse_into<T>(slot: &mut T, key: &str, raw: &str)
where
    T: FromStr,
{
    match raw.trim().parse::<T>() {
        Ok(value) => *slot = value,
        Err(_) => tracing::warn!(key, value = %raw, "Invalid value, using default"),
    }
}

/// Rates must be finite and at least `min`; `NaN` would switch the limiter off.
fn parse_rate(slot: &mut f64, key: &str, raw: &str, min: f64) {
    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() && value >= min => *slot = value,
        _ => tracing::warn!(key, value = %raw, min, "Invalid rate, using default"),
    }
}
