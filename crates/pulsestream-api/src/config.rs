//! HTTP-layer configuration. Thin wrapper that also owns the env vars
//! specific to the HTTP surface (bind address, request deadline); storage
//! and ingestion limits live in their own crates' config structs and are
//! composed here.

use std::env;
use std::net::SocketAddr;
use std::time::Duration;

use pulsestream_ingestion::IngestionConfig;
use pulsestream_storage::StorageConfig;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub request_deadline: Duration,
    pub storage: StorageConfigHandle,
    pub ingestion: IngestionConfig,
}

/// `StorageConfig` isn't `Clone` today only because nobody has needed it to
/// be; wrapping it keeps `AppConfig` cheaply cloneable for handler state
/// without touching the storage crate's own type.
#[derive(Debug, Clone)]
pub struct StorageConfigHandle(pub std::sync::Arc<StorageConfig>);

impl AppConfig {
    pub fn from_env() -> Result<Self, String> {
        let bind_addr = env::var("PULSESTREAM_BIND_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:8080".to_string())
            .parse()
            .map_err(|e| format!("invalid PULSESTREAM_BIND_ADDR: {e}"))?;

        let request_deadline = Duration::from_secs(env_u64("PULSESTREAM_REQUEST_DEADLINE_SECS", 30));

        let storage = StorageConfig::from_env()?;

        Ok(Self {
            bind_addr,
            request_deadline,
            storage: StorageConfigHandle(std::sync::Arc::new(storage)),
            ingestion: IngestionConfig::from_env(),
        })
    }
}

fn env_u64(key: &str, default: u64) -> u64 {
    env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}
