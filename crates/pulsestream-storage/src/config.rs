//! Storage-layer configuration, environment-variable driven: a plain struct
//! with a `from_env` constructor and sane defaults, no external config-file
//! framework.

use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub database_url: String,
    pub redis_url: String,
    pub db_max_connections: u32,
    pub redis_max_connections: u32,
    pub rate_limiter_fail_open: bool,
    pub tenant_cache_ttl: Duration,
}

impl StorageConfig {
    pub fn from_env() -> Result<Self, String> {
        let database_url = env::var("PULSESTREAM_DATABASE_URL")
            .map_err(|_| "PULSESTREAM_DATABASE_URL is required".to_string())?;

        Ok(Self {
            database_url,
            redis_url: env::var("PULSESTREAM_REDIS_URL")
                .unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string()),
            db_max_connections: env_u32("PULSESTREAM_DB_MAX_CONNECTIONS", 10),
            redis_max_connections: env_u32("PULSESTREAM_REDIS_MAX_CONNECTIONS", 10),
            rate_limiter_fail_open: env_bool("PULSESTREAM_RATE_LIMITER_FAIL_OPEN", true),
            tenant_cache_ttl: Duration::from_secs(30),
        })
    }
}

fn env_u32(key: &str, default: u32) -> u32 {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_bool(key: &str, default: bool) -> bool {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
