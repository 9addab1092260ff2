//! Ingestion-path limits, environment-variable driven.

use std::env;

#[derive(Debug, Clone, Copy)]
pub struct IngestionConfig {
    pub clock_skew_seconds: i64,
    pub retention_days: i64,
    pub max_batch_size: usize,
    pub max_payload_bytes: usize,
}

impl IngestionConfig {
    pub fn from_env() -> Self {
        Self {
            clock_skew_seconds: env_i64("PULSESTREAM_CLOCK_SKEW_SECS", 300),
            retention_days: env_i64("PULSESTREAM_RETENTION_DAYS", 30),
            max_batch_size: env_usize("PULSESTREAM_MAX_BATCH_SIZE", 1000),
            max_payload_bytes: env_usize("PULSESTREAM_MAX_PAYLOAD_BYTES", 10 * 1024 * 1024),
        }
    }
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            clock_skew_seconds: 300,
            retention_days: 30,
            max_batch_size: 1000,
            max_payload_bytes: 10 * 1024 * 1024,
        }
    }
}

fn env_i64(key: &str, default: i64) -> i64 {
    env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_usize(key: &str, default: usize) -> usize {
    env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}
