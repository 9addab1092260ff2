//! Shared application state handed to every handler: an `Arc`-wrapped
//! bundle of the concrete adapters behind each port trait.

use std::sync::Arc;

use pulsestream_ingestion::IngestionConfig;
use pulsestream_storage::postgres::{self, PostgresStore, PostgresTransactionManager};
use pulsestream_storage::redis::{self, RedisRateLimiter, RedisWorkerQueue, TenantCache};
use pulsestream_storage::StorageConfig;
use pulsestream_types::error::Result;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<PostgresStore>,
    pub tx_manager: Arc<PostgresTransactionManager>,
    pub rate_limiter: Arc<RedisRateLimiter>,
    pub worker_queue: Arc<RedisWorkerQueue>,
    pub tenant_cache: Arc<TenantCache>,
    pub ingestion_config: IngestionConfig,
    pub max_batch_size: usize,
}

impl AppState {
    /// Connects the Postgres pool and Redis connection manager and wires
    /// every adapter behind it. The only entry point main.rs needs.
    pub async fn new(storage: &StorageConfig, ingestion_config: IngestionConfig) -> Result<Self> {
        let pg_pool = Arc::new(postgres::connect(&storage.database_url, storage.db_max_connections).await?);
        let redis_conn = redis::connect(&storage.redis_url).await?;

        Ok(Self {
            store: Arc::new(PostgresStore::new(pg_pool.clone())),
            tx_manager: Arc::new(PostgresTransactionManager::new(pg_pool)),
            rate_limiter: Arc::new(RedisRateLimiter::new(redis_conn.clone(), storage.rate_limiter_fail_open)),
            worker_queue: Arc::new(RedisWorkerQueue::new(redis_conn)),
            tenant_cache: Arc::new(TenantCache::new(storage.tenant_cache_ttl)),
            ingestion_config,
            max_batch_size: ingestion_config.max_batch_size,
        })
    }
}
