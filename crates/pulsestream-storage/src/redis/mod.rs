//! Redis adapters: the cache half of the store adapter — rate limiting,
//! tenant-credential caching, and worker hand-off.

mod rate_limiter;
mod tenant_cache;
mod worker_queue;

pub use rate_limiter::RedisRateLimiter;
pub use tenant_cache::TenantCache;
pub use worker_queue::RedisWorkerQueue;

use redis::aio::MultiplexedConnection;

use pulsestream_types::error::Result;

pub async fn connect(redis_url: &str) -> Result<MultiplexedConnection> {
    let client = redis::Client::open(redis_url)?;
    let conn = client.get_multiplexed_tokio_connection().await?;
    Ok(conn)
}
