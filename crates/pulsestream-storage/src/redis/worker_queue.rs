//! Worker hand-off. The downstream worker pool that actually processes
//! queued events is out-of-core; this adapter only needs to get a message
//! durably onto a shared queue. Modeled as a Redis list push (`LPUSH`), the
//! simplest primitive that gives at-least-once delivery once a consumer is
//! polling with `BRPOP`.

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use tokio::sync::Mutex;
use tracing::instrument;
use uuid::Uuid;

use pulsestream_types::error::Result;
use pulsestream_types::ports::worker::WorkerQueue;
use pulsestream_types::TenantId;

const QUEUE_KEY: &str = "pulsestream:ingest:queue";

pub struct RedisWorkerQueue {
    conn: Mutex<MultiplexedConnection>,
}

impl RedisWorkerQueue {
    pub fn new(conn: MultiplexedConnection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }
}

#[async_trait]
impl WorkerQueue for RedisWorkerQueue {
    #[instrument(skip(self))]
    async fn enqueue(&self, tenant_id: TenantId, event_id: Uuid) -> Result<()> {
        let message = format!("{tenant_id}:{event_id}");
        let mut conn = self.conn.lock().await;
        let _: i64 = conn.lpush(QUEUE_KEY, message).await?;
        Ok(())
    }
}
