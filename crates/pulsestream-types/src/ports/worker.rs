//! Worker hand-off port: interface-only, the implementation is an external
//! durable queue maintained by a downstream worker pool. Narrowed to the one
//! fire-and-forget operation the ingestion coordinator needs.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::tenant::TenantId;

/// At-least-once, best-effort-in-order-per-tenant hand-off to the
/// out-of-core worker pool. The coordinator tolerates failure here —
/// callers must never let an `Err` from `enqueue` fail the surrounding
/// request.
#[async_trait]
pub trait WorkerQueue: Send + Sync {
    async fn enqueue(&self, tenant_id: TenantId, event_id: Uuid) -> Result<()>;
}
