//! Rate limiter port: the single fixed-window operation callers need.
//! PulseStream has no per-host dimension, only per-tenant.

use async_trait::async_trait;

use crate::error::Result;
use crate::tenant::TenantId;

/// Outcome of one `check_and_increment` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub limit: u32,
    pub current: u32,
    pub remaining: u32,
    /// Seconds until the current fixed window rolls over.
    pub reset_after_seconds: u64,
}

/// Fixed-window, per-tenant counter backed by a shared cache.
#[async_trait]
pub trait RateLimiter: Send + Sync {
    /// Atomically increments the counter for `tenant_id`'s current minute
    /// window against `limit`. A rejected request still counts: the
    /// increment is never rolled back.
    async fn check_and_increment(&self, tenant_id: TenantId, limit: u32) -> Result<RateLimitDecision>;
}
