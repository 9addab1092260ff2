//! Fixed-window rate limiter. A naive check-then-increment would race under
//! concurrent callers, so this pushes the whole decision into a single Lua
//! script: one `EVAL` does increment-and-conditionally-expire atomically.

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::Script;
use tokio::sync::Mutex;
use tracing::{instrument, warn};

use pulsestream_types::error::Result;
use pulsestream_types::ports::rate_limit::{RateLimitDecision, RateLimiter};
use pulsestream_types::TenantId;

/// INCR the window key; if it was just created (new value == 1), set a 60s
/// expiry. Returns the post-increment value. One round trip, race-safe
/// under concurrent callers because Redis executes scripts atomically.
const INCR_WITH_EXPIRE: &str = r#"
local current = redis.call('INCR', KEYS[1])
if current == 1 then
    redis.call('EXPIRE', KEYS[1], 60)
end
return current
"#;

pub struct RedisRateLimiter {
    conn: Mutex<MultiplexedConnection>,
    fail_open: bool,
}

impl RedisRateLimiter {
    pub fn new(conn: MultiplexedConnection, fail_open: bool) -> Self {
        Self {
            conn: Mutex::new(conn),
            fail_open,
        }
    }

    fn window_key(tenant_id: TenantId) -> String {
        let window = chrono::Utc::now().timestamp() / 60;
        format!("ratelimit:{tenant_id}:{window}")
    }
}

#[async_trait]
impl RateLimiter for RedisRateLimiter {
    #[instrument(skip(self))]
    async fn check_and_increment(&self, tenant_id: TenantId, limit: u32) -> Result<RateLimitDecision> {
        let key = Self::window_key(tenant_id);
        let mut conn = self.conn.lock().await;

        let result: redis::RedisResult<i64> = Script::new(INCR_WITH_EXPIRE)
            .key(&key)
            .invoke_async(&mut *conn)
            .await;

        match result {
            Ok(current) => {
                let current = current.max(0) as u32;
                let allowed = current <= limit;
                let now = chrono::Utc::now().timestamp();
                let reset_after_seconds = (60 - (now % 60)).max(0) as u64;
                Ok(RateLimitDecision {
                    allowed,
                    limit,
                    current,
                    remaining: limit.saturating_sub(current),
                    reset_after_seconds,
                })
            }
            Err(err) if self.fail_open => {
                warn!(error = %err, tenant = %tenant_id, "rate limiter cache unavailable, failing open");
                Ok(RateLimitDecision {
                    allowed: true,
                    limit,
                    current: 0,
                    remaining: limit,
                    reset_after_seconds: 60,
                })
            }
            Err(err) => Err(err.into()),
        }
    }
}
