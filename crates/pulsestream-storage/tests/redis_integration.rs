//! Rate limiter against a real Redis instance. Gated behind Docker; not run
//! by default.
//! Run with: `cargo test -p pulsestream-storage --test redis_integration -- --ignored`

use testcontainers::clients::Cli;
use testcontainers_modules::redis::Redis as RedisImage;

use pulsestream_storage::redis::{self, RedisRateLimiter};
use pulsestream_types::ports::rate_limit::RateLimiter;
use pulsestream_types::TenantId;

#[tokio::test]
#[ignore = "requires Docker"]
async fn increments_are_race_safe_and_stop_admitting_past_the_limit() {
    let docker = Cli::default();
    let container = docker.run(RedisImage::default());
    let port = container.get_host_port_ipv4(6379);
    let url = format!("redis://127.0.0.1:{port}");

    let conn = redis::connect(&url).await.unwrap();
    let limiter = RedisRateLimiter::new(conn, false);
    let tenant_id = TenantId::new();

    let mut allowed_count = 0;
    for _ in 0..15 {
        let decision = limiter.check_and_increment(tenant_id, 10).await.unwrap();
        if decision.allowed {
            allowed_count += 1;
        }
    }

    assert_eq!(allowed_count, 10);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn distinct_tenants_have_independent_counters() {
    let docker = Cli::default();
    let container = docker.run(RedisImage::default());
    let port = container.get_host_port_ipv4(6379);
    let url = format!("redis://127.0.0.1:{port}");

    let conn = redis::connect(&url).await.unwrap();
    let limiter = RedisRateLimiter::new(conn, false);

    let tenant_a = TenantId::new();
    let tenant_b = TenantId::new();

    for _ in 0..5 {
        assert!(limiter.check_and_increment(tenant_a, 5).await.unwrap().allowed);
    }
    assert!(limiter.check_and_increment(tenant_b, 5).await.unwrap().allowed);
}
