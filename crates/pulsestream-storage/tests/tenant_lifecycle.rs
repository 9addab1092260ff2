//! Tenant deactivation and cache invalidation. Exercises the in-memory store
//! plus `TenantCache` together, without needing Docker, since neither fake
//! touches Postgres or Redis.

use std::time::Duration;

use pulsestream_storage::fakes::InMemoryBackend;
use pulsestream_storage::redis::TenantCache;
use pulsestream_types::ports::store::Store;
use pulsestream_types::{Tenant, TenantId};

fn tenant() -> Tenant {
    Tenant {
        id: TenantId::new(),
        name: "Acme".into(),
        slug: "acme".into(),
        contact_email: "ops@acme.test".into(),
        api_credential: "cred-acme".into(),
        active: true,
        max_events_per_minute: 100,
        monthly_event_quota: None,
        created_at: chrono::Utc::now(),
        updated_at: chrono::Utc::now(),
    }
}

#[tokio::test]
async fn deactivating_a_tenant_invalidates_its_cache_entry() {
    let backend = InMemoryBackend::new();
    let store = backend.store();
    let cache = TenantCache::new(Duration::from_secs(30));

    let tenant = store.insert_tenant(tenant()).await.unwrap();

    // Authenticate once: a real `resolve_tenant` would populate the cache
    // on a store hit, same as the auth middleware does.
    let resolved = store.tenant_by_credential(&tenant.api_credential).await.unwrap().unwrap();
    cache.put(tenant.api_credential.clone(), resolved);
    assert!(cache.get(&tenant.api_credential).is_some());

    // The out-of-core administrative flow deactivates the tenant and must
    // also invalidate any cached positive lookup.
    store.deactivate_tenant(tenant.id).await.unwrap();
    cache.invalidate_by_tenant_id(tenant.id);

    assert!(cache.get(&tenant.api_credential).is_none(), "stale cache entry must not survive deactivation");
    assert!(
        store.tenant_by_credential(&tenant.api_credential).await.unwrap().is_none(),
        "deactivated tenant must no longer authenticate"
    );
}
