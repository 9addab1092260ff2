//! Short-TTL process-local cache for credential → tenant lookups, so the
//! auth middleware doesn't hit Postgres on every request. Deliberately NOT a
//! Redis-backed cache: a shared cache would need its own invalidation
//! fan-out, which is overkill for a sub-minute TTL.

use dashmap::DashMap;
use std::time::{Duration, Instant};

use pulsestream_types::Tenant;

struct CachedTenant {
    tenant: Tenant,
    expires_at: Instant,
}

/// Keyed by credential, not tenant id — the tenant registry resolves by
/// credential, so that's the hot lookup.
pub struct TenantCache {
    entries: DashMap<String, CachedTenant>,
    ttl: Duration,
}

impl TenantCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    pub fn get(&self, credential: &str) -> Option<Tenant> {
        let entry = self.entries.get(credential)?;
        if entry.expires_at <= Instant::now() {
            drop(entry);
            self.entries.remove(credential);
            return None;
        }
        Some(entry.tenant.clone())
    }

    pub fn put(&self, credential: String, tenant: Tenant) {
        self.entries.insert(
            credential,
            CachedTenant {
                tenant,
                expires_at: Instant::now() + self.ttl,
            },
        );
    }

    /// Invalidation hook for the out-of-core administrative deactivation
    /// flow.
    pub fn invalidate_by_tenant_id(&self, tenant_id: pulsestream_types::TenantId) {
        self.entries.retain(|_, cached| cached.tenant.id != tenant_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use pulsestream_types::TenantId;

    fn sample_tenant() -> Tenant {
        Tenant {
            id: TenantId::new(),
            name: "Acme".into(),
            slug: "acme".into(),
            contact_email: "ops@acme.test".into(),
            api_credential: "cred-1".into(),
            active: true,
            max_events_per_minute: 100,
            monthly_event_quota: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn put_then_get_returns_same_tenant() {
        let cache = TenantCache::new(Duration::from_secs(30));
        let tenant = sample_tenant();
        cache.put("cred-1".into(), tenant.clone());
        let fetched = cache.get("cred-1").unwrap();
        assert_eq!(fetched.id, tenant.id);
    }

    #[test]
    fn expired_entry_is_not_returned() {
        let cache = TenantCache::new(Duration::from_millis(1));
        cache.put("cred-1".into(), sample_tenant());
        std::thread::sleep(Duration::from_millis(5));
        assert!(cache.get("cred-1").is_none());
    }

    #[test]
    fn invalidate_by_tenant_id_removes_entry() {
        let cache = TenantCache::new(Duration::from_secs(30));
        let tenant = sample_tenant();
        cache.put("cred-1".into(), tenant.clone());
        cache.invalidate_by_tenant_id(tenant.id);
        assert!(cache.get("cred-1").is_none());
    }
}
