//! In-memory fakes for every port trait, so `pulsestream-ingestion`'s unit
//! tests exercise real business logic without a Postgres or Redis instance.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use pulsestream_types::error::Result;
use pulsestream_types::event::{Event, EventFilter, EventStats, ProcessingState, ValidatedEvent};
use pulsestream_types::ports::rate_limit::{RateLimitDecision, RateLimiter};
use pulsestream_types::ports::store::{Store, Transaction, TransactionManager};
use pulsestream_types::ports::worker::WorkerQueue;
use pulsestream_types::tenant::{Tenant, TenantId, User};
use pulsestream_types::PulseError;

#[derive(Default)]
struct Data {
    tenants: HashMap<TenantId, Tenant>,
    users: HashMap<(TenantId, String), User>,
    events: HashMap<Uuid, Event>,
    /// (tenant_id, external_id) keys currently claimed by an in-flight,
    /// uncommitted transaction, keyed to the owning transaction's id.
    /// Models the row-lock a real Postgres unique index holds on an
    /// in-progress INSERT until that transaction commits or rolls back, so
    /// a racing transaction for the same key blocks instead of observing a
    /// partial, not-yet-committed state.
    reserved: HashMap<(TenantId, String), String>,
}

/// Shared backing store for [`InMemoryStore`] and [`InMemoryTransactionManager`] —
/// they must see the same data, just like one Postgres pool backs both the
/// read-path `Store` and the write-path `TransactionManager` in production.
#[derive(Clone, Default)]
pub struct InMemoryBackend {
    data: Arc<Mutex<Data>>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store(&self) -> InMemoryStore {
        InMemoryStore {
            data: self.data.clone(),
        }
    }

    pub fn transaction_manager(&self) -> InMemoryTransactionManager {
        InMemoryTransactionManager {
            data: self.data.clone(),
        }
    }

    pub fn seed_tenant(&self, tenant: Tenant) {
        self.data.lock().unwrap().tenants.insert(tenant.id, tenant);
    }
}

pub struct InMemoryStore {
    data: Arc<Mutex<Data>>,
}

#[async_trait]
impl Store for InMemoryStore {
    async fn tenant_by_credential(&self, credential: &str) -> Result<Option<Tenant>> {
        let data = self.data.lock().unwrap();
        Ok(data
            .tenants
            .values()
            .find(|t| t.api_credential == credential && t.active)
            .cloned())
    }

    async fn tenant_by_id(&self, id: TenantId) -> Result<Option<Tenant>> {
        Ok(self.data.lock().unwrap().tenants.get(&id).cloned())
    }

    async fn event_by_external_id(
        &self,
        tenant_id: TenantId,
        external_id: &str,
    ) -> Result<Option<Event>> {
        let data = self.data.lock().unwrap();
        Ok(data
            .events
            .values()
            .find(|e| {
                e.tenant_id == tenant_id
                    && !e.deleted
                    && e.external_id.as_deref() == Some(external_id)
            })
            .cloned())
    }

    async fn event_by_id(&self, tenant_id: TenantId, event_id: Uuid) -> Result<Option<Event>> {
        let data = self.data.lock().unwrap();
        Ok(data
            .events
            .get(&event_id)
            .filter(|e| e.tenant_id == tenant_id && !e.deleted)
            .cloned())
    }

    async fn search_events(&self, tenant_id: TenantId, filter: &EventFilter) -> Result<(Vec<Event>, u64)> {
        let data = self.data.lock().unwrap();
        let mut matches: Vec<Event> = data
            .events
            .values()
            .filter(|e| e.tenant_id == tenant_id && !e.deleted)
            .filter(|e| filter.event_type.map_or(true, |k| k == e.event_type))
            .filter(|e| filter.severity.map_or(true, |s| s == e.severity))
            .filter(|e| filter.service.as_ref().map_or(true, |s| *s == e.source.service))
            .filter(|e| {
                filter
                    .endpoint
                    .as_ref()
                    .map_or(true, |ep| e.source.endpoint.as_deref() == Some(ep.as_str()))
            })
            .filter(|e| {
                filter
                    .status_code
                    .map_or(true, |sc| e.metrics.status_code == Some(sc))
            })
            .filter(|e| {
                filter
                    .user_id
                    .as_ref()
                    .map_or(true, |uid| e.context.user_id.as_deref() == Some(uid.as_str()))
            })
            .filter(|e| {
                filter
                    .tag
                    .as_ref()
                    .map_or(true, |(k, v)| e.context.tags.get(k) == Some(v))
            })
            .filter(|e| filter.occurred_after.map_or(true, |t| e.occurrence_timestamp >= t))
            .filter(|e| filter.occurred_before.map_or(true, |t| e.occurrence_timestamp <= t))
            .filter(|e| {
                filter.text.as_ref().map_or(true, |needle| {
                    e.title.contains(needle.as_str())
                        || e.message.as_deref().unwrap_or_default().contains(needle.as_str())
                })
            })
            .cloned()
            .collect();

        matches.sort_by_key(|e| e.occurrence_timestamp);
        if filter.sort_descending {
            matches.reverse();
        }
        let total = matches.len() as u64;
        let page = matches
            .into_iter()
            .skip(filter.offset as usize)
            .take(filter.limit as usize)
            .collect();
        Ok((page, total))
    }

    async fn aggregate_stats(
        &self,
        tenant_id: TenantId,
        window_start: chrono::DateTime<Utc>,
        window_end: chrono::DateTime<Utc>,
    ) -> Result<EventStats> {
        let data = self.data.lock().unwrap();
        let mut by_kind = HashMap::new();
        let mut by_severity = HashMap::new();
        let mut total = 0u64;

        for event in data.events.values().filter(|e| {
            e.tenant_id == tenant_id
                && !e.deleted
                && e.occurrence_timestamp >= window_start
                && e.occurrence_timestamp < window_end
        }) {
            total += 1;
            *by_kind.entry(event.event_type.as_str().to_string()).or_insert(0u64) += 1;
            *by_severity
                .entry(format!("{:?}", event.severity).to_lowercase())
                .or_insert(0u64) += 1;
        }

        Ok(EventStats {
            total,
            by_kind,
            by_severity,
        })
    }

    async fn insert_tenant(&self, tenant: Tenant) -> Result<Tenant> {
        tenant.validate_invariants()?;
        self.data.lock().unwrap().tenants.insert(tenant.id, tenant.clone());
        Ok(tenant)
    }

    async fn deactivate_tenant(&self, id: TenantId) -> Result<()> {
        if let Some(tenant) = self.data.lock().unwrap().tenants.get_mut(&id) {
            tenant.active = false;
        }
        Ok(())
    }

    async fn insert_user(&self, user: User) -> Result<User> {
        self.data
            .lock()
            .unwrap()
            .users
            .insert((user.tenant_id, user.email.clone()), user.clone());
        Ok(user)
    }

    async fn user_by_email(&self, tenant_id: TenantId, email: &str) -> Result<Option<User>> {
        Ok(self
            .data
            .lock()
            .unwrap()
            .users
            .get(&(tenant_id, email.to_string()))
            .cloned())
    }
}

pub struct InMemoryTransactionManager {
    data: Arc<Mutex<Data>>,
}

#[async_trait]
impl TransactionManager for InMemoryTransactionManager {
    type Tx = InMemoryTransaction;

    async fn begin(&self) -> Result<Self::Tx> {
        Ok(InMemoryTransaction {
            data: self.data.clone(),
            id: Uuid::new_v4().to_string(),
            staged: None,
            reserved_key: None,
        })
    }

    async fn commit(&self, mut tx: Self::Tx) -> Result<()> {
        if let Some(event) = tx.staged.take() {
            let mut data = self.data.lock().unwrap();
            data.events.insert(event.id, event);
        }
        tx.release_reservation();
        Ok(())
    }

    async fn rollback(&self, mut tx: Self::Tx) -> Result<()> {
        tx.staged = None;
        tx.release_reservation();
        Ok(())
    }
}

pub struct InMemoryTransaction {
    data: Arc<Mutex<Data>>,
    id: String,
    staged: Option<Event>,
    /// The (tenant_id, external_id) key this transaction holds the
    /// reservation for, if `insert_event` claimed one.
    reserved_key: Option<(TenantId, String)>,
}

impl InMemoryTransaction {
    fn release_reservation(&mut self) {
        if let Some(key) = self.reserved_key.take() {
            let mut data = self.data.lock().unwrap();
            if data.reserved.get(&key).map(String::as_str) == Some(self.id.as_str()) {
                data.reserved.remove(&key);
            }
        }
    }
}

#[async_trait]
impl Transaction for InMemoryTransaction {
    async fn insert_event(&mut self, tenant_id: TenantId, event: ValidatedEvent) -> Result<Event> {
        if let Some(external_id) = event.external_id.clone() {
            let key = (tenant_id, external_id);
            // Block (cooperatively) until no other in-flight transaction
            // holds the same key, then claim it ourselves — mirrors the
            // wait a real unique index imposes on a colliding INSERT.
            loop {
                let mut data = self.data.lock().unwrap();
                let held_by_other = data
                    .reserved
                    .get(&key)
                    .is_some_and(|owner| owner != &self.id);
                if held_by_other {
                    drop(data);
                    tokio::task::yield_now().await;
                    continue;
                }
                let already_committed = data.events.values().any(|e| {
                    e.tenant_id == key.0 && !e.deleted && e.external_id.as_deref() == Some(key.1.as_str())
                });
                if already_committed {
                    return Err(PulseError::Conflict(
                        "(tenant_id, external_id) already exists".to_string(),
                    ));
                }
                data.reserved.insert(key.clone(), self.id.clone());
                self.reserved_key = Some(key);
                break;
            }
        }

        let inserted = Event {
            id: Uuid::new_v4(),
            tenant_id,
            external_id: event.external_id,
            event_type: event.event_type,
            severity: event.severity,
            title: event.title,
            message: event.message,
            occurrence_timestamp: event.occurrence_timestamp,
            received_at: Utc::now(),
            source: event.source,
            context: event.context,
            metrics: event.metrics,
            payload: event.payload,
            processing_state: ProcessingState::Queued,
            deleted: false,
        };
        self.staged = Some(inserted.clone());
        Ok(inserted)
    }
}

impl Drop for InMemoryTransaction {
    fn drop(&mut self) {
        // A transaction dropped without an explicit commit/rollback (e.g. a
        // caller that bailed out early) must not leave its reservation
        // dangling forever — release it the same way rollback would.
        if let Some(key) = self.reserved_key.take() {
            if let Ok(mut data) = self.data.lock() {
                if data.reserved.get(&key).map(String::as_str) == Some(self.id.as_str()) {
                    data.reserved.remove(&key);
                }
            }
        }
    }
}

/// In-memory rate limiter with the same fixed-window semantics as
/// [`crate::redis::RedisRateLimiter`], useful for deterministic tests that
/// don't want wall-clock-minute boundaries to matter.
#[derive(Default)]
pub struct InMemoryRateLimiter {
    counters: Mutex<HashMap<(TenantId, i64), u32>>,
}

impl InMemoryRateLimiter {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RateLimiter for InMemoryRateLimiter {
    async fn check_and_increment(&self, tenant_id: TenantId, limit: u32) -> Result<RateLimitDecision> {
        let window = Utc::now().timestamp() / 60;
        let mut counters = self.counters.lock().unwrap();
        let entry = counters.entry((tenant_id, window)).or_insert(0);
        *entry += 1;
        let current = *entry;
        let reset_after_seconds = (60 - (Utc::now().timestamp() % 60)).max(0) as u64;
        Ok(RateLimitDecision {
            allowed: current <= limit,
            limit,
            current,
            remaining: limit.saturating_sub(current),
            reset_after_seconds,
        })
    }
}

#[derive(Default)]
pub struct InMemoryWorkerQueue {
    pub enqueued: Mutex<Vec<(TenantId, Uuid)>>,
}

impl InMemoryWorkerQueue {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl WorkerQueue for InMemoryWorkerQueue {
    async fn enqueue(&self, tenant_id: TenantId, event_id: Uuid) -> Result<()> {
        self.enqueued.lock().unwrap().push((tenant_id, event_id));
        Ok(())
    }
}

/// A [`WorkerQueue`] that always fails, for exercising the rule that
/// enqueue failures are logged but never propagated to the caller.
#[derive(Default)]
pub struct AlwaysFailingWorkerQueue;

#[async_trait]
impl WorkerQueue for AlwaysFailingWorkerQueue {
    async fn enqueue(&self, _tenant_id: TenantId, _event_id: Uuid) -> Result<()> {
        Err(PulseError::Internal("simulated enqueue failure".to_string()))
    }
}
