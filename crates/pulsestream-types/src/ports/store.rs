//! Store adapter contract. Every tenant-scoped method is trusted to apply
//! `tenant_id = :tid AND deleted = false` internally — callers never build
//! that predicate themselves. Specialized with concrete methods rather than
//! a generic `Repository<T>`/`find_by_id` shape, because dedup lookup,
//! filtered search, and aggregate stats need more than generic CRUD.

use async_trait::async_trait;

use crate::error::Result;
use crate::event::{Event, EventFilter, EventStats, ValidatedEvent};
use crate::tenant::{Tenant, TenantId, User};

/// A transaction handle threaded explicitly through the ingestion
/// coordinator rather than carried implicitly via thread-local or task-local
/// context, so the begin/commit/rollback bracket is always visible at the
/// call site. The operations exposed are the two the ingestion coordinator
/// actually needs, not a generic closure-executor.
#[async_trait]
pub trait Transaction: Send {
    /// Insert a validated event inside this transaction, assigning it a
    /// server id and receipt timestamp. Returns `PulseError::Conflict` if
    /// the (tenant_id, external_id) partial unique index rejects the row.
    ///
    /// A unique violation leaves the underlying transaction aborted (no
    /// further statements may run on this handle); the late-arriving-
    /// duplicate recovery path rolls back and rereads through
    /// [`Store::event_by_external_id`] instead of this handle.
    async fn insert_event(&mut self, tenant_id: TenantId, event: ValidatedEvent) -> Result<Event>;
}

/// Opens and scopes transactions. Callers never see a transaction outside a
/// begin-then-commit-or-rollback bracket.
#[async_trait]
pub trait TransactionManager: Send + Sync {
    type Tx: Transaction;

    async fn begin(&self) -> Result<Self::Tx>;
    async fn commit(&self, tx: Self::Tx) -> Result<()>;
    async fn rollback(&self, tx: Self::Tx) -> Result<()>;
}

/// Typed, tenant-scoped access to the relational store.
#[async_trait]
pub trait Store: Send + Sync {
    async fn tenant_by_credential(&self, credential: &str) -> Result<Option<Tenant>>;
    async fn tenant_by_id(&self, id: TenantId) -> Result<Option<Tenant>>;

    /// Outside any write transaction; used by the deduplicator before a
    /// transaction is opened.
    async fn event_by_external_id(
        &self,
        tenant_id: TenantId,
        external_id: &str,
    ) -> Result<Option<Event>>;

    async fn event_by_id(&self, tenant_id: TenantId, event_id: uuid::Uuid) -> Result<Option<Event>>;

    async fn search_events(&self, tenant_id: TenantId, filter: &EventFilter) -> Result<(Vec<Event>, u64)>;

    async fn aggregate_stats(
        &self,
        tenant_id: TenantId,
        window_start: chrono::DateTime<chrono::Utc>,
        window_end: chrono::DateTime<chrono::Utc>,
    ) -> Result<EventStats>;

    /// Administrative-flow seeding, used by tests to set up tenants. Not
    /// exposed over HTTP.
    async fn insert_tenant(&self, tenant: Tenant) -> Result<Tenant>;
    async fn deactivate_tenant(&self, id: TenantId) -> Result<()>;

    /// Administrative-flow seeding, used by tests to set up users. Not
    /// exposed over HTTP.
    async fn insert_user(&self, user: User) -> Result<User>;
    async fn user_by_email(&self, tenant_id: TenantId, email: &str) -> Result<Option<User>>;
}
