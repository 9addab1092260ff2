//! Postgres-backed `Store`. Every tenant-scoped query below bakes in
//! `tenant_id = $1 AND deleted = false` — callers cannot bypass it, because
//! that discipline is centralized here rather than left to every caller.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

use pulsestream_types::error::Result;
use pulsestream_types::event::{Event, EventFilter, EventStats};
use pulsestream_types::ports::store::Store;
use pulsestream_types::tenant::{Tenant, TenantId, User, UserRole};

use super::row::EventRow;

pub struct PostgresStore {
    pool: Arc<PgPool>,
}

impl PostgresStore {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

struct TenantRow {
    id: Uuid,
    name: String,
    slug: String,
    contact_email: String,
    api_credential: String,
    active: bool,
    max_events_per_minute: i32,
    monthly_event_quota: Option<i64>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl sqlx::FromRow<'_, sqlx::postgres::PgRow> for TenantRow {
    fn from_row(row: &sqlx::postgres::PgRow) -> sqlx::Result<Self> {
        use sqlx::Row;
        Ok(Self {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            slug: row.try_get("slug")?,
            contact_email: row.try_get("contact_email")?,
            api_credential: row.try_get("api_credential")?,
            active: row.try_get("active")?,
            max_events_per_minute: row.try_get("max_events_per_minute")?,
            monthly_event_quota: row.try_get("monthly_event_quota")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl TenantRow {
    fn into_tenant(self) -> Tenant {
        Tenant {
            id: TenantId::from_uuid(self.id),
            name: self.name,
            slug: self.slug,
            contact_email: self.contact_email,
            api_credential: self.api_credential,
            active: self.active,
            max_events_per_minute: self.max_events_per_minute.max(0) as u32,
            monthly_event_quota: self.monthly_event_quota.map(|q| q.max(0) as u64),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

struct UserRow {
    id: Uuid,
    tenant_id: Uuid,
    email: String,
    password_verifier: String,
    role: String,
    active: bool,
    failed_login_count: i32,
    locked_until: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl sqlx::FromRow<'_, sqlx::postgres::PgRow> for UserRow {
    fn from_row(row: &sqlx::postgres::PgRow) -> sqlx::Result<Self> {
        use sqlx::Row;
        Ok(Self {
            id: row.try_get("id")?,
            tenant_id: row.try_get("tenant_id")?,
            email: row.try_get("email")?,
            password_verifier: row.try_get("password_verifier")?,
            role: row.try_get("role")?,
            active: row.try_get("active")?,
            failed_login_count: row.try_get("failed_login_count")?,
            locked_until: row.try_get("locked_until")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

impl UserRow {
    fn into_user(self) -> User {
        User {
            id: self.id,
            tenant_id: TenantId::from_uuid(self.tenant_id),
            email: self.email,
            password_verifier: self.password_verifier,
            role: match self.role.as_str() {
                "admin" => UserRole::Admin,
                "owner" => UserRole::Owner,
                _ => UserRole::Viewer,
            },
            active: self.active,
            failed_login_count: self.failed_login_count.max(0) as u32,
            locked_until: self.locked_until,
            created_at: self.created_at,
        }
    }
}

#[async_trait]
impl Store for PostgresStore {
    #[instrument(skip(self, credential))]
    async fn tenant_by_credential(&self, credential: &str) -> Result<Option<Tenant>> {
        let row: Option<TenantRow> =
            sqlx::query_as("SELECT * FROM tenants WHERE api_credential = $1 AND active = true")
                .bind(credential)
                .fetch_optional(&*self.pool)
                .await?;
        Ok(row.map(TenantRow::into_tenant))
    }

    async fn tenant_by_id(&self, id: TenantId) -> Result<Option<Tenant>> {
        let row: Option<TenantRow> = sqlx::query_as("SELECT * FROM tenants WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&*self.pool)
            .await?;
        Ok(row.map(TenantRow::into_tenant))
    }

    async fn event_by_external_id(
        &self,
        tenant_id: TenantId,
        external_id: &str,
    ) -> Result<Option<Event>> {
        let row: Option<EventRow> = sqlx::query_as(
            "SELECT * FROM events WHERE tenant_id = $1 AND external_id = $2 AND deleted = false",
        )
        .bind(tenant_id.as_uuid())
        .bind(external_id)
        .fetch_optional(&*self.pool)
        .await?;
        Ok(row.map(EventRow::into_event))
    }

    async fn event_by_id(&self, tenant_id: TenantId, event_id: Uuid) -> Result<Option<Event>> {
        let row: Option<EventRow> = sqlx::query_as(
            "SELECT * FROM events WHERE tenant_id = $1 AND id = $2 AND deleted = false",
        )
        .bind(tenant_id.as_uuid())
        .bind(event_id)
        .fetch_optional(&*self.pool)
        .await?;
        Ok(row.map(EventRow::into_event))
    }

    #[instrument(skip(self, filter))]
    async fn search_events(&self, tenant_id: TenantId, filter: &EventFilter) -> Result<(Vec<Event>, u64)> {
        let mut query = String::from(
            "SELECT * FROM events WHERE tenant_id = $1 AND deleted = false",
        );
        let mut count_query = String::from(
            "SELECT count(*) FROM events WHERE tenant_id = $1 AND deleted = false",
        );

        // Bind positions are threaded manually because the predicate set is
        // dynamic; both queries share the same WHERE clause text so the
        // count always matches what the page query would return.
        let mut clauses = Vec::new();
        let mut n = 1;
        if filter.event_type.is_some() {
            n += 1;
            clauses.push(format!("event_type = ${n}"));
        }
        if filter.severity.is_some() {
            n += 1;
            clauses.push(format!("severity = ${n}"));
        }
        if filter.service.is_some() {
            n += 1;
            clauses.push(format!("source_service = ${n}"));
        }
        if filter.endpoint.is_some() {
            n += 1;
            clauses.push(format!("source_endpoint = ${n}"));
        }
        if filter.status_code.is_some() {
            n += 1;
            clauses.push(format!("(metrics->>'status_code')::int = ${n}"));
        }
        if filter.user_id.is_some() {
            n += 1;
            clauses.push(format!("context->>'user_id' = ${n}"));
        }
        if filter.tag.is_some() {
            n += 2;
            clauses.push(format!("context->'tags'->>${} = ${n}", n - 1));
        }
        if filter.occurred_after.is_some() {
            n += 1;
            clauses.push(format!("occurrence_timestamp >= ${n}"));
        }
        if filter.occurred_before.is_some() {
            n += 1;
            clauses.push(format!("occurrence_timestamp <= ${n}"));
        }
        if filter.text.is_some() {
            n += 1;
            clauses.push(format!("(title ILIKE ${n} OR message ILIKE ${n})"));
        }

        for clause in &clauses {
            let fragment = format!(" AND {clause}");
            query.push_str(&fragment);
            count_query.push_str(&fragment);
        }

        let order = if filter.sort_descending { "DESC" } else { "ASC" };
        query.push_str(&format!(" ORDER BY occurrence_timestamp {order} LIMIT {} OFFSET {}", filter.limit, filter.offset));

        let mut q = sqlx::query_as::<_, EventRow>(&query).bind(tenant_id.as_uuid());
        let mut cq = sqlx::query_scalar::<_, i64>(&count_query).bind(tenant_id.as_uuid());

        if let Some(kind) = filter.event_type {
            q = q.bind(kind.as_str());
            cq = cq.bind(kind.as_str());
        }
        if let Some(sev) = filter.severity {
            let s = match sev {
                pulsestream_types::Severity::Debug => "debug",
                pulsestream_types::Severity::Info => "info",
                pulsestream_types::Severity::Warning => "warning",
                pulsestream_types::Severity::Error => "error",
                pulsestream_types::Severity::Critical => "critical",
            };
            q = q.bind(s);
            cq = cq.bind(s);
        }
        if let Some(service) = &filter.service {
            q = q.bind(service);
            cq = cq.bind(service);
        }
        if let Some(endpoint) = &filter.endpoint {
            q = q.bind(endpoint);
            cq = cq.bind(endpoint);
        }
        if let Some(status) = filter.status_code {
            q = q.bind(status as i32);
            cq = cq.bind(status as i32);
        }
        if let Some(user_id) = &filter.user_id {
            q = q.bind(user_id);
            cq = cq.bind(user_id);
        }
        if let Some((key, value)) = &filter.tag {
            q = q.bind(key).bind(value);
            cq = cq.bind(key).bind(value);
        }
        if let Some(after) = filter.occurred_after {
            q = q.bind(after);
            cq = cq.bind(after);
        }
        if let Some(before) = filter.occurred_before {
            q = q.bind(before);
            cq = cq.bind(before);
        }
        if let Some(text) = &filter.text {
            let pattern = format!("%{text}%");
            q = q.bind(pattern.clone());
            cq = cq.bind(pattern);
        }

        let rows = q.fetch_all(&*self.pool).await?;
        let total: i64 = cq.fetch_one(&*self.pool).await?;

        Ok((rows.into_iter().map(EventRow::into_event).collect(), total.max(0) as u64))
    }

    async fn aggregate_stats(
        &self,
        tenant_id: TenantId,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> Result<EventStats> {
        let total: i64 = sqlx::query_scalar(
            "SELECT count(*) FROM events WHERE tenant_id = $1 AND deleted = false AND occurrence_timestamp >= $2 AND occurrence_timestamp < $3",
        )
        .bind(tenant_id.as_uuid())
        .bind(window_start)
        .bind(window_end)
        .fetch_one(&*self.pool)
        .await?;

        let by_kind: Vec<(String, i64)> = sqlx::query_as(
            "SELECT event_type, count(*) FROM events WHERE tenant_id = $1 AND deleted = false AND occurrence_timestamp >= $2 AND occurrence_timestamp < $3 GROUP BY event_type",
        )
        .bind(tenant_id.as_uuid())
        .bind(window_start)
        .bind(window_end)
        .fetch_all(&*self.pool)
        .await?;

        let by_severity: Vec<(String, i64)> = sqlx::query_as(
            "SELECT severity, count(*) FROM events WHERE tenant_id = $1 AND deleted = false AND occurrence_timestamp >= $2 AND occurrence_timestamp < $3 GROUP BY severity",
        )
        .bind(tenant_id.as_uuid())
        .bind(window_start)
        .bind(window_end)
        .fetch_all(&*self.pool)
        .await?;

        Ok(EventStats {
            total: total.max(0) as u64,
            by_kind: by_kind.into_iter().map(|(k, c)| (k, c.max(0) as u64)).collect(),
            by_severity: by_severity.into_iter().map(|(k, c)| (k, c.max(0) as u64)).collect(),
        })
    }

    async fn insert_tenant(&self, tenant: Tenant) -> Result<Tenant> {
        tenant.validate_invariants()?;
        let row: TenantRow = sqlx::query_as(
            r#"
            INSERT INTO tenants (id, name, slug, contact_email, api_credential, active, max_events_per_minute, monthly_event_quota, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(tenant.id.as_uuid())
        .bind(&tenant.name)
        .bind(&tenant.slug)
        .bind(&tenant.contact_email)
        .bind(&tenant.api_credential)
        .bind(tenant.active)
        .bind(tenant.max_events_per_minute as i32)
        .bind(tenant.monthly_event_quota.map(|q| q as i64))
        .bind(tenant.created_at)
        .bind(tenant.updated_at)
        .fetch_one(&*self.pool)
        .await?;
        Ok(row.into_tenant())
    }

    async fn deactivate_tenant(&self, id: TenantId) -> Result<()> {
        sqlx::query("UPDATE tenants SET active = false, updated_at = now() WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&*self.pool)
            .await?;
        Ok(())
    }

    async fn insert_user(&self, user: User) -> Result<User> {
        let role = match user.role {
            UserRole::Viewer => "viewer",
            UserRole::Admin => "admin",
            UserRole::Owner => "owner",
        };
        let row: UserRow = sqlx::query_as(
            r#"
            INSERT INTO users (id, tenant_id, email, password_verifier, role, active, failed_login_count, locked_until, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(user.id)
        .bind(user.tenant_id.as_uuid())
        .bind(&user.email)
        .bind(&user.password_verifier)
        .bind(role)
        .bind(user.active)
        .bind(user.failed_login_count as i32)
        .bind(user.locked_until)
        .bind(user.created_at)
        .fetch_one(&*self.pool)
        .await?;
        Ok(row.into_user())
    }

    async fn user_by_email(&self, tenant_id: TenantId, email: &str) -> Result<Option<User>> {
        let row: Option<UserRow> =
            sqlx::query_as("SELECT * FROM users WHERE tenant_id = $1 AND email = $2")
                .bind(tenant_id.as_uuid())
                .bind(email)
                .fetch_optional(&*self.pool)
                .await?;
        Ok(row.map(UserRow::into_user))
    }
}
