//! Typed row mapping between `events` table columns and the domain `Event`.
//! Deliberately not a generic JSONB blob-per-row shape — every queryable
//! field gets its own column so the partial unique index and composite
//! indexes in the schema can do their job.

use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::postgres::PgRow;
use sqlx::{FromRow, Row};
use uuid::Uuid;

use pulsestream_types::error::Result;
use pulsestream_types::event::{
    Event, EventContext, EventKind, EventMetrics, ProcessingState, Severity, Source, ValidatedEvent,
};
use pulsestream_types::{PulseError, TenantId};

pub struct EventRow {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub external_id: Option<String>,
    pub event_type: String,
    pub severity: String,
    pub title: String,
    pub message: Option<String>,
    pub occurrence_timestamp: DateTime<Utc>,
    pub received_at: DateTime<Utc>,
    pub source_service: String,
    pub source_endpoint: Option<String>,
    pub source_method: Option<String>,
    pub source_version: Option<String>,
    pub source_environment: Option<String>,
    pub context: Value,
    pub metrics: Value,
    pub payload: Option<Value>,
    pub processing_state: String,
    pub deleted: bool,
}

impl FromRow<'_, PgRow> for EventRow {
    fn from_row(row: &PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            id: row.try_get("id")?,
            tenant_id: row.try_get("tenant_id")?,
            external_id: row.try_get("external_id")?,
            event_type: row.try_get("event_type")?,
            severity: row.try_get("severity")?,
            title: row.try_get("title")?,
            message: row.try_get("message")?,
            occurrence_timestamp: row.try_get("occurrence_timestamp")?,
            received_at: row.try_get("received_at")?,
            source_service: row.try_get("source_service")?,
            source_endpoint: row.try_get("source_endpoint")?,
            source_method: row.try_get("source_method")?,
            source_version: row.try_get("source_version")?,
            source_environment: row.try_get("source_environment")?,
            context: row.try_get("context")?,
            metrics: row.try_get("metrics")?,
            payload: row.try_get("payload")?,
            processing_state: row.try_get("processing_state")?,
            deleted: row.try_get("deleted")?,
        })
    }
}

fn parse_event_kind(s: &str) -> EventKind {
    match s {
        "api_call" => EventKind::ApiCall,
        "error" => EventKind::Error,
        "user_action" => EventKind::UserAction,
        "system" => EventKind::System,
        _ => EventKind::CustomEvent,
    }
}

fn parse_severity(s: &str) -> Severity {
    match s {
        "debug" => Severity::Debug,
        "info" => Severity::Info,
        "warning" => Severity::Warning,
        "critical" => Severity::Critical,
        _ => Severity::Error,
    }
}

fn parse_processing_state(s: &str) -> ProcessingState {
    match s {
        "processing" => ProcessingState::Processing,
        "processed" => ProcessingState::Processed,
        "failed" => ProcessingState::Failed,
        _ => ProcessingState::Queued,
    }
}

impl EventRow {
    pub fn into_event(self) -> Event {
        Event {
            id: self.id,
            tenant_id: TenantId::from_uuid(self.tenant_id),
            external_id: self.external_id,
            event_type: parse_event_kind(&self.event_type),
            severity: parse_severity(&self.severity),
            title: self.title,
            message: self.message,
            occurrence_timestamp: self.occurrence_timestamp,
            received_at: self.received_at,
            source: Source {
                service: self.source_service,
                endpoint: self.source_endpoint,
                method: self.source_method,
                version: self.source_version,
                environment: self.source_environment,
            },
            context: serde_json::from_value(self.context).unwrap_or_default(),
            metrics: serde_json::from_value(self.metrics).unwrap_or_default(),
            payload: self.payload,
            processing_state: parse_processing_state(&self.processing_state),
            deleted: self.deleted,
        }
    }
}

/// Insert one validated event, returning the persisted row. Relies on the
/// database rejecting a colliding `(tenant_id, external_id)` pair via the
/// partial unique index; the caller translates that into the idempotent
/// recovery path, not this function.
pub async fn insert_event(
    conn: &mut sqlx::Transaction<'static, sqlx::Postgres>,
    id: Uuid,
    tenant_id: TenantId,
    event: &ValidatedEvent,
    received_at: DateTime<Utc>,
    state: ProcessingState,
) -> Result<Event> {
    let context = serde_json::to_value(&event.context)?;
    let metrics = serde_json::to_value(&event.metrics)?;

    let row: EventRow = sqlx::query_as(
        r#"
        INSERT INTO events (
            id, tenant_id, external_id, event_type, severity, title, message,
            occurrence_timestamp, received_at,
            source_service, source_endpoint, source_method, source_version, source_environment,
            context, metrics, payload, processing_state, deleted
        ) VALUES (
            $1, $2, $3, $4, $5, $6, $7,
            $8, $9,
            $10, $11, $12, $13, $14,
            $15, $16, $17, $18, false
        )
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(tenant_id.as_uuid())
    .bind(&event.external_id)
    .bind(event.event_type.as_str())
    .bind(severity_str(event.severity))
    .bind(&event.title)
    .bind(&event.message)
    .bind(event.occurrence_timestamp)
    .bind(received_at)
    .bind(&event.source.service)
    .bind(&event.source.endpoint)
    .bind(&event.source.method)
    .bind(&event.source.version)
    .bind(&event.source.environment)
    .bind(context)
    .bind(metrics)
    .bind(&event.payload)
    .bind(state_str(state))
    .fetch_one(&mut **conn)
    .await
    .map_err(PulseError::from)?;

    Ok(row.into_event())
}

fn severity_str(s: Severity) -> &'static str {
    match s {
        Severity::Debug => "debug",
        Severity::Info => "info",
        Severity::Warning => "warning",
        Severity::Error => "error",
        Severity::Critical => "critical",
    }
}

fn state_str(s: ProcessingState) -> &'static str {
    match s {
        ProcessingState::Queued => "queued",
        ProcessingState::Processing => "processing",
        ProcessingState::Processed => "processed",
        ProcessingState::Failed => "failed",
    }
}
