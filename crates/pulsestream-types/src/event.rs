//! The Event aggregate: the immutable observability record at the center of
//! the write path, plus the request/filter shapes used to build one.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use uuid::Uuid;

use crate::tenant::TenantId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    ApiCall,
    Error,
    UserAction,
    CustomEvent,
    System,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::ApiCall => "api_call",
            EventKind::Error => "error",
            EventKind::UserAction => "user_action",
            EventKind::CustomEvent => "custom_event",
            EventKind::System => "system",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

/// Where an event originated. `service` is the only required field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Source {
    pub service: String,
    pub endpoint: Option<String>,
    pub method: Option<String>,
    pub version: Option<String>,
    pub environment: Option<String>,
}

/// Free-form request context attached by the submitting client.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventContext {
    pub user_id: Option<String>,
    pub session_id: Option<String>,
    pub request_id: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    #[serde(default)]
    pub tags: HashMap<String, String>,
}

/// Optional numeric measurements. All fields independently optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventMetrics {
    pub response_time_ms: Option<f64>,
    pub status_code: Option<u16>,
    pub request_size_bytes: Option<u64>,
    pub response_size_bytes: Option<u64>,
    pub cache_hit: Option<bool>,
}

/// Owned by the write path through `queued`; every later transition belongs
/// to the out-of-core worker and sweeper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingState {
    Queued,
    Processing,
    Processed,
    Failed,
}

/// The persisted, immutable event row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: Uuid,
    pub tenant_id: TenantId,
    pub external_id: Option<String>,
    pub event_type: EventKind,
    pub severity: Severity,
    pub title: String,
    pub message: Option<String>,
    pub occurrence_timestamp: DateTime<Utc>,
    pub received_at: DateTime<Utc>,
    pub source: Source,
    pub context: EventContext,
    pub metrics: EventMetrics,
    pub payload: Option<Value>,
    pub processing_state: ProcessingState,
    pub deleted: bool,
}

/// Unvalidated wire shape for a single event submission, per the canonical
/// event submission schema. Field names match the JSON surface, not the
/// internal `Event`.
#[derive(Debug, Clone, Deserialize)]
pub struct EventSubmission {
    pub event_type: Option<String>,
    pub event_id: Option<String>,
    pub timestamp: Option<String>,
    pub title: Option<String>,
    pub message: Option<String>,
    pub severity: Option<String>,
    pub source: Option<RawSource>,
    pub context: Option<RawContext>,
    pub metrics: Option<RawMetrics>,
    pub payload: Option<Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawSource {
    pub service: Option<String>,
    pub endpoint: Option<String>,
    pub method: Option<String>,
    pub version: Option<String>,
    pub environment: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawContext {
    pub user_id: Option<String>,
    pub session_id: Option<String>,
    pub request_id: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    #[serde(default)]
    pub tags: HashMap<String, String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawMetrics {
    pub response_time_ms: Option<f64>,
    pub status_code: Option<i64>,
    pub request_size_bytes: Option<i64>,
    pub response_size_bytes: Option<i64>,
    pub cache_hit: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BatchSubmission {
    pub events: Vec<EventSubmission>,
}

/// A validated event, ready to hand to the store adapter. Produced only by
/// the validator (pulsestream-ingestion); the `tenant_id`/`id`/`received_at`
/// fields are assigned later by the ingestion coordinator, not here.
#[derive(Debug, Clone)]
pub struct ValidatedEvent {
    pub external_id: Option<String>,
    pub event_type: EventKind,
    pub severity: Severity,
    pub title: String,
    pub message: Option<String>,
    pub occurrence_timestamp: DateTime<Utc>,
    pub source: Source,
    pub context: EventContext,
    pub metrics: EventMetrics,
    pub payload: Option<Value>,
}

/// Search filter for the query service.
#[derive(Debug, Clone)]
pub struct EventFilter {
    pub event_type: Option<EventKind>,
    pub severity: Option<Severity>,
    pub service: Option<String>,
    pub endpoint: Option<String>,
    pub status_code: Option<u16>,
    pub user_id: Option<String>,
    pub tag: Option<(String, String)>,
    pub occurred_after: Option<DateTime<Utc>>,
    pub occurred_before: Option<DateTime<Utc>>,
    pub text: Option<String>,
    pub limit: u32,
    pub offset: u64,
    pub sort_descending: bool,
}

impl Default for ProcessingState {
    fn default() -> Self {
        ProcessingState::Queued
    }
}

impl Default for EventFilter {
    fn default() -> Self {
        Self {
            event_type: None,
            severity: None,
            service: None,
            endpoint: None,
            status_code: None,
            user_id: None,
            tag: None,
            occurred_after: None,
            occurred_before: None,
            text: None,
            limit: 100,
            offset: 0,
            sort_descending: true,
        }
    }
}

impl EventFilter {
    pub const MAX_LIMIT: u32 = 1000;

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit.min(Self::MAX_LIMIT);
        self
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EventStats {
    pub total: u64,
    pub by_kind: HashMap<String, u64>,
    pub by_severity: HashMap<String, u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_filter_default_sorts_descending() {
        let filter = EventFilter::default();
        assert!(filter.sort_descending);
        assert_eq!(filter.limit, 100);
    }

    #[test]
    fn event_filter_clamps_limit_to_max() {
        let filter = EventFilter::default().with_limit(5000);
        assert_eq!(filter.limit, EventFilter::MAX_LIMIT);
    }

    #[test]
    fn event_kind_as_str_matches_wire_names() {
        assert_eq!(EventKind::ApiCall.as_str(), "api_call");
        assert_eq!(EventKind::CustomEvent.as_str(), "custom_event");
    }
}
