//! Wire-level request/response shapes for the HTTP surface. Deliberately
//! separate from `pulsestream_types::event::EventSubmission` — that type is
//! the ingestion pipeline's input; these are what actually crosses the wire
//! and get serialized back out.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use pulsestream_ingestion::ElementOutcome;
use pulsestream_types::event::{Event, EventStats, EventSubmission};

#[derive(Debug, Deserialize)]
pub struct BatchRequest {
    pub events: Vec<EventSubmission>,
}

#[derive(Debug, Serialize)]
pub struct IngestResponse {
    pub success: bool,
    pub event_id: Uuid,
    pub ingested_at: chrono::DateTime<chrono::Utc>,
    #[serde(skip_serializing_if = "is_false")]
    pub duplicate: bool,
}

fn is_false(v: &bool) -> bool {
    !*v
}

#[derive(Debug, Serialize)]
pub struct BatchElementResult {
    pub index: usize,
    pub success: bool,
    pub event_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duplicate: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ElementError>,
}

#[derive(Debug, Serialize)]
pub struct ElementError {
    pub kind: &'static str,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct BatchResponse {
    pub results: Vec<BatchElementResult>,
    pub successful_count: usize,
    pub failed_count: usize,
}

impl From<(usize, ElementOutcome)> for BatchElementResult {
    fn from((index, outcome): (usize, ElementOutcome)) -> Self {
        match outcome {
            ElementOutcome::Success { event_id, duplicate } => BatchElementResult {
                index,
                success: true,
                event_id: Some(event_id),
                duplicate: Some(duplicate),
                error: None,
            },
            ElementOutcome::Failure { kind, message } => BatchElementResult {
                index,
                success: false,
                event_id: None,
                duplicate: None,
                error: Some(ElementError { kind, message }),
            },
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub event_type: Option<String>,
    pub severity: Option<String>,
    pub service: Option<String>,
    pub endpoint: Option<String>,
    pub status_code: Option<u16>,
    pub user_id: Option<String>,
    pub tag_key: Option<String>,
    pub tag_value: Option<String>,
    pub occurred_after: Option<chrono::DateTime<chrono::Utc>>,
    pub occurred_before: Option<chrono::DateTime<chrono::Utc>>,
    pub text: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u64>,
    pub ascending: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub events: Vec<Event>,
    pub total: u64,
    pub limit: u32,
    pub offset: u64,
}

#[derive(Debug, Deserialize)]
pub struct StatsQuery {
    pub window_start: Option<chrono::DateTime<chrono::Utc>>,
    pub window_end: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    #[serde(flatten)]
    pub stats: EventStats,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}
