//! Query endpoints: search, fetch-by-id, stats.

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::{Extension, Json};
use chrono::{Duration, Utc};
use tracing::instrument;
use uuid::Uuid;

use pulsestream_ingestion::QueryService;
use pulsestream_types::event::EventFilter;
use pulsestream_types::{Severity, Tenant};

use crate::dto::{SearchQuery, SearchResponse, StatsQuery, StatsResponse};
use crate::errors::ApiError;
use crate::state::AppState;

fn parse_severity(raw: &str) -> Option<Severity> {
    match raw {
        "debug" => Some(Severity::Debug),
        "info" => Some(Severity::Info),
        "warning" => Some(Severity::Warning),
        "error" => Some(Severity::Error),
        "critical" => Some(Severity::Critical),
        _ => None,
    }
}

fn parse_event_kind(raw: &str) -> Option<pulsestream_types::EventKind> {
    use pulsestream_types::EventKind;
    match raw {
        "api_call" => Some(EventKind::ApiCall),
        "error" => Some(EventKind::Error),
        "user_action" => Some(EventKind::UserAction),
        "custom_event" => Some(EventKind::CustomEvent),
        "system" => Some(EventKind::System),
        _ => None,
    }
}

#[instrument(skip(state, query), fields(tenant_id = %tenant.id))]
pub async fn search_events(
    State(state): State<AppState>,
    Extension(tenant): Extension<Tenant>,
    Query(query): Query<SearchQuery>,
) -> impl IntoResponse {
    let filter = EventFilter {
        event_type: query.event_type.as_deref().and_then(parse_event_kind),
        severity: query.severity.as_deref().and_then(parse_severity),
        service: query.service,
        endpoint: query.endpoint,
        status_code: query.status_code,
        user_id: query.user_id,
        tag: match (query.tag_key, query.tag_value) {
            (Some(k), Some(v)) => Some((k, v)),
            _ => None,
        },
        occurred_after: query.occurred_after,
        occurred_before: query.occurred_before,
        text: query.text,
        limit: query.limit.unwrap_or(100).min(EventFilter::MAX_LIMIT),
        offset: query.offset.unwrap_or(0),
        sort_descending: !query.ascending.unwrap_or(false),
    };

    let service = QueryService::new(state.store.as_ref());
    match service.search(tenant.id, filter.clone()).await {
        Ok((events, total)) => Json(SearchResponse {
            events,
            total,
            limit: filter.limit,
            offset: filter.offset,
        })
        .into_response(),
        Err(err) => ApiError::from(err).into_response(),
    }
}

#[instrument(skip(state), fields(tenant_id = %tenant.id))]
pub async fn get_event(
    State(state): State<AppState>,
    Extension(tenant): Extension<Tenant>,
    Path(event_id): Path<Uuid>,
) -> impl IntoResponse {
    let service = QueryService::new(state.store.as_ref());
    match service.get(tenant.id, event_id).await {
        Ok(event) => Json(event).into_response(),
        Err(err) => ApiError::from(err).into_response(),
    }
}

#[instrument(skip(state, query), fields(tenant_id = %tenant.id))]
pub async fn get_stats(
    State(state): State<AppState>,
    Extension(tenant): Extension<Tenant>,
    Query(query): Query<StatsQuery>,
) -> impl IntoResponse {
    let window_end = query.window_end.unwrap_or_else(Utc::now);
    let window_start = query.window_start.unwrap_or_else(|| window_end - Duration::hours(24));

    let service = QueryService::new(state.store.as_ref());
    match service.stats(tenant.id, window_start, window_end).await {
        Ok(stats) => Json(StatsResponse { stats }).into_response(),
        Err(err) => ApiError::from(err).into_response(),
    }
}
