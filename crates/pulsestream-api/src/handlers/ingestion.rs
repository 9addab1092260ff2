//! Ingestion endpoints: single-event and batch submission.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::{Extension, Json};
use tracing::instrument;

use pulsestream_ingestion::{process_batch, BatchEnvelopeError, IngestionCoordinator, Validator};
use pulsestream_types::event::EventSubmission;
use pulsestream_types::Tenant;

use crate::dto::{BatchElementResult, BatchRequest, BatchResponse, IngestResponse};
use crate::errors::ApiError;
use crate::state::AppState;

#[instrument(skip(state, submission), fields(tenant_id = %tenant.id))]
pub async fn ingest_event(
    State(state): State<AppState>,
    Extension(tenant): Extension<Tenant>,
    Json(submission): Json<EventSubmission>,
) -> impl IntoResponse {
    let coordinator = IngestionCoordinator::new(
        Validator::new(state.ingestion_config),
        state.store.as_ref(),
        state.tx_manager.as_ref(),
        state.rate_limiter.as_ref(),
        state.worker_queue.as_ref(),
    );

    match coordinator.ingest(&tenant, submission).await {
        Ok(outcome) => Json(IngestResponse {
            success: true,
            event_id: outcome.event_id,
            ingested_at: outcome.ingested_at,
            duplicate: outcome.duplicate,
        })
        .into_response(),
        Err(err) => ApiError::from(err).into_response(),
    }
}

#[instrument(skip(state, request), fields(tenant_id = %tenant.id))]
pub async fn ingest_batch(
    State(state): State<AppState>,
    Extension(tenant): Extension<Tenant>,
    Json(request): Json<BatchRequest>,
) -> impl IntoResponse {
    let coordinator = IngestionCoordinator::new(
        Validator::new(state.ingestion_config),
        state.store.as_ref(),
        state.tx_manager.as_ref(),
        state.rate_limiter.as_ref(),
        state.worker_queue.as_ref(),
    );

    let outcome = process_batch(&coordinator, &tenant, state.max_batch_size, request.events).await;

    match outcome {
        Ok(result) => {
            let all_failed = result.all_failed();
            let response = BatchResponse {
                results: result
                    .results
                    .into_iter()
                    .enumerate()
                    .map(BatchElementResult::from)
                    .collect(),
                successful_count: result.successful_count,
                failed_count: result.failed_count,
            };
            if all_failed {
                (axum::http::StatusCode::BAD_REQUEST, Json(response)).into_response()
            } else {
                Json(response).into_response()
            }
        }
        Err(BatchEnvelopeError::TooManyElements { max, actual }) => ApiError::BadRequest(format!(
            "batch contains {actual} elements, exceeding the maximum of {max}"
        ))
        .into_response(),
    }
}
