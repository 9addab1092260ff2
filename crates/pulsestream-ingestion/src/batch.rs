//! Batch coordinator: partial-success processing of up to `max_batch_size`
//! events, each run through the ingestion coordinator independently.

use tracing::instrument;
use uuid::Uuid;

use pulsestream_types::event::EventSubmission;
use pulsestream_types::ports::rate_limit::RateLimiter;
use pulsestream_types::ports::store::{Store, TransactionManager};
use pulsestream_types::ports::worker::WorkerQueue;
use pulsestream_types::{PulseError, Tenant};

use crate::coordinator::IngestionCoordinator;

#[derive(Debug, Clone)]
pub enum ElementOutcome {
    Success { event_id: Uuid, duplicate: bool },
    Failure { kind: &'static str, message: String },
}

#[derive(Debug, Clone)]
pub struct BatchResult {
    pub results: Vec<ElementOutcome>,
    pub successful_count: usize,
    pub failed_count: usize,
}

/// Errors that short-circuit the whole batch before any element runs — the
/// envelope itself is malformed (e.g. too many elements, rejected at the
/// envelope rather than per-element).
#[derive(Debug)]
pub enum BatchEnvelopeError {
    TooManyElements { max: usize, actual: usize },
}

#[instrument(skip(coordinator, events), fields(tenant_id = %tenant.id, batch_size = events.len()))]
pub async fn process_batch<S, TM, R, W>(
    coordinator: &IngestionCoordinator<'_, S, TM, R, W>,
    tenant: &Tenant,
    max_batch_size: usize,
    events: Vec<EventSubmission>,
) -> Result<BatchResult, BatchEnvelopeError>
where
    S: Store,
    TM: TransactionManager,
    R: RateLimiter,
    W: WorkerQueue,
{
    if events.len() > max_batch_size {
        return Err(BatchEnvelopeError::TooManyElements {
            max: max_batch_size,
            actual: events.len(),
        });
    }

    let mut results = Vec::with_capacity(events.len());
    let mut successful_count = 0;
    let mut failed_count = 0;

    for submission in events {
        match coordinator.ingest(tenant, submission).await {
            Ok(outcome) => {
                successful_count += 1;
                results.push(ElementOutcome::Success {
                    event_id: outcome.event_id,
                    duplicate: outcome.duplicate,
                });
            }
            Err(err) => {
                failed_count += 1;
                results.push(ElementOutcome::Failure {
                    kind: err.kind(),
                    message: err.to_string(),
                });
            }
        }
    }

    Ok(BatchResult {
        results,
        successful_count,
        failed_count,
    })
}

impl BatchResult {
    /// Overall HTTP status: 200 once at least one element succeeded, 400
    /// only when every element failed validation.
    pub fn all_failed(&self) -> bool {
        self.successful_count == 0 && self.failed_count > 0
    }
}
