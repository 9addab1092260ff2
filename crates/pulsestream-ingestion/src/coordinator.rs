//! Ingestion coordinator: orchestrates validate → rate-limit → dedup →
//! persist → enqueue for a single event. The heart of the write path.

use tracing::{instrument, warn};
use uuid::Uuid;

use pulsestream_types::error::Result;
use pulsestream_types::event::EventSubmission;
use pulsestream_types::ports::rate_limit::RateLimiter;
use pulsestream_types::ports::store::{Store, Transaction, TransactionManager};
use pulsestream_types::ports::worker::WorkerQueue;
use pulsestream_types::{PulseError, Tenant};

use crate::deduplicator::Deduplicator;
use crate::validator::Validator;

/// Result of a single successful ingest, whether freshly inserted or an
/// idempotent replay of a prior submission.
#[derive(Debug, Clone)]
pub struct IngestOutcome {
    pub event_id: Uuid,
    pub ingested_at: chrono::DateTime<chrono::Utc>,
    pub duplicate: bool,
}

pub struct IngestionCoordinator<'a, S, TM, R, W>
where
    S: Store,
    TM: TransactionManager,
    R: RateLimiter,
    W: WorkerQueue,
{
    validator: Validator,
    store: &'a S,
    tx_manager: &'a TM,
    rate_limiter: &'a R,
    worker_queue: &'a W,
}

impl<'a, S, TM, R, W> IngestionCoordinator<'a, S, TM, R, W>
where
    S: Store,
    TM: TransactionManager,
    R: RateLimiter,
    W: WorkerQueue,
{
    pub fn new(
        validator: Validator,
        store: &'a S,
        tx_manager: &'a TM,
        rate_limiter: &'a R,
        worker_queue: &'a W,
    ) -> Self {
        Self {
            validator,
            store,
            tx_manager,
            rate_limiter,
            worker_queue,
        }
    }

    /// Ingests one event for `tenant`, running validate, rate-limit, dedup,
    /// persist, and enqueue in sequence; see each inline comment for the
    /// step it implements.
    #[instrument(skip(self, submission), fields(tenant_id = %tenant.id))]
    pub async fn ingest(&self, tenant: &Tenant, submission: EventSubmission) -> Result<IngestOutcome> {
        // Step 1: validate.
        let validated = self.validator.validate(submission)?;

        // Step 2: rate-limit against the tenant's own configured ceiling.
        let decision = self
            .rate_limiter
            .check_and_increment(tenant.id, tenant.max_events_per_minute)
            .await?;
        if !decision.allowed {
            return Err(PulseError::RateLimited {
                retry_after_seconds: decision.reset_after_seconds,
            });
        }

        // Step 3: dedup check outside any transaction. A hit here is
        // reported as an idempotent success; the already-consumed rate
        // limit increment from step 2 stands — a duplicate submission still
        // counts as an attempt.
        if let Some(external_id) = &validated.external_id {
            let dedup = Deduplicator::new(self.store);
            if let Some(existing) = dedup.find_prior(tenant.id, external_id).await? {
                return Ok(IngestOutcome {
                    event_id: existing.id,
                    ingested_at: existing.received_at,
                    duplicate: true,
                });
            }
        }

        // Step 4: open a transaction covering the insert (and, on
        // conflict, the recovery read).
        let mut tx = self.tx_manager.begin().await?;
        let external_id_for_recovery = validated.external_id.clone();
        let insert_result = tx.insert_event(tenant.id, validated).await;

        let outcome = match insert_result {
            Ok(event) => {
                self.tx_manager.commit(tx).await?;
                IngestOutcome {
                    event_id: event.id,
                    ingested_at: event.received_at,
                    duplicate: false,
                }
            }
            Err(PulseError::Conflict(_)) => {
                // Step 4c: late-arriving duplicate. Another racer won the
                // insert between our dedup check and our insert attempt. A
                // unique-violation leaves the transaction aborted (no
                // further statements may run on it), so roll back first and
                // reload the winning row through the store's own
                // out-of-transaction read rather than the poisoned handle.
                self.tx_manager.rollback(tx).await?;
                let external_id = external_id_for_recovery
                    .as_deref()
                    .expect("conflict only possible when external_id is present");
                let existing = self
                    .store
                    .event_by_external_id(tenant.id, external_id)
                    .await?
                    .ok_or_else(|| {
                        PulseError::Internal(
                            "unique violation reported but no row found on reload".to_string(),
                        )
                    })?;
                IngestOutcome {
                    event_id: existing.id,
                    ingested_at: existing.received_at,
                    duplicate: true,
                }
            }
            Err(other) => {
                self.tx_manager.rollback(tx).await?;
                return Err(other);
            }
        };

        // Step 5: best-effort enqueue after commit. Never propagate a
        // failure here — the event is already durable and a sweeper
        // (out-of-core) will recover a stuck `queued` row.
        if !outcome.duplicate {
            if let Err(err) = self.worker_queue.enqueue(tenant.id, outcome.event_id).await {
                warn!(
                    tenant_id = %tenant.id,
                    event_id = %outcome.event_id,
                    error = %err,
                    "post-ingest enqueue failed; sweeper will recover"
                );
            }
        }

        // Step 6.
        Ok(outcome)
    }
}
