//! Query service: filtered search and aggregate statistics, always scoped
//! to the authenticating tenant.

use chrono::{DateTime, Utc};
use tracing::instrument;
use uuid::Uuid;

use pulsestream_types::error::Result;
use pulsestream_types::event::{Event, EventFilter, EventStats};
use pulsestream_types::ports::store::Store;
use pulsestream_types::{PulseError, TenantId};

pub struct QueryService<'a, S: Store> {
    store: &'a S,
}

impl<'a, S: Store> QueryService<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    #[instrument(skip(self, filter))]
    pub async fn search(&self, tenant_id: TenantId, filter: EventFilter) -> Result<(Vec<Event>, u64)> {
        self.store.search_events(tenant_id, &filter).await
    }

    pub async fn get(&self, tenant_id: TenantId, event_id: Uuid) -> Result<Event> {
        self.store
            .event_by_id(tenant_id, event_id)
            .await?
            .ok_or_else(|| PulseError::NotFound(format!("event {event_id} not found")))
    }

    pub async fn stats(
        &self,
        tenant_id: TenantId,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> Result<EventStats> {
        self.store.aggregate_stats(tenant_id, window_start, window_end).await
    }
}
