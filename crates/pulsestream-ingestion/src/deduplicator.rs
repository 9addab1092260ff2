//! Finds a prior event by (tenant, external id) before a transaction opens.
//! A thin wrapper over the store's indexed lookup — kept as its own
//! component so the ingestion coordinator's dedup step reads as a single
//! named call.

use pulsestream_types::error::Result;
use pulsestream_types::event::Event;
use pulsestream_types::ports::store::Store;
use pulsestream_types::TenantId;

pub struct Deduplicator<'a, S: Store> {
    store: &'a S,
}

impl<'a, S: Store> Deduplicator<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    pub async fn find_prior(&self, tenant_id: TenantId, external_id: &str) -> Result<Option<Event>> {
        self.store.event_by_external_id(tenant_id, external_id).await
    }
}
