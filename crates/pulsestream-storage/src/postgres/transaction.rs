//! Postgres transaction manager and handle: begin/commit/rollback on the
//! manager, auto-rollback-on-drop on the handle via `sqlx`'s own drop
//! behavior.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres};
use std::sync::Arc;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use pulsestream_types::error::Result;
use pulsestream_types::event::{Event, ProcessingState, ValidatedEvent};
use pulsestream_types::ports::store::{Transaction, TransactionManager};
use pulsestream_types::{PulseError, TenantId};

use super::row;

pub struct PostgresTransactionManager {
    pool: Arc<PgPool>,
}

impl PostgresTransactionManager {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TransactionManager for PostgresTransactionManager {
    type Tx = PostgresTransaction;

    #[instrument(skip(self))]
    async fn begin(&self) -> Result<Self::Tx> {
        let inner = self.pool.begin().await?;
        let id = Uuid::new_v4().to_string();
        debug!(transaction_id = %id, "transaction started");
        Ok(PostgresTransaction {
            id,
            inner: Some(inner),
        })
    }

    #[instrument(skip(self, tx), fields(transaction_id = %tx.id))]
    async fn commit(&self, mut tx: Self::Tx) -> Result<()> {
        if let Some(inner) = tx.inner.take() {
            inner.commit().await?;
            debug!("transaction committed");
            Ok(())
        } else {
            Err(PulseError::Internal("transaction already consumed".into()))
        }
    }

    #[instrument(skip(self, tx), fields(transaction_id = %tx.id))]
    async fn rollback(&self, mut tx: Self::Tx) -> Result<()> {
        if let Some(inner) = tx.inner.take() {
            inner.rollback().await?;
            debug!("transaction rolled back");
        }
        Ok(())
    }
}

pub struct PostgresTransaction {
    id: String,
    inner: Option<sqlx::Transaction<'static, Postgres>>,
}

impl PostgresTransaction {
    fn conn(&mut self) -> Result<&mut sqlx::Transaction<'static, Postgres>> {
        self.inner
            .as_mut()
            .ok_or_else(|| PulseError::Internal("transaction already consumed".into()))
    }
}

#[async_trait]
impl Transaction for PostgresTransaction {
    #[instrument(skip(self, event), fields(transaction_id = %self.id))]
    async fn insert_event(&mut self, tenant_id: TenantId, event: ValidatedEvent) -> Result<Event> {
        let id = Uuid::new_v4();
        let received_at = chrono::Utc::now();
        let conn = self.conn()?;

        let result = row::insert_event(conn, id, tenant_id, &event, received_at, ProcessingState::Queued).await;

        match result {
            Ok(inserted) => Ok(inserted),
            Err(PulseError::Conflict(msg)) => {
                warn!(tenant = %tenant_id, "unique violation on insert, caller should reload existing row");
                Err(PulseError::Conflict(msg))
            }
            Err(other) => Err(other),
        }
    }
}
