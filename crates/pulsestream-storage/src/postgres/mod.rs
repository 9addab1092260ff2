//! Postgres adapters: the relational half of the store adapter.

mod row;
mod store;
mod transaction;

pub use store::PostgresStore;
pub use transaction::{PostgresTransaction, PostgresTransactionManager};

use sqlx::postgres::PgPoolOptions;
use std::time::Duration;

use pulsestream_types::error::Result;

/// Connects a bounded Postgres pool. Sizing and timeouts are
/// configuration-driven, not hardcoded.
pub async fn connect(database_url: &str, max_connections: u32) -> Result<sqlx::PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url)
        .await?;
    Ok(pool)
}
