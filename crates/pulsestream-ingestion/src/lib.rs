//! Business logic for the write path and query surface: validate, dedup,
//! rate-limit, persist, enqueue, search, stats. Depends only on
//! `pulsestream_types`'s port traits, never on a concrete Postgres/Redis
//! adapter — production wiring happens one layer up, in `pulsestream-api`.

pub mod batch;
pub mod config;
pub mod coordinator;
pub mod deduplicator;
pub mod query;
pub mod validator;

pub use batch::{process_batch, BatchEnvelopeError, BatchResult, ElementOutcome};
pub use config::IngestionConfig;
pub use coordinator::{IngestOutcome, IngestionCoordinator};
pub use deduplicator::Deduplicator;
pub use query::QueryService;
pub use validator::Validator;
