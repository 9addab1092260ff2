//! Port traits: the seams between business logic and the adapters that talk
//! to Postgres, Redis, and the external worker queue. Production code
//! depends only on these traits, never on a concrete adapter, so tests can
//! swap in in-memory fakes.

pub mod rate_limit;
pub mod store;
pub mod worker;

pub use rate_limit::{RateLimitDecision, RateLimiter};
pub use store::{Store, Transaction, TransactionManager};
pub use worker::WorkerQueue;
