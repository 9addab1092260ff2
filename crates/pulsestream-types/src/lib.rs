//! Shared data model, error taxonomy, and port traits for PulseStream.
//!
//! Every other crate in the workspace depends on this one and nothing else
//! in the reverse direction: business logic and adapters both compile
//! against the traits in [`ports`], never against each other directly.

pub mod error;
pub mod event;
pub mod ports;
pub mod tenant;

pub use error::{FieldError, PulseError, Result};
pub use event::{
    BatchSubmission, Event, EventContext, EventFilter, EventKind, EventMetrics, EventStats,
    EventSubmission, ProcessingState, Severity, Source, ValidatedEvent,
};
pub use tenant::{Tenant, TenantId, User, UserRole};
