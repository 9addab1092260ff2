//! Closed error taxonomy shared by every PulseStream component.
//!
//! One flat `thiserror` enum with string-carrying variants and `#[from]`
//! conversions for the handful of upstream error types components actually
//! see. The HTTP status mapping lives one layer up, in
//! `pulsestream-api::errors::ApiError` — this type only classifies *what*
//! went wrong, never *how it's surfaced*.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, PulseError>;

/// The closed error taxonomy shared by every component.
#[derive(Error, Debug)]
pub enum PulseError {
    /// Missing/invalid/inactive credential.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Validation failed; carries every failed field, not just the first.
    #[error("invalid event: {0} field(s) failed validation")]
    InvalidEvent(Vec<FieldError>),

    /// Per-tenant minute window exceeded.
    #[error("rate limited, retry after {retry_after_seconds}s")]
    RateLimited { retry_after_seconds: u64 },

    /// Referenced entity absent.
    #[error("not found: {0}")]
    NotFound(String),

    /// Relational store transient failure.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    /// Cache transient failure. Internal only — the rate limiter decides
    /// whether this fails open or propagates.
    #[error("cache unavailable: {0}")]
    CacheUnavailable(String),

    /// Unexpected uniqueness breach that isn't the (tenant, external_id)
    /// idempotency case.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Unclassified failure.
    #[error("internal error: {0}")]
    Internal(String),
}

/// One failed field from request validation.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct FieldError {
    pub path: String,
    pub message: String,
}

impl FieldError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl PulseError {
    pub fn invalid_event(fields: Vec<FieldError>) -> Self {
        Self::InvalidEvent(fields)
    }

    /// Stable machine-readable kind string, used in HTTP error bodies and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            PulseError::Unauthorized(_) => "unauthorized",
            PulseError::InvalidEvent(_) => "invalid_event",
            PulseError::RateLimited { .. } => "rate_limited",
            PulseError::NotFound(_) => "not_found",
            PulseError::StoreUnavailable(_) => "store_unavailable",
            PulseError::CacheUnavailable(_) => "cache_unavailable",
            PulseError::Conflict(_) => "conflict",
            PulseError::Internal(_) => "internal",
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            PulseError::RateLimited { .. } | PulseError::StoreUnavailable(_)
        )
    }
}

impl From<sqlx::Error> for PulseError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                PulseError::Conflict(db_err.message().to_string())
            }
            sqlx::Error::PoolTimedOut | sqlx::Error::Io(_) => {
                PulseError::StoreUnavailable(err.to_string())
            }
            _ => PulseError::Internal(format!("store error: {err}")),
        }
    }
}

impl From<redis::RedisError> for PulseError {
    fn from(err: redis::RedisError) -> Self {
        PulseError::CacheUnavailable(err.to_string())
    }
}

impl From<serde_json::Error> for PulseError {
    fn from(err: serde_json::Error) -> Self {
        PulseError::Internal(format!("serialization error: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_strings_match_taxonomy() {
        assert_eq!(PulseError::Unauthorized("x".into()).kind(), "unauthorized");
        assert_eq!(
            PulseError::RateLimited {
                retry_after_seconds: 5
            }
            .kind(),
            "rate_limited"
        );
        assert_eq!(PulseError::NotFound("x".into()).kind(), "not_found");
    }

    #[test]
    fn retryable_classification() {
        assert!(PulseError::StoreUnavailable("x".into()).is_retryable());
        assert!(!PulseError::Unauthorized("x".into()).is_retryable());
        assert!(!PulseError::InvalidEvent(vec![]).is_retryable());
    }
}
