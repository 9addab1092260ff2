//! HTTP-facing error type. Wraps `PulseError` plus the concerns only the
//! HTTP layer cares about (field-error lists, retry-after seconds). This is
//! the only `IntoResponse` in the crate — status-code mapping lives here
//! and nowhere else.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use pulsestream_types::error::FieldError;
use pulsestream_types::PulseError;

pub enum ApiError {
    Unauthorized(String),
    InvalidEvent(Vec<FieldError>),
    RateLimited { retry_after_seconds: u64 },
    NotFound(String),
    StoreUnavailable(String),
    Conflict(String),
    Internal(String),
    /// The request envelope itself is malformed (e.g. batch size over the
    /// configured max) — distinct from a per-field validation failure.
    BadRequest(String),
}

impl From<PulseError> for ApiError {
    fn from(err: PulseError) -> Self {
        match err {
            PulseError::Unauthorized(m) => ApiError::Unauthorized(m),
            PulseError::InvalidEvent(fields) => ApiError::InvalidEvent(fields),
            PulseError::RateLimited { retry_after_seconds } => {
                ApiError::RateLimited { retry_after_seconds }
            }
            PulseError::NotFound(m) => ApiError::NotFound(m),
            PulseError::StoreUnavailable(m) => ApiError::StoreUnavailable(m),
            // Cache unavailability is handled entirely inside the rate
            // limiter (fail-open/fail-closed); if it ever surfaces here it's
            // because fail-closed was configured, so treat it like any
            // other transient dependency failure.
            PulseError::CacheUnavailable(m) => ApiError::StoreUnavailable(m),
            PulseError::Conflict(m) => ApiError::Conflict(m),
            PulseError::Internal(m) => ApiError::Internal(m),
        }
    }
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::InvalidEvent(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Conflict(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::Unauthorized(_) => "unauthorized",
            ApiError::InvalidEvent(_) => "invalid_event",
            ApiError::BadRequest(_) => "invalid_event",
            ApiError::RateLimited { .. } => "rate_limited",
            ApiError::NotFound(_) => "not_found",
            ApiError::StoreUnavailable(_) => "store_unavailable",
            ApiError::Conflict(_) => "conflict",
            ApiError::Internal(_) => "internal",
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::Unauthorized(m) => m.clone(),
            ApiError::InvalidEvent(_) => "one or more fields failed validation".to_string(),
            ApiError::BadRequest(m) => m.clone(),
            ApiError::RateLimited { .. } => "rate limit exceeded".to_string(),
            ApiError::NotFound(m) => m.clone(),
            ApiError::StoreUnavailable(_) => "store temporarily unavailable".to_string(),
            ApiError::Conflict(_) => "internal error".to_string(),
            ApiError::Internal(_) => "internal error".to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let kind = self.kind();
        let message = self.message();

        match status {
            StatusCode::INTERNAL_SERVER_ERROR | StatusCode::SERVICE_UNAVAILABLE => {
                tracing::error!(kind, "request failed");
            }
            StatusCode::BAD_REQUEST | StatusCode::NOT_FOUND | StatusCode::UNAUTHORIZED => {
                tracing::warn!(kind, "request rejected");
            }
            _ => tracing::info!(kind, "request not fulfilled"),
        }

        let mut error_body = json!({
            "kind": kind,
            "message": message,
        });

        if let ApiError::InvalidEvent(fields) = &self {
            error_body["details"] = json!({ "fields": fields });
        }
        if let ApiError::RateLimited { retry_after_seconds } = &self {
            error_body["details"] = json!({ "retry_after_seconds": retry_after_seconds });
        }

        let body = Json(json!({ "error": error_body }));

        let mut response = (status, body).into_response();
        if let ApiError::RateLimited { retry_after_seconds } = &self {
            if let Ok(value) = axum::http::HeaderValue::from_str(&retry_after_seconds.to_string()) {
                response.headers_mut().insert("Retry-After", value);
            }
        }
        response
    }
}
