//! Validates and normalizes an unchecked event submission.
//!
//! The error contract requires every failed field to be reported, not just
//! the first. This implementation reconciles per-field short-circuiting with
//! that: each *field* is checked top-to-bottom and stops at its own first
//! failure (so, e.g., an unparseable timestamp doesn't also get a spurious
//! out-of-range error), but failures across different fields all accumulate
//! into one report. See DESIGN.md for this resolution.

use chrono::{DateTime, NaiveDateTime, Utc};

use pulsestream_types::error::FieldError;
use pulsestream_types::event::{
    EventContext, EventKind, EventMetrics, EventSubmission, Severity, Source, ValidatedEvent,
};
use pulsestream_types::PulseError;

use crate::config::IngestionConfig;

const MAX_TITLE_LEN: usize = 512;
const MAX_MESSAGE_LEN: usize = 64 * 1024;
const MAX_SERVICE_LEN: usize = 255;
const MAX_ENDPOINT_LEN: usize = 1024;
const MAX_EXTERNAL_ID_LEN: usize = 128;

pub struct Validator {
    config: IngestionConfig,
}

impl Validator {
    pub fn new(config: IngestionConfig) -> Self {
        Self { config }
    }

    pub fn validate(&self, submission: EventSubmission) -> Result<ValidatedEvent, PulseError> {
        let mut errors = Vec::new();
        let now = Utc::now();

        let event_type = match &submission.event_type {
            None => {
                errors.push(FieldError::new("event_type", "event_type is required"));
                None
            }
            Some(raw) => match parse_event_kind(raw) {
                Some(kind) => Some(kind),
                None => {
                    errors.push(FieldError::new(
                        "event_type",
                        format!("'{raw}' is not a recognized event_type"),
                    ));
                    None
                }
            },
        };

        let title = match &submission.title {
            None => {
                errors.push(FieldError::new("title", "title is required"));
                None
            }
            Some(t) if t.is_empty() => {
                errors.push(FieldError::new("title", "title must not be empty"));
                None
            }
            Some(t) if t.chars().count() > MAX_TITLE_LEN => {
                errors.push(FieldError::new(
                    "title",
                    format!("title must be at most {MAX_TITLE_LEN} characters"),
                ));
                None
            }
            Some(t) => Some(t.clone()),
        };

        let service = match submission.source.as_ref().and_then(|s| s.service.as_ref()) {
            None => {
                errors.push(FieldError::new("source.service", "source.service is required"));
                None
            }
            Some(s) if s.is_empty() => {
                errors.push(FieldError::new("source.service", "source.service must not be empty"));
                None
            }
            Some(s) if s.chars().count() > MAX_SERVICE_LEN => {
                errors.push(FieldError::new(
                    "source.service",
                    format!("source.service must be at most {MAX_SERVICE_LEN} characters"),
                ));
                None
            }
            Some(s) => Some(s.clone()),
        };

        if let Some(endpoint) = submission.source.as_ref().and_then(|s| s.endpoint.as_ref()) {
            if endpoint.chars().count() > MAX_ENDPOINT_LEN {
                errors.push(FieldError::new(
                    "source.endpoint",
                    format!("source.endpoint must be at most {MAX_ENDPOINT_LEN} characters"),
                ));
            }
        }

        if let Some(message) = &submission.message {
            if message.len() > MAX_MESSAGE_LEN {
                errors.push(FieldError::new(
                    "message",
                    format!("message must be at most {MAX_MESSAGE_LEN} bytes"),
                ));
            }
        }

        if let Some(external_id) = &submission.event_id {
            if external_id.chars().count() > MAX_EXTERNAL_ID_LEN {
                errors.push(FieldError::new(
                    "event_id",
                    format!("event_id must be at most {MAX_EXTERNAL_ID_LEN} characters"),
                ));
            }
        }

        let severity = match &submission.severity {
            None => {
                errors.push(FieldError::new("severity", "severity is required"));
                None
            }
            Some(raw) => match parse_severity(raw) {
                Some(sev) => Some(sev),
                None => {
                    errors.push(FieldError::new(
                        "severity",
                        format!("'{raw}' is not a recognized severity"),
                    ));
                    None
                }
            },
        };

        let occurrence_timestamp = match &submission.timestamp {
            None => Some(now),
            Some(raw) => match parse_timestamp(raw) {
                Some(ts) => {
                    let max_future = now + chrono::Duration::seconds(self.config.clock_skew_seconds);
                    let min_past = now - chrono::Duration::days(self.config.retention_days);
                    if ts > max_future {
                        errors.push(FieldError::new(
                            "timestamp",
                            "timestamp is too far in the future",
                        ));
                        None
                    } else if ts < min_past {
                        errors.push(FieldError::new(
                            "timestamp",
                            "timestamp is older than the retention horizon",
                        ));
                        None
                    } else {
                        Some(ts)
                    }
                }
                None => {
                    errors.push(FieldError::new("timestamp", "timestamp is not a valid ISO-8601 instant"));
                    None
                }
            },
        };

        let payload_len = submission
            .payload
            .as_ref()
            .map(|p| serde_json::to_vec(p).map(|v| v.len()).unwrap_or(usize::MAX))
            .unwrap_or(0);
        if payload_len > self.config.max_payload_bytes {
            errors.push(FieldError::new(
                "payload",
                format!("payload exceeds {} bytes", self.config.max_payload_bytes),
            ));
        }

        let metrics = validate_metrics(submission.metrics.as_ref(), &mut errors);

        if !errors.is_empty() {
            return Err(PulseError::invalid_event(errors));
        }

        let source = submission.source.unwrap();
        Ok(ValidatedEvent {
            external_id: submission.event_id,
            event_type: event_type.unwrap(),
            severity: severity.unwrap(),
            title: title.unwrap(),
            message: submission.message,
            occurrence_timestamp: occurrence_timestamp.unwrap(),
            source: Source {
                service: service.unwrap(),
                endpoint: source.endpoint,
                method: source.method,
                version: source.version,
                environment: source.environment,
            },
            context: submission
                .context
                .map(|c| EventContext {
                    user_id: c.user_id,
                    session_id: c.session_id,
                    request_id: c.request_id,
                    ip_address: c.ip_address,
                    user_agent: c.user_agent,
                    tags: c.tags,
                })
                .unwrap_or_default(),
            metrics,
            payload: submission.payload,
        })
    }
}

fn validate_metrics(
    raw: Option<&pulsestream_types::event::RawMetrics>,
    errors: &mut Vec<FieldError>,
) -> EventMetrics {
    let Some(raw) = raw else {
        return EventMetrics::default();
    };

    if let Some(rt) = raw.response_time_ms {
        if !rt.is_finite() || rt < 0.0 {
            errors.push(FieldError::new(
                "metrics.response_time_ms",
                "response_time_ms must be a finite, non-negative number",
            ));
        }
    }

    let mut status_code = None;
    if let Some(sc) = raw.status_code {
        if !(100..=599).contains(&sc) {
            errors.push(FieldError::new(
                "metrics.status_code",
                "status_code must be between 100 and 599",
            ));
        } else {
            status_code = Some(sc as u16);
        }
    }

    if let Some(size) = raw.request_size_bytes {
        if size < 0 {
            errors.push(FieldError::new(
                "metrics.request_size_bytes",
                "request_size_bytes must be non-negative",
            ));
        }
    }
    if let Some(size) = raw.response_size_bytes {
        if size < 0 {
            errors.push(FieldError::new(
                "metrics.response_size_bytes",
                "response_size_bytes must be non-negative",
            ));
        }
    }

    EventMetrics {
        response_time_ms: raw.response_time_ms,
        status_code,
        request_size_bytes: raw.request_size_bytes.map(|v| v.max(0) as u64),
        response_size_bytes: raw.response_size_bytes.map(|v| v.max(0) as u64),
        cache_hit: raw.cache_hit,
    }
}

fn parse_event_kind(raw: &str) -> Option<EventKind> {
    match raw {
        "api_call" => Some(EventKind::ApiCall),
        "error" => Some(EventKind::Error),
        "user_action" => Some(EventKind::UserAction),
        "custom_event" => Some(EventKind::CustomEvent),
        "system" => Some(EventKind::System),
        _ => None,
    }
}

fn parse_severity(raw: &str) -> Option<Severity> {
    match raw {
        "debug" => Some(Severity::Debug),
        "info" => Some(Severity::Info),
        "warning" => Some(Severity::Warning),
        "error" => Some(Severity::Error),
        "critical" => Some(Severity::Critical),
        _ => None,
    }
}

/// Parses an ISO-8601 instant; a naive (offset-less) timestamp is
/// interpreted as UTC.
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f"))
        .ok()
        .map(|naive| DateTime::from_naive_utc_and_offset(naive, Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pulsestream_types::event::RawSource;

    fn base_submission() -> EventSubmission {
        EventSubmission {
            event_type: Some("api_call".to_string()),
            event_id: None,
            timestamp: None,
            title: Some("hello".to_string()),
            message: None,
            severity: Some("info".to_string()),
            source: Some(RawSource {
                service: Some("svc".to_string()),
                endpoint: None,
                method: None,
                version: None,
                environment: None,
            }),
            context: None,
            metrics: None,
            payload: None,
        }
    }

    #[test]
    fn minimal_valid_submission_passes() {
        let validator = Validator::new(IngestionConfig::default());
        let result = validator.validate(base_submission());
        assert!(result.is_ok());
    }

    #[test]
    fn missing_required_fields_collects_every_failure() {
        let validator = Validator::new(IngestionConfig::default());
        let submission = EventSubmission {
            event_type: None,
            title: None,
            severity: None,
            source: None,
            ..base_submission()
        };
        let err = validator.validate(submission).unwrap_err();
        match err {
            PulseError::InvalidEvent(fields) => {
                let paths: Vec<_> = fields.iter().map(|f| f.path.as_str()).collect();
                assert!(paths.contains(&"event_type"));
                assert!(paths.contains(&"title"));
                assert!(paths.contains(&"severity"));
                assert!(paths.contains(&"source.service"));
            }
            other => panic!("expected InvalidEvent, got {other:?}"),
        }
    }

    #[test]
    fn title_over_max_length_rejected() {
        let validator = Validator::new(IngestionConfig::default());
        let mut submission = base_submission();
        submission.title = Some("x".repeat(MAX_TITLE_LEN + 1));
        assert!(validator.validate(submission).is_err());
    }

    #[test]
    fn timestamp_six_minutes_future_rejected_four_minutes_accepted() {
        let validator = Validator::new(IngestionConfig::default());
        let now = Utc::now();

        let mut too_far = base_submission();
        too_far.timestamp = Some((now + chrono::Duration::minutes(6)).to_rfc3339());
        assert!(validator.validate(too_far).is_err());

        let mut ok = base_submission();
        ok.timestamp = Some((now + chrono::Duration::minutes(4)).to_rfc3339());
        assert!(validator.validate(ok).is_ok());
    }

    #[test]
    fn timestamp_within_retention_accepted_beyond_rejected() {
        let validator = Validator::new(IngestionConfig::default());
        let now = Utc::now();

        let mut within = base_submission();
        within.timestamp = Some((now - chrono::Duration::days(10)).to_rfc3339());
        assert!(validator.validate(within).is_ok());

        let mut beyond = base_submission();
        beyond.timestamp = Some((now - chrono::Duration::days(40)).to_rfc3339());
        assert!(validator.validate(beyond).is_err());
    }

    #[test]
    fn status_code_out_of_range_rejected() {
        let validator = Validator::new(IngestionConfig::default());
        let mut submission = base_submission();
        submission.metrics = Some(pulsestream_types::event::RawMetrics {
            status_code: Some(700),
            ..Default::default()
        });
        assert!(validator.validate(submission).is_err());
    }

    #[test]
    fn payload_exactly_at_limit_accepted_over_limit_rejected() {
        let mut config = IngestionConfig::default();
        config.max_payload_bytes = 32;
        let validator = Validator::new(config);

        // serde_json::Value::String("...") serializes as `"...."` — two
        // quote bytes plus the string content.
        let mut at_limit = base_submission();
        at_limit.payload = Some(serde_json::Value::String("x".repeat(30)));
        assert!(validator.validate(at_limit).is_ok());

        let mut over_limit = base_submission();
        over_limit.payload = Some(serde_json::Value::String("x".repeat(40)));
        assert!(validator.validate(over_limit).is_err());
    }
}
