//! Tenant and User types: the isolation boundary every request is scoped by.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::PulseError;

/// Opaque tenant identifier. Newtype so handlers can't accidentally compare
/// a tenant id against an event id or a user id at the type level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TenantId(Uuid);

impl TenantId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for TenantId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TenantId {
    type Err = PulseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| PulseError::Unauthorized(format!("invalid tenant id: {e}")))
    }
}

/// A tenant: the identity and policy holder for every request.
///
/// Invariants: slug unique across active tenants; credential unique
/// globally; `max_events_per_minute > 0`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tenant {
    pub id: TenantId,
    pub name: String,
    pub slug: String,
    pub contact_email: String,
    /// High-entropy API credential. Never logged or echoed back; compared in
    /// constant time by the tenant registry.
    #[serde(skip_serializing)]
    pub api_credential: String,
    pub active: bool,
    pub max_events_per_minute: u32,
    pub monthly_event_quota: Option<u64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Tenant {
    /// Check that this tenant's policy is internally consistent. Called at
    /// the boundary where the administrative registration flow (out of
    /// core) hands a tenant to the store adapter.
    pub fn validate_invariants(&self) -> Result<(), PulseError> {
        if self.max_events_per_minute == 0 {
            return Err(PulseError::Internal(
                "tenant rate limit must be > 0".to_string(),
            ));
        }
        if self.slug.trim().is_empty() {
            return Err(PulseError::Internal("tenant slug must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Role a User is bound to within their tenant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Viewer,
    Admin,
    Owner,
}

/// A human identity bound to exactly one tenant (session/bearer-token auth,
/// out of core). Kept in the data model so the store adapter's
/// tenant-scoping discipline extends to it too.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub tenant_id: TenantId,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_verifier: String,
    pub role: UserRole,
    pub active: bool,
    pub failed_login_count: u32,
    pub locked_until: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tenant_id_roundtrips_through_string() {
        let id = TenantId::new();
        let parsed: TenantId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn tenant_id_rejects_garbage() {
        assert!("not-a-uuid".parse::<TenantId>().is_err());
    }

    #[test]
    fn zero_rate_limit_is_rejected() {
        let tenant = Tenant {
            id: TenantId::new(),
            name: "Acme".into(),
            slug: "acme".into(),
            contact_email: "ops@acme.test".into(),
            api_credential: "secret".into(),
            active: true,
            max_events_per_minute: 0,
            monthly_event_quota: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert!(tenant.validate_invariants().is_err());
    }
}
