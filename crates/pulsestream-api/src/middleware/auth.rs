//! Tenant authentication middleware: extracts the API key header, rejects
//! unauthenticated requests, and attaches the resolved `Tenant` to the
//! request for downstream handlers. Compares the credential in constant
//! time to avoid leaking match length through timing.

use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use subtle::ConstantTimeEq;
use tracing::{debug, warn};

use pulsestream_types::ports::store::Store;
use pulsestream_types::Tenant;

use crate::errors::ApiError;
use crate::state::AppState;

const API_KEY_HEADER: &str = "x-api-key";

pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    if request.uri().path() == "/health" {
        return next.run(request).await;
    }

    let credential = match request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
    {
        Some(c) if !c.is_empty() => c.to_string(),
        _ => {
            warn!("missing or unreadable X-API-Key header");
            return ApiError::Unauthorized("missing X-API-Key header".to_string()).into_response();
        }
    };

    match resolve_tenant(&state, &credential).await {
        Ok(Some(tenant)) => {
            debug!(tenant_id = %tenant.id, "request authenticated");
            request.extensions_mut().insert(tenant);
            next.run(request).await
        }
        Ok(None) => {
            warn!("credential did not match an active tenant");
            ApiError::Unauthorized("invalid or inactive credential".to_string()).into_response()
        }
        Err(err) => {
            warn!(error = %err, "tenant lookup failed during authentication");
            ApiError::from(err).into_response()
        }
    }
}

/// Resolves a credential to a tenant, consulting the short-TTL process-local
/// cache before the store. Every candidate tenant's credential is compared
/// in constant time.
async fn resolve_tenant(
    state: &AppState,
    credential: &str,
) -> pulsestream_types::error::Result<Option<Tenant>> {
    if let Some(cached) = state.tenant_cache.get(credential) {
        if credential_matches(&cached.api_credential, credential) {
            return Ok(Some(cached));
        }
    }

    let tenant = state.store.tenant_by_credential(credential).await?;
    if let Some(tenant) = &tenant {
        if credential_matches(&tenant.api_credential, credential) {
            state.tenant_cache.put(credential.to_string(), tenant.clone());
            return Ok(Some(tenant.clone()));
        }
        return Ok(None);
    }
    Ok(None)
}

fn credential_matches(stored: &str, provided: &str) -> bool {
    stored.as_bytes().ct_eq(provided.as_bytes()).into()
}
