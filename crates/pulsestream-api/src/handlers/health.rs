//! Liveness endpoint. Deliberately exempt from authentication (see
//! `middleware::auth::auth_middleware`) — a load balancer has no tenant
//! credential.

use axum::Json;

use crate::dto::HealthResponse;

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "healthy" })
}
