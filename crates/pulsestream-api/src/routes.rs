//! Route table: a single function building the full `Router`; `main.rs`
//! layers middleware and attaches state on top.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{health, ingestion, query};
use crate::state::AppState;

pub fn build_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/api/v1/ingestion/events", post(ingestion::ingest_event))
        .route("/api/v1/ingestion/events/batch", post(ingestion::ingest_batch))
        .route("/api/v1/ingestion/events/search", get(query::search_events))
        .route("/api/v1/ingestion/events/:id", get(query::get_event))
        .route("/api/v1/ingestion/stats", get(query::get_stats))
}
