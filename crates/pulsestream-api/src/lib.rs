//! HTTP surface: routing, auth middleware, and error mapping. Everything
//! here composes `pulsestream-ingestion` and `pulsestream-storage` behind
//! `axum` handlers; no handler ever talks to `sqlx`/`redis` directly.

pub mod config;
pub mod dto;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod state;

pub use config::AppConfig;
pub use state::AppState;
