//! Postgres and Redis adapters implementing the port traits from
//! `pulsestream_types::ports`. Nothing outside this crate talks to `sqlx` or
//! `redis` directly.

pub mod config;
pub mod postgres;
pub mod redis;

pub mod fakes;

pub use config::StorageConfig;
