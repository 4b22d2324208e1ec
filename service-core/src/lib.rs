//! service-core: Shared infrastructure for micros services.
pub mod config;
pub mod error;
pub mod middleware;
pub mod observability;
