//! Wire types for the HTTP surface.

pub mod extraction;

pub use extraction::{ErrorResponse, ExtractionResponse, HealthResponse};
