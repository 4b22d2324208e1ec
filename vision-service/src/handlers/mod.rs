//! HTTP handlers for the vision service.
//!
//! Every path shares the same method router: GET is the health probe and
//! POST runs signal extraction. OPTIONS preflights are answered by the CORS
//! layer in `startup`.

pub mod extraction;
pub mod health;

pub use extraction::extract_signal;
pub use health::health_check;
