pub mod payload;
pub mod prompt;
pub mod providers;

pub use payload::{decode_image, resolve_payload, PayloadError};
pub use prompt::{is_signal, NO_SIGNAL_MARKER, SIGNAL_EXTRACTION_PROMPT};
