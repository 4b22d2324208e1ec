use serde::{Deserialize, Serialize};

/// Service name reported by the health payload.
pub const SERVICE_NAME: &str = "nexus-vision-api";

/// Successful extraction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionResponse {
    pub success: bool,
    /// Model output with surrounding whitespace removed.
    pub extracted_text: String,
    pub is_signal: bool,
}

impl ExtractionResponse {
    pub fn new(extracted_text: String, is_signal: bool) -> Self {
        Self {
            success: true,
            extracted_text,
            is_signal,
        }
    }
}

/// Any failed request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            service: SERVICE_NAME.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
