//! Vision inference provider abstractions and implementations.
//!
//! The extraction handler talks to a `VisionProvider`, so the hosted Gemini
//! backend can be swapped for the scripted mock in tests.

pub mod gemini;
pub mod mock;

use async_trait::async_trait;
use thiserror::Error;

/// Error type for provider operations.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Rate limited")]
    RateLimited,

    #[error("Content filtered")]
    ContentFiltered,

    #[error("Model returned no text")]
    EmptyResponse,

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Request timed out after {0}s")]
    Timeout(u64),
}

/// An image handed to the model as inline data.
#[derive(Debug, Clone)]
pub struct ImagePart {
    /// MIME type announced to the model.
    pub mime_type: String,

    /// Raw image bytes.
    pub data: Vec<u8>,
}

impl ImagePart {
    /// Tag bytes as JPEG, whatever their real encoding is.
    pub fn jpeg(data: Vec<u8>) -> Self {
        Self {
            mime_type: "image/jpeg".to_string(),
            data,
        }
    }
}

/// Result of a provider call.
#[derive(Debug, Clone)]
pub struct ProviderResponse {
    /// Generated text, untrimmed.
    pub text: String,

    /// Input tokens consumed.
    pub input_tokens: i32,

    /// Output tokens generated.
    pub output_tokens: i32,
}

/// Trait for multimodal (prompt + image) text generation providers.
#[async_trait]
pub trait VisionProvider: Send + Sync {
    /// Whether credentials are present. Unconfigured providers must not be called.
    fn is_configured(&self) -> bool;

    /// Model identifier, for logging.
    fn model(&self) -> &str;

    /// Send the prompt followed by the image and return the generated text.
    async fn generate(
        &self,
        prompt: &str,
        image: &ImagePart,
    ) -> Result<ProviderResponse, ProviderError>;

    /// Health check.
    async fn health_check(&self) -> Result<(), ProviderError>;
}
