//! Mock provider implementation for testing.

use super::{ImagePart, ProviderError, ProviderResponse, VisionProvider};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Mock vision provider returning a scripted reply.
pub struct MockVisionProvider {
    configured: bool,
    reply: Result<String, String>,
    calls: AtomicUsize,
    last_image: Mutex<Option<ImagePart>>,
}

impl MockVisionProvider {
    /// A configured provider that always answers with `text`.
    pub fn replying(text: impl Into<String>) -> Self {
        Self {
            configured: true,
            reply: Ok(text.into()),
            calls: AtomicUsize::new(0),
            last_image: Mutex::new(None),
        }
    }

    /// A configured provider whose calls fail with an API error.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            reply: Err(message.into()),
            ..Self::replying("")
        }
    }

    /// A provider without credentials.
    pub fn unconfigured() -> Self {
        Self {
            configured: false,
            ..Self::replying("")
        }
    }

    /// Number of `generate` calls seen so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// The image passed to the most recent `generate` call.
    pub fn last_image(&self) -> Option<ImagePart> {
        self.last_image
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

/// Rough token count, four bytes per token.
fn approx_tokens(text: &str) -> i32 {
    i32::try_from(text.len() / 4).unwrap_or(i32::MAX)
}

#[async_trait]
impl VisionProvider for MockVisionProvider {
    fn is_configured(&self) -> bool {
        self.configured
    }

    fn model(&self) -> &str {
        "mock-vision"
    }

    async fn generate(
        &self,
        prompt: &str,
        image: &ImagePart,
    ) -> Result<ProviderResponse, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut last) = self.last_image.lock() {
            *last = Some(image.clone());
        }

        if !self.configured {
            return Err(ProviderError::NotConfigured(
                "Mock vision provider not configured".to_string(),
            ));
        }

        match &self.reply {
            Ok(text) => Ok(ProviderResponse {
                text: text.clone(),
                input_tokens: approx_tokens(prompt),
                output_tokens: approx_tokens(text),
            }),
            Err(message) => Err(ProviderError::ApiError(message.clone())),
        }
    }

    async fn health_check(&self) -> Result<(), ProviderError> {
        if self.configured {
            Ok(())
        } else {
            Err(ProviderError::NotConfigured(
                "Mock vision provider not configured".to_string(),
            ))
        }
    }
}
