//! Extraction failures and their HTTP mapping.
//!
//! Every failure answers with `{"success": false, "error": ...}`. Input
//! problems the client can fix are 400; everything else is 500.

use crate::dtos::ErrorResponse;
use crate::services::providers::ProviderError;
use crate::services::PayloadError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("GEMINI_API_KEY not configured")]
    NotConfigured,

    #[error("No image data provided")]
    EmptyBody,

    #[error("Missing 'image' field in request")]
    MissingImage,

    #[error("Error processing image: {0}")]
    Processing(String),

    #[error("Error processing image: {0}")]
    Provider(#[from] ProviderError),
}

impl ExtractionError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ExtractionError::EmptyBody | ExtractionError::MissingImage => StatusCode::BAD_REQUEST,
            ExtractionError::NotConfigured
            | ExtractionError::Processing(_)
            | ExtractionError::Provider(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<PayloadError> for ExtractionError {
    fn from(err: PayloadError) -> Self {
        match err {
            PayloadError::MissingImage => ExtractionError::MissingImage,
            other => ExtractionError::Processing(other.to_string()),
        }
    }
}

impl IntoResponse for ExtractionError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(ErrorResponse::new(self.to_string()))).into_response()
    }
}
