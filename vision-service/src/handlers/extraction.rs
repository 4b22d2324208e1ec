//! Signal extraction handler.

use crate::dtos::ExtractionResponse;
use crate::error::ExtractionError;
use crate::services::providers::ImagePart;
use crate::services::{decode_image, is_signal, resolve_payload, SIGNAL_EXTRACTION_PROMPT};
use crate::startup::AppState;
use axum::{
    body::{to_bytes, Bytes},
    extract::{Request, State},
    http::{header, HeaderMap},
    Json,
};
use service_core::middleware::tracing::RequestId;
use std::time::Instant;

/// POST: extract a trading signal from a base64 image.
///
/// The API key check runs before the body is read, so an unconfigured
/// service never touches the payload or the provider.
pub async fn extract_signal(
    State(state): State<AppState>,
    request: Request,
) -> Result<Json<ExtractionResponse>, ExtractionError> {
    let request_id = request_id_of(&request);

    match run_extraction(&state, request, &request_id).await {
        Ok(response) => Ok(Json(response)),
        Err(err) => {
            if err.status_code().is_client_error() {
                tracing::info!(%request_id, error = %err, "Rejected extraction request");
            } else if matches!(err, ExtractionError::NotConfigured) {
                tracing::warn!(%request_id, "Extraction requested but GEMINI_API_KEY is not set");
            } else {
                tracing::error!(%request_id, error = %err, "Extraction failed");
            }
            Err(err)
        }
    }
}

/// The id set by the request-id middleware, `-` when the handler runs
/// without it.
fn request_id_of(request: &Request) -> String {
    request
        .extensions()
        .get::<RequestId>()
        .map(|id| id.0.clone())
        .unwrap_or_else(|| "-".to_string())
}

async fn run_extraction(
    state: &AppState,
    request: Request,
    request_id: &str,
) -> Result<ExtractionResponse, ExtractionError> {
    if !state.provider.is_configured() {
        return Err(ExtractionError::NotConfigured);
    }

    if declared_length(request.headers()) == Some(0) {
        return Err(ExtractionError::EmptyBody);
    }

    let body = read_body(request, state.max_body_bytes).await?;
    if body.is_empty() {
        return Err(ExtractionError::EmptyBody);
    }

    let payload = resolve_payload(&body)?;
    let image = ImagePart::jpeg(decode_image(&payload)?);

    let started = Instant::now();
    let response = state
        .provider
        .generate(SIGNAL_EXTRACTION_PROMPT, &image)
        .await?;

    let extracted_text = response.text.trim().to_string();
    let is_signal = is_signal(&extracted_text);

    tracing::info!(
        request_id,
        model = %state.provider.model(),
        image_bytes = image.data.len(),
        input_tokens = response.input_tokens,
        output_tokens = response.output_tokens,
        latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        is_signal,
        "Extracted text from image"
    );

    Ok(ExtractionResponse::new(extracted_text, is_signal))
}

fn declared_length(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(header::CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse().ok())
}

async fn read_body(request: Request, limit: usize) -> Result<Bytes, ExtractionError> {
    to_bytes(request.into_body(), limit).await.map_err(|e| {
        ExtractionError::Processing(format!(
            "failed to read request body (limit {} bytes): {}",
            limit, e
        ))
    })
}
