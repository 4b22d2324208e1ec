//! Gemini provider tests against a local stub of the Gemini REST API.

mod common;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use common::{test_config, TestApp, JPEG_BYTES, SIGNAL_REPLY};
use secrecy::Secret;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use vision_service::services::providers::gemini::{GeminiConfig, GeminiVisionProvider};
use vision_service::services::providers::{ImagePart, ProviderError, VisionProvider};
use vision_service::startup::Application;

const TEST_KEY: &str = "test-gemini-key";
const TEST_MODEL: &str = "gemini-2.0-flash-exp";

#[derive(Clone)]
struct StubState {
    status: StatusCode,
    reply: Value,
    seen: RequestLog,
}

async fn generate_content(
    State(state): State<StubState>,
    Path(rest): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    if rest != format!("{TEST_MODEL}:generateContent") {
        return (StatusCode::NOT_FOUND, Json(json!({"error": rest})));
    }
    state.seen.lock().unwrap().push((headers, body));
    (state.status, Json(state.reply.clone()))
}

async fn get_model(State(state): State<StubState>, Path(rest): Path<String>) -> impl IntoResponse {
    if rest != TEST_MODEL {
        return (StatusCode::NOT_FOUND, Json(json!({"error": rest})));
    }
    (state.status, Json(json!({"name": format!("models/{TEST_MODEL}")})))
}

type RequestLog = Arc<Mutex<Vec<(HeaderMap, Value)>>>;

/// Start the stub and return its base URL plus the request log.
async fn spawn_stub(status: StatusCode, reply: Value) -> (String, RequestLog) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let state = StubState {
        status,
        reply,
        seen: seen.clone(),
    };

    let router = Router::new()
        .route(
            "/v1beta/models/*rest",
            get(get_model).post(generate_content),
        )
        .with_state(state);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, router).await.ok();
    });

    (format!("http://127.0.0.1:{port}/v1beta"), seen)
}

fn provider(api_base: &str) -> GeminiVisionProvider {
    GeminiVisionProvider::new(GeminiConfig {
        api_key: Some(Secret::new(TEST_KEY.to_string())),
        model: TEST_MODEL.to_string(),
        api_base: api_base.to_string(),
        timeout: Duration::from_secs(5),
    })
    .expect("Failed to create provider")
}

fn text_reply(text: &str) -> Value {
    json!({
        "candidates": [{
            "content": {"role": "model", "parts": [{"text": text}]},
            "finishReason": "STOP"
        }],
        "usageMetadata": {"promptTokenCount": 258, "candidatesTokenCount": 20, "totalTokenCount": 278}
    })
}

#[tokio::test]
async fn generate_sends_key_prompt_and_image() {
    let (base, seen) = spawn_stub(StatusCode::OK, text_reply(SIGNAL_REPLY)).await;
    let provider = provider(&base);

    let response = provider
        .generate("extract it", &ImagePart::jpeg(JPEG_BYTES.to_vec()))
        .await
        .expect("generate failed");

    assert_eq!(response.text, SIGNAL_REPLY);
    assert_eq!(response.input_tokens, 258);
    assert_eq!(response.output_tokens, 20);

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    let (headers, body) = &seen[0];
    assert_eq!(headers["x-goog-api-key"], TEST_KEY);

    let parts = body["contents"][0]["parts"].as_array().unwrap();
    assert_eq!(parts[0]["text"], "extract it");
    assert_eq!(parts[1]["inlineData"]["mimeType"], "image/jpeg");
    assert_eq!(parts[1]["inlineData"]["data"], STANDARD.encode(JPEG_BYTES));
}

#[tokio::test]
async fn rate_limit_is_reported() {
    let (base, _) = spawn_stub(
        StatusCode::TOO_MANY_REQUESTS,
        json!({"error": {"code": 429, "status": "RESOURCE_EXHAUSTED"}}),
    )
    .await;

    let result = provider(&base)
        .generate("extract it", &ImagePart::jpeg(JPEG_BYTES.to_vec()))
        .await;

    assert!(matches!(result, Err(ProviderError::RateLimited)));
}

#[tokio::test]
async fn api_errors_carry_status_and_body() {
    let (base, _) = spawn_stub(
        StatusCode::BAD_REQUEST,
        json!({"error": {"code": 400, "message": "Unable to process input image"}}),
    )
    .await;

    let result = provider(&base)
        .generate("extract it", &ImagePart::jpeg(b"not an image".to_vec()))
        .await;

    match result {
        Err(ProviderError::ApiError(message)) => {
            assert!(message.contains("400"));
            assert!(message.contains("Unable to process input image"));
        }
        other => panic!("expected ApiError, got {other:?}"),
    }
}

#[tokio::test]
async fn unconfigured_provider_never_calls_out() {
    let (base, seen) = spawn_stub(StatusCode::OK, text_reply(SIGNAL_REPLY)).await;
    let provider = GeminiVisionProvider::new(GeminiConfig {
        api_key: None,
        model: TEST_MODEL.to_string(),
        api_base: base,
        timeout: Duration::from_secs(5),
    })
    .unwrap();

    let result = provider
        .generate("extract it", &ImagePart::jpeg(JPEG_BYTES.to_vec()))
        .await;

    assert!(matches!(result, Err(ProviderError::NotConfigured(_))));
    assert!(seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn unreachable_api_is_a_network_error_without_key() {
    // Nothing listens on the discard port.
    let result = provider("http://127.0.0.1:9/v1beta")
        .generate("extract it", &ImagePart::jpeg(JPEG_BYTES.to_vec()))
        .await;

    match result {
        Err(ProviderError::NetworkError(message)) => assert!(!message.contains(TEST_KEY)),
        other => panic!("expected NetworkError, got {other:?}"),
    }
}

#[tokio::test]
async fn health_check_hits_model_endpoint() {
    let (base, _) = spawn_stub(StatusCode::OK, text_reply("")).await;
    assert!(provider(&base).health_check().await.is_ok());

    let (base, _) = spawn_stub(StatusCode::FORBIDDEN, json!({})).await;
    assert!(matches!(
        provider(&base).health_check().await,
        Err(ProviderError::ApiError(_))
    ));
}

#[tokio::test]
async fn service_round_trip_through_gemini_stub() {
    let (base, seen) = spawn_stub(StatusCode::OK, text_reply("  NO_SIGNAL_FOUND\n")).await;

    let mut config = test_config();
    config.gemini.api_key = Some(Secret::new(TEST_KEY.to_string()));
    config.gemini.api_base = base;
    let app = TestApp::start(
        Application::build(config)
            .await
            .expect("Failed to build application"),
    )
    .await;

    let response = app
        .post_json(json!({"image": STANDARD.encode(JPEG_BYTES)}))
        .await;

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(
        body,
        json!({"success": true, "extracted_text": "NO_SIGNAL_FOUND", "is_signal": false})
    );

    let seen = seen.lock().unwrap();
    let prompt = seen[0].1["contents"][0]["parts"][0]["text"].as_str().unwrap();
    assert!(prompt.contains("Analyze this trading signal image"));
}
