#![allow(dead_code)]

use std::sync::Arc;
use vision_service::config::{GeminiSettings, VisionConfig, DEFAULT_API_BASE, DEFAULT_MODEL};
use vision_service::services::providers::mock::MockVisionProvider;
use vision_service::services::providers::VisionProvider;
use vision_service::startup::Application;

pub const SIGNAL_REPLY: &str = "XAUUSD BUY @ 2350\nSL: 2340\nTP1: 2360";

/// Smallest JPEG-looking payload: SOI marker plus a JFIF APP0 header start.
pub const JPEG_BYTES: &[u8] = &[0xff, 0xd8, 0xff, 0xe0, 0x00, 0x10, b'J', b'F', b'I', b'F'];

pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub client: reqwest::Client,
}

/// Config with a random port and no API key; the provider decides
/// whether the service counts as configured.
pub fn test_config() -> VisionConfig {
    VisionConfig {
        common: service_core::config::Config { port: 0 },
        gemini: GeminiSettings {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
            timeout_secs: 5,
        },
        max_body_bytes: 1024 * 1024,
    }
}

impl TestApp {
    pub async fn spawn(provider: Arc<MockVisionProvider>) -> Self {
        let provider: Arc<dyn VisionProvider> = provider;
        let app = Application::build_with_provider(test_config(), provider)
            .await
            .expect("Failed to build test application");
        Self::start(app).await
    }

    pub async fn start(app: Application) -> Self {
        let port = app.port();
        let address = format!("http://127.0.0.1:{}", port);

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        // Wait for HTTP server to be ready by polling the health endpoint
        let client = reqwest::Client::new();
        for _ in 0..50 {
            if client.get(&address).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        }

        TestApp {
            address,
            port,
            client,
        }
    }

    pub async fn post_json(&self, body: serde_json::Value) -> reqwest::Response {
        self.client
            .post(format!("{}/api/vision", self.address))
            .json(&body)
            .send()
            .await
            .expect("Failed to send request")
    }

    pub async fn post_raw(&self, body: Vec<u8>) -> reqwest::Response {
        self.client
            .post(format!("{}/api/vision", self.address))
            .header("content-type", "application/octet-stream")
            .body(body)
            .send()
            .await
            .expect("Failed to send request")
    }
}
