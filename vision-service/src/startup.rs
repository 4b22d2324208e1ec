//! Application startup and lifecycle management.
//!
//! Builds the router shared by every path, binds the listener and runs the
//! server until a shutdown signal arrives.

use crate::config::VisionConfig;
use crate::handlers::{extract_signal, health_check};
use crate::services::providers::gemini::{GeminiConfig, GeminiVisionProvider};
use crate::services::providers::VisionProvider;
use axum::{
    body::Body,
    http::{header, Method},
    middleware::from_fn,
    routing::{get, MethodRouter},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::tracing::{request_id_middleware, request_span};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub provider: Arc<dyn VisionProvider>,
    pub max_body_bytes: usize,
}

/// Permissive CORS: any origin, the three supported methods and `Content-Type`.
/// Also answers every OPTIONS request with an empty 200.
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
}

fn signal_routes() -> MethodRouter<AppState> {
    get(health_check).post(extract_signal)
}

/// Build the router. The same handlers answer `/` and any other path.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", signal_routes())
        .route("/*path", signal_routes())
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http().make_span_with(request_span::<Body>))
        .layer(from_fn(request_id_middleware))
        .with_state(state)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    state: AppState,
}

impl Application {
    /// Build the application with the Gemini provider described by `config`.
    pub async fn build(config: VisionConfig) -> Result<Self, AppError> {
        let gemini_config = GeminiConfig {
            api_key: config.gemini.api_key.clone(),
            model: config.gemini.model.clone(),
            api_base: config.gemini.api_base.clone(),
            timeout: Duration::from_secs(config.gemini.timeout_secs),
        };
        let provider = GeminiVisionProvider::new(gemini_config)
            .map_err(|e| AppError::ConfigError(anyhow::anyhow!(e)))?;

        if provider.is_configured() {
            tracing::info!(
                model = %config.gemini.model,
                timeout_secs = config.gemini.timeout_secs,
                "Initialized Gemini vision provider"
            );
        } else {
            tracing::warn!("GEMINI_API_KEY not configured - extraction requests will fail");
        }

        Self::build_with_provider(config, Arc::new(provider)).await
    }

    /// Build the application around an arbitrary provider.
    pub async fn build_with_provider(
        config: VisionConfig,
        provider: Arc<dyn VisionProvider>,
    ) -> Result<Self, AppError> {
        let state = AppState {
            provider,
            max_body_bytes: config.max_body_bytes,
        };

        // Port 0 = random port for testing
        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind HTTP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Vision service: HTTP on port {}", port);

        Ok(Self {
            port,
            listener,
            state,
        })
    }

    /// Get the port the server is listening on.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Probe the provider once. Failures are logged, not fatal.
    pub async fn check_provider(&self) {
        if !self.state.provider.is_configured() {
            return;
        }
        match self.state.provider.health_check().await {
            Ok(()) => tracing::info!(
                model = %self.state.provider.model(),
                "Vision provider reachable"
            ),
            Err(e) => tracing::warn!(
                model = %self.state.provider.model(),
                error = %e,
                "Vision provider health check failed"
            ),
        }
    }

    /// Run the application until stopped.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        let router = build_router(self.state);

        axum::serve(self.listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| {
                tracing::error!("HTTP server error: {}", e);
                std::io::Error::other(format!("HTTP server error: {}", e))
            })
    }
}
