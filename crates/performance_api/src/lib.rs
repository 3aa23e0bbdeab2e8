//! HTTP API over the hyperparameter sweep results and the pretrained model.
//!
//! Routes:
//! - `GET /api/model-performance` with optional exact-match filters
//! - `GET /api/parameter-ranges`
//! - `GET /api/best-config`
//! - `GET /api/health`
//! - `POST /api/predict`

use std::net::SocketAddr;
use std::time::Instant;

use axum::Router;
use axum::extract::Request;
use axum::http::{HeaderValue, header};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, post};
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::{Instrument as _, info, info_span, warn};
use uuid::Uuid;

mod error;
mod handlers;
mod state;

pub use error::ApiError;
pub use handlers::*;
pub use state::{AppState, ComparisonCache};

/// Server errors
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind {address}: {source}")]
    Bind {
        address: SocketAddr,
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for server operations
pub type Result<T> = std::result::Result<T, ServerError>;

/// Server configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Server address
    pub address: SocketAddr,
    /// Attach `Access-Control-Allow-Origin: *` to every response
    pub cors_enabled: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: SocketAddr::from(([127, 0, 0, 1], 5000)),
            cors_enabled: true,
        }
    }
}

impl ServerConfig {
    /// Create config with custom address
    #[must_use]
    pub const fn with_address(mut self, address: SocketAddr) -> Self {
        self.address = address;
        self
    }

    /// Disable CORS
    #[must_use]
    pub const fn without_cors(mut self) -> Self {
        self.cors_enabled = false;
        self
    }
}

/// Builds the application router.
pub fn router(state: AppState, config: &ServerConfig) -> Router {
    let router = Router::new()
        .route(
            "/api/model-performance",
            get(get_model_performance).fallback(method_not_allowed),
        )
        .route(
            "/api/parameter-ranges",
            get(get_parameter_ranges).fallback(method_not_allowed),
        )
        .route(
            "/api/best-config",
            get(get_best_config).fallback(method_not_allowed),
        )
        .route("/api/health", get(health_check).fallback(method_not_allowed))
        .route("/api/predict", post(predict).fallback(method_not_allowed))
        .fallback(not_found)
        .with_state(state)
        .layer(middleware::from_fn(trace_request));

    if config.cors_enabled {
        router.layer(middleware::from_fn(allow_any_origin))
    } else {
        router
    }
}

/// Runs each request inside a span carrying a fresh request id and logs the
/// response status.
async fn trace_request(request: Request, next: Next) -> Response {
    let span = info_span!(
        "http_request",
        request_id = %Uuid::new_v4(),
        method = %request.method(),
        uri = %request.uri()
    );

    async move {
        let start = Instant::now();
        let response = next.run(request).await;
        info!(
            status = response.status().as_u16(),
            elapsed = ?start.elapsed(),
            "Handled request"
        );
        response
    }
    .instrument(span)
    .await
}

async fn allow_any_origin(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    response.headers_mut().insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    response
}

/// Binds `config.address` and serves until Ctrl+C.
///
/// # Errors
///
/// Returns an error if the address cannot be bound or the server fails.
pub async fn serve(state: AppState, config: ServerConfig) -> Result<()> {
    let listener = TcpListener::bind(config.address)
        .await
        .map_err(|source| ServerError::Bind {
            address: config.address,
            source,
        })?;

    info!(address = %listener.local_addr()?, "Serving model performance API");

    axum::serve(listener, router(state, &config))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl+C: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
