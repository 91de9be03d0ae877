//! HTTP server setup and request dispatch.
//!
//! # Responsibilities
//! - Create the Axum router with the catch-all relay route
//! - Wire up middleware (tracing, request ID)
//! - Answer CORS preflight requests locally
//! - Capture the inbound body once, then dispatch to a forwarder
//! - Stamp CORS headers onto every outgoing response

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{Method, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::config::RelayConfig;
use crate::forward::{self, RelayError};
use crate::http::cors;
use crate::http::request::{RequestIdLayer, X_REQUEST_ID};

/// Application state injected into handlers.
///
/// Shared read-only after startup: the resolved configuration and one
/// outbound client. The client never follows redirects — redirect responses
/// belong to the original caller.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<RelayConfig>,
    pub client: reqwest::Client,
}

/// HTTP server for the relay.
pub struct HttpServer {
    router: Router,
    config: Arc<RelayConfig>,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: RelayConfig) -> Result<Self, reqwest::Error> {
        let config = Arc::new(config);
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()?;

        let state = AppState {
            config: config.clone(),
            client,
        };
        let router = Self::build_router(state);

        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/{*path}", any(relay_handler))
            .route("/", any(relay_handler))
            .with_state(state)
            .layer(RequestIdLayer)
            .layer(TraceLayer::new_for_http())
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            upstream = %self.config.upstream.base_url,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &RelayConfig {
        &self.config
    }
}

/// Main relay handler: preflight short-circuit, body capture, dispatch.
async fn relay_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let request_id = request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    // Browsers probe with OPTIONS before the real request; answer locally,
    // the upstream never sees preflights.
    if method == Method::OPTIONS {
        tracing::debug!(request_id = %request_id, path = %path, "answering preflight locally");
        return preflight_response();
    }

    tracing::info!(
        request_id = %request_id,
        method = %method,
        path = %path,
        "relaying request"
    );

    let (parts, body) = request.into_parts();

    // The inbound body is a single-read stream. Capture it once, before any
    // routing decision, and hand the owned buffer to whichever branch wins.
    let body = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(error) => {
            tracing::error!(request_id = %request_id, error = %error, "failed to read request body");
            let mut response = RelayError::BodyRead(error).into_response();
            cors::apply(response.headers_mut());
            return response;
        }
    };

    tracing::debug!(request_id = %request_id, body_bytes = body.len(), "captured request body");

    let base_url = state.config.upstream.base_url.as_str();
    let result = if forward::is_multipart_upload(&parts.method, &parts.headers) {
        tracing::debug!(request_id = %request_id, "dispatching to upload forwarder");
        forward::upload::forward(&state.client, base_url, &parts, body).await
    } else {
        forward::standard::forward(&state.client, base_url, &parts, body).await
    };

    let mut response = match result {
        Ok(response) => response,
        Err(error) => {
            tracing::error!(request_id = %request_id, error = %error, "relay failed");
            error.into_response()
        }
    };

    // Applied last so copied upstream headers can never clobber it.
    cors::apply(response.headers_mut());

    tracing::info!(
        request_id = %request_id,
        status = %response.status(),
        "request complete"
    );
    response
}

/// Local answer for an OPTIONS preflight: 200, CORS headers, empty body.
fn preflight_response() -> Response {
    let mut response = StatusCode::OK.into_response();
    cors::apply(response.headers_mut());
    response
}

/// Wait for shutdown signal (Ctrl+C).
async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    tracing::info!("Shutdown signal received");
}
