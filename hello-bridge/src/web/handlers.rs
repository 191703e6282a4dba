//! Edge endpoint handlers.
//!
//! The forwarding handler only:
//! 1. Reads the whole request body
//! 2. Publishes it to the queue
//! 3. Echoes the body back

use axum::{
    body::to_bytes,
    extract::{Request, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{any, get},
    Json, Router,
};
use serde::Serialize;
use tokio::sync::mpsc;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::error::BridgeError;
use crate::queue::{Publisher, QUEUE_NAME};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub publisher: Publisher,
    fatal: mpsc::Sender<BridgeError>,
}

impl AppState {
    /// Create the state plus the receiver that reports fatal publish errors.
    ///
    /// [`serve`](super::serve) stops accepting connections as soon as the
    /// receiver yields an error.
    pub fn new(publisher: Publisher) -> (Self, mpsc::Receiver<BridgeError>) {
        let (fatal, fatal_rx) = mpsc::channel(1);
        (Self { publisher, fatal }, fatal_rx)
    }
}

/// Build the edge router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api", any(forward))
        .route("/graphql", any(forward))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// =============================================================================
// Health Check
// =============================================================================

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

// =============================================================================
// Forwarding
// =============================================================================

/// Publish the request body to the queue and echo it back.
///
/// The body is read without a size limit. A body that cannot be read is
/// answered with 400 and nothing is published. A failed publish is answered
/// with 500 and reported as fatal; the server drains before exiting, so the
/// 500 still reaches the caller.
pub async fn forward(State(state): State<AppState>, request: Request) -> Response {
    let path = request.uri().path().to_owned();
    let method = request.method().clone();

    let body = match to_bytes(request.into_body(), usize::MAX).await {
        Ok(body) => body,
        Err(e) => {
            warn!(path = %path, method = %method, error = %e, "edge_body_read_failed");
            return StatusCode::BAD_REQUEST.into_response();
        }
    };

    if let Err(e) = state.publisher.publish(body.to_vec()).await {
        error!(path = %path, error = %e, exit_code = e.exit_code(), "edge_publish_failed");
        // Only the first failure needs to reach the process; it is exiting anyway.
        let _ = state.fatal.try_send(e);
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }

    info!(
        path = %path,
        method = %method,
        queue = QUEUE_NAME,
        body_length = body.len(),
        body = %String::from_utf8_lossy(&body),
        "edge_message_forwarded"
    );

    body.into_response()
}
