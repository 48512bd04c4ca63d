//! HTTP plumbing shared by both services.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → serve() (axum, graceful shutdown on broadcast)
//!     → with_common_layers() (x-request-id, tower-http trace)
//!     → service router (edge::server / work::server)
//!     → handler (inbound boundary of the chain)
//! ```

use std::io;

use axum::{response::IntoResponse, Json, Router};
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

/// Request ID header set on every request and echoed on the response.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Wrap a service router with the middleware every listener carries.
pub fn with_common_layers(router: Router) -> Router {
    router
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}

/// Liveness probe.
pub async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

/// Serve `router` until the shutdown broadcast fires.
pub async fn serve(
    listener: TcpListener,
    router: Router,
    mut shutdown: broadcast::Receiver<()>,
) -> Result<(), io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!(address = %addr, "HTTP server starting");

    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            let _ = shutdown.recv().await;
            tracing::info!("Shutdown signal received");
        })
        .await?;

    tracing::info!(address = %addr, "HTTP server stopped");
    Ok(())
}
