//! Work service wiring.

use std::io;
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;

use crate::config::WorkConfig;
use crate::http;
use crate::observability::Telemetry;
use crate::resilience::SyntheticDelay;
use crate::rpc::wire::PING_PATH;
use crate::work::api::{self, WorkApi};
use crate::work::service::WorkService;
use crate::work::store::Store;

/// HTTP server exposing the `Ping` procedure.
pub struct WorkServer {
    router: Router,
    config: WorkConfig,
}

impl WorkServer {
    /// Build the store, business and boundary layers bottom-up.
    pub fn new(config: WorkConfig, telemetry: Telemetry) -> Self {
        let delays = &config.delays;
        let store = Arc::new(Store::new(
            telemetry.clone(),
            SyntheticDelay::from_millis("storage", delays.storage_ms),
        ));
        let service = Arc::new(WorkService::new(
            telemetry.clone(),
            SyntheticDelay::from_millis("processing", delays.processing_ms),
            store,
        ));
        let api = Arc::new(WorkApi::new(
            telemetry,
            SyntheticDelay::from_millis("validation", delays.validation_ms),
            service,
        ));

        let router = Self::build_router(api);
        Self { router, config }
    }

    fn build_router(api: Arc<WorkApi>) -> Router {
        let router = Router::new()
            .route(PING_PATH, post(api::ping))
            .route("/health", get(http::health))
            .with_state(api);
        http::with_common_layers(router)
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve until the shutdown broadcast fires.
    pub async fn run(self, listener: TcpListener, shutdown: broadcast::Receiver<()>) -> Result<(), io::Error> {
        tracing::info!(service = %self.config.app.name, "Work service ready");
        http::serve(listener, self.router, shutdown).await
    }
}
