//! Edge service wiring.

use std::io;
use std::sync::Arc;

use axum::{routing::get, Router};
use tokio::net::TcpListener;
use tokio::sync::broadcast;

use crate::config::EdgeConfig;
use crate::edge::api::{self, EdgeApi};
use crate::edge::service::EdgeService;
use crate::http;
use crate::observability::Telemetry;
use crate::resilience::{timeouts, SyntheticDelay};
use crate::rpc::{Downstream, RpcClient};

/// HTTP server for the client-facing `/ping` endpoint.
pub struct EdgeServer {
    router: Router,
    config: EdgeConfig,
}

impl EdgeServer {
    /// Build the RPC client, business and boundary layers bottom-up.
    pub fn new(config: EdgeConfig, telemetry: Telemetry) -> Result<Self, reqwest::Error> {
        let client = RpcClient::new(&config.downstream, telemetry.clone())?;
        tracing::info!(
            downstream = %config.downstream.name,
            endpoint = %client.endpoint(),
            "Downstream client configured"
        );
        Ok(Self::with_downstream(config, telemetry, Arc::new(client)))
    }

    /// Same as `new` with a caller-supplied downstream.
    pub fn with_downstream(
        config: EdgeConfig,
        telemetry: Telemetry,
        downstream: Arc<dyn Downstream>,
    ) -> Self {
        let service = Arc::new(EdgeService::new(
            telemetry.clone(),
            SyntheticDelay::from_millis("validation", config.delays.validation_ms),
            downstream,
        ));
        let api = Arc::new(EdgeApi::new(
            telemetry,
            service,
            timeouts::from_millis(config.timeouts.request_ms),
        ));

        let router = Self::build_router(api);
        Self { router, config }
    }

    fn build_router(api: Arc<EdgeApi>) -> Router {
        let router = Router::new()
            .route("/ping", get(api::ping))
            .route("/health", get(http::health))
            .with_state(api);
        http::with_common_layers(router)
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve until the shutdown broadcast fires.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), io::Error> {
        tracing::info!(service = %self.config.app.name, "Edge service ready");
        http::serve(listener, self.router, shutdown).await
    }
}
