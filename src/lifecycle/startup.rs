//! Startup orchestration.
//!
//! # Responsibilities
//! - Assemble the span exporter chain and log sink for one service
//! - Install the metrics recorder when enabled
//! - Build the service layers, bind the listener and serve until shutdown
//! - Flush buffered spans before returning

use std::io;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;

use crate::config::{AppConfig, EdgeConfig, ObservabilityConfig, TracerConfig, WorkConfig};
use crate::edge::EdgeServer;
use crate::lifecycle::{signals, Shutdown};
use crate::observability::export::{
    CollectorExporter, CollectorOptions, FanoutExporter, LogExporter,
};
use crate::observability::logging::TracingSink;
use crate::observability::metrics::{self, MetricsExporter};
use crate::observability::Telemetry;
use crate::work::WorkServer;

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("invalid collector endpoint '{endpoint}': {source}")]
    Collector {
        endpoint: String,
        source: url::ParseError,
    },

    #[error("invalid metrics address '{0}'")]
    MetricsAddress(String),

    #[error("failed to install metrics exporter: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),

    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("failed to bind {addr}: {source}")]
    Bind { addr: String, source: io::Error },

    #[error("server error: {0}")]
    Serve(#[source] io::Error),
}

/// Per-process telemetry plus the handle needed to drain it at exit.
struct Pipeline {
    telemetry: Telemetry,
    collector: Option<Arc<CollectorExporter>>,
    flush_timeout: Duration,
}

impl Pipeline {
    fn build(
        service: &str,
        tracer: &TracerConfig,
        observability: &ObservabilityConfig,
    ) -> Result<Self, StartupError> {
        let mut exporters = FanoutExporter::new().with(Arc::new(LogExporter));

        if observability.metrics_enabled {
            let addr = observability
                .metrics_address
                .parse()
                .map_err(|_| StartupError::MetricsAddress(observability.metrics_address.clone()))?;
            metrics::init_metrics(addr)?;
            exporters = exporters.with(Arc::new(MetricsExporter));
        }

        let collector = match &tracer.collector_endpoint {
            Some(endpoint) => {
                let url = endpoint.parse().map_err(|source| StartupError::Collector {
                    endpoint: endpoint.clone(),
                    source,
                })?;
                let collector = Arc::new(CollectorExporter::spawn(
                    url,
                    tracer.name.clone(),
                    CollectorOptions::from(tracer),
                )?);
                tracing::info!(endpoint = %endpoint, tracer = %tracer.name, "Span collector enabled");
                exporters = exporters.with(collector.clone());
                Some(collector)
            }
            None => None,
        };

        tracing::debug!(service, exporters = exporters.len(), "Telemetry pipeline built");

        Ok(Self {
            telemetry: Telemetry::new(service, Arc::new(exporters), Arc::new(TracingSink)),
            collector,
            flush_timeout: Duration::from_millis(tracer.export_timeout_ms),
        })
    }

    async fn flush(&self) {
        if let Some(collector) = &self.collector {
            match tokio::time::timeout(self.flush_timeout, collector.flush()).await {
                Ok(()) => tracing::info!(dropped = collector.dropped(), "Span collector flushed"),
                Err(_) => tracing::warn!(
                    timeout_ms = self.flush_timeout.as_millis() as u64,
                    "Span collector flush timed out, abandoning queued spans"
                ),
            }
        }
    }
}

async fn bind(app: &AppConfig) -> Result<TcpListener, StartupError> {
    let addr = app.bind_address();
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|source| StartupError::Bind {
            addr: addr.clone(),
            source,
        })?;
    if let Ok(local) = listener.local_addr() {
        tracing::info!(service = %app.name, address = %local, "Listening for connections");
    }
    Ok(listener)
}

fn shutdown_on_signal() -> Shutdown {
    let shutdown = Shutdown::new();
    signals::spawn_listener(shutdown.clone());
    shutdown
}

/// Run the edge service until SIGINT/SIGTERM.
pub async fn run_edge(config: EdgeConfig) -> Result<(), StartupError> {
    tracing::info!(
        service = %config.app.name,
        downstream = %config.downstream.base_url(),
        request_timeout_ms = ?config.timeouts.request_ms,
        "Starting edge service"
    );

    let pipeline = Pipeline::build(&config.app.name, &config.tracer, &config.observability)?;
    let server = EdgeServer::new(config.clone(), pipeline.telemetry.clone())?;
    let listener = bind(&config.app).await?;

    let shutdown = shutdown_on_signal();
    server
        .run(listener, shutdown.subscribe())
        .await
        .map_err(StartupError::Serve)?;

    pipeline.flush().await;
    Ok(())
}

/// Run the work service until SIGINT/SIGTERM.
pub async fn run_work(config: WorkConfig) -> Result<(), StartupError> {
    tracing::info!(
        service = %config.app.name,
        validation_ms = config.delays.validation_ms,
        processing_ms = config.delays.processing_ms,
        storage_ms = config.delays.storage_ms,
        "Starting work service"
    );

    let pipeline = Pipeline::build(&config.app.name, &config.tracer, &config.observability)?;
    let server = WorkServer::new(config.clone(), pipeline.telemetry.clone());
    let listener = bind(&config.app).await?;

    let shutdown = shutdown_on_signal();
    server
        .run(listener, shutdown.subscribe())
        .await
        .map_err(StartupError::Serve)?;

    pipeline.flush().await;
    Ok(())
}
