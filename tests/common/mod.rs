//! Shared harness: boots real edge and work services on loopback ports.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::StatusCode;
use serde_json::Value;
use tokio::net::TcpListener;

use ping_chain::config::{DelayConfig, EdgeConfig, WorkConfig};
use ping_chain::observability::{InMemoryExporter, MemorySink, Telemetry};
use ping_chain::{EdgeServer, Shutdown, WorkServer};

/// Spans and log lines captured from one service.
pub struct Captured {
    pub spans: Arc<InMemoryExporter>,
    pub logs: Arc<MemorySink>,
}

impl Captured {
    fn new() -> Self {
        Self {
            spans: Arc::new(InMemoryExporter::new()),
            logs: Arc::new(MemorySink::new()),
        }
    }

    fn telemetry(&self, service: &str) -> Telemetry {
        Telemetry::new(service, self.spans.clone(), self.logs.clone())
    }
}

/// Knobs for one chain under test.
#[derive(Clone)]
pub struct ChainOptions {
    pub edge_validation_ms: u64,
    pub work_delays: DelayConfig,
    pub downstream_timeout_ms: Option<u64>,
    pub request_timeout_ms: Option<u64>,
}

impl ChainOptions {
    /// Millisecond delays everywhere, no deadlines.
    pub fn fast() -> Self {
        Self::uniform(5)
    }

    pub fn uniform(ms: u64) -> Self {
        Self {
            edge_validation_ms: ms,
            work_delays: DelayConfig {
                validation_ms: ms,
                processing_ms: ms,
                storage_ms: ms,
            },
            downstream_timeout_ms: None,
            request_timeout_ms: None,
        }
    }

    /// Production delays (250 / 250 / 500 / 500).
    pub fn production() -> Self {
        Self {
            edge_validation_ms: EdgeConfig::default().delays.validation_ms,
            work_delays: DelayConfig::default(),
            downstream_timeout_ms: None,
            request_timeout_ms: None,
        }
    }
}

pub struct Chain {
    pub edge_addr: SocketAddr,
    pub work_addr: SocketAddr,
    pub edge: Captured,
    pub work: Captured,
    shutdown: Shutdown,
    client: reqwest::Client,
}

/// Reply seen by the client.
pub struct Reply {
    pub status: StatusCode,
    pub trace_id: Option<String>,
    pub body: Value,
}

impl Chain {
    pub async fn start(options: ChainOptions) -> Self {
        let shutdown = Shutdown::new();

        let work = Captured::new();
        let mut work_config = WorkConfig::default();
        work_config.delays = options.work_delays.clone();
        let work_addr = serve_work(work_config, work.telemetry("work-service"), &shutdown).await;

        let edge = Captured::new();
        let edge_config = edge_config(work_addr.port(), &options);
        let edge_addr = serve_edge(edge_config, edge.telemetry("edge-service"), &shutdown).await;

        Self {
            edge_addr,
            work_addr,
            edge,
            work,
            shutdown,
            client: client(),
        }
    }

    pub async fn ping(&self, message: &str) -> Reply {
        self.ping_with(message, &[]).await
    }

    pub async fn ping_with(&self, message: &str, headers: &[(&str, &str)]) -> Reply {
        let mut request = self
            .client
            .get(format!("http://{}/ping", self.edge_addr))
            .query(&[("message", message)]);
        for (name, value) in headers {
            request = request.header(*name, *value);
        }
        into_reply(request.send().await.unwrap()).await
    }

    pub async fn get(&self, path: &str) -> Reply {
        let res = self
            .client
            .get(format!("http://{}{}", self.edge_addr, path))
            .send()
            .await
            .unwrap();
        into_reply(res).await
    }
}

impl Drop for Chain {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Edge service pointed at an arbitrary downstream port.
pub async fn start_edge_only(downstream_port: u16, options: ChainOptions) -> (SocketAddr, Captured, Shutdown) {
    let shutdown = Shutdown::new();
    let edge = Captured::new();
    let config = edge_config(downstream_port, &options);
    let addr = serve_edge(config, edge.telemetry("edge-service"), &shutdown).await;
    (addr, edge, shutdown)
}

/// A loopback port nothing listens on.
pub async fn unused_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap().port()
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}

pub async fn into_reply(res: reqwest::Response) -> Reply {
    let status = StatusCode::from_u16(res.status().as_u16()).unwrap();
    let trace_id = res
        .headers()
        .get("x-trace-id")
        .map(|v| v.to_str().unwrap().to_string());
    let body = res.json().await.unwrap();
    Reply {
        status,
        trace_id,
        body,
    }
}

fn edge_config(downstream_port: u16, options: &ChainOptions) -> EdgeConfig {
    let mut config = EdgeConfig::default();
    config.app.host = "127.0.0.1".into();
    config.app.port = 0;
    config.downstream.host = "127.0.0.1".into();
    config.downstream.port = downstream_port;
    config.downstream.timeout_ms = options.downstream_timeout_ms;
    config.delays.validation_ms = options.edge_validation_ms;
    config.timeouts.request_ms = options.request_timeout_ms;
    config
}

async fn serve_work(config: WorkConfig, telemetry: Telemetry, shutdown: &Shutdown) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = WorkServer::new(config, telemetry);
    let rx = shutdown.subscribe();
    tokio::spawn(async move { server.run(listener, rx).await });
    addr
}

async fn serve_edge(config: EdgeConfig, telemetry: Telemetry, shutdown: &Shutdown) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = EdgeServer::new(config, telemetry).unwrap();
    let rx = shutdown.subscribe();
    tokio::spawn(async move { server.run(listener, rx).await });
    addr
}
