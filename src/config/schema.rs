//! Configuration schema definitions.
//!
//! This module defines the configuration structure of both services.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration of the edge (client-facing) service.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EdgeConfig {
    /// Service identity and bind address.
    pub app: AppConfig,

    /// Where the work service lives.
    pub downstream: DownstreamConfig,

    /// Span export settings.
    pub tracer: TracerConfig,

    /// Logging and metrics settings.
    pub observability: ObservabilityConfig,

    /// Synthetic latencies.
    pub delays: DelayConfig,

    /// Request deadlines.
    pub timeouts: TimeoutConfig,
}

impl Default for EdgeConfig {
    fn default() -> Self {
        Self {
            app: AppConfig {
                name: "edge-service".to_string(),
                host: "0.0.0.0".to_string(),
                port: 8080,
            },
            downstream: DownstreamConfig::default(),
            tracer: TracerConfig {
                name: "edge-service".to_string(),
                ..TracerConfig::default()
            },
            observability: ObservabilityConfig::default(),
            delays: DelayConfig::default(),
            timeouts: TimeoutConfig::default(),
        }
    }
}

/// Root configuration of the downstream work service.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WorkConfig {
    /// Service identity and bind address.
    pub app: AppConfig,

    /// Span export settings.
    pub tracer: TracerConfig,

    /// Logging and metrics settings.
    pub observability: ObservabilityConfig,

    /// Synthetic latencies.
    pub delays: DelayConfig,
}

impl Default for WorkConfig {
    fn default() -> Self {
        Self {
            app: AppConfig {
                name: "work-service".to_string(),
                host: "0.0.0.0".to_string(),
                port: 50051,
            },
            tracer: TracerConfig {
                name: "work-service".to_string(),
                ..TracerConfig::default()
            },
            observability: ObservabilityConfig {
                metrics_address: "0.0.0.0:9091".to_string(),
                ..ObservabilityConfig::default()
            },
            delays: DelayConfig::default(),
        }
    }
}

/// Service identity and listener.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    /// Service name, stamped on every span and log entry.
    pub name: String,

    /// Bind host (0.0.0.0 for listening on all interfaces).
    pub host: String,

    /// Bind port; 0 picks an ephemeral port.
    pub port: u16,
}

impl AppConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: "ping-service".to_string(),
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

/// Downstream work service address.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DownstreamConfig {
    /// Name used in span attributes and logs.
    pub name: String,

    pub host: String,

    pub port: u16,

    /// Per-call timeout in milliseconds. Unbounded when absent.
    pub timeout_ms: Option<u64>,
}

impl DownstreamConfig {
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

impl Default for DownstreamConfig {
    fn default() -> Self {
        Self {
            name: "work-service".to_string(),
            host: "127.0.0.1".to_string(),
            port: 50051,
            timeout_ms: None,
        }
    }
}

/// Span export configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TracerConfig {
    /// Tracer name reported to the collector.
    pub name: String,

    /// Collector URL receiving JSON span batches. Spans are only logged when absent.
    pub collector_endpoint: Option<String>,

    /// Spans per collector POST.
    pub batch_size: usize,

    /// Maximum time a span waits in the batch, in milliseconds.
    pub flush_interval_ms: u64,

    /// Upper bound on one collector POST, and on the final flush at shutdown.
    pub export_timeout_ms: u64,

    /// Spans buffered for the collector; further spans are dropped.
    pub queue_capacity: usize,
}

impl Default for TracerConfig {
    fn default() -> Self {
        Self {
            name: "ping-chain".to_string(),
            collector_endpoint: None,
            batch_size: 64,
            flush_interval_ms: 2000,
            export_timeout_ms: 5000,
            queue_capacity: 2048,
        }
    }
}

/// Output format of the log subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "debug".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Synthetic latencies, in milliseconds.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DelayConfig {
    /// Validation cost at the business entry of each service.
    pub validation_ms: u64,

    /// Processing cost of the remote business layer.
    pub processing_ms: u64,

    /// Cost of the storage query.
    pub storage_ms: u64,
}

impl Default for DelayConfig {
    fn default() -> Self {
        Self {
            validation_ms: 250,
            processing_ms: 500,
            storage_ms: 500,
        }
    }
}

/// Deadline configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Deadline for a whole inbound request in milliseconds. Unbounded when absent.
    pub request_ms: Option<u64>,
}
