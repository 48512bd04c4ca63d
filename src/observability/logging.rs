//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber (filter + pretty or JSON output)
//! - Stamp every log entry with the active correlation identifier
//! - Route entries to a pluggable sink
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - JSON format for production, pretty format for development
//! - Log level configurable via config and `RUST_LOG`
//! - The logger reads the correlation context but is independent of the
//!   span recorder

use std::fmt::Display;
use std::sync::{Arc, Mutex};

use serde::Serialize;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{layer::SubscriberExt, EnvFilter};

use crate::config::{LogFormat, ObservabilityConfig};
use crate::error::PingError;
use crate::observability::context::{CorrelationContext, SpanId, TraceId};

/// Install the global tracing subscriber.
pub fn init_logging(config: &ObservabilityConfig) -> Result<(), TryInitError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("ping_chain={},tower_http=info", config.log_level))
    });

    let json = config.log_format == LogFormat::Json;
    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json).then(|| tracing_subscriber::fmt::layer()))
        .try_init()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Error,
}

/// One structured log line. Written once, never mutated.
#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    pub level: LogLevel,
    pub service: String,
    pub operation: String,
    pub correlation_id: TraceId,
    pub span_id: SpanId,
    pub payload: String,
    pub error: Option<String>,
}

/// Destination for log entries.
pub trait LogSink: Send + Sync {
    fn emit(&self, entry: LogEntry);
}

/// Emits entries as tracing events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn emit(&self, entry: LogEntry) {
        match entry.level {
            LogLevel::Info => tracing::info!(
                target: "ping_chain::log",
                service = %entry.service,
                trace_id = %entry.correlation_id,
                span_id = %entry.span_id,
                op = %entry.operation,
                "{}",
                entry.payload
            ),
            LogLevel::Error => tracing::error!(
                target: "ping_chain::log",
                service = %entry.service,
                trace_id = %entry.correlation_id,
                span_id = %entry.span_id,
                op = %entry.operation,
                error = entry.error.as_deref().unwrap_or_default(),
                "{}",
                entry.payload
            ),
        }
    }
}

/// Keeps entries in memory, in emission order.
#[derive(Debug, Default)]
pub struct MemorySink {
    entries: Mutex<Vec<LogEntry>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.lock().map(|e| e.clone()).unwrap_or_default()
    }

    pub fn entries_for(&self, correlation_id: TraceId) -> Vec<LogEntry> {
        self.entries()
            .into_iter()
            .filter(|e| e.correlation_id == correlation_id)
            .collect()
    }
}

impl LogSink for MemorySink {
    fn emit(&self, entry: LogEntry) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.push(entry);
        }
    }
}

/// Service-wide logger. Bind it to a context before writing.
#[derive(Clone)]
pub struct CorrelatedLogger {
    service: Arc<str>,
    sink: Arc<dyn LogSink>,
}

impl CorrelatedLogger {
    pub fn new(service: impl Into<String>, sink: Arc<dyn LogSink>) -> Self {
        Self {
            service: Arc::from(service.into()),
            sink,
        }
    }

    pub fn with_correlation(&self, ctx: &CorrelationContext) -> BoundLogger {
        BoundLogger {
            service: Arc::clone(&self.service),
            sink: Arc::clone(&self.sink),
            correlation_id: ctx.trace_id(),
            span_id: ctx.span_id(),
        }
    }
}

impl std::fmt::Debug for CorrelatedLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CorrelatedLogger")
            .field("service", &self.service)
            .finish_non_exhaustive()
    }
}

/// Logger bound to one correlation identifier.
pub struct BoundLogger {
    service: Arc<str>,
    sink: Arc<dyn LogSink>,
    correlation_id: TraceId,
    span_id: SpanId,
}

impl BoundLogger {
    pub fn info(&self, operation: &str, payload: impl Display) {
        self.emit(LogLevel::Info, operation, payload.to_string(), None);
    }

    pub fn error(&self, operation: &str, payload: impl Display, err: &PingError) {
        self.emit(
            LogLevel::Error,
            operation,
            payload.to_string(),
            Some(format!("{} ({})", err.message(), err.kind())),
        );
    }

    fn emit(&self, level: LogLevel, operation: &str, payload: String, error: Option<String>) {
        self.sink.emit(LogEntry {
            level,
            service: self.service.to_string(),
            operation: operation.to_string(),
            correlation_id: self.correlation_id,
            span_id: self.span_id,
            payload,
            error,
        });
    }
}
