//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! inbound headers
//!     → propagation.rs (ensure: extract or mint the correlation context)
//!     → context.rs (CorrelationContext: trace id, span id, cancellation, deadline)
//!
//! Every layer, with the context passed explicitly:
//!     → span.rs (SpanRecorder::start → child context + SpanHandle)
//!     → logging.rs (CorrelatedLogger::with_correlation → BoundLogger)
//!
//! Finished spans:
//!     → export.rs (log / collector / in-memory / fan-out)
//!     → metrics.rs (counters and latency histograms)
//!
//! outbound headers
//!     ← propagation.rs (inject: traceparent + remaining deadline)
//! ```
//!
//! # Design Decisions
//! - No global tracer or logger: both are built once per process and
//!   injected into every component through `Telemetry`
//! - Structured logging (JSON) for machine parsing
//! - The trace id is the correlation id for spans and logs alike

pub mod context;
pub mod export;
pub mod logging;
pub mod metrics;
pub mod propagation;
pub mod span;

use std::sync::Arc;

pub use context::{CorrelationContext, SpanId, TraceId};
pub use export::{InMemoryExporter, SpanExporter};
pub use logging::{BoundLogger, CorrelatedLogger, LogSink, MemorySink};
pub use span::{SpanData, SpanHandle, SpanRecorder, SpanStatus};

/// The span recorder and logger of one service, handed to each layer.
#[derive(Debug, Clone)]
pub struct Telemetry {
    pub recorder: SpanRecorder,
    pub logger: CorrelatedLogger,
}

impl Telemetry {
    pub fn new(
        service: impl Into<String>,
        exporter: Arc<dyn SpanExporter>,
        sink: Arc<dyn LogSink>,
    ) -> Self {
        let service = service.into();
        Self {
            recorder: SpanRecorder::new(service.clone(), exporter),
            logger: CorrelatedLogger::new(service, sink),
        }
    }
}
