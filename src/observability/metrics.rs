//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Expose a Prometheus-compatible scrape endpoint
//! - Derive per-layer counters and latency histograms from finished spans
//!
//! # Metrics
//! - `ping_spans_total` (counter): finished spans by service, operation, status
//! - `ping_span_duration_seconds` (histogram): span duration by service, operation
//!
//! # Design Decisions
//! - Metrics are fed by the span exporter chain, so layers record nothing twice
//! - Without an installed recorder the macros are no-ops

use std::net::SocketAddr;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::observability::export::SpanExporter;
use crate::observability::span::SpanData;

/// Install the Prometheus recorder and its HTTP listener.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

/// Record one finished span.
pub fn record_span(span: &SpanData) {
    metrics::counter!(
        "ping_spans_total",
        "service" => span.service.clone(),
        "operation" => span.name.clone(),
        "status" => span.status.code()
    )
    .increment(1);

    metrics::histogram!(
        "ping_span_duration_seconds",
        "service" => span.service.clone(),
        "operation" => span.name.clone()
    )
    .record(span.duration().as_secs_f64());
}

/// Span exporter that feeds the metrics recorder.
#[derive(Debug, Default, Clone, Copy)]
pub struct MetricsExporter;

impl SpanExporter for MetricsExporter {
    fn export(&self, span: SpanData) {
        record_span(&span);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PingError;
    use crate::observability::context::CorrelationContext;
    use crate::observability::span::SpanRecorder;
    use std::sync::Arc;

    fn line<'a>(rendered: &'a str, prefix: &str, labels: &[&str]) -> Option<&'a str> {
        rendered
            .lines()
            .find(|l| l.starts_with(prefix) && labels.iter().all(|label| l.contains(label)))
    }

    #[test]
    fn spans_feed_counter_and_histogram() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        let spans = SpanRecorder::new("work-service", Arc::new(MetricsExporter));
        let ctx = CorrelationContext::new_root();

        metrics::with_local_recorder(&recorder, || {
            for _ in 0..2 {
                let (_, mut span) = spans.start(&ctx, "store.ping");
                span.set_status(crate::observability::SpanStatus::ok("done"));
                span.end();
            }
            let (_, mut span) = spans.start(&ctx, "store.ping");
            span.record_result::<()>(
                "store.output.data",
                &Err(PingError::domain("error in store.ping")),
                "unused",
            );
            span.end();
        });

        let rendered = handle.render();
        let ok = line(
            &rendered,
            "ping_spans_total{",
            &[r#"service="work-service""#, r#"operation="store.ping""#, r#"status="ok""#],
        )
        .unwrap();
        assert!(ok.ends_with(" 2"), "{ok}");
        let failed = line(&rendered, "ping_spans_total{", &[r#"status="error""#]).unwrap();
        assert!(failed.ends_with(" 1"), "{failed}");

        let count = line(
            &rendered,
            "ping_span_duration_seconds_count{",
            &[r#"service="work-service""#, r#"operation="store.ping""#],
        )
        .unwrap();
        assert!(count.ends_with(" 3"), "{count}");
    }
}
