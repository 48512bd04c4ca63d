//! Span exporters.
//!
//! # Data Flow
//! ```text
//! SpanHandle::end()
//!     → SpanExporter::export(SpanData)
//!         → LogExporter       (tracing event per span)
//!         → MetricsExporter   (counters + duration histogram, see metrics.rs)
//!         → CollectorExporter (batched JSON POST to the collector endpoint)
//!         → InMemoryExporter  (tests)
//! ```
//!
//! # Design Decisions
//! - `export` never blocks the calling layer: the collector path only
//!   enqueues onto a bounded channel drained by a background task, and
//!   drops spans when that channel is full
//! - Every collector POST carries a timeout, so a silent collector cannot
//!   stall the shipper or the shutdown flush
//! - Export failures are logged and dropped; telemetry never fails a request

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot};
use url::Url;

use crate::config::TracerConfig;
use crate::observability::context::TraceId;
use crate::observability::span::SpanData;

/// Receives every finished span.
pub trait SpanExporter: Send + Sync {
    fn export(&self, span: SpanData);
}

/// Writes each finished span as a structured tracing event.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogExporter;

impl SpanExporter for LogExporter {
    fn export(&self, span: SpanData) {
        let attributes = serde_json::to_string(&span.attributes).unwrap_or_default();
        tracing::debug!(
            target: "ping_chain::span",
            service = %span.service,
            trace_id = %span.trace_id,
            span_id = %span.span_id,
            parent_span_id = %span.parent_span_id,
            name = %span.name,
            status = span.status.code(),
            duration_us = span.duration_micros,
            events = span.events.len(),
            attributes = %attributes,
            "span closed"
        );
    }
}

/// Keeps finished spans in memory.
#[derive(Debug, Default)]
pub struct InMemoryExporter {
    spans: Mutex<Vec<SpanData>>,
}

impl InMemoryExporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spans(&self) -> Vec<SpanData> {
        self.spans.lock().map(|s| s.clone()).unwrap_or_default()
    }

    pub fn spans_for(&self, trace_id: TraceId) -> Vec<SpanData> {
        self.spans()
            .into_iter()
            .filter(|s| s.trace_id == trace_id)
            .collect()
    }

    pub fn clear(&self) {
        if let Ok(mut spans) = self.spans.lock() {
            spans.clear();
        }
    }
}

impl SpanExporter for InMemoryExporter {
    fn export(&self, span: SpanData) {
        if let Ok(mut spans) = self.spans.lock() {
            spans.push(span);
        }
    }
}

/// Forwards every span to several exporters.
#[derive(Default)]
pub struct FanoutExporter {
    exporters: Vec<Arc<dyn SpanExporter>>,
}

impl FanoutExporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, exporter: Arc<dyn SpanExporter>) -> Self {
        self.exporters.push(exporter);
        self
    }

    pub fn len(&self) -> usize {
        self.exporters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exporters.is_empty()
    }
}

impl SpanExporter for FanoutExporter {
    fn export(&self, span: SpanData) {
        if let Some((last, rest)) = self.exporters.split_last() {
            for exporter in rest {
                exporter.export(span.clone());
            }
            last.export(span);
        }
    }
}

/// Body POSTed to the collector.
#[derive(Debug, Serialize)]
pub struct ExportBatch<'a> {
    pub tracer: &'a str,
    pub spans: &'a [SpanData],
}

enum Command {
    Span(SpanData),
    Flush(oneshot::Sender<()>),
}

/// Batching and backpressure settings of the collector exporter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectorOptions {
    pub batch_size: usize,
    pub flush_interval: Duration,
    /// Bound on a single POST.
    pub export_timeout: Duration,
    /// Spans queued ahead of the shipper; the rest are dropped.
    pub queue_capacity: usize,
}

impl From<&TracerConfig> for CollectorOptions {
    fn from(config: &TracerConfig) -> Self {
        Self {
            batch_size: config.batch_size,
            flush_interval: Duration::from_millis(config.flush_interval_ms),
            export_timeout: Duration::from_millis(config.export_timeout_ms),
            queue_capacity: config.queue_capacity,
        }
    }
}

/// Ships spans to a remote collector in batches.
pub struct CollectorExporter {
    tx: mpsc::Sender<Command>,
    dropped: AtomicU64,
}

impl CollectorExporter {
    /// Start the background shipping task. Must be called inside a Tokio runtime.
    pub fn spawn(
        endpoint: Url,
        tracer: impl Into<String>,
        options: CollectorOptions,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(options.export_timeout)
            .build()?;
        let (tx, rx) = mpsc::channel(options.queue_capacity.max(1));
        let shipper = Shipper {
            client,
            endpoint,
            tracer: tracer.into(),
            batch_size: options.batch_size.max(1),
        };
        tokio::spawn(shipper.run(rx, options.flush_interval));
        Ok(Self {
            tx,
            dropped: AtomicU64::new(0),
        })
    }

    /// Send everything queued so far and wait for the POST to finish.
    ///
    /// Each POST is bounded by the export timeout, so this always returns;
    /// callers on a shutdown path should still bound the total wait.
    pub async fn flush(&self) {
        let (done_tx, done_rx) = oneshot::channel();
        if self.tx.send(Command::Flush(done_tx)).await.is_ok() {
            let _ = done_rx.await;
        }
    }

    /// Spans discarded because the queue was full.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl SpanExporter for CollectorExporter {
    fn export(&self, span: SpanData) {
        match self.tx.try_send(Command::Span(span)) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                if self.dropped.fetch_add(1, Ordering::Relaxed) == 0 {
                    tracing::warn!(
                        target: "ping_chain::span",
                        "Span collector queue full, dropping spans"
                    );
                }
            }
            Err(TrySendError::Closed(_)) => {}
        }
    }
}

struct Shipper {
    client: reqwest::Client,
    endpoint: Url,
    tracer: String,
    batch_size: usize,
}

impl Shipper {
    async fn run(self, mut rx: mpsc::Receiver<Command>, flush_interval: Duration) {
        let mut batch: Vec<SpanData> = Vec::with_capacity(self.batch_size);
        let mut ticker = tokio::time::interval(flush_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                command = rx.recv() => match command {
                    Some(Command::Span(span)) => {
                        batch.push(span);
                        if batch.len() >= self.batch_size {
                            self.ship(&mut batch).await;
                        }
                    }
                    Some(Command::Flush(done)) => {
                        self.ship(&mut batch).await;
                        let _ = done.send(());
                    }
                    None => {
                        self.ship(&mut batch).await;
                        break;
                    }
                },
                _ = ticker.tick() => {
                    self.ship(&mut batch).await;
                }
            }
        }
    }

    async fn ship(&self, batch: &mut Vec<SpanData>) {
        if batch.is_empty() {
            return;
        }

        let body = ExportBatch {
            tracer: &self.tracer,
            spans: &batch[..],
        };
        let result = self
            .client
            .post(self.endpoint.clone())
            .json(&body)
            .send()
            .await
            .and_then(|response| response.error_for_status());

        match result {
            Ok(_) => {
                tracing::trace!(target: "ping_chain::span", spans = batch.len(), "span batch exported");
            }
            Err(e) => {
                tracing::warn!(
                    target: "ping_chain::span",
                    endpoint = %self.endpoint,
                    spans = batch.len(),
                    error = %e,
                    "Failed to export span batch, dropping it"
                );
            }
        }
        batch.clear();
    }
}
