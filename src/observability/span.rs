//! Span recording.
//!
//! # Responsibilities
//! - Open one named span per (layer, call)
//! - Collect attributes, events, status and timing
//! - Hand the finished span to the configured exporter exactly once
//!
//! # Design Decisions
//! - `end()` consumes the handle; `Drop` ends any handle still open, so an
//!   early return, `?` or a cancelled future can never leak a span
//! - The recorder is a plain value injected into each layer, not a global
//! - Nesting follows lexical scope: a child handle lives inside its
//!   parent's scope, so its interval is contained in the parent's

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use serde::Serialize;

use crate::error::{PingError, PingResult};
use crate::observability::context::{CorrelationContext, SpanId, TraceId};
use crate::observability::export::SpanExporter;

/// Attribute value attached to a span or span event.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Str(String),
    Int(i64),
    Bool(bool),
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::Str(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        AttributeValue::Str(value)
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        AttributeValue::Int(value)
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        AttributeValue::Bool(value)
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::Str(s) => f.write_str(s),
            AttributeValue::Int(i) => write!(f, "{i}"),
            AttributeValue::Bool(b) => write!(f, "{b}"),
        }
    }
}

/// Terminal status of a span.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum SpanStatus {
    Unset,
    Ok { message: String },
    Error { message: String },
}

impl SpanStatus {
    pub fn ok(message: impl Into<String>) -> Self {
        SpanStatus::Ok {
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        SpanStatus::Error {
            message: message.into(),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            SpanStatus::Unset => "unset",
            SpanStatus::Ok { .. } => "ok",
            SpanStatus::Error { .. } => "error",
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, SpanStatus::Error { .. })
    }
}

/// Timestamped point of interest inside a span.
#[derive(Debug, Clone, Serialize)]
pub struct SpanEvent {
    pub name: String,
    /// Offset from the span start.
    pub offset_micros: u64,
    pub attributes: BTreeMap<String, AttributeValue>,
}

/// A finished span as delivered to exporters.
#[derive(Debug, Clone, Serialize)]
pub struct SpanData {
    pub trace_id: TraceId,
    pub span_id: SpanId,
    pub parent_span_id: SpanId,
    /// Parent span lives in another process.
    pub remote_parent: bool,
    pub service: String,
    pub name: String,
    pub attributes: BTreeMap<String, AttributeValue>,
    pub events: Vec<SpanEvent>,
    pub status: SpanStatus,
    pub start_unix_nanos: u128,
    pub duration_micros: u64,
    #[serde(skip)]
    pub started_at: Instant,
    #[serde(skip)]
    pub ended_at: Instant,
}

impl SpanData {
    pub fn attribute(&self, key: &str) -> Option<&AttributeValue> {
        self.attributes.get(key)
    }

    pub fn duration(&self) -> Duration {
        self.ended_at.saturating_duration_since(self.started_at)
    }

    /// True when this span's interval lies within `outer`'s.
    pub fn is_within(&self, outer: &SpanData) -> bool {
        self.started_at >= outer.started_at && self.ended_at <= outer.ended_at
    }
}

/// Opens spans for one service and routes finished spans to an exporter.
#[derive(Clone)]
pub struct SpanRecorder {
    service: Arc<str>,
    exporter: Arc<dyn SpanExporter>,
}

impl SpanRecorder {
    pub fn new(service: impl Into<String>, exporter: Arc<dyn SpanExporter>) -> Self {
        Self {
            service: Arc::from(service.into()),
            exporter,
        }
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    /// Open a span named `operation` under `ctx`.
    ///
    /// The returned context identifies the new span and must be passed to
    /// nested calls.
    pub fn start(
        &self,
        ctx: &CorrelationContext,
        operation: impl Into<String>,
    ) -> (CorrelationContext, SpanHandle) {
        let span_id = SpanId::random();
        let child = ctx.child(span_id);
        let now = Instant::now();
        let start_unix_nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or_default();

        let data = SpanData {
            trace_id: ctx.trace_id(),
            span_id,
            parent_span_id: ctx.span_id(),
            remote_parent: ctx.is_remote(),
            service: self.service.to_string(),
            name: operation.into(),
            attributes: BTreeMap::new(),
            events: Vec::new(),
            status: SpanStatus::Unset,
            start_unix_nanos,
            duration_micros: 0,
            started_at: now,
            ended_at: now,
        };

        let handle = SpanHandle {
            data: Some(data),
            exporter: Arc::clone(&self.exporter),
        };
        (child, handle)
    }
}

impl fmt::Debug for SpanRecorder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpanRecorder")
            .field("service", &self.service)
            .finish_non_exhaustive()
    }
}

const ABANDONED: &str = "span abandoned before completion";

/// An open span. Ends when `end()` is called or when dropped; a dropped
/// span without a status is marked as an error.
pub struct SpanHandle {
    data: Option<SpanData>,
    exporter: Arc<dyn SpanExporter>,
}

impl SpanHandle {
    pub fn set_attribute(&mut self, key: impl Into<String>, value: impl Into<AttributeValue>) {
        if let Some(data) = self.data.as_mut() {
            data.attributes.insert(key.into(), value.into());
        }
    }

    pub fn set_attributes<I, K, V>(&mut self, attributes: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<AttributeValue>,
    {
        for (key, value) in attributes {
            self.set_attribute(key, value);
        }
    }

    pub fn add_event(&mut self, name: impl Into<String>) {
        self.add_event_with(name, std::iter::empty::<(String, AttributeValue)>());
    }

    pub fn add_event_with<I, K, V>(&mut self, name: impl Into<String>, attributes: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<AttributeValue>,
    {
        if let Some(data) = self.data.as_mut() {
            data.events.push(SpanEvent {
                name: name.into(),
                offset_micros: data.started_at.elapsed().as_micros() as u64,
                attributes: attributes
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            });
        }
    }

    /// Attach an error as an `exception` event plus `error.*` attributes.
    pub fn record_error(&mut self, err: &PingError) {
        self.add_event_with(
            "exception",
            [
                ("exception.message", err.message().to_string()),
                ("error.kind", err.kind().to_string()),
            ],
        );
        self.set_attribute("error.kind", err.kind().as_str());
        self.set_attribute("error.message", err.message());
    }

    pub fn set_status(&mut self, status: SpanStatus) {
        if let Some(data) = self.data.as_mut() {
            data.status = status;
        }
    }

    /// Record the outcome of a layer: output attribute and ok status on
    /// success, error event and error status on failure.
    pub fn record_result<T: fmt::Debug>(
        &mut self,
        output_key: &str,
        result: &PingResult<T>,
        ok_message: &str,
    ) {
        match result {
            Ok(value) => {
                self.set_attribute(output_key, format!("{value:?}"));
                self.set_status(SpanStatus::ok(ok_message));
            }
            Err(err) => {
                self.record_error(err);
                self.set_status(SpanStatus::error(err.message()));
            }
        }
    }

    /// Close the span and export it.
    pub fn end(mut self) {
        self.finish();
    }

    fn finish(&mut self) {
        if let Some(mut data) = self.data.take() {
            data.ended_at = Instant::now();
            data.duration_micros = data.duration().as_micros() as u64;
            self.exporter.export(data);
        }
    }
}

impl Drop for SpanHandle {
    fn drop(&mut self) {
        // Still open here means the call unwound or its future was dropped.
        if let Some(data) = self.data.as_mut() {
            if data.status == SpanStatus::Unset {
                data.status = SpanStatus::error(ABANDONED);
            }
        }
        self.finish();
    }
}
