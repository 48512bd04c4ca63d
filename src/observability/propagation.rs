//! Wire propagation of the correlation context.
//!
//! # Data Flow
//! ```text
//! inbound headers ── ensure() ──▶ CorrelationContext ── inject() ──▶ outbound headers
//!   traceparent                    trace id, span id                   traceparent
//!   x-deadline-ms                  deadline                            x-deadline-ms
//! ```
//!
//! # Design Decisions
//! - W3C Trace Context `traceparent` is the only identity header
//! - Extraction is total: a malformed header means "start a new trace"
//! - The deadline travels as a relative budget in milliseconds so clocks
//!   need not agree

use std::time::Duration;

use axum::http::{HeaderMap, HeaderValue};

use crate::observability::context::{CorrelationContext, SpanId, TraceId};

/// W3C trace context header.
pub const TRACEPARENT: &str = "traceparent";

/// Remaining call budget in milliseconds.
pub const DEADLINE_MS: &str = "x-deadline-ms";

/// Response header exposing the correlation identifier to clients.
pub const TRACE_ID: &str = "x-trace-id";

const SUPPORTED_VERSION: u8 = 0x00;
const FLAG_SAMPLED: u8 = 0x01;

/// Reuse the inbound trace context if present and valid, otherwise mint one.
pub fn ensure(headers: &HeaderMap) -> CorrelationContext {
    let ctx = extract(headers).unwrap_or_else(CorrelationContext::new_root);
    match extract_deadline(headers) {
        Some(budget) => ctx.with_timeout(budget),
        None => ctx,
    }
}

/// Parse the inbound `traceparent` header.
pub fn extract(headers: &HeaderMap) -> Option<CorrelationContext> {
    let value = headers.get(TRACEPARENT)?.to_str().ok()?;
    let (trace_id, span_id, flags) = parse_traceparent(value)?;
    Some(CorrelationContext::from_remote(
        trace_id,
        span_id,
        flags & FLAG_SAMPLED != 0,
    ))
}

/// Write the active context into outbound metadata.
pub fn inject(ctx: &CorrelationContext, headers: &mut HeaderMap) {
    if let Ok(value) = HeaderValue::from_str(&format_traceparent(ctx)) {
        headers.insert(TRACEPARENT, value);
    }
    if let Some(remaining) = ctx.remaining() {
        headers.insert(DEADLINE_MS, HeaderValue::from(remaining.as_millis() as u64));
    }
}

pub fn format_traceparent(ctx: &CorrelationContext) -> String {
    let flags = if ctx.is_sampled() { FLAG_SAMPLED } else { 0 };
    format!(
        "{:02x}-{}-{}-{:02x}",
        SUPPORTED_VERSION,
        ctx.trace_id(),
        ctx.span_id(),
        flags
    )
}

fn parse_traceparent(value: &str) -> Option<(TraceId, SpanId, u8)> {
    let parts: Vec<&str> = value.trim().split('-').collect();
    if parts.len() < 4 {
        return None;
    }

    let version = parse_hex_byte(parts[0])?;
    // 0xff is forbidden; version 00 has exactly four fields, later versions may append more.
    if version == 0xff || (version == SUPPORTED_VERSION && parts.len() != 4) {
        return None;
    }

    let trace_id = TraceId::from_hex(parts[1])?;
    let span_id = SpanId::from_hex(parts[2])?;
    let flags = parse_hex_byte(parts[3])?;
    Some((trace_id, span_id, flags))
}

fn parse_hex_byte(field: &str) -> Option<u8> {
    if field.len() != 2 {
        return None;
    }
    u8::from_str_radix(field, 16).ok()
}

fn extract_deadline(headers: &HeaderMap) -> Option<Duration> {
    let millis: u64 = headers.get(DEADLINE_MS)?.to_str().ok()?.trim().parse().ok()?;
    Some(Duration::from_millis(millis))
}
