//! Correlation context carried by every unit of work.
//!
//! # Responsibilities
//! - Hold the trace identity of one originating request (trace id + current span id)
//! - Carry the call's cancellation token and optional deadline
//! - Race futures against cancellation so abandoned calls stop early
//!
//! # Design Decisions
//! - Immutable: fields are private and derived contexts are new values
//! - Passed explicitly as the first argument of every operation, never stored
//!   in shared state
//! - Child contexts get a child cancellation token, so cancelling a call
//!   cancels everything beneath it but never its caller

use std::fmt;
use std::future::Future;
use std::time::Duration;

use serde::{Serialize, Serializer};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::error::{PingError, PingResult};
use crate::resilience::timeouts;

/// 128-bit W3C trace identifier. Never zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TraceId(u128);

impl TraceId {
    pub fn random() -> Self {
        loop {
            let id = Uuid::new_v4().as_u128();
            if id != 0 {
                return Self(id);
            }
        }
    }

    /// Parse 32 lowercase or uppercase hex digits; the all-zero id is invalid.
    pub fn from_hex(hex: &str) -> Option<Self> {
        if hex.len() != 32 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        match u128::from_str_radix(hex, 16) {
            Ok(0) | Err(_) => None,
            Ok(id) => Some(Self(id)),
        }
    }

    pub fn as_u128(&self) -> u128 {
        self.0
    }
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:032x}", self.0)
    }
}

impl Serialize for TraceId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// 64-bit W3C span identifier. Never zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpanId(u64);

impl SpanId {
    pub fn random() -> Self {
        loop {
            let id: u64 = rand::random();
            if id != 0 {
                return Self(id);
            }
        }
    }

    pub fn from_hex(hex: &str) -> Option<Self> {
        if hex.len() != 16 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        match u64::from_str_radix(hex, 16) {
            Ok(0) | Err(_) => None,
            Ok(id) => Some(Self(id)),
        }
    }
}

impl fmt::Display for SpanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

impl Serialize for SpanId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Why a guarded future was abandoned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    Cancelled,
    DeadlineExceeded,
}

/// Identity and lifetime of one request as it moves through the chain.
#[derive(Debug, Clone)]
pub struct CorrelationContext {
    trace_id: TraceId,
    span_id: SpanId,
    sampled: bool,
    remote: bool,
    cancel: CancellationToken,
    deadline: Option<Instant>,
}

impl CorrelationContext {
    /// Mint a fresh root context for a request that arrived without one.
    pub fn new_root() -> Self {
        Self {
            trace_id: TraceId::random(),
            span_id: SpanId::random(),
            sampled: true,
            remote: false,
            cancel: CancellationToken::new(),
            deadline: None,
        }
    }

    /// Context continuing a trace started by another process.
    pub fn from_remote(trace_id: TraceId, span_id: SpanId, sampled: bool) -> Self {
        Self {
            trace_id,
            span_id,
            sampled,
            remote: true,
            cancel: CancellationToken::new(),
            deadline: None,
        }
    }

    /// Derive the context of a nested span. Used by the span recorder.
    pub(crate) fn child(&self, span_id: SpanId) -> Self {
        Self {
            trace_id: self.trace_id,
            span_id,
            sampled: self.sampled,
            remote: false,
            cancel: self.cancel.child_token(),
            deadline: self.deadline,
        }
    }

    /// Same identity with a deadline no later than `now + timeout`.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Same identity with a deadline no later than `deadline`.
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        Self {
            deadline: timeouts::earliest(self.deadline, Some(deadline)),
            ..self.clone()
        }
    }

    pub fn trace_id(&self) -> TraceId {
        self.trace_id
    }

    pub fn span_id(&self) -> SpanId {
        self.span_id
    }

    pub fn is_sampled(&self) -> bool {
        self.sampled
    }

    /// True when this context was extracted from inbound metadata.
    pub fn is_remote(&self) -> bool {
        self.remote
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before the deadline, `None` when unbounded.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline.map(timeouts::remaining_until)
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Resolves once the call is cancelled or its deadline passes.
    pub async fn done(&self) -> Termination {
        match self.deadline {
            Some(deadline) => tokio::select! {
                biased;
                () = self.cancel.cancelled() => Termination::Cancelled,
                () = tokio::time::sleep_until(deadline) => Termination::DeadlineExceeded,
            },
            None => {
                self.cancel.cancelled().await;
                Termination::Cancelled
            }
        }
    }

    /// Run `fut` unless the call is cancelled or times out first.
    ///
    /// The losing future is dropped, which abandons any in-flight I/O it owns.
    pub async fn guard<F, T>(&self, op: &str, fut: F) -> PingResult<T>
    where
        F: Future<Output = T>,
    {
        tokio::select! {
            biased;
            termination = self.done() => Err(match termination {
                Termination::Cancelled => PingError::cancelled(op),
                Termination::DeadlineExceeded => {
                    PingError::transport(format!("{op}: deadline exceeded"))
                }
            }),
            out = fut => Ok(out),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn hex_ids_reject_zero_and_bad_lengths() {
        assert!(TraceId::from_hex(&"0".repeat(32)).is_none());
        assert!(TraceId::from_hex("abc").is_none());
        assert!(TraceId::from_hex(&"g".repeat(32)).is_none());
        assert!(SpanId::from_hex(&"0".repeat(16)).is_none());

        let id = TraceId::from_hex("4bf92f3577b34da6a3ce929d0e0e4736").unwrap();
        assert_eq!(id.to_string(), "4bf92f3577b34da6a3ce929d0e0e4736");
        let span = SpanId::from_hex("00f067aa0ba902b7").unwrap();
        assert_eq!(span.to_string(), "00f067aa0ba902b7");
    }

    #[test]
    fn child_keeps_trace_and_replaces_span() {
        let root = CorrelationContext::new_root();
        let span = SpanId::random();
        let child = root.child(span);
        assert_eq!(child.trace_id(), root.trace_id());
        assert_eq!(child.span_id(), span);
        assert!(!child.is_remote());
    }

    #[test]
    fn cancelling_parent_cancels_child_but_not_reverse() {
        let root = CorrelationContext::new_root();
        let child = root.child(SpanId::random());
        child.cancellation().cancel();
        assert!(!root.is_cancelled());

        let other = root.child(SpanId::random());
        root.cancellation().cancel();
        assert!(other.is_cancelled());
    }

    #[tokio::test]
    async fn deadline_only_tightens() {
        let root = CorrelationContext::new_root();
        let tight = root.with_timeout(Duration::from_millis(50));
        let loose = tight.with_timeout(Duration::from_secs(60));
        assert_eq!(tight.deadline(), loose.deadline());
        assert!(loose.remaining().unwrap() <= Duration::from_millis(50));
    }

    #[tokio::test]
    async fn guard_reports_deadline_as_transport_failure() {
        let ctx = CorrelationContext::new_root().with_timeout(Duration::from_millis(20));
        let err = ctx
            .guard("test.op", tokio::time::sleep(Duration::from_secs(5)))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transport);
        assert!(err.message().contains("deadline exceeded"));
    }

    #[tokio::test]
    async fn guard_passes_through_when_not_cancelled() {
        let ctx = CorrelationContext::new_root();
        let out = ctx.guard("test.op", async { 7 }).await.unwrap();
        assert_eq!(out, 7);
    }
}
