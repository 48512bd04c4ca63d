//! Timeout enforcement.
//!
//! # Responsibilities
//! - Combine the inbound deadline with per-call timeouts
//! - Report the remaining budget for wire propagation
//!
//! # Design Decisions
//! - Uses Tokio's clock so paused-time tests behave
//! - A deadline can only move earlier, never later

use std::time::Duration;

use tokio::time::Instant;

/// The earlier of two optional deadlines.
pub fn earliest(a: Option<Instant>, b: Option<Instant>) -> Option<Instant> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, None) => a,
        (None, b) => b,
    }
}

/// Time left until `deadline`, zero once it has passed.
pub fn remaining_until(deadline: Instant) -> Duration {
    deadline.saturating_duration_since(Instant::now())
}

/// Convert an optional millisecond setting into a timeout.
pub fn from_millis(millis: Option<u64>) -> Option<Duration> {
    millis.map(Duration::from_millis)
}
