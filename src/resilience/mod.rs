//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Layer entry:
//!     → delay.rs (named synthetic latency, raced against cancellation)
//! Outbound call:
//!     → timeouts.rs (deadline arithmetic for context and wire budget)
//!     → single attempt; no retries anywhere in the chain
//! ```
//!
//! # Design Decisions
//! - Timeouts are optional and unbounded by default
//! - Every wait observes the call's cancellation token
//! - Failures propagate; nothing here recovers from them

pub mod delay;
pub mod timeouts;

pub use delay::SyntheticDelay;
