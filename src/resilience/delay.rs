//! Synthetic latency.
//!
//! Each layer of the chain models its processing cost with a fixed, named
//! delay. The delay is part of the observable behaviour, so it is configured
//! rather than hidden in the algorithm, and it yields to the runtime so
//! concurrent requests wait independently.

use std::time::Duration;

use crate::error::PingResult;
use crate::observability::CorrelationContext;

/// A fixed wait attributed to a named activity ("validation", "storage", ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyntheticDelay {
    name: &'static str,
    duration: Duration,
}

impl SyntheticDelay {
    pub const fn new(name: &'static str, duration: Duration) -> Self {
        Self { name, duration }
    }

    pub const fn from_millis(name: &'static str, millis: u64) -> Self {
        Self::new(name, Duration::from_millis(millis))
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Sleep for the configured duration unless the call is abandoned first.
    pub async fn wait(&self, ctx: &CorrelationContext) -> PingResult<()> {
        if self.duration.is_zero() {
            return Ok(());
        }
        ctx.guard(self.name, tokio::time::sleep(self.duration)).await
    }
}
