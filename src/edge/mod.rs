//! Client-facing edge service.
//!
//! # Data Flow
//! ```text
//! GET /ping?message=...
//!     → api.rs (inbound boundary: ensure context, span api.ping)
//!     → service.rs (span service.ping, validation delay)
//!     → rpc::client (span rpc.client.ping, traceparent injected)
//!     → work service
//! any error → 500 {"error": <deepest error text>}
//! ```

pub mod api;
pub mod server;
pub mod service;

pub use server::EdgeServer;
