//! Downstream work service.
//!
//! # Data Flow
//! ```text
//! POST /rpc/ping
//!     → api.rs (remote boundary: extract context, span api.ping, validation delay)
//!     → service.rs (span service.ping, processing delay)
//!     → store.rs (span store.ping, domain rule, query delay)
//! errors flow back up unchanged and leave as {"error", "kind"}
//! ```

pub mod api;
pub mod server;
pub mod service;
pub mod store;

pub use server::WorkServer;
