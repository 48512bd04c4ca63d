//! Inter-service RPC.
//!
//! # Data Flow
//! ```text
//! edge::service
//!     → client.rs (Downstream::ping: span, inject context, single attempt)
//!     → HTTP POST /rpc/ping (wire.rs: JSON body + traceparent header)
//!     → work::api (remote boundary)
//! ```
//!
//! # Design Decisions
//! - JSON over HTTP/1.1 via reqwest, served by axum on the work side
//! - `Downstream` is the seam the edge business layer depends on, so tests
//!   and alternative transports can replace the client
//! - The error kind crosses the wire; the message text is never rewritten

pub mod client;
pub mod wire;

pub use client::{Downstream, RpcClient};
pub use wire::{PingRequest, PingResponse, RpcErrorBody, PING_PATH};
