//! Two-service traced ping chain.
//!
//! An edge service answers `GET /ping?message=...` by calling a work
//! service over HTTP/JSON RPC; the work service validates, processes and
//! "stores" the message before replying `pong <message>`. One correlation
//! id (the W3C trace id) follows the request across both processes and
//! tags every span and log line on the way.

// Services
pub mod edge;
pub mod work;

// Shared plumbing
pub mod config;
pub mod http;
pub mod model;
pub mod rpc;

// Cross-cutting concerns
pub mod error;
pub mod lifecycle;
pub mod observability;
pub mod resilience;

pub use config::{EdgeConfig, WorkConfig};
pub use edge::EdgeServer;
pub use error::{ErrorKind, PingError, PingResult};
pub use lifecycle::Shutdown;
pub use observability::{CorrelationContext, Telemetry};
pub use work::WorkServer;
