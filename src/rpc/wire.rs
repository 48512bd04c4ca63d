//! Wire format of the `Ping` remote procedure.
//!
//! ```text
//! POST /rpc/ping
//! traceparent: 00-<trace id>-<span id>-01
//! x-deadline-ms: <budget>            (optional)
//! {"message": "hello"}
//!
//! 200 {"message": "pong hello"}
//! 500 {"error": "error in store.ping", "kind": "domain"}
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{ErrorKind, PingError};

/// Path of the `Ping` procedure on the work service.
pub const PING_PATH: &str = "/rpc/ping";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PingRequest {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PingResponse {
    pub message: String,
}

/// Failure body of a remote call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcErrorBody {
    pub error: String,
    pub kind: ErrorKind,
}

impl From<&PingError> for RpcErrorBody {
    fn from(err: &PingError) -> Self {
        Self {
            error: err.message().to_string(),
            kind: err.kind(),
        }
    }
}

impl From<RpcErrorBody> for PingError {
    fn from(body: RpcErrorBody) -> Self {
        PingError::new(body.kind, body.error)
    }
}
