//! Error taxonomy shared by every layer of the chain.
//!
//! # Design Decisions
//! - One closed kind enumeration travels beside the message text
//! - Layers record and forward errors unchanged; only the edge boundary
//!   translates them into a wire response
//! - The kind survives the RPC hop so the edge can tell a storage rejection
//!   from a dead downstream without string matching

use serde::{Deserialize, Serialize};

/// Coarse failure class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Rejected by business rules (the storage stub).
    Domain,
    /// The channel between services failed (connect, timeout, decode, cancel).
    Transport,
    /// Anything else.
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Domain => "domain",
            ErrorKind::Transport => "transport",
            ErrorKind::Internal => "internal",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned by every ping operation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct PingError {
    kind: ErrorKind,
    message: String,
}

impl PingError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn domain(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Domain, message)
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Transport, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    /// Error used when the call's context is cancelled or its deadline passes.
    pub fn cancelled(op: &str) -> Self {
        Self::transport(format!("{op}: call cancelled"))
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

pub type PingResult<T> = Result<T, PingError>;
