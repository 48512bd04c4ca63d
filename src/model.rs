//! Parameters and results of the business layers.

use serde::{Deserialize, Serialize};

/// Input of a business-layer ping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PingParams {
    pub ping_message: String,
}

impl PingParams {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            ping_message: message.into(),
        }
    }
}

/// Output of a business-layer ping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PingOutput {
    pub pong_message: String,
}
