use serde::{Deserialize, Serialize};

use crate::types::ErrorEnvelope;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionInfo {
    pub protocol_version: u32,
    pub min_supported_version: u32,
    pub server_version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum BridgeResponse {
    /// Successful method result.
    MethodResult {
        channel: String,
        value: serde_json::Value,
    },
    /// Method failed, or the method name was not recognized.
    MethodError {
        channel: String,
        error: ErrorEnvelope,
    },
    /// Subscription attached.
    Listening { channel: String },
    /// Subscription detached (also sent for a cancel with no subscription).
    Cancelled { channel: String },
    /// Event pushed to the current subscriber.
    Event {
        channel: String,
        value: serde_json::Value,
    },
    /// Error event pushed to the current subscriber; the stream stays open.
    ErrorEvent {
        channel: String,
        error: ErrorEnvelope,
    },
    Version(VersionInfo),
    Error(String),
    Ok,
}

impl BridgeResponse {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}
