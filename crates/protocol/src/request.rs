use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum BridgeRequest {
    /// One-shot method invocation on a request/response channel.
    MethodCall { channel: String, method: String },
    /// Attach this client as the subscriber of a streaming channel.
    Listen { channel: String },
    /// Detach this client from a streaming channel.
    Cancel { channel: String },
    /// Query server protocol/version information.
    GetVersion,
    /// Ask the server to shut down.
    Shutdown,
}

impl BridgeRequest {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}
