use serde::{Deserialize, Serialize};

/// Request/response channel carrying the one-shot battery level method.
pub const METHOD_CHANNEL: &str = "plugins.limit.io/battery";

/// Streaming channel carrying charging-state change events.
pub const EVENT_CHANNEL: &str = "plugins.limit.io/charging";

/// The single method understood on [`METHOD_CHANNEL`].
pub const GET_BATTERY_LEVEL: &str = "getBatteryLevel";

pub const CODE_UNAVAILABLE: &str = "UNAVAILABLE";
pub const CODE_NOT_IMPLEMENTED: &str = "NOT_IMPLEMENTED";

pub const MSG_LEVEL_UNAVAILABLE: &str = "Battery level not available.";
pub const MSG_CHARGING_UNAVAILABLE: &str = "Charging status unavailable";

/// Canonical charging-state vocabulary emitted on the event channel.
///
/// The discharging state has two historical wire spellings; which one a
/// stream uses is selected by [`DischargeLabel`], never mixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChargingState {
    Charging,
    Full,
    Discharging,
}

impl ChargingState {
    /// Returns the wire string for this state under the given vocabulary.
    pub fn wire_label(&self, label: DischargeLabel) -> &'static str {
        match self {
            ChargingState::Charging => "charging",
            ChargingState::Full => "full",
            ChargingState::Discharging => label.as_str(),
        }
    }
}

/// Wire spelling used for [`ChargingState::Discharging`].
///
/// `Discharging` is the canonical choice; `Unplugged` reproduces the
/// alternate vocabulary some hosts expect. The two are equivalent by
/// definition and a single stream only ever uses one of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DischargeLabel {
    #[default]
    Discharging,
    Unplugged,
}

impl DischargeLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            DischargeLabel::Discharging => "discharging",
            DischargeLabel::Unplugged => "unplugged",
        }
    }
}

/// Structured error reported on either channel: a stable code, a
/// human-readable message, and optional detail payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorEnvelope {
    pub fn unavailable(message: &str) -> Self {
        Self {
            code: CODE_UNAVAILABLE.to_string(),
            message: message.to_string(),
            details: None,
        }
    }

    pub fn not_implemented(method: &str) -> Self {
        Self {
            code: CODE_NOT_IMPLEMENTED.to_string(),
            message: format!("Method '{}' not implemented", method),
            details: None,
        }
    }
}
