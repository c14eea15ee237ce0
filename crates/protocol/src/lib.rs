mod request;
mod response;
mod types;
mod version;

pub use request::BridgeRequest;
pub use response::{BridgeResponse, VersionInfo};
pub use types::{
    ChargingState, DischargeLabel, ErrorEnvelope, CODE_NOT_IMPLEMENTED, CODE_UNAVAILABLE,
    EVENT_CHANNEL, GET_BATTERY_LEVEL, METHOD_CHANNEL, MSG_CHARGING_UNAVAILABLE,
    MSG_LEVEL_UNAVAILABLE,
};
pub use version::{MIN_SUPPORTED_VERSION, PROTOCOL_VERSION};
