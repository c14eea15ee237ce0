//! Battery bridge logic: the two channel handlers behind
//! `plugins.limit.io/battery` and `plugins.limit.io/charging`, unified over
//! one platform seam.
//!
//! - [`BatteryLevelHandler`] answers the one-shot `getBatteryLevel` method.
//! - [`ChargingObserver`] owns the charging-state subscription: it registers
//!   a platform watch on listen, translates raw states into the wire
//!   vocabulary, and tears everything down on cancel.
//! - [`BatteryBridge`] binds both behind the attach/detach lifecycle and
//!   routes by channel name.
//!
//! Everything is generic over the platform traits so tests run against mocks.

mod bridge;
mod error;
mod observer;
mod query;
mod sink;
mod stream;

pub use bridge::BatteryBridge;
pub use error::BridgeError;
pub use observer::{ChargingObserver, EmitPolicy};
pub use query::{BatteryLevelHandler, MethodReply};
pub use sink::{EventSink, StreamEvent};
pub use stream::{charging_stream, ChannelSink};

#[cfg(test)]
pub(crate) mod testutil;
