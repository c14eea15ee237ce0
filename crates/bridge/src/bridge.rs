use std::sync::Arc;

use tracing::info;

use limit_battery_platform::{BatterySource, ChargeWatch};
use limit_battery_protocol::{EVENT_CHANNEL, METHOD_CHANNEL};

use crate::error::BridgeError;
use crate::observer::{ChargingObserver, EmitPolicy};
use crate::query::{BatteryLevelHandler, MethodReply};
use crate::sink::EventSink;

/// The plugin itself: both channel handlers behind the attach/detach
/// lifecycle.
///
/// A transport routes inbound operations here by channel name. Nothing is
/// served while detached, and detaching cancels any active subscription.
pub struct BatteryBridge<S: BatterySource, W: ChargeWatch> {
    query: BatteryLevelHandler<S>,
    observer: ChargingObserver<W>,
    attached: bool,
}

impl<S: BatterySource, W: ChargeWatch> BatteryBridge<S, W> {
    pub fn new(source: S, watch: W, policy: EmitPolicy) -> Self {
        Self {
            query: BatteryLevelHandler::new(source),
            observer: ChargingObserver::new(watch, policy),
            attached: false,
        }
    }

    /// Bind both channels to the transport.
    pub fn attach(&mut self) {
        self.attached = true;
        info!(
            method_channel = METHOD_CHANNEL,
            event_channel = EVENT_CHANNEL,
            "bridge attached"
        );
    }

    /// Unbind the channels, cancelling any active subscription.
    pub fn detach(&mut self) {
        self.observer.on_cancel();
        self.attached = false;
        info!("bridge detached");
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    pub fn is_listening(&self) -> bool {
        self.observer.is_listening()
    }

    /// Dispatch a method call on a request/response channel.
    pub fn handle_method(&mut self, channel: &str, method: &str) -> Result<MethodReply, BridgeError> {
        self.ensure_attached()?;
        if channel != METHOD_CHANNEL {
            return Err(BridgeError::UnknownChannel(channel.to_string()));
        }
        Ok(self.query.on_method_call(method))
    }

    /// Attach a subscriber to a streaming channel.
    pub fn listen(&mut self, channel: &str, sink: Arc<dyn EventSink>) -> Result<(), BridgeError> {
        self.ensure_attached()?;
        if channel != EVENT_CHANNEL {
            return Err(BridgeError::UnknownChannel(channel.to_string()));
        }
        self.observer.on_listen(sink)
    }

    /// Detach the subscriber of a streaming channel. Idempotent.
    pub fn cancel(&mut self, channel: &str) -> Result<(), BridgeError> {
        self.ensure_attached()?;
        if channel != EVENT_CHANNEL {
            return Err(BridgeError::UnknownChannel(channel.to_string()));
        }
        self.observer.on_cancel();
        Ok(())
    }

    fn ensure_attached(&self) -> Result<(), BridgeError> {
        if self.attached {
            Ok(())
        } else {
            Err(BridgeError::Detached)
        }
    }
}
