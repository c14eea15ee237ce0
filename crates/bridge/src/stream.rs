use std::sync::Arc;

use futures::Stream;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use limit_battery_platform::{BatterySource, ChargeWatch};
use limit_battery_protocol::EVENT_CHANNEL;

use crate::bridge::BatteryBridge;
use crate::error::BridgeError;
use crate::sink::{EventSink, StreamEvent};

/// Sink backed by a bounded channel.
///
/// Emissions are handed off with `try_send`: if the subscriber's queue is
/// full or gone the event is dropped, never queued unboundedly. Each event is
/// delivered at most once.
pub struct ChannelSink {
    tx: mpsc::Sender<StreamEvent>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::Sender<StreamEvent>) -> Self {
        Self { tx }
    }
}

impl EventSink for ChannelSink {
    fn emit(&self, event: StreamEvent) {
        let _ = self.tx.try_send(event);
    }
}

/// Subscribe to the charging channel as an async stream of events.
///
/// Convenience for in-process consumers; the subscription ends when the
/// bridge cancels, detaches, or another listener replaces this one.
pub fn charging_stream<S: BatterySource, W: ChargeWatch>(
    bridge: &mut BatteryBridge<S, W>,
    capacity: usize,
) -> Result<impl Stream<Item = StreamEvent>, BridgeError> {
    let (tx, rx) = mpsc::channel(capacity);
    bridge.listen(EVENT_CHANNEL, Arc::new(ChannelSink::new(tx)))?;
    Ok(ReceiverStream::new(rx))
}
