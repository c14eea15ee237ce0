use limit_battery_protocol::{ChargingState, ErrorEnvelope};

/// One emission on the charging stream: a translated state or a non-fatal
/// error event.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    State(ChargingState),
    Error(ErrorEnvelope),
}

/// Destination for charging-stream emissions.
///
/// The platform watcher calls this from its own thread; implementations are
/// expected to hand the event off without blocking (drop it if the subscriber
/// cannot keep up, never queue unboundedly).
pub trait EventSink: Send + Sync + 'static {
    fn emit(&self, event: StreamEvent);
}
