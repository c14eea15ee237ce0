use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use limit_battery_platform::{ChargeState, ChargeWatch};
use limit_battery_protocol::{ChargingState, ErrorEnvelope, MSG_CHARGING_UNAVAILABLE};

use crate::error::BridgeError;
use crate::sink::{EventSink, StreamEvent};

/// Whether a fresh subscription immediately learns the current state or only
/// hears about subsequent changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EmitPolicy {
    /// Emit one event reflecting the current state as soon as the sink is
    /// attached, then one per change.
    #[default]
    InitialSnapshot,
    /// Emit only on changes.
    OnChangeOnly,
}

/// Translate a raw platform state into the wire vocabulary.
///
/// Only charging/full/discharging are translatable; everything else is
/// reported as an unavailable error event.
fn translate(state: ChargeState) -> StreamEvent {
    match state {
        ChargeState::Charging => StreamEvent::State(ChargingState::Charging),
        ChargeState::Full => StreamEvent::State(ChargingState::Full),
        ChargeState::Discharging => StreamEvent::State(ChargingState::Discharging),
        ChargeState::NotCharging | ChargeState::Unknown => {
            StreamEvent::Error(ErrorEnvelope::unavailable(MSG_CHARGING_UNAVAILABLE))
        }
    }
}

struct Subscription<H> {
    // Registration and sink live and die together: dropping the handle
    // deregisters the platform callback.
    _handle: H,
    _sink: Arc<dyn EventSink>,
}

/// Observer for the `plugins.limit.io/charging` event channel.
///
/// Two states: Idle (no subscription) and Listening (sink paired with an
/// active platform watch). At most one subscriber at a time; a listen while
/// already Listening replaces the existing subscription.
pub struct ChargingObserver<W: ChargeWatch> {
    watch: W,
    policy: EmitPolicy,
    active: Option<Subscription<W::Handle>>,
}

impl<W: ChargeWatch> ChargingObserver<W> {
    pub fn new(watch: W, policy: EmitPolicy) -> Self {
        Self {
            watch,
            policy,
            active: None,
        }
    }

    pub fn is_listening(&self) -> bool {
        self.active.is_some()
    }

    /// Idle -> Listening: register the platform watch and attach the sink.
    ///
    /// Each change fires exactly one emission; unknown raw states emit an
    /// unavailable error event without closing the stream.
    pub fn on_listen(&mut self, sink: Arc<dyn EventSink>) -> Result<(), BridgeError> {
        // Host frameworks implicitly cancel before re-listen.
        self.on_cancel();

        let event_sink = Arc::clone(&sink);
        let handle = self
            .watch
            .subscribe(Box::new(move |state| event_sink.emit(translate(state))))
            .map_err(BridgeError::Watch)?;

        if self.policy == EmitPolicy::InitialSnapshot {
            let event = match self.watch.current() {
                Ok(state) => translate(state),
                Err(_) => StreamEvent::Error(ErrorEnvelope::unavailable(MSG_CHARGING_UNAVAILABLE)),
            };
            sink.emit(event);
        }

        self.active = Some(Subscription {
            _handle: handle,
            _sink: sink,
        });
        debug!("charging subscription attached");
        Ok(())
    }

    /// Listening -> Idle. Idempotent: cancelling while Idle is a no-op.
    pub fn on_cancel(&mut self) {
        if self.active.take().is_some() {
            debug!("charging subscription cancelled");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{CollectSink, MockWatch};

    fn unavailable_event() -> StreamEvent {
        StreamEvent::Error(ErrorEnvelope::unavailable(MSG_CHARGING_UNAVAILABLE))
    }

    #[test]
    fn initial_snapshot_emits_current_state_on_listen() {
        let (watch, _driver) = MockWatch::with_state(ChargeState::Charging);
        let mut observer = ChargingObserver::new(watch, EmitPolicy::InitialSnapshot);

        let sink = CollectSink::shared();
        observer.on_listen(sink.clone()).unwrap();

        assert!(observer.is_listening());
        assert_eq!(
            sink.events(),
            vec![StreamEvent::State(ChargingState::Charging)]
        );
    }

    #[test]
    fn on_change_only_emits_nothing_on_listen() {
        let (watch, _driver) = MockWatch::with_state(ChargeState::Charging);
        let mut observer = ChargingObserver::new(watch, EmitPolicy::OnChangeOnly);

        let sink = CollectSink::shared();
        observer.on_listen(sink.clone()).unwrap();

        assert!(sink.events().is_empty());
    }

    #[test]
    fn notification_sequence_emits_in_order() {
        let (watch, driver) = MockWatch::with_state(ChargeState::Discharging);
        let mut observer = ChargingObserver::new(watch, EmitPolicy::OnChangeOnly);

        let sink = CollectSink::shared();
        observer.on_listen(sink.clone()).unwrap();

        driver.fire(ChargeState::Charging);
        driver.fire(ChargeState::Full);
        driver.fire(ChargeState::Discharging);

        assert_eq!(
            sink.events(),
            vec![
                StreamEvent::State(ChargingState::Charging),
                StreamEvent::State(ChargingState::Full),
                StreamEvent::State(ChargingState::Discharging),
            ]
        );
    }

    #[test]
    fn unknown_state_emits_error_event_and_keeps_listening() {
        let (watch, driver) = MockWatch::with_state(ChargeState::Discharging);
        let mut observer = ChargingObserver::new(watch, EmitPolicy::OnChangeOnly);

        let sink = CollectSink::shared();
        observer.on_listen(sink.clone()).unwrap();

        driver.fire(ChargeState::Unknown);
        assert_eq!(sink.events(), vec![unavailable_event()]);
        assert!(observer.is_listening());

        driver.fire(ChargeState::Charging);
        assert_eq!(
            sink.events(),
            vec![
                unavailable_event(),
                StreamEvent::State(ChargingState::Charging)
            ]
        );
    }

    #[test]
    fn not_charging_is_outside_the_known_set() {
        let (watch, driver) = MockWatch::with_state(ChargeState::Discharging);
        let mut observer = ChargingObserver::new(watch, EmitPolicy::OnChangeOnly);

        let sink = CollectSink::shared();
        observer.on_listen(sink.clone()).unwrap();

        driver.fire(ChargeState::NotCharging);
        assert_eq!(sink.events(), vec![unavailable_event()]);
    }

    #[test]
    fn cancel_stops_emissions() {
        let (watch, driver) = MockWatch::with_state(ChargeState::Discharging);
        let mut observer = ChargingObserver::new(watch, EmitPolicy::OnChangeOnly);

        let sink = CollectSink::shared();
        observer.on_listen(sink.clone()).unwrap();
        observer.on_cancel();

        assert!(!observer.is_listening());
        driver.fire(ChargeState::Charging);
        assert!(sink.events().is_empty());
    }

    #[test]
    fn cancel_is_idempotent() {
        let (watch, _driver) = MockWatch::with_state(ChargeState::Discharging);
        let mut observer = ChargingObserver::new(watch, EmitPolicy::OnChangeOnly);

        let sink = CollectSink::shared();
        observer.on_listen(sink).unwrap();
        observer.on_cancel();
        observer.on_cancel();
        assert!(!observer.is_listening());

        // Cancel while never having listened is also a no-op.
        let (watch, _driver) = MockWatch::with_state(ChargeState::Discharging);
        let mut idle = ChargingObserver::<MockWatch>::new(watch, EmitPolicy::OnChangeOnly);
        idle.on_cancel();
        assert!(!idle.is_listening());
    }

    #[test]
    fn listen_then_immediately_cancel_emits_at_most_the_snapshot() {
        let (watch, driver) = MockWatch::with_state(ChargeState::Full);
        let mut observer = ChargingObserver::new(watch, EmitPolicy::InitialSnapshot);

        let sink = CollectSink::shared();
        observer.on_listen(sink.clone()).unwrap();
        observer.on_cancel();

        driver.fire(ChargeState::Charging);
        assert_eq!(sink.events(), vec![StreamEvent::State(ChargingState::Full)]);
    }

    #[test]
    fn notification_while_idle_is_dropped() {
        let (watch, driver) = MockWatch::with_state(ChargeState::Discharging);
        let observer = ChargingObserver::new(watch, EmitPolicy::InitialSnapshot);

        driver.fire(ChargeState::Charging);
        assert!(!observer.is_listening());
    }

    #[test]
    fn listen_while_listening_replaces_the_subscriber() {
        let (watch, driver) = MockWatch::with_state(ChargeState::Discharging);
        let mut observer = ChargingObserver::new(watch, EmitPolicy::OnChangeOnly);

        let first = CollectSink::shared();
        let second = CollectSink::shared();
        observer.on_listen(first.clone()).unwrap();
        observer.on_listen(second.clone()).unwrap();

        driver.fire(ChargeState::Charging);
        assert!(first.events().is_empty());
        assert_eq!(
            second.events(),
            vec![StreamEvent::State(ChargingState::Charging)]
        );
    }
}
