//! Mock platform sources shared by the test modules.

use std::sync::{Arc, Mutex};

use color_eyre::eyre::{eyre, Result};

use limit_battery_platform::{BatterySource, ChangeCallback, ChargeState, ChargeWatch};

use crate::sink::{EventSink, StreamEvent};

/// Battery source returning a fixed raw reading, or failing outright.
pub(crate) struct MockSource {
    level: i32,
    fail: bool,
}

impl MockSource {
    pub(crate) fn level(level: i32) -> Self {
        Self { level, fail: false }
    }

    pub(crate) fn failing() -> Self {
        Self {
            level: 0,
            fail: true,
        }
    }
}

impl BatterySource for MockSource {
    fn level_percent(&mut self) -> Result<i32> {
        if self.fail {
            return Err(eyre!("battery read failed"));
        }
        Ok(self.level)
    }
}

type CallbackSlot = Arc<Mutex<Option<ChangeCallback>>>;

/// Charge watch whose notifications are fired by hand through [`WatchDriver`].
pub(crate) struct MockWatch {
    current: Arc<Mutex<ChargeState>>,
    slot: CallbackSlot,
}

impl MockWatch {
    pub(crate) fn with_state(state: ChargeState) -> (Self, WatchDriver) {
        let current = Arc::new(Mutex::new(state));
        let slot: CallbackSlot = Arc::new(Mutex::new(None));
        let driver = WatchDriver {
            current: Arc::clone(&current),
            slot: Arc::clone(&slot),
        };
        (Self { current, slot }, driver)
    }
}

impl ChargeWatch for MockWatch {
    type Handle = MockHandle;

    fn current(&mut self) -> Result<ChargeState> {
        Ok(*self.current.lock().unwrap())
    }

    fn subscribe(&mut self, callback: ChangeCallback) -> Result<Self::Handle> {
        *self.slot.lock().unwrap() = Some(callback);
        Ok(MockHandle {
            slot: Arc::clone(&self.slot),
        })
    }
}

/// Deregisters the mock subscription on drop, like the real handle.
pub(crate) struct MockHandle {
    slot: CallbackSlot,
}

impl Drop for MockHandle {
    fn drop(&mut self) {
        self.slot.lock().unwrap().take();
    }
}

/// Test-side handle simulating the OS notification source.
pub(crate) struct WatchDriver {
    current: Arc<Mutex<ChargeState>>,
    slot: CallbackSlot,
}

impl WatchDriver {
    /// Deliver one notification; dropped silently when nothing is subscribed.
    pub(crate) fn fire(&self, state: ChargeState) {
        *self.current.lock().unwrap() = state;
        if let Some(callback) = &*self.slot.lock().unwrap() {
            callback(state);
        }
    }
}

/// Sink collecting every emission for assertions.
pub(crate) struct CollectSink {
    events: Mutex<Vec<StreamEvent>>,
}

impl CollectSink {
    pub(crate) fn shared() -> Arc<Self> {
        Arc::new(Self {
            events: Mutex::new(Vec::new()),
        })
    }

    pub(crate) fn events(&self) -> Vec<StreamEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl EventSink for CollectSink {
    fn emit(&self, event: StreamEvent) {
        self.events.lock().unwrap().push(event);
    }
}
