//! Charge-state change subscription.
//!
//! Desktop OSes expose no portable battery broadcast, so the system watcher
//! polls `starship-battery` on an interval and fires its callback only when
//! the observed state actually changes.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use color_eyre::eyre::Result;
use starship_battery::Manager;

use crate::types::ChargeState;

/// Callback invoked with the new state on every observed change.
pub type ChangeCallback = Box<dyn Fn(ChargeState) + Send + 'static>;

/// Charge-state snapshots plus a change subscription.
///
/// Dropping the returned handle deregisters the subscription; no further
/// callbacks fire after that.
pub trait ChargeWatch {
    type Handle;

    /// Snapshot of the current charge state.
    fn current(&mut self) -> Result<ChargeState>;

    /// Register a change callback. At most one subscription is active per
    /// watch; the caller is responsible for dropping the previous handle
    /// before subscribing again.
    fn subscribe(&mut self, callback: ChangeCallback) -> Result<Self::Handle>;
}

/// Polling watcher over the system battery.
pub struct PollWatch {
    interval: Duration,
    manager: Manager,
}

impl PollWatch {
    pub fn new(interval: Duration) -> Result<Self> {
        Ok(Self {
            interval,
            manager: Manager::new()?,
        })
    }
}

fn read_state(manager: &Manager) -> ChargeState {
    manager
        .batteries()
        .ok()
        .and_then(|mut batteries| batteries.next())
        .and_then(|battery| battery.ok())
        .map(|battery| ChargeState::from(battery.state()))
        .unwrap_or(ChargeState::Unknown)
}

impl ChargeWatch for PollWatch {
    type Handle = PollHandle;

    fn current(&mut self) -> Result<ChargeState> {
        Ok(read_state(&self.manager))
    }

    fn subscribe(&mut self, callback: ChangeCallback) -> Result<Self::Handle> {
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = Arc::clone(&stop);
        let interval = self.interval;

        let thread = thread::Builder::new()
            .name("charge-watch".to_string())
            .spawn(move || {
                let manager = match Manager::new() {
                    Ok(manager) => manager,
                    Err(_) => return,
                };

                let mut last = read_state(&manager);
                while !stop_flag.load(Ordering::Relaxed) {
                    thread::sleep(interval);

                    let state = read_state(&manager);
                    if state == last {
                        continue;
                    }
                    last = state;

                    // Checked again right before emission so a dropped handle
                    // suppresses events from an in-flight poll.
                    if stop_flag.load(Ordering::Relaxed) {
                        break;
                    }
                    callback(state);
                }
            })?;

        Ok(PollHandle {
            stop,
            thread: Some(thread),
        })
    }
}

/// Active polling subscription. Dropping it stops the polling thread.
pub struct PollHandle {
    stop: Arc<AtomicBool>,
    thread: Option<thread::JoinHandle<()>>,
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        // The thread exits on its next tick; detach rather than block drop
        // for up to a full poll interval.
        self.thread.take();
    }
}
