//! Platform battery access for limit-battery.
//!
//! This crate provides the two seams the bridge builds on:
//!
//! - [`BatterySource`] - one-shot battery level reads, with
//!   [`LEVEL_UNAVAILABLE`] as the sentinel for "no usable value".
//! - [`ChargeWatch`] - charge-state snapshots plus a change subscription
//!   whose handle deregisters on drop.
//!
//! [`SystemBattery`] and [`PollWatch`] are the system implementations over
//! `starship-battery`; the traits exist so the bridge can be driven by mocks
//! in tests.

mod battery;
mod types;
mod watch;

pub use battery::{BatterySource, SystemBattery, LEVEL_UNAVAILABLE};
pub use types::ChargeState;
pub use watch::{ChangeCallback, ChargeWatch, PollHandle, PollWatch};
