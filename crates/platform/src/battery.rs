//! One-shot battery level reads.

use color_eyre::eyre::Result;
use starship_battery::units::ratio::percent;
use starship_battery::Manager;

/// Sentinel returned when no usable battery level can be read.
pub const LEVEL_UNAVAILABLE: i32 = -1;

/// Source of one-shot battery level reads.
///
/// A read returns the charge percentage in `[0, 100]`, or
/// [`LEVEL_UNAVAILABLE`] when the platform has no usable value. Errors are
/// reserved for the platform API itself failing.
pub trait BatterySource {
    fn level_percent(&mut self) -> Result<i32>;
}

/// System battery source backed by `starship-battery`.
pub struct SystemBattery {
    manager: Manager,
}

impl SystemBattery {
    pub fn new() -> Result<Self> {
        Ok(Self {
            manager: Manager::new()?,
        })
    }

    /// Check if a battery is available on this system.
    pub fn is_available() -> bool {
        Manager::new()
            .ok()
            .and_then(|m| m.batteries().ok())
            .and_then(|mut b| b.next())
            .and_then(|b| b.ok())
            .is_some()
    }
}

impl BatterySource for SystemBattery {
    fn level_percent(&mut self) -> Result<i32> {
        let battery = match self.manager.batteries()?.next() {
            Some(battery) => battery?,
            None => return Ok(LEVEL_UNAVAILABLE),
        };

        let level = battery.state_of_charge().get::<percent>();
        if !level.is_finite() {
            return Ok(LEVEL_UNAVAILABLE);
        }
        Ok(level.round().clamp(0.0, 100.0) as i32)
    }
}
