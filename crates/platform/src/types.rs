use std::fmt;

/// Raw charge state as reported by the OS layer.
///
/// This is a superset of what the bridge can translate: only `Charging`,
/// `Full` and `Discharging` are translatable; `NotCharging` and `Unknown`
/// surface as unavailable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChargeState {
    /// Battery is actively charging
    Charging,
    /// Battery is discharging (on battery power)
    Discharging,
    /// Battery is full
    Full,
    /// External power connected but not charging (e.g., charge limit reached)
    NotCharging,
    /// State cannot be determined
    #[default]
    Unknown,
}

impl ChargeState {
    /// Returns a human-readable label for the charge state.
    pub fn label(&self) -> &'static str {
        match self {
            ChargeState::Charging => "Charging",
            ChargeState::Discharging => "Discharging",
            ChargeState::Full => "Full",
            ChargeState::NotCharging => "Not Charging",
            ChargeState::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for ChargeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl From<starship_battery::State> for ChargeState {
    fn from(state: starship_battery::State) -> Self {
        match state {
            starship_battery::State::Charging => ChargeState::Charging,
            starship_battery::State::Discharging => ChargeState::Discharging,
            starship_battery::State::Empty => ChargeState::Discharging,
            starship_battery::State::Full => ChargeState::Full,
            starship_battery::State::Unknown => ChargeState::Unknown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_charge_state_labels() {
        assert_eq!(ChargeState::Charging.label(), "Charging");
        assert_eq!(ChargeState::Discharging.label(), "Discharging");
        assert_eq!(ChargeState::Full.label(), "Full");
        assert_eq!(ChargeState::NotCharging.label(), "Not Charging");
        assert_eq!(ChargeState::Unknown.label(), "Unknown");
    }

    #[test]
    fn test_battery_state_conversion() {
        assert_eq!(
            ChargeState::from(starship_battery::State::Charging),
            ChargeState::Charging
        );
        assert_eq!(
            ChargeState::from(starship_battery::State::Discharging),
            ChargeState::Discharging
        );
        assert_eq!(
            ChargeState::from(starship_battery::State::Empty),
            ChargeState::Discharging
        );
        assert_eq!(
            ChargeState::from(starship_battery::State::Full),
            ChargeState::Full
        );
        assert_eq!(
            ChargeState::from(starship_battery::State::Unknown),
            ChargeState::Unknown
        );
    }
}
