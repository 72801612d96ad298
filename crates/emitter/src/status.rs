//! Status indicator outputs.
//!
//! The "syncing" LED mirrors the arbitrator's `active` flag and the standby
//! LED shows the host link is up. The between-frames LED is owned by the
//! pulse engine because it toggles from the compare interrupts.

use platform::OutputPin;

/// Liveness transition reported by [`crate::SyncArbitrator::update`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StatusChange {
    /// First poll after a frame started from an inactive state.
    Activated,
    /// No frame within the liveness window.
    TimedOut,
    /// `active` was cleared by a mode change.
    Deactivated,
}

impl StatusChange {
    /// Level of the syncing LED after this change.
    pub const fn syncing(self) -> bool {
        matches!(self, Self::Activated)
    }
}

/// Syncing and standby LEDs, both active-high.
pub struct StatusLeds<P> {
    syncing: P,
    standby: P,
}

impl<P: OutputPin> StatusLeds<P> {
    /// Both LEDs off.
    pub fn new(mut syncing: P, mut standby: P) -> Result<Self, P::Error> {
        syncing.set_low()?;
        standby.set_low()?;
        Ok(Self { syncing, standby })
    }

    /// Reflect a liveness transition.
    pub fn apply(&mut self, change: StatusChange) -> Result<(), P::Error> {
        self.syncing.set_state(change.syncing().into())
    }

    /// Light the standby LED while the host link is up.
    pub fn set_link_up(&mut self, up: bool) -> Result<(), P::Error> {
        self.standby.set_state(up.into())
    }

    /// The syncing LED.
    pub fn syncing(&self) -> &P {
        &self.syncing
    }

    /// The standby LED.
    pub fn standby(&self) -> &P {
        &self.standby
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use platform::mocks::MockPin;

    #[test]
    fn test_syncing_led_follows_changes() {
        let mut leds = StatusLeds::new(MockPin::default(), MockPin::default()).unwrap();
        leds.apply(StatusChange::Activated).unwrap();
        assert!(leds.syncing().is_set_high());
        leds.apply(StatusChange::TimedOut).unwrap();
        assert!(!leds.syncing().is_set_high());
        leds.apply(StatusChange::Activated).unwrap();
        leds.apply(StatusChange::Deactivated).unwrap();
        assert!(!leds.syncing().is_set_high());
        assert_eq!(leds.syncing().rising_edges(), 2);
    }

    #[test]
    fn test_standby_led() {
        let mut leds = StatusLeds::new(MockPin::default(), MockPin::default()).unwrap();
        leds.set_link_up(true).unwrap();
        assert!(leds.standby().is_set_high());
    }
}
