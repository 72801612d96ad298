//! External sync input handling.
//!
//! The sync line is level-sensitive: an edge only says "look now", and the
//! level read right after it selects the eye (high = left). The force line
//! is active low and lets the edge stage an eye even in `Combined` mode.

use platform::{InputPin, InterruptMode, InterruptPin, OutputPin, PulseTimer};

use crate::controller::{Controller, ControllerError};

/// Line levels sampled after a sync edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EdgeSample {
    /// Sync line level; high selects the left eye.
    pub level_high: bool,
    /// Force line asserted (pin low).
    pub force: bool,
}

impl EdgeSample {
    /// Read both lines.
    pub fn read<S, F>(sync: &S, force: &F) -> Result<Self, S::Error>
    where
        S: InputPin,
        F: InputPin<Error = S::Error>,
    {
        Ok(Self {
            level_high: sync.is_high()?,
            force: force.is_low()?,
        })
    }
}

/// Point the sync input's edge interrupt at `trigger`, disabling it on `None`.
pub fn configure_trigger<S: InterruptPin>(
    pin: &mut S,
    trigger: Option<InterruptMode>,
) -> Result<(), S::Error> {
    match trigger {
        Some(mode) => pin.enable_interrupt(mode),
        None => pin.disable_interrupt(),
    }
}

/// Feed one sampled edge to the controller. Returns `true` when it started
/// a frame.
pub fn handle_edge<T, P>(
    controller: &Controller<'_, T, P>,
    sample: EdgeSample,
    now_ms: u32,
) -> Result<bool, ControllerError<P::Error>>
where
    T: PulseTimer,
    P: OutputPin,
{
    controller
        .on_sync_edge(sample.level_high, sample.force, now_ms)
        .map(|start| start.is_some())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use platform::mocks::MockInputPin;

    #[test]
    fn test_force_is_active_low() {
        let sync = MockInputPin::new(true);
        let force = MockInputPin::new(false);
        let sample = EdgeSample::read(&sync, &force).unwrap();
        assert_eq!(
            sample,
            EdgeSample {
                level_high: true,
                force: true
            }
        );
    }

    #[test]
    fn test_trigger_none_disables_interrupt() {
        let mut pin = MockInputPin::new(false);
        configure_trigger(&mut pin, Some(InterruptMode::BothEdges)).unwrap();
        assert_eq!(pin.interrupt_mode(), Some(InterruptMode::BothEdges));
        configure_trigger(&mut pin, None).unwrap();
        assert_eq!(pin.interrupt_mode(), None);
    }
}
