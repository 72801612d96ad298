//! Mock implementations for testing
//!
//! This module provides mock implementations of all platform traits
//! for use in unit and integration tests. [`MockPulseTimer`] is a virtual
//! clock: nothing happens until the test calls [`MockPulseTimer::fire_next`].

#![cfg(any(test, feature = "std"))]

use core::convert::Infallible;

use crate::*;

/// Mock output pin that counts transitions.
#[derive(Debug, Clone)]
pub struct MockPin {
    state: PinState,
    rising_edges: usize,
    falling_edges: usize,
}

impl MockPin {
    /// Create new mock pin at `initial` level
    pub fn new(initial: PinState) -> Self {
        Self {
            state: initial,
            rising_edges: 0,
            falling_edges: 0,
        }
    }

    /// Current output level
    pub fn state(&self) -> PinState {
        self.state
    }

    /// `true` when driven high
    pub fn is_set_high(&self) -> bool {
        self.state == PinState::High
    }

    /// Number of LOW→HIGH transitions so far
    pub fn rising_edges(&self) -> usize {
        self.rising_edges
    }

    /// Number of HIGH→LOW transitions so far
    pub fn falling_edges(&self) -> usize {
        self.falling_edges
    }
}

impl Default for MockPin {
    fn default() -> Self {
        Self::new(PinState::Low)
    }
}

impl OutputPin for MockPin {
    type Error = Infallible;

    fn set_high(&mut self) -> Result<(), Self::Error> {
        if self.state == PinState::Low {
            self.rising_edges += 1;
        }
        self.state = PinState::High;
        Ok(())
    }

    fn set_low(&mut self) -> Result<(), Self::Error> {
        if self.state == PinState::High {
            self.falling_edges += 1;
        }
        self.state = PinState::Low;
        Ok(())
    }
}

/// Mock input pin with optional edge interrupt
#[derive(Debug, Clone, Default)]
pub struct MockInputPin {
    high: bool,
    interrupt: Option<InterruptMode>,
}

impl MockInputPin {
    /// Create new mock input reading `high`
    pub fn new(high: bool) -> Self {
        Self {
            high,
            interrupt: None,
        }
    }

    /// Drive the simulated line level
    pub fn set_level(&mut self, high: bool) {
        self.high = high;
    }
}

impl InputPin for MockInputPin {
    type Error = Infallible;

    fn is_high(&self) -> Result<bool, Self::Error> {
        Ok(self.high)
    }
}

impl InterruptPin for MockInputPin {
    fn enable_interrupt(&mut self, mode: InterruptMode) -> Result<(), Self::Error> {
        self.interrupt = Some(mode);
        Ok(())
    }

    fn disable_interrupt(&mut self) -> Result<(), Self::Error> {
        self.interrupt = None;
        Ok(())
    }

    fn interrupt_mode(&self) -> Option<InterruptMode> {
        self.interrupt
    }

    async fn wait_for_interrupt(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Virtual-clock pulse timer.
///
/// The counter only moves when [`fire_next`](Self::fire_next) jumps it to
/// the armed compare value, so a test observes every edge at its exact
/// scheduled tick.
#[derive(Debug, Clone, Default)]
pub struct MockPulseTimer {
    now: Ticks,
    running: bool,
    armed: Option<(Edge, Ticks)>,
    restarts: usize,
    halts: usize,
}

impl MockPulseTimer {
    /// Create a stopped timer at tick zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Armed edge and its compare value, if any
    pub fn armed(&self) -> Option<(Edge, Ticks)> {
        self.armed
    }

    /// Number of [`PulseTimer::restart`] calls
    pub fn restarts(&self) -> usize {
        self.restarts
    }

    /// Number of [`PulseTimer::halt`] calls
    pub fn halts(&self) -> usize {
        self.halts
    }

    /// Advance the counter to the armed compare value and fire it.
    ///
    /// Returns the edge whose handler the caller must now run, or `None`
    /// when the timer is stopped or nothing is armed. The fired edge is
    /// disarmed; the handler is expected to schedule the next one.
    pub fn fire_next(&mut self) -> Option<Edge> {
        if !self.running {
            return None;
        }
        let (edge, at) = self.armed.take()?;
        self.now = at;
        Some(edge)
    }
}

impl PulseTimer for MockPulseTimer {
    fn restart(&mut self) {
        self.now = Ticks::ZERO;
        self.running = true;
        self.restarts += 1;
    }

    fn halt(&mut self) {
        self.running = false;
        self.armed = None;
        self.halts += 1;
    }

    fn schedule(&mut self, edge: Edge, at: Ticks) {
        self.armed = Some((edge, at));
    }

    fn now(&self) -> Ticks {
        self.now
    }

    fn is_running(&self) -> bool {
        self.running
    }
}
