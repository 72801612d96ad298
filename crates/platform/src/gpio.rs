//! GPIO and pin abstraction layer
//!
//! The emitter drives three outputs (IR LED, "syncing" LED, between-frames
//! LED) and samples two inputs (sync line, force line). Only the sync line
//! needs edge interrupts.

/// Input pin operations
pub trait InputPin {
    /// Error type
    type Error;

    /// Read pin state
    fn is_high(&self) -> Result<bool, Self::Error>;

    /// Read pin state (inverted)
    fn is_low(&self) -> Result<bool, Self::Error> {
        self.is_high().map(|v| !v)
    }
}

/// Output pin operations
pub trait OutputPin {
    /// Error type
    type Error;

    /// Set pin high
    fn set_high(&mut self) -> Result<(), Self::Error>;

    /// Set pin low
    fn set_low(&mut self) -> Result<(), Self::Error>;

    /// Set pin state
    fn set_state(&mut self, state: PinState) -> Result<(), Self::Error> {
        match state {
            PinState::High => self.set_high(),
            PinState::Low => self.set_low(),
        }
    }
}

/// Pin state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PinState {
    /// High (logic 1)
    High,
    /// Low (logic 0)
    Low,
}

impl From<bool> for PinState {
    fn from(value: bool) -> Self {
        if value {
            Self::High
        } else {
            Self::Low
        }
    }
}

impl From<PinState> for bool {
    fn from(value: PinState) -> Self {
        matches!(value, PinState::High)
    }
}

/// External interrupt configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InterruptMode {
    /// Trigger on rising edge
    RisingEdge,
    /// Trigger on falling edge
    FallingEdge,
    /// Trigger on both edges
    BothEdges,
}

/// Pin with interrupt capability
pub trait InterruptPin: InputPin {
    /// Enable interrupt
    fn enable_interrupt(&mut self, mode: InterruptMode) -> Result<(), Self::Error>;

    /// Disable interrupt
    fn disable_interrupt(&mut self) -> Result<(), Self::Error>;

    /// Currently enabled interrupt mode, `None` when disabled.
    fn interrupt_mode(&self) -> Option<InterruptMode>;

    /// Wait for interrupt (async)
    fn wait_for_interrupt(&mut self) -> impl core::future::Future<Output = Result<(), Self::Error>>;
}
