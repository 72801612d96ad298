//! Embassy GPIO behind the `platform` pin traits.
//!
//! # Pin assignments (NUCLEO-H743ZI)
//!
//! | Signal              | MCU pin | Notes                                  |
//! |---------------------|---------|----------------------------------------|
//! | IR emitter          | PC6     | Push-pull, very high speed, high = mark |
//! | Syncing LED         | PB0     | LD1, mirrors `active`                  |
//! | Between-frames LED  | PE1     | LD2, active low                        |
//! | Standby LED         | PB14    | LD3, lit once the host link is up      |
//! | Sync input          | PA3     | EXTI3, level high = left eye           |
//! | Force input         | PA4     | Active low, internal pull-up           |
//! | Host UART TX / RX   | PD8/PD9 | USART3, ST-LINK virtual COM port       |

use core::convert::Infallible;

use embassy_stm32::exti::ExtiInput;
use embassy_stm32::gpio::{AnyPin, Input, Output};
use platform::{InputPin, InterruptMode, InterruptPin, OutputPin};

/// Push-pull output (IR line and LEDs).
pub struct PushPull(Output<'static, AnyPin>);

impl PushPull {
    /// Wrap a configured output.
    pub fn new(pin: Output<'static, AnyPin>) -> Self {
        Self(pin)
    }
}

impl OutputPin for PushPull {
    type Error = Infallible;

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.0.set_high();
        Ok(())
    }

    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.0.set_low();
        Ok(())
    }
}

/// Level-only input (force line).
pub struct LevelInput(Input<'static, AnyPin>);

impl LevelInput {
    /// Wrap a configured input.
    pub fn new(pin: Input<'static, AnyPin>) -> Self {
        Self(pin)
    }
}

impl InputPin for LevelInput {
    type Error = Infallible;

    fn is_high(&self) -> Result<bool, Self::Error> {
        Ok(self.0.is_high())
    }
}

/// EXTI-backed input (sync line).
///
/// EXTI lines cannot be masked through the embassy API, so "disabled" means
/// [`wait_for_interrupt`](InterruptPin::wait_for_interrupt) never completes.
pub struct EdgeInput {
    exti: ExtiInput<'static, AnyPin>,
    mode: Option<InterruptMode>,
}

impl EdgeInput {
    /// Wrap an EXTI input, interrupt disabled.
    pub fn new(exti: ExtiInput<'static, AnyPin>) -> Self {
        Self { exti, mode: None }
    }
}

impl InputPin for EdgeInput {
    type Error = Infallible;

    fn is_high(&self) -> Result<bool, Self::Error> {
        Ok(self.exti.is_high())
    }
}

impl InterruptPin for EdgeInput {
    fn enable_interrupt(&mut self, mode: InterruptMode) -> Result<(), Self::Error> {
        self.mode = Some(mode);
        Ok(())
    }

    fn disable_interrupt(&mut self) -> Result<(), Self::Error> {
        self.mode = None;
        Ok(())
    }

    fn interrupt_mode(&self) -> Option<InterruptMode> {
        self.mode
    }

    async fn wait_for_interrupt(&mut self) -> Result<(), Self::Error> {
        match self.mode {
            Some(InterruptMode::RisingEdge) => self.exti.wait_for_rising_edge().await,
            Some(InterruptMode::FallingEdge) => self.exti.wait_for_falling_edge().await,
            Some(InterruptMode::BothEdges) => self.exti.wait_for_any_edge().await,
            None => core::future::pending::<()>().await,
        }
        Ok(())
    }
}
