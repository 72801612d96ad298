//! Host command dispatch.
//!
//! Applies one decoded [`HostCommand`] to the controller and the scratch
//! memory. The only thing the host ever gets back is a scratch read reply;
//! everything else is silent.

use emitter::{ConfigCommand, HostCommand, ScratchMemory, ScratchReply};
use platform::{InterruptMode, OutputPin, PulseTimer};

use crate::controller::{Controller, ControllerError};

/// What the link task has to do after a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Nothing.
    None,
    /// Send this scratch reply on the control endpoint.
    Reply(ScratchReply),
    /// The sync mode changed; reconfigure the sync input edge interrupt.
    TriggerChanged(Option<InterruptMode>),
}

/// Owns the scratch memory the host peeks and pokes.
#[derive(Debug, Default)]
pub struct Dispatcher {
    scratch: ScratchMemory,
}

impl Dispatcher {
    /// Fresh dispatcher with zeroed scratch memory.
    pub const fn new() -> Self {
        Self {
            scratch: ScratchMemory::new(),
        }
    }

    /// Apply `command` received at `now_ms`.
    pub fn dispatch<T, P>(
        &mut self,
        controller: &Controller<'_, T, P>,
        command: HostCommand,
        now_ms: u32,
    ) -> Result<DispatchOutcome, ControllerError<P::Error>>
    where
        T: PulseTimer,
        P: OutputPin,
    {
        match command {
            HostCommand::EyeSync(eye) => {
                controller.on_host_eye(eye, now_ms)?;
                Ok(DispatchOutcome::None)
            }
            HostCommand::Scratch(request) => Ok(self
                .scratch
                .handle(&request)
                .map_or(DispatchOutcome::None, DispatchOutcome::Reply)),
            HostCommand::Configure(config) => Self::configure(controller, config),
        }
    }

    fn configure<T, P>(
        controller: &Controller<'_, T, P>,
        config: ConfigCommand,
    ) -> Result<DispatchOutcome, ControllerError<P::Error>>
    where
        T: PulseTimer,
        P: OutputPin,
    {
        match config {
            ConfigCommand::SyncMode(mode) => controller
                .set_sync_mode(mode)
                .map(DispatchOutcome::TriggerChanged),
            ConfigCommand::SwapEyes(swap) => {
                controller.set_swap_eyes(swap);
                Ok(DispatchOutcome::None)
            }
            ConfigCommand::Protocol(id) => {
                controller.select_protocol(id)?;
                Ok(DispatchOutcome::None)
            }
            ConfigCommand::Refresh(rate) => {
                controller.set_refresh(rate)?;
                Ok(DispatchOutcome::None)
            }
        }
    }

    /// The emulated scratch regions.
    pub fn scratch(&self) -> &ScratchMemory {
        &self.scratch
    }
}
