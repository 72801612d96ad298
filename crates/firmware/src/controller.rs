//! Thread-side handle on the shared emitter state.
//!
//! The [`SyncArbitrator`] is atomics only and is shared by plain reference.
//! The [`PulseEngine`] is owned by the compare interrupt chain, so every
//! thread-side access goes through a short critical section on the
//! [`EngineCell`]. Both live in `static`s on hardware and on the stack in
//! tests.

use core::cell::RefCell;
use core::fmt;

use critical_section::Mutex;
use emitter::{
    EmitterConfig, EngineError, Eye, FrameStart, ProtocolId, PulseEngine, PulseStats,
    RefreshRate, StatusChange, SyncArbitrator, SyncMode, SyncUpdate, TimingConfig,
};
use platform::{Edge, InterruptMode, OutputPin, PulseTimer};

/// Engine slot shared between the compare interrupt and thread mode.
///
/// `None` until [`Controller::install`] runs at boot.
pub type EngineCell<T, P> = Mutex<RefCell<Option<PulseEngine<T, P>>>>;

/// Errors surfaced to the tasks driving the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ControllerError<E> {
    /// No engine has been installed yet.
    NotInitialized,
    /// The engine rejected the request or failed to drive a pin.
    Engine(EngineError<E>),
}

#[cfg(feature = "std")]
impl<E: fmt::Debug + fmt::Display> std::error::Error for ControllerError<E> {}

impl<E: fmt::Display> fmt::Display for ControllerError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotInitialized => write!(f, "pulse engine not installed"),
            Self::Engine(e) => write!(f, "pulse engine: {e}"),
        }
    }
}

/// Couples the arbitrator with the engine so a trigger and the frame it
/// authorizes are handled as one step.
pub struct Controller<'a, T, P> {
    sync: &'a SyncArbitrator,
    engine: &'a EngineCell<T, P>,
}

impl<T, P> Clone for Controller<'_, T, P> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T, P> Copy for Controller<'_, T, P> {}

impl<'a, T, P> Controller<'a, T, P>
where
    T: PulseTimer,
    P: OutputPin,
{
    /// Wrap the shared state.
    pub const fn new(sync: &'a SyncArbitrator, engine: &'a EngineCell<T, P>) -> Self {
        Self { sync, engine }
    }

    /// Put `engine` in the shared slot, returning the previous one.
    pub fn install(&self, engine: PulseEngine<T, P>) -> Option<PulseEngine<T, P>> {
        critical_section::with(|cs| self.engine.borrow(cs).replace(Some(engine)))
    }

    /// Run `f` on the engine inside a critical section.
    pub fn with_engine<R>(
        &self,
        f: impl FnOnce(&mut PulseEngine<T, P>) -> Result<R, EngineError<P::Error>>,
    ) -> Result<R, ControllerError<P::Error>> {
        critical_section::with(|cs| {
            let mut slot = self.engine.borrow_ref_mut(cs);
            let engine = slot.as_mut().ok_or(ControllerError::NotInitialized)?;
            f(engine).map_err(ControllerError::Engine)
        })
    }

    /// The shared arbitrator.
    pub fn sync(&self) -> &'a SyncArbitrator {
        self.sync
    }

    /// Apply a boot configuration. Returns the edge interrupt for the sync input.
    pub fn apply_config(
        &self,
        config: &EmitterConfig,
    ) -> Result<Option<InterruptMode>, ControllerError<P::Error>> {
        self.with_engine(|engine| {
            engine.select_protocol(config.protocol.table())?;
            engine.set_timing(config.timing)
        })?;
        self.sync.set_swap_eyes(config.swap_eyes);
        self.set_sync_mode(config.sync_mode)
    }

    /// Start the opening token of an authorized frame.
    pub fn begin_frame(&self, start: FrameStart) -> Result<bool, ControllerError<P::Error>> {
        self.with_engine(|engine| engine.begin_frame(start))
    }

    /// External sync edge at `now_ms`. Returns the frame it started, if any.
    pub fn on_sync_edge(
        &self,
        level_high: bool,
        force: bool,
        now_ms: u32,
    ) -> Result<Option<FrameStart>, ControllerError<P::Error>> {
        let start = self.sync.on_external_edge(level_high, force, now_ms);
        if let Some(start) = start {
            self.begin_frame(start)?;
        }
        Ok(start)
    }

    /// Host eye packet at `now_ms`. Returns the frame it started, if any.
    pub fn on_host_eye(
        &self,
        eye: Eye,
        now_ms: u32,
    ) -> Result<Option<FrameStart>, ControllerError<P::Error>> {
        let start = self.sync.on_host_eye(eye, now_ms);
        if let Some(start) = start {
            self.begin_frame(start)?;
        }
        Ok(start)
    }

    /// Compare event from the pulse timer interrupt.
    pub fn on_compare(&self, edge: Edge) -> Result<(), ControllerError<P::Error>> {
        self.with_engine(|engine| engine.on_compare(edge))
    }

    /// Switch sync source. The chain in flight is cancelled first.
    ///
    /// Returns the edge interrupt the sync input must now use.
    pub fn set_sync_mode(
        &self,
        mode: SyncMode,
    ) -> Result<Option<InterruptMode>, ControllerError<P::Error>> {
        self.with_engine(PulseEngine::cancel)?;
        Ok(self.sync.set_sync_mode(mode))
    }

    /// Swap left and right for subsequent frames.
    pub fn set_swap_eyes(&self, swap: bool) {
        self.sync.set_swap_eyes(swap);
    }

    /// Switch protocol. The chain in flight is cancelled.
    pub fn select_protocol(&self, id: ProtocolId) -> Result<(), ControllerError<P::Error>> {
        self.with_engine(|engine| engine.select_protocol(id.table()))
    }

    /// Replace pan and gap.
    pub fn set_timing(&self, timing: TimingConfig) -> Result<(), ControllerError<P::Error>> {
        self.with_engine(|engine| engine.set_timing(timing))
    }

    /// Load the pan preset for `rate`, keeping the current frame gap.
    pub fn set_refresh(&self, rate: RefreshRate) -> Result<(), ControllerError<P::Error>> {
        self.with_engine(|engine| {
            let timing = TimingConfig {
                pan_us: rate.pan_us(),
                ..engine.timing()
            };
            engine.set_timing(timing)
        })
    }

    /// Millisecond poll: start due free-run frames and track liveness.
    ///
    /// On timeout the between-frames indicator is parked. The caller
    /// reflects `status` on the status LEDs.
    pub fn poll(&self, now_ms: u32) -> Result<SyncUpdate, ControllerError<P::Error>> {
        let update = self.sync.update(now_ms);
        if let Some(start) = update.frame {
            self.begin_frame(start)?;
        }
        if update.status == Some(StatusChange::TimedOut) {
            self.with_engine(PulseEngine::park_indicator)?;
        }
        Ok(update)
    }

    /// Engine counters.
    pub fn stats(&self) -> Result<PulseStats, ControllerError<P::Error>> {
        self.with_engine(|engine| Ok(engine.stats()))
    }
}
