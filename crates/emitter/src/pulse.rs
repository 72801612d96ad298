//! Pulse cursor engine.
//!
//! Streams one token's samples onto the IR line through chained compare
//! events of a [`PulseTimer`]. The chain is an explicit state machine:
//!
//! ```text
//!            begin_token                 rising edge
//!   Idle ─────────────────→ AwaitingPan ─────────────→ TransmittingMark
//!    ↑                                                   │        ↑
//!    │ end of frame / cancel                falling edge │        │ rising edge
//!    └───────────────────────────────── TransmittingSpace ←───────┘
//! ```
//!
//! Every compare value is the previous compare value plus the next sample,
//! never a re-read of the counter, so interrupt latency does not accumulate
//! and a token lasts exactly `sum(samples) * 2` ticks.
//!
//! The handlers run in interrupt context on hardware. They do not log and
//! they do constant work per edge.

use core::fmt;

use platform::{Edge, OutputPin, PulseTimer, Ticks};

use crate::config::{ConfigError, TimingConfig};
use crate::protocol::{Protocol, ProtocolError, TokenIndex};
use crate::sequencer::{self, TokenEnd};
use crate::sync::FrameStart;

/// Where the interrupt chain currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PulsePhase {
    /// Timer stopped, nothing armed.
    #[default]
    Idle,
    /// Rising edge armed at the end of the pan or the frame gap.
    AwaitingPan,
    /// IR high, falling edge armed.
    TransmittingMark,
    /// IR low between two marks, rising edge armed.
    TransmittingSpace,
}

/// Counters for events the engine ignores or completes.
///
/// All counters wrap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PulseStats {
    /// Tokens whose transmission began (including chained closing tokens).
    pub tokens_started: u32,
    /// Samples consumed, one per compare event that programmed a duration.
    pub samples_emitted: u32,
    /// `begin_token` calls for absent slots.
    pub tokens_rejected: u32,
    /// Frames that ran to the end of their last token.
    pub frames_completed: u32,
    /// Frames dropped by `cancel` or replaced by a new `begin_token`.
    pub frames_cancelled: u32,
    /// Compare events that arrived in a phase that does not expect them.
    pub spurious_edges: u32,
}

/// Errors from engine construction or from driving the output pins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EngineError<E> {
    /// Output pin could not be driven.
    Pin(E),
    /// Protocol table failed validation.
    Protocol(ProtocolError),
    /// Timing configuration failed validation.
    Config(ConfigError),
}

#[cfg(feature = "std")]
impl<E: fmt::Debug + fmt::Display> std::error::Error for EngineError<E> {}

impl<E: fmt::Display> fmt::Display for EngineError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pin(e) => write!(f, "output pin error: {e}"),
            Self::Protocol(e) => write!(f, "{e}"),
            Self::Config(e) => write!(f, "{e}"),
        }
    }
}

/// Sample window of the token in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Cursor {
    token: TokenIndex,
    next: usize,
    end: usize,
}

impl Cursor {
    const fn is_exhausted(&self) -> bool {
        self.next >= self.end
    }
}

/// Drives the IR output line from a protocol table.
///
/// `ir` is high during marks. `frame_led` is the between-frames indicator:
/// high while a frame is being transmitted, low once it completes.
pub struct PulseEngine<T, P> {
    protocol: &'static Protocol,
    timing: TimingConfig,
    timer: T,
    ir: P,
    frame_led: P,
    phase: PulsePhase,
    cursor: Option<Cursor>,
    last_compare: Ticks,
    stats: PulseStats,
}

impl<T, P> PulseEngine<T, P>
where
    T: PulseTimer,
    P: OutputPin,
{
    /// Create an idle engine. The protocol and timing are validated here.
    ///
    /// The timer is halted and the IR line driven low.
    pub fn new(
        protocol: &'static Protocol,
        timing: TimingConfig,
        timer: T,
        ir: P,
        frame_led: P,
    ) -> Result<Self, EngineError<P::Error>> {
        protocol.validate().map_err(EngineError::Protocol)?;
        timing.validate().map_err(EngineError::Config)?;

        let mut engine = Self {
            protocol,
            timing,
            timer,
            ir,
            frame_led,
            phase: PulsePhase::Idle,
            cursor: None,
            last_compare: Ticks::ZERO,
            stats: PulseStats::default(),
        };
        engine.timer.halt();
        engine.ir.set_low().map_err(EngineError::Pin)?;
        Ok(engine)
    }

    /// Start the opening token of a frame authorized by the sync arbitrator.
    pub fn begin_frame(&mut self, start: FrameStart) -> Result<bool, EngineError<P::Error>> {
        self.begin_token(start.token)
    }

    /// Arm `token` to start after the pan.
    ///
    /// Returns `Ok(false)` without touching the hardware when the slot is
    /// absent. A chain still in flight is replaced; callers keep frame
    /// starts further apart than the longest frame.
    pub fn begin_token(&mut self, token: TokenIndex) -> Result<bool, EngineError<P::Error>> {
        let slot = self.protocol.slot(token);
        if !slot.is_present() {
            self.stats.tokens_rejected = self.stats.tokens_rejected.wrapping_add(1);
            return Ok(false);
        }
        if self.phase != PulsePhase::Idle {
            self.stats.frames_cancelled = self.stats.frames_cancelled.wrapping_add(1);
        }

        self.ir.set_low().map_err(EngineError::Pin)?;
        self.load(token);
        self.timer.restart();
        self.last_compare = self.timing.pan();
        self.timer.schedule(Edge::Rising, self.last_compare);
        self.phase = PulsePhase::AwaitingPan;
        self.frame_led.set_high().map_err(EngineError::Pin)?;
        Ok(true)
    }

    /// Dispatch a compare event.
    pub fn on_compare(&mut self, edge: Edge) -> Result<(), EngineError<P::Error>> {
        match edge {
            Edge::Rising => self.on_rising_edge(),
            Edge::Falling => self.on_falling_edge(),
        }
    }

    /// Compare A: start a mark.
    pub fn on_rising_edge(&mut self) -> Result<(), EngineError<P::Error>> {
        if !matches!(
            self.phase,
            PulsePhase::AwaitingPan | PulsePhase::TransmittingSpace
        ) {
            self.stats.spurious_edges = self.stats.spurious_edges.wrapping_add(1);
            return Ok(());
        }

        match self.take_sample() {
            Some(duration) => {
                self.ir.set_high().map_err(EngineError::Pin)?;
                self.arm(Edge::Falling, duration);
                self.phase = PulsePhase::TransmittingMark;
                Ok(())
            }
            // Token ended on a space.
            None => self.end_of_token(),
        }
    }

    /// Compare B: end a mark, then continue the token, chain or end the frame.
    pub fn on_falling_edge(&mut self) -> Result<(), EngineError<P::Error>> {
        if self.phase != PulsePhase::TransmittingMark {
            self.stats.spurious_edges = self.stats.spurious_edges.wrapping_add(1);
            return Ok(());
        }

        self.ir.set_low().map_err(EngineError::Pin)?;
        match self.take_sample() {
            Some(duration) => {
                self.arm(Edge::Rising, duration);
                self.phase = PulsePhase::TransmittingSpace;
                Ok(())
            }
            None => self.end_of_token(),
        }
    }

    fn end_of_token(&mut self) -> Result<(), EngineError<P::Error>> {
        let Some(cursor) = self.cursor else {
            return self.finish_frame();
        };
        match sequencer::next_step(self.protocol, cursor.token) {
            TokenEnd::Chain(next) => {
                self.load(next);
                self.arm(Edge::Rising, self.timing.frame_gap());
                self.phase = PulsePhase::AwaitingPan;
                Ok(())
            }
            TokenEnd::EndFrame => self.finish_frame(),
        }
    }

    /// Abort any chain: stop the timer, drop the cursor, clear the indicator.
    pub fn cancel(&mut self) -> Result<(), EngineError<P::Error>> {
        self.timer.halt();
        if self.phase != PulsePhase::Idle {
            self.stats.frames_cancelled = self.stats.frames_cancelled.wrapping_add(1);
        }
        self.cursor = None;
        self.phase = PulsePhase::Idle;
        self.ir.set_low().map_err(EngineError::Pin)?;
        self.frame_led.set_low().map_err(EngineError::Pin)
    }

    /// Force the between-frames indicator to its inactive (high) level.
    ///
    /// Used when the sync source times out. The indicator LED is active-low,
    /// so it goes dark until the next frame completes.
    pub fn park_indicator(&mut self) -> Result<(), EngineError<P::Error>> {
        self.frame_led.set_high().map_err(EngineError::Pin)
    }

    /// Switch to another validated protocol. Any chain in flight is cancelled.
    pub fn select_protocol(
        &mut self,
        protocol: &'static Protocol,
    ) -> Result<(), EngineError<P::Error>> {
        protocol.validate().map_err(EngineError::Protocol)?;
        self.cancel()?;
        self.protocol = protocol;
        #[cfg(feature = "defmt")]
        defmt::info!("protocol: {}", protocol.name());
        Ok(())
    }

    /// Replace pan and gap. Takes effect from the next `begin_token`.
    pub fn set_timing(&mut self, timing: TimingConfig) -> Result<(), EngineError<P::Error>> {
        timing.validate().map_err(EngineError::Config)?;
        self.timing = timing;
        Ok(())
    }

    /// Current FSM phase.
    pub fn phase(&self) -> PulsePhase {
        self.phase
    }

    /// `true` while a frame is in flight.
    pub fn is_busy(&self) -> bool {
        self.phase != PulsePhase::Idle
    }

    /// Token currently being transmitted or awaited.
    pub fn current_token(&self) -> Option<TokenIndex> {
        self.cursor.map(|c| c.token)
    }

    /// Event counters.
    pub fn stats(&self) -> PulseStats {
        self.stats
    }

    /// Active protocol table.
    pub fn protocol(&self) -> &'static Protocol {
        self.protocol
    }

    /// Active timing.
    pub fn timing(&self) -> TimingConfig {
        self.timing
    }

    /// The pulse timer.
    pub fn timer(&self) -> &T {
        &self.timer
    }

    /// Mutable access to the pulse timer (virtual clock in tests).
    pub fn timer_mut(&mut self) -> &mut T {
        &mut self.timer
    }

    /// The IR output pin.
    pub fn ir(&self) -> &P {
        &self.ir
    }

    /// The between-frames indicator pin.
    pub fn frame_led(&self) -> &P {
        &self.frame_led
    }

    fn load(&mut self, token: TokenIndex) {
        let slot = self.protocol.slot(token);
        self.cursor = Some(Cursor {
            token,
            next: usize::from(slot.start),
            end: slot.end(),
        });
        self.stats.tokens_started = self.stats.tokens_started.wrapping_add(1);
    }

    /// Read the sample under the cursor and advance, as a tick duration.
    fn take_sample(&mut self) -> Option<Ticks> {
        let cursor = self.cursor.as_mut()?;
        if cursor.is_exhausted() {
            return None;
        }
        let sample = self.protocol.sample(cursor.next)?;
        cursor.next = cursor.next.saturating_add(1);
        self.stats.samples_emitted = self.stats.samples_emitted.wrapping_add(1);
        Some(Ticks::from_micros(u32::from(sample)))
    }

    fn arm(&mut self, edge: Edge, after: Ticks) {
        self.last_compare = self.last_compare.wrapping_add(after);
        self.timer.schedule(edge, self.last_compare);
    }

    fn finish_frame(&mut self) -> Result<(), EngineError<P::Error>> {
        self.timer.halt();
        self.cursor = None;
        self.phase = PulsePhase::Idle;
        self.stats.frames_completed = self.stats.frames_completed.wrapping_add(1);
        self.frame_led.set_low().map_err(EngineError::Pin)
    }
}
