//! Sync source arbitration and liveness.
//!
//! Turns asynchronous triggers (external sync edge, host eye packet,
//! free-run poll) into authorized frame starts, admitting only the sources
//! the current [`SyncMode`] allows.
//!
//! # Staging
//!
//! [`SyncArbitrator::set_eye`] stages the next eye and marks the arbitrator
//! `synced`. [`SyncArbitrator::start_frame`] consumes that staged eye. Under
//! [`SyncMode::Combined`] the host stages and the external edge authorizes;
//! in the single-source modes one trigger does both.
//!
//! # Concurrency
//!
//! Every field is an atomic and every method takes `&self`, so one
//! `static SyncArbitrator` is shared by the external-edge interrupt and the
//! main loop without a lock. Timestamps are `u32` milliseconds compared with
//! wrapping subtraction.

use core::sync::atomic::{AtomicBool, AtomicU32, AtomicU8, Ordering};

use platform::InterruptMode;

use crate::config::{FREERUN_PERIOD_MS, SYNC_TIMEOUT_MS};
use crate::eye::Eye;
use crate::protocol::TokenIndex;
use crate::status::StatusChange;

/// Which trigger sources may start frames.
///
/// `Combined` is `Driver | External` in the legacy bit encoding; `FreeRun`
/// excludes every other source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum SyncMode {
    /// No source; the emitter stays dark.
    None = 0,
    /// Host eye packets start frames.
    Driver = 1,
    /// External sync edges pick the eye and start frames.
    External = 2,
    /// Host stages the eye, the external edge starts the frame.
    #[default]
    Combined = 3,
    /// Internal 9 ms clock alternates eyes.
    FreeRun = 4,
}

impl SyncMode {
    /// Mode for a legacy bit encoding.
    pub const fn from_bits(bits: u8) -> Option<Self> {
        match bits {
            0 => Some(Self::None),
            1 => Some(Self::Driver),
            2 => Some(Self::External),
            3 => Some(Self::Combined),
            4 => Some(Self::FreeRun),
            _ => None,
        }
    }

    /// Legacy bit encoding.
    pub const fn bits(self) -> u8 {
        self as u8
    }

    /// `true` for modes that listen to the external sync edge.
    pub const fn requires_external(self) -> bool {
        matches!(self, Self::External | Self::Combined)
    }

    /// `true` for modes that accept host eye packets.
    pub const fn requires_driver(self) -> bool {
        matches!(self, Self::Driver | Self::Combined)
    }

    /// Edge interrupt the sync input needs in this mode, `None` = disabled.
    pub const fn external_trigger(self) -> Option<InterruptMode> {
        if self.requires_external() {
            Some(InterruptMode::BothEdges)
        } else {
            None
        }
    }

    /// Short name for logs.
    pub const fn name(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Driver => "driver",
            Self::External => "external",
            Self::Combined => "combined",
            Self::FreeRun => "freerun",
        }
    }
}

/// A frame the caller must now transmit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FrameStart {
    /// Eye the frame opens (after swapping).
    pub eye: Eye,
    /// Opening token for that eye.
    pub token: TokenIndex,
}

/// Result of one [`SyncArbitrator::update`] poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SyncUpdate {
    /// Free-run frame due now.
    pub frame: Option<FrameStart>,
    /// Liveness transition to reflect on the status LEDs.
    pub status: Option<StatusChange>,
}

/// Counts of triggers dropped because the mode does not admit them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct IgnoredTriggers {
    /// External edges outside `External`/`Combined`.
    pub external: u32,
    /// Host eye packets outside `Driver`/`Combined`.
    pub host: u32,
}

/// Shared frame/eye state and trigger admission.
pub struct SyncArbitrator {
    mode: AtomicU8,
    swap_eyes: AtomicBool,
    current_eye: AtomicU8,
    next_eye: AtomicU8,
    synced: AtomicBool,
    active: AtomicBool,
    active_reported: AtomicBool,
    last_frame_ms: AtomicU32,
    frames_started: AtomicU32,
    ignored_external: AtomicU32,
    ignored_host: AtomicU32,
}

impl Default for SyncArbitrator {
    fn default() -> Self {
        Self::new(SyncMode::default())
    }
}

impl SyncArbitrator {
    /// Arbitrator in `mode`, right eye, nothing staged, inactive.
    pub const fn new(mode: SyncMode) -> Self {
        Self {
            mode: AtomicU8::new(mode.bits()),
            swap_eyes: AtomicBool::new(false),
            current_eye: AtomicU8::new(Eye::Right.as_u8()),
            next_eye: AtomicU8::new(Eye::Right.as_u8()),
            synced: AtomicBool::new(false),
            active: AtomicBool::new(false),
            active_reported: AtomicBool::new(false),
            last_frame_ms: AtomicU32::new(0),
            frames_started: AtomicU32::new(0),
            ignored_external: AtomicU32::new(0),
            ignored_host: AtomicU32::new(0),
        }
    }

    /// Current mode.
    pub fn mode(&self) -> SyncMode {
        SyncMode::from_bits(self.mode.load(Ordering::Acquire)).unwrap_or(SyncMode::None)
    }

    /// Switch source. Clears `synced` and `active`.
    ///
    /// Returns the edge interrupt the sync input must be set to; the caller
    /// also cancels the pulse chain in flight.
    pub fn set_sync_mode(&self, mode: SyncMode) -> Option<InterruptMode> {
        self.mode.store(mode.bits(), Ordering::Release);
        self.synced.store(false, Ordering::Release);
        self.active.store(false, Ordering::Release);
        #[cfg(feature = "defmt")]
        defmt::info!("sync mode: {}", mode.name());
        mode.external_trigger()
    }

    /// Swap left and right for subsequently staged eyes.
    pub fn set_swap_eyes(&self, swap: bool) {
        self.swap_eyes.store(swap, Ordering::Release);
    }

    /// `true` when eyes are swapped.
    pub fn swap_eyes(&self) -> bool {
        self.swap_eyes.load(Ordering::Acquire)
    }

    /// Stage `eye` (XOR swap) for the next frame.
    pub fn set_eye(&self, eye: Eye) {
        self.stage(eye.swapped(self.swap_eyes()));
    }

    fn stage(&self, eye: Eye) {
        self.next_eye.store(eye.as_u8(), Ordering::Release);
        self.synced.store(true, Ordering::Release);
    }

    /// Consume the staged eye and authorize a frame at `now_ms`.
    pub fn start_frame(&self, now_ms: u32) -> FrameStart {
        let eye = Eye::from_u8(self.next_eye.load(Ordering::Acquire));
        self.active.store(true, Ordering::Release);
        self.current_eye.store(eye.as_u8(), Ordering::Release);
        self.last_frame_ms.store(now_ms, Ordering::Release);
        self.synced.store(false, Ordering::Release);
        self.frames_started.fetch_add(1, Ordering::AcqRel);
        FrameStart {
            eye,
            token: eye.opening_token(),
        }
    }

    /// External sync edge. `level_high` selects the left eye; `force` is the
    /// qualifying line that lets the edge stage an eye under `Combined`.
    pub fn on_external_edge(
        &self,
        level_high: bool,
        force: bool,
        now_ms: u32,
    ) -> Option<FrameStart> {
        let mode = self.mode();
        if !mode.requires_external() {
            self.ignored_external.fetch_add(1, Ordering::AcqRel);
            return None;
        }
        if mode == SyncMode::External || force {
            self.set_eye(Eye::from_bit(level_high));
        }
        if self.is_synced() {
            Some(self.start_frame(now_ms))
        } else {
            None
        }
    }

    /// Host eye packet. Starts the frame only in `Driver`; under `Combined`
    /// the eye waits for the external edge.
    pub fn on_host_eye(&self, eye: Eye, now_ms: u32) -> Option<FrameStart> {
        let mode = self.mode();
        if !mode.requires_driver() {
            self.ignored_host.fetch_add(1, Ordering::AcqRel);
            return None;
        }
        self.set_eye(eye);
        if mode == SyncMode::Driver {
            Some(self.start_frame(now_ms))
        } else {
            None
        }
    }

    /// Periodic poll: free-run frames and liveness.
    ///
    /// Must run at least once per millisecond tick. Free-run flips the
    /// current eye without applying swap, so the eyes keep alternating
    /// whatever the swap setting.
    pub fn update(&self, now_ms: u32) -> SyncUpdate {
        let mut out = SyncUpdate::default();

        if self.mode() == SyncMode::FreeRun && self.elapsed_ms(now_ms) >= FREERUN_PERIOD_MS {
            self.stage(self.current_eye().flipped());
            out.frame = Some(self.start_frame(now_ms));
        }

        if self.is_active() {
            if self.elapsed_ms(now_ms) >= SYNC_TIMEOUT_MS {
                self.active.store(false, Ordering::Release);
                self.active_reported.store(false, Ordering::Release);
                #[cfg(feature = "defmt")]
                defmt::warn!("sync lost: no frame for {} ms", self.elapsed_ms(now_ms));
                out.status = Some(StatusChange::TimedOut);
            } else if !self.active_reported.swap(true, Ordering::AcqRel) {
                out.status = Some(StatusChange::Activated);
            }
        } else if self.active_reported.swap(false, Ordering::AcqRel) {
            out.status = Some(StatusChange::Deactivated);
        }

        out
    }

    fn elapsed_ms(&self, now_ms: u32) -> u32 {
        now_ms.wrapping_sub(self.last_frame_ms.load(Ordering::Acquire))
    }

    /// Eye of the frame most recently started.
    pub fn current_eye(&self) -> Eye {
        Eye::from_u8(self.current_eye.load(Ordering::Acquire))
    }

    /// Staged eye for the next frame.
    pub fn next_eye(&self) -> Eye {
        Eye::from_u8(self.next_eye.load(Ordering::Acquire))
    }

    /// An eye is staged and not yet consumed.
    pub fn is_synced(&self) -> bool {
        self.synced.load(Ordering::Acquire)
    }

    /// A frame started within the liveness window.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Timestamp of the last frame start.
    pub fn last_frame_ms(&self) -> u32 {
        self.last_frame_ms.load(Ordering::Acquire)
    }

    /// Frames authorized since boot (wrapping).
    pub fn frames_started(&self) -> u32 {
        self.frames_started.load(Ordering::Acquire)
    }

    /// Out-of-mode trigger counters.
    pub fn ignored(&self) -> IgnoredTriggers {
        IgnoredTriggers {
            external: self.ignored_external.load(Ordering::Acquire),
            host: self.ignored_host.load(Ordering::Acquire),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_bits_round_trip() {
        for bits in 0..=4 {
            assert_eq!(SyncMode::from_bits(bits).map(SyncMode::bits), Some(bits));
        }
        assert_eq!(SyncMode::from_bits(5), None);
        assert_eq!(
            SyncMode::Combined.bits(),
            SyncMode::Driver.bits() | SyncMode::External.bits()
        );
    }

    #[test]
    fn test_capability_predicates() {
        assert!(SyncMode::Combined.requires_driver());
        assert!(SyncMode::Combined.requires_external());
        assert!(!SyncMode::FreeRun.requires_driver());
        assert!(!SyncMode::FreeRun.requires_external());
        assert!(!SyncMode::None.requires_external());
        assert_eq!(SyncMode::Driver.external_trigger(), None);
        assert_eq!(
            SyncMode::External.external_trigger(),
            Some(InterruptMode::BothEdges)
        );
    }

    #[test]
    fn test_start_frame_consumes_staged_eye() {
        let sync = SyncArbitrator::new(SyncMode::Driver);
        sync.set_eye(Eye::Left);
        assert!(sync.is_synced());
        let frame = sync.start_frame(5);
        assert_eq!(frame.eye, Eye::Left);
        assert_eq!(frame.token, TokenIndex::SLOT_2);
        assert!(!sync.is_synced());
        assert!(sync.is_active());
        assert_eq!(sync.last_frame_ms(), 5);
    }

    #[test]
    fn test_mode_change_resets_flags() {
        let sync = SyncArbitrator::new(SyncMode::Driver);
        sync.set_eye(Eye::Left);
        sync.start_frame(0);
        sync.set_eye(Eye::Right);

        assert_eq!(sync.set_sync_mode(SyncMode::FreeRun), None);
        assert!(!sync.is_synced());
        assert!(!sync.is_active());
    }

    #[test]
    fn test_host_packet_ignored_in_external_mode() {
        let sync = SyncArbitrator::new(SyncMode::External);
        assert_eq!(sync.on_host_eye(Eye::Left, 0), None);
        assert!(!sync.is_synced());
        assert_eq!(sync.ignored().host, 1);
    }

    #[test]
    fn test_edge_ignored_in_driver_mode() {
        let sync = SyncArbitrator::new(SyncMode::Driver);
        assert_eq!(sync.on_external_edge(true, false, 0), None);
        assert_eq!(sync.ignored().external, 1);
    }

    #[test]
    fn test_update_reports_activation_once() {
        let sync = SyncArbitrator::new(SyncMode::Driver);
        sync.on_host_eye(Eye::Right, 10);
        assert_eq!(sync.update(11).status, Some(StatusChange::Activated));
        assert_eq!(sync.update(12).status, None);
    }

    #[test]
    fn test_mode_reset_reports_deactivation() {
        let sync = SyncArbitrator::new(SyncMode::Driver);
        sync.on_host_eye(Eye::Right, 10);
        sync.update(11);
        sync.set_sync_mode(SyncMode::External);
        assert_eq!(sync.update(12).status, Some(StatusChange::Deactivated));
        assert_eq!(sync.update(13).status, None);
    }

    #[test]
    fn test_elapsed_wraps() {
        let sync = SyncArbitrator::new(SyncMode::Driver);
        sync.on_host_eye(Eye::Right, u32::MAX - 5);
        sync.update(u32::MAX - 4);
        // 100 ms later across the wrap: still active.
        assert_eq!(sync.update(94).status, None);
        assert!(sync.is_active());
        // 200 ms later across the wrap: timed out.
        assert_eq!(sync.update(194).status, Some(StatusChange::TimedOut));
    }
}
