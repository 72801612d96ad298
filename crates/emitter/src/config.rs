//! Emitter configuration.
//!
//! Waveform timing and sync settings that the host may change at runtime.
//! Fixed application constants live in `platform::config`.

use core::fmt;

use platform::Ticks;

use crate::library::ProtocolId;
use crate::protocol::ProtocolError;
use crate::sync::SyncMode;

/// Free-run frame period in milliseconds (about 111 Hz).
pub const FREERUN_PERIOD_MS: u32 = 9;

/// Liveness timeout: `active` clears when no frame started for this long.
pub const SYNC_TIMEOUT_MS: u32 = 200;

/// Default pan (lead time before the first mark) in microseconds.
pub const DEFAULT_PAN_US: u32 = 3000;

/// Default gap between an opening token and its closing token in microseconds.
pub const DEFAULT_FRAME_GAP_US: u32 = 1000;

/// Upper bound for the pan.
///
/// The free-run period is 9 ms, so anything near it would overlap frames.
pub const MAX_PAN_US: u32 = 8000;

/// Upper bound for the frame gap.
pub const MAX_FRAME_GAP_US: u32 = 4000;

/// Display refresh preset selecting the pan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum RefreshRate {
    /// 120 Hz content: 3000 µs pan.
    #[default]
    Hz120 = 0,
    /// 100 Hz content: 3400 µs pan.
    Hz100 = 1,
}

impl RefreshRate {
    /// Preset for a raw configuration value.
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Hz120),
            1 => Some(Self::Hz100),
            _ => None,
        }
    }

    /// Pan for this refresh rate in microseconds.
    pub const fn pan_us(self) -> u32 {
        match self {
            Self::Hz120 => 3000,
            Self::Hz100 => 3400,
        }
    }
}

/// Configuration validation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Pan is zero or above [`MAX_PAN_US`].
    PanOutOfRange(u32),
    /// Frame gap is zero or above [`MAX_FRAME_GAP_US`].
    FrameGapOutOfRange(u32),
    /// The selected protocol table is malformed.
    Protocol(ProtocolError),
}

#[cfg(feature = "std")]
impl std::error::Error for ConfigError {}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PanOutOfRange(us) => {
                write!(f, "pan of {us} µs outside 1..={MAX_PAN_US} µs")
            }
            Self::FrameGapOutOfRange(us) => {
                write!(f, "frame gap of {us} µs outside 1..={MAX_FRAME_GAP_US} µs")
            }
            Self::Protocol(err) => write!(f, "invalid protocol table: {err}"),
        }
    }
}

/// Pulse train timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TimingConfig {
    /// Delay from frame start to the first mark, in microseconds.
    pub pan_us: u32,
    /// Gap from the end of an opening token to its closing token, in microseconds.
    pub frame_gap_us: u32,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            pan_us: DEFAULT_PAN_US,
            frame_gap_us: DEFAULT_FRAME_GAP_US,
        }
    }
}

impl TimingConfig {
    /// Default timing with the pan for `rate`.
    pub const fn for_refresh(rate: RefreshRate) -> Self {
        Self {
            pan_us: rate.pan_us(),
            frame_gap_us: DEFAULT_FRAME_GAP_US,
        }
    }

    /// Check both values are in range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=MAX_PAN_US).contains(&self.pan_us) {
            return Err(ConfigError::PanOutOfRange(self.pan_us));
        }
        if !(1..=MAX_FRAME_GAP_US).contains(&self.frame_gap_us) {
            return Err(ConfigError::FrameGapOutOfRange(self.frame_gap_us));
        }
        Ok(())
    }

    /// Pan in timer ticks.
    pub const fn pan(&self) -> Ticks {
        Ticks::from_micros(self.pan_us)
    }

    /// Frame gap in timer ticks.
    pub const fn frame_gap(&self) -> Ticks {
        Ticks::from_micros(self.frame_gap_us)
    }
}

/// Complete runtime configuration applied at boot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EmitterConfig {
    /// Waveform family.
    pub protocol: ProtocolId,
    /// Pan and gap.
    pub timing: TimingConfig,
    /// Initial sync source.
    pub sync_mode: SyncMode,
    /// Swap left and right.
    pub swap_eyes: bool,
}

impl Default for EmitterConfig {
    fn default() -> Self {
        Self {
            protocol: ProtocolId::default(),
            timing: TimingConfig::default(),
            sync_mode: SyncMode::Combined,
            swap_eyes: false,
        }
    }
}

impl EmitterConfig {
    /// Validate the table and the timing.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.protocol.table().validate().map_err(ConfigError::Protocol)?;
        self.timing.validate()
    }
}
