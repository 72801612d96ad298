//! Application configuration and constants
//!
//! Central naming and timing constants shared by the firmware and tooling.
//! Waveform timing that is tunable at runtime lives in `emitter::config`.

/// The application name
pub const APP_NAME: &str = "IR Sync Emitter";

/// Application version (synchronized with Cargo.toml)
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Pulse timer tick rate: 2 MHz, i.e. 0.5 µs per tick.
pub const PULSE_TIMER_HZ: u32 = 2_000_000;

/// Development mode banner
pub const fn dev_banner() -> &'static str {
    "IR Sync Emitter - Emulator Mode"
}
