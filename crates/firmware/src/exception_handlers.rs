//! Cortex-M exception handlers for the IR sync emitter.
//!
//! A HardFault on this device means the IR line may be stuck in whatever
//! state the last compare handler left it. The handler reports the stacked
//! frame over RTT and halts; the independent watchdog then resets the MCU,
//! and `PulseEngine::new` drives the IR line low again during boot.
//!
//! # Hardware-only handler
//!
//! The `#[cortex_m_rt::exception]` attribute requires ARM target intrinsics and
//! is therefore gated behind `#[cfg(feature = "hardware")]`. The module itself
//! (and `HARDFAULT_DEFINED`) compiles unconditionally so host tests can verify
//! the module exists without needing an ARM toolchain.

#![allow(clippy::doc_markdown)] // Exception handler docs use hardware terminology (HardFault) as plain text

/// Marker constant, checked by the firmware architecture tests.
pub const HARDFAULT_DEFINED: bool = true;

/// HardFault exception handler (hardware target only).
///
/// # Triggers
///
/// - Bus fault on a peripheral access (e.g. TIM5 registers with its clock gated)
/// - Stack overflow into the bottom of RAM
/// - Divide by zero (if `CCR.DIV_0_TRP` is set in SCB)
///
/// # Behavior
///
/// Outputs the exception frame address via defmt/RTT, then halts. The
/// watchdog is not fed while halted, so the device resets within
/// `boot::WATCHDOG_TIMEOUT_MS`.
///
/// # Safety
///
/// This function must never return; returning from a HardFault handler is
/// undefined behavior on Cortex-M. The `-> !` return type enforces this.
#[cfg(feature = "hardware")]
#[cortex_m_rt::exception]
#[allow(unsafe_code, clippy::cast_possible_truncation)]
unsafe fn HardFault(ef: &cortex_m_rt::ExceptionFrame) -> ! {
    defmt::panic!(
        "HardFault! Stacked exception frame at 0x{:08X}. \
         Check stacked PC for fault address.",
        ef as *const _ as u32
    );
}
