//! IR Sync Emitter Firmware
//!
//! Wires the waveform core (`emitter`) to the STM32H743 peripherals: a 32-bit
//! compare timer for the pulse chain, an EXTI line for the external sync
//! input, a UART for the host command stream, and three LEDs.
//!
//! # Architecture
//!
//! ```text
//! Application Layer (main.rs: tasks, poll loop, watchdog)
//!         ↓
//! Glue (controller, dispatch, host_link, sync_input)
//!         ↓
//! Emitter core (protocols, pulse engine, sync arbitrator)
//!         ↓
//! Platform HAL (Embassy, STM32 PAC)
//! ```
//!
//! Everything above the hardware line is generic over the `platform` traits
//! and runs unchanged on the desktop against `platform::mocks`.
//!
//! # Features
//!
//! - `hardware` - Build for STM32H7 target (embassy, PAC timer, defmt)
//! - `emulator` - Build the desktop free-run emulator (tokio, tracing)
//! - `std` - Enable standard library (for emulator and testing)
//!
//! # Examples
//!
//! ## Hardware Target
//!
//! ```bash
//! cargo build --release --target thumbv7em-none-eabihf --features hardware
//! ```
//!
//! ## Emulator Target
//!
//! ```bash
//! cargo run --example freerun_emulator --features emulator
//! ```

#![cfg_attr(all(not(test), not(feature = "std")), no_std)]
// Upgrade relevant warns to deny; keep pedantic as warn (too noisy for firmware)
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// Critical correctness: deny these
#![deny(clippy::await_holding_lock)] // holding a blocking Mutex across .await is a bug
#![deny(unsafe_op_in_unsafe_fn)]
// unsafe fn body is not implicitly unsafe block
// Logging discipline (allow println in tests via clippy.toml)
#![warn(clippy::print_stdout)] // prefer tracing/defmt over println! in lib code
#![warn(clippy::dbg_macro)] // dbg! should not be left in committed code
// Intentional allows for this codebase:
#![allow(clippy::module_name_repetitions)] // common in Rust crates; not a real issue
#![allow(clippy::missing_errors_doc)] // most errors are self-explanatory
// Pedantic lints too noisy for firmware application code:
#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::unused_async)]

pub mod boot;
pub mod controller;
pub mod dispatch;
pub mod exception_handlers;
pub mod host_link;
pub mod sync_input;

#[cfg(feature = "hardware")]
pub mod pins;
#[cfg(feature = "hardware")]
pub mod pulse_timer;

// Re-export key types
pub use controller::{Controller, ControllerError, EngineCell};
pub use dispatch::{DispatchOutcome, Dispatcher};
pub use host_link::{HostLink, LinkStats};
pub use sync_input::EdgeSample;
