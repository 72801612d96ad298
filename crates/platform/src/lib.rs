//! Hardware Abstraction Layer (HAL) for the IR sync emitter
//!
//! This crate provides trait-based abstractions for the handful of peripherals
//! the emitter touches, enabling development and testing of the waveform engine
//! without physical hardware.
//!
//! # Architecture Layers
//!
//! ```text
//! Application Layer (firmware crate)
//!         ↓
//! Emitter core (emitter crate: protocols, pulse engine, sync arbitration)
//!         ↓
//! Platform HAL (this crate - trait abstractions)
//!         ↓
//! Hardware Layer (Embassy HAL + PAC)
//! ```
//!
//! # Abstractions
//!
//! - [`gpio`] - IR emitter line, status LEDs, sync input (with edge interrupts)
//! - [`timer`] - Two-channel compare timer driving the pulse chain
//! - [`config`] - Application-wide constants
//! - `mocks` - Virtual-clock timer and recording pins (`std` feature or tests)
//!
//! # Features
//!
//! - `std`: Enable mock implementations for host testing
//! - `defmt`: Enable defmt logging derives
//!
//! # Example
//!
//! ```no_run
//! use platform::{Edge, PulseTimer, Ticks};
//!
//! fn arm_first_pulse<T: PulseTimer>(timer: &mut T) {
//!     timer.restart();
//!     timer.schedule(Edge::Rising, Ticks::from_micros(3000));
//! }
//! ```

// ── Lint policy ─────────────────────────────────────────────────────────────
#![deny(clippy::unwrap_used)] // no .unwrap() in production code
#![deny(clippy::expect_used)] // no .expect() in production code
#![deny(clippy::panic)] // no panic!() in production code
#![deny(clippy::unreachable)] // no unreachable!() that isn't documented
#![deny(unused_must_use)]
// all Results must be handled
// ────────────────────────────────────────────────────────────────────────────
#![cfg_attr(not(test), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(unsafe_op_in_unsafe_fn)] // unsafe fn body is not implicitly unsafe block
#![warn(clippy::print_stdout)] // prefer tracing/defmt over println! in lib code
// Pedantic lints suppressed for this hardware HAL crate:
#![allow(clippy::doc_markdown)] // register names in doc comments
#![allow(clippy::must_use_candidate)] // hardware accessors, callers decide
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(async_fn_in_trait)] // Embassy no_std: single-threaded, Send bounds not needed

pub mod config;
pub mod gpio;
pub mod timer;

#[cfg(any(test, feature = "std"))]
pub mod mocks;

// Re-export GPIO types
pub use gpio::{InputPin, InterruptMode, InterruptPin, OutputPin, PinState};

// Re-export timer types
pub use timer::{Edge, PulseTimer, Ticks, TICKS_PER_US};
