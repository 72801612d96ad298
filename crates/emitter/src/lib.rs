//! IR shutter-glasses sync emitter core: protocol tables, pulse engine,
//! token sequencing and sync-source arbitration.
//!
//! Everything in this crate is `no_std`, allocation-free and hardware
//! independent: the pulse engine talks to a [`platform::PulseTimer`] and two
//! [`platform::OutputPin`]s, the arbitrator is a set of atomics usable from a
//! `static`. The firmware crate wires both to Embassy / STM32 peripherals.
//!
//! ```text
//! trigger (edge / host / free-run)
//!         ↓
//! SyncArbitrator ── FrameStart ──→ PulseEngine ──→ IR output
//!                                     ↑    │
//!                                     └ sequencer (chain closing token / end frame)
//! ```

#![cfg_attr(not(test), no_std)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::doc_markdown)]

#[cfg(all(feature = "std", not(test)))]
extern crate std;

pub mod config;
pub mod eye;
pub mod host;
pub mod library;
pub mod protocol;
pub mod pulse;
pub mod scratch;
pub mod sequencer;
pub mod status;
pub mod sync;

pub use config::{ConfigError, EmitterConfig, RefreshRate, TimingConfig};
pub use eye::Eye;
pub use host::{decode, ConfigCommand, Endpoint, FrameDecoder, HostCommand, HostError};
pub use library::ProtocolId;
pub use protocol::{Protocol, ProtocolError, TokenIndex, TokenSlot};
pub use pulse::{EngineError, PulseEngine, PulsePhase, PulseStats};
pub use scratch::{ScratchMemory, ScratchReply, ScratchRequest};
pub use sequencer::TokenEnd;
pub use status::{StatusChange, StatusLeds};
pub use sync::{FrameStart, IgnoredTriggers, SyncArbitrator, SyncMode, SyncUpdate};
