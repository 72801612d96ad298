// Desktop/tooling crate: unwrap/expect/panic acceptable in non-embedded code.
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod check;
mod emulate;
mod flash;
mod step;

use anyhow::Result;
use clap::{Parser, Subcommand};

/// Probe-rs name of the NUCLEO-H743ZI target.
const DEFAULT_CHIP: &str = "STM32H743ZITx";

#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "IR sync emitter development tasks", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the firmware and flash it via probe-rs
    Flash {
        /// Build and flash release version
        #[arg(short, long)]
        release: bool,
        /// probe-rs chip name
        #[arg(long, default_value = DEFAULT_CHIP)]
        chip: String,
    },
    /// Run the desktop free-run emulator
    Emulate {
        /// RUST_LOG filter passed to the emulator
        #[arg(long, default_value = "info")]
        log: String,
    },
    /// Check the hardware, emulator and no_std builds, then clippy and fmt
    Check,
    /// Run unit, integration and doc tests
    Test {
        /// Run only unit tests
        #[arg(long)]
        unit: bool,
        /// Run only integration tests
        #[arg(long)]
        integration: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Flash { release, chip } => flash::run(release, &chip),
        Commands::Emulate { log } => emulate::run(&log),
        Commands::Check => check::run(),
        Commands::Test { unit, integration } => test::run(unit, integration),
    }
}
