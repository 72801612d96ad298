use anyhow::Result;
use colored::Colorize;
use std::time::Instant;

use crate::step::{cargo, OnFailure};

pub fn run() -> Result<()> {
    println!();
    println!("{}", "🔍 Checking emitter builds...".cyan().bold());
    println!();

    let total_start = Instant::now();

    // The firmware binary only exists with `hardware` on the ARM target.
    cargo(
        "Hardware target (STM32H743)",
        &["check", "-p", "firmware", "--target", "thumbv7em-none-eabihf", "--features", "hardware"],
        OnFailure::Abort,
    )?;

    cargo(
        "Emulator target (host)",
        &["check", "-p", "firmware", "--features", "emulator", "--examples"],
        OnFailure::Abort,
    )?;

    // The waveform core and HAL traits must stay no_std.
    for krate in ["platform", "emitter"] {
        cargo(
            &format!("{krate} crate (no_std)"),
            &["check", "-p", krate, "--target", "thumbv7em-none-eabihf", "--no-default-features"],
            OnFailure::Abort,
        )?;
    }

    cargo(
        "Clippy",
        &["clippy", "--workspace", "--all-targets", "--", "-D", "warnings"],
        OnFailure::Warn,
    )?;

    let fmt = cargo("Formatting", &["fmt", "--all", "--check"], OnFailure::Warn)?;
    if !fmt.status.success() {
        eprintln!("     Run 'cargo fmt --all' to fix");
    }

    println!(
        "{}",
        format!("✓ All checks completed in {:.2}s", total_start.elapsed().as_secs_f64())
            .green()
            .bold()
    );
    println!();

    Ok(())
}
