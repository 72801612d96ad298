use anyhow::{Context, Result};
use colored::Colorize;
use std::process::Command;
use std::time::Instant;

use crate::step::{cargo, OnFailure};

const TARGET: &str = "thumbv7em-none-eabihf";

fn elf_path(release: bool) -> String {
    let profile = if release { "release" } else { "debug" };
    format!("target/{TARGET}/{profile}/firmware")
}

pub fn run(release: bool, chip: &str) -> Result<()> {
    let mode = if release { "release" } else { "debug" };

    println!();
    println!("{}", format!("🔨 Building firmware ({mode} mode)...").cyan().bold());
    println!();

    let mut args = vec!["build", "-p", "firmware", "--target", TARGET, "--features", "hardware"];
    if release {
        args.push("--release");
    }
    cargo("Firmware build", &args, OnFailure::Abort)?;

    show_binary_size(release);
    println!();

    println!("{}", format!("📡 Flashing to {chip}...").cyan().bold());
    println!("   {}", "Connecting to probe...".dimmed());

    let elf = elf_path(release);
    let flash_start = Instant::now();
    let status = Command::new("probe-rs")
        .args(["run", elf.as_str(), "--chip", chip, "--probe-index", "0"])
        .status()
        .context("Failed to run probe-rs. Is probe-rs installed? (cargo install probe-rs-tools)")?;

    // `probe-rs run` streams RTT until interrupted; a non-zero exit after a
    // successful download is the user pressing Ctrl-C.
    if !status.success() {
        eprintln!("{}", "✗ probe-rs exited with an error".red().bold());
        anyhow::bail!(
            "Flash failed - check that the probe is connected and the NUCLEO is powered"
        );
    }

    println!(
        "{}",
        format!("✓ probe-rs session ended after {:.2}s", flash_start.elapsed().as_secs_f64())
            .green()
    );
    println!();
    Ok(())
}

fn show_binary_size(release: bool) {
    let Ok(out) = Command::new("rust-size").arg(elf_path(release)).arg("-A").output() else {
        println!("   {}", "rust-size not found, skipping size report".dimmed());
        return;
    };
    if !out.status.success() {
        return;
    }

    println!("{}", "📊 Binary size:".cyan());
    let report = String::from_utf8_lossy(&out.stdout);
    for line in report
        .lines()
        .filter(|l| [".text", ".rodata", ".data", ".bss", "Total"].iter().any(|s| l.starts_with(s)))
    {
        println!("   {}", line.dimmed());
    }
}
