//! Free-run emulator
//!
//! Runs the controller, pulse engine and arbitrator on the desktop against
//! the virtual-clock timer, then switches to Driver mode, sends one host eye
//! packet and waits for the sync timeout.
//!
//! Run with: RUST_LOG=debug cargo run --example freerun_emulator --features emulator

use core::cell::RefCell;
use core::convert::Infallible;
use std::time::Duration;

use critical_section::Mutex;
use emitter::{EmitterConfig, Eye, PulseEngine, StatusLeds, SyncArbitrator, SyncMode};
use firmware::{Controller, ControllerError, EngineCell};
use platform::config;
use platform::mocks::{MockPin, MockPulseTimer};
use tracing_subscriber::EnvFilter;

/// Virtual milliseconds of free-run before switching to Driver mode.
const FREERUN_MS: u32 = 60;

/// Virtual millisecond of the only host eye packet.
const HOST_EYE_MS: u32 = 70;

/// Virtual milliseconds to run in total.
const RUN_MS: u32 = 300;

type CtlResult<T> = Result<T, ControllerError<Infallible>>;

/// Fire every armed compare event until the chain stops, returning how many fired.
fn drain_chain(ctl: &Controller<'_, MockPulseTimer, MockPin>) -> CtlResult<usize> {
    let mut fired = 0usize;
    loop {
        let edge = ctl.with_engine(|engine| Ok(engine.timer_mut().fire_next()))?;
        let Some(edge) = edge else {
            return Ok(fired);
        };
        ctl.on_compare(edge)?;
        fired = fired.saturating_add(1);
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();
    tracing::info!("{} - {}", config::APP_NAME, config::dev_banner());

    let config = EmitterConfig {
        sync_mode: SyncMode::FreeRun,
        ..EmitterConfig::default()
    };
    config.validate()?;

    let sync = SyncArbitrator::new(config.sync_mode);
    let cell: EngineCell<MockPulseTimer, MockPin> = Mutex::new(RefCell::new(None));
    let ctl = Controller::new(&sync, &cell);
    ctl.install(PulseEngine::new(
        config.protocol.table(),
        config.timing,
        MockPulseTimer::new(),
        MockPin::default(),
        MockPin::default(),
    )?);
    ctl.apply_config(&config)?;
    let mut leds = StatusLeds::new(MockPin::default(), MockPin::default())?;

    tracing::info!(
        protocol = config.protocol.name(),
        pan_us = config.timing.pan_us,
        gap_us = config.timing.frame_gap_us,
        "engine installed"
    );

    let mut tick = tokio::time::interval(Duration::from_millis(1));
    for now in 0..RUN_MS {
        tick.tick().await;

        if now == FREERUN_MS {
            ctl.set_sync_mode(SyncMode::Driver)?;
            tracing::info!(now, "switched to driver mode");
        }
        if now == HOST_EYE_MS {
            if let Some(start) = ctl.on_host_eye(Eye::Left, now)? {
                let fired = drain_chain(&ctl)?;
                tracing::info!(now, eye = start.eye.name(), fired, "host frame, then silence");
            }
        }

        let update = ctl.poll(now)?;
        if let Some(start) = update.frame {
            let fired = drain_chain(&ctl)?;
            tracing::debug!(now, eye = start.eye.name(), fired, "frame");
        }
        if let Some(change) = update.status {
            leds.apply(change)?;
            tracing::info!(now, ?change, syncing = leds.syncing().is_set_high(), "status");
        }
    }

    let stats = ctl.stats()?;
    tracing::info!(
        frames = sync.frames_started(),
        completed = stats.frames_completed,
        samples = stats.samples_emitted,
        spurious = stats.spurious_edges,
        "done"
    );
    Ok(())
}
