//! IR Sync Emitter Firmware - Main Entry Point
//!
//! Hardware-only entry point for STM32H743ZI.

#![no_std]
#![no_main]

use core::sync::atomic::{AtomicBool, Ordering};

use embassy_executor::{InterruptExecutor, Spawner};
use embassy_futures::select::{select, Either};
use embassy_stm32::bind_interrupts;
use embassy_stm32::exti::ExtiInput;
use embassy_stm32::gpio::{Input, Level, Output, Pull, Speed};
use embassy_stm32::interrupt;
use embassy_stm32::interrupt::{InterruptExt, Priority};
use embassy_stm32::peripherals::USART3;
use embassy_stm32::usart::{self, BufferedUart};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embassy_time::{Duration, Instant, Ticker, Timer};
use static_cell::StaticCell;

use emitter::{EmitterConfig, PulseEngine, StatusLeds, SyncArbitrator, SyncMode};
use firmware::boot::{POLL_PERIOD_MS, WATCHDOG_PET_INTERVAL_MS};
use firmware::pins::{EdgeInput, LevelInput, PushPull};
use firmware::pulse_timer::{Tim5PulseTimer, ENGINE, PULSE_FAULTS};
use firmware::sync_input::{configure_trigger, handle_edge, EdgeSample};
use firmware::{Controller, HostLink};
use platform::config::{APP_NAME, APP_VERSION};
use platform::{InterruptMode, InterruptPin};

// Logging transport and panic handler
use defmt_rtt as _;
use panic_probe as _;

bind_interrupts!(struct Irqs {
    USART3 => usart::BufferedInterruptHandler<USART3>;
});

/// Runs the sync edge task from UART4's vector (unused as a UART), preempting
/// thread mode so a frame starts as soon as EXTI3 wakes it.
static EXECUTOR_SYNC: InterruptExecutor = InterruptExecutor::new();

#[interrupt]
#[allow(unsafe_code)]
unsafe fn UART4() {
    // SAFETY: UART4 is pended only by EXECUTOR_SYNC's wakers.
    unsafe { EXECUTOR_SYNC.on_interrupt() }
}

/// Host link baud rate.
const HOST_BAUD: u32 = 115_200;

/// Frame/eye state shared by the tasks, the poll loop and the TIM5 chain.
static SYNC: SyncArbitrator = SyncArbitrator::new(SyncMode::Combined);

/// New sync input edge configuration after a mode change.
static TRIGGER: Signal<CriticalSectionRawMutex, Option<InterruptMode>> = Signal::new();

/// Set by the host link task on the first well-formed command.
static LINK_UP: AtomicBool = AtomicBool::new(false);

static UART_TX_BUF: StaticCell<[u8; 128]> = StaticCell::new();
static UART_RX_BUF: StaticCell<[u8; 256]> = StaticCell::new();

fn controller() -> Controller<'static, Tim5PulseTimer, PushPull> {
    Controller::new(&SYNC, &ENGINE)
}

/// Monotonic milliseconds, wrapping like the arbitrator's arithmetic.
#[allow(clippy::cast_possible_truncation)]
fn now_ms() -> u32 {
    Instant::now().as_millis() as u32
}

/// Stop feeding the watchdog and wait for the reset.
async fn halt() -> ! {
    loop {
        Timer::after(Duration::from_secs(1)).await;
    }
}

#[embassy_executor::task]
async fn sync_edge_task(mut sync_in: EdgeInput, force_in: LevelInput) {
    loop {
        let event = select(sync_in.wait_for_interrupt(), TRIGGER.wait()).await;
        match event {
            Either::First(_) => {
                let sample = match EdgeSample::read(&sync_in, &force_in) {
                    Ok(sample) => sample,
                    Err(never) => match never {},
                };
                if handle_edge(&controller(), sample, now_ms()).is_err() {
                    defmt::warn!("sync edge dropped: engine unavailable");
                }
            }
            Either::Second(trigger) => {
                let _ = configure_trigger(&mut sync_in, trigger);
                defmt::debug!("sync input trigger: {}", trigger);
            }
        }
    }
}

#[embassy_executor::task]
async fn host_link_task(mut uart: BufferedUart<'static, USART3>) {
    let mut host = HostLink::new();
    loop {
        let served = firmware::host_link::serve(
            &mut uart,
            &mut host,
            &controller(),
            now_ms,
            |trigger| TRIGGER.signal(trigger),
            || LINK_UP.store(true, Ordering::Release),
        )
        .await;
        if served.is_err() {
            defmt::warn!("host link read failed, restarting");
        }
    }
}

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    defmt::info!("{=str} v{=str}", APP_NAME, APP_VERSION);
    defmt::info!("Initializing STM32H743ZI, Cortex-M7 @ 400 MHz");

    // Step 1: clocks. TIM5's kernel clock depends on this exact tree.
    let p = embassy_stm32::init(firmware::boot::build_embassy_config());

    // Step 2: IWDG. Once unleashed it cannot be stopped; the poll loop pets it.
    let mut watchdog = embassy_stm32::wdg::IndependentWatchdog::new(
        p.IWDG1,
        firmware::boot::init_watchdog_config(),
    );
    watchdog.unleash();
    defmt::info!(
        "IWDG watchdog armed: timeout={=u32}ms",
        firmware::boot::WATCHDOG_TIMEOUT_MS
    );

    // Step 3: pulse timer, halted.
    let timer = Tim5PulseTimer::new();

    // Step 4: engine. Construction drives the IR line low.
    let ir = PushPull::new(Output::new(p.PC6, Level::Low, Speed::VeryHigh).degrade());
    let frame_led = PushPull::new(Output::new(p.PE1, Level::High, Speed::Low).degrade());
    let config = EmitterConfig::default();
    let engine = match PulseEngine::new(
        config.protocol.table(),
        config.timing,
        timer,
        ir,
        frame_led,
    ) {
        Ok(engine) => engine,
        Err(e) => {
            defmt::error!("pulse engine rejected boot config: {}", e);
            halt().await
        }
    };
    let ctl = controller();
    ctl.install(engine);

    // Step 5: boot configuration.
    let trigger = match ctl.apply_config(&config) {
        Ok(trigger) => trigger,
        Err(e) => {
            defmt::error!("boot config failed: {}", e);
            halt().await
        }
    };
    defmt::info!(
        "protocol={=str} sync={=str} pan={=u32}us gap={=u32}us",
        config.protocol.name(),
        config.sync_mode.name(),
        config.timing.pan_us,
        config.timing.frame_gap_us
    );

    // Step 6: interrupts and tasks.
    let mut sync_in = EdgeInput::new(ExtiInput::new(
        Input::new(p.PA3, Pull::None).degrade(),
        p.EXTI3.degrade(),
    ));
    let _ = configure_trigger(&mut sync_in, trigger);
    let force_in = LevelInput::new(Input::new(p.PA4, Pull::Up).degrade());

    Tim5PulseTimer::unmask_interrupt();

    // Above thread mode, below TIM5 (P0).
    interrupt::UART4.set_priority(Priority::P1);
    let sync_spawner = EXECUTOR_SYNC.start(interrupt::UART4);
    if sync_spawner.spawn(sync_edge_task(sync_in, force_in)).is_err() {
        defmt::error!("sync edge task not spawned");
    }

    let mut uart_config = usart::Config::default();
    uart_config.baudrate = HOST_BAUD;
    match BufferedUart::new(
        p.USART3,
        Irqs,
        p.PD9, // RX
        p.PD8, // TX
        UART_TX_BUF.init([0; 128]),
        UART_RX_BUF.init([0; 256]),
        uart_config,
    ) {
        Ok(uart) => {
            if spawner.spawn(host_link_task(uart)).is_err() {
                defmt::error!("host link task not spawned");
            }
        }
        Err(_) => defmt::error!("USART3 config rejected, host link disabled"),
    }

    let syncing_led = PushPull::new(Output::new(p.PB0, Level::Low, Speed::Low).degrade());
    let standby_led = PushPull::new(Output::new(p.PB14, Level::Low, Speed::Low).degrade());
    let mut leds = match StatusLeds::new(syncing_led, standby_led) {
        Ok(leds) => leds,
        Err(never) => match never {},
    };

    // Poll loop: free-run frames, liveness, status LEDs, watchdog.
    defmt::info!("Entering poll loop");
    let mut ticker = Ticker::every(Duration::from_millis(POLL_PERIOD_MS));
    let mut link_shown = false;
    let mut last_pet = now_ms();
    let mut last_faults = 0;

    loop {
        ticker.next().await;
        let now = now_ms();

        match ctl.poll(now) {
            Ok(update) => {
                if let Some(change) = update.status {
                    let _ = leds.apply(change);
                    defmt::info!("sync status: {}", change);
                }
            }
            Err(e) => defmt::warn!("poll failed: {}", e),
        }

        if !link_shown && LINK_UP.load(Ordering::Acquire) {
            let _ = leds.set_link_up(true);
            link_shown = true;
            defmt::info!("host link up");
        }

        let faults = PULSE_FAULTS.load(Ordering::Acquire);
        if faults != last_faults {
            defmt::warn!("pulse compare faults: {=u32}", faults);
            last_faults = faults;
        }

        if now.wrapping_sub(last_pet) >= WATCHDOG_PET_INTERVAL_MS {
            watchdog.pet();
            last_pet = now;
        }
    }
}
