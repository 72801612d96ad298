//! Hardware boot sequence for the IR sync emitter.
//!
//! Initialization order (order matters for correctness):
//!   1. RCC: PLL1 from HSI, 400 MHz core, 100 MHz APB1 (TIM5 kernel 200 MHz)
//!   2. Watchdog: IWDG armed before any task can stall
//!   3. Pulse timer: TIM5 prescaled to 2 MHz, halted, IRQ at top priority
//!   4. Pulse engine installed in the shared cell (IR line driven low)
//!   5. Boot configuration applied (protocol, timing, sync mode, swap)
//!   6. Embassy executor: spawn sync-edge and host-link tasks, enter poll loop
//!
//! The pulse timer interrupt must never find an empty engine cell once it is
//! unmasked, so step 4 precedes unmasking TIM5 in step 6.

use platform::config::PULSE_TIMER_HZ;

/// Ordered list of boot sequence steps for documentation and testing.
///
/// Tests assert that the engine is installed before the pulse timer
/// interrupt is unmasked and that the watchdog is armed before any task
/// is spawned.
pub const BOOT_SEQUENCE_STEPS: &[&str] = &[
    "1. RCC: HSI -> PLL1 400 MHz sys, APB1 100 MHz (TIM5 kernel 200 MHz)",
    "2. IWDG: arm watchdog before spawning tasks",
    "3. TIM5: prescale to 2 MHz, halt, clear flags",
    "4. Engine: install pulse engine (IR low, indicator idle)",
    "5. Config: apply protocol, timing, sync mode, eye swap",
    "6. Embassy executor: unmask TIM5, spawn tasks, enter poll loop",
];

/// Independent watchdog timeout.
///
/// The poll loop runs every millisecond and pets the watchdog once per
/// [`WATCHDOG_PET_INTERVAL_MS`]; a stall of the executor resets the MCU well
/// before the glasses notice (they free-run for a few frames on their own).
pub const WATCHDOG_TIMEOUT_MS: u32 = 500;

/// How often the poll loop feeds the watchdog.
pub const WATCHDOG_PET_INTERVAL_MS: u32 = 100;

/// Watchdog timeout in microseconds, as `IndependentWatchdog::new` takes it.
pub const fn init_watchdog_config() -> u32 {
    WATCHDOG_TIMEOUT_MS.saturating_mul(1_000)
}

/// TIM5 kernel clock with the RCC settings of [`build_embassy_config`].
///
/// APB1 runs at 100 MHz with a prescaler other than 1, so the timer kernel
/// clock is doubled.
pub const PULSE_TIMER_KERNEL_HZ: u32 = 200_000_000;

/// TIM5 `PSC` value giving [`PULSE_TIMER_HZ`] ticks (`kernel / (PSC + 1)`).
///
/// `None` when the kernel clock is not an exact multiple of the tick rate
/// or the divider does not fit the 16-bit register.
#[allow(clippy::cast_possible_truncation, clippy::cast_lossless)] // range-checked; `From` is not const
pub const fn pulse_timer_prescaler(kernel_hz: u32) -> Option<u16> {
    let Some(divider) = kernel_hz.checked_div(PULSE_TIMER_HZ) else {
        return None;
    };
    if !matches!(kernel_hz.checked_rem(PULSE_TIMER_HZ), Some(0)) {
        return None;
    }
    match divider.checked_sub(1) {
        Some(psc) if psc <= u16::MAX as u32 => Some(psc as u16),
        _ => None,
    }
}

/// Millisecond poll period of the main loop.
pub const POLL_PERIOD_MS: u64 = 1;

// ── RCC clock configuration ───────────────────────────────────────────────────

/// Build the `embassy_stm32::Config` with the emitter's RCC settings.
///
/// # Clock Tree (HSI → 400 MHz core)
///
/// HSI (64 MHz) → PLL1 (prediv=4, mul=50) → PLL1_P = 400 MHz (sys)
/// AHB prescaler: DIV2 → 200 MHz
/// APB1/2/3/4:    DIV2 → 100 MHz (timer kernels 200 MHz)
///
/// # DO NOT call `embassy_stm32::init(Default::default())`
///
/// The default configuration runs from HSI at 64 MHz, which changes the
/// TIM5 kernel clock and breaks [`PULSE_TIMER_KERNEL_HZ`]. Always call
/// `embassy_stm32::init(build_embassy_config())` from `main.rs`.
#[cfg(feature = "hardware")]
pub fn build_embassy_config() -> embassy_stm32::Config {
    use embassy_stm32::rcc::*;

    let mut config = embassy_stm32::Config::default();

    // ── Oscillators ─────────────────────────────────────────────────────────
    // HSI: 64 MHz internal oscillator (no prescaler)
    config.rcc.hsi = Some(HSIPrescaler::DIV1);
    // CSI: required for some analog peripherals on H7
    config.rcc.csi = true;

    // ── PLL1: system clock ───────────────────────────────────────────────────
    // HSI (64 MHz) / prediv(4) = 16 MHz → × mul(50) = 800 MHz VCO
    // PLL1_P = VCO / divp(2) = 400 MHz  → system clock
    config.rcc.pll1 = Some(Pll {
        source: PllSource::HSI,
        prediv: PllPreDiv::DIV4,
        mul: PllMul::MUL50,
        divp: Some(PllDiv::DIV2), // 400 MHz system clock
        divq: None,
        divr: None,
    });

    // ── System clock + bus prescalers ────────────────────────────────────────
    config.rcc.sys = Sysclk::PLL1_P; // 400 MHz
    config.rcc.ahb_pre = AHBPrescaler::DIV2; // 200 MHz
    config.rcc.apb1_pre = APBPrescaler::DIV2; // 100 MHz, TIM2/TIM5 kernel 200 MHz
    config.rcc.apb2_pre = APBPrescaler::DIV2; // 100 MHz
    config.rcc.apb3_pre = APBPrescaler::DIV2; // 100 MHz
    config.rcc.apb4_pre = APBPrescaler::DIV2; // 100 MHz
    config.rcc.voltage_scale = VoltageScale::Scale1;

    config
}

// ─── Tests ────────────────────────────────────────────────────────────────────
