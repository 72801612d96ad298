//! TIM5 as the pulse chain timer.
//!
//! TIM5 is a 32-bit general-purpose timer, free for us because the embassy
//! time driver sits on TIM2. It counts at 2 MHz; CC1 is the rising-edge
//! compare (A) and CC2 the falling-edge compare (B). Only the interrupt
//! enable of the armed channel is set.
//!
//! The ISR runs at the highest NVIC priority, above the sync edge executor
//! and the UART interrupt, and never logs.

use core::cell::RefCell;
use core::sync::atomic::{AtomicU32, Ordering};

use critical_section::Mutex;
use embassy_stm32::interrupt;
use embassy_stm32::interrupt::{InterruptExt, Priority};
use embassy_stm32::pac;
use platform::{Edge, PulseTimer, Ticks};

use crate::boot::{pulse_timer_prescaler, PULSE_TIMER_KERNEL_HZ};
use crate::controller::EngineCell;
use crate::pins::PushPull;

const PRESCALER: u16 = match pulse_timer_prescaler(PULSE_TIMER_KERNEL_HZ) {
    Some(psc) => psc,
    None => 0,
};
const _: () = assert!(PRESCALER != 0, "TIM5 kernel clock must divide to 2 MHz");

const CH_RISING: usize = 0;
const CH_FALLING: usize = 1;

const fn channel(edge: Edge) -> usize {
    match edge {
        Edge::Rising => CH_RISING,
        Edge::Falling => CH_FALLING,
    }
}

/// Engine driven by TIM5.
pub type HwEngineCell = EngineCell<Tim5PulseTimer, PushPull>;

/// The pulse engine, shared between thread mode and the TIM5 interrupt.
pub static ENGINE: HwEngineCell = Mutex::new(RefCell::new(None));

/// Compare events that could not be delivered (no engine, or a pin error).
pub static PULSE_FAULTS: AtomicU32 = AtomicU32::new(0);

/// Handle on TIM5. Only one may exist.
pub struct Tim5PulseTimer {
    _private: (),
}

impl Tim5PulseTimer {
    /// Clock TIM5, prescale it to 2 MHz with a full 32-bit period, and halt it.
    #[allow(clippy::new_without_default)] // touches hardware; not a value default
    pub fn new() -> Self {
        pac::RCC.apb1lenr().modify(|w| w.set_tim5en(true));

        let tim = pac::TIM5;
        tim.cr1().modify(|w| w.set_cen(false));
        tim.psc().write_value(PRESCALER);
        tim.arr().write_value(u32::MAX);
        // Update event latches PSC; clear the UIF it raises.
        tim.egr().write(|w| w.set_ug(true));
        let mut sr = tim.sr().read();
        sr.0 = u32::MAX;
        sr.set_uif(false);
        tim.sr().write_value(sr);

        let mut timer = Self { _private: () };
        timer.halt();
        timer
    }

    /// Set the TIM5 priority and unmask it. Call after the engine is installed.
    pub fn unmask_interrupt() {
        interrupt::TIM5.set_priority(Priority::P0);
        // SAFETY: the handler only touches ENGINE through a critical section
        // and PULSE_FAULTS atomically; ENGINE is populated before this call.
        #[allow(unsafe_code)]
        unsafe {
            interrupt::TIM5.enable();
        }
    }
}

/// SR flags are rc_w0: a written 1 leaves a flag untouched. Start from all
/// ones and zero only `channels`, so a flag raised since the last read survives.
fn clear_compare_flags(channels: &[usize]) {
    let tim = pac::TIM5;
    let mut sr = tim.sr().read();
    sr.0 = u32::MAX;
    for &ch in channels {
        sr.set_ccif(ch, false);
    }
    tim.sr().write_value(sr);
}

impl PulseTimer for Tim5PulseTimer {
    fn restart(&mut self) {
        let tim = pac::TIM5;
        tim.cnt().write_value(0);
        tim.cr1().modify(|w| w.set_cen(true));
    }

    fn halt(&mut self) {
        let tim = pac::TIM5;
        tim.cr1().modify(|w| w.set_cen(false));
        tim.dier().modify(|w| {
            w.set_ccie(CH_RISING, false);
            w.set_ccie(CH_FALLING, false);
        });
        clear_compare_flags(&[CH_RISING, CH_FALLING]);
    }

    fn schedule(&mut self, edge: Edge, at: Ticks) {
        let tim = pac::TIM5;
        let armed = channel(edge);
        let other = channel(edge.opposite());
        tim.ccr(armed).write_value(at.get());
        // The flag may be stale from an earlier pass of the counter.
        clear_compare_flags(&[armed]);
        tim.dier().modify(|w| {
            w.set_ccie(other, false);
            w.set_ccie(armed, true);
        });
    }

    fn now(&self) -> Ticks {
        Ticks::new(pac::TIM5.cnt().read())
    }

    fn is_running(&self) -> bool {
        pac::TIM5.cr1().read().cen()
    }
}

fn deliver(edge: Edge) {
    critical_section::with(|cs| {
        let delivered = ENGINE
            .borrow_ref_mut(cs)
            .as_mut()
            .map(|engine| engine.on_compare(edge).is_ok());
        if delivered != Some(true) {
            PULSE_FAULTS.fetch_add(1, Ordering::AcqRel);
        }
    });
}

#[interrupt]
fn TIM5() {
    let tim = pac::TIM5;
    // Snapshot both registers: the first handler re-arms the other channel,
    // which must not fire in this pass.
    let sr = tim.sr().read();
    let dier = tim.dier().read();
    for edge in [Edge::Rising, Edge::Falling] {
        let ch = channel(edge);
        if sr.ccif(ch) && dier.ccie(ch) {
            clear_compare_flags(&[ch]);
            deliver(edge);
        }
    }
}
