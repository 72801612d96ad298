//! Two-channel compare timer used to chain IR pulse edges.
//!
//! The pulse engine needs exactly one scheduling primitive: "fire edge X when
//! the free-running counter reaches T". A hardware implementation maps
//! [`Edge::Rising`] and [`Edge::Falling`] to two compare channels of one timer
//! and their interrupt enables; a mock advances a virtual counter.
//!
//! # Tick unit
//!
//! One tick is 0.5 µs ([`TICKS_PER_US`] = 2). Implementations on other clock
//! rates choose their prescaler so that this holds; the engine never sees the
//! raw timer clock.

/// Timer ticks per microsecond (one tick = 0.5 µs).
pub const TICKS_PER_US: u32 = 2;

/// Counter value of the pulse timer, in 0.5 µs ticks.
///
/// Arithmetic wraps, matching a free-running hardware counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(transparent)]
pub struct Ticks(u32);

impl Ticks {
    /// Counter value right after [`PulseTimer::restart`].
    pub const ZERO: Self = Self(0);

    /// Wrap a raw counter value.
    #[must_use]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Convert a duration in microseconds, saturating at `u32::MAX` ticks.
    #[must_use]
    pub const fn from_micros(us: u32) -> Self {
        Self(us.saturating_mul(TICKS_PER_US))
    }

    /// Raw counter value.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }

    /// `self + rhs`, wrapping like the hardware counter.
    #[must_use]
    pub const fn wrapping_add(self, rhs: Self) -> Self {
        Self(self.0.wrapping_add(rhs.0))
    }

    /// Ticks elapsed from `earlier` to `self`, wrapping like the hardware counter.
    #[must_use]
    pub const fn wrapping_since(self, earlier: Self) -> Self {
        Self(self.0.wrapping_sub(earlier.0))
    }
}

/// Which output transition a compare event produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Edge {
    /// Compare channel A: IR output goes HIGH (start of a mark).
    Rising,
    /// Compare channel B: IR output goes LOW (end of a mark).
    Falling,
}

impl Edge {
    /// The other edge.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Rising => Self::Falling,
            Self::Falling => Self::Rising,
        }
    }
}

/// Free-running counter with two compare channels, at most one armed.
///
/// Register writes cannot fail, so no method returns `Result`. Every method
/// must complete in bounded time: they are called from the compare
/// interrupt handlers.
pub trait PulseTimer {
    /// Reset the counter to [`Ticks::ZERO`] and start counting.
    fn restart(&mut self);

    /// Stop the counter, disable both compare interrupts and clear pending flags.
    fn halt(&mut self);

    /// Program `edge`'s compare register to `at` and enable its interrupt.
    ///
    /// The other edge's interrupt is disabled in the same call, so the two
    /// are never armed together.
    fn schedule(&mut self, edge: Edge, at: Ticks);

    /// Current counter value.
    fn now(&self) -> Ticks;

    /// `true` while the counter is running.
    fn is_running(&self) -> bool;
}
