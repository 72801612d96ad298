//! Property-based tests for tick arithmetic.
//! Verifies invariants hold for ALL counter values, not just fixed examples.

use platform::{Ticks, TICKS_PER_US};

proptest::proptest! {
    /// Converting microseconds never panics and is exact below saturation.
    #[test]
    fn from_micros_is_exact_below_saturation(us in 0u32..=(u32::MAX / TICKS_PER_US)) {
        assert_eq!(Ticks::from_micros(us).get(), us * TICKS_PER_US);
    }

    /// Scheduling relative to any previous compare value measures back exactly,
    /// including across the counter wrap.
    #[test]
    fn wrapping_since_inverts_wrapping_add(base in 0u32..=u32::MAX, delta in 0u32..=u32::MAX) {
        let start = Ticks::new(base);
        let end = start.wrapping_add(Ticks::new(delta));
        assert_eq!(end.wrapping_since(start).get(), delta);
    }
}
