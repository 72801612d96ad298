//! Type system enforcement tests for the pulse timer tick newtype.
//! The engine relies on these conversions to keep microsecond timing exact.

// ── Ticks ────────────────────────────────────────────────────────────────────

#[test]
fn ticks_from_micros_doubles() {
    use platform::Ticks;
    assert_eq!(Ticks::from_micros(3000).get(), 6000, "3000 µs pan = 6000 ticks");
    assert_eq!(Ticks::from_micros(1).get(), 2);
}

#[test]
fn ticks_from_micros_saturates() {
    use platform::Ticks;
    assert_eq!(Ticks::from_micros(u32::MAX).get(), u32::MAX);
}

#[test]
fn ticks_wrapping_add_wraps_like_hardware_counter() {
    use platform::Ticks;
    let near_top = Ticks::new(u32::MAX - 1);
    assert_eq!(near_top.wrapping_add(Ticks::new(3)).get(), 1);
}

#[test]
fn ticks_wrapping_since_across_wrap() {
    use platform::Ticks;
    let earlier = Ticks::new(u32::MAX - 9);
    let later = earlier.wrapping_add(Ticks::new(20));
    assert_eq!(later.wrapping_since(earlier).get(), 20);
}

#[test]
fn ticks_is_one_word() {
    use platform::Ticks;
    assert_eq!(core::mem::size_of::<Ticks>(), 4);
}

// ── Edge ─────────────────────────────────────────────────────────────────────

#[test]
fn edge_opposite_is_involution() {
    use platform::Edge;
    assert_eq!(Edge::Rising.opposite(), Edge::Falling);
    assert_eq!(Edge::Falling.opposite().opposite(), Edge::Falling);
}

// ── PinState ─────────────────────────────────────────────────────────────────

#[test]
fn pin_state_bool_round_trip() {
    use platform::PinState;
    assert_eq!(PinState::from(true), PinState::High);
    assert!(!bool::from(PinState::Low));
}
