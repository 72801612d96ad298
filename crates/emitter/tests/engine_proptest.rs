//! Property-based tests for protocol tables and the pulse chain.
//! Arbitrary valid tables, not just the built-in library.

use emitter::library::ProtocolId;
use emitter::{
    Eye, Protocol, PulseEngine, PulsePhase, SyncArbitrator, SyncMode, TimingConfig, TokenIndex,
};
use platform::mocks::{MockPin, MockPulseTimer};
use platform::{PulseTimer, Ticks};
use proptest::prelude::*;

/// Leak a table so it can be handed to the engine as `&'static`.
fn leak_protocol(sizes: [u8; 4], samples: Vec<u16>) -> &'static Protocol {
    let mut indices = [0u8; 4];
    let mut next = 0u8;
    for (index, size) in indices.iter_mut().zip(sizes) {
        *index = next;
        next += size;
    }
    let samples: &'static [u16] = Box::leak(samples.into_boxed_slice());
    Box::leak(Box::new(Protocol::new("prop", sizes, indices, samples)))
}

/// Run a frame; returns (tick of first mark, tick the chain went idle, samples emitted).
fn run(
    protocol: &'static Protocol,
    token: TokenIndex,
    timing: TimingConfig,
) -> (Ticks, Ticks, u32) {
    let mut engine = PulseEngine::new(
        protocol,
        timing,
        MockPulseTimer::new(),
        MockPin::default(),
        MockPin::default(),
    )
    .unwrap();
    assert!(engine.begin_token(token).unwrap());
    let first = engine.timer().armed().unwrap().1;
    while let Some(edge) = engine.timer_mut().fire_next() {
        engine.on_compare(edge).unwrap();
    }
    assert_eq!(engine.phase(), PulsePhase::Idle);
    (first, engine.timer().now(), engine.stats().samples_emitted)
}

fn table() -> impl Strategy<Value = ([u8; 4], Vec<u16>)> {
    prop::array::uniform4(0u8..=12).prop_flat_map(|sizes| {
        let sizes = if sizes.iter().all(|&s| s == 0) { [1, 0, 0, 0] } else { sizes };
        let total: usize = sizes.iter().map(|&s| usize::from(s)).sum();
        (Just(sizes), prop::collection::vec(1u16..=400, total))
    })
}

proptest::proptest! {
    /// Every sample of every present token lies inside the sample array.
    #[test]
    fn generated_tables_validate((sizes, samples) in table()) {
        let protocol = leak_protocol(sizes, samples);
        prop_assert_eq!(protocol.validate(), Ok(()));
    }

    /// A lone opening token lasts exactly the sum of its samples, doubled.
    #[test]
    fn single_token_duration_is_exact(samples in prop::collection::vec(1u16..=500, 1..=30)) {
        let n = u8::try_from(samples.len()).unwrap();
        let sum: u32 = samples.iter().map(|&s| u32::from(s)).sum();
        let protocol = leak_protocol([n, 0, 0, 0], samples);
        let (first, end, emitted) = run(protocol, TokenIndex::SLOT_0, TimingConfig::default());
        prop_assert_eq!(end.wrapping_since(first), Ticks::from_micros(sum));
        prop_assert_eq!(emitted, u32::from(n));
    }

    /// An opening token with a present pair chains after exactly the gap.
    #[test]
    fn paired_tokens_chain_after_gap(
        open in prop::collection::vec(1u16..=300, 1..=10),
        close in prop::collection::vec(1u16..=300, 1..=10),
        gap_us in 1u32..=4000,
    ) {
        let sizes = [u8::try_from(open.len()).unwrap(), u8::try_from(close.len()).unwrap(), 0, 0];
        let sum: u32 = open.iter().chain(&close).map(|&s| u32::from(s)).sum();
        let protocol = leak_protocol(sizes, open.into_iter().chain(close).collect());
        let timing = TimingConfig { pan_us: 3000, frame_gap_us: gap_us };
        let (first, end, emitted) = run(protocol, TokenIndex::SLOT_0, timing);
        prop_assert_eq!(end.wrapping_since(first), Ticks::from_micros(sum + gap_us));
        prop_assert_eq!(emitted, u32::from(sizes[0]) + u32::from(sizes[1]));
    }

    /// Closing tokens never chain, even when slot index + 1 would exist.
    #[test]
    fn closing_token_ends_frame((sizes, samples) in table()) {
        let protocol = leak_protocol(sizes, samples);
        for token in [TokenIndex::SLOT_1, TokenIndex::SLOT_3] {
            if protocol.slot(token).is_present() {
                let (_, _, emitted) = run(protocol, token, TimingConfig::default());
                prop_assert_eq!(emitted, u32::from(protocol.slot(token).len));
            }
        }
    }

    /// Staging then starting always yields eye XOR swap.
    #[test]
    fn start_frame_yields_eye_xor_swap(prior in any::<bool>(), eye in any::<bool>(), swap in any::<bool>()) {
        let sync = SyncArbitrator::new(SyncMode::Driver);
        sync.set_eye(Eye::from_bit(prior));
        sync.start_frame(0);
        sync.set_swap_eyes(swap);
        sync.set_eye(Eye::from_bit(eye));
        sync.start_frame(1);
        prop_assert_eq!(sync.current_eye().as_u8(), u8::from(eye) ^ u8::from(swap));
    }

    /// Liveness clears `active` at the threshold for any start time, across wrap.
    #[test]
    fn timeout_at_threshold_for_any_start(start in any::<u32>(), extra in 0u32..1000) {
        let sync = SyncArbitrator::new(SyncMode::Driver);
        sync.on_host_eye(Eye::Right, start);
        sync.update(start);
        sync.update(start.wrapping_add(199));
        prop_assert!(sync.is_active());
        sync.update(start.wrapping_add(200 + extra));
        prop_assert!(!sync.is_active());
    }
}

#[test]
fn library_tables_frame_duration_matches_samples() {
    for id in ProtocolId::ALL {
        let protocol = id.table();
        for token in [TokenIndex::SLOT_0, TokenIndex::SLOT_2] {
            if !protocol.slot(token).is_present() {
                continue;
            }
            let mut expected = protocol.token_duration_us(token);
            if let Some(pair) = token.paired().filter(|p| protocol.slot(*p).is_present()) {
                expected += protocol.token_duration_us(pair) + 1000;
            }
            let (first, end, _) = run(protocol, token, TimingConfig::default());
            assert_eq!(
                end.wrapping_since(first),
                Ticks::from_micros(expected),
                "{} token {}",
                id.name(),
                token.get()
            );
        }
    }
}
