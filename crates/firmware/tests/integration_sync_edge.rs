//! External sync edges through the controller, down to the IR waveform.
// Integration test file: expect/unwrap are intentional.
#![allow(clippy::unwrap_used, clippy::expect_used)]

use core::cell::RefCell;

use critical_section::Mutex;
use emitter::{
    Eye, ProtocolId, PulseEngine, PulsePhase, StatusChange, StatusLeds, SyncArbitrator, SyncMode,
    TimingConfig, TokenIndex,
};
use firmware::sync_input::{configure_trigger, handle_edge, EdgeSample};
use firmware::{Controller, EngineCell};
use platform::mocks::{MockInputPin, MockPin, MockPulseTimer};
use platform::{Edge, InterruptMode, InterruptPin};

fn cell(id: ProtocolId) -> EngineCell<MockPulseTimer, MockPin> {
    let engine = PulseEngine::new(
        id.table(),
        TimingConfig::default(),
        MockPulseTimer::new(),
        MockPin::default(),
        MockPin::default(),
    )
    .unwrap();
    Mutex::new(RefCell::new(Some(engine)))
}

/// Fire the chain to completion, as the TIM5 interrupt would.
fn drain(ctl: &Controller<'_, MockPulseTimer, MockPin>) -> Vec<Edge> {
    let mut fired = Vec::new();
    while let Some(edge) = ctl
        .with_engine(|e| Ok(e.timer_mut().fire_next()))
        .unwrap()
    {
        ctl.on_compare(edge).unwrap();
        fired.push(edge);
    }
    fired
}

#[test]
fn external_mode_high_level_starts_left_frame() {
    let sync = SyncArbitrator::new(SyncMode::External);
    let cell = cell(ProtocolId::Nvidia3dVision);
    let ctl = Controller::new(&sync, &cell);

    let line = MockInputPin::new(true);
    let force = MockInputPin::new(true);
    let sample = EdgeSample::read(&line, &force).unwrap();
    assert!(handle_edge(&ctl, sample, 10).unwrap());

    let token = ctl.with_engine(|e| Ok(e.current_token())).unwrap();
    assert_eq!(token, Some(TokenIndex::SLOT_2));

    // Left frame on 3D Vision: token 2 (3 samples) then token 3 (1 sample).
    let fired = drain(&ctl);
    assert_eq!(fired.len(), 6, "4 samples plus 2 end-of-token compares");
    let stats = ctl.stats().unwrap();
    assert_eq!(stats.samples_emitted, 4);
    assert_eq!(stats.frames_completed, 1);
}

#[test]
fn combined_mode_edge_only_authorizes_host_staged_eye() {
    let sync = SyncArbitrator::new(SyncMode::Combined);
    let cell = cell(ProtocolId::Nvidia3dVision);
    let ctl = Controller::new(&sync, &cell);
    let line = MockInputPin::new(false);
    let released = MockInputPin::new(true);

    // No staged eye yet: the edge is admitted but starts nothing.
    let sample = EdgeSample::read(&line, &released).unwrap();
    assert!(!handle_edge(&ctl, sample, 0).unwrap());

    // Host stages left; the line level (right) does not override it.
    assert_eq!(ctl.on_host_eye(Eye::Left, 1).unwrap(), None);
    assert!(handle_edge(&ctl, sample, 2).unwrap());
    assert_eq!(sync.current_eye(), Eye::Left);
    assert_eq!(sync.frames_started(), 1);
}

#[test]
fn combined_mode_force_line_lets_level_choose_eye() {
    let sync = SyncArbitrator::new(SyncMode::Combined);
    let cell = cell(ProtocolId::Nvidia3dVision);
    let ctl = Controller::new(&sync, &cell);
    let line = MockInputPin::new(true);
    let asserted = MockInputPin::new(false);

    let sample = EdgeSample::read(&line, &asserted).unwrap();
    assert!(sample.force);
    assert!(handle_edge(&ctl, sample, 0).unwrap());
    assert_eq!(sync.current_eye(), Eye::Left);
}

#[test]
fn mode_switch_reconfigures_input_and_aborts_frame() {
    let sync = SyncArbitrator::new(SyncMode::External);
    let cell = cell(ProtocolId::Panasonic);
    let ctl = Controller::new(&sync, &cell);
    let mut line = MockInputPin::new(false);
    configure_trigger(&mut line, SyncMode::External.external_trigger()).unwrap();
    assert_eq!(line.interrupt_mode(), Some(InterruptMode::BothEdges));

    let force = MockInputPin::new(true);
    let sample = EdgeSample::read(&line, &force).unwrap();
    assert!(handle_edge(&ctl, sample, 0).unwrap());

    // Fire into the second mark, then switch source mid-token.
    for _ in 0..3 {
        let edge = ctl
            .with_engine(|e| Ok(e.timer_mut().fire_next()))
            .unwrap()
            .unwrap();
        ctl.on_compare(edge).unwrap();
    }
    assert!(ctl.with_engine(|e| Ok(e.ir().is_set_high())).unwrap());
    let trigger = ctl.set_sync_mode(SyncMode::FreeRun).unwrap();
    configure_trigger(&mut line, trigger).unwrap();

    assert_eq!(line.interrupt_mode(), None);
    let (phase, ir_high) = ctl
        .with_engine(|e| Ok((e.phase(), e.ir().is_set_high())))
        .unwrap();
    assert_eq!(phase, PulsePhase::Idle);
    assert!(!ir_high, "IR line released on cancel");

    // Edges are now out of mode.
    assert!(!handle_edge(&ctl, sample, 5).unwrap());
    assert_eq!(sync.ignored().external, 1);
}

#[test]
fn lost_sync_source_times_out_and_recovers() {
    let sync = SyncArbitrator::new(SyncMode::External);
    let cell = cell(ProtocolId::Samsung07);
    let ctl = Controller::new(&sync, &cell);
    let mut leds = StatusLeds::new(MockPin::default(), MockPin::default()).unwrap();
    let line = MockInputPin::new(false);
    let force = MockInputPin::new(true);
    let sample = EdgeSample::read(&line, &force).unwrap();

    handle_edge(&ctl, sample, 0).unwrap();
    drain(&ctl);

    let mut changes = Vec::new();
    for now in 1..=400 {
        if now == 300 {
            handle_edge(&ctl, sample, now).unwrap();
            drain(&ctl);
        }
        if let Some(change) = ctl.poll(now).unwrap().status {
            leds.apply(change).unwrap();
            changes.push((now, change));
        }
    }

    assert_eq!(
        changes,
        vec![
            (1, StatusChange::Activated),
            (200, StatusChange::TimedOut),
            (300, StatusChange::Activated),
        ]
    );
    assert!(leds.syncing().is_set_high());
}
