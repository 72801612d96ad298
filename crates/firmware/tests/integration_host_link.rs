//! Host link end to end: bytes in, waveform and replies out.
// Integration test file: expect/unwrap are intentional.
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]

use core::cell::RefCell;
use std::collections::VecDeque;

use critical_section::Mutex;
use embedded_io_async::{ErrorKind, ErrorType, Read, Write};
use emitter::scratch::{CMD_READ, CMD_WRITE, REGION_18};
use emitter::{Eye, ProtocolId, PulseEngine, SyncArbitrator, SyncMode, TimingConfig};
use firmware::host_link::serve;
use firmware::{Controller, EngineCell, HostLink};
use platform::mocks::{MockPin, MockPulseTimer};
use platform::InterruptMode;

/// In-memory serial port: reads drain `rx` in chunks, writes append to `tx`.
struct ScriptedLink {
    rx: VecDeque<u8>,
    chunk: usize,
    tx: Vec<u8>,
}

impl ScriptedLink {
    fn new(bytes: &[u8], chunk: usize) -> Self {
        Self {
            rx: bytes.iter().copied().collect(),
            chunk,
            tx: Vec::new(),
        }
    }
}

impl ErrorType for ScriptedLink {
    type Error = ErrorKind;
}

impl Read for ScriptedLink {
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let n = buf.len().min(self.chunk).min(self.rx.len());
        for slot in buf.iter_mut().take(n) {
            *slot = self.rx.pop_front().unwrap();
        }
        Ok(n)
    }
}

impl Write for ScriptedLink {
    async fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        self.tx.extend_from_slice(buf);
        Ok(buf.len())
    }

    async fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

fn cell() -> EngineCell<MockPulseTimer, MockPin> {
    let engine = PulseEngine::new(
        ProtocolId::Nvidia3dVision.table(),
        TimingConfig::default(),
        MockPulseTimer::new(),
        MockPin::default(),
        MockPin::default(),
    )
    .unwrap();
    Mutex::new(RefCell::new(Some(engine)))
}

const SWAP: u8 = 0x01;
const CONTROL: u8 = 0x02;

#[tokio::test]
async fn eye_packets_split_across_reads_start_frames() {
    let sync = SyncArbitrator::new(SyncMode::Driver);
    let cell = cell();
    let ctl = Controller::new(&sync, &cell);
    let mut host = HostLink::new();

    // Two frames, delivered three bytes at a time.
    let bytes = [SWAP, 2, 0xAA, 0xFE, SWAP, 2, 0xAA, 0xFF];
    let mut link = ScriptedLink::new(&bytes, 3);
    let mut link_ups = 0;

    serve(&mut link, &mut host, &ctl, || 42, |_| {}, || link_ups += 1)
        .await
        .unwrap();

    assert_eq!(sync.frames_started(), 2);
    assert_eq!(sync.current_eye(), Eye::Left);
    assert_eq!(link_ups, 1, "link-up fires once");
    assert!(link.tx.is_empty(), "eye packets are never answered");
    assert_eq!(host.stats().commands, 2);
}

#[tokio::test]
async fn scratch_read_reply_is_framed_on_control_endpoint() {
    let sync = SyncArbitrator::default();
    let cell = cell();
    let ctl = Controller::new(&sync, &cell);
    let mut host = HostLink::new();

    let bytes = [
        CONTROL, 7, CMD_WRITE, REGION_18, 3, 0, 0x0A, 0x0B, 0x0C, // write
        CONTROL, 4, CMD_READ, REGION_18, 3, 0, // read
    ];
    let mut link = ScriptedLink::new(&bytes, 16);

    serve(&mut link, &mut host, &ctl, || 0, |_| {}, || {})
        .await
        .unwrap();

    assert_eq!(
        link.tx,
        vec![CONTROL, 7, REGION_18, 3, 0x00, 0x04, 0x0A, 0x0B, 0x0C]
    );
    assert_eq!(host.stats().replies, 1);
}

#[tokio::test]
async fn mode_change_reports_new_trigger() {
    let sync = SyncArbitrator::new(SyncMode::Driver);
    let cell = cell();
    let ctl = Controller::new(&sync, &cell);
    let mut host = HostLink::new();

    // Configure key 0 (sync mode) = External, then back to Driver.
    let bytes = [CONTROL, 3, 0x80, 0, 2, CONTROL, 3, 0x80, 0, 1];
    let mut link = ScriptedLink::new(&bytes, 64);
    let mut triggers = Vec::new();

    serve(&mut link, &mut host, &ctl, || 0, |t| triggers.push(t), || {})
        .await
        .unwrap();

    assert_eq!(triggers, vec![Some(InterruptMode::BothEdges), None]);
    assert_eq!(sync.mode(), SyncMode::Driver);
}

#[tokio::test]
async fn malformed_frames_do_not_desynchronize_the_stream() {
    let sync = SyncArbitrator::new(SyncMode::Driver);
    let cell = cell();
    let ctl = Controller::new(&sync, &cell);
    let mut host = HostLink::new();

    let bytes = [
        0x33, // unknown endpoint, skipped
        CONTROL, 3, 0x80, 9, 0, // unknown config key
        SWAP, 2, 0xAA, 0xFE, // valid
    ];
    let mut link = ScriptedLink::new(&bytes, 5);

    serve(&mut link, &mut host, &ctl, || 0, |_| {}, || {})
        .await
        .unwrap();

    assert_eq!(host.stats().malformed, 2);
    assert_eq!(host.stats().commands, 1);
    assert_eq!(sync.frames_started(), 1);
}

#[tokio::test]
async fn protocol_switch_over_the_link_cancels_chain() {
    let sync = SyncArbitrator::new(SyncMode::Driver);
    let cell = cell();
    let ctl = Controller::new(&sync, &cell);
    let mut host = HostLink::new();

    // Start a frame, then select XPAND (key 2 = 1) before it completes.
    let bytes = [SWAP, 2, 0xAA, 0xFE, CONTROL, 3, 0x80, 2, 1];
    let mut link = ScriptedLink::new(&bytes, 64);

    serve(&mut link, &mut host, &ctl, || 0, |_| {}, || {})
        .await
        .unwrap();

    let (busy, name, cancelled) = ctl
        .with_engine(|e| Ok((e.is_busy(), e.protocol().name(), e.stats().frames_cancelled)))
        .unwrap();
    assert!(!busy);
    assert_eq!(name, ProtocolId::Xpand.name());
    assert_eq!(cancelled, 1);
}
