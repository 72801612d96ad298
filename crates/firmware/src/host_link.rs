//! Serial host link.
//!
//! Bytes from the host UART are reassembled into `[endpoint, len, payload…]`
//! frames, decoded and dispatched. Malformed frames and rejected commands
//! are counted and dropped; the host gets no error channel. Scratch read
//! replies go back on the control endpoint with the same framing.
//!
//! [`serve`] is generic over `embedded_io_async` streams so the same loop
//! runs on the STM32 `BufferedUart` and against an in-memory link in tests.

use embedded_io_async::{Read, Write};
use heapless::Vec;

use emitter::scratch::PACKET_MAX;
use emitter::{decode, Endpoint, FrameDecoder, ScratchReply};
use platform::{InterruptMode, OutputPin, PulseTimer};

use crate::controller::Controller;
use crate::dispatch::{DispatchOutcome, Dispatcher};

/// Frame header: endpoint byte plus length byte.
pub const FRAME_HEADER_LEN: usize = 2;

/// Largest encoded frame on the wire.
pub const FRAME_MAX: usize = FRAME_HEADER_LEN + PACKET_MAX;

/// Link counters, all wrapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LinkStats {
    /// Frames that decoded into a command.
    pub commands: u32,
    /// Frames dropped by the framer or the packet decoder.
    pub malformed: u32,
    /// Commands the controller rejected.
    pub rejected: u32,
    /// Scratch replies produced.
    pub replies: u32,
}

/// Framing, decoding and dispatch state of the host link.
#[derive(Debug, Default)]
pub struct HostLink {
    decoder: FrameDecoder,
    dispatcher: Dispatcher,
    stats: LinkStats,
}

impl HostLink {
    /// Idle link with zeroed scratch memory.
    pub const fn new() -> Self {
        Self {
            decoder: FrameDecoder::new(),
            dispatcher: Dispatcher::new(),
            stats: LinkStats {
                commands: 0,
                malformed: 0,
                rejected: 0,
                replies: 0,
            },
        }
    }

    /// Feed one received byte at `now_ms`.
    pub fn feed<T, P>(
        &mut self,
        controller: &Controller<'_, T, P>,
        byte: u8,
        now_ms: u32,
    ) -> DispatchOutcome
    where
        T: PulseTimer,
        P: OutputPin,
    {
        let decoded = match self.decoder.push(byte) {
            Ok(None) => return DispatchOutcome::None,
            Ok(Some((endpoint, payload))) => decode(endpoint, payload),
            Err(e) => Err(e),
        };
        let command = match decoded {
            Ok(command) => command,
            Err(_e) => {
                self.stats.malformed = self.stats.malformed.wrapping_add(1);
                #[cfg(feature = "defmt")]
                defmt::debug!("host frame dropped: {}", _e);
                return DispatchOutcome::None;
            }
        };

        self.stats.commands = self.stats.commands.wrapping_add(1);
        match self.dispatcher.dispatch(controller, command, now_ms) {
            Ok(outcome) => {
                if matches!(outcome, DispatchOutcome::Reply(_)) {
                    self.stats.replies = self.stats.replies.wrapping_add(1);
                }
                outcome
            }
            Err(_) => {
                self.stats.rejected = self.stats.rejected.wrapping_add(1);
                #[cfg(feature = "defmt")]
                defmt::warn!("host command rejected");
                DispatchOutcome::None
            }
        }
    }

    /// `true` once a well-formed command has arrived.
    pub fn is_up(&self) -> bool {
        self.stats.commands > 0
    }

    /// Link counters.
    pub fn stats(&self) -> LinkStats {
        self.stats
    }

    /// Command dispatcher (and its scratch memory).
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }
}

/// Frame a scratch reply for the control endpoint.
pub fn encode_reply(reply: &ScratchReply) -> Vec<u8, FRAME_MAX> {
    let mut frame = Vec::new();
    // A reply never exceeds PACKET_MAX, so header plus payload fits FRAME_MAX.
    let _ = frame.push(Endpoint::Control as u8);
    let _ = frame.push(u8::try_from(reply.len()).unwrap_or(u8::MAX));
    let _ = frame.extend_from_slice(reply);
    frame
}

/// Serve the host link until the stream ends.
///
/// `now_ms` is sampled per byte. `on_trigger` receives the new sync input
/// edge configuration after every sync mode change; `on_link_up` fires once,
/// on the first well-formed command.
pub async fn serve<L, T, P>(
    link: &mut L,
    host: &mut HostLink,
    controller: &Controller<'_, T, P>,
    now_ms: impl Fn() -> u32,
    mut on_trigger: impl FnMut(Option<InterruptMode>),
    mut on_link_up: impl FnMut(),
) -> Result<(), L::Error>
where
    L: Read + Write,
    T: PulseTimer,
    P: OutputPin,
{
    let mut buf = [0u8; 32];
    loop {
        let n = link.read(&mut buf).await?;
        if n == 0 {
            return Ok(());
        }
        for &byte in buf.get(..n).unwrap_or_default() {
            let was_up = host.is_up();
            match host.feed(controller, byte, now_ms()) {
                DispatchOutcome::None => {}
                DispatchOutcome::Reply(reply) => link.write_all(&encode_reply(&reply)).await?,
                DispatchOutcome::TriggerChanged(trigger) => on_trigger(trigger),
            }
            if !was_up && host.is_up() {
                on_link_up();
            }
        }
    }
}
