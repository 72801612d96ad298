//! Host packet decoding.
//!
//! The host talks to two logical endpoints:
//!
//! - **Swap**: eye packets `[0xAA, 0xFE | 0xFF]`. The low bit of the second
//!   byte is the eye; the packet labels the frame that follows it.
//! - **Control**: scratch memory requests
//!   `[command, region, amount, reserved, data…]` and configuration
//!   `[0x80, key, value]`.
//!
//! On the serial link each packet travels as `[endpoint, len, payload…]`;
//! [`FrameDecoder`] reassembles those byte by byte.

use core::fmt;

use heapless::Vec;

use crate::config::RefreshRate;
use crate::eye::Eye;
use crate::library::ProtocolId;
use crate::scratch::{
    ScratchRequest, CMD_CLEAR, CMD_READ, CMD_WRITE, DATA_MAX, HEADER_LEN, PACKET_MAX,
};
use crate::sync::SyncMode;

/// Marker byte of an eye packet.
pub const EYE_MARKER: u8 = 0xAA;

/// Command byte of a configuration packet.
pub const CMD_CONFIGURE: u8 = 0x80;

/// Logical destination of a host packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Endpoint {
    /// Eye sync packets.
    Swap = 0x01,
    /// Scratch memory and configuration.
    Control = 0x02,
}

impl Endpoint {
    /// Endpoint for a frame header byte.
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x01 => Some(Self::Swap),
            0x02 => Some(Self::Control),
            _ => None,
        }
    }
}

/// Runtime configuration change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigCommand {
    /// Key 0.
    SyncMode(SyncMode),
    /// Key 1; any nonzero value swaps.
    SwapEyes(bool),
    /// Key 2.
    Protocol(ProtocolId),
    /// Key 3.
    Refresh(RefreshRate),
}

/// A decoded host packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCommand {
    /// Stage (and possibly start) a frame for this eye.
    EyeSync(Eye),
    /// Scratch memory access.
    Scratch(ScratchRequest),
    /// Configuration change.
    Configure(ConfigCommand),
}

/// Host packet decoding errors. The firmware drops the packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HostError {
    /// Packet shorter than its command needs.
    ShortPacket {
        /// Bytes received.
        len: usize,
        /// Bytes required.
        needed: usize,
    },
    /// Swap endpoint packet without the eye marker.
    NotEyePacket,
    /// Control command with no known bit set.
    UnknownCommand(u8),
    /// Configuration key outside 0..=3.
    UnknownConfigKey(u8),
    /// Configuration value not valid for its key.
    InvalidValue {
        /// Key.
        key: u8,
        /// Rejected value.
        value: u8,
    },
    /// Frame header names no endpoint.
    UnknownEndpoint(u8),
    /// Frame length above [`PACKET_MAX`].
    Oversized(u8),
}

#[cfg(feature = "std")]
impl std::error::Error for HostError {}

impl fmt::Display for HostError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ShortPacket { len, needed } => {
                write!(f, "packet of {len} bytes, need {needed}")
            }
            Self::NotEyePacket => write!(f, "not an eye packet"),
            Self::UnknownCommand(c) => write!(f, "unknown command 0x{c:02X}"),
            Self::UnknownConfigKey(k) => write!(f, "unknown config key {k}"),
            Self::InvalidValue { key, value } => {
                write!(f, "invalid value {value} for config key {key}")
            }
            Self::UnknownEndpoint(e) => write!(f, "unknown endpoint 0x{e:02X}"),
            Self::Oversized(len) => write!(f, "frame of {len} bytes exceeds {PACKET_MAX}"),
        }
    }
}

/// Decode one packet received on `endpoint`.
pub fn decode(endpoint: Endpoint, packet: &[u8]) -> Result<HostCommand, HostError> {
    match endpoint {
        Endpoint::Swap => decode_eye(packet).map(HostCommand::EyeSync),
        Endpoint::Control => decode_control(packet),
    }
}

fn decode_eye(packet: &[u8]) -> Result<Eye, HostError> {
    let [marker, selector, ..] = *packet else {
        return Err(HostError::ShortPacket {
            len: packet.len(),
            needed: 2,
        });
    };
    if marker == EYE_MARKER && selector & 0xFE == 0xFE {
        Ok(Eye::from_u8(selector))
    } else {
        Err(HostError::NotEyePacket)
    }
}

fn decode_control(packet: &[u8]) -> Result<HostCommand, HostError> {
    let [command, second, third, ..] = *packet else {
        return Err(HostError::ShortPacket {
            len: packet.len(),
            needed: 3,
        });
    };

    if command == CMD_CONFIGURE {
        return decode_config(second, third).map(HostCommand::Configure);
    }
    if command & (CMD_WRITE | CMD_READ | CMD_CLEAR) == 0 {
        return Err(HostError::UnknownCommand(command));
    }

    let payload = packet.get(HEADER_LEN..).unwrap_or(&[]);
    let take = payload.len().min(DATA_MAX);
    let data = payload
        .get(..take)
        .and_then(|bytes| Vec::from_slice(bytes).ok())
        .unwrap_or_default();
    Ok(HostCommand::Scratch(ScratchRequest {
        command,
        region: second,
        amount: third,
        data,
    }))
}

fn decode_config(key: u8, value: u8) -> Result<ConfigCommand, HostError> {
    let invalid = HostError::InvalidValue { key, value };
    match key {
        0 => SyncMode::from_bits(value)
            .map(ConfigCommand::SyncMode)
            .ok_or(invalid),
        1 => Ok(ConfigCommand::SwapEyes(value != 0)),
        2 => ProtocolId::from_u8(value)
            .map(ConfigCommand::Protocol)
            .ok_or(invalid),
        3 => RefreshRate::from_u8(value)
            .map(ConfigCommand::Refresh)
            .ok_or(invalid),
        _ => Err(HostError::UnknownConfigKey(key)),
    }
}

/// Reassembles `[endpoint, len, payload…]` frames from a byte stream.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    state: FrameState,
    payload: Vec<u8, PACKET_MAX>,
}

#[derive(Debug, Clone, Copy, Default)]
enum FrameState {
    #[default]
    Endpoint,
    Length(Endpoint),
    Payload(Endpoint, usize),
}

impl FrameDecoder {
    /// Empty decoder waiting for an endpoint byte.
    pub const fn new() -> Self {
        Self {
            state: FrameState::Endpoint,
            payload: Vec::new(),
        }
    }

    /// Feed one byte. Returns a complete packet when `byte` finishes one.
    ///
    /// On a header error the decoder resynchronizes on the next byte.
    pub fn push(&mut self, byte: u8) -> Result<Option<(Endpoint, &[u8])>, HostError> {
        match self.state {
            FrameState::Endpoint => {
                let endpoint = Endpoint::from_u8(byte).ok_or(HostError::UnknownEndpoint(byte))?;
                self.state = FrameState::Length(endpoint);
                Ok(None)
            }
            FrameState::Length(endpoint) => {
                let len = usize::from(byte);
                if len > PACKET_MAX {
                    self.state = FrameState::Endpoint;
                    return Err(HostError::Oversized(byte));
                }
                self.payload.clear();
                if len == 0 {
                    self.state = FrameState::Endpoint;
                    return Ok(Some((endpoint, &[])));
                }
                self.state = FrameState::Payload(endpoint, len);
                Ok(None)
            }
            FrameState::Payload(endpoint, len) => {
                // Length was checked against the capacity in `Length`.
                let _ = self.payload.push(byte);
                if self.payload.len() < len {
                    return Ok(None);
                }
                self.state = FrameState::Endpoint;
                Ok(Some((endpoint, self.payload.as_slice())))
            }
        }
    }
}
