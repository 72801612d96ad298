//! Built-in protocol tables.
//!
//! Sample values are microseconds. Tables marked "canonical" use
//! `[open right, close right, open left, close left]`; 3D Vision keeps the
//! vendor order `[close left, open right, close right, open left]`.

use crate::protocol::Protocol;

/// Samsung 2007: one burst per eye, right eye only in slot 0.
static SAMSUNG07_SAMPLES: [u16; 5] = [14, 12, 14, 12, 14];

/// XPAND: one burst per eye.
static XPAND_SAMPLES: [u16; 8] = [18, 20, 18, 20, 18, 18, 60, 18];

/// 3D Vision.
static NVIDIA_3D_VISION_SAMPLES: [u16; 10] = [23, 21, 24, 23, 46, 31, 23, 78, 40, 43];

/// Sharp: one burst per eye.
static SHARP_SAMPLES: [u16; 30] = [
    20, 20, 20, 20, 20, 80, 20, 140, 20, 20, 20, 80, 20, 20, 20, //
    20, 20, 20, 20, 20, 60, 20, 60, 20, 20, 20, 80, 20, 20, 20,
];

/// Sony: open/close bursts per eye, canonical slot order.
static SONY_SAMPLES: [u16; 36] = [
    20, 20, 20, 20, 20, 300, 20, 20, 20, //
    20, 20, 20, 20, 20, 220, 20, 20, 20, //
    20, 20, 20, 20, 20, 140, 20, 20, 20, //
    20, 20, 20, 20, 20, 380, 20, 20, 20,
];

/// Panasonic: open/close bursts per eye, canonical slot order.
static PANASONIC_SAMPLES: [u16; 28] = [
    20, 20, 20, 100, 20, 20, 20, //
    20, 60, 20, 20, 20, 60, 20, //
    20, 60, 20, 60, 20, 20, 20, //
    20, 20, 20, 60, 20, 60, 20,
];

/// Samsung 2007 table.
pub static SAMSUNG07: Protocol = Protocol::new("samsung07", [5, 0, 0, 0], [0, 0, 0, 0], &SAMSUNG07_SAMPLES);

/// XPAND table.
pub static XPAND: Protocol = Protocol::new("xpand", [5, 0, 3, 0], [0, 0, 5, 0], &XPAND_SAMPLES);

/// 3D Vision table (default).
pub static NVIDIA_3D_VISION: Protocol = Protocol::new(
    "3dvision",
    [3, 3, 3, 1],
    [0, 3, 6, 9],
    &NVIDIA_3D_VISION_SAMPLES,
);

/// Sharp table.
pub static SHARP: Protocol = Protocol::new("sharp", [15, 0, 15, 0], [0, 0, 15, 0], &SHARP_SAMPLES);

/// Sony table.
pub static SONY: Protocol = Protocol::new("sony", [9, 9, 9, 9], [27, 0, 9, 18], &SONY_SAMPLES);

/// Panasonic table.
pub static PANASONIC: Protocol = Protocol::new(
    "panasonic",
    [7, 7, 7, 7],
    [0, 7, 14, 21],
    &PANASONIC_SAMPLES,
);

/// Selector for a built-in protocol.
///
/// The discriminant is the value carried by the host configuration command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum ProtocolId {
    /// Samsung 2007.
    Samsung07 = 0,
    /// XPAND.
    Xpand = 1,
    /// 3D Vision.
    #[default]
    Nvidia3dVision = 2,
    /// Sharp.
    Sharp = 3,
    /// Sony.
    Sony = 4,
    /// Panasonic.
    Panasonic = 5,
}

impl ProtocolId {
    /// Every built-in protocol.
    pub const ALL: [Self; 6] = [
        Self::Samsung07,
        Self::Xpand,
        Self::Nvidia3dVision,
        Self::Sharp,
        Self::Sony,
        Self::Panasonic,
    ];

    /// Selector for a raw configuration value.
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Samsung07),
            1 => Some(Self::Xpand),
            2 => Some(Self::Nvidia3dVision),
            3 => Some(Self::Sharp),
            4 => Some(Self::Sony),
            5 => Some(Self::Panasonic),
            _ => None,
        }
    }

    /// Raw configuration value.
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// The static table for this protocol.
    pub const fn table(self) -> &'static Protocol {
        match self {
            Self::Samsung07 => &SAMSUNG07,
            Self::Xpand => &XPAND,
            Self::Nvidia3dVision => &NVIDIA_3D_VISION,
            Self::Sharp => &SHARP,
            Self::Sony => &SONY,
            Self::Panasonic => &PANASONIC,
        }
    }

    /// Table name.
    pub const fn name(self) -> &'static str {
        self.table().name()
    }
}
