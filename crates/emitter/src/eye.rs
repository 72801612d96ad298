//! Eye selection.

use crate::protocol::TokenIndex;

/// Which shutter a frame opens.
///
/// The discriminant is the legacy wire/bit value: right = 0, left = 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Eye {
    /// Right eye (bit value 0).
    #[default]
    Right = 0,
    /// Left eye (bit value 1).
    Left = 1,
}

impl Eye {
    /// Eye for a single bit: `false` = right, `true` = left.
    pub const fn from_bit(bit: bool) -> Self {
        if bit {
            Self::Left
        } else {
            Self::Right
        }
    }

    /// Eye for the low bit of `value`.
    pub const fn from_u8(value: u8) -> Self {
        Self::from_bit(value & 1 != 0)
    }

    /// Bit value (right = 0, left = 1).
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// The other eye.
    #[must_use]
    pub const fn flipped(self) -> Self {
        match self {
            Self::Right => Self::Left,
            Self::Left => Self::Right,
        }
    }

    /// `self XOR swap`, for physically mirrored glasses.
    #[must_use]
    pub const fn swapped(self, swap: bool) -> Self {
        if swap {
            self.flipped()
        } else {
            self
        }
    }

    /// First token of this eye's frame: slot `eye * 2`.
    pub const fn opening_token(self) -> TokenIndex {
        match self {
            Self::Right => TokenIndex::SLOT_0,
            Self::Left => TokenIndex::SLOT_2,
        }
    }

    /// Short name for logs.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Right => "right",
            Self::Left => "left",
        }
    }
}
