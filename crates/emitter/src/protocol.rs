//! IR protocol tables.
//!
//! A [`Protocol`] describes one glasses standard as four token slots and one
//! shared array of pulse samples. Each present slot points at a contiguous
//! run of samples; the samples alternate mark (IR on) and space (IR off)
//! durations, starting with a mark, in microseconds. The engine doubles each
//! sample to get 0.5 µs timer ticks.
//!
//! # Slot ordering
//!
//! Canonical ordering is `[open right, close right, open left, close left]`.
//! The sequencer only cares that even slots start a frame and odd slots
//! optionally follow them, so protocols are free to reorder (3D Vision uses
//! `[close left, open right, close right, open left]`).
//!
//! # Invariant
//!
//! For every present slot, `start + len <= samples.len()`. Checked once by
//! [`Protocol::validate`]; the pulse engine refuses unvalidated tables.

use core::fmt;

/// Number of token slots per protocol.
pub const TOKEN_SLOTS: usize = 4;

/// Index of a token slot, always in `0..4`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TokenIndex(u8);

impl TokenIndex {
    /// Slot 0.
    pub const SLOT_0: Self = Self(0);
    /// Slot 1.
    pub const SLOT_1: Self = Self(1);
    /// Slot 2.
    pub const SLOT_2: Self = Self(2);
    /// Slot 3.
    pub const SLOT_3: Self = Self(3);

    /// All slots in order.
    pub const ALL: [Self; TOKEN_SLOTS] = [Self::SLOT_0, Self::SLOT_1, Self::SLOT_2, Self::SLOT_3];

    /// Slot `index`, or `None` when `index >= 4`.
    pub const fn new(index: u8) -> Option<Self> {
        if (index as usize) < TOKEN_SLOTS {
            Some(Self(index))
        } else {
            None
        }
    }

    /// Raw slot number.
    pub const fn get(self) -> u8 {
        self.0
    }

    /// Even slots open a frame.
    pub const fn is_opening(self) -> bool {
        self.0 & 1 == 0
    }

    /// The closing slot paired with an opening slot (`index + 1`).
    ///
    /// `None` for odd (closing) slots.
    pub const fn paired(self) -> Option<Self> {
        match self.0 {
            0 => Some(Self::SLOT_1),
            2 => Some(Self::SLOT_3),
            _ => None,
        }
    }

    const fn as_usize(self) -> usize {
        self.0 as usize
    }
}

/// Where one token's samples live in the shared array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TokenSlot {
    /// Index of the first sample.
    pub start: u8,
    /// Number of samples; 0 marks an absent token.
    pub len: u8,
}

impl TokenSlot {
    /// Absent slot.
    pub const EMPTY: Self = Self { start: 0, len: 0 };

    /// Slot covering `len` samples from `start`.
    pub const fn new(start: u8, len: u8) -> Self {
        Self { start, len }
    }

    /// `true` when the slot carries samples.
    pub const fn is_present(self) -> bool {
        self.len > 0
    }

    /// One past the last sample index.
    pub const fn end(self) -> usize {
        (self.start as usize).saturating_add(self.len as usize)
    }
}

/// Protocol table validation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ProtocolError {
    /// No slot has any samples; the table could never emit anything.
    NoTokens,
    /// A present slot reaches past the end of the sample array.
    SlotOutOfBounds {
        /// Offending slot.
        token: u8,
        /// One past the slot's last sample index.
        end: usize,
        /// Length of the shared sample array.
        samples: usize,
    },
    /// A sample of zero would schedule an edge on the current compare value.
    ZeroSample {
        /// Index into the shared sample array.
        index: usize,
    },
}

#[cfg(feature = "std")]
impl std::error::Error for ProtocolError {}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoTokens => write!(f, "protocol has no tokens"),
            Self::SlotOutOfBounds {
                token,
                end,
                samples,
            } => write!(
                f,
                "token {token} ends at sample {end}, beyond the {samples}-sample table"
            ),
            Self::ZeroSample { index } => write!(f, "sample {index} has zero duration"),
        }
    }
}

/// Static description of one IR waveform family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Protocol {
    name: &'static str,
    slots: [TokenSlot; TOKEN_SLOTS],
    samples: &'static [u16],
}

impl Protocol {
    /// Build a table from per-slot sample counts and start indices.
    ///
    /// Not validated; call [`validate`](Self::validate) before use.
    pub const fn new(
        name: &'static str,
        sizes: [u8; TOKEN_SLOTS],
        indices: [u8; TOKEN_SLOTS],
        samples: &'static [u16],
    ) -> Self {
        Self {
            name,
            slots: [
                TokenSlot::new(indices[0], sizes[0]),
                TokenSlot::new(indices[1], sizes[1]),
                TokenSlot::new(indices[2], sizes[2]),
                TokenSlot::new(indices[3], sizes[3]),
            ],
            samples,
        }
    }

    /// Check the slot/sample invariant.
    pub fn validate(&self) -> Result<(), ProtocolError> {
        if !self.slots.iter().any(|slot| slot.is_present()) {
            return Err(ProtocolError::NoTokens);
        }
        for token in TokenIndex::ALL {
            let slot = self.slot(token);
            if !slot.is_present() {
                continue;
            }
            if slot.end() > self.samples.len() {
                return Err(ProtocolError::SlotOutOfBounds {
                    token: token.get(),
                    end: slot.end(),
                    samples: self.samples.len(),
                });
            }
            let first = usize::from(slot.start);
            if let Some(offset) = self
                .token_samples(token)
                .and_then(|s| s.iter().position(|&sample| sample == 0))
            {
                return Err(ProtocolError::ZeroSample {
                    index: first.saturating_add(offset),
                });
            }
        }
        Ok(())
    }

    /// Display name.
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Slot descriptor for `token`.
    #[allow(clippy::indexing_slicing)] // TokenIndex is always < TOKEN_SLOTS
    pub const fn slot(&self, token: TokenIndex) -> TokenSlot {
        self.slots[token.as_usize()]
    }

    /// The whole shared sample array.
    pub const fn samples(&self) -> &'static [u16] {
        self.samples
    }

    /// Sample at `index` in the shared array.
    pub fn sample(&self, index: usize) -> Option<u16> {
        self.samples.get(index).copied()
    }

    /// Samples of `token`, or `None` when the slot is absent or out of range.
    pub fn token_samples(&self, token: TokenIndex) -> Option<&'static [u16]> {
        let slot = self.slot(token);
        if !slot.is_present() {
            return None;
        }
        self.samples.get(usize::from(slot.start)..slot.end())
    }

    /// Total duration of `token` in microseconds (0 when absent).
    pub fn token_duration_us(&self, token: TokenIndex) -> u32 {
        self.token_samples(token).map_or(0, |samples| {
            samples
                .iter()
                .fold(0u32, |acc, &s| acc.saturating_add(u32::from(s)))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static SAMPLES: [u16; 10] = [23, 21, 24, 23, 46, 31, 23, 78, 40, 43];

    #[test]
    fn test_token_index_range() {
        assert!(TokenIndex::new(3).is_some());
        assert!(TokenIndex::new(4).is_none());
    }

    #[test]
    fn test_opening_and_pairing() {
        assert!(TokenIndex::SLOT_0.is_opening());
        assert!(!TokenIndex::SLOT_1.is_opening());
        assert_eq!(TokenIndex::SLOT_0.paired(), Some(TokenIndex::SLOT_1));
        assert_eq!(TokenIndex::SLOT_2.paired(), Some(TokenIndex::SLOT_3));
        assert_eq!(TokenIndex::SLOT_1.paired(), None);
        assert_eq!(TokenIndex::SLOT_3.paired(), None);
    }

    #[test]
    fn test_valid_table_passes() {
        let p = Protocol::new("t", [3, 3, 3, 1], [0, 3, 6, 9], &SAMPLES);
        assert_eq!(p.validate(), Ok(()));
        assert_eq!(p.token_samples(TokenIndex::SLOT_1), Some(&SAMPLES[3..6]));
        assert_eq!(p.token_duration_us(TokenIndex::SLOT_3), 43);
    }

    #[test]
    fn test_slot_past_end_is_rejected() {
        let p = Protocol::new("t", [3, 0, 0, 2], [0, 0, 0, 9], &SAMPLES);
        assert_eq!(
            p.validate(),
            Err(ProtocolError::SlotOutOfBounds {
                token: 3,
                end: 11,
                samples: 10
            })
        );
    }

    #[test]
    fn test_absent_slot_ignores_index() {
        // An absent slot may carry any start index.
        let p = Protocol::new("t", [1, 0, 0, 0], [0, 200, 200, 200], &SAMPLES);
        assert_eq!(p.validate(), Ok(()));
        assert_eq!(p.token_samples(TokenIndex::SLOT_1), None);
    }

    #[test]
    fn test_empty_table_is_rejected() {
        let p = Protocol::new("t", [0; 4], [0; 4], &SAMPLES);
        assert_eq!(p.validate(), Err(ProtocolError::NoTokens));
    }

    #[test]
    fn test_zero_sample_is_rejected() {
        static WITH_ZERO: [u16; 3] = [10, 0, 10];
        let p = Protocol::new("t", [3, 0, 0, 0], [0, 0, 0, 0], &WITH_ZERO);
        assert_eq!(p.validate(), Err(ProtocolError::ZeroSample { index: 1 }));
    }
}
