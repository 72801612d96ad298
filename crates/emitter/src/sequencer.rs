//! End-of-token decision.
//!
//! An even token opens an eye. When its paired slot (`index + 1`) carries
//! samples, the closing token follows after the frame gap, directly from the
//! falling-edge handler. Anything else ends the frame. This one rule covers
//! both single-burst protocols (Samsung, XPAND, Sharp) and open/close
//! protocols (3D Vision, Sony, Panasonic).

use crate::protocol::{Protocol, TokenIndex};

/// What the pulse engine does after the last sample of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TokenEnd {
    /// Start `next` after the frame gap.
    Chain(TokenIndex),
    /// Stop the timer and clear the between-frames indicator.
    EndFrame,
}

/// Decide how to continue after `finished` has been fully transmitted.
pub fn next_step(protocol: &Protocol, finished: TokenIndex) -> TokenEnd {
    match finished.paired() {
        Some(next) if protocol.slot(next).is_present() => TokenEnd::Chain(next),
        _ => TokenEnd::EndFrame,
    }
}
