//! Vendor scratch memory emulation.
//!
//! The host driver peeks and pokes two tiny memory regions on the emitter
//! and refuses to run if they do not answer. Nothing in the waveform path
//! reads them; they only have to round-trip.

use heapless::Vec;

/// Largest host packet on the control endpoint.
pub const PACKET_MAX: usize = 64;

/// Header bytes before the data in requests and replies.
pub const HEADER_LEN: usize = 4;

/// Largest data payload of one request or reply (`PACKET_MAX - HEADER_LEN`).
pub const DATA_MAX: usize = 60;

/// Command bit: write `data` to the region.
pub const CMD_WRITE: u8 = 0x01;
/// Command bit: read the region back.
pub const CMD_READ: u8 = 0x02;
/// Command bit: zero the region.
pub const CMD_CLEAR: u8 = 0x40;

/// Region identifier of the 2-byte block.
pub const REGION_22: u8 = 0x22;
/// Region identifier of the 3-byte block.
pub const REGION_18: u8 = 0x18;

/// One control-endpoint memory request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScratchRequest {
    /// Raw command bits.
    pub command: u8,
    /// Region identifier.
    pub region: u8,
    /// Requested byte count.
    pub amount: u8,
    /// Write payload.
    pub data: Vec<u8, DATA_MAX>,
}

impl ScratchRequest {
    /// Write request.
    pub fn is_write(&self) -> bool {
        self.command & CMD_WRITE != 0
    }

    /// Read request. A command with both bits set is a write.
    pub fn is_read(&self) -> bool {
        !self.is_write() && self.command & CMD_READ != 0
    }

    /// Clear request, applied after any write.
    pub fn is_clear(&self) -> bool {
        self.command & CMD_CLEAR != 0
    }

    /// `amount` clamped to what fits in one reply.
    pub fn clamped_amount(&self) -> usize {
        usize::from(self.amount).min(DATA_MAX)
    }
}

/// Reply to a read: `[region, amount, 0x00, 0x04, data…]`.
pub type ScratchReply = Vec<u8, PACKET_MAX>;

/// The two emulated regions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScratchMemory {
    ram_22: [u8; 2],
    ram_18: [u8; 3],
}

impl ScratchMemory {
    /// Both regions zeroed.
    pub const fn new() -> Self {
        Self {
            ram_22: [0; 2],
            ram_18: [0; 3],
        }
    }

    /// Apply `request`, returning the reply for reads.
    pub fn handle(&mut self, request: &ScratchRequest) -> Option<ScratchReply> {
        let mut reply = None;
        if request.is_write() {
            self.write(request.region, &request.data, request.clamped_amount());
        } else if request.is_read() {
            reply = Some(self.read(request.region, request.amount));
        }
        if request.is_clear() {
            self.clear(request.region, request.clamped_amount());
        }
        reply
    }

    /// Copy up to `amount` bytes of `data` into `region`. Unknown regions
    /// and bytes past the region end are dropped.
    pub fn write(&mut self, region: u8, data: &[u8], amount: usize) {
        if let Some(block) = self.region_mut(region) {
            let len = amount.min(data.len()).min(block.len());
            if let (Some(dst), Some(src)) = (block.get_mut(..len), data.get(..len)) {
                dst.copy_from_slice(src);
            }
        }
    }

    /// Build the reply for reading `amount` bytes of `region`. Bytes past
    /// the region end and unknown regions read as zero.
    pub fn read(&self, region: u8, amount: u8) -> ScratchReply {
        let amount = amount.min(DATA_MAX as u8);
        let block = self.region(region).unwrap_or(&[]);

        let mut reply = ScratchReply::new();
        // Capacity is PACKET_MAX and we push at most HEADER_LEN + DATA_MAX.
        let _ = reply.extend_from_slice(&[region, amount, 0x00, 0x04]);
        for i in 0..usize::from(amount) {
            let _ = reply.push(block.get(i).copied().unwrap_or(0));
        }
        reply
    }

    /// Zero up to `amount` bytes of `region`.
    pub fn clear(&mut self, region: u8, amount: usize) {
        if let Some(block) = self.region_mut(region) {
            let len = amount.min(block.len());
            if let Some(dst) = block.get_mut(..len) {
                dst.fill(0);
            }
        }
    }

    /// Contents of `region`, `None` when unknown.
    pub fn region(&self, region: u8) -> Option<&[u8]> {
        match region {
            REGION_22 => Some(&self.ram_22),
            REGION_18 => Some(&self.ram_18),
            _ => None,
        }
    }

    fn region_mut(&mut self, region: u8) -> Option<&mut [u8]> {
        match region {
            REGION_22 => Some(&mut self.ram_22),
            REGION_18 => Some(&mut self.ram_18),
            _ => None,
        }
    }
}

const _: () = assert!(HEADER_LEN + DATA_MAX == PACKET_MAX);

#[cfg(test)]
mod tests {
    use super::*;

    fn request(command: u8, region: u8, amount: u8, data: &[u8]) -> ScratchRequest {
        ScratchRequest {
            command,
            region,
            amount,
            data: Vec::from_slice(data).unwrap(),
        }
    }

    #[test]
    fn test_write_then_read_back() {
        let mut mem = ScratchMemory::new();
        assert_eq!(mem.handle(&request(CMD_WRITE, REGION_18, 3, &[1, 2, 3])), None);
        let reply = mem.handle(&request(CMD_READ, REGION_18, 3, &[])).unwrap();
        assert_eq!(reply.as_slice(), &[0x18, 3, 0x00, 0x04, 1, 2, 3]);
    }

    #[test]
    fn test_write_is_clamped_to_region() {
        let mut mem = ScratchMemory::new();
        mem.handle(&request(CMD_WRITE, REGION_22, 5, &[9, 8, 7, 6, 5]));
        assert_eq!(mem.region(REGION_22), Some(&[9u8, 8][..]));
    }

    #[test]
    fn test_unknown_region_reads_zeros() {
        let mem = ScratchMemory::new();
        let reply = mem.read(0x30, 4);
        assert_eq!(reply.as_slice(), &[0x30, 4, 0x00, 0x04, 0, 0, 0, 0]);
    }

    #[test]
    fn test_read_past_region_end_is_zero_filled() {
        let mut mem = ScratchMemory::new();
        mem.write(REGION_22, &[0xAB, 0xCD], 2);
        let reply = mem.read(REGION_22, 4);
        assert_eq!(&reply[4..], &[0xAB, 0xCD, 0, 0]);
    }

    #[test]
    fn test_clear_after_write_in_same_command() {
        let mut mem = ScratchMemory::new();
        mem.handle(&request(CMD_WRITE | CMD_CLEAR, REGION_18, 3, &[1, 2, 3]));
        assert_eq!(mem.region(REGION_18), Some(&[0u8, 0, 0][..]));
    }

    #[test]
    fn test_write_and_read_bits_means_write() {
        let req = request(CMD_WRITE | CMD_READ, REGION_18, 1, &[7]);
        assert!(req.is_write());
        assert!(!req.is_read());
        let mut mem = ScratchMemory::new();
        assert_eq!(mem.handle(&req), None);
    }

    #[test]
    fn test_oversized_read_is_clamped() {
        let mem = ScratchMemory::new();
        let reply = mem.read(REGION_18, 255);
        assert_eq!(reply.len(), PACKET_MAX);
        assert_eq!(reply[1] as usize, DATA_MAX);
    }
}
