//! Reference decoder for checking generated signals.
//!
//! [`PacketDecoder`] does what a locomotive decoder does with the track
//! signal: classify each half-bit by duration, pair halves into bits, wait
//! for a preamble, then collect bytes until the end bit and check the XOR.
//! It accepts the wider decoder-side timing windows, so anything the
//! transmitter emits within its own limits must decode.
//!
//! ```rust
//! use rs_dcc::decoder::PacketDecoder;
//! use rs_dcc::encoder::HalfBits;
//! use rs_dcc::{DccCommand, SignalTiming};
//!
//! let cmd = DccCommand::reset();
//! let mut decoder = PacketDecoder::new();
//! let packets = decoder.decode(HalfBits::new(&cmd, SignalTiming::default(), false).map(|(_, us)| us));
//!
//! assert_eq!(packets.len(), 1);
//! assert_eq!(packets[0].payload(), &[0x00, 0x00]);
//! assert_eq!(packets[0].to_command().unwrap(), cmd);
//! ```

use alloc::vec::Vec;

use crate::commands::{DccCommand, MAX_PAYLOAD_BYTES};
use crate::encoder::Bit;
use crate::error::PacketError;

/// Shortest half-bit a decoder accepts as a "1".
pub const ONE_HALF_MIN_US: u32 = 52;
/// Longest half-bit a decoder accepts as a "1".
pub const ONE_HALF_MAX_US: u32 = 64;
/// Shortest half-bit a decoder accepts as a "0".
pub const ZERO_HALF_MIN_US: u32 = 90;
/// Longest half-bit a decoder accepts as a "0".
pub const ZERO_HALF_MAX_US: u32 = 10_000;
/// Preamble ones a decoder needs before it looks for a packet start.
pub const MIN_PREAMBLE_ONES: u8 = 10;

const MAX_WIRE_BYTES: usize = MAX_PAYLOAD_BYTES + 1;

/// A packet that passed the checksum.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DecodedPacket {
    bytes: [u8; MAX_WIRE_BYTES],
    len: u8,
}

impl DecodedPacket {
    /// Address and instruction bytes.
    pub fn payload(&self) -> &[u8] {
        &self.bytes[..usize::from(self.len) - 1]
    }

    /// The received error detection byte.
    pub fn checksum(&self) -> u8 {
        self.bytes[usize::from(self.len) - 1]
    }

    /// Rebuilds the command (without a repeat count).
    pub fn to_command(&self) -> Result<DccCommand, PacketError> {
        DccCommand::new(self.payload())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Stage {
    Preamble,
    Byte,
    AfterByte,
}

/// Turns half-bit durations back into packets.
#[derive(Debug)]
pub struct PacketDecoder {
    stage: Stage,
    pending_half: Option<Bit>,
    ones: u8,
    shift: u8,
    shifted: u8,
    bytes: [u8; MAX_WIRE_BYTES],
    len: usize,
    packets: u32,
    checksum_errors: u32,
    framing_errors: u32,
}

impl Default for PacketDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl PacketDecoder {
    /// Creates a decoder hunting for a preamble.
    pub fn new() -> Self {
        Self {
            stage: Stage::Preamble,
            pending_half: None,
            ones: 0,
            shift: 0,
            shifted: 0,
            bytes: [0; MAX_WIRE_BYTES],
            len: 0,
            packets: 0,
            checksum_errors: 0,
            framing_errors: 0,
        }
    }

    /// Classifies one half-bit duration.
    pub fn classify(half_us: u32) -> Option<Bit> {
        match half_us {
            ONE_HALF_MIN_US..=ONE_HALF_MAX_US => Some(Bit::One),
            ZERO_HALF_MIN_US..=ZERO_HALF_MAX_US => Some(Bit::Zero),
            _ => None,
        }
    }

    /// Feeds one half-bit; returns a packet when its end bit completes.
    pub fn feed(&mut self, half_us: u32) -> Option<DecodedPacket> {
        let Some(half) = Self::classify(half_us) else {
            self.framing_error();
            return None;
        };

        match self.pending_half.take() {
            None => {
                self.pending_half = Some(half);
                None
            }
            Some(first) if first == half => self.feed_bit(half),
            Some(_) => {
                // Out of phase: this half starts a bit
                if self.stage != Stage::Preamble {
                    self.framing_error();
                }
                self.pending_half = Some(half);
                None
            }
        }
    }

    /// Feeds a whole stream and collects every good packet.
    pub fn decode<I: IntoIterator<Item = u32>>(&mut self, halves: I) -> Vec<DecodedPacket> {
        halves.into_iter().filter_map(|us| self.feed(us)).collect()
    }

    fn feed_bit(&mut self, bit: Bit) -> Option<DecodedPacket> {
        match (self.stage, bit) {
            (Stage::Preamble, Bit::One) => {
                self.ones = self.ones.saturating_add(1);
                None
            }
            (Stage::Preamble, Bit::Zero) => {
                if self.ones >= MIN_PREAMBLE_ONES {
                    self.begin_byte();
                    self.len = 0;
                } else {
                    self.ones = 0;
                }
                None
            }
            (Stage::Byte, _) => {
                self.shift = (self.shift << 1) | u8::from(bit == Bit::One);
                self.shifted += 1;
                if self.shifted == 8 {
                    if self.len == MAX_WIRE_BYTES {
                        self.framing_error();
                        return None;
                    }
                    self.bytes[self.len] = self.shift;
                    self.len += 1;
                    self.stage = Stage::AfterByte;
                }
                None
            }
            (Stage::AfterByte, Bit::Zero) => {
                self.begin_byte();
                None
            }
            (Stage::AfterByte, Bit::One) => self.finish(),
        }
    }

    fn begin_byte(&mut self) {
        self.stage = Stage::Byte;
        self.shift = 0;
        self.shifted = 0;
    }

    fn finish(&mut self) -> Option<DecodedPacket> {
        let received = &self.bytes[..self.len];
        let good = self.len >= 2 && received.iter().fold(0u8, |acc, b| acc ^ b) == 0;
        let packet = DecodedPacket {
            bytes: self.bytes,
            len: self.len as u8,
        };

        // The end bit may double as the first preamble bit of the next packet
        self.stage = Stage::Preamble;
        self.ones = 1;

        if self.len < 2 {
            self.framing_errors = self.framing_errors.wrapping_add(1);
            return None;
        }
        if !good {
            self.checksum_errors = self.checksum_errors.wrapping_add(1);
            return None;
        }
        self.packets = self.packets.wrapping_add(1);
        Some(packet)
    }

    fn framing_error(&mut self) {
        self.framing_errors = self.framing_errors.wrapping_add(1);
        self.reset();
    }

    /// Drops any partial packet and hunts for a new preamble.
    ///
    /// Counters are kept.
    pub fn reset(&mut self) {
        self.stage = Stage::Preamble;
        self.pending_half = None;
        self.ones = 0;
        self.len = 0;
    }

    /// Packets decoded with a good checksum.
    pub fn packets_decoded(&self) -> u32 {
        self.packets
    }

    /// Complete packets whose XOR did not come out to zero.
    pub fn checksum_errors(&self) -> u32 {
        self.checksum_errors
    }

    /// Out-of-window half-bits, split bits, and malformed packets.
    pub fn framing_errors(&self) -> u32 {
        self.framing_errors
    }
}
