//! DCC packets and the builders that produce them.
//!
//! A [`DccCommand`] is one encoded DCC packet: an address byte, zero or more
//! instruction bytes, and the XOR checksum over all of them. The checksum is
//! computed once when the command is built and the command is never mutated
//! afterwards, so it can be copied into a queue and read from interrupt
//! context without any further validation.
//!
//! # Building packets
//!
//! Raw packets come from [`DccCommand::new`]. The usual NMRA packets have
//! dedicated builders:
//!
//! ```rust
//! use rs_dcc::{Address, DccCommand, Direction};
//!
//! let loco = Address::new(3).unwrap();
//!
//! // 128-step speed, forward, step 40
//! let speed = DccCommand::speed_128(loco, Direction::Forward, 40).unwrap();
//! assert_eq!(speed.payload(), &[0x03, 0x3F, 0x80 | 41]);
//!
//! // Headlight on, repeated twice more for reliability
//! let lights = DccCommand::function_group_one(loco, true, [false; 4]).with_repeats(2);
//! assert_eq!(lights.repeats(), 2);
//!
//! // Every packet carries a valid checksum
//! assert_eq!(speed.checksum(), 0x03 ^ 0x3F ^ (0x80 | 41));
//! ```
//!
//! # Queue tiers
//!
//! Commands are queued on one of two [`QueueTier`]s. Emergency stops belong
//! on [`QueueTier::Priority`]; ordinary throttle traffic on
//! [`QueueTier::Standard`].

use crate::error::PacketError;

/// Maximum number of address and instruction bytes in one packet.
///
/// With the checksum this gives the six-byte maximum packet length.
pub const MAX_PAYLOAD_BYTES: usize = 5;

/// Highest primary (short) locomotive address.
pub const MAX_SHORT_ADDRESS: u16 = 127;

/// Highest extended (long) locomotive address.
pub const MAX_LONG_ADDRESS: u16 = 10239;

/// Highest basic accessory decoder address.
pub const MAX_ACCESSORY_ADDRESS: u16 = 511;

/// Highest output pair on a basic accessory decoder.
pub const MAX_ACCESSORY_PORT: u8 = 3;

/// Highest step in 128-step speed mode (0 = stop).
pub const MAX_SPEED_128: u8 = 126;

/// Highest step in 28-step speed mode (0 = stop).
pub const MAX_SPEED_28: u8 = 28;

const ADVANCED_OPERATIONS_128: u8 = 0x3F;
const SPEED_28_BASE: u8 = 0x40;
const FUNCTION_GROUP_ONE: u8 = 0x80;
const FUNCTION_GROUP_TWO: u8 = 0xB0;

// ============================================================================
// Direction
// ============================================================================

/// Direction of travel encoded in speed packets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Direction {
    /// Forward (direction bit set).
    #[default]
    Forward,
    /// Reverse (direction bit clear).
    Reverse,
}

impl Direction {
    /// Returns the direction as a lowercase string.
    ///
    /// ```
    /// use rs_dcc::Direction;
    ///
    /// assert_eq!(Direction::Forward.as_str(), "forward");
    /// assert_eq!(Direction::Reverse.as_str(), "reverse");
    /// ```
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Direction::Forward => "forward",
            Direction::Reverse => "reverse",
        }
    }

    /// Parse direction from text input.
    ///
    /// Accepts `"forward"`/`"fwd"`/`"1"` and `"reverse"`/`"rev"`/`"-1"`,
    /// trimmed and case-insensitive.
    ///
    /// ```
    /// use rs_dcc::Direction;
    ///
    /// assert_eq!(Direction::from_text(" FWD "), Some(Direction::Forward));
    /// assert_eq!(Direction::from_text("-1"), Some(Direction::Reverse));
    /// assert_eq!(Direction::from_text("sideways"), None);
    /// ```
    pub fn from_text(s: &str) -> Option<Self> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("forward") || s.eq_ignore_ascii_case("fwd") || s == "1" {
            Some(Direction::Forward)
        } else if s.eq_ignore_ascii_case("reverse") || s.eq_ignore_ascii_case("rev") || s == "-1" {
            Some(Direction::Reverse)
        } else {
            None
        }
    }

    #[inline]
    const fn bit(self) -> u8 {
        match self {
            Direction::Forward => 1,
            Direction::Reverse => 0,
        }
    }
}

// ============================================================================
// Address
// ============================================================================

/// Multi-function (locomotive) decoder address.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Address {
    /// Primary address, 1..=127, sent as one byte `0AAAAAAA`.
    Short(u8),
    /// Extended address, 1..=10239, sent as `11AAAAAA AAAAAAAA`.
    Long(u16),
}

impl Address {
    /// Picks the short form for 1..=127 and the long form above.
    ///
    /// ```
    /// use rs_dcc::Address;
    ///
    /// assert_eq!(Address::new(3), Ok(Address::Short(3)));
    /// assert_eq!(Address::new(1234), Ok(Address::Long(1234)));
    /// assert!(Address::new(0).is_err());
    /// ```
    pub fn new(addr: u16) -> Result<Self, PacketError> {
        if addr <= MAX_SHORT_ADDRESS {
            Self::short(addr as u8)
        } else {
            Self::long(addr)
        }
    }

    /// Primary address. 0 is the broadcast address and is refused here.
    pub fn short(addr: u8) -> Result<Self, PacketError> {
        if addr == 0 || u16::from(addr) > MAX_SHORT_ADDRESS {
            return Err(PacketError::InvalidAddress(u16::from(addr)));
        }
        Ok(Self::Short(addr))
    }

    /// Extended address. Low numbers are valid in long form too.
    pub fn long(addr: u16) -> Result<Self, PacketError> {
        if addr == 0 || addr > MAX_LONG_ADDRESS {
            return Err(PacketError::InvalidAddress(addr));
        }
        Ok(Self::Long(addr))
    }

    /// Numeric value of the address.
    pub fn value(&self) -> u16 {
        match *self {
            Self::Short(a) => u16::from(a),
            Self::Long(a) => a,
        }
    }

    fn write(&self, buf: &mut PacketBuf) {
        match *self {
            Self::Short(a) => buf.push(a & 0x7F),
            Self::Long(a) => {
                buf.push(0xC0 | ((a >> 8) as u8 & 0x3F));
                buf.push(a as u8);
            }
        }
    }
}

// ============================================================================
// Queue Tier
// ============================================================================

/// Which queue a command waits in.
///
/// The priority tier is drained before the standard tier at every packet
/// boundary. It never interrupts a packet already on the track.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum QueueTier {
    /// Time-critical commands such as emergency stop.
    Priority,
    /// Ordinary speed, direction, and function traffic.
    Standard,
}

impl QueueTier {
    /// Returns the tier as a lowercase string.
    pub const fn as_str(&self) -> &'static str {
        match self {
            QueueTier::Priority => "priority",
            QueueTier::Standard => "standard",
        }
    }

    /// Suggested tier for a command: emergency stops go first.
    ///
    /// ```
    /// use rs_dcc::{Address, DccCommand, QueueTier};
    ///
    /// let loco = Address::new(3).unwrap();
    /// let estop = DccCommand::emergency_stop(loco);
    /// assert_eq!(QueueTier::for_command(&estop), QueueTier::Priority);
    /// assert_eq!(QueueTier::for_command(&DccCommand::idle()), QueueTier::Standard);
    /// ```
    pub fn for_command(cmd: &DccCommand) -> Self {
        if cmd.is_emergency_stop() {
            QueueTier::Priority
        } else {
            QueueTier::Standard
        }
    }
}

// ============================================================================
// DCC Command
// ============================================================================

struct PacketBuf {
    bytes: [u8; MAX_PAYLOAD_BYTES],
    len: usize,
}

impl PacketBuf {
    fn new() -> Self {
        Self {
            bytes: [0; MAX_PAYLOAD_BYTES],
            len: 0,
        }
    }

    // Builders never exceed five bytes, so a failed push is unreachable.
    fn push(&mut self, byte: u8) {
        if let Some(slot) = self.bytes.get_mut(self.len) {
            *slot = byte;
            self.len += 1;
        }
    }

    fn finish(self) -> DccCommand {
        DccCommand::from_parts(self.bytes, self.len)
    }
}

/// One encoded DCC packet plus its repeat count.
///
/// Layout on the wire is `address [data...] checksum`. The checksum is the
/// XOR of every preceding byte and is fixed at construction.
///
/// `DccCommand` is `Copy` and stores its bytes inline, so queueing and
/// transmitting it never allocates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DccCommand {
    bytes: [u8; MAX_PAYLOAD_BYTES],
    len: u8,
    checksum: u8,
    repeats: u8,
}

impl DccCommand {
    /// Builds a packet from raw address and instruction bytes.
    ///
    /// ```
    /// use rs_dcc::{DccCommand, PacketError};
    ///
    /// let cmd = DccCommand::new(&[0x03, 0x60]).unwrap();
    /// assert_eq!(cmd.checksum(), 0x63);
    /// assert_eq!(cmd.len(), 3);
    ///
    /// assert_eq!(DccCommand::new(&[]), Err(PacketError::Empty));
    /// ```
    pub fn new(bytes: &[u8]) -> Result<Self, PacketError> {
        if bytes.is_empty() {
            return Err(PacketError::Empty);
        }
        if bytes.len() > MAX_PAYLOAD_BYTES {
            return Err(PacketError::TooLong { len: bytes.len() });
        }
        let mut buf = [0u8; MAX_PAYLOAD_BYTES];
        buf[..bytes.len()].copy_from_slice(bytes);
        Ok(Self::from_parts(buf, bytes.len()))
    }

    fn from_parts(bytes: [u8; MAX_PAYLOAD_BYTES], len: usize) -> Self {
        let checksum = bytes[..len].iter().fold(0u8, |acc, b| acc ^ b);
        Self {
            bytes,
            len: len as u8,
            checksum,
            repeats: 0,
        }
    }

    /// Returns a copy that is transmitted `repeats` extra times back to back.
    #[must_use]
    pub const fn with_repeats(mut self, repeats: u8) -> Self {
        self.repeats = repeats;
        self
    }

    /// The idle packet `0xFF 0x00`, addressed to no decoder.
    pub fn idle() -> Self {
        Self::from_parts([0xFF, 0x00, 0, 0, 0], 2)
    }

    /// Broadcast digital decoder reset `0x00 0x00`.
    pub fn reset() -> Self {
        Self::from_parts([0; MAX_PAYLOAD_BYTES], 2)
    }

    /// Broadcast emergency stop to every multi-function decoder.
    pub fn broadcast_stop() -> Self {
        Self::from_parts([0x00, SPEED_28_BASE | 0x01, 0, 0, 0], 2)
    }

    /// 128-step speed and direction.
    ///
    /// `step` 0 stops; 1..=126 are running speeds.
    pub fn speed_128(addr: Address, dir: Direction, step: u8) -> Result<Self, PacketError> {
        if step > MAX_SPEED_128 {
            return Err(PacketError::InvalidSpeed(step));
        }
        let code = if step == 0 { 0 } else { step + 1 };
        Ok(Self::speed_128_raw(addr, dir, code))
    }

    /// 128-step emergency stop for one decoder.
    pub fn emergency_stop(addr: Address) -> Self {
        Self::speed_128_raw(addr, Direction::Forward, 0x01)
    }

    fn speed_128_raw(addr: Address, dir: Direction, code: u8) -> Self {
        let mut buf = PacketBuf::new();
        addr.write(&mut buf);
        buf.push(ADVANCED_OPERATIONS_128);
        buf.push((dir.bit() << 7) | (code & 0x7F));
        buf.finish()
    }

    /// 28-step speed and direction (`01DCSSSS`).
    ///
    /// `step` 0 stops; 1..=28 are running speeds.
    pub fn speed_28(addr: Address, dir: Direction, step: u8) -> Result<Self, PacketError> {
        if step > MAX_SPEED_28 {
            return Err(PacketError::InvalidSpeed(step));
        }
        let value = if step == 0 { 0 } else { step + 3 };
        let mut buf = PacketBuf::new();
        addr.write(&mut buf);
        buf.push(SPEED_28_BASE | (dir.bit() << 5) | ((value & 0x01) << 4) | (value >> 1));
        Ok(buf.finish())
    }

    /// Function group one: headlight (FL) and F1..F4.
    pub fn function_group_one(addr: Address, fl: bool, f1_f4: [bool; 4]) -> Self {
        let mut buf = PacketBuf::new();
        addr.write(&mut buf);
        buf.push(FUNCTION_GROUP_ONE | (u8::from(fl) << 4) | pack_nibble(f1_f4));
        buf.finish()
    }

    /// Function group two: F5..F8.
    pub fn function_group_two(addr: Address, f5_f8: [bool; 4]) -> Self {
        let mut buf = PacketBuf::new();
        addr.write(&mut buf);
        buf.push(FUNCTION_GROUP_TWO | pack_nibble(f5_f8));
        buf.finish()
    }

    /// Basic accessory packet `10AAAAAA 1AAACDDD`.
    ///
    /// `address` is the 9-bit decoder address, `port` selects one of its four
    /// output pairs, `output` the half of the pair, and `activate` powers it.
    ///
    /// # Errors
    ///
    /// - [`PacketError::InvalidAddress`] if `address` is above 511
    /// - [`PacketError::InvalidPort`] if `port` is above 3
    pub fn accessory(address: u16, port: u8, output: bool, activate: bool) -> Result<Self, PacketError> {
        if address > MAX_ACCESSORY_ADDRESS {
            return Err(PacketError::InvalidAddress(address));
        }
        if port > MAX_ACCESSORY_PORT {
            return Err(PacketError::InvalidPort(port));
        }
        let high = (!(address >> 6) as u8) & 0x07;
        let mut buf = PacketBuf::new();
        buf.push(0x80 | (address as u8 & 0x3F));
        buf.push(0x80 | (high << 4) | (u8::from(activate) << 3) | (port << 1) | u8::from(output));
        Ok(buf.finish())
    }

    /// Address and instruction bytes, without the checksum.
    pub fn payload(&self) -> &[u8] {
        &self.bytes[..usize::from(self.len)]
    }

    /// The first byte of the packet.
    pub fn address_byte(&self) -> u8 {
        self.bytes[0]
    }

    /// Bytes after the address byte, without the checksum.
    pub fn data_bytes(&self) -> &[u8] {
        &self.bytes[1..usize::from(self.len)]
    }

    /// XOR of every payload byte.
    pub fn checksum(&self) -> u8 {
        self.checksum
    }

    /// Extra back-to-back transmissions after the first.
    pub fn repeats(&self) -> u8 {
        self.repeats
    }

    /// Bytes on the wire, checksum included.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        usize::from(self.len) + 1
    }

    /// Byte `index` on the wire; the final index is the checksum.
    #[inline]
    pub fn byte(&self, index: usize) -> Option<u8> {
        let len = usize::from(self.len);
        if index < len {
            Some(self.bytes[index])
        } else if index == len {
            Some(self.checksum)
        } else {
            None
        }
    }

    /// True for the `0xFF 0x00` idle packet.
    pub fn is_idle(&self) -> bool {
        self.payload() == [0xFF, 0x00]
    }

    /// True for broadcast or single-decoder emergency stop packets.
    pub fn is_emergency_stop(&self) -> bool {
        let payload = self.payload();
        let instr = match self.address_byte() {
            0x00..=0x7F => &payload[1..],
            0xC0..=0xE7 if payload.len() >= 2 => &payload[2..],
            _ => return false,
        };
        match instr {
            [ADVANCED_OPERATIONS_128, speed, ..] => speed & 0x7F == 0x01,
            [speed, ..] if speed & 0xC0 == SPEED_28_BASE => speed & 0x0F == 0x01,
            _ => false,
        }
    }
}

fn pack_nibble(bits: [bool; 4]) -> u8 {
    bits.iter()
        .enumerate()
        .fold(0u8, |acc, (i, &on)| acc | (u8::from(on) << i))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn xor(bytes: &[u8]) -> u8 {
        bytes.iter().fold(0, |a, b| a ^ b)
    }

    // === Construction ===
    #[test]
    fn new_computes_checksum() {
        let cmd = DccCommand::new(&[0x03, 0x3F, 0x90]).unwrap();
        assert_eq!(cmd.checksum(), 0x03 ^ 0x3F ^ 0x90);
        assert_eq!(cmd.address_byte(), 0x03);
        assert_eq!(cmd.data_bytes(), &[0x3F, 0x90]);
        assert_eq!(cmd.len(), 4);
    }

    #[test]
    fn new_rejects_empty_and_oversized() {
        assert_eq!(DccCommand::new(&[]), Err(PacketError::Empty));
        assert_eq!(
            DccCommand::new(&[1, 2, 3, 4, 5, 6]),
            Err(PacketError::TooLong { len: 6 })
        );
        assert!(DccCommand::new(&[1, 2, 3, 4, 5]).is_ok());
    }

    #[test]
    fn with_repeats_leaves_original_untouched() {
        let cmd = DccCommand::reset();
        let repeated = cmd.with_repeats(4);
        assert_eq!(cmd.repeats(), 0);
        assert_eq!(repeated.repeats(), 4);
        assert_eq!(repeated.payload(), cmd.payload());
        assert_eq!(repeated.checksum(), cmd.checksum());
    }

    #[test]
    fn byte_index_ends_with_checksum() {
        let cmd = DccCommand::new(&[0x03, 0x60]).unwrap();
        assert_eq!(cmd.byte(0), Some(0x03));
        assert_eq!(cmd.byte(1), Some(0x60));
        assert_eq!(cmd.byte(2), Some(0x63));
        assert_eq!(cmd.byte(3), None);
    }

    // === Well-known packets ===
    #[test]
    fn idle_packet_layout() {
        let idle = DccCommand::idle();
        assert_eq!(idle.payload(), &[0xFF, 0x00]);
        assert_eq!(idle.checksum(), 0xFF);
        assert!(idle.is_idle());
        assert!(!DccCommand::reset().is_idle());
    }

    #[test]
    fn reset_packet_layout() {
        let reset = DccCommand::reset();
        assert_eq!(reset.payload(), &[0x00, 0x00]);
        assert_eq!(reset.checksum(), 0x00);
    }

    #[test]
    fn broadcast_stop_is_emergency_stop() {
        let stop = DccCommand::broadcast_stop();
        assert_eq!(stop.payload(), &[0x00, 0x41]);
        assert!(stop.is_emergency_stop());
    }

    // === Addresses ===
    #[test]
    fn address_ranges() {
        assert_eq!(Address::short(0), Err(PacketError::InvalidAddress(0)));
        assert_eq!(Address::short(128), Err(PacketError::InvalidAddress(128)));
        assert_eq!(Address::long(10240), Err(PacketError::InvalidAddress(10240)));
        assert_eq!(Address::new(127), Ok(Address::Short(127)));
        assert_eq!(Address::new(128), Ok(Address::Long(128)));
        assert_eq!(Address::Long(4000).value(), 4000);
    }

    #[test]
    fn long_address_encoding() {
        let addr = Address::long(1234).unwrap();
        let cmd = DccCommand::speed_128(addr, Direction::Reverse, 0).unwrap();
        // 1234 = 0x04D2
        assert_eq!(cmd.payload(), &[0xC4, 0xD2, 0x3F, 0x00]);
        assert_eq!(cmd.checksum(), xor(&[0xC4, 0xD2, 0x3F, 0x00]));
    }

    // === Speed ===
    #[test]
    fn speed_128_encoding() {
        let addr = Address::Short(3);
        let stop = DccCommand::speed_128(addr, Direction::Forward, 0).unwrap();
        assert_eq!(stop.payload(), &[0x03, 0x3F, 0x80]);

        let full = DccCommand::speed_128(addr, Direction::Forward, 126).unwrap();
        assert_eq!(full.payload(), &[0x03, 0x3F, 0xFF]);

        let rev = DccCommand::speed_128(addr, Direction::Reverse, 1).unwrap();
        assert_eq!(rev.payload(), &[0x03, 0x3F, 0x02]);

        assert_eq!(
            DccCommand::speed_128(addr, Direction::Forward, 127),
            Err(PacketError::InvalidSpeed(127))
        );
    }

    #[test]
    fn speed_28_encoding() {
        let addr = Address::Short(3);
        let cases = [(0u8, 0x60u8), (1, 0x62), (2, 0x72), (28, 0x7F)];
        for (step, expected) in cases {
            let cmd = DccCommand::speed_28(addr, Direction::Forward, step).unwrap();
            assert_eq!(cmd.payload(), &[0x03, expected], "step {}", step);
        }
        let rev = DccCommand::speed_28(addr, Direction::Reverse, 0).unwrap();
        assert_eq!(rev.payload(), &[0x03, 0x40]);
        assert!(DccCommand::speed_28(addr, Direction::Forward, 29).is_err());
    }

    #[test]
    fn emergency_stop_detection() {
        let short = DccCommand::emergency_stop(Address::Short(5));
        assert_eq!(short.payload(), &[0x05, 0x3F, 0x81]);
        assert!(short.is_emergency_stop());

        let long = DccCommand::emergency_stop(Address::Long(2000));
        assert!(long.is_emergency_stop());

        let running = DccCommand::speed_128(Address::Short(5), Direction::Forward, 10).unwrap();
        assert!(!running.is_emergency_stop());
        assert!(!DccCommand::idle().is_emergency_stop());
        assert!(!DccCommand::reset().is_emergency_stop());
    }

    // === Functions ===
    #[test]
    fn function_groups() {
        let addr = Address::Short(3);
        let g1 = DccCommand::function_group_one(addr, true, [true, false, false, true]);
        assert_eq!(g1.payload(), &[0x03, 0x80 | 0x10 | 0x01 | 0x08]);

        let g2 = DccCommand::function_group_two(addr, [false, true, false, false]);
        assert_eq!(g2.payload(), &[0x03, 0xB2]);
    }

    // === Accessory ===
    #[test]
    fn accessory_encoding() {
        let cmd = DccCommand::accessory(1, 2, true, true).unwrap();
        // high address bits 0 -> complemented 111
        assert_eq!(cmd.payload(), &[0x81, 0x80 | 0x70 | 0x08 | 0x04 | 0x01]);
        assert!(DccCommand::accessory(512, 0, false, false).is_err());
    }

    #[test]
    fn accessory_port_out_of_range_rejected() {
        let top = DccCommand::accessory(1, MAX_ACCESSORY_PORT, false, true).unwrap();
        assert_eq!(top.payload()[1] & 0x06, 0x06);
        assert_eq!(DccCommand::accessory(1, 4, false, true), Err(PacketError::InvalidPort(4)));
        assert_eq!(DccCommand::accessory(1, 255, true, true), Err(PacketError::InvalidPort(255)));
    }

    // === Direction / Tier ===
    #[test]
    fn direction_from_text() {
        assert_eq!(Direction::from_text("forward"), Some(Direction::Forward));
        assert_eq!(Direction::from_text("REV"), Some(Direction::Reverse));
        assert_eq!(Direction::from_text(""), None);
        assert_eq!(Direction::default(), Direction::Forward);
    }

    #[test]
    fn tier_names() {
        assert_eq!(QueueTier::Priority.as_str(), "priority");
        assert_eq!(QueueTier::Standard.as_str(), "standard");
    }
}
