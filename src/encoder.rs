//! Bit-level framing of DCC packets.
//!
//! A packet on the wire is:
//!
//! ```text
//! 1 1 1 ... 1   0 AAAAAAAA   0 DDDDDDDD ...   0 CCCCCCCC   1
//! '-preamble-'  start+addr   start+data       start+check  end
//! ```
//!
//! Every byte is preceded by a "0" start bit and sent MSB first; the final
//! "1" ends the packet. Each bit is two half periods of opposite polarity,
//! one pin toggle per half.
//!
//! Everything here is a pure function of the command and a position; the
//! transmitter holds the only state (its current [`FramePosition`]).
//!
//! ```rust
//! use rs_dcc::encoder::{bit_at, frame_len, Bit, PacketBits};
//! use rs_dcc::DccCommand;
//!
//! let idle = DccCommand::idle();
//! assert_eq!(frame_len(&idle, 16), 16 + 3 * 9 + 1);
//! assert_eq!(bit_at(&idle, 0, 16), Some(Bit::One));
//! assert_eq!(bit_at(&idle, 16, 16), Some(Bit::Zero)); // packet start bit
//!
//! let bits: Vec<Bit> = PacketBits::new(&idle, 16).collect();
//! assert_eq!(bits.len(), frame_len(&idle, 16));
//! assert_eq!(bits.last(), Some(&Bit::One));
//! ```

use crate::commands::DccCommand;
use crate::config::SignalTiming;

/// One DCC bit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Bit {
    /// Long bit cell.
    Zero,
    /// Short bit cell.
    One,
}

impl Bit {
    /// Duration of each of the two halves of this bit.
    #[inline]
    pub fn half_period_us(self, timing: &SignalTiming) -> u32 {
        match self {
            Bit::Zero => timing.zero_half_us,
            Bit::One => timing.one_half_us,
        }
    }

    #[inline]
    fn of(byte: u8, bit: u8) -> Self {
        if byte & (1 << bit) != 0 {
            Bit::One
        } else {
            Bit::Zero
        }
    }
}

/// Position of one bit inside a packet frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FramePosition {
    /// Preamble "1" number `sent` (zero based).
    Preamble {
        /// Preamble bits already completed.
        sent: u8,
    },
    /// The "0" before byte `byte`; for byte 0 this is the packet start bit.
    StartBit {
        /// Index of the byte that follows.
        byte: u8,
    },
    /// Data bit `bit` (7 = MSB) of byte `byte`.
    DataBit {
        /// Byte index on the wire, checksum last.
        byte: u8,
        /// Bit number within the byte, counting down from 7.
        bit: u8,
    },
    /// The "1" that terminates the packet.
    EndBit,
}

impl FramePosition {
    /// First position of a frame with a preamble.
    pub const FIRST: FramePosition = FramePosition::Preamble { sent: 0 };

    /// First position of a frame with `preamble_bits` of preamble.
    ///
    /// Without a preamble the frame opens on the packet start bit.
    #[inline]
    pub const fn first(preamble_bits: u8) -> FramePosition {
        if preamble_bits == 0 {
            FramePosition::StartBit { byte: 0 }
        } else {
            FramePosition::FIRST
        }
    }

    /// The bit sent at this position.
    #[inline]
    pub fn bit(&self, cmd: &DccCommand) -> Bit {
        match *self {
            FramePosition::Preamble { .. } | FramePosition::EndBit => Bit::One,
            FramePosition::StartBit { .. } => Bit::Zero,
            FramePosition::DataBit { byte, bit } => match cmd.byte(usize::from(byte)) {
                Some(value) => Bit::of(value, bit),
                None => Bit::One,
            },
        }
    }

    /// The position after this one, or `None` once the end bit is done.
    #[inline]
    pub fn next(&self, cmd: &DccCommand, preamble_bits: u8) -> Option<FramePosition> {
        match *self {
            FramePosition::Preamble { sent } if sent + 1 < preamble_bits => {
                Some(FramePosition::Preamble { sent: sent + 1 })
            }
            FramePosition::Preamble { .. } => Some(FramePosition::StartBit { byte: 0 }),
            FramePosition::StartBit { byte } => Some(FramePosition::DataBit { byte, bit: 7 }),
            FramePosition::DataBit { byte, bit } if bit > 0 => {
                Some(FramePosition::DataBit { byte, bit: bit - 1 })
            }
            FramePosition::DataBit { byte, .. } if usize::from(byte) + 1 < cmd.len() => {
                Some(FramePosition::StartBit { byte: byte + 1 })
            }
            FramePosition::DataBit { .. } => Some(FramePosition::EndBit),
            FramePosition::EndBit => None,
        }
    }
}

/// Number of bits in the frame for `cmd`.
pub fn frame_len(cmd: &DccCommand, preamble_bits: u8) -> usize {
    usize::from(preamble_bits) + cmd.len() * 9 + 1
}

/// The bit at `index` of the frame for `cmd`, or `None` past the end.
pub fn bit_at(cmd: &DccCommand, index: usize, preamble_bits: u8) -> Option<Bit> {
    let preamble = usize::from(preamble_bits);
    if index < preamble {
        return Some(Bit::One);
    }
    let offset = index - preamble;
    let byte = offset / 9;
    if byte == cmd.len() {
        return (offset % 9 == 0).then_some(Bit::One);
    }
    let value = cmd.byte(byte)?;
    match offset % 9 {
        0 => Some(Bit::Zero),
        n => Some(Bit::of(value, 8 - n as u8)),
    }
}

/// Iterator over every bit of one frame.
pub struct PacketBits<'a> {
    cmd: &'a DccCommand,
    preamble_bits: u8,
    position: Option<FramePosition>,
}

impl<'a> PacketBits<'a> {
    /// Starts at the first bit of the frame.
    pub fn new(cmd: &'a DccCommand, preamble_bits: u8) -> Self {
        Self {
            cmd,
            preamble_bits,
            position: Some(FramePosition::first(preamble_bits)),
        }
    }
}

impl Iterator for PacketBits<'_> {
    type Item = Bit;

    fn next(&mut self) -> Option<Bit> {
        let position = self.position?;
        self.position = position.next(self.cmd, self.preamble_bits);
        Some(position.bit(self.cmd))
    }
}

/// Iterator over the half-bit segments of one frame.
///
/// Yields `(level, duration_us)`: the pin A level during the segment and how
/// long it lasts. The level toggles on every segment, starting from the
/// inverse of `previous_level`.
pub struct HalfBits<'a> {
    bits: PacketBits<'a>,
    timing: SignalTiming,
    level: bool,
    pending: Option<u32>,
}

impl<'a> HalfBits<'a> {
    /// Renders `cmd` with `timing`, continuing from `previous_level`.
    pub fn new(cmd: &'a DccCommand, timing: SignalTiming, previous_level: bool) -> Self {
        Self {
            bits: PacketBits::new(cmd, timing.preamble_bits),
            timing,
            level: previous_level,
            pending: None,
        }
    }
}

impl Iterator for HalfBits<'_> {
    type Item = (bool, u32);

    fn next(&mut self) -> Option<(bool, u32)> {
        let duration = match self.pending.take() {
            Some(d) => d,
            None => {
                let d = self.bits.next()?.half_period_us(&self.timing);
                self.pending = Some(d);
                d
            }
        };
        self.level = !self.level;
        Some((self.level, duration))
    }
}
