//! Error types for packet construction, queueing, and station setup.
//!
//! Only [`QueueFull`] is expected at runtime: it is the backpressure signal
//! returned to producers when a queue tier has no free slot. Everything else
//! is raised while building packets or constructing a [`DccStation`], before
//! any signal is generated.
//!
//! [`DccStation`]: crate::DccStation

use core::fmt;

use crate::commands::{DccCommand, QueueTier};

/// Top-level error for station construction and operation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DccError {
    /// A queue tier was full and the command was not accepted.
    QueueFull(QueueTier),

    /// The output pin pair cannot carry a DCC signal.
    ///
    /// Fatal at construction: no degraded signal is attempted.
    InvalidPinConfiguration(PinFault),

    /// The signal timing table is outside the transmitter limits.
    InvalidTiming(TimingFault),

    /// A packet could not be built.
    Packet(PacketError),

    /// The half-bit timer could not be armed or reloaded.
    Timer,
}

impl fmt::Display for DccError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::QueueFull(tier) => write!(f, "{} queue is full", tier.as_str()),
            Self::InvalidPinConfiguration(fault) => write!(f, "invalid pin configuration: {}", fault),
            Self::InvalidTiming(fault) => write!(f, "invalid signal timing: {}", fault),
            Self::Packet(err) => write!(f, "invalid packet: {}", err),
            Self::Timer => f.write_str("signal timer failure"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for DccError {}

impl From<PacketError> for DccError {
    fn from(err: PacketError) -> Self {
        Self::Packet(err)
    }
}

impl From<PinFault> for DccError {
    fn from(fault: PinFault) -> Self {
        Self::InvalidPinConfiguration(fault)
    }
}

impl From<TimingFault> for DccError {
    fn from(fault: TimingFault) -> Self {
        Self::InvalidTiming(fault)
    }
}

impl From<QueueFull> for DccError {
    fn from(full: QueueFull) -> Self {
        Self::QueueFull(full.tier)
    }
}

/// A queue tier rejected a command because it had no free slot.
///
/// The rejected command is handed back so the caller can retry it later or
/// drop it deliberately. Commands already queued are never displaced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QueueFull {
    /// The tier that was full.
    pub tier: QueueTier,
    /// The command that was not queued.
    pub command: DccCommand,
}

impl QueueFull {
    /// Takes back the rejected command.
    pub fn into_command(self) -> DccCommand {
        self.command
    }
}

impl fmt::Display for QueueFull {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} queue is full", self.tier.as_str())
    }
}

#[cfg(feature = "std")]
impl std::error::Error for QueueFull {}

/// Why a packet could not be built.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum PacketError {
    /// No address byte was supplied.
    Empty,
    /// More payload bytes than a DCC packet can carry.
    TooLong {
        /// Number of bytes supplied.
        len: usize,
    },
    /// Locomotive or accessory address outside its valid range.
    InvalidAddress(u16),
    /// Speed step outside the range of the chosen speed mode.
    InvalidSpeed(u8),
    /// Accessory output pair outside 0..=3.
    InvalidPort(u8),
}

impl fmt::Display for PacketError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str("packet has no address byte"),
            Self::TooLong { len } => write!(f, "{} payload bytes exceeds packet limit", len),
            Self::InvalidAddress(addr) => write!(f, "address {} out of range", addr),
            Self::InvalidSpeed(step) => write!(f, "speed step {} out of range", step),
            Self::InvalidPort(port) => write!(f, "accessory port {} out of range", port),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for PacketError {}

/// Why an output pin pair was refused.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum PinFault {
    /// Both halves of the pair name the same GPIO.
    SamePin(u8),
    /// The pin refused to be driven to a level.
    NotDrivable(u8),
}

impl fmt::Display for PinFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SamePin(id) => write!(f, "pin {} used for both outputs", id),
            Self::NotDrivable(id) => write!(f, "pin {} cannot be driven", id),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for PinFault {}

/// Which signal timing value is out of range.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum TimingFault {
    /// Half period of a "1" bit, in microseconds.
    OneHalfPeriod(u32),
    /// Half period of a "0" bit, in microseconds.
    ZeroHalfPeriod(u32),
    /// Number of preamble bits.
    PreambleLength(u8),
}

impl fmt::Display for TimingFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OneHalfPeriod(us) => write!(f, "one-bit half period {}us out of range", us),
            Self::ZeroHalfPeriod(us) => write!(f, "zero-bit half period {}us out of range", us),
            Self::PreambleLength(n) => write!(f, "preamble of {} bits out of range", n),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for TimingFault {}
