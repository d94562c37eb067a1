//! Signal timing and output configuration.
//!
//! The bit-cell durations and preamble length are kept in a table rather
//! than scattered as constants, so a board can be trimmed against an
//! oscilloscope capture without touching the encoder.
//!
//! # Example
//!
//! ```rust
//! use rs_dcc::config::{DccConfig, PinConfig, SignalTiming};
//!
//! // Use defaults (58us / 100us half periods, 16-bit preamble, GPIO2/GPIO3)
//! let config = DccConfig::default();
//! assert!(config.validate().is_ok());
//!
//! // Or customize
//! let config = DccConfig::default()
//!     .with_timing(SignalTiming::default().with_preamble_bits(20))
//!     .with_pins(PinConfig::new(18, 19));
//! assert_eq!(config.timing.preamble_bits, 20);
//! ```

use crate::error::{PinFault, TimingFault};

// ============================================================================
// Transmitter limits (NMRA S-9.1)
// ============================================================================

/// Shortest half period a command station may send for a "1" bit.
pub const ONE_HALF_MIN_US: u32 = 55;

/// Longest half period a command station may send for a "1" bit.
pub const ONE_HALF_MAX_US: u32 = 61;

/// Shortest half period a command station may send for a "0" bit.
pub const ZERO_HALF_MIN_US: u32 = 95;

/// Longest half period a command station may send for a "0" bit.
pub const ZERO_HALF_MAX_US: u32 = 9900;

/// Fewest preamble bits a command station may send.
pub const MIN_PREAMBLE_BITS: u8 = 14;

/// Upper bound on the preamble, to keep frames short.
pub const MAX_PREAMBLE_BITS: u8 = 64;

/// Preamble length for service-mode (programming track) packets.
pub const SERVICE_MODE_PREAMBLE_BITS: u8 = 20;

// ============================================================================
// Main Config
// ============================================================================

/// Complete station configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DccConfig {
    /// Bit timing and preamble length
    pub timing: SignalTiming,
    /// Output pin pair
    pub pins: PinConfig,
}

impl DccConfig {
    /// Set timing configuration
    pub fn with_timing(mut self, timing: SignalTiming) -> Self {
        self.timing = timing;
        self
    }

    /// Set pin configuration
    pub fn with_pins(mut self, pins: PinConfig) -> Self {
        self.pins = pins;
        self
    }

    /// Checks every section.
    pub fn validate(&self) -> Result<(), crate::DccError> {
        self.timing.validate()?;
        self.pins.validate()?;
        Ok(())
    }
}

// ============================================================================
// Signal Timing
// ============================================================================

/// Half-bit durations and preamble length.
///
/// A "1" bit is two equal halves of `one_half_us`, a "0" bit two equal
/// halves of `zero_half_us`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SignalTiming {
    /// Half period of a "1" bit in microseconds
    pub one_half_us: u32,
    /// Half period of a "0" bit in microseconds
    pub zero_half_us: u32,
    /// Number of "1" bits sent before each packet
    pub preamble_bits: u8,
}

impl Default for SignalTiming {
    fn default() -> Self {
        Self {
            one_half_us: 58,
            zero_half_us: 100,
            preamble_bits: 16,
        }
    }
}

impl SignalTiming {
    /// Timing for a programming track: default bit cells, 20-bit preamble.
    pub fn service_mode() -> Self {
        Self::default().with_preamble_bits(SERVICE_MODE_PREAMBLE_BITS)
    }

    /// Set the "1" half period
    pub fn with_one_half_us(mut self, us: u32) -> Self {
        self.one_half_us = us;
        self
    }

    /// Set the "0" half period
    pub fn with_zero_half_us(mut self, us: u32) -> Self {
        self.zero_half_us = us;
        self
    }

    /// Set the preamble length
    pub fn with_preamble_bits(mut self, bits: u8) -> Self {
        self.preamble_bits = bits;
        self
    }

    /// Checks the table against the command station transmit limits.
    ///
    /// ```
    /// use rs_dcc::config::SignalTiming;
    /// use rs_dcc::TimingFault;
    ///
    /// assert!(SignalTiming::default().validate().is_ok());
    /// assert_eq!(
    ///     SignalTiming::default().with_preamble_bits(10).validate(),
    ///     Err(TimingFault::PreambleLength(10)),
    /// );
    /// ```
    pub fn validate(&self) -> Result<(), TimingFault> {
        if !(ONE_HALF_MIN_US..=ONE_HALF_MAX_US).contains(&self.one_half_us) {
            return Err(TimingFault::OneHalfPeriod(self.one_half_us));
        }
        if !(ZERO_HALF_MIN_US..=ZERO_HALF_MAX_US).contains(&self.zero_half_us) {
            return Err(TimingFault::ZeroHalfPeriod(self.zero_half_us));
        }
        if !(MIN_PREAMBLE_BITS..=MAX_PREAMBLE_BITS).contains(&self.preamble_bits) {
            return Err(TimingFault::PreambleLength(self.preamble_bits));
        }
        Ok(())
    }
}

// ============================================================================
// Pin Config
// ============================================================================

/// GPIO numbers of the differential output pair.
///
/// Pin A carries the signal, pin B its complement.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PinConfig {
    /// Signal output
    pub pin_a: u8,
    /// Complementary output
    pub pin_b: u8,
}

impl Default for PinConfig {
    fn default() -> Self {
        Self { pin_a: 2, pin_b: 3 }
    }
}

impl PinConfig {
    /// Creates a pin pair.
    pub fn new(pin_a: u8, pin_b: u8) -> Self {
        Self { pin_a, pin_b }
    }

    /// Both outputs must be different pins.
    pub fn validate(&self) -> Result<(), PinFault> {
        if self.pin_a == self.pin_b {
            return Err(PinFault::SamePin(self.pin_a));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DccError;

    #[test]
    fn default_timing_is_valid() {
        let timing = SignalTiming::default();
        assert_eq!(timing.one_half_us, 58);
        assert_eq!(timing.zero_half_us, 100);
        assert_eq!(timing.preamble_bits, 16);
        assert!(timing.validate().is_ok());
    }

    #[test]
    fn service_mode_has_long_preamble() {
        let timing = SignalTiming::service_mode();
        assert_eq!(timing.preamble_bits, 20);
        assert!(timing.validate().is_ok());
    }

    #[test]
    fn one_half_period_limits() {
        assert!(SignalTiming::default().with_one_half_us(55).validate().is_ok());
        assert!(SignalTiming::default().with_one_half_us(61).validate().is_ok());
        assert_eq!(
            SignalTiming::default().with_one_half_us(54).validate(),
            Err(TimingFault::OneHalfPeriod(54))
        );
        assert_eq!(
            SignalTiming::default().with_one_half_us(62).validate(),
            Err(TimingFault::OneHalfPeriod(62))
        );
    }

    #[test]
    fn zero_half_period_limits() {
        assert!(SignalTiming::default().with_zero_half_us(95).validate().is_ok());
        assert!(SignalTiming::default().with_zero_half_us(9900).validate().is_ok());
        assert_eq!(
            SignalTiming::default().with_zero_half_us(90).validate(),
            Err(TimingFault::ZeroHalfPeriod(90))
        );
    }

    #[test]
    fn preamble_limits() {
        assert!(SignalTiming::default().with_preamble_bits(14).validate().is_ok());
        assert_eq!(
            SignalTiming::default().with_preamble_bits(13).validate(),
            Err(TimingFault::PreambleLength(13))
        );
        assert_eq!(
            SignalTiming::default().with_preamble_bits(65).validate(),
            Err(TimingFault::PreambleLength(65))
        );
    }

    #[test]
    fn pins_must_differ() {
        assert!(PinConfig::default().validate().is_ok());
        assert_eq!(PinConfig::new(5, 5).validate(), Err(PinFault::SamePin(5)));
    }

    #[test]
    fn config_validate_reports_first_fault() {
        let config = DccConfig::default().with_pins(PinConfig::new(4, 4));
        assert_eq!(
            config.validate(),
            Err(DccError::InvalidPinConfiguration(PinFault::SamePin(4)))
        );

        let config = DccConfig::default().with_timing(SignalTiming::default().with_one_half_us(70));
        assert_eq!(
            config.validate(),
            Err(DccError::InvalidTiming(TimingFault::OneHalfPeriod(70)))
        );
    }
}
