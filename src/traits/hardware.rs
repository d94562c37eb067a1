//! Hardware abstraction traits for the track output and half-bit timer.
//!
//! This module defines the two hardware interfaces the signal generator
//! needs, so it can run on the ESP32, on desktop mocks, or on any board with
//! an `embedded-hal` output pin and a one-shot timer.
//!
//! # Key Traits
//!
//! | Trait | Purpose |
//! |-------|---------|
//! | [`TrackPin`] | One side of the differential DCC output |
//! | [`SignalTimer`] | Fires once per half-bit, reloadable each tick |
//!
//! # Implementation
//!
//! For testing and desktop development, use the mock implementations
//! from [`crate::hal::mock`]. For ESP32 hardware, use the
//! implementations from `hal::esp32` (requires `esp32` feature).
//!
//! # Example
//!
//! ```rust
//! use rs_dcc::traits::{SignalTimer, TrackPin};
//! use rs_dcc::hal::{MockPin, MockTimer};
//! use embedded_hal::digital::OutputPin;
//!
//! let mut pin = MockPin::new(2);
//! assert_eq!(pin.pin_id(), 2);
//! pin.set_high().unwrap();
//! assert!(pin.probe().level());
//!
//! let mut timer = MockTimer::new();
//! timer.arm(58).unwrap();
//! assert!(timer.is_armed());
//! ```

use embedded_hal::digital::OutputPin;

/// A digital output that can drive one rail of the track bus.
///
/// The `OutputPin` bound guarantees the pin can be driven; `pin_id` lets the
/// transmitter refuse a pair that names the same GPIO twice.
pub trait TrackPin: OutputPin {
    /// Board GPIO number of this pin.
    fn pin_id(&self) -> u8;
}

/// One-shot timer that paces the half-bit ticks.
///
/// The station arms it once, then reloads it from every tick with the
/// duration of the half-bit that tick started.
///
/// # Implementation Notes
///
/// - `reload` is called from interrupt context and must not block
/// - `disarm` must leave the timer unable to fire again until `arm`
pub trait SignalTimer {
    /// Error type for timer operations.
    type Error;

    /// Starts the timer; the first tick fires after `period_us`.
    fn arm(&mut self, period_us: u32) -> Result<(), Self::Error>;

    /// Sets the delay until the next tick.
    fn reload(&mut self, period_us: u32) -> Result<(), Self::Error>;

    /// Stops the timer.
    fn disarm(&mut self) -> Result<(), Self::Error>;

    /// Returns true between `arm` and `disarm`.
    fn is_armed(&self) -> bool;
}
