//! ESP32-C3 SuperMini hardware abstraction layer for DCC output.
//!
//! This module provides hardware implementations for driving a DCC track
//! through an H-bridge (BTS7960 or similar) from an ESP32-C3 SuperMini.
//!
//! # Hardware Configuration
//!
//! - **MCU**: ESP32-C3 SuperMini (RISC-V 160MHz, 4MB Flash)
//! - **Track driver**: H-bridge with its two inputs on the DCC pin pair
//! - **Timer**: General purpose timer group 0, timer 0; the signal ticks in
//!   its alarm interrupt
//!
//! # Pin Assignments
//!
//! See the [`pins`] module for GPIO assignments matching the SuperMini layout.

mod pin;
mod timer;

pub use pin::{Esp32PinError, Esp32TrackPin};
pub use timer::{Esp32Alarm, Esp32SignalTimer};

/// Pin assignments for SuperMini ESP32-C3.
///
/// These match [`PinConfig::default`](crate::PinConfig):
/// the H-bridge inputs sit on GPIO2 and GPIO3.
pub mod pins {
    /// DCC signal, to the bridge's forward input (IN1 / L_PWM)
    pub const DCC_A: u8 = 2;

    /// Inverted DCC signal, to the bridge's reverse input (IN2 / R_PWM)
    pub const DCC_B: u8 = 3;
}
