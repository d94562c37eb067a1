//! Trait definitions for hardware abstraction.
//!
//! This module defines the abstractions that allow rs-dcc to run on
//! different hardware (ESP32, desktop mock) without changing the encoder,
//! scheduler, or transmitter.
//!
//! # Submodules
//!
//! - `hardware`: Track output pins and the half-bit timer
//!
//! # Hardware Abstraction
//!
//! - [`TrackPin`]: One rail of the differential output (an `embedded-hal` output pin)
//! - [`SignalTimer`]: One-shot timer reloaded with each half-bit duration
//!
//! The packet side of the seam, [`PacketSource`](crate::scheduler::PacketSource),
//! lives with the scheduler.

pub mod hardware;

pub use hardware::*;
