//! # rs-dcc
//!
//! A DCC (Digital Command Control) track signal generator for model
//! railroads, with two-tier packet scheduling.
//!
//! ## Features
//!
//! - **Packet builders**: Idle, reset, speed (28 and 128 step), functions, accessories
//! - **Two-tier queues**: Emergency stops jump ahead of ordinary traffic
//! - **Never silent**: An idle packet goes out whenever nothing is queued
//! - **Interrupt-driven**: One pin toggle per timer tick, constant-time tick path
//! - **No globals**: Pins, timer and queues are owned values
//!
//! ## Architecture
//!
//! The crate is structured to allow testing on desktop without hardware:
//!
//! - `commands` - Packet construction and checksums
//! - `queue` - Fixed-capacity priority/standard rings and the producer handle
//! - `scheduler` - Picks the next packet for the transmitter
//! - `encoder` - Bit framing (preamble, start bits, end bit)
//! - `transmitter` - Half-bit state machine driving the track pins
//! - `station` - Owns the transmitter and its timer
//! - `decoder` - Reference decoder for verifying output
//! - `hal` - Concrete implementations (mock for testing, esp32 for hardware)
//!
//! ## Example
//!
//! ```rust
//! use rs_dcc::{
//!     Address, DccCommand, DccConfig, DccStation, Direction,
//!     hal::{MockPin, MockTimer},
//!     queue::QueueStore,
//! };
//!
//! // Queues live wherever the board keeps long-lived state
//! let mut store: QueueStore = QueueStore::new();
//! let (mut sender, scheduler) = store.split();
//!
//! let (pin_a, pin_b) = MockPin::pair(2, 3);
//! let mut station = DccStation::new(pin_a, pin_b, scheduler, MockTimer::new(), DccConfig::default()).unwrap();
//! station.start().unwrap();
//!
//! // Loco 3 forward at step 40, then stop everything
//! sender.send(DccCommand::speed_128(Address::Short(3), Direction::Forward, 40).unwrap()).unwrap();
//! sender.send(DccCommand::broadcast_stop()).unwrap();
//!
//! // Timer interrupt
//! station.on_interrupt().unwrap();
//! // The stop was queued as priority, so it goes first
//! assert!(station.transmitter().current_command().unwrap().is_emergency_stop());
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]

extern crate alloc;

/// Packet types, builders, and checksums.
pub mod commands;
/// Signal timing and pin configuration.
pub mod config;
/// Reference decoder that turns half-bit durations back into packets.
pub mod decoder;
/// Bit framing of packets.
pub mod encoder;
/// Error types.
pub mod error;
/// Hardware abstraction layer with mock implementations for testing.
pub mod hal;
/// Fixed-capacity priority and standard command queues.
pub mod queue;
/// Next-packet selection with idle fallback.
pub mod scheduler;
/// Timer and pin ownership for one output.
pub mod station;
/// Core traits for hardware abstraction.
pub mod traits;
/// Half-bit state machine driving the track pins.
pub mod transmitter;

// Re-exports for convenience
pub use commands::{Address, DccCommand, Direction, QueueTier};
pub use config::{DccConfig, PinConfig, SignalTiming};
pub use decoder::{DecodedPacket, PacketDecoder};
pub use encoder::{Bit, FramePosition};
pub use error::{DccError, PacketError, PinFault, QueueFull, TimingFault};
pub use queue::{CommandSender, QueueStore};
pub use scheduler::{PacketSource, Scheduler};
pub use station::DccStation;
pub use traits::{SignalTimer, TrackPin};
pub use transmitter::{HalfBit, Transmitter, TxState};
