//! Half-bit state machine that drives the track pins.
//!
//! [`Transmitter::tick`] is the body of the timer interrupt. Every call
//! toggles the differential pair once, starting a new half-bit, and returns
//! how long that half-bit lasts so the timer can be reloaded. After the
//! second half of a bit the frame position advances; after the end bit the
//! packet is either repeated or the next command is pulled from the
//! [`PacketSource`].
//!
//! ```text
//! Idle ──tick──▶ Preamble ─▶ StartBit ─▶ DataBit(byte, 7..0) ─┬▶ StartBit (next byte)
//!                   ▲                                          └▶ EndBit
//!                   └──────── repeat, or next command ◀────────────┘
//! ```
//!
//! Queued traffic never cuts a packet short: a priority command queued
//! mid-packet waits for the current command and all of its repeats.
//! [`Transmitter::stop`] parks the command in flight; the next tick sends it
//! again from the first preamble bit with the repeats it still owed.
//!
//! # Timing
//!
//! The tick path is constant time. Its longest branch is the end-bit
//! completion, which makes exactly one [`PacketSource::next_command`] call.
//! Nothing on the path allocates, blocks, or logs.

use crate::commands::DccCommand;
use crate::config::SignalTiming;
use crate::encoder::FramePosition;
use crate::error::{DccError, PinFault};
use crate::scheduler::PacketSource;
use crate::traits::TrackPin;

/// Where the transmitter is in its cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TxState {
    /// No command loaded; the next tick loads one.
    Idle,
    /// Stopped mid-command; the next tick restarts the same frame.
    Paused,
    /// Sending the bit at this frame position.
    Sending(FramePosition),
}

/// Which half of the current bit cell the next tick starts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HalfBit {
    /// First half.
    First,
    /// Second half; the bit completes with this tick.
    Second,
}

/// Drives one DCC output from a [`PacketSource`].
///
/// Pin A carries the signal and pin B its complement. The pin being pulled
/// low is always written before the pin being pulled high, so the pair is
/// never high at the same time.
///
/// Dropping the transmitter leaves both pins low.
///
/// # Example
///
/// ```rust
/// use rs_dcc::hal::MockPin;
/// use rs_dcc::queue::QueueStore;
/// use rs_dcc::{SignalTiming, Transmitter, TxState};
///
/// let (pin_a, pin_b) = MockPin::pair(2, 3);
/// let mut store: QueueStore = QueueStore::new();
/// let (_sender, scheduler) = store.split();
///
/// let mut tx = Transmitter::new(pin_a, pin_b, scheduler, SignalTiming::default()).unwrap();
/// assert_eq!(tx.state(), TxState::Idle);
///
/// // First tick loads an idle packet and starts its first preamble half-bit
/// assert_eq!(tx.tick(), 58);
/// assert!(tx.current_command().unwrap().is_idle());
/// ```
pub struct Transmitter<A: TrackPin, B: TrackPin, Q: PacketSource> {
    pin_a: A,
    pin_b: B,
    source: Q,
    timing: SignalTiming,
    command: DccCommand,
    state: TxState,
    half: HalfBit,
    level: bool,
    repeats_left: u8,
    packets_sent: u32,
    commands_completed: u32,
    pin_faults: u32,
}

impl<A: TrackPin, B: TrackPin, Q: PacketSource> Transmitter<A, B, Q> {
    /// Takes ownership of the pin pair and the packet source.
    ///
    /// Both pins are driven low before returning.
    ///
    /// # Errors
    ///
    /// - [`DccError::InvalidTiming`] if `timing` is outside transmitter limits
    /// - [`DccError::InvalidPinConfiguration`] if both pins are the same GPIO
    ///   or either refuses to be driven
    pub fn new(mut pin_a: A, mut pin_b: B, source: Q, timing: SignalTiming) -> Result<Self, DccError> {
        timing.validate()?;

        let (id_a, id_b) = (pin_a.pin_id(), pin_b.pin_id());
        if id_a == id_b {
            return Err(PinFault::SamePin(id_a).into());
        }
        pin_a.set_low().map_err(|_| PinFault::NotDrivable(id_a))?;
        pin_b.set_low().map_err(|_| PinFault::NotDrivable(id_b))?;

        log::debug!(
            "transmitter on GPIO{}/GPIO{}: one={}us zero={}us preamble={}",
            id_a,
            id_b,
            timing.one_half_us,
            timing.zero_half_us,
            timing.preamble_bits
        );

        Ok(Self {
            pin_a,
            pin_b,
            source,
            timing,
            command: DccCommand::idle(),
            state: TxState::Idle,
            half: HalfBit::First,
            level: false,
            repeats_left: 0,
            packets_sent: 0,
            commands_completed: 0,
            pin_faults: 0,
        })
    }

    /// Starts the next half-bit and returns its duration in microseconds.
    ///
    /// Call from the timer interrupt, then reload the timer with the result.
    pub fn tick(&mut self) -> u32 {
        let position = match self.state {
            TxState::Sending(position) => position,
            TxState::Idle => {
                self.load_next();
                self.first_position()
            }
            TxState::Paused => self.first_position(),
        };

        self.drive(!self.level);
        let period = position.bit(&self.command).half_period_us(&self.timing);

        match self.half {
            HalfBit::First => self.half = HalfBit::Second,
            HalfBit::Second => {
                self.half = HalfBit::First;
                self.advance(position);
            }
        }
        period
    }

    fn advance(&mut self, position: FramePosition) {
        if let Some(next) = position.next(&self.command, self.timing.preamble_bits) {
            self.state = TxState::Sending(next);
            return;
        }

        self.packets_sent = self.packets_sent.wrapping_add(1);
        if self.repeats_left > 0 {
            self.repeats_left -= 1;
            self.state = TxState::Sending(self.first_position());
        } else {
            self.commands_completed = self.commands_completed.wrapping_add(1);
            self.load_next();
        }
    }

    fn load_next(&mut self) {
        self.command = self.source.next_command();
        self.repeats_left = self.command.repeats();
        self.state = TxState::Sending(self.first_position());
        self.half = HalfBit::First;
    }

    fn first_position(&self) -> FramePosition {
        FramePosition::first(self.timing.preamble_bits)
    }

    fn drive(&mut self, level: bool) {
        let ok = if level {
            let b = self.pin_b.set_low().is_ok();
            let a = self.pin_a.set_high().is_ok();
            a && b
        } else {
            let a = self.pin_a.set_low().is_ok();
            let b = self.pin_b.set_high().is_ok();
            a && b
        };
        if !ok {
            self.pin_faults = self.pin_faults.wrapping_add(1);
        }
        self.level = level;
    }

    /// Cuts the current frame short and drives both pins low.
    ///
    /// The command in flight is kept along with its remaining repeats. The
    /// next [`tick`](Self::tick) restarts it from the first preamble bit
    /// without consulting the source, so a stop and restart never loses an
    /// emergency stop.
    pub fn stop(&mut self) {
        if let TxState::Sending(_) = self.state {
            self.state = TxState::Paused;
        }
        self.half = HalfBit::First;
        self.release_pins();
    }

    fn release_pins(&mut self) {
        let _ = self.pin_a.set_low();
        let _ = self.pin_b.set_low();
        self.level = false;
    }

    /// Current position in the cycle.
    pub fn state(&self) -> TxState {
        self.state
    }

    /// Half of the bit cell the next tick starts.
    pub fn half(&self) -> HalfBit {
        self.half
    }

    /// Level of pin A (pin B holds the opposite while sending).
    pub fn level(&self) -> bool {
        self.level
    }

    /// The command on the track (or parked by [`stop`](Self::stop)), or
    /// `None` while idle.
    pub fn current_command(&self) -> Option<&DccCommand> {
        match self.state {
            TxState::Idle => None,
            TxState::Sending(_) | TxState::Paused => Some(&self.command),
        }
    }

    /// Transmissions of the current command still to come after this one.
    pub fn repeats_left(&self) -> u8 {
        self.repeats_left
    }

    /// Complete frames sent, repeats included.
    pub fn packets_sent(&self) -> u32 {
        self.packets_sent
    }

    /// Commands sent to completion, all repeats done.
    pub fn commands_completed(&self) -> u32 {
        self.commands_completed
    }

    /// Ticks on which a pin write failed.
    pub fn pin_faults(&self) -> u32 {
        self.pin_faults
    }

    /// Timing table in use.
    pub fn timing(&self) -> &SignalTiming {
        &self.timing
    }

    /// The packet source, e.g. to read scheduler counters.
    pub fn source(&self) -> &Q {
        &self.source
    }
}

impl<A: TrackPin, B: TrackPin, Q: PacketSource> Drop for Transmitter<A, B, Q> {
    fn drop(&mut self) {
        self.release_pins();
    }
}
