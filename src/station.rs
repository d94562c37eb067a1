//! Owned timer and pins for one DCC output.
//!
//! [`DccStation`] pairs a [`Transmitter`] with the [`SignalTimer`] that paces
//! it. There is no global state: every resource the interrupt touches lives
//! in the station, so several stations (main track and programming track,
//! say) can run side by side.
//!
//! # Example
//!
//! ```rust
//! use rs_dcc::hal::{MockPin, MockTimer};
//! use rs_dcc::queue::QueueStore;
//! use rs_dcc::{Address, DccCommand, DccConfig, DccStation, Direction};
//!
//! let mut store: QueueStore = QueueStore::new();
//! let (mut sender, scheduler) = store.split();
//!
//! let (pin_a, pin_b) = MockPin::pair(2, 3);
//! let timer = MockTimer::new();
//! let periods = timer.probe();
//! let mut station = DccStation::new(pin_a, pin_b, scheduler, timer, DccConfig::default()).unwrap();
//!
//! sender
//!     .send(DccCommand::speed_128(Address::Short(3), Direction::Forward, 40).unwrap())
//!     .unwrap();
//!
//! station.start().unwrap();
//! // The board calls this from the timer ISR
//! for _ in 0..200 {
//!     station.on_interrupt().unwrap();
//! }
//! assert!(periods.periods().iter().all(|p| *p == 58 || *p == 100));
//! ```

use crate::config::DccConfig;
use crate::error::DccError;
use crate::scheduler::PacketSource;
use crate::traits::{SignalTimer, TrackPin};
use crate::transmitter::Transmitter;

/// One transmitter plus the timer that drives it.
///
/// Dropping the station disarms the timer and leaves both pins low.
pub struct DccStation<A, B, Q, T>
where
    A: TrackPin,
    B: TrackPin,
    Q: PacketSource,
    T: SignalTimer,
{
    transmitter: Transmitter<A, B, Q>,
    timer: T,
    running: bool,
}

impl<A, B, Q, T> DccStation<A, B, Q, T>
where
    A: TrackPin,
    B: TrackPin,
    Q: PacketSource,
    T: SignalTimer,
{
    /// Validates `config` and takes ownership of the hardware.
    ///
    /// The timer is left disarmed and the pins low until
    /// [`start`](Self::start). Several stations can be built, and a board
    /// can hand one to its interrupt handler, before any edge reaches the
    /// track.
    ///
    /// # Errors
    ///
    /// Pin and timing faults from `config` or [`Transmitter::new`]. Pins whose
    /// GPIO numbers differ from `config.pins` are accepted with a warning.
    pub fn new(pin_a: A, pin_b: B, source: Q, timer: T, config: DccConfig) -> Result<Self, DccError> {
        config.validate()?;
        let (id_a, id_b) = (pin_a.pin_id(), pin_b.pin_id());
        if (id_a, id_b) != (config.pins.pin_a, config.pins.pin_b) {
            log::warn!(
                "station pins GPIO{}/GPIO{} differ from configured GPIO{}/GPIO{}",
                id_a,
                id_b,
                config.pins.pin_a,
                config.pins.pin_b
            );
        }

        let transmitter = Transmitter::new(pin_a, pin_b, source, config.timing)?;
        log::info!("DCC station ready on GPIO{}/GPIO{}", id_a, id_b);

        Ok(Self {
            transmitter,
            timer,
            running: false,
        })
    }

    /// Arms the timer. The first interrupt starts the first half-bit.
    ///
    /// Calling `start` on a running station does nothing.
    pub fn start(&mut self) -> Result<(), DccError> {
        if self.running {
            return Ok(());
        }
        let first = self.transmitter.timing().one_half_us;
        self.timer.arm(first).map_err(|_| DccError::Timer)?;
        self.running = true;
        log::info!("DCC signal started");
        Ok(())
    }

    /// Timer interrupt body: one tick, then reload with its half-bit period.
    ///
    /// Returns the period programmed into the timer.
    #[inline]
    pub fn on_interrupt(&mut self) -> Result<u32, DccError> {
        let period = self.transmitter.tick();
        self.timer.reload(period).map_err(|_| DccError::Timer)?;
        Ok(period)
    }

    /// Disarms the timer and drives both pins low.
    ///
    /// A command in flight is kept with its remaining repeats;
    /// [`start`](Self::start) sends it again from the first preamble bit.
    pub fn stop(&mut self) -> Result<(), DccError> {
        let disarmed = self.timer.disarm().map_err(|_| DccError::Timer);
        self.transmitter.stop();
        if self.running {
            log::info!(
                "DCC signal stopped after {} packets",
                self.transmitter.packets_sent()
            );
        }
        self.running = false;
        disarmed
    }

    /// True between [`start`](Self::start) and [`stop`](Self::stop).
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// The transmitter, for counters and state.
    pub fn transmitter(&self) -> &Transmitter<A, B, Q> {
        &self.transmitter
    }

    /// The owned timer.
    pub fn timer(&self) -> &T {
        &self.timer
    }

    /// Mutable access to the owned timer, e.g. to clear a hardware flag.
    pub fn timer_mut(&mut self) -> &mut T {
        &mut self.timer
    }
}

impl<A, B, Q, T> Drop for DccStation<A, B, Q, T>
where
    A: TrackPin,
    B: TrackPin,
    Q: PacketSource,
    T: SignalTimer,
{
    fn drop(&mut self) {
        let _ = self.timer.disarm();
        self.transmitter.stop();
    }
}
