//! Mock implementations for testing without hardware.
//!
//! These test doubles record every pin write and timer call into a shared
//! log. The log is reachable through a probe that outlives the mock, so a
//! test can hand the mocks to a transmitter or station, drop it, and still
//! check what happened on the "wires".
//!
//! # Available Mocks
//!
//! | Mock | Trait | Purpose |
//! |------|-------|---------|
//! | [`MockPin`] | [`TrackPin`] | Records levels, can refuse writes |
//! | [`MockTimer`] | [`SignalTimer`] | Records arm/reload/disarm calls |
//!
//! # Example
//!
//! ```rust
//! use rs_dcc::hal::{MockPin, MockTimer};
//! use rs_dcc::queue::QueueStore;
//! use rs_dcc::{DccConfig, DccStation};
//!
//! let (pin_a, pin_b) = MockPin::pair(2, 3);
//! let track = pin_a.probe();
//! let timer = MockTimer::new();
//! let timer_log = timer.probe();
//!
//! let mut store: QueueStore = QueueStore::new();
//! let (_sender, scheduler) = store.split();
//! let mut station = DccStation::new(pin_a, pin_b, scheduler, timer, DccConfig::default()).unwrap();
//! station.start().unwrap();
//! station.on_interrupt().unwrap();
//!
//! assert!(track.level_of(2) != track.level_of(3));
//! drop(station);
//!
//! // Dropped: timer disarmed, both rails low
//! assert!(!timer_log.is_armed());
//! assert!(!track.level_of(2) && !track.level_of(3));
//! ```
//!
//! [`TrackPin`]: crate::traits::TrackPin
//! [`SignalTimer`]: crate::traits::SignalTimer

use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::RefCell;

use embedded_hal::digital::{self, ErrorKind, ErrorType, OutputPin};

use crate::traits::{SignalTimer, TrackPin};

// ============================================================================
// Pins
// ============================================================================

/// Error returned by a [`MockPin`] built with [`failing`](MockPin::failing).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MockPinError;

impl digital::Error for MockPinError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

#[derive(Debug, Default)]
struct TrackLog {
    events: Vec<(u8, bool)>,
}

/// Read-only view of the writes made through one or more [`MockPin`]s.
#[derive(Clone, Debug)]
pub struct PinProbe {
    id: u8,
    log: Rc<RefCell<TrackLog>>,
}

impl PinProbe {
    /// Current level of the probed pin (low until first written).
    pub fn level(&self) -> bool {
        self.level_of(self.id)
    }

    /// Current level of any pin sharing this log.
    pub fn level_of(&self, id: u8) -> bool {
        self.log
            .borrow()
            .events
            .iter()
            .rev()
            .find(|(pin, _)| *pin == id)
            .map(|&(_, level)| level)
            .unwrap_or(false)
    }

    /// Levels written to the probed pin, oldest first.
    pub fn writes(&self) -> Vec<bool> {
        self.log
            .borrow()
            .events
            .iter()
            .filter(|(pin, _)| *pin == self.id)
            .map(|&(_, level)| level)
            .collect()
    }

    /// Every `(pin, level)` write on the shared log, oldest first.
    pub fn events(&self) -> Vec<(u8, bool)> {
        self.log.borrow().events.clone()
    }

    /// True if, at any point, two pins on this log were high together.
    pub fn overlap_seen(&self) -> bool {
        let mut high: Vec<u8> = Vec::new();
        for &(pin, level) in self.log.borrow().events.iter() {
            high.retain(|p| *p != pin);
            if level {
                high.push(pin);
            }
            if high.len() > 1 {
                return true;
            }
        }
        false
    }

    /// Forgets all recorded writes.
    pub fn clear(&self) {
        self.log.borrow_mut().events.clear();
    }
}

/// Mock output pin for testing.
///
/// # Example
///
/// ```rust
/// use rs_dcc::hal::MockPin;
/// use embedded_hal::digital::OutputPin;
///
/// let (mut a, mut b) = MockPin::pair(4, 5);
/// let probe = a.probe();
///
/// a.set_high().unwrap();
/// b.set_low().unwrap();
/// assert_eq!(probe.events(), vec![(4, true), (5, false)]);
/// assert!(!probe.overlap_seen());
///
/// let mut broken = MockPin::new(6).failing();
/// assert!(broken.set_high().is_err());
/// ```
#[derive(Debug)]
pub struct MockPin {
    id: u8,
    log: Rc<RefCell<TrackLog>>,
    writes_left: Option<usize>,
}

impl MockPin {
    /// Creates a pin with its own log.
    pub fn new(id: u8) -> Self {
        Self {
            id,
            log: Rc::new(RefCell::new(TrackLog::default())),
            writes_left: None,
        }
    }

    /// Creates two pins writing into one shared log.
    pub fn pair(id_a: u8, id_b: u8) -> (Self, Self) {
        let a = Self::new(id_a);
        let b = Self {
            id: id_b,
            log: Rc::clone(&a.log),
            writes_left: None,
        };
        (a, b)
    }

    /// Makes every write fail.
    pub fn failing(self) -> Self {
        self.fail_after(0)
    }

    /// Accepts `writes` writes, then fails every one after.
    pub fn fail_after(mut self, writes: usize) -> Self {
        self.writes_left = Some(writes);
        self
    }

    /// Returns a probe onto this pin's log.
    pub fn probe(&self) -> PinProbe {
        PinProbe {
            id: self.id,
            log: Rc::clone(&self.log),
        }
    }

    fn write(&mut self, level: bool) -> Result<(), MockPinError> {
        match self.writes_left {
            Some(0) => return Err(MockPinError),
            Some(ref mut n) => *n -= 1,
            None => {}
        }
        self.log.borrow_mut().events.push((self.id, level));
        Ok(())
    }
}

impl ErrorType for MockPin {
    type Error = MockPinError;
}

impl OutputPin for MockPin {
    fn set_low(&mut self) -> Result<(), MockPinError> {
        self.write(false)
    }

    fn set_high(&mut self) -> Result<(), MockPinError> {
        self.write(true)
    }
}

impl TrackPin for MockPin {
    fn pin_id(&self) -> u8 {
        self.id
    }
}

// ============================================================================
// Timer
// ============================================================================

#[derive(Debug, Default)]
struct TimerLog {
    armed: bool,
    arms: usize,
    disarms: usize,
    periods: Vec<u32>,
}

/// Read-only view of a [`MockTimer`]'s history.
#[derive(Clone, Debug)]
pub struct TimerProbe {
    log: Rc<RefCell<TimerLog>>,
}

impl TimerProbe {
    /// True between `arm` and `disarm`.
    pub fn is_armed(&self) -> bool {
        self.log.borrow().armed
    }

    /// Number of `arm` calls.
    pub fn arm_count(&self) -> usize {
        self.log.borrow().arms
    }

    /// Number of `disarm` calls.
    pub fn disarm_count(&self) -> usize {
        self.log.borrow().disarms
    }

    /// Every period passed to `arm` or `reload`, oldest first.
    pub fn periods(&self) -> Vec<u32> {
        self.log.borrow().periods.clone()
    }
}

/// Mock half-bit timer.
///
/// Never fires on its own: tests call the station's `on_interrupt`
/// directly and read back the periods it programmed.
///
/// ```rust
/// use rs_dcc::hal::MockTimer;
/// use rs_dcc::traits::SignalTimer;
///
/// let mut timer = MockTimer::new();
/// let probe = timer.probe();
/// timer.arm(58).unwrap();
/// timer.reload(100).unwrap();
/// timer.disarm().unwrap();
///
/// assert_eq!(probe.periods(), vec![58, 100]);
/// assert!(!probe.is_armed());
/// ```
#[derive(Debug, Default)]
pub struct MockTimer {
    log: Rc<RefCell<TimerLog>>,
    fail: bool,
}

impl MockTimer {
    /// Creates a disarmed timer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `arm` and `reload` fail.
    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    /// Returns a probe onto this timer's log.
    pub fn probe(&self) -> TimerProbe {
        TimerProbe {
            log: Rc::clone(&self.log),
        }
    }
}

impl SignalTimer for MockTimer {
    type Error = ();

    fn arm(&mut self, period_us: u32) -> Result<(), ()> {
        if self.fail {
            return Err(());
        }
        let mut log = self.log.borrow_mut();
        log.armed = true;
        log.arms += 1;
        log.periods.push(period_us);
        Ok(())
    }

    fn reload(&mut self, period_us: u32) -> Result<(), ()> {
        if self.fail {
            return Err(());
        }
        self.log.borrow_mut().periods.push(period_us);
        Ok(())
    }

    fn disarm(&mut self) -> Result<(), ()> {
        let mut log = self.log.borrow_mut();
        log.armed = false;
        log.disarms += 1;
        Ok(())
    }

    fn is_armed(&self) -> bool {
        self.log.borrow().armed
    }
}
