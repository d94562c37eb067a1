//! Half-bit timer using an ESP32 general purpose timer.
//!
//! The signal is ticked from the alarm interrupt itself. [`Esp32SignalTimer`]
//! owns the driver and the interrupt registration; [`Esp32Alarm`] is the
//! handle the station holds inside that interrupt to program the next
//! half-bit.

use crate::traits::SignalTimer;
use esp_idf_hal::peripheral::Peripheral;
use esp_idf_hal::sys::{self, esp, timer_group_t, timer_idx_t, EspError};
use esp_idf_hal::timer::{config::Config, Timer, TimerDriver};

/// General purpose timer running in auto-reload mode.
///
/// Keep it alive for as long as the signal runs: dropping it deinitializes
/// the timer and unregisters the alarm callback.
///
/// # Example
///
/// ```ignore
/// use rs_dcc::hal::esp32::Esp32SignalTimer;
///
/// let peripherals = Peripherals::take()?;
/// let mut timer = Esp32SignalTimer::new(peripherals.timer00)?;
///
/// let mut station = DccStation::new(pin_a, pin_b, scheduler, timer.alarm(), config)?;
/// station.start()?;
/// timer.on_alarm(move || {
///     let _ = station.on_interrupt();
/// })?;
/// ```
pub struct Esp32SignalTimer<'d> {
    driver: TimerDriver<'d>,
    group: timer_group_t,
    index: timer_idx_t,
    tick_hz: u64,
}

impl<'d> Esp32SignalTimer<'d> {
    /// Takes a timer peripheral, leaving it stopped.
    ///
    /// # Errors
    ///
    /// Returns an error if the timer driver cannot be created.
    pub fn new<T: Timer>(timer: impl Peripheral<P = T> + 'd) -> Result<Self, EspError> {
        let driver = TimerDriver::new(timer, &Config::new().auto_reload(true))?;
        let tick_hz = driver.tick_hz();
        log::debug!("signal timer at {} Hz", tick_hz);
        Ok(Self {
            driver,
            group: T::group(),
            index: T::index(),
            tick_hz,
        })
    }

    /// Handle that arms, reloads, and disarms this timer.
    pub fn alarm(&self) -> Esp32Alarm {
        Esp32Alarm {
            group: self.group,
            index: self.index,
            tick_hz: self.tick_hz,
            armed: false,
        }
    }

    /// Registers the alarm callback. It runs in ISR context.
    ///
    /// An alarm that fired before registration is delivered as soon as the
    /// callback is in place.
    ///
    /// # Errors
    ///
    /// Returns an error if the interrupt cannot be registered.
    pub fn on_alarm<F>(&mut self, callback: F) -> Result<(), EspError>
    where
        F: FnMut() + Send + 'static,
    {
        // SAFETY: the callback is 'static and owns everything it touches
        unsafe { self.driver.subscribe(callback) }?;
        self.driver.enable_interrupt()
    }
}

/// Alarm side of an [`Esp32SignalTimer`].
///
/// The alarm value is the length of the next half-bit. Because the counter
/// restarts on every alarm, a [`reload`](SignalTimer::reload) made inside the
/// alarm interrupt applies to the half-bit that alarm started.
/// [`reload`](SignalTimer::reload) is safe to call from that interrupt;
/// [`arm`](SignalTimer::arm) and [`disarm`](SignalTimer::disarm) are not.
pub struct Esp32Alarm {
    group: timer_group_t,
    index: timer_idx_t,
    tick_hz: u64,
    armed: bool,
}

impl Esp32Alarm {
    #[inline]
    fn ticks(&self, period_us: u32) -> u64 {
        u64::from(period_us) * self.tick_hz / 1_000_000
    }
}

impl SignalTimer for Esp32Alarm {
    type Error = EspError;

    fn arm(&mut self, period_us: u32) -> Result<(), EspError> {
        let (group, index) = (self.group, self.index);
        // SAFETY: the timer was initialized by the owning Esp32SignalTimer
        unsafe {
            esp!(sys::timer_set_counter_value(group, index, 0))?;
            esp!(sys::timer_set_alarm_value(group, index, self.ticks(period_us)))?;
            esp!(sys::timer_set_alarm(group, index, sys::timer_alarm_t_TIMER_ALARM_EN))?;
            esp!(sys::timer_enable_intr(group, index))?;
            esp!(sys::timer_start(group, index))?;
        }
        self.armed = true;
        Ok(())
    }

    #[inline]
    fn reload(&mut self, period_us: u32) -> Result<(), EspError> {
        // SAFETY: register write only, valid in ISR context
        unsafe { sys::timer_group_set_alarm_value_in_isr(self.group, self.index, self.ticks(period_us)) };
        Ok(())
    }

    fn disarm(&mut self) -> Result<(), EspError> {
        self.armed = false;
        // SAFETY: the timer was initialized by the owning Esp32SignalTimer
        unsafe {
            esp!(sys::timer_pause(self.group, self.index))?;
            esp!(sys::timer_set_alarm(self.group, self.index, sys::timer_alarm_t_TIMER_ALARM_DIS))
        }
    }

    fn is_armed(&self) -> bool {
        self.armed
    }
}
