//! GPIO track output for ESP32.

use crate::traits::TrackPin;
use embedded_hal::digital::{self, ErrorKind, ErrorType, OutputPin as HalOutputPin};
use esp_idf_hal::gpio::{Output, OutputPin, PinDriver};
use esp_idf_hal::peripheral::Peripheral;
use esp_idf_hal::sys::EspError;

/// GPIO write failure.
#[derive(Debug)]
pub struct Esp32PinError(pub EspError);

impl digital::Error for Esp32PinError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

/// One rail of the DCC output on an ESP32 GPIO.
///
/// # Example
///
/// ```ignore
/// use rs_dcc::hal::esp32::Esp32TrackPin;
///
/// let peripherals = Peripherals::take()?;
/// let pin_a = Esp32TrackPin::new(peripherals.pins.gpio2)?;
/// let pin_b = Esp32TrackPin::new(peripherals.pins.gpio3)?;
/// ```
pub struct Esp32TrackPin<'d, P: OutputPin> {
    driver: PinDriver<'d, P, Output>,
}

impl<'d, P: OutputPin> Esp32TrackPin<'d, P> {
    /// Configures `pin` as a push-pull output, driven low.
    ///
    /// # Errors
    ///
    /// Returns an error if the GPIO cannot be configured as an output.
    pub fn new(pin: impl Peripheral<P = P> + 'd) -> Result<Self, EspError> {
        let mut driver = PinDriver::output(pin)?;
        driver.set_low()?;
        Ok(Self { driver })
    }
}

impl<P: OutputPin> ErrorType for Esp32TrackPin<'_, P> {
    type Error = Esp32PinError;
}

impl<P: OutputPin> HalOutputPin for Esp32TrackPin<'_, P> {
    #[inline]
    fn set_low(&mut self) -> Result<(), Esp32PinError> {
        self.driver.set_low().map_err(Esp32PinError)
    }

    #[inline]
    fn set_high(&mut self) -> Result<(), Esp32PinError> {
        self.driver.set_high().map_err(Esp32PinError)
    }
}

impl<P: OutputPin> TrackPin for Esp32TrackPin<'_, P> {
    fn pin_id(&self) -> u8 {
        self.driver.pin() as u8
    }
}
