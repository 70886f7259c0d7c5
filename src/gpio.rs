//! GPIO line control for the ENER314-RT board.
//!
//! The board uses three plain output lines besides the SPI bus: the RFM69 reset
//! line and two status LEDs. Each line is wrapped in a [`Line`] that pairs the
//! `embedded-hal` pin with its fixed BCM number, and [`GpioLines`] addresses the
//! board's lines by [`GpioPin`] id.
//!
//! A line must be configured for output before it is driven; driving an
//! unconfigured or unknown line is reported as [`Error::Configuration`].

use embedded_hal::digital::OutputPin;

use crate::consts::{LED_GREEN_LINE, LED_RED_LINE, RESET_LINE, SPI_CE0_LINE};
use crate::error::Error;

/// Identifies a physical GPIO line by its BCM number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct GpioPin(pub u8);

impl GpioPin {
    /// RFM69 reset line.
    pub const RESET: GpioPin = GpioPin(RESET_LINE);
    /// Green status LED, used as the "radio busy" indicator.
    pub const LED_GREEN: GpioPin = GpioPin(LED_GREEN_LINE);
    /// Red status LED.
    pub const LED_RED: GpioPin = GpioPin(LED_RED_LINE);
    /// SPI chip enable 0.
    pub const SPI_CE0: GpioPin = GpioPin(SPI_CE0_LINE);

    /// The BCM line number.
    pub const fn id(self) -> u8 {
        self.0
    }
}

/// A single output line with a fixed identity.
#[derive(Debug)]
pub struct Line<P: OutputPin> {
    id: GpioPin,
    pin: P,
    output: bool,
}

impl<P: OutputPin> Line<P> {
    /// Wraps `pin` as line `id`. The line starts unconfigured.
    pub fn new(id: GpioPin, pin: P) -> Self {
        Self {
            id,
            pin,
            output: false,
        }
    }

    /// Identity of this line.
    pub fn id(&self) -> GpioPin {
        self.id
    }

    /// Whether [`configure_output`](Line::configure_output) has been called.
    pub fn is_output(&self) -> bool {
        self.output
    }

    /// Marks the line for output driving. Idempotent.
    pub fn configure_output(&mut self) {
        self.output = true;
    }

    /// Drives the line high.
    pub fn set_high(&mut self) -> Result<(), Error> {
        self.ensure_output()?;
        self.pin.set_high().map_err(Error::pin)
    }

    /// Drives the line low.
    pub fn set_low(&mut self) -> Result<(), Error> {
        self.ensure_output()?;
        self.pin.set_low().map_err(Error::pin)
    }

    /// Drives the line to `high`.
    pub fn write(&mut self, high: bool) -> Result<(), Error> {
        if high { self.set_high() } else { self.set_low() }
    }

    /// Returns the underlying pin.
    pub fn release(self) -> P {
        self.pin
    }

    fn ensure_output(&self) -> Result<(), Error> {
        if self.output {
            Ok(())
        } else {
            Err(Error::Configuration(self.id.id()))
        }
    }
}

/// The reset line and status LEDs of the board.
#[derive(Debug)]
pub struct GpioLines<P: OutputPin> {
    /// RFM69 reset line.
    pub reset: Line<P>,
    /// Green LED.
    pub led_green: Line<P>,
    /// Red LED.
    pub led_red: Line<P>,
}

impl<P: OutputPin> GpioLines<P> {
    /// Binds the three board lines to their fixed ids.
    pub fn new(reset: P, led_green: P, led_red: P) -> Self {
        Self {
            reset: Line::new(GpioPin::RESET, reset),
            led_green: Line::new(GpioPin::LED_GREEN, led_green),
            led_red: Line::new(GpioPin::LED_RED, led_red),
        }
    }

    /// Marks `pin` for output driving.
    pub fn configure_output(&mut self, pin: GpioPin) -> Result<(), Error> {
        self.line_mut(pin)?.configure_output();
        Ok(())
    }

    /// Drives `pin` high.
    pub fn set_high(&mut self, pin: GpioPin) -> Result<(), Error> {
        self.line_mut(pin)?.set_high()
    }

    /// Drives `pin` low.
    pub fn set_low(&mut self, pin: GpioPin) -> Result<(), Error> {
        self.line_mut(pin)?.set_low()
    }

    /// Configures every line for output.
    pub fn configure_all(&mut self) {
        self.reset.configure_output();
        self.led_green.configure_output();
        self.led_red.configure_output();
    }

    /// Puts both LEDs into the known off state.
    pub fn leds_off(&mut self) -> Result<(), Error> {
        self.led_red.configure_output();
        self.led_red.set_low()?;
        self.led_green.configure_output();
        self.led_green.set_low()
    }

    /// Returns the underlying pins as `(reset, led_green, led_red)`.
    pub fn release(self) -> (P, P, P) {
        (
            self.reset.release(),
            self.led_green.release(),
            self.led_red.release(),
        )
    }

    fn line_mut(&mut self, pin: GpioPin) -> Result<&mut Line<P>, Error> {
        match pin {
            GpioPin::RESET => Ok(&mut self.reset),
            GpioPin::LED_GREEN => Ok(&mut self.led_green),
            GpioPin::LED_RED => Ok(&mut self.led_red),
            GpioPin(other) => Err(Error::Configuration(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal_mock::eh1::digital::{
        Mock as PinMock, State as PinState, Transaction as PinTransaction,
    };

    #[test]
    fn test_unconfigured_line_is_rejected() {
        let mut line = Line::new(GpioPin::RESET, PinMock::new(&[]));

        assert_eq!(line.set_high(), Err(Error::Configuration(25)));
        assert!(!line.is_output());
        line.release().done();
    }

    #[test]
    fn test_configure_output_is_idempotent() {
        let mut line = Line::new(
            GpioPin::LED_RED,
            PinMock::new(&[
                PinTransaction::set(PinState::High),
                PinTransaction::set(PinState::Low),
            ]),
        );

        line.configure_output();
        line.configure_output();
        assert!(line.is_output());
        line.set_high().unwrap();
        line.write(false).unwrap();
        line.release().done();
    }

    #[test]
    fn test_lines_addressed_by_id() {
        let reset = PinMock::new(&[PinTransaction::set(PinState::High)]);
        let green = PinMock::new(&[PinTransaction::set(PinState::Low)]);
        let red = PinMock::new(&[]);
        let mut lines = GpioLines::new(reset, green, red);

        lines.configure_output(GpioPin::RESET).unwrap();
        lines.configure_output(GpioPin::LED_GREEN).unwrap();
        lines.set_high(GpioPin::RESET).unwrap();
        lines.set_low(GpioPin::LED_GREEN).unwrap();

        let (mut reset, mut green, mut red) = lines.release();
        reset.done();
        green.done();
        red.done();
    }

    #[test]
    fn test_unknown_pin_is_configuration_error() {
        let mut lines = GpioLines::new(PinMock::new(&[]), PinMock::new(&[]), PinMock::new(&[]));

        assert_eq!(
            lines.configure_output(GpioPin(4)),
            Err(Error::Configuration(4))
        );
        assert_eq!(
            lines.set_high(GpioPin::SPI_CE0),
            Err(Error::Configuration(8))
        );

        let (mut reset, mut green, mut red) = lines.release();
        reset.done();
        green.done();
        red.done();
    }

    #[test]
    fn test_leds_off_drives_both_low() {
        let reset = PinMock::new(&[]);
        let green = PinMock::new(&[PinTransaction::set(PinState::Low)]);
        let red = PinMock::new(&[PinTransaction::set(PinState::Low)]);
        let mut lines = GpioLines::new(reset, green, red);

        lines.leds_off().unwrap();
        assert!(lines.led_green.is_output());
        assert!(lines.led_red.is_output());

        let (mut reset, mut green, mut red) = lines.release();
        reset.done();
        green.done();
        red.done();
    }
}
