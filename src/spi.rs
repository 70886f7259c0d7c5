//! SPI transaction layer.
//!
//! [`SpiLink`] pairs an `embedded-hal` [`SpiBus`] with a software-driven chip
//! select [`Line`]. Chip select is explicit rather than toggled per byte: the
//! RFM69 expects a register address followed by one or more data bytes under a
//! single assertion, and deasserting in between would restart its internal
//! address pointer.
//!
//! Every multi-step exchange must be bracketed `select → … → deselect`. The
//! [`framed`](SpiLink::framed) helper does this and releases chip select on all
//! exit paths.
//!
//! Chip select is active low.

use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiBus;
use heapless::Vec;

use crate::consts::MAX_FRAME_LEN;
use crate::error::Error;
use crate::gpio::{GpioPin, Line};

/// Bytes returned by a full-duplex frame exchange.
pub type Frame = Vec<u8, MAX_FRAME_LEN>;

/// An SPI bus with an explicitly managed chip select line.
#[derive(Debug)]
pub struct SpiLink<BUS, CS>
where
    BUS: SpiBus,
    CS: OutputPin,
{
    bus: BUS,
    cs: Line<CS>,
    selected: bool,
    closed: bool,
}

impl<BUS, CS> SpiLink<BUS, CS>
where
    BUS: SpiBus,
    CS: OutputPin,
{
    /// Creates a link using CE0 as chip select and leaves the device deselected.
    pub fn new(bus: BUS, cs: CS) -> Result<Self, Error> {
        Self::with_chip_select(bus, Line::new(GpioPin::SPI_CE0, cs))
    }

    /// Creates a link with a caller-supplied chip select line.
    pub fn with_chip_select(bus: BUS, mut cs: Line<CS>) -> Result<Self, Error> {
        cs.configure_output();
        cs.set_high()?;
        Ok(Self {
            bus,
            cs,
            selected: false,
            closed: false,
        })
    }

    /// Whether chip select is currently asserted.
    pub fn is_selected(&self) -> bool {
        self.selected
    }

    /// Whether [`shutdown`](SpiLink::shutdown) has been called.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Asserts chip select.
    pub fn select(&mut self) -> Result<(), Error> {
        self.ensure_open()?;
        trace!("spi select");
        self.cs.set_low()?;
        self.selected = true;
        Ok(())
    }

    /// Flushes the bus and deasserts chip select.
    pub fn deselect(&mut self) -> Result<(), Error> {
        self.ensure_open()?;
        trace!("spi deselect");
        let flushed = self.bus.flush().map_err(Error::spi);
        self.cs.set_high()?;
        self.selected = false;
        flushed
    }

    /// Exchanges a single byte, returning the byte clocked in.
    pub fn exchange_byte(&mut self, tx: u8) -> Result<u8, Error> {
        self.ensure_open()?;
        let mut word = [tx];
        self.bus.transfer_in_place(&mut word).map_err(Error::spi)?;
        Ok(word[0])
    }

    /// Exchanges `tx.len()` bytes full-duplex, preserving order.
    ///
    /// Frames longer than 255 bytes are rejected before the bus is touched.
    pub fn exchange_frame(&mut self, tx: &[u8]) -> Result<Frame, Error> {
        if tx.len() > MAX_FRAME_LEN {
            return Err(Error::Length(tx.len()));
        }
        self.ensure_open()?;
        let mut rx = Frame::new();
        rx.resize(tx.len(), 0).map_err(|_| Error::Length(tx.len()))?;
        if !tx.is_empty() {
            trace!("spi frame of {} bytes", tx.len());
            self.bus.transfer(&mut rx, tx).map_err(Error::spi)?;
        }
        Ok(rx)
    }

    /// Runs `f` with chip select asserted, deasserting it afterwards even if
    /// `f` fails. An error from `f` takes precedence over a deselect error.
    pub fn framed<R>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<R, Error>,
    ) -> Result<R, Error> {
        self.select()?;
        let result = f(self);
        let released = self.deselect();
        let value = result?;
        released?;
        Ok(value)
    }

    /// Deasserts chip select and closes the link.
    ///
    /// May be called once; later calls on the link fail with
    /// [`Error::BusClosed`].
    pub fn shutdown(&mut self) -> Result<(), Error> {
        self.ensure_open()?;
        debug!("spi shutdown");
        if self.selected {
            self.deselect()?;
        }
        self.closed = true;
        Ok(())
    }

    /// Returns the bus and chip select pin.
    pub fn release(self) -> (BUS, CS) {
        (self.bus, self.cs.release())
    }

    fn ensure_open(&self) -> Result<(), Error> {
        if self.closed {
            Err(Error::BusClosed)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal_mock::eh1::digital::{
        Mock as PinMock, State as PinState, Transaction as PinTransaction,
    };
    use embedded_hal_mock::eh1::spi::{Mock as SpiMock, Transaction as SpiTransaction};

    fn done(link: SpiLink<SpiMock<u8>, PinMock>) {
        let (mut bus, mut cs) = link.release();
        bus.done();
        cs.done();
    }

    #[test]
    fn test_new_leaves_device_deselected() {
        let bus = SpiMock::new(&[]);
        let cs = PinMock::new(&[PinTransaction::set(PinState::High)]);

        let link = SpiLink::new(bus, cs).unwrap();
        assert!(!link.is_selected());
        done(link);
    }

    #[test]
    fn test_register_write_under_one_select() {
        let bus = SpiMock::new(&[
            SpiTransaction::transfer_in_place(vec![0x81], vec![0x00]),
            SpiTransaction::transfer_in_place(vec![0x04], vec![0x00]),
            SpiTransaction::flush(),
        ]);
        let cs = PinMock::new(&[
            PinTransaction::set(PinState::High),
            PinTransaction::set(PinState::Low),
            PinTransaction::set(PinState::High),
        ]);

        let mut link = SpiLink::new(bus, cs).unwrap();
        link.select().unwrap();
        assert!(link.is_selected());
        let _ = link.exchange_byte(0x81).unwrap();
        let _ = link.exchange_byte(0x04).unwrap();
        link.deselect().unwrap();
        assert!(!link.is_selected());
        done(link);
    }

    #[test]
    fn test_exchange_byte_returns_clocked_in_byte() {
        let bus = SpiMock::new(&[SpiTransaction::transfer_in_place(vec![0x10], vec![0x24])]);
        let cs = PinMock::new(&[PinTransaction::set(PinState::High)]);

        let mut link = SpiLink::new(bus, cs).unwrap();
        assert_eq!(link.exchange_byte(0x10).unwrap(), 0x24);
        done(link);
    }

    #[test]
    fn test_exchange_frame_preserves_order() {
        let bus = SpiMock::new(&[SpiTransaction::transfer(
            vec![0x01, 0x02, 0x03],
            vec![0xa1, 0xa2, 0xa3],
        )]);
        let cs = PinMock::new(&[PinTransaction::set(PinState::High)]);

        let mut link = SpiLink::new(bus, cs).unwrap();
        let rx = link.exchange_frame(&[0x01, 0x02, 0x03]).unwrap();
        assert_eq!(rx.as_slice(), &[0xa1, 0xa2, 0xa3]);
        done(link);
    }

    #[test]
    fn test_empty_frame_skips_bus() {
        let bus = SpiMock::new(&[]);
        let cs = PinMock::new(&[PinTransaction::set(PinState::High)]);

        let mut link = SpiLink::new(bus, cs).unwrap();
        assert!(link.exchange_frame(&[]).unwrap().is_empty());
        done(link);
    }

    #[test]
    fn test_full_length_frame_is_exchanged() {
        let tx: std::vec::Vec<u8> = (0..=254).collect();
        let rx: std::vec::Vec<u8> = tx.iter().rev().copied().collect();
        let bus = SpiMock::new(&[SpiTransaction::transfer(tx.clone(), rx.clone())]);
        let cs = PinMock::new(&[PinTransaction::set(PinState::High)]);

        let mut link = SpiLink::new(bus, cs).unwrap();
        let frame = link.exchange_frame(&tx).unwrap();
        assert_eq!(frame.len(), 255);
        assert_eq!(frame.as_slice(), rx.as_slice());
        done(link);
    }

    #[test]
    fn test_oversized_frame_is_length_error() {
        let bus = SpiMock::new(&[]);
        let cs = PinMock::new(&[PinTransaction::set(PinState::High)]);

        let mut link = SpiLink::new(bus, cs).unwrap();
        let tx = [0u8; 256];
        assert_eq!(link.exchange_frame(&tx), Err(Error::Length(256)));
        done(link);
    }

    #[test]
    fn test_framed_deselects_on_error() {
        let bus = SpiMock::new(&[SpiTransaction::flush()]);
        let cs = PinMock::new(&[
            PinTransaction::set(PinState::High),
            PinTransaction::set(PinState::Low),
            PinTransaction::set(PinState::High),
        ]);

        let mut link = SpiLink::new(bus, cs).unwrap();
        let result: Result<(), Error> = link.framed(|_| Err(Error::Receive(0x82)));
        assert_eq!(result, Err(Error::Receive(0x82)));
        assert!(!link.is_selected());
        done(link);
    }

    #[test]
    fn test_shutdown_closes_link() {
        let bus = SpiMock::new(&[]);
        let cs = PinMock::new(&[PinTransaction::set(PinState::High)]);

        let mut link = SpiLink::new(bus, cs).unwrap();
        link.shutdown().unwrap();
        assert!(link.is_closed());
        assert_eq!(link.shutdown(), Err(Error::BusClosed));
        assert_eq!(link.select(), Err(Error::BusClosed));
        assert_eq!(link.exchange_byte(0), Err(Error::BusClosed));
        done(link);
    }
}
