//! Raw register passthrough. Requires the `experimental` feature.
//!
//! These calls bypass the controller's state machine and talk to the chip
//! directly over SPI. They exist for bring-up and debugging of new register
//! tables and are not covered by the controller's guarantees: writing
//! `REG_OPMODE` here, for example, will not be reflected in
//! [`Radio::state`](crate::driver::Radio::state).

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiBus;

use crate::driver::Radio;
use crate::error::Error;
use crate::rfm69::Rfm69;
use crate::transceiver::Transceiver;

/// Direct register access.
pub trait RegisterAccess {
    /// Reads one register.
    fn read_register(&mut self, addr: u8) -> Result<u8, Error>;

    /// Writes one register.
    fn write_register(&mut self, addr: u8, value: u8) -> Result<(), Error>;

    /// Reads `buf.len()` consecutive registers starting at `first`.
    fn read_registers(&mut self, first: u8, buf: &mut [u8]) -> Result<(), Error> {
        for (offset, slot) in buf.iter_mut().enumerate() {
            *slot = self.read_register(first.wrapping_add(offset as u8))?;
        }
        Ok(())
    }
}

impl<BUS, CS, D> RegisterAccess for Rfm69<BUS, CS, D>
where
    BUS: SpiBus,
    CS: OutputPin,
    D: DelayNs,
{
    fn read_register(&mut self, addr: u8) -> Result<u8, Error> {
        Rfm69::read_register(self, addr)
    }

    fn write_register(&mut self, addr: u8, value: u8) -> Result<(), Error> {
        Rfm69::write_register(self, addr, value)
    }
}

impl<T, P, D> Radio<T, P, D>
where
    T: Transceiver,
    P: OutputPin,
    D: DelayNs,
{
    /// Mutable access to the chip, bypassing the controller.
    pub fn transceiver_mut(&mut self) -> &mut T {
        &mut self.transceiver
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rfm69::tests::{Expect, done};
    use crate::rfm69::{REG_NODEADRS, REG_VERSION};

    #[test]
    fn test_register_passthrough() {
        let mut chip = Expect::new()
            .write(REG_NODEADRS, 0x07)
            .read(REG_NODEADRS, 0x07)
            .build();

        RegisterAccess::write_register(&mut chip, REG_NODEADRS, 0x07).unwrap();
        assert_eq!(RegisterAccess::read_register(&mut chip, REG_NODEADRS).unwrap(), 0x07);
        done(chip);
    }

    #[test]
    fn test_read_consecutive_registers() {
        let mut chip = Expect::new()
            .read(REG_VERSION, 0x24)
            .read(REG_VERSION + 1, 0x9f)
            .read(REG_VERSION + 2, 0x09)
            .build();

        let mut buf = [0u8; 3];
        chip.read_registers(REG_VERSION, &mut buf).unwrap();
        assert_eq!(buf, [0x24, 0x9f, 0x09]);
        done(chip);
    }
}
