//! The transceiver primitive surface.
//!
//! [`Transceiver`] is the set of chip-level operations the
//! [`Radio`](crate::driver::Radio) controller is built on. Implementations do
//! the register programming; the controller owns validation, role tracking,
//! outer repeats and LED signaling. [`Rfm69`](crate::rfm69::Rfm69) is the
//! implementation for the ENER314-RT board.

use crate::consts::{MODULATION_FSK, MODULATION_OOK};
use crate::error::{ArgumentError, Error};

/// Radio modulation scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum Modulation {
    /// On-Off Keying.
    Ook,
    /// Frequency-Shift Keying.
    Fsk,
}

impl Modulation {
    /// The wire code: 0 for OOK, 1 for FSK.
    pub const fn code(self) -> u8 {
        match self {
            Modulation::Ook => MODULATION_OOK,
            Modulation::Fsk => MODULATION_FSK,
        }
    }
}

impl TryFrom<u8> for Modulation {
    type Error = ArgumentError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            MODULATION_OOK => Ok(Modulation::Ook),
            MODULATION_FSK => Ok(Modulation::Fsk),
            other => Err(ArgumentError::UnknownModulation(other)),
        }
    }
}

/// How a receive determines the number of bytes to fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum RxFraming {
    /// The first byte holds the count of the bytes that follow it.
    LengthPrefixed,
    /// Exactly `buf.len()` bytes are fetched.
    Fixed,
}

/// Chip-level radio operations.
///
/// Repeat counts and frame lengths are one byte each; callers validate them
/// before reaching this layer.
pub trait Transceiver {
    /// Brings the chip up after power-on.
    fn init(&mut self) -> Result<(), Error>;

    /// Restores the chip configuration after a hardware reset pulse.
    fn reset(&mut self) -> Result<(), Error>;

    /// Reads the hardware version identifier.
    fn version(&mut self) -> Result<u8, Error>;

    /// Switches modulation without changing the operating mode.
    fn set_modulation(&mut self, modulation: Modulation) -> Result<(), Error>;

    /// Enters transmit mode using `modulation`.
    fn transmitter(&mut self, modulation: Modulation) -> Result<(), Error>;

    /// Enters receive mode using `modulation`.
    fn receiver(&mut self, modulation: Modulation) -> Result<(), Error>;

    /// Configures the frame for `payload` and sends it `repeats` times in one
    /// burst.
    fn transmit(&mut self, payload: &[u8], repeats: u8) -> Result<(), Error>;

    /// Sends `payload` `repeats` times, assuming the chip is already set up for it.
    fn send_payload(&mut self, payload: &[u8], repeats: u8) -> Result<(), Error>;

    /// Whether a complete payload is waiting in the receive FIFO.
    fn is_receive_waiting(&mut self) -> Result<bool, Error>;

    /// Moves a received payload into `buf`, returning the number of bytes written.
    ///
    /// A non-success chip status is reported as [`Error::Receive`].
    fn get_payload(&mut self, buf: &mut [u8], framing: RxFraming) -> Result<usize, Error>;

    /// Enters low-power standby.
    fn standby(&mut self) -> Result<(), Error>;

    /// Releases the underlying bus.
    fn shutdown(&mut self) -> Result<(), Error>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modulation_codes() {
        assert_eq!(Modulation::Ook.code(), 0);
        assert_eq!(Modulation::Fsk.code(), 1);
        assert_eq!(Modulation::try_from(0), Ok(Modulation::Ook));
        assert_eq!(Modulation::try_from(1), Ok(Modulation::Fsk));
        assert_eq!(
            Modulation::try_from(2),
            Err(ArgumentError::UnknownModulation(2))
        );
    }
}
