//! Error types for the radio driver.
//!
//! Every fallible operation in the crate returns [`Error`]. Caller mistakes that
//! are caught before any hardware is touched are grouped under
//! [`ArgumentError`], so matching on `Error::Argument(_)` tells the caller that
//! no bus or pin activity took place.

use embedded_hal::{digital, spi};
use thiserror::Error;

use crate::driver::RadioState;

/// A caller-supplied value outside the driver contract.
///
/// Always detected before the first hardware call of the operation.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum ArgumentError {
    /// Payload length must be within 1..=255.
    #[error("frame len must be 1..255, got {0}")]
    PayloadLength(usize),
    /// `outer_times` must be at least one.
    #[error("outer_times must be >0, got {0}")]
    OuterTimes(u32),
    /// `inner_times` must be within 1..=255.
    #[error("inner_times must be 1..255, got {0}")]
    InnerTimes(u32),
    /// Neither OOK nor FSK was requested.
    #[error("must choose fsk or ook mode")]
    ModulationUnspecified,
    /// A wire code that is neither OOK (0) nor FSK (1).
    #[error("unknown modulation code {0}")]
    UnknownModulation(u8),
    /// A fixed-size receive must request 1..=66 bytes.
    #[error("receive size must be 1..66, got {0}")]
    ReceiveSize(usize),
}

/// Errors reported by the GPIO, SPI, chip and controller layers.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum Error {
    /// Invalid caller input; nothing was sent to the hardware.
    #[error(transparent)]
    Argument(#[from] ArgumentError),
    /// The operation is not valid in the radio's current state.
    #[error("{op} not permitted while {state:?}")]
    State {
        /// Name of the rejected operation.
        op: &'static str,
        /// State the radio was in.
        state: RadioState,
    },
    /// The chip reported a non-success status for a receive attempt.
    #[error("receive failed, error code {0}")]
    Receive(u8),
    /// A GPIO line id that is unknown or not configured for output.
    #[error("gpio {0} is not configured as an output line")]
    Configuration(u8),
    /// A frame longer than the one-byte length encoding allows.
    #[error("frame of {0} bytes exceeds the 255 byte limit")]
    Length(usize),
    /// The SPI link was used after `shutdown`.
    #[error("spi link already shut down")]
    BusClosed,
    /// A chip status wait ran out of polls.
    #[error("timed out waiting for {op}")]
    Timeout {
        /// Name of the condition being waited on.
        op: &'static str,
    },
    /// The SPI bus reported a fault.
    #[error("spi bus fault: {0:?}")]
    Spi(spi::ErrorKind),
    /// A GPIO pin reported a fault.
    #[error("gpio fault: {0:?}")]
    Pin(digital::ErrorKind),
}

impl Error {
    /// Returns `true` if retrying the operation (possibly after a reset) can succeed.
    ///
    /// Argument and configuration errors need a code change; everything else is
    /// a transient hardware condition.
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            Error::Argument(_) | Error::Configuration(_) | Error::BusClosed
        )
    }

    pub(crate) fn spi<E: spi::Error>(err: E) -> Self {
        Error::Spi(err.kind())
    }

    pub(crate) fn pin<E: digital::Error>(err: E) -> Self {
        Error::Pin(err.kind())
    }
}
