//! Constants shared across the ENER314-RT driver.
//!
//! These values are part of the external contract of the board: GPIO line
//! numbers (BCM numbering), the size of one receive FIFO load, the on-wire
//! modulation codes and the receive status codes reported by the chip layer.
//!
//! ## Key Concepts
//!
//! - **Lines**: fixed BCM numbers for reset, the two status LEDs and chip select.
//! - **Receive size**: one FIFO worth of data, including the leading length byte
//!   used by OpenThings framing.
//! - **Repeat counts and frame lengths**: carried in one byte by the chip layer,
//!   so both are capped at [`MAX_FRAME_LEN`].

use crate::transceiver::Modulation;

/// BCM line wired to the RFM69 reset pin.
pub const RESET_LINE: u8 = 25;

/// BCM line driving the green status LED (not available on B rev1 boards).
///
/// Used as the "radio busy" indicator by the transaction bracket.
pub const LED_GREEN_LINE: u8 = 27;

/// BCM line driving the red status LED.
pub const LED_RED_LINE: u8 = 22;

/// BCM line used as SPI chip enable 0.
pub const SPI_CE0_LINE: u8 = 8;

/// Maximum number of bytes a single receive may return.
///
/// The receiver only takes one FIFO worth of data, including the length byte
/// at the start of a length-prefixed message.
pub const MAX_RX_SIZE: usize = 66;

/// Largest frame, payload or repeat count that fits the one-byte encoding used
/// by the chip layer.
pub const MAX_FRAME_LEN: usize = 255;

/// Wire code for On-Off Keying.
pub const MODULATION_OOK: u8 = 0;

/// Wire code for Frequency-Shift Keying.
pub const MODULATION_FSK: u8 = 1;

/// Modulation applied by role switches when the caller does not name one.
pub const DEFAULT_MODULATION: Modulation = Modulation::Fsk;

/// Default hardware repeat count for a single burst.
pub const DEFAULT_INNER_TIMES: u32 = 8;

/// Default time the reset line is held at each level, in milliseconds.
pub const DEFAULT_RESET_SETTLE_MS: u32 = 100;

/// Default time a chip status wait may take, in milliseconds.
///
/// Long enough for a full FIFO to drain at the slowest configured bit rate.
pub const DEFAULT_WAIT_TIMEOUT_MS: u32 = 1_000;

/// Pause between two reads of a chip status register, in milliseconds.
pub const WAIT_POLL_INTERVAL_MS: u32 = 1;

/// Receive status codes reported by the chip layer.
pub mod status {
    /// The payload was fetched successfully.
    pub const OK: u8 = 0x00;
    /// The length byte announced more data than the request can hold.
    pub const ERR_LONG_PAYLOAD: u8 = 0x81;
    /// No complete payload was waiting in the FIFO.
    pub const ERR_NO_PAYLOAD: u8 = 0x82;
}
