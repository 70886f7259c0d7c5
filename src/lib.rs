//! # ener314
//!
//! A portable, no_std Rust driver for the Energenie ENER314-RT radio board, a
//! HopeRF RFM69 sub-GHz transceiver used for OOK and FSK home-automation links.
//!
//! The crate is layered leaf-first:
//! - [`gpio`]: reset line and status LEDs, addressed by fixed BCM line ids
//! - [`spi`]: chip-select framing, byte and frame exchange over `embedded-hal`
//! - [`transceiver`]: the chip primitive surface, implemented by [`rfm69`]
//! - [`driver`]: the [`Radio`] controller (modulation, roles, repeated bursts,
//!   bounded receive)
//! - [`bracket`]: "radio busy" LED around a send or receive sequence
//!
//! ## Crate features
//! | Feature            | Description |
//! |--------------------|-------------|
//! | `std`              | Disables `#![no_std]` |
//! | `shared` (default) | [`shared::SharedRadio`], a `critical_section` guarded slot |
//! | `experimental`     | Raw register passthrough in [`experimental`] |
//! | `log`              | Uses `log` logging |
//! | `defmt-0-3`        | Uses `defmt` logging |
//!
//! ## Usage
//!
//! ```rust,ignore
//! use ener314::{Radio, RadioConfig, TransmitPlan};
//! use ener314::gpio::GpioLines;
//! use ener314::rfm69::Rfm69;
//! use ener314::spi::SpiLink;
//!
//! let link = SpiLink::new(spi_bus, ce0)?;
//! let lines = GpioLines::new(reset, led_green, led_red);
//! let chip = Rfm69::new(link, chip_delay);
//! let mut radio = Radio::new(chip, lines, delay, RadioConfig::default());
//!
//! radio.init()?;
//! radio.enter_transmitter(Some(Modulation::Ook))?;
//! radio.with_transaction(|radio| radio.transmit(&payload, &TransmitPlan::new(1, 8, 0)))?;
//!
//! radio.enter_receiver(None)?;
//! if radio.is_receive_waiting()? {
//!     let bytes = radio.receive(None)?;
//! }
//! radio.shutdown()?;
//! ```
//!
//! ## Integration Notes
//!
//! - All calls block until the hardware operation completes
//! - Only one `Radio` should own the board; use [`shared`] to reach it from an ISR
//! - Payload encoding (OpenThings) is left to the application

#![deny(
    bad_style,
    dead_code,
    improper_ctypes,
    non_shorthand_field_patterns,
    no_mangle_generic_items,
    overflowing_literals,
    path_statements,
    patterns_in_fns_without_body,
    unconditional_recursion,
    unused,
    while_true,
    missing_debug_implementations,
    missing_docs,
    trivial_casts,
    trivial_numeric_casts,
    unused_extern_crates,
    unused_import_braces,
    unused_qualifications,
    unused_results
)]
#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "shared")]
pub use critical_section;

pub use heapless;

#[macro_use]
mod fmt;

pub mod bracket;
pub mod config;
pub mod consts;
pub mod driver;
pub mod error;
#[cfg(feature = "experimental")]
pub mod experimental;
pub mod gpio;
pub mod rfm69;
#[cfg(feature = "shared")]
pub mod shared;
pub mod spi;
pub mod transceiver;

#[cfg(test)]
pub(crate) mod testing;

pub use config::RadioConfig;
pub use driver::{Radio, RadioState, ReceiveBuffer, TransmitPlan};
pub use error::{ArgumentError, Error};
pub use transceiver::{Modulation, RxFraming, Transceiver};
