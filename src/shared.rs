//! Serialized access to one radio from several execution contexts.
//!
//! The controller itself is single-owner and `&mut self` throughout. When a
//! radio has to be reached from both the main loop and an interrupt handler,
//! put it in a [`SharedRadio`]: each call to [`with`](SharedRadio::with) runs one
//! complete operation inside a `critical_section`, so SPI select/deselect
//! brackets from different callers never interleave.
//!
//! # Example
//! ```rust,ignore
//! static RADIO: SharedRadio<Rfm69<Spi, CsPin, Delay>, LedPin, Delay> = SharedRadio::new();
//!
//! fn main() {
//!     RADIO.install(radio);
//!     RADIO.with(|radio| radio.enter_receiver(None)).unwrap();
//! }
//!
//! #[interrupt]
//! fn EXTI0() {
//!     let _ = RADIO.with(|radio| radio.receive(None));
//! }
//! ```

use core::cell::RefCell;
use core::fmt;

use critical_section::Mutex;
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;

use crate::driver::{Radio, RadioState};
use crate::error::Error;
use crate::transceiver::Transceiver;

/// A radio slot guarded by a `critical_section` mutex.
pub struct SharedRadio<T, P, D>
where
    T: Transceiver,
    P: OutputPin,
    D: DelayNs,
{
    slot: Mutex<RefCell<Option<Radio<T, P, D>>>>,
}

impl<T, P, D> SharedRadio<T, P, D>
where
    T: Transceiver,
    P: OutputPin,
    D: DelayNs,
{
    /// An empty slot, usable in a `static`.
    pub const fn new() -> Self {
        Self {
            slot: Mutex::new(RefCell::new(None)),
        }
    }

    /// Stores `radio`, returning the one previously installed.
    pub fn install(&self, radio: Radio<T, P, D>) -> Option<Radio<T, P, D>> {
        critical_section::with(|cs| self.slot.borrow(cs).replace(Some(radio)))
    }

    /// Removes and returns the installed radio.
    pub fn take(&self) -> Option<Radio<T, P, D>> {
        critical_section::with(|cs| self.slot.borrow(cs).take())
    }

    /// Whether a radio is installed.
    pub fn is_installed(&self) -> bool {
        critical_section::with(|cs| self.slot.borrow(cs).borrow().is_some())
    }

    /// Runs `f` on the installed radio inside a critical section.
    ///
    /// Fails with [`Error::State`] when the slot is empty.
    pub fn with<R>(
        &self,
        f: impl FnOnce(&mut Radio<T, P, D>) -> Result<R, Error>,
    ) -> Result<R, Error> {
        critical_section::with(|cs| match self.slot.borrow(cs).borrow_mut().as_mut() {
            Some(radio) => f(radio),
            None => Err(Error::State {
                op: "shared radio access",
                state: RadioState::Uninitialized,
            }),
        })
    }
}

impl<T, P, D> Default for SharedRadio<T, P, D>
where
    T: Transceiver,
    P: OutputPin,
    D: DelayNs,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T, P, D> fmt::Debug for SharedRadio<T, P, D>
where
    T: Transceiver,
    P: OutputPin,
    D: DelayNs,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedRadio")
            .field("installed", &self.is_installed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::tests::{TestRadio, finish, radio};
    use crate::testing::{Call, FakeTransceiver, RecordingDelay};
    use embedded_hal_mock::eh1::digital::Mock as PinMock;

    #[test]
    fn test_empty_slot_is_rejected() {
        let shared: SharedRadio<FakeTransceiver, PinMock, RecordingDelay> = SharedRadio::new();

        assert!(!shared.is_installed());
        assert!(matches!(
            shared.with(|radio| radio.version()),
            Err(Error::State {
                state: RadioState::Uninitialized,
                ..
            })
        ));
    }

    #[test]
    fn test_operations_run_on_installed_radio() {
        let shared = SharedRadio::new();
        assert!(shared.install(radio()).is_none());

        shared.with(|radio| radio.enter_receiver(None)).unwrap();
        assert!(!shared.with(|radio| radio.is_receive_waiting()).unwrap());
        assert_eq!(
            shared.with(|radio| Ok(radio.state())).unwrap(),
            RadioState::Receiving
        );

        let radio: TestRadio = shared.take().unwrap();
        assert!(!shared.is_installed());
        let (chip, _) = finish(radio);
        assert!(chip.calls.contains(&Call::IsReceiveWaiting));
    }
}
