//! Transaction bracket: "radio busy" LED signaling.
//!
//! The green LED is lit for the duration of one logical send or receive
//! sequence, which may span several bursts or polls. The LED is always turned
//! off again when the bracket closes, including when the bracketed operation
//! fails.

use core::ops::{Deref, DerefMut};

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;

use crate::driver::{Radio, RadioState};
use crate::error::Error;
use crate::transceiver::Transceiver;

impl<T, P, D> Radio<T, P, D>
where
    T: Transceiver,
    P: OutputPin,
    D: DelayNs,
{
    /// Lights the busy LED.
    pub fn begin_transaction(&mut self) -> Result<(), Error> {
        if self.state() == RadioState::Shutdown {
            return Err(self.rejected("begin_transaction"));
        }
        self.lines.led_green.configure_output();
        self.lines.led_green.set_high()
    }

    /// Turns the busy LED off.
    pub fn end_transaction(&mut self) -> Result<(), Error> {
        self.lines.led_green.configure_output();
        self.lines.led_green.set_low()
    }

    /// Opens a bracket that closes when the returned guard is dropped.
    pub fn transaction(&mut self) -> Result<Transaction<'_, T, P, D>, Error> {
        self.begin_transaction()?;
        Ok(Transaction { radio: self })
    }

    /// Runs `f` inside a bracket.
    ///
    /// The LED is turned off on every exit path; an error from `f` is reported
    /// in preference to one from turning the LED off.
    pub fn with_transaction<R>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<R, Error>,
    ) -> Result<R, Error> {
        self.begin_transaction()?;
        let result = f(self);
        let ended = self.end_transaction();
        let value = result?;
        ended?;
        Ok(value)
    }
}

/// An open transaction bracket. Derefs to the radio; closes on drop.
#[derive(Debug)]
pub struct Transaction<'a, T, P, D>
where
    T: Transceiver,
    P: OutputPin,
    D: DelayNs,
{
    radio: &'a mut Radio<T, P, D>,
}

impl<T, P, D> Transaction<'_, T, P, D>
where
    T: Transceiver,
    P: OutputPin,
    D: DelayNs,
{
    /// Closes the bracket, reporting a failure to turn the LED off.
    pub fn finish(self) -> Result<(), Error> {
        let mut this = core::mem::ManuallyDrop::new(self);
        this.radio.end_transaction()
    }
}

impl<T, P, D> Deref for Transaction<'_, T, P, D>
where
    T: Transceiver,
    P: OutputPin,
    D: DelayNs,
{
    type Target = Radio<T, P, D>;

    fn deref(&self) -> &Self::Target {
        self.radio
    }
}

impl<T, P, D> DerefMut for Transaction<'_, T, P, D>
where
    T: Transceiver,
    P: OutputPin,
    D: DelayNs,
{
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.radio
    }
}

impl<T, P, D> Drop for Transaction<'_, T, P, D>
where
    T: Transceiver,
    P: OutputPin,
    D: DelayNs,
{
    fn drop(&mut self) {
        if self.radio.end_transaction().is_err() {
            warn!("busy led could not be turned off");
        }
    }
}
