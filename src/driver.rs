//! Radio device controller.
//!
//! This module provides the [`Radio`] struct, which owns one ENER314-RT board:
//! the chip behind a [`Transceiver`], the reset and LED lines, and a delay
//! provider used for reset settling and inter-burst pauses.
//!
//! ## State machine
//!
//! ```text
//! Uninitialized --init--> Idle --enter_transmitter--> Transmitting
//!                          |   --enter_receiver-----> Receiving
//!                          |   --standby------------> Standby
//!   any live state --reset--> Idle
//!   any state --shutdown--> Shutdown (terminal)
//! ```
//!
//! Role-gated calls made in the wrong state fail with [`Error::State`].
//! Payloads and [`TransmitPlan`]s are validated before the first hardware call,
//! so an [`Error::Argument`] never leaves a partial side effect behind.
//!
//! ## Example
//!
//! ```rust
//! # use embedded_hal_mock::eh1::digital::{Mock as Pin, State, Transaction as PinTx};
//! # use embedded_hal_mock::eh1::spi::{Mock as Spi};
//! # use embedded_hal_mock::eh1::delay::NoopDelay;
//! use ener314::driver::{Radio, RadioState};
//! use ener314::gpio::GpioLines;
//! use ener314::rfm69::Rfm69;
//! use ener314::spi::SpiLink;
//! use ener314::RadioConfig;
//!
//! # let spi = Spi::<u8>::new(&[]);
//! # let cs = Pin::new(&[PinTx::set(State::High)]);
//! # let (reset, green, red) = (Pin::new(&[]), Pin::new(&[]), Pin::new(&[]));
//! let link = SpiLink::new(spi, cs).unwrap();
//! let lines = GpioLines::new(reset, green, red);
//! let chip = Rfm69::new(link, NoopDelay::new());
//! let radio = Radio::new(chip, lines, NoopDelay::new(), RadioConfig::default());
//! assert_eq!(radio.state(), RadioState::Uninitialized);
//! # let (chip, lines, _) = radio.release();
//! # let (link, _) = chip.release();
//! # let (mut spi, mut cs) = link.release();
//! # spi.done();
//! # cs.done();
//! # let (mut reset, mut green, mut red) = lines.release();
//! # reset.done();
//! # green.done();
//! # red.done();
//! ```

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use heapless::Vec;

use crate::config::RadioConfig;
use crate::consts::{DEFAULT_INNER_TIMES, DEFAULT_MODULATION, MAX_FRAME_LEN, MAX_RX_SIZE};
use crate::error::{ArgumentError, Error};
use crate::gpio::GpioLines;
use crate::transceiver::{Modulation, RxFraming, Transceiver};

/// Bytes returned by a single receive.
pub type ReceiveBuffer = Vec<u8, MAX_RX_SIZE>;

/// Lifecycle and role of the radio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum RadioState {
    /// Constructed, `init` not yet called.
    #[default]
    Uninitialized,
    /// Initialized, neither transmitting nor receiving.
    Idle,
    /// Transmitter role.
    Transmitting,
    /// Receiver role.
    Receiving,
    /// Low-power standby; no RF activity.
    Standby,
    /// Terminal state after `shutdown`.
    Shutdown,
}

impl RadioState {
    /// Whether the radio has been initialized and not shut down.
    pub fn is_live(self) -> bool {
        !matches!(self, RadioState::Uninitialized | RadioState::Shutdown)
    }
}

/// How a payload is repeated on air.
///
/// Each of the `outer_times` bursts hands the payload and `inner_times` to one
/// chip transmit instruction, which repeats it in hardware. The controller
/// waits `outer_delay_ms` after each burst when it is non-zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct TransmitPlan {
    /// Number of bursts issued by the controller, at least one.
    pub outer_times: u32,
    /// Hardware repeats within one burst, 1..=255.
    pub inner_times: u32,
    /// Pause after each burst, in milliseconds.
    pub outer_delay_ms: u32,
}

impl TransmitPlan {
    /// Creates a plan.
    pub const fn new(outer_times: u32, inner_times: u32, outer_delay_ms: u32) -> Self {
        Self {
            outer_times,
            inner_times,
            outer_delay_ms,
        }
    }

    /// Checks the plan against `payload` and returns the one-byte inner
    /// repeat count.
    pub fn validate(&self, payload: &[u8]) -> Result<u8, ArgumentError> {
        if payload.is_empty() || payload.len() > MAX_FRAME_LEN {
            return Err(ArgumentError::PayloadLength(payload.len()));
        }
        if self.outer_times < 1 {
            return Err(ArgumentError::OuterTimes(self.outer_times));
        }
        match u8::try_from(self.inner_times) {
            Ok(inner) if inner >= 1 => Ok(inner),
            _ => Err(ArgumentError::InnerTimes(self.inner_times)),
        }
    }
}

impl Default for TransmitPlan {
    fn default() -> Self {
        Self::new(1, DEFAULT_INNER_TIMES, 0)
    }
}

/// Controller for one ENER314-RT radio.
///
/// ## Type Parameters
///
/// - `T`: the chip implementation, see [`Transceiver`]
/// - `P`: output pin type for the reset and LED lines
/// - `D`: blocking delay provider
#[derive(Debug)]
pub struct Radio<T, P, D>
where
    T: Transceiver,
    P: OutputPin,
    D: DelayNs,
{
    pub(crate) transceiver: T,
    pub(crate) lines: GpioLines<P>,
    delay: D,
    config: RadioConfig,
    state: RadioState,
    modulation: Modulation,
}

impl<T, P, D> Radio<T, P, D>
where
    T: Transceiver,
    P: OutputPin,
    D: DelayNs,
{
    /// Takes ownership of the board. Nothing is driven until [`init`](Radio::init).
    pub fn new(transceiver: T, lines: GpioLines<P>, delay: D, config: RadioConfig) -> Self {
        Self {
            transceiver,
            lines,
            delay,
            config,
            state: RadioState::Uninitialized,
            modulation: DEFAULT_MODULATION,
        }
    }

    /// Current state.
    pub fn state(&self) -> RadioState {
        self.state
    }

    /// Current modulation.
    pub fn modulation(&self) -> Modulation {
        self.modulation
    }

    /// Controller configuration.
    pub fn config(&self) -> &RadioConfig {
        &self.config
    }

    /// The chip implementation.
    pub fn transceiver(&self) -> &T {
        &self.transceiver
    }

    /// Brings the board up: configures the lines, pulses reset, turns the LEDs
    /// off and initializes the chip. Leaves the radio `Idle` with
    /// [`DEFAULT_MODULATION`].
    ///
    /// Must be called exactly once; a second call fails with [`Error::State`].
    pub fn init(&mut self) -> Result<(), Error> {
        self.ensure("init", &[RadioState::Uninitialized])?;
        self.lines.configure_all();
        self.pulse_reset()?;
        self.lines.leds_off()?;
        self.transceiver.init()?;
        self.modulation = DEFAULT_MODULATION;
        self.transition(RadioState::Idle);
        info!("radio initialized");
        Ok(())
    }

    /// Forces the board into a known state.
    ///
    /// Drives reset high, waits the settle interval, drives it low, waits
    /// again, turns both LEDs off and reloads the chip configuration. Valid in
    /// any state except `Shutdown`; leaves the radio `Idle`.
    pub fn reset(&mut self) -> Result<(), Error> {
        if self.state == RadioState::Shutdown {
            return Err(self.rejected("reset"));
        }
        self.pulse_reset()?;
        self.lines.leds_off()?;
        self.transceiver.reset()?;
        self.transition(RadioState::Idle);
        Ok(())
    }

    /// Reads the hardware version. Valid when `Idle` or in `Standby`.
    pub fn version(&mut self) -> Result<u8, Error> {
        self.ensure("version", &[RadioState::Idle, RadioState::Standby])?;
        self.transceiver.version()
    }

    /// Switches modulation without changing role.
    ///
    /// `None` is rejected: this call never falls back to a default.
    pub fn set_modulation(&mut self, modulation: Option<Modulation>) -> Result<(), Error> {
        let modulation = modulation.ok_or(ArgumentError::ModulationUnspecified)?;
        self.ensure_live("set_modulation")?;
        self.transceiver.set_modulation(modulation)?;
        self.modulation = modulation;
        Ok(())
    }

    /// Enters the transmitter role, using [`DEFAULT_MODULATION`] when
    /// `modulation` is `None`.
    pub fn enter_transmitter(&mut self, modulation: Option<Modulation>) -> Result<(), Error> {
        let modulation = modulation.unwrap_or(DEFAULT_MODULATION);
        self.ensure_live("enter_transmitter")?;
        self.transceiver.transmitter(modulation)?;
        self.modulation = modulation;
        self.transition(RadioState::Transmitting);
        Ok(())
    }

    /// Enters the receiver role, using [`DEFAULT_MODULATION`] when
    /// `modulation` is `None`.
    pub fn enter_receiver(&mut self, modulation: Option<Modulation>) -> Result<(), Error> {
        let modulation = modulation.unwrap_or(DEFAULT_MODULATION);
        self.ensure_live("enter_receiver")?;
        self.transceiver.receiver(modulation)?;
        self.modulation = modulation;
        self.transition(RadioState::Receiving);
        Ok(())
    }

    /// Transmits `payload` according to `plan`.
    ///
    /// Issues exactly `plan.outer_times` chip transmit instructions, each
    /// carrying the whole payload and `plan.inner_times`. Requires the
    /// transmitter role.
    pub fn transmit(&mut self, payload: &[u8], plan: &TransmitPlan) -> Result<(), Error> {
        self.bursts("transmit", payload, plan, T::transmit)
    }

    /// Like [`transmit`](Radio::transmit), for tight repeated bursts: the chip
    /// frame setup is assumed to be in place already and no mode or role change
    /// happens around the call.
    pub fn send_payload(&mut self, payload: &[u8], plan: &TransmitPlan) -> Result<(), Error> {
        self.bursts("send_payload", payload, plan, T::send_payload)
    }

    /// Whether a complete payload is buffered. Non-blocking; requires the
    /// receiver role.
    pub fn is_receive_waiting(&mut self) -> Result<bool, Error> {
        self.ensure("is_receive_waiting", &[RadioState::Receiving])?;
        self.transceiver.is_receive_waiting()
    }

    /// Receives one payload.
    ///
    /// With `size` of `None` the request covers [`MAX_RX_SIZE`] bytes and the
    /// first byte received holds the count of the bytes after it; the returned
    /// buffer includes that length byte. With `Some(n)` exactly `n` bytes are
    /// read, `n` in 1..=66.
    ///
    /// A chip failure is returned as [`Error::Receive`] and leaves the radio in
    /// the receiver role, so the call can be retried.
    pub fn receive(&mut self, size: Option<usize>) -> Result<ReceiveBuffer, Error> {
        let (len, framing) = match size {
            None => (MAX_RX_SIZE, RxFraming::LengthPrefixed),
            Some(n) if (1..=MAX_RX_SIZE).contains(&n) => (n, RxFraming::Fixed),
            Some(n) => return Err(ArgumentError::ReceiveSize(n).into()),
        };
        self.ensure("receive", &[RadioState::Receiving])?;

        let mut buf = [0u8; MAX_RX_SIZE];
        let count = match self.transceiver.get_payload(&mut buf[..len], framing) {
            Ok(count) => count.min(len),
            Err(err) => {
                warn!("receive failed: {:?}", err);
                return Err(err);
            }
        };
        ReceiveBuffer::from_slice(&buf[..count]).map_err(|_| Error::Length(count))
    }

    /// Non-blocking receive: `WouldBlock` until a payload is waiting.
    ///
    /// ```rust,ignore
    /// let payload = nb::block!(radio.poll_receive(None))?;
    /// ```
    pub fn poll_receive(&mut self, size: Option<usize>) -> nb::Result<ReceiveBuffer, Error> {
        if !self.is_receive_waiting()? {
            return Err(nb::Error::WouldBlock);
        }
        self.receive(size).map_err(nb::Error::Other)
    }

    /// Puts the chip into low-power standby.
    pub fn standby(&mut self) -> Result<(), Error> {
        self.ensure_live("standby")?;
        self.transceiver.standby()?;
        self.transition(RadioState::Standby);
        Ok(())
    }

    /// Releases the chip's bus and moves to the terminal `Shutdown` state.
    ///
    /// Safe to call once from any state. The state changes even if the chip
    /// reports an error while being released.
    pub fn shutdown(&mut self) -> Result<(), Error> {
        if self.state == RadioState::Shutdown {
            return Err(self.rejected("shutdown"));
        }
        let released = self.transceiver.shutdown();
        self.transition(RadioState::Shutdown);
        released
    }

    /// Hands back the chip, lines and delay provider.
    pub fn release(self) -> (T, GpioLines<P>, D) {
        (self.transceiver, self.lines, self.delay)
    }

    fn bursts(
        &mut self,
        op: &'static str,
        payload: &[u8],
        plan: &TransmitPlan,
        burst: fn(&mut T, &[u8], u8) -> Result<(), Error>,
    ) -> Result<(), Error> {
        let inner = plan.validate(payload)?;
        self.ensure(op, &[RadioState::Transmitting])?;
        for n in 0..plan.outer_times {
            trace!("{} burst {} of {} bytes x{}", op, n, payload.len(), inner);
            burst(&mut self.transceiver, payload, inner)?;
            if plan.outer_delay_ms != 0 {
                self.delay.delay_ms(plan.outer_delay_ms);
            }
        }
        Ok(())
    }

    fn pulse_reset(&mut self) -> Result<(), Error> {
        let settle = self.config.reset_settle_ms;
        self.lines.reset.configure_output();
        self.lines.reset.set_high()?;
        self.delay.delay_ms(settle);
        self.lines.reset.set_low()?;
        self.delay.delay_ms(settle);
        Ok(())
    }

    fn transition(&mut self, next: RadioState) {
        if self.state != next {
            debug!("radio {:?} -> {:?}", self.state, next);
            self.state = next;
        }
    }

    pub(crate) fn ensure(&self, op: &'static str, allowed: &[RadioState]) -> Result<(), Error> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(self.rejected(op))
        }
    }

    pub(crate) fn ensure_live(&self, op: &'static str) -> Result<(), Error> {
        if self.state.is_live() {
            Ok(())
        } else {
            Err(self.rejected(op))
        }
    }

    pub(crate) fn rejected(&self, op: &'static str) -> Error {
        Error::State {
            op,
            state: self.state,
        }
    }
}
