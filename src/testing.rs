//! Recording fakes shared by the controller tests.

use embedded_hal::delay::DelayNs;

use crate::consts::status;
use crate::error::Error;
use crate::transceiver::{Modulation, RxFraming, Transceiver};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    Init,
    Reset,
    Version,
    SetModulation(Modulation),
    Transmitter(Modulation),
    Receiver(Modulation),
    Transmit(Vec<u8>, u8),
    SendPayload(Vec<u8>, u8),
    IsReceiveWaiting,
    GetPayload(usize, RxFraming),
    Standby,
    Shutdown,
}

/// A transceiver that records every call and serves one queued payload.
#[derive(Debug)]
pub(crate) struct FakeTransceiver {
    pub(crate) calls: Vec<Call>,
    pub(crate) version: u8,
    pub(crate) waiting: bool,
    pub(crate) rx_data: Vec<u8>,
    pub(crate) rx_status: u8,
}

impl FakeTransceiver {
    pub(crate) fn new() -> Self {
        Self {
            calls: Vec::new(),
            version: 0x24,
            waiting: false,
            rx_data: Vec::new(),
            rx_status: status::OK,
        }
    }

    /// Makes `data` available to the next receive.
    pub(crate) fn deliver(&mut self, data: &[u8]) {
        self.rx_data = data.to_vec();
        self.waiting = true;
    }

    /// Calls made after bring-up.
    pub(crate) fn calls_after_init(&self) -> &[Call] {
        match self.calls.iter().position(|c| *c == Call::Init) {
            Some(i) => &self.calls[i + 1..],
            None => &self.calls,
        }
    }
}

impl Transceiver for FakeTransceiver {
    fn init(&mut self) -> Result<(), Error> {
        self.calls.push(Call::Init);
        Ok(())
    }

    fn reset(&mut self) -> Result<(), Error> {
        self.calls.push(Call::Reset);
        Ok(())
    }

    fn version(&mut self) -> Result<u8, Error> {
        self.calls.push(Call::Version);
        Ok(self.version)
    }

    fn set_modulation(&mut self, modulation: Modulation) -> Result<(), Error> {
        self.calls.push(Call::SetModulation(modulation));
        Ok(())
    }

    fn transmitter(&mut self, modulation: Modulation) -> Result<(), Error> {
        self.calls.push(Call::Transmitter(modulation));
        Ok(())
    }

    fn receiver(&mut self, modulation: Modulation) -> Result<(), Error> {
        self.calls.push(Call::Receiver(modulation));
        Ok(())
    }

    fn transmit(&mut self, payload: &[u8], repeats: u8) -> Result<(), Error> {
        self.calls.push(Call::Transmit(payload.to_vec(), repeats));
        Ok(())
    }

    fn send_payload(&mut self, payload: &[u8], repeats: u8) -> Result<(), Error> {
        self.calls.push(Call::SendPayload(payload.to_vec(), repeats));
        Ok(())
    }

    fn is_receive_waiting(&mut self) -> Result<bool, Error> {
        self.calls.push(Call::IsReceiveWaiting);
        Ok(self.waiting)
    }

    fn get_payload(&mut self, buf: &mut [u8], framing: RxFraming) -> Result<usize, Error> {
        self.calls.push(Call::GetPayload(buf.len(), framing));
        if self.rx_status != status::OK {
            return Err(Error::Receive(self.rx_status));
        }
        if !self.waiting {
            return Err(Error::Receive(status::ERR_NO_PAYLOAD));
        }
        let count = match framing {
            RxFraming::LengthPrefixed => self.rx_data.len().min(buf.len()),
            RxFraming::Fixed => buf.len(),
        };
        for (i, slot) in buf[..count].iter_mut().enumerate() {
            *slot = self.rx_data.get(i).copied().unwrap_or(0);
        }
        self.waiting = false;
        Ok(count)
    }

    fn standby(&mut self) -> Result<(), Error> {
        self.calls.push(Call::Standby);
        Ok(())
    }

    fn shutdown(&mut self) -> Result<(), Error> {
        self.calls.push(Call::Shutdown);
        Ok(())
    }
}

/// A delay provider that records requested waits in milliseconds.
#[derive(Debug, Default)]
pub(crate) struct RecordingDelay {
    pub(crate) waits_ms: Vec<u32>,
}

impl DelayNs for RecordingDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.waits_ms.push(ns / 1_000_000);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.waits_ms.push(ms);
    }
}
