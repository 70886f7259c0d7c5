//! HopeRF RFM69 implementation of the [`Transceiver`] surface.
//!
//! The ENER314-RT carries an RFM69 on SPI CE0. Registers are accessed one
//! select bracket at a time:
//!
//! - write: `[addr | 0x80, value]`
//! - read: `[addr & 0x7F, dummy]`, the second byte clocks the value in
//! - FIFO: address byte followed by the whole frame under the same bracket
//!
//! Two register tables cover the board's use: FSK for OpenThings devices
//! (434.3 MHz, 4800 bps, sync `2D D4`, variable length) and OOK for legacy
//! switches (433.92 MHz, fixed length, no sync word). Switching modulation
//! reloads the whole table.
//!
//! Status waits poll every [`WAIT_POLL_INTERVAL_MS`] and give up with
//! [`Error::Timeout`] once the wait timeout has elapsed. A FIFO wait has to
//! cover the air time of a full FIFO, about 220 ms for 66 bytes of Manchester
//! FSK at 4800 bps.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiBus;

use crate::consts::{
    DEFAULT_MODULATION, DEFAULT_WAIT_TIMEOUT_MS, MAX_FRAME_LEN, MAX_RX_SIZE,
    WAIT_POLL_INTERVAL_MS, status,
};
use crate::error::Error;
use crate::spi::SpiLink;
use crate::transceiver::{Modulation, RxFraming, Transceiver};

pub(crate) const REG_FIFO: u8 = 0x00;
pub(crate) const REG_OPMODE: u8 = 0x01;
pub(crate) const REG_DATAMODUL: u8 = 0x02;
pub(crate) const REG_BITRATEMSB: u8 = 0x03;
pub(crate) const REG_BITRATELSB: u8 = 0x04;
pub(crate) const REG_FDEVMSB: u8 = 0x05;
pub(crate) const REG_FDEVLSB: u8 = 0x06;
pub(crate) const REG_FRMSB: u8 = 0x07;
pub(crate) const REG_FRMID: u8 = 0x08;
pub(crate) const REG_FRLSB: u8 = 0x09;
pub(crate) const REG_AFCCTRL: u8 = 0x0B;
pub(crate) const REG_VERSION: u8 = 0x10;
pub(crate) const REG_LNA: u8 = 0x18;
pub(crate) const REG_RXBW: u8 = 0x19;
pub(crate) const REG_IRQFLAGS1: u8 = 0x27;
pub(crate) const REG_IRQFLAGS2: u8 = 0x28;
pub(crate) const REG_SYNCCONFIG: u8 = 0x2E;
pub(crate) const REG_SYNCVALUE1: u8 = 0x2F;
pub(crate) const REG_SYNCVALUE2: u8 = 0x30;
pub(crate) const REG_PACKETCONFIG1: u8 = 0x37;
pub(crate) const REG_PAYLOADLEN: u8 = 0x38;
pub(crate) const REG_NODEADRS: u8 = 0x39;
pub(crate) const REG_FIFOTHRESH: u8 = 0x3C;

pub(crate) const MODE_STANDBY: u8 = 0x04;
pub(crate) const MODE_TRANSMITTER: u8 = 0x0C;
pub(crate) const MODE_RECEIVER: u8 = 0x10;

pub(crate) const IRQ1_MODEREADY: u8 = 0x80;
pub(crate) const IRQ2_FIFONOTEMPTY: u8 = 0x40;
pub(crate) const IRQ2_FIFOLEVEL: u8 = 0x20;
pub(crate) const IRQ2_PAYLOADREADY: u8 = 0x04;

const WRITE: u8 = 0x80;
const READ_MASK: u8 = 0x7F;

/// Largest variable-length packet the FSK receiver accepts.
pub(crate) const FSK_RX_LIMIT: u8 = MAX_RX_SIZE as u8;

pub(crate) const CONFIG_FSK: [(u8, u8); 18] = [
    (REG_DATAMODUL, 0x00),     // FSK, packet mode
    (REG_FDEVMSB, 0x01),       // 30 kHz deviation
    (REG_FDEVLSB, 0xEC),
    (REG_FRMSB, 0x6C),         // 434.3 MHz
    (REG_FRMID, 0x93),
    (REG_FRLSB, 0x33),
    (REG_AFCCTRL, 0x00),
    (REG_LNA, 0x00),
    (REG_RXBW, 0x43),
    (REG_BITRATEMSB, 0x1A),    // 4800 bps
    (REG_BITRATELSB, 0x0B),
    (REG_SYNCCONFIG, 0x88),    // 2 byte sync word
    (REG_SYNCVALUE1, 0x2D),
    (REG_SYNCVALUE2, 0xD4),
    (REG_PACKETCONFIG1, 0xA0), // variable length, manchester
    (REG_PAYLOADLEN, FSK_RX_LIMIT),
    (REG_NODEADRS, 0x06),
    (REG_FIFOTHRESH, 0x81),    // tx on fifo not empty
];

pub(crate) const CONFIG_OOK: [(u8, u8); 13] = [
    (REG_DATAMODUL, 0x08),     // OOK, packet mode
    (REG_FDEVMSB, 0x00),
    (REG_FDEVLSB, 0x00),
    (REG_FRMSB, 0x6C),         // 433.92 MHz
    (REG_FRMID, 0x7A),
    (REG_FRLSB, 0xE1),
    (REG_AFCCTRL, 0x00),
    (REG_RXBW, 0x41),
    (REG_BITRATEMSB, 0x1A),    // 4800 bps
    (REG_BITRATELSB, 0x0B),
    (REG_SYNCCONFIG, 0x00),    // no sync word
    (REG_PACKETCONFIG1, 0x00), // fixed length, no crc
    (REG_FIFOTHRESH, 0x81),
];

/// RFM69 chip driver over an [`SpiLink`].
///
/// `delay` paces the status polls; it is separate from the controller's
/// delay provider.
#[derive(Debug)]
pub struct Rfm69<BUS, CS, D>
where
    BUS: SpiBus,
    CS: OutputPin,
    D: DelayNs,
{
    spi: SpiLink<BUS, CS>,
    delay: D,
    modulation: Modulation,
    configured: bool,
    timeout_ms: u32,
}

impl<BUS, CS, D> Rfm69<BUS, CS, D>
where
    BUS: SpiBus,
    CS: OutputPin,
    D: DelayNs,
{
    /// Wraps `spi`. The chip is not touched until [`Transceiver::init`].
    pub fn new(spi: SpiLink<BUS, CS>, delay: D) -> Self {
        Self {
            spi,
            delay,
            modulation: DEFAULT_MODULATION,
            configured: false,
            timeout_ms: DEFAULT_WAIT_TIMEOUT_MS,
        }
    }

    /// Sets how long a status wait may take before it fails, in milliseconds.
    ///
    /// A timeout of zero checks the status once.
    pub fn with_timeout_ms(mut self, ms: u32) -> Self {
        self.timeout_ms = ms;
        self
    }

    /// The modulation whose register table is loaded.
    pub fn modulation(&self) -> Modulation {
        self.modulation
    }

    /// Returns the SPI link and the delay provider.
    pub fn release(self) -> (SpiLink<BUS, CS>, D) {
        (self.spi, self.delay)
    }

    pub(crate) fn write_register(&mut self, addr: u8, value: u8) -> Result<(), Error> {
        self.spi.framed(|spi| {
            let _ = spi.exchange_byte(addr | WRITE)?;
            let _ = spi.exchange_byte(value)?;
            Ok(())
        })
    }

    pub(crate) fn read_register(&mut self, addr: u8) -> Result<u8, Error> {
        self.spi.framed(|spi| {
            let _ = spi.exchange_byte(addr & READ_MASK)?;
            spi.exchange_byte(0)
        })
    }

    fn load_table(&mut self, table: &[(u8, u8)]) -> Result<(), Error> {
        for &(addr, value) in table {
            self.write_register(addr, value)?;
        }
        Ok(())
    }

    fn load_config(&mut self, modulation: Modulation) -> Result<(), Error> {
        debug!("rfm69 loading {:?} config", modulation);
        match modulation {
            Modulation::Fsk => self.load_table(&CONFIG_FSK)?,
            Modulation::Ook => self.load_table(&CONFIG_OOK)?,
        }
        self.modulation = modulation;
        self.configured = true;
        Ok(())
    }

    fn set_mode(&mut self, mode: u8) -> Result<(), Error> {
        self.write_register(REG_OPMODE, mode)?;
        self.wait_for(REG_IRQFLAGS1, IRQ1_MODEREADY, true, "mode ready")
    }

    /// Polls `reg` until the bits in `mask` are all set (or all clear), for
    /// at most the wait timeout.
    fn wait_for(&mut self, reg: u8, mask: u8, set: bool, op: &'static str) -> Result<(), Error> {
        let mut waited = 0;
        loop {
            let flags = self.read_register(reg)?;
            if (flags & mask == mask) == set {
                return Ok(());
            }
            if waited >= self.timeout_ms {
                warn!("rfm69 gave up waiting {} ms for {}", waited, op);
                return Err(Error::Timeout { op });
            }
            self.delay.delay_ms(WAIT_POLL_INTERVAL_MS);
            waited += WAIT_POLL_INTERVAL_MS;
        }
    }

    fn write_fifo(&mut self, payload: &[u8]) -> Result<(), Error> {
        self.spi.framed(|spi| {
            let _ = spi.exchange_byte(REG_FIFO | WRITE)?;
            let _ = spi.exchange_frame(payload)?;
            Ok(())
        })
    }

    fn read_fifo(&mut self, buf: &mut [u8], framing: RxFraming) -> Result<usize, Error> {
        let zeros = [0u8; MAX_FRAME_LEN];
        self.spi.framed(|spi| {
            let _ = spi.exchange_byte(REG_FIFO & READ_MASK)?;
            let (start, count) = match framing {
                RxFraming::Fixed if buf.len() > MAX_FRAME_LEN => {
                    return Err(Error::Length(buf.len()));
                }
                RxFraming::Fixed => (0, buf.len()),
                RxFraming::LengthPrefixed => {
                    let count = spi.exchange_byte(0)?;
                    if count as usize + 1 > buf.len() {
                        // clock the packet out so the next receive starts clean
                        let _ = spi.exchange_frame(&zeros[..count as usize])?;
                        return Err(Error::Receive(status::ERR_LONG_PAYLOAD));
                    }
                    buf[0] = count;
                    (1, count as usize)
                }
            };
            let rx = spi.exchange_frame(&zeros[..count])?;
            buf[start..start + count].copy_from_slice(&rx);
            Ok(start + count)
        })
    }
}

impl<BUS, CS, D> Transceiver for Rfm69<BUS, CS, D>
where
    BUS: SpiBus,
    CS: OutputPin,
    D: DelayNs,
{
    fn init(&mut self) -> Result<(), Error> {
        self.load_config(self.modulation)?;
        self.set_mode(MODE_STANDBY)
    }

    fn reset(&mut self) -> Result<(), Error> {
        // the reset pulse clears every register
        self.configured = false;
        self.init()
    }

    fn version(&mut self) -> Result<u8, Error> {
        let version = self.read_register(REG_VERSION)?;
        debug!("rfm69 version {}", version);
        Ok(version)
    }

    fn set_modulation(&mut self, modulation: Modulation) -> Result<(), Error> {
        if self.configured && self.modulation == modulation {
            return Ok(());
        }
        self.load_config(modulation)
    }

    fn transmitter(&mut self, modulation: Modulation) -> Result<(), Error> {
        self.set_modulation(modulation)?;
        self.set_mode(MODE_TRANSMITTER)
    }

    fn receiver(&mut self, modulation: Modulation) -> Result<(), Error> {
        self.set_modulation(modulation)?;
        if modulation == Modulation::Fsk {
            // transmit narrows the length register to the last packet sent
            self.write_register(REG_PAYLOADLEN, FSK_RX_LIMIT)?;
        }
        self.set_mode(MODE_RECEIVER)
    }

    fn transmit(&mut self, payload: &[u8], repeats: u8) -> Result<(), Error> {
        let len = u8::try_from(payload.len()).map_err(|_| Error::Length(payload.len()))?;
        self.write_register(REG_PAYLOADLEN, len)?;
        self.send_payload(payload, repeats)
    }

    fn send_payload(&mut self, payload: &[u8], repeats: u8) -> Result<(), Error> {
        for _ in 0..repeats {
            self.wait_for(REG_IRQFLAGS2, IRQ2_FIFOLEVEL, false, "fifo space")?;
            self.write_fifo(payload)?;
        }
        self.wait_for(REG_IRQFLAGS2, IRQ2_FIFONOTEMPTY, false, "fifo drain")
    }

    fn is_receive_waiting(&mut self) -> Result<bool, Error> {
        let flags = self.read_register(REG_IRQFLAGS2)?;
        Ok(flags & IRQ2_PAYLOADREADY != 0)
    }

    fn get_payload(&mut self, buf: &mut [u8], framing: RxFraming) -> Result<usize, Error> {
        if !self.is_receive_waiting()? {
            return Err(Error::Receive(status::ERR_NO_PAYLOAD));
        }
        self.read_fifo(buf, framing)
    }

    fn standby(&mut self) -> Result<(), Error> {
        self.set_mode(MODE_STANDBY)
    }

    fn shutdown(&mut self) -> Result<(), Error> {
        let parked = self.standby();
        self.spi.shutdown()?;
        parked
    }
}
