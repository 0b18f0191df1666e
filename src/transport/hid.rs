//! USB-HID interface backend (64-byte reports).
//!
//! Report layout, transmit direction (`0x12`):
//!
//! ```text
//! dr sn ?? ty ?? ec ad oc .. .. ..
//! 12 xx 00 03 00 00 ff 08 00 00 00
//! ```
//!
//! `dr` direction, `sn` sequence number (wraps mod 256, starts at 1),
//! `ty` frame type (0x02 = 8 bit, 0x03 = 16 bit, 0x06 = 24 bit),
//! `ec`/`ad`/`oc` the payload bytes most-significant first.
//!
//! Receive direction (`0x11`) sets bit 0x70 in the type byte; type
//! `0x77` is a status report whose `oc` byte selects the fault class.

use crate::dali_log;
use crate::error::Result;
use crate::frame::{BusFault, FrameLength, RxEvent, TxFrame};
use crate::transport::{EventSource, FrameSink};
use embassy_time::{Duration, Timer};

/// HID report size used by the interface.
pub const REPORT_SIZE: usize = 64;

/// Settle time between the two transmissions of a send-twice frame.
///
/// The interface has no native double-send command, so the repeat happens
/// here and must respect the inter-frame gap the bus requires.
pub const SEND_TWICE_SETTLE: Duration = Duration::from_millis(14);

const DIRECTION_TO_BUS: u8 = 0x12;
const DIRECTION_FROM_BUS: u8 = 0x11;

const TYPE_8BIT: u8 = 0x02;
const TYPE_16BIT: u8 = 0x03;
const TYPE_24BIT: u8 = 0x06;
const TYPE_STATUS: u8 = 0x07;
const RECEIVE_MASK: u8 = 0x70;

const STATUS_FRAMING: u8 = 0x03;
const STATUS_RECOVERABLE: u8 = 0x04;

/// Output-report pump of a HID interface.
///
/// Physical USB I/O lives behind this trait; implementations wrap whatever
/// HID stack the platform provides.
#[allow(async_fn_in_trait)]
pub trait HidPortOut {
    /// Write one 64-byte output report.
    async fn write_report(&mut self, report: &[u8; REPORT_SIZE]) -> Result<()>;
}

/// Input-report pump of a HID interface.
#[allow(async_fn_in_trait)]
pub trait HidPortIn {
    /// Read one 64-byte input report.
    ///
    /// Returns `Ok(false)` when no report arrives within `timeout`.
    async fn read_report(
        &mut self,
        buf: &mut [u8; REPORT_SIZE],
        timeout: Duration,
    ) -> Result<bool>;
}

/// Encode a forward frame into a transmit report.
pub fn encode_report(sequence: u8, frame: &TxFrame) -> [u8; REPORT_SIZE] {
    let data = frame.data();
    let ty = match frame.length() {
        FrameLength::Backward => TYPE_8BIT,
        FrameLength::Gear => TYPE_16BIT,
        FrameLength::Device => TYPE_24BIT,
    };
    let mut report = [0u8; REPORT_SIZE];
    report[0] = DIRECTION_TO_BUS;
    report[1] = sequence;
    report[3] = ty;
    report[5] = (data >> 16) as u8;
    report[6] = (data >> 8) as u8;
    report[7] = data as u8;
    report
}

/// Decode one received report into a bus event.
///
/// Returns `None` for reports this master does not care about (unknown
/// types, its own transmit confirmations).
pub fn decode_report(report: &[u8]) -> Option<RxEvent> {
    if report.len() < 6 || report[0] != DIRECTION_FROM_BUS {
        return None;
    }
    let ec = u32::from(report[3]);
    let ad = u32::from(report[4]);
    let cmd = u32::from(report[5]);
    const RX_8BIT: u8 = RECEIVE_MASK | TYPE_8BIT;
    const RX_16BIT: u8 = RECEIVE_MASK | TYPE_16BIT;
    const RX_24BIT: u8 = RECEIVE_MASK | TYPE_24BIT;
    const RX_STATUS: u8 = RECEIVE_MASK | TYPE_STATUS;

    match report[1] {
        RX_8BIT => Some(RxEvent::Frame {
            length: FrameLength::Backward,
            data: cmd,
        }),
        RX_16BIT => Some(RxEvent::Frame {
            length: FrameLength::Gear,
            data: cmd | ad << 8,
        }),
        RX_24BIT => Some(RxEvent::Frame {
            length: FrameLength::Device,
            data: cmd | ad << 8 | ec << 16,
        }),
        RX_STATUS => {
            let fault = match report[5] {
                STATUS_RECOVERABLE => BusFault::Recoverable,
                STATUS_FRAMING => BusFault::Framing,
                _ => BusFault::General,
            };
            Some(RxEvent::Fault(fault))
        }
        _ => None,
    }
}

/// Transmit half of a USB-HID interface.
#[derive(Debug)]
pub struct HidSender<P: HidPortOut> {
    port: P,
    sequence: u8,
}

impl<P: HidPortOut> HidSender<P> {
    /// Wrap an output-report pump.
    pub fn new(port: P) -> Self {
        Self { port, sequence: 1 }
    }

    fn next_sequence(&mut self) -> u8 {
        let sn = self.sequence;
        self.sequence = self.sequence.wrapping_add(1);
        sn
    }
}

impl<P: HidPortOut> FrameSink for HidSender<P> {
    async fn send(&mut self, frame: &TxFrame) -> Result<()> {
        let mut repeats = if frame.is_send_twice() { 2 } else { 1 };
        loop {
            let sn = self.next_sequence();
            let report = encode_report(sn, frame);
            dali_log!(
                debug,
                "hid out: sn={} ty={} data=0x{:06x}",
                sn,
                report[3],
                frame.data()
            );
            self.port.write_report(&report).await?;
            repeats -= 1;
            if repeats == 0 {
                return Ok(());
            }
            Timer::after(SEND_TWICE_SETTLE).await;
        }
    }
}

/// Receive half of a USB-HID interface.
#[derive(Debug)]
pub struct HidReceiver<P: HidPortIn> {
    port: P,
}

impl<P: HidPortIn> HidReceiver<P> {
    /// Wrap an input-report pump.
    pub fn new(port: P) -> Self {
        Self { port }
    }
}

impl<P: HidPortIn> EventSource for HidReceiver<P> {
    async fn poll(&mut self, timeout: Duration) -> Result<Option<RxEvent>> {
        let mut buf = [0u8; REPORT_SIZE];
        if !self.port.read_report(&mut buf, timeout).await? {
            return Ok(None);
        }
        let event = decode_report(&buf);
        if event.is_none() {
            dali_log!(trace, "hid in: ignored report type 0x{:02x}", buf[1]);
        }
        Ok(event)
    }
}
