//! Serial-line interface backend (ASCII protocol).
//!
//! Inbound traffic is newline-terminated records framed by `{`...`}`:
//!
//! ```text
//! {0000a3c1>10 0000ff90}
//!  \______/|\/ \______/
//!   time   |len  data     time: milliseconds, 8 hex digits
//!          marker          marker: '>' loopback, ':' direct
//! ```
//!
//! Outbound commands are ASCII lines: `S<priority> <lenHex> <dataHex>\r`
//! for a single transmission, with length and data joined by `+` instead of
//! a space when the interface shall transmit the frame twice.

use crate::dali_log;
use crate::error::Result;
use crate::frame::{BusFault, FrameLength, RxEvent, TxFrame};
use crate::transport::{EventSource, FrameSink};
use embassy_time::Duration;

/// Longest inbound line the receiver will buffer.
pub const LINE_MAX: usize = 80;

/// Capacity for an outbound command line.
pub type CommandLine = heapless::String<16>;

/// Transmit pump of a serial interface.
#[allow(async_fn_in_trait)]
pub trait SerialPortOut {
    /// Write one complete command line (terminator included).
    async fn write_line(&mut self, line: &str) -> Result<()>;
}

/// Receive pump of a serial interface.
#[allow(async_fn_in_trait)]
pub trait SerialPortIn {
    /// Read one line into `buf`, returning its length.
    ///
    /// Returns `Ok(None)` when no line arrives within `timeout`.
    async fn read_line(&mut self, buf: &mut [u8], timeout: Duration) -> Result<Option<usize>>;
}

/// Encode a forward frame as a command line.
pub fn encode_command(frame: &TxFrame) -> CommandLine {
    use core::fmt::Write;
    let mut line = CommandLine::new();
    let separator = if frame.is_send_twice() { '+' } else { ' ' };
    // The line always fits the fixed capacity
    let _ = write!(
        line,
        "S{} {:X}{}{:X}\r",
        frame.priority_value(),
        frame.length().bits(),
        separator,
        frame.data()
    );
    line
}

/// Decode one received line into a bus event.
///
/// Returns `None` for lines that carry no record or do not parse.
pub fn decode_line(line: &str) -> Option<RxEvent> {
    let start = line.find('{')? + 1;
    let end = line.find('}')?;
    let payload = line.get(start..end)?;

    u32::from_str_radix(payload.get(0..8)?, 16).ok()?;
    let marker = *payload.as_bytes().get(8)?;
    if marker != b'>' && marker != b':' {
        return None;
    }
    let length = u8::from_str_radix(payload.get(9..11)?, 16).ok()?;
    let data = u32::from_str_radix(payload.get(12..20)?, 16).ok()?;

    let length = match length {
        8 => FrameLength::Backward,
        16 => FrameLength::Gear,
        24 => FrameLength::Device,
        // A record with a length no DALI frame has is a corrupted reception
        _ => return Some(RxEvent::Fault(BusFault::Framing)),
    };
    Some(RxEvent::Frame { length, data })
}

/// Transmit half of a serial interface.
#[derive(Debug)]
pub struct SerialSender<P: SerialPortOut> {
    port: P,
}

impl<P: SerialPortOut> SerialSender<P> {
    /// Wrap a serial transmit pump.
    pub fn new(port: P) -> Self {
        Self { port }
    }
}

impl<P: SerialPortOut> FrameSink for SerialSender<P> {
    async fn send(&mut self, frame: &TxFrame) -> Result<()> {
        let line = encode_command(frame);
        dali_log!(debug, "serial out: {}", line.trim_end());
        self.port.write_line(&line).await
    }
}

/// Receive half of a serial interface.
#[derive(Debug)]
pub struct SerialReceiver<P: SerialPortIn> {
    port: P,
}

impl<P: SerialPortIn> SerialReceiver<P> {
    /// Wrap a serial receive pump.
    pub fn new(port: P) -> Self {
        Self { port }
    }
}

impl<P: SerialPortIn> EventSource for SerialReceiver<P> {
    async fn poll(&mut self, timeout: Duration) -> Result<Option<RxEvent>> {
        let mut buf = [0u8; LINE_MAX];
        let Some(len) = self.port.read_line(&mut buf, timeout).await? else {
            return Ok(None);
        };
        let Ok(line) = core::str::from_utf8(&buf[..len]) else {
            dali_log!(warn, "serial in: non-ascii line dropped");
            return Ok(None);
        };
        let event = decode_line(line);
        if event.is_none() {
            dali_log!(warn, "serial in: unparsable line dropped");
        }
        Ok(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_single_send() {
        let frame = TxFrame::gear(0xFF, 0x90);
        assert_eq!(encode_command(&frame).as_str(), "S1 10 FF90\r");
    }

    #[test]
    fn encode_send_twice_joins_with_plus() {
        let frame = TxFrame::gear(0x01, 0x20).send_twice();
        assert_eq!(encode_command(&frame).as_str(), "S1 10+120\r");
    }

    #[test]
    fn encode_device_frame_with_priority() {
        let frame = TxFrame::device(0xFF, 0xFE, 0x00).priority(2).unwrap();
        assert_eq!(encode_command(&frame).as_str(), "S2 18 FFFE00\r");
    }

    #[test]
    fn decode_loopback_record() {
        assert_eq!(
            decode_line("{0000a3c1>10 0000ff90}\n"),
            Some(RxEvent::Frame {
                length: FrameLength::Gear,
                data: 0xFF90
            })
        );
    }

    #[test]
    fn decode_direct_record() {
        assert_eq!(
            decode_line("{0000a3c1:08 000000ff}\n"),
            Some(RxEvent::Frame {
                length: FrameLength::Backward,
                data: 0xFF
            })
        );
    }

    #[test]
    fn decode_device_record() {
        assert_eq!(
            decode_line("{12345678>18 00c10805}\n"),
            Some(RxEvent::Frame {
                length: FrameLength::Device,
                data: 0xC1_0805
            })
        );
    }

    #[test]
    fn decode_odd_length_is_framing_fault() {
        assert_eq!(
            decode_line("{0000a3c1>0d 00000042}\n"),
            Some(RxEvent::Fault(BusFault::Framing))
        );
    }

    #[test]
    fn decode_rejects_garbage() {
        assert_eq!(decode_line("no braces here"), None);
        assert_eq!(decode_line("{}"), None);
        assert_eq!(decode_line("{zzzzzzzz>10 0000ff90}"), None);
        assert_eq!(decode_line("{0000a3c1?10 0000ff90}"), None);
        assert_eq!(decode_line("{0000a3c1>10 zzzzff90}"), None);
        assert_eq!(decode_line(""), None);
    }
}
