//! Mock transport implementation for testing.
//!
//! Records every transmitted frame as its serial-command text and never
//! produces bus events, so command assembly can be verified without any
//! interface hardware.
//!
//! ## Example
//!
//! ```rust,ignore
//! let mut mock = MockTransport::new();
//! conn.transmit(&frame).await?;
//!
//! assert_eq!(mock.sent_lines().len(), 1);
//! assert_eq!(mock.sent_lines()[0], "S1 10 FF90\r");
//! ```

use crate::error::Result;
use crate::frame::{RxEvent, TxFrame};
use crate::transport::serial::{encode_command, CommandLine};
use crate::transport::{EventSource, FrameSink};
use embassy_time::{Duration, Timer};

/// How many command lines the mock keeps before refusing further sends.
pub const MOCK_CAPACITY: usize = 64;

/// Mock transmit half: captures commands instead of sending them.
#[derive(Debug, Default)]
pub struct MockTransport {
    sent: heapless::Vec<CommandLine, MOCK_CAPACITY>,
}

impl MockTransport {
    /// Create a new mock transport.
    pub fn new() -> Self {
        Self {
            sent: heapless::Vec::new(),
        }
    }

    /// All captured command lines, in transmit order.
    pub fn sent_lines(&self) -> &[CommandLine] {
        &self.sent
    }

    /// The most recently captured command line.
    pub fn last_sent(&self) -> Option<&CommandLine> {
        self.sent.last()
    }

    /// Clear the capture history.
    ///
    /// Useful for resetting state between test phases.
    pub fn clear_sent(&mut self) {
        self.sent.clear();
    }
}

impl FrameSink for MockTransport {
    async fn send(&mut self, frame: &TxFrame) -> Result<()> {
        self.sent
            .push(encode_command(frame))
            .map_err(|_| crate::error::DaliError::buffer_too_small())?;
        Ok(())
    }
}

/// Mock receive half: a silent bus, every poll times out.
#[derive(Debug, Default)]
pub struct MockEvents;

impl MockEvents {
    /// Create a new mock event source.
    pub fn new() -> Self {
        Self
    }
}

impl EventSource for MockEvents {
    async fn poll(&mut self, timeout: Duration) -> Result<Option<RxEvent>> {
        Timer::after(timeout).await;
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_records_commands() {
        let mut mock = MockTransport::new();

        mock.send(&TxFrame::gear(0xFF, 0x90)).await.unwrap();
        mock.send(&TxFrame::gear(0x01, 0x20).send_twice())
            .await
            .unwrap();

        assert_eq!(mock.sent_lines().len(), 2);
        assert_eq!(mock.sent_lines()[0].as_str(), "S1 10 FF90\r");
        assert_eq!(mock.last_sent().unwrap().as_str(), "S1 10+120\r");

        mock.clear_sent();
        assert!(mock.sent_lines().is_empty());
    }

    #[tokio::test]
    async fn test_mock_events_always_time_out() {
        let mut events = MockEvents::new();
        let result = events.poll(Duration::from_millis(1)).await.unwrap();
        assert!(result.is_none());
    }
}
