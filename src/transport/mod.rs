//! Bus transport abstraction.
//!
//! This module provides the frame-level contract between the connection
//! engine and a concrete DALI interface, enabling:
//! - Testability through mock implementations
//! - Flexibility to support different interface hardware (USB-HID, serial)
//!
//! ## Design Pattern
//!
//! The transmit and receive paths are separate traits so the connection can
//! own the sink while the background reader owns the source. Physical byte
//! pumping (USB report I/O, serial port I/O) stays behind small port traits
//! in the backend modules; the backends themselves only translate between
//! [`TxFrame`]/[`RxEvent`] and the wire encoding.
//!
//! ## Example
//!
//! ```rust,ignore
//! use dali_bus::transport::{FrameSink, EventSource};
//! use dali_bus::connection::{open, BusState};
//!
//! // Production: USB-HID interface
//! let (tx, rx) = (HidSender::new(out_port), HidReceiver::new(in_port));
//! let (conn, reader) = open(tx, rx, &BUS).await?;
//!
//! // Testing: mock transport
//! let (conn, reader) = open(MockTransport::new(), MockEvents::new(), &BUS).await?;
//! ```

pub mod hid;
pub mod mock;
pub mod serial;

pub use hid::{HidPortIn, HidPortOut, HidReceiver, HidSender};
pub use mock::{MockEvents, MockTransport};
pub use serial::{SerialPortIn, SerialPortOut, SerialReceiver, SerialSender};

use crate::error::Result;
use crate::frame::{RxEvent, TxFrame};
use embassy_time::Duration;

/// Transmit half of a DALI interface.
///
/// Implementations encode the frame for their wire format and hand it to the
/// hardware. Send-twice transmission is realised here, not above: a backend
/// either uses its interface's native double-send or repeats the frame
/// itself with the required settle delay.
#[allow(async_fn_in_trait)]
pub trait FrameSink {
    /// Transmit one forward frame.
    ///
    /// # Errors
    ///
    /// Returns a transport error if the underlying channel fails; such an
    /// error is fatal to the connection.
    async fn send(&mut self, frame: &TxFrame) -> Result<()>;

    /// Close the transmit path and release resources.
    ///
    /// Default implementation does nothing. Override if your backend
    /// needs cleanup.
    fn close(&mut self) {
        // Default: no-op
    }
}

/// Receive half of a DALI interface.
#[allow(async_fn_in_trait)]
pub trait EventSource {
    /// Poll for one bus event.
    ///
    /// Returns `Ok(None)` when nothing decodable arrives within `timeout`;
    /// this is the reader's poll interval expiring, not an application-level
    /// timeout, and the caller just polls again.
    ///
    /// # Errors
    ///
    /// Returns a transport error if the underlying channel fails; such an
    /// error terminates the background reader.
    async fn poll(&mut self, timeout: Duration) -> Result<Option<RxEvent>>;
}
