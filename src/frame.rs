//! DALI frame model.
//!
//! Forward frames carry 16 bits (control gear, IEC 62386-102) or 24 bits
//! (control devices, IEC 62386-103); backward frames carry 8 bits and are
//! only ever received. A [`TxFrame`] is the transmit unit handed to a
//! transport; an [`RxEvent`] is everything a transport can report back.

use crate::error::{DaliError, Result};

/// Lowest transmit priority accepted by the bus interfaces.
pub const PRIORITY_MIN: u8 = 1;
/// Highest numeric transmit priority (lowest urgency).
pub const PRIORITY_MAX: u8 = 5;

/// Bit length of a DALI frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FrameLength {
    /// 8-bit backward frame (reply from a device, never transmitted)
    Backward = 8,
    /// 16-bit forward frame addressed to control gear
    Gear = 16,
    /// 24-bit forward frame addressed to control devices
    Device = 24,
}

impl FrameLength {
    /// Number of bits on the wire.
    pub const fn bits(self) -> u8 {
        self as u8
    }

    /// Largest payload value that fits this length.
    pub const fn max_data(self) -> u32 {
        match self {
            FrameLength::Backward => 0xFF,
            FrameLength::Gear => 0xFFFF,
            FrameLength::Device => 0xFF_FFFF,
        }
    }
}

/// A forward frame queued for transmission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TxFrame {
    length: FrameLength,
    data: u32,
    send_twice: bool,
    priority: u8,
}

impl TxFrame {
    /// Build a frame, validating that `data` fits in `length` bits.
    pub fn new(length: FrameLength, data: u32) -> Result<Self> {
        if data > length.max_data() {
            return Err(DaliError::payload_overflow());
        }
        Ok(Self {
            length,
            data,
            send_twice: false,
            priority: PRIORITY_MIN,
        })
    }

    /// 16-bit gear frame: address byte in the high byte, opcode in the low.
    pub fn gear(address: u8, opcode: u8) -> Self {
        Self {
            length: FrameLength::Gear,
            data: u32::from(address) << 8 | u32::from(opcode),
            send_twice: false,
            priority: PRIORITY_MIN,
        }
    }

    /// 24-bit device frame: address, instance, opcode from high to low byte.
    pub fn device(address: u8, instance: u8, opcode: u8) -> Self {
        Self {
            length: FrameLength::Device,
            data: u32::from(address) << 16 | u32::from(instance) << 8 | u32::from(opcode),
            send_twice: false,
            priority: PRIORITY_MIN,
        }
    }

    /// Mark the frame for send-twice transmission (configuration commands).
    pub const fn send_twice(mut self) -> Self {
        self.send_twice = true;
        self
    }

    /// Set the transmit priority (1 = most urgent .. 5).
    pub fn priority(mut self, priority: u8) -> Result<Self> {
        if !(PRIORITY_MIN..=PRIORITY_MAX).contains(&priority) {
            return Err(DaliError::invalid_priority());
        }
        self.priority = priority;
        Ok(self)
    }

    /// Frame bit length.
    pub const fn length(&self) -> FrameLength {
        self.length
    }

    /// Packed payload, right-aligned.
    pub const fn data(&self) -> u32 {
        self.data
    }

    /// Whether the frame must be transmitted twice.
    pub const fn is_send_twice(&self) -> bool {
        self.send_twice
    }

    /// Transmit priority.
    pub const fn priority_value(&self) -> u8 {
        self.priority
    }

    /// Number of payload bytes for wire encodings.
    pub const fn byte_len(&self) -> usize {
        match self.length {
            FrameLength::Backward => 1,
            FrameLength::Gear => 2,
            FrameLength::Device => 3,
        }
    }
}

/// A fault condition reported by the bus interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BusFault {
    /// Transient condition, the interface keeps running
    Recoverable,
    /// Malformed or collided frame observed on the bus
    Framing,
    /// Any other fault reported by the interface
    General,
}

/// One observation from the bus.
///
/// `Timeout` is a first-class outcome rather than an error: an unanswered
/// query is how absence is detected during commissioning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RxEvent {
    /// A complete frame was observed (our own echo included)
    Frame { length: FrameLength, data: u32 },
    /// The interface reported a fault condition
    Fault(BusFault),
    /// Nothing arrived within the allotted window
    Timeout,
}

impl RxEvent {
    /// The reply value, if this event is an 8-bit backward frame.
    pub fn backward_value(&self) -> Option<u8> {
        match self {
            RxEvent::Frame {
                length: FrameLength::Backward,
                data,
            } => Some(*data as u8),
            _ => None,
        }
    }

    /// True for any answer at all, including a framing fault caused by
    /// multiple devices replying at once (which counts as "someone is there"
    /// during binary search).
    pub fn is_response(&self) -> bool {
        !matches!(self, RxEvent::Timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gear_frame_packs_address_high() {
        let f = TxFrame::gear(0xFE, 0x90);
        assert_eq!(f.length(), FrameLength::Gear);
        assert_eq!(f.data(), 0xFE90);
        assert_eq!(f.byte_len(), 2);
    }

    #[test]
    fn device_frame_packs_three_bytes() {
        let f = TxFrame::device(0xFF, 0xFE, 0x00);
        assert_eq!(f.length(), FrameLength::Device);
        assert_eq!(f.data(), 0xFF_FE00);
        assert_eq!(f.byte_len(), 3);
    }

    #[test]
    fn new_rejects_payload_overflow() {
        assert!(TxFrame::new(FrameLength::Gear, 0x1_0000).is_err());
        assert!(TxFrame::new(FrameLength::Device, 0x100_0000).is_err());
        assert!(TxFrame::new(FrameLength::Gear, 0xFFFF).is_ok());
    }

    #[test]
    fn send_twice_and_priority_combinators() {
        let f = TxFrame::gear(0x01, 0x20).send_twice();
        assert!(f.is_send_twice());
        assert_eq!(f.priority_value(), 1);

        let f = f.priority(3).unwrap();
        assert_eq!(f.priority_value(), 3);
        assert!(TxFrame::gear(0x01, 0x20).priority(0).is_err());
        assert!(TxFrame::gear(0x01, 0x20).priority(6).is_err());
    }

    #[test]
    fn backward_value_only_for_backward_frames() {
        let reply = RxEvent::Frame {
            length: FrameLength::Backward,
            data: 0xFF,
        };
        assert_eq!(reply.backward_value(), Some(0xFF));

        let echo = RxEvent::Frame {
            length: FrameLength::Gear,
            data: 0xA901,
        };
        assert_eq!(echo.backward_value(), None);
    }

    #[test]
    fn framing_fault_counts_as_response() {
        assert!(RxEvent::Fault(BusFault::Framing).is_response());
        assert!(!RxEvent::Timeout.is_response());
    }
}
