//! Error types for DALI bus operations.
//!
//! One public [`DaliError`] enum groups structured category errors. Timeouts
//! and bus faults observed on the wire are *not* errors here: "no device
//! answered" is a normal commissioning outcome and surfaces as an
//! [`RxEvent`](crate::frame::RxEvent) instead. `DaliError` covers everything
//! that must stop the caller.

use core::fmt;

/// Result type alias for DALI operations.
pub type Result<T> = core::result::Result<T, DaliError>;

// =============================================================================
// Error Kind Enums (Internal)
// =============================================================================

/// Frame assembly error variants (internal)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub(crate) enum FrameErrorKind {
    PayloadOverflow,
    InvalidPriority,
}

/// Addressing error variants (internal)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub(crate) enum AddressingErrorKind {
    InvalidShortAddress,
    InvalidGroup,
    InvalidSpecialCode,
    InvalidInstance,
    UnparsableAddress,
}

/// Parameter error variants (internal)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub(crate) enum ParameterErrorKind {
    SceneOutOfRange,
    SearchAddressOutOfRange,
}

/// Transport error variants (internal)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub(crate) enum TransportErrorKind {
    SendFailed,
    ReceiveFailed,
    PortClosed,
    BufferTooSmall,
}

/// Commissioning error variants (internal)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub(crate) enum CommissioningErrorKind {
    AddressSpaceExhausted,
}

// =============================================================================
// Main Error Type
// =============================================================================

/// DALI error type.
///
/// This is the main error type returned by all fallible operations in the
/// crate, grouped by category with detail available through helper methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DaliError {
    /// Frame assembly errors (payload does not fit the frame length, etc.)
    Frame(FrameError),
    /// Addressing errors (out-of-range short/group, unparsable address text)
    Addressing(AddressingError),
    /// Parameter errors (caller value rejected before any bus traffic)
    Parameter(ParameterError),
    /// Transport errors (I/O failure on the underlying channel)
    Transport(TransportError),
    /// Commissioning errors (enumeration aborted)
    Commissioning(CommissioningError),
}

// =============================================================================
// Structured Error Types
// =============================================================================

/// Frame assembly error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FrameError {
    kind: FrameErrorKind,
}

impl FrameError {
    pub(crate) const fn new(kind: FrameErrorKind) -> Self {
        Self { kind }
    }

    /// Check if the payload did not fit the requested frame length
    pub fn is_payload_overflow(&self) -> bool {
        matches!(self.kind, FrameErrorKind::PayloadOverflow)
    }
}

/// Addressing error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AddressingError {
    kind: AddressingErrorKind,
}

impl AddressingError {
    pub(crate) const fn new(kind: AddressingErrorKind) -> Self {
        Self { kind }
    }

    /// Check if a short address was outside 0..64
    pub fn is_invalid_short_address(&self) -> bool {
        matches!(self.kind, AddressingErrorKind::InvalidShortAddress)
    }

    /// Check if a group number was out of range for the bus role
    pub fn is_invalid_group(&self) -> bool {
        matches!(self.kind, AddressingErrorKind::InvalidGroup)
    }

    /// Check if textual address input could not be parsed
    pub fn is_unparsable(&self) -> bool {
        matches!(self.kind, AddressingErrorKind::UnparsableAddress)
    }
}

/// Parameter error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ParameterError {
    kind: ParameterErrorKind,
}

impl ParameterError {
    pub(crate) const fn new(kind: ParameterErrorKind) -> Self {
        Self { kind }
    }

    /// Check if a value was outside its permitted range
    pub fn is_out_of_range(&self) -> bool {
        matches!(
            self.kind,
            ParameterErrorKind::SceneOutOfRange | ParameterErrorKind::SearchAddressOutOfRange
        )
    }
}

/// Transport error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TransportError {
    kind: TransportErrorKind,
}

impl TransportError {
    pub(crate) const fn new(kind: TransportErrorKind) -> Self {
        Self { kind }
    }

    /// Check if the send path failed
    pub fn is_send_failed(&self) -> bool {
        matches!(self.kind, TransportErrorKind::SendFailed)
    }

    /// Check if the receive path failed
    pub fn is_receive_failed(&self) -> bool {
        matches!(self.kind, TransportErrorKind::ReceiveFailed)
    }

    /// Check if the underlying port was closed
    pub fn is_port_closed(&self) -> bool {
        matches!(self.kind, TransportErrorKind::PortClosed)
    }
}

/// Commissioning error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CommissioningError {
    kind: CommissioningErrorKind,
}

impl CommissioningError {
    pub(crate) const fn new(kind: CommissioningErrorKind) -> Self {
        Self { kind }
    }

    /// Check if the 64-entry short-address space ran out mid-run
    pub fn is_address_space_exhausted(&self) -> bool {
        matches!(self.kind, CommissioningErrorKind::AddressSpaceExhausted)
    }
}

// =============================================================================
// Convenience Constructors for DaliError
// =============================================================================

impl DaliError {
    // Frame errors
    #[inline]
    pub(crate) const fn payload_overflow() -> Self {
        Self::Frame(FrameError::new(FrameErrorKind::PayloadOverflow))
    }

    #[inline]
    pub(crate) const fn invalid_priority() -> Self {
        Self::Frame(FrameError::new(FrameErrorKind::InvalidPriority))
    }

    // Addressing errors
    #[inline]
    pub(crate) const fn invalid_short_address() -> Self {
        Self::Addressing(AddressingError::new(
            AddressingErrorKind::InvalidShortAddress,
        ))
    }

    #[inline]
    pub(crate) const fn invalid_group() -> Self {
        Self::Addressing(AddressingError::new(AddressingErrorKind::InvalidGroup))
    }

    #[inline]
    pub(crate) const fn invalid_special_code() -> Self {
        Self::Addressing(AddressingError::new(
            AddressingErrorKind::InvalidSpecialCode,
        ))
    }

    #[inline]
    pub(crate) const fn invalid_instance() -> Self {
        Self::Addressing(AddressingError::new(AddressingErrorKind::InvalidInstance))
    }

    #[inline]
    pub(crate) const fn unparsable_address() -> Self {
        Self::Addressing(AddressingError::new(
            AddressingErrorKind::UnparsableAddress,
        ))
    }

    // Parameter errors
    #[inline]
    pub(crate) const fn scene_out_of_range() -> Self {
        Self::Parameter(ParameterError::new(ParameterErrorKind::SceneOutOfRange))
    }

    #[inline]
    pub(crate) const fn search_address_out_of_range() -> Self {
        Self::Parameter(ParameterError::new(
            ParameterErrorKind::SearchAddressOutOfRange,
        ))
    }

    // Transport errors. Public: port trait implementations outside the
    // crate return these from their pump methods.

    /// The transmit path of a port failed.
    #[inline]
    pub const fn send_failed() -> Self {
        Self::Transport(TransportError::new(TransportErrorKind::SendFailed))
    }

    /// The receive path of a port failed.
    #[inline]
    pub const fn receive_failed() -> Self {
        Self::Transport(TransportError::new(TransportErrorKind::ReceiveFailed))
    }

    /// The underlying port was closed.
    #[inline]
    pub const fn port_closed() -> Self {
        Self::Transport(TransportError::new(TransportErrorKind::PortClosed))
    }

    /// A buffer was too small for the data at hand.
    #[inline]
    pub const fn buffer_too_small() -> Self {
        Self::Transport(TransportError::new(TransportErrorKind::BufferTooSmall))
    }

    // Commissioning errors
    #[inline]
    pub(crate) const fn address_space_exhausted() -> Self {
        Self::Commissioning(CommissioningError::new(
            CommissioningErrorKind::AddressSpaceExhausted,
        ))
    }
}

// =============================================================================
// Display Implementation
// =============================================================================

impl fmt::Display for DaliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DaliError::Frame(e) => write!(f, "Frame error: {:?}", e.kind),
            DaliError::Addressing(e) => write!(f, "Addressing error: {:?}", e.kind),
            DaliError::Parameter(e) => write!(f, "Parameter error: {:?}", e.kind),
            DaliError::Transport(e) => write!(f, "Transport error: {:?}", e.kind),
            DaliError::Commissioning(e) => write!(f, "Commissioning error: {:?}", e.kind),
        }
    }
}

// Implement std::error::Error for std-based applications
#[cfg(any(test, feature = "std"))]
impl std::error::Error for DaliError {}
