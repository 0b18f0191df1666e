//! Control-device address and instance bytes (IEC 62386-103).
//!
//! A 24-bit forward frame carries the device address in its high byte and an
//! instance-addressing byte in the middle. Unlike gear addressing, bit 0 of
//! the device address byte is always 1; there is no DAPC form.

use crate::error::{DaliError, Result};
use core::fmt;

/// Address field of a 24-bit control-device frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DeviceAddress {
    /// Short address 0-63
    Short(u8),
    /// Device group 0-31
    Group(u8),
    /// All devices on the bus (0xFF)
    Broadcast,
    /// Devices without a short address (0xFD)
    Unaddressed,
    /// Special command frame (0xC1); the instance byte selects the command
    Special,
}

impl DeviceAddress {
    /// Maximum short address
    pub const MAX_SHORT: u8 = 63;
    /// Maximum device group
    pub const MAX_GROUP: u8 = 31;

    /// Validated short address (0-63).
    pub fn short(address: u8) -> Result<Self> {
        if address > Self::MAX_SHORT {
            return Err(DaliError::invalid_short_address());
        }
        Ok(Self::Short(address))
    }

    /// Validated device group (0-31).
    pub fn group(group: u8) -> Result<Self> {
        if group > Self::MAX_GROUP {
            return Err(DaliError::invalid_group());
        }
        Ok(Self::Group(group))
    }

    /// Encode to the address byte. Bit 0 is always set.
    pub fn encode(self) -> u8 {
        match self {
            Self::Short(n) => 0x01 | (n & 0x3F) << 1,
            Self::Group(g) => 0x81 | (g & 0x1F) << 1,
            Self::Broadcast => 0xFF,
            Self::Unaddressed => 0xFD,
            Self::Special => 0xC1,
        }
    }
}

impl fmt::Display for DeviceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Short(n) => write!(f, "D{n:02}"),
            Self::Group(g) => write!(f, "DG{g:02}"),
            Self::Broadcast => write!(f, "BC"),
            Self::Unaddressed => write!(f, "BCU"),
            Self::Special => write!(f, "SPECIAL"),
        }
    }
}

impl core::str::FromStr for DeviceAddress {
    type Err = DaliError;

    /// Accepts `BC`, `BCU`, `G<n>` and a bare short address.
    fn from_str(s: &str) -> Result<Self> {
        if s.eq_ignore_ascii_case("BC") {
            return Ok(Self::Broadcast);
        }
        if s.eq_ignore_ascii_case("BCU") {
            return Ok(Self::Unaddressed);
        }
        if let Some(group) = s.strip_prefix('G').or_else(|| s.strip_prefix('g')) {
            let group = group
                .parse::<u8>()
                .map_err(|_| DaliError::unparsable_address())?;
            return Self::group(group);
        }
        let short = s
            .parse::<u8>()
            .map_err(|_| DaliError::unparsable_address())?;
        Self::short(short)
    }
}

/// Instance-addressing byte of a 24-bit device frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum InstanceAddress {
    /// Instance number 0-31
    Number(u8),
    /// Instance group 0-31
    Group(u8),
    /// Instance type 0-31
    Type(u8),
    /// The device itself rather than one of its instances (0xFE)
    Device,
    /// All instances of the device (0xFF)
    Broadcast,
}

impl InstanceAddress {
    /// Maximum instance number / group / type
    pub const MAX_INSTANCE: u8 = 31;

    /// Validated instance number (0-31).
    pub fn number(instance: u8) -> Result<Self> {
        if instance > Self::MAX_INSTANCE {
            return Err(DaliError::invalid_instance());
        }
        Ok(Self::Number(instance))
    }

    /// Validated instance group (0-31).
    pub fn group(group: u8) -> Result<Self> {
        if group > Self::MAX_INSTANCE {
            return Err(DaliError::invalid_instance());
        }
        Ok(Self::Group(group))
    }

    /// Validated instance type (0-31).
    pub fn instance_type(ty: u8) -> Result<Self> {
        if ty > Self::MAX_INSTANCE {
            return Err(DaliError::invalid_instance());
        }
        Ok(Self::Type(ty))
    }

    /// Encode to the instance byte.
    pub fn encode(self) -> u8 {
        match self {
            Self::Number(n) => n & 0x1F,
            Self::Group(g) => 0x80 | (g & 0x1F),
            Self::Type(t) => 0xC0 | (t & 0x1F),
            Self::Device => 0xFE,
            Self::Broadcast => 0xFF,
        }
    }
}

impl fmt::Display for InstanceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "I{n:02}"),
            Self::Group(g) => write!(f, "IG{g:02}"),
            Self::Type(t) => write!(f, "IT{t:02}"),
            Self::Device => write!(f, "DEV"),
            Self::Broadcast => write!(f, "BC"),
        }
    }
}
