//! Control-gear address byte (IEC 62386-102).
//!
//! The high byte of a 16-bit forward frame selects the target. Bit 0 of the
//! encoded byte distinguishes a command frame (1) from direct-arc power,
//! DAPC (0); special and reserved codes carry their own low bit and pass
//! through unchanged.
//!
//! Byte map:
//! - `0x00..=0x7F` short address 0-63
//! - `0x80..=0x9F` group 0-15
//! - `0xA0..=0xCB` special commands
//! - `0xCC..=0xFB` reserved
//! - `0xFC`/`0xFD` unaddressed devices
//! - `0xFE`/`0xFF` broadcast

use crate::error::{DaliError, Result};
use core::fmt;

/// Address field of a 16-bit control-gear frame.
///
/// # Examples
///
/// ```
/// use dali_bus::addressing::GearAddress;
///
/// let addr = GearAddress::short(5).unwrap();
/// assert_eq!(addr.encode(false), 0x0B);
/// assert_eq!(addr.encode(true), 0x0A); // DAPC clears bit 0
///
/// let addr: GearAddress = "G3".parse().unwrap();
/// assert_eq!(addr, GearAddress::Group(3));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum GearAddress {
    /// Short address 0-63
    Short(u8),
    /// Group 0-15
    Group(u8),
    /// All gear on the bus
    Broadcast,
    /// Gear without a short address
    Unaddressed,
    /// Special command code, transmitted verbatim (0xA0-0xCB)
    Special(u8),
    /// Reserved code, transmitted verbatim (0xCC-0xFB)
    Reserved(u8),
}

impl GearAddress {
    /// Maximum short address
    pub const MAX_SHORT: u8 = 63;
    /// Maximum gear group
    pub const MAX_GROUP: u8 = 15;

    /// Validated short address (0-63).
    pub fn short(address: u8) -> Result<Self> {
        if address > Self::MAX_SHORT {
            return Err(DaliError::invalid_short_address());
        }
        Ok(Self::Short(address))
    }

    /// Validated group address (0-15).
    pub fn group(group: u8) -> Result<Self> {
        if group > Self::MAX_GROUP {
            return Err(DaliError::invalid_group());
        }
        Ok(Self::Group(group))
    }

    /// Validated special command code (0xA0-0xCB).
    pub fn special(code: u8) -> Result<Self> {
        if !(0xA0..0xCC).contains(&code) {
            return Err(DaliError::invalid_special_code());
        }
        Ok(Self::Special(code))
    }

    /// Encode to the address byte. `dapc` clears bit 0 to mark the low byte
    /// as a direct arc-power level instead of an opcode.
    pub fn encode(self, dapc: bool) -> u8 {
        let bit0 = u8::from(!dapc);
        match self {
            Self::Short(n) => (n & 0x3F) << 1 | bit0,
            Self::Group(g) => 0x80 | (g & 0x0F) << 1 | bit0,
            Self::Broadcast => 0xFE | bit0,
            Self::Unaddressed => 0xFC | bit0,
            Self::Special(code) | Self::Reserved(code) => code,
        }
    }

    /// Classify an observed address byte.
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            0x00..=0x7F => Self::Short(byte >> 1),
            0x80..=0x9F => Self::Group((byte >> 1) & 0x0F),
            0xA0..=0xCB => Self::Special(byte),
            0xCC..=0xFB => Self::Reserved(byte),
            0xFC | 0xFD => Self::Unaddressed,
            0xFE | 0xFF => Self::Broadcast,
        }
    }
}

impl fmt::Display for GearAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Short(n) => write!(f, "A{n:02}"),
            Self::Group(g) => write!(f, "G{g:02}"),
            Self::Broadcast => write!(f, "BC"),
            Self::Unaddressed => write!(f, "BCU"),
            Self::Special(code) | Self::Reserved(code) => write!(f, "0x{code:02X}"),
        }
    }
}

impl core::str::FromStr for GearAddress {
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_encoding() {
        assert_eq!(GearAddress::short(0).unwrap().encode(false), 0x01);
        assert_eq!(GearAddress::short(5).unwrap().encode(false), 0x0B);
        assert_eq!(GearAddress::short(63).unwrap().encode(false), 0x7F);
        // DAPC clears bit 0
        assert_eq!(GearAddress::short(5).unwrap().encode(true), 0x0A);
    }

    #[test]
    fn test_group_encoding() {
        assert_eq!(GearAddress::group(0).unwrap().encode(false), 0x81);
        assert_eq!(GearAddress::group(15).unwrap().encode(false), 0x9F);
        assert_eq!(GearAddress::group(3).unwrap().encode(true), 0x86);
    }

    #[test]
    fn test_broadcast_encoding() {
        assert_eq!(GearAddress::Broadcast.encode(false), 0xFF);
        assert_eq!(GearAddress::Broadcast.encode(true), 0xFE);
        assert_eq!(GearAddress::Unaddressed.encode(false), 0xFD);
        assert_eq!(GearAddress::Unaddressed.encode(true), 0xFC);
    }

    #[test]
    fn test_special_passthrough() {
        // Special codes carry their own low bit, DAPC flag is ignored
        let initialise = GearAddress::special(0xA5).unwrap();
        assert_eq!(initialise.encode(false), 0xA5);
        assert_eq!(initialise.encode(true), 0xA5);
    }

    #[test]
    fn test_range_validation() {
        assert!(GearAddress::short(64).is_err());
        assert!(GearAddress::group(16).is_err());
        assert!(GearAddress::special(0x9F).is_err());
        assert!(GearAddress::special(0xCC).is_err());
    }

    #[test]
    fn test_from_byte_classification() {
        assert_eq!(GearAddress::from_byte(0x0B), GearAddress::Short(5));
        assert_eq!(GearAddress::from_byte(0x87), GearAddress::Group(3));
        assert_eq!(GearAddress::from_byte(0xA5), GearAddress::Special(0xA5));
        assert_eq!(GearAddress::from_byte(0xCC), GearAddress::Reserved(0xCC));
        assert_eq!(GearAddress::from_byte(0xFD), GearAddress::Unaddressed);
        assert_eq!(GearAddress::from_byte(0xFF), GearAddress::Broadcast);
    }

    #[test]
    fn test_from_str() {
        assert_eq!("BC".parse::<GearAddress>().unwrap(), GearAddress::Broadcast);
        assert_eq!(
            "bcu".parse::<GearAddress>().unwrap(),
            GearAddress::Unaddressed
        );
        assert_eq!("G3".parse::<GearAddress>().unwrap(), GearAddress::Group(3));
        assert_eq!("12".parse::<GearAddress>().unwrap(), GearAddress::Short(12));

        assert!("G16".parse::<GearAddress>().is_err());
        assert!("64".parse::<GearAddress>().is_err());
        assert!("xyz".parse::<GearAddress>().is_err());
        assert!("".parse::<GearAddress>().is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(
            GearAddress::short(5).unwrap().to_string(),
            "A05"
        );
        assert_eq!(GearAddress::group(3).unwrap().to_string(), "G03");
        assert_eq!(GearAddress::Broadcast.to_string(), "BC");
        assert_eq!(GearAddress::Unaddressed.to_string(), "BCU");
    }
}
