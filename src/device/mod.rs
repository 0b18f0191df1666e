//! Control-device commands (IEC 62386-103).
//!
//! All frames are 24 bit: address byte, instance-addressing byte, opcode.
//! Special commands use the fixed address byte 0xC1 with the command code in
//! the instance slot and the data byte in the opcode slot; the combined
//! register writes (DTR1+DTR0, DTR2+DTR1) have their own address bytes and
//! carry two data bytes.

pub mod commissioning;

use crate::addressing::{DeviceAddress, InstanceAddress};
use crate::error::{DaliError, Result};
use crate::frame::TxFrame;

/// Address byte of single-data special command frames.
const SPECIAL: u8 = 0xC1;
/// Address byte of the combined DTR1+DTR0 write.
const DTR1_DTR0: u8 = 0xC7;
/// Address byte of the combined DTR2+DTR1 write.
const DTR2_DTR1: u8 = 0xC9;

/// Configure command opcodes, IEC 62386-103:2022 11.5.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum ConfigureOpcode {
    IdentifyDevice = 0x00,
    ResetPowerCycleSeen = 0x02,
    Reset = 0x10,
    ResetMemoryBank = 0x11,
    SetShortAddress = 0x14,
    EnableWriteMemory = 0x15,
    EnableApplicationController = 0x16,
    DisableApplicationController = 0x17,
    SetOperatingMode = 0x18,
    AddToDeviceGroups0_15 = 0x19,
    AddToDeviceGroups16_31 = 0x1A,
    RemoveFromDeviceGroups0_15 = 0x1B,
    RemoveFromDeviceGroups16_31 = 0x1C,
    StartQuiescentMode = 0x1D,
    StopQuiescentMode = 0x1E,
}

/// Query command opcodes, IEC 62386-103:2022 11.6.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum QueryOpcode {
    Status = 0x30,
    ApplicationControllerError = 0x31,
    InputDeviceError = 0x32,
    MissingShortAddress = 0x33,
    VersionNumber = 0x34,
    NumberOfInstances = 0x35,
    ContentDtr0 = 0x36,
    ContentDtr1 = 0x37,
    ContentDtr2 = 0x38,
    ReadMemory = 0x3C,
    DeviceCapabilities = 0x46,
}

/// Special command opcodes, IEC 62386-103:2022 11.10.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum SpecialOpcode {
    Terminate = 0x00,
    Initialise = 0x01,
    Randomise = 0x02,
    Compare = 0x03,
    Withdraw = 0x04,
    SearchAddrH = 0x05,
    SearchAddrM = 0x06,
    SearchAddrL = 0x07,
    ProgramShortAddress = 0x08,
    VerifyShortAddress = 0x09,
    QueryShortAddress = 0x0A,
    WriteMemory = 0x20,
    WriteMemoryNoReply = 0x21,
    Dtr0 = 0x30,
    Dtr1 = 0x31,
    Dtr2 = 0x32,
    SendTestframe = 0x33,
}

/// Assemble an addressed command frame (instance byte selects the target
/// instance, or the device itself).
pub fn command(address: DeviceAddress, instance: InstanceAddress, opcode: u8) -> TxFrame {
    TxFrame::device(address.encode(), instance.encode(), opcode)
}

/// Assemble a configure command, addressed to the device itself (send-twice).
pub fn configure(address: DeviceAddress, opcode: ConfigureOpcode) -> TxFrame {
    command(address, InstanceAddress::Device, opcode as u8).send_twice()
}

/// Assemble a device-level query frame.
pub fn query(address: DeviceAddress, opcode: QueryOpcode) -> TxFrame {
    command(address, InstanceAddress::Device, opcode as u8)
}

/// Assemble an instance-level query frame.
pub fn query_instance(
    address: DeviceAddress,
    instance: InstanceAddress,
    opcode: u8,
) -> TxFrame {
    command(address, instance, opcode)
}

/// Assemble a special command frame with one data byte.
pub fn special(opcode: SpecialOpcode, data: u8) -> TxFrame {
    TxFrame::device(SPECIAL, opcode as u8, data)
}

// ---------------------------------------------------------------------------
// Configure helpers
// ---------------------------------------------------------------------------

/// Start or stop the identification indication.
pub fn identify(address: DeviceAddress) -> TxFrame {
    configure(address, ConfigureOpcode::IdentifyDevice)
}

/// Reset all device variables to their reset value.
pub fn reset(address: DeviceAddress) -> TxFrame {
    configure(address, ConfigureOpcode::Reset)
}

/// Set the short address of the addressed device (via DTR0, plain form).
pub fn set_short_address(address: DeviceAddress, new_short: u8) -> Result<[TxFrame; 2]> {
    if new_short > DeviceAddress::MAX_SHORT {
        return Err(DaliError::invalid_short_address());
    }
    Ok([
        set_dtr0(new_short),
        configure(address, ConfigureOpcode::SetShortAddress),
    ])
}

/// Clear the short address of the addressed device.
pub fn clear_short_address(address: DeviceAddress) -> [TxFrame; 2] {
    [
        set_dtr0(0xFF),
        configure(address, ConfigureOpcode::SetShortAddress),
    ]
}

/// Add the device to one of the 32 device groups (via DTR2+DTR1 bitmasks).
pub fn add_to_group(address: DeviceAddress, group: u8) -> Result<[TxFrame; 2]> {
    group_membership(address, group, true)
}

/// Remove the device from one of the 32 device groups.
pub fn remove_from_group(address: DeviceAddress, group: u8) -> Result<[TxFrame; 2]> {
    group_membership(address, group, false)
}

fn group_membership(address: DeviceAddress, group: u8, add: bool) -> Result<[TxFrame; 2]> {
    if group > DeviceAddress::MAX_GROUP {
        return Err(DaliError::invalid_group());
    }
    let mask: u16 = 1 << (group & 0x0F);
    let opcode = match (add, group < 16) {
        (true, true) => ConfigureOpcode::AddToDeviceGroups0_15,
        (true, false) => ConfigureOpcode::AddToDeviceGroups16_31,
        (false, true) => ConfigureOpcode::RemoveFromDeviceGroups0_15,
        (false, false) => ConfigureOpcode::RemoveFromDeviceGroups16_31,
    };
    Ok([
        set_dtr2_dtr1((mask >> 8) as u8, mask as u8),
        configure(address, opcode),
    ])
}

/// Suppress spontaneous input notifications (send-twice).
pub fn start_quiescent_mode(address: DeviceAddress) -> TxFrame {
    configure(address, ConfigureOpcode::StartQuiescentMode)
}

/// Resume spontaneous input notifications (send-twice).
pub fn stop_quiescent_mode(address: DeviceAddress) -> TxFrame {
    configure(address, ConfigureOpcode::StopQuiescentMode)
}

// ---------------------------------------------------------------------------
// Special helpers
// ---------------------------------------------------------------------------

/// Set data transfer register 0.
pub fn set_dtr0(data: u8) -> TxFrame {
    special(SpecialOpcode::Dtr0, data)
}

/// Set data transfer register 1.
pub fn set_dtr1(data: u8) -> TxFrame {
    special(SpecialOpcode::Dtr1, data)
}

/// Set data transfer register 2.
pub fn set_dtr2(data: u8) -> TxFrame {
    special(SpecialOpcode::Dtr2, data)
}

/// Set registers 1 and 0 with a single frame.
pub fn set_dtr1_dtr0(dtr1: u8, dtr0: u8) -> TxFrame {
    TxFrame::device(DTR1_DTR0, dtr1, dtr0)
}

/// Set registers 2 and 1 with a single frame.
pub fn set_dtr2_dtr1(dtr2: u8, dtr1: u8) -> TxFrame {
    TxFrame::device(DTR2_DTR1, dtr2, dtr1)
}

/// Enable initialisation mode for all devices (send-twice).
pub fn initialise_all() -> TxFrame {
    special(SpecialOpcode::Initialise, 0xFF).send_twice()
}

/// Generate new random addresses (send-twice).
pub fn randomise() -> TxFrame {
    special(SpecialOpcode::Randomise, 0x00).send_twice()
}

/// Compare searchAddress against the device's random address.
pub fn compare() -> TxFrame {
    special(SpecialOpcode::Compare, 0x00)
}

/// Withdraw the matching device from the compare process.
pub fn withdraw() -> TxFrame {
    special(SpecialOpcode::Withdraw, 0x00)
}

/// Terminate initialisation state.
pub fn terminate() -> TxFrame {
    special(SpecialOpcode::Terminate, 0x00)
}

/// The three frames that load a 24-bit search address, low byte first as
/// IEC 62386-103 prescribes.
pub fn set_search_address(search: u32) -> Result<[TxFrame; 3]> {
    if search > 0xFF_FFFF {
        return Err(DaliError::search_address_out_of_range());
    }
    Ok([
        special(SpecialOpcode::SearchAddrL, search as u8),
        special(SpecialOpcode::SearchAddrM, (search >> 8) as u8),
        special(SpecialOpcode::SearchAddrH, (search >> 16) as u8),
    ])
}

/// Program the selected device's short address (plain, not shifted).
pub fn program_short_address(address: u8) -> Result<TxFrame> {
    if address > DeviceAddress::MAX_SHORT {
        return Err(DaliError::invalid_short_address());
    }
    Ok(special(SpecialOpcode::ProgramShortAddress, address))
}

/// Verify the selected device's short address; answered with YES on match.
pub fn verify_short_address(address: u8) -> Result<TxFrame> {
    if address > DeviceAddress::MAX_SHORT {
        return Err(DaliError::invalid_short_address());
    }
    Ok(special(SpecialOpcode::VerifyShortAddress, address))
}
