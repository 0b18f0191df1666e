//! Control-gear commands (IEC 62386-102).
//!
//! Pure builders: every function assembles the 16-bit frame(s) for one
//! logical command and performs all range checks before any bus traffic.
//! Commands needing a data value go through data transfer register 0 first,
//! so those builders return a two-frame sequence to transmit in order.

pub mod commissioning;

use crate::addressing::GearAddress;
use crate::error::{DaliError, Result};
use crate::frame::TxFrame;

/// Number of gear scenes.
pub const MAX_SCENE: u8 = 16;

/// DTR0 sentinel meaning "no short address".
pub const ADDRESS_MASK: u8 = 0xFF;

/// Query command opcodes, IEC 62386-102:2022 11.5.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum QueryOpcode {
    Status = 0x90,
    GearPresent = 0x91,
    LampFailure = 0x92,
    LampPowerOn = 0x93,
    LimitError = 0x94,
    ResetState = 0x95,
    MissingShortAddress = 0x96,
    VersionNumber = 0x97,
    ContentDtr0 = 0x98,
    DeviceType = 0x99,
    PhysicalMinimum = 0x9A,
    PowerFailure = 0x9B,
    ContentDtr1 = 0x9C,
    ContentDtr2 = 0x9D,
    OperatingMode = 0x9E,
    LightSourceType = 0x9F,
    ActualLevel = 0xA0,
    MaxLevel = 0xA1,
    MinLevel = 0xA2,
    PowerOnLevel = 0xA3,
    SystemFailureLevel = 0xA4,
    FadeTimeRate = 0xA5,
    ManufacturerSpecificMode = 0xA6,
    NextDeviceType = 0xA7,
    ExtendedFadeTime = 0xA8,
    GearFailure = 0xAA,
    SceneLevel = 0xB0,
    Groups0_7 = 0xC0,
    Groups8_15 = 0xC1,
    RandomAddressH = 0xC2,
    RandomAddressM = 0xC3,
    RandomAddressL = 0xC4,
    ReadMemory = 0xC5,
    ExtendedVersionNumber = 0xFF,
}

/// Special command opcodes, IEC 62386-102:2022 11.7.
///
/// Special commands occupy the address slot of the frame; the low byte
/// carries their data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum SpecialOpcode {
    Terminate = 0xA1,
    Dtr0 = 0xA3,
    Initialise = 0xA5,
    Randomise = 0xA7,
    Compare = 0xA9,
    Withdraw = 0xAB,
    Ping = 0xAD,
    SearchAddrH = 0xB1,
    SearchAddrM = 0xB3,
    SearchAddrL = 0xB5,
    ProgramShortAddress = 0xB7,
    VerifyShortAddress = 0xB9,
    QueryShortAddress = 0xBB,
    EnableDeviceType = 0xC1,
    Dtr1 = 0xC3,
    Dtr2 = 0xC5,
    Write = 0xC7,
    WriteNr = 0xC9,
}

// Opcode bases, IEC 62386-102:2022 11.3 / 11.4
const OFF: u8 = 0x00;
const UP: u8 = 0x01;
const DOWN: u8 = 0x02;
const RECALL_MAX: u8 = 0x05;
const RECALL_MIN: u8 = 0x06;
const GOTO_SCENE: u8 = 0x10;
const RESET: u8 = 0x20;
const STORE_ACTUAL_LEVEL: u8 = 0x21;
const SET_OPERATION_MODE: u8 = 0x23;
const IDENTIFY_GEAR: u8 = 0x25;
const SET_MAX_LEVEL: u8 = 0x2A;
const SET_MIN_LEVEL: u8 = 0x2B;
const SET_FAIL_LEVEL: u8 = 0x2C;
const SET_POWER_ON_LEVEL: u8 = 0x2D;
const SET_FADE_TIME: u8 = 0x2E;
const SET_FADE_RATE: u8 = 0x2F;
const SET_SCENE: u8 = 0x40;
const REMOVE_SCENE: u8 = 0x50;
const ADD_GROUP: u8 = 0x60;
const REMOVE_GROUP: u8 = 0x70;
const SET_SHORT_ADR: u8 = 0x80;
const ENABLE_WRITE: u8 = 0x81;

fn command(address: GearAddress, opcode: u8) -> TxFrame {
    TxFrame::gear(address.encode(false), opcode)
}

fn configure(address: GearAddress, opcode: u8) -> TxFrame {
    command(address, opcode).send_twice()
}

// ---------------------------------------------------------------------------
// Level commands
// ---------------------------------------------------------------------------

/// Lights off.
pub fn off(address: GearAddress) -> TxFrame {
    command(address, OFF)
}

/// Dim up one step.
pub fn up(address: GearAddress) -> TxFrame {
    command(address, UP)
}

/// Dim down one step.
pub fn down(address: GearAddress) -> TxFrame {
    command(address, DOWN)
}

/// Recall the maximum level.
pub fn recall_max(address: GearAddress) -> TxFrame {
    command(address, RECALL_MAX)
}

/// Recall the minimum level.
pub fn recall_min(address: GearAddress) -> TxFrame {
    command(address, RECALL_MIN)
}

/// Direct arc power control. Level 255 is the MASK value that leaves the
/// actual level unchanged.
pub fn dapc(address: GearAddress, level: u8) -> TxFrame {
    TxFrame::gear(address.encode(true), level)
}

/// Go to scene 0-15.
pub fn goto_scene(address: GearAddress, scene: u8) -> Result<TxFrame> {
    if scene >= MAX_SCENE {
        return Err(DaliError::scene_out_of_range());
    }
    Ok(command(address, GOTO_SCENE + scene))
}

// ---------------------------------------------------------------------------
// Configure commands (all send-twice)
// ---------------------------------------------------------------------------

/// Reset all gear variables to their reset value.
pub fn reset(address: GearAddress) -> TxFrame {
    configure(address, RESET)
}

/// Store the actual level into DTR0.
pub fn store_actual_level(address: GearAddress) -> TxFrame {
    configure(address, STORE_ACTUAL_LEVEL)
}

/// Start or stop the identification indication.
pub fn identify(address: GearAddress) -> TxFrame {
    configure(address, IDENTIFY_GEAR)
}

/// Set the operating mode (via DTR0).
pub fn set_operation_mode(address: GearAddress, mode: u8) -> [TxFrame; 2] {
    [set_dtr0(mode), configure(address, SET_OPERATION_MODE)]
}

/// Set the maximum level (via DTR0).
pub fn set_max_level(address: GearAddress, level: u8) -> [TxFrame; 2] {
    [set_dtr0(level), configure(address, SET_MAX_LEVEL)]
}

/// Set the minimum level (via DTR0).
pub fn set_min_level(address: GearAddress, level: u8) -> [TxFrame; 2] {
    [set_dtr0(level), configure(address, SET_MIN_LEVEL)]
}

/// Set the system failure level (via DTR0).
pub fn set_fail_level(address: GearAddress, level: u8) -> [TxFrame; 2] {
    [set_dtr0(level), configure(address, SET_FAIL_LEVEL)]
}

/// Set the power-on level (via DTR0).
pub fn set_power_on_level(address: GearAddress, level: u8) -> [TxFrame; 2] {
    [set_dtr0(level), configure(address, SET_POWER_ON_LEVEL)]
}

/// Set the fade time (via DTR0).
pub fn set_fade_time(address: GearAddress, value: u8) -> [TxFrame; 2] {
    [set_dtr0(value), configure(address, SET_FADE_TIME)]
}

/// Set the fade rate (via DTR0).
pub fn set_fade_rate(address: GearAddress, value: u8) -> [TxFrame; 2] {
    [set_dtr0(value), configure(address, SET_FADE_RATE)]
}

/// Set scene 0-15 to a level. Level 255 (MASK) removes the gear from the
/// scene.
pub fn set_scene(address: GearAddress, scene: u8, level: u8) -> Result<[TxFrame; 2]> {
    if scene >= MAX_SCENE {
        return Err(DaliError::scene_out_of_range());
    }
    Ok([set_dtr0(level), configure(address, SET_SCENE + scene)])
}

/// Remove the gear from scene 0-15.
pub fn remove_scene(address: GearAddress, scene: u8) -> Result<TxFrame> {
    if scene >= MAX_SCENE {
        return Err(DaliError::scene_out_of_range());
    }
    Ok(configure(address, REMOVE_SCENE + scene))
}

/// Add the gear to group 0-15.
pub fn add_to_group(address: GearAddress, group: u8) -> Result<TxFrame> {
    if group > GearAddress::MAX_GROUP {
        return Err(DaliError::invalid_group());
    }
    Ok(configure(address, ADD_GROUP + group))
}

/// Remove the gear from group 0-15.
pub fn remove_from_group(address: GearAddress, group: u8) -> Result<TxFrame> {
    if group > GearAddress::MAX_GROUP {
        return Err(DaliError::invalid_group());
    }
    Ok(configure(address, REMOVE_GROUP + group))
}

/// Set the short address of the addressed gear.
///
/// DTR0 carries the new address in its on-wire form `(address << 1) | 1`.
pub fn set_short_address(address: GearAddress, new_short: u8) -> Result<[TxFrame; 2]> {
    if new_short > GearAddress::MAX_SHORT {
        return Err(DaliError::invalid_short_address());
    }
    Ok([
        set_dtr0((new_short << 1) | 1),
        configure(address, SET_SHORT_ADR),
    ])
}

/// Clear the short address of the addressed gear.
pub fn clear_short_address(address: GearAddress) -> [TxFrame; 2] {
    [set_dtr0(ADDRESS_MASK), configure(address, SET_SHORT_ADR)]
}

/// Enable write access to memory banks.
pub fn enable_write(address: GearAddress) -> TxFrame {
    configure(address, ENABLE_WRITE)
}

// ---------------------------------------------------------------------------
// Query and special commands
// ---------------------------------------------------------------------------

/// Assemble a query frame. The reply arrives as a backward frame.
pub fn query(address: GearAddress, opcode: QueryOpcode) -> TxFrame {
    command(address, opcode as u8)
}

/// Query the level stored for a scene.
pub fn query_scene_level(address: GearAddress, scene: u8) -> Result<TxFrame> {
    if scene >= MAX_SCENE {
        return Err(DaliError::scene_out_of_range());
    }
    Ok(command(address, QueryOpcode::SceneLevel as u8 + scene))
}

/// Assemble a special command frame with a data byte.
pub fn special(opcode: SpecialOpcode, data: u8) -> TxFrame {
    TxFrame::gear(opcode as u8, data)
}

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

/// Which gear an INITIALISE command targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InitialiseTarget {
    /// All gear on the bus
    All,
    /// Only gear without a short address
    Unaddressed,
    /// Only the gear with this short address
    Short(u8),
}

/// Enable initialisation mode (send-twice).
pub fn initialise(target: InitialiseTarget) -> Result<TxFrame> {
    let data = match target {
        InitialiseTarget::All => 0x00,
        InitialiseTarget::Unaddressed => 0xFF,
        InitialiseTarget::Short(n) => {
            if n > GearAddress::MAX_SHORT {
                return Err(DaliError::invalid_short_address());
            }
            (n << 1) | 1
        }
    };
    Ok(special(SpecialOpcode::Initialise, data).send_twice())
}

/// Generate new random addresses (send-twice).
pub fn randomise() -> TxFrame {
    special(SpecialOpcode::Randomise, 0x00).send_twice()
}

/// Compare searchAddress against the gear's random address. Answered with a
/// backward frame by every gear whose random address is less than or equal.
pub fn compare() -> TxFrame {
    special(SpecialOpcode::Compare, 0x00)
}

/// Withdraw the matching gear from the compare process.
pub fn withdraw() -> TxFrame {
    special(SpecialOpcode::Withdraw, 0x00)
}

/// Terminate initialisation and identification states.
pub fn terminate() -> TxFrame {
    special(SpecialOpcode::Terminate, 0x00)
}

/// The three frames that load a 24-bit search address, high byte first.
pub fn set_search_address(search: u32) -> Result<[TxFrame; 3]> {
    if search > 0xFF_FFFF {
        return Err(DaliError::search_address_out_of_range());
    }
    Ok([
        special(SpecialOpcode::SearchAddrH, (search >> 16) as u8),
        special(SpecialOpcode::SearchAddrM, (search >> 8) as u8),
        special(SpecialOpcode::SearchAddrL, search as u8),
    ])
}

/// Program the selected gear's short address.
pub fn program_short_address(address: u8) -> Result<TxFrame> {
    if address > GearAddress::MAX_SHORT {
        return Err(DaliError::invalid_short_address());
    }
    Ok(special(
        SpecialOpcode::ProgramShortAddress,
        (address << 1) | 1,
    ))
}

/// Verify the selected gear's short address; answered with YES on match.
pub fn verify_short_address(address: u8) -> Result<TxFrame> {
    if address > GearAddress::MAX_SHORT {
        return Err(DaliError::invalid_short_address());
    }
    Ok(special(
        SpecialOpcode::VerifyShortAddress,
        (address << 1) | 1,
    ))
}
