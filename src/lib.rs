#![cfg_attr(all(not(test), not(feature = "std")), no_std)]
#![doc = include_str!("../README.md")]

//! # dali-bus
//!
//! DALI (IEC 62386) bus-master implementation for commissioning and
//! diagnostic tooling.
//!
//! This crate provides a `no_std` implementation of the bus-master side of
//! the DALI lighting-control protocol, designed for use with the Embassy
//! async runtime on embedded masters and equally usable from host tools
//! (the test suite runs under tokio with the embassy-time std driver).
//!
//! ## Features
//!
//! - 16-bit control-gear and 24-bit control-device forward frames
//! - Gear, device and instance addressing with validated constructors
//! - USB-HID and serial-line interface codecs behind one transport contract
//! - Connection engine with background reader, bounded event queue and
//!   echo filtering
//! - Short-address enumeration by binary search over random addresses
//!
//! ## Example
//!
//! ```rust,ignore
//! use dali_bus::{addressing::GearAddress, connection, gear};
//!
//! static BUS: connection::BusState = connection::BusState::new();
//!
//! let (mut conn, mut reader) = connection::open(tx, rx, &BUS).await?;
//! // drive reader.run() from its own task
//!
//! let frame = gear::query(GearAddress::Broadcast, gear::QueryOpcode::Status);
//! let reply = conn.query_reply(&frame, connection::DEFAULT_TIMEOUT).await?;
//! ```

pub mod addressing;
pub mod connection;
pub mod device;
pub mod error;
pub mod frame;
pub mod gear;
pub mod logging;
pub mod transport;

// Re-export commonly used types
#[doc(inline)]
pub use addressing::{DeviceAddress, GearAddress, InstanceAddress};
#[doc(inline)]
pub use connection::{open, BusState, Connection, DEFAULT_TIMEOUT};
#[doc(inline)]
pub use error::{DaliError, Result};
#[doc(inline)]
pub use frame::{BusFault, FrameLength, RxEvent, TxFrame};
