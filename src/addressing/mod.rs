//! DALI addressing system.
//!
//! Two address spaces share the bus:
//! - Gear addresses select control gear in 16-bit frames (IEC 62386-102)
//! - Device addresses plus an instance byte select control devices in
//!   24-bit frames (IEC 62386-103)

pub mod device;
pub mod gear;

pub use device::{DeviceAddress, InstanceAddress};
pub use gear::GearAddress;
