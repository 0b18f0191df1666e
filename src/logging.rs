//! Unified Logging Macros for dali-bus
//!
//! This module provides a unified logging interface that automatically
//! selects between `defmt::` and `log::` based on the active feature flags.
//!
//! # Usage
//!
//! ```rust,ignore
//! use crate::dali_log;
//!
//! dali_log!(info, "Bus connection opened");
//! dali_log!(debug, "Received frame {:06x}", data);
//! dali_log!(warn, "Reply timeout");
//! dali_log!(error, "Transport failed");
//! ```
//!
//! # Feature Flags
//!
//! - `defmt` - Uses `defmt::` (efficient binary logging for embedded targets)
//! - No feature - Uses `log::` crate (host tooling, tests)
//!
//! Only `{}`-style format specs shared by both backends are used in this
//! crate, so the macro body can forward arguments unchanged.

/// Unified logging macro - automatically selects defmt:: or log:: based on features
#[macro_export]
#[cfg(feature = "defmt")]
macro_rules! dali_log {
    (info, $($arg:tt)*) => { defmt::info!($($arg)*) };
    (debug, $($arg:tt)*) => { defmt::debug!($($arg)*) };
    (warn, $($arg:tt)*) => { defmt::warn!($($arg)*) };
    (error, $($arg:tt)*) => { defmt::error!($($arg)*) };
    (trace, $($arg:tt)*) => { defmt::trace!($($arg)*) };
}

#[macro_export]
#[cfg(not(feature = "defmt"))]
macro_rules! dali_log {
    (info, $($arg:tt)*) => { log::info!($($arg)*) };
    (debug, $($arg:tt)*) => { log::debug!($($arg)*) };
    (warn, $($arg:tt)*) => { log::warn!($($arg)*) };
    (error, $($arg:tt)*) => { log::error!($($arg)*) };
    (trace, $($arg:tt)*) => { log::trace!($($arg)*) };
}
