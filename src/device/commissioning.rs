//! Control-device enumeration.
//!
//! Same binary search as gear commissioning, with the 24-bit special frame
//! vocabulary and two extra concerns: quiescent mode brackets the run so
//! input devices do not flood the bus with event notifications, and group
//! membership is cleared through the two 16-group bitmask banks.

use crate::addressing::DeviceAddress;
use crate::connection::{Connection, DEFAULT_TIMEOUT};
use crate::dali_log;
use crate::device;
use crate::error::{DaliError, Result};
use crate::frame::TxFrame;
use crate::gear::commissioning::{AssignedAddresses, MAX_ADDRESSES};
use crate::transport::FrameSink;
use embassy_time::Duration;

const SEARCH_ALL: u32 = 0xFF_FFFF;

/// One device enumeration run over an open connection.
#[derive(Debug)]
pub struct DeviceCommissioner<'c, 'a, TX: FrameSink> {
    connection: &'c mut Connection<'a, TX>,
    timeout: Duration,
}

impl<'c, 'a, TX: FrameSink> DeviceCommissioner<'c, 'a, TX> {
    /// Run with the default reply timeout.
    pub fn new(connection: &'c mut Connection<'a, TX>) -> Self {
        Self {
            connection,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Override the reply timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Clear and re-program the short addresses of all control devices.
    pub async fn enumerate(&mut self) -> Result<AssignedAddresses> {
        self.prepare_bus().await?;
        self.clear_addressing().await?;
        self.transmit(&device::randomise()).await?;

        let mut assigned = AssignedAddresses::new();
        let mut next_short_address: u8 = 0;
        loop {
            let Some(random_address) = self.binary_search().await? else {
                dali_log!(info, "enumerate: no (more) devices");
                break;
            };
            if next_short_address as usize >= MAX_ADDRESSES {
                dali_log!(error, "enumerate: more devices than short addresses");
                self.finish().await?;
                return Err(DaliError::address_space_exhausted());
            }
            self.set_search_address(random_address).await?;
            if self.assign(next_short_address).await? {
                dali_log!(
                    info,
                    "enumerate: assigned D{} to 0x{:06x}",
                    next_short_address,
                    random_address
                );
                let _ = assigned.push(next_short_address);
                next_short_address += 1;
            } else {
                dali_log!(warn, "enumerate: verify failed for 0x{:06x}", random_address);
            }
        }
        self.finish().await?;
        Ok(assigned)
    }

    async fn prepare_bus(&mut self) -> Result<()> {
        self.transmit(&device::initialise_all()).await?;
        self.transmit(&device::start_quiescent_mode(DeviceAddress::Broadcast))
            .await
    }

    async fn clear_addressing(&mut self) -> Result<()> {
        for frame in device::clear_short_address(DeviceAddress::Broadcast) {
            self.transmit(&frame).await?;
        }
        // Both group banks at once: all-ones membership mask, removed
        self.transmit(&device::set_dtr2_dtr1(0xFF, 0xFF)).await?;
        self.transmit(&device::configure(
            DeviceAddress::Broadcast,
            device::ConfigureOpcode::RemoveFromDeviceGroups0_15,
        ))
        .await?;
        self.transmit(&device::configure(
            DeviceAddress::Broadcast,
            device::ConfigureOpcode::RemoveFromDeviceGroups16_31,
        ))
        .await
    }

    async fn finish(&mut self) -> Result<()> {
        self.transmit(&device::terminate()).await?;
        self.transmit(&device::stop_quiescent_mode(DeviceAddress::Broadcast))
            .await
    }

    async fn binary_search(&mut self) -> Result<Option<u32>> {
        let mut search = SEARCH_ALL;
        self.set_search_address(search).await?;
        if !self.compare().await? {
            return Ok(None);
        }
        for position in (0..24).rev() {
            let candidate = search & !(1 << position);
            self.set_search_address(candidate).await?;
            if self.compare().await? {
                search = candidate;
            }
        }
        Ok(Some(search))
    }

    async fn assign(&mut self, short_address: u8) -> Result<bool> {
        self.transmit(&device::program_short_address(short_address)?)
            .await?;
        let reply = self
            .connection
            .query_reply(&device::verify_short_address(short_address)?, self.timeout)
            .await?;
        if !reply.is_response() {
            return Ok(false);
        }
        self.transmit(&device::withdraw()).await?;
        Ok(true)
    }

    async fn set_search_address(&mut self, search: u32) -> Result<()> {
        for frame in device::set_search_address(search)? {
            self.transmit(&frame).await?;
        }
        Ok(())
    }

    async fn compare(&mut self) -> Result<bool> {
        let reply = self
            .connection
            .query_reply(&device::compare(), self.timeout)
            .await?;
        Ok(reply.is_response())
    }

    async fn transmit(&mut self, frame: &TxFrame) -> Result<()> {
        self.connection.transmit(frame).await
    }
}
