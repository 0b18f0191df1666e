//! Control-gear enumeration: assign fresh short addresses to every gear on
//! the bus by binary search over the 24-bit random address space.
//!
//! The run is a linear progression: prepare the bus, wipe existing
//! addressing, let every gear draw a random address, then repeatedly isolate
//! the gear with the lowest random address, program it, and withdraw it from
//! the search until nobody answers a compare.
//!
//! INITIALISE is sent with the all-gear operand (0x00), not the
//! unaddressed-only operand (0xFF): since the run wipes every short address
//! anyway, all gear must take part in the search, including gear that was
//! addressed before the run started.

use crate::addressing::GearAddress;
use crate::connection::{Connection, DEFAULT_TIMEOUT};
use crate::dali_log;
use crate::error::{DaliError, Result};
use crate::frame::TxFrame;
use crate::gear;
use crate::gear::InitialiseTarget;
use crate::transport::FrameSink;
use embassy_time::Duration;

/// Widest possible search address, matches every random address.
const SEARCH_ALL: u32 = 0xFF_FFFF;

/// Number of assignable short addresses.
pub const MAX_ADDRESSES: usize = 64;

/// Short addresses assigned by one enumeration run, in assignment order.
pub type AssignedAddresses = heapless::Vec<u8, MAX_ADDRESSES>;

/// One gear enumeration run over an open connection.
#[derive(Debug)]
pub struct GearCommissioner<'c, 'a, TX: FrameSink> {
    connection: &'c mut Connection<'a, TX>,
    timeout: Duration,
}

impl<'c, 'a, TX: FrameSink> GearCommissioner<'c, 'a, TX> {
    /// Run with the default reply timeout.
    pub fn new(connection: &'c mut Connection<'a, TX>) -> Self {
        Self {
            connection,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Override the reply timeout (slow buses, simulations).
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Clear and re-program the short addresses of all control gear.
    ///
    /// Returns the assigned addresses in order. Fails with a commissioning
    /// error if more gear answers than the address space can hold.
    pub async fn enumerate(&mut self) -> Result<AssignedAddresses> {
        self.prepare_bus().await?;
        self.clear_addressing().await?;
        self.transmit(&gear::randomise()).await?;

        let mut assigned = AssignedAddresses::new();
        let mut next_short_address: u8 = 0;
        loop {
            let Some(random_address) = self.binary_search().await? else {
                dali_log!(info, "enumerate: no (more) gear");
                break;
            };
            if next_short_address as usize >= MAX_ADDRESSES {
                dali_log!(error, "enumerate: more gear than short addresses");
                self.transmit(&gear::terminate()).await?;
                return Err(DaliError::address_space_exhausted());
            }
            // Side responses during conflict resolution may have perturbed
            // the search address registers; re-sync before programming.
            self.set_search_address(random_address).await?;
            if self.assign(next_short_address).await? {
                dali_log!(
                    info,
                    "enumerate: assigned A{} to 0x{:06x}",
                    next_short_address,
                    random_address
                );
                // Cannot overflow, bounded by MAX_ADDRESSES above
                let _ = assigned.push(next_short_address);
                next_short_address += 1;
            } else {
                dali_log!(warn, "enumerate: verify failed for 0x{:06x}", random_address);
            }
        }
        self.transmit(&gear::terminate()).await?;
        Ok(assigned)
    }

    async fn prepare_bus(&mut self) -> Result<()> {
        self.transmit(&gear::initialise(InitialiseTarget::All)?)
            .await
    }

    async fn clear_addressing(&mut self) -> Result<()> {
        for frame in gear::clear_short_address(GearAddress::Broadcast) {
            self.transmit(&frame).await?;
        }
        for group in 0..=GearAddress::MAX_GROUP {
            let frame = gear::remove_from_group(GearAddress::Broadcast, group)?;
            self.transmit(&frame).await?;
        }
        Ok(())
    }

    /// Narrow the search address down to the lowest random address present.
    ///
    /// Returns `None` when no gear answers the initial compare.
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
            // No response: the bit was necessary, leave it set
        }
        Ok(Some(search))
    }

    /// Program, verify and withdraw the isolated gear.
    async fn assign(&mut self, short_address: u8) -> Result<bool> {
        self.transmit(&gear::program_short_address(short_address)?)
            .await?;
        let reply = self
            .connection
            .query_reply(&gear::verify_short_address(short_address)?, self.timeout)
            .await?;
        if !reply.is_response() {
            return Ok(false);
        }
        self.transmit(&gear::withdraw()).await?;
        Ok(true)
    }

    async fn set_search_address(&mut self, search: u32) -> Result<()> {
        for frame in gear::set_search_address(search)? {
            self.transmit(&frame).await?;
        }
        Ok(())
    }

    /// A compare answered by anything, a collided reply included, means at
    /// least one gear matches.
    async fn compare(&mut self) -> Result<bool> {
        let reply = self
            .connection
            .query_reply(&gear::compare(), self.timeout)
            .await?;
        Ok(reply.is_response())
    }

    async fn transmit(&mut self, frame: &TxFrame) -> Result<()> {
        self.connection.transmit(frame).await
    }
}
