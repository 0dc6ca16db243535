use crate::defaults::DEFAULT_PREFIX_LEN;
use std::net::Ipv4Addr;
use thiserror::Error;

/// Hands out consecutive host addresses of an IPv4 network.
///
/// The first address handed out is host `.1`; the network and broadcast
/// addresses are never assigned.
///
/// ```
/// use hopsim_core::address::AddressAllocator;
/// use std::net::Ipv4Addr;
///
/// let mut allocator = AddressAllocator::new(Ipv4Addr::new(10, 1, 0, 0), 24);
/// assert_eq!(allocator.allocate().unwrap(), Ipv4Addr::new(10, 1, 0, 1));
/// assert_eq!(allocator.allocate().unwrap(), Ipv4Addr::new(10, 1, 0, 2));
/// assert_eq!(allocator.remaining(), 252);
/// ```
#[derive(Debug, Clone)]
pub struct AddressAllocator {
    network: u32,
    prefix_len: u8,
    next_host: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    #[error("No more host addresses available in {network}/{prefix_len}")]
    Exhausted { network: Ipv4Addr, prefix_len: u8 },
}

impl AddressAllocator {
    /// Create an allocator for `network/prefix_len`.
    ///
    /// The host bits of `network` are ignored and the prefix length is
    /// capped to 30 so that at least two hosts are available.
    pub fn new(network: Ipv4Addr, prefix_len: u8) -> Self {
        let prefix_len = prefix_len.min(30);
        let mask = u32::MAX.checked_shl(32 - prefix_len as u32).unwrap_or(0);
        Self {
            network: u32::from(network) & mask,
            prefix_len,
            next_host: 1,
        }
    }

    pub fn network(&self) -> Ipv4Addr {
        Ipv4Addr::from(self.network)
    }

    pub fn prefix_len(&self) -> u8 {
        self.prefix_len
    }

    /// number of host addresses that can still be allocated
    pub fn remaining(&self) -> u32 {
        (self.last_host() + 1).saturating_sub(self.next_host)
    }

    fn last_host(&self) -> u32 {
        // broadcast excluded
        ((1u64 << (32 - self.prefix_len as u32)) - 2) as u32
    }

    pub fn allocate(&mut self) -> Result<Ipv4Addr, AddressError> {
        if self.next_host > self.last_host() {
            return Err(AddressError::Exhausted {
                network: self.network(),
                prefix_len: self.prefix_len,
            });
        }
        let address = Ipv4Addr::from(self.network | self.next_host);
        self.next_host += 1;
        Ok(address)
    }
}

impl Default for AddressAllocator {
    fn default() -> Self {
        Self::new(crate::defaults::SIDELINK_NETWORK, DEFAULT_PREFIX_LEN)
    }
}
