use crate::{defaults, flow::FiveTuple, time::SimTime};
use std::fmt;

/// a generator for monotonicaly increasing **unique** [`PacketId`]
#[derive(Debug, Clone)]
pub struct PacketIdGenerator(u64);

/// # [`Packet`] Identifier
///
/// Unique for the whole simulation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PacketId(u64);

/// A UDP datagram in flight.
///
/// The packet carries no payload, only its size: what matters to the
/// simulation is who sent it, where it goes, when it left and how many
/// bytes it weighs on the air.
#[derive(Debug, Clone, PartialEq)]
pub struct Packet {
    id: PacketId,
    flow: FiveTuple,
    sequence: u64,
    sent_at: SimTime,
    payload_bytes: u64,
    ttl: u8,
}

impl PacketIdGenerator {
    pub fn new() -> Self {
        Self(1)
    }

    /// generate a new unique identifier
    pub fn generate(&mut self) -> PacketId {
        let id = self.0;
        self.0 += 1;
        PacketId(id)
    }
}

impl Default for PacketIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl Packet {
    pub fn new(
        id: PacketId,
        flow: FiveTuple,
        sequence: u64,
        sent_at: SimTime,
        payload_bytes: u64,
    ) -> Self {
        Self {
            id,
            flow,
            sequence,
            sent_at,
            payload_bytes,
            ttl: defaults::DEFAULT_TTL,
        }
    }

    pub fn id(&self) -> PacketId {
        self.id
    }

    pub fn flow(&self) -> &FiveTuple {
        &self.flow
    }

    /// position of this packet in its flow, starting at `0`
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn sent_at(&self) -> SimTime {
        self.sent_at
    }

    pub fn payload_bytes(&self) -> u64 {
        self.payload_bytes
    }

    /// the size of the datagram on the air, headers included
    pub fn wire_bytes(&self) -> u64 {
        self.payload_bytes + defaults::IPV4_UDP_HEADER_BYTES
    }

    pub fn ttl(&self) -> u8 {
        self.ttl
    }

    /// Consume one hop of the time to live.
    ///
    /// Returns `false` (and leaves the packet untouched) if the time to
    /// live is already exhausted.
    pub(crate) fn take_hop(&mut self) -> bool {
        match self.ttl.checked_sub(1) {
            Some(ttl) => {
                self.ttl = ttl;
                true
            }
            None => false,
        }
    }

    #[cfg(test)]
    pub(crate) fn with_ttl(mut self, ttl: u8) -> Self {
        self.ttl = ttl;
        self
    }
}

impl fmt::Display for PacketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:016x}", self.0)
    }
}
