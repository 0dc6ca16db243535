use crate::defaults::UDP_PROTOCOL;
use std::{collections::HashMap, fmt, net::Ipv4Addr};

/// Identifies one logical traffic flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FiveTuple {
    pub source: Ipv4Addr,
    pub destination: Ipv4Addr,
    pub protocol: u8,
    pub source_port: u16,
    pub destination_port: u16,
}

/// Identifier given by the [`FlowClassifier`] to a [`FiveTuple`], in order
/// of first appearance. The first flow is `1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FlowId(u32);

#[derive(Debug, Default)]
pub struct FlowClassifier {
    ids: HashMap<FiveTuple, FlowId>,

    /// `tuples[id - 1]` is the tuple of the flow `id`
    tuples: Vec<FiveTuple>,
}

impl FiveTuple {
    pub fn udp(
        source: Ipv4Addr,
        source_port: u16,
        destination: Ipv4Addr,
        destination_port: u16,
    ) -> Self {
        Self {
            source,
            destination,
            protocol: UDP_PROTOCOL,
            source_port,
            destination_port,
        }
    }
}

impl FlowId {
    #[inline]
    pub const fn into_u32(self) -> u32 {
        self.0
    }
}

impl FlowClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// the identifier of `tuple`, allocating a new one on first sight
    pub fn classify(&mut self, tuple: &FiveTuple) -> FlowId {
        if let Some(id) = self.ids.get(tuple) {
            return *id;
        }
        self.tuples.push(*tuple);
        let id = FlowId(self.tuples.len() as u32);
        self.ids.insert(*tuple, id);
        id
    }

    /// the identifier of `tuple` if it was already classified
    pub fn lookup(&self, tuple: &FiveTuple) -> Option<FlowId> {
        self.ids.get(tuple).copied()
    }

    /// the tuple classified under `id`
    pub fn find_flow(&self, id: FlowId) -> Option<&FiveTuple> {
        (id.0 as usize)
            .checked_sub(1)
            .and_then(|index| self.tuples.get(index))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.tuples.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tuples.is_empty()
    }
}

impl fmt::Display for FiveTuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{} -> {}:{} (proto {})",
            self.source, self.source_port, self.destination, self.destination_port, self.protocol
        )
    }
}

impl fmt::Display for FlowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
