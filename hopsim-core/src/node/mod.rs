mod id;
mod position;

pub use self::{id::NodeId, position::Position};
use std::net::Ipv4Addr;

/// A simulated wireless station.
///
/// `Node` is placed once, when the [`Topology`] is built, and never moves.
/// Each node carries the addresses of the devices attached to it; in the
/// scenarios of this crate every node has exactly one device.
///
/// You never construct a `Node` directly, use [`Topology::place_nodes`].
///
/// [`Topology`]: crate::topology::Topology
/// [`Topology::place_nodes`]: crate::topology::Topology::place_nodes
#[derive(Debug, Clone)]
pub struct Node {
    id: NodeId,

    position: Position,

    devices: Vec<Ipv4Addr>,
}

impl Node {
    pub(crate) fn new(id: NodeId, position: Position) -> Self {
        Self {
            id,
            position,
            devices: Vec::new(),
        }
    }

    /// Returns the unique identifier of this node.
    #[inline]
    pub fn id(&self) -> NodeId {
        self.id
    }

    #[inline]
    pub fn position(&self) -> Position {
        self.position
    }

    /// Addresses of the devices attached to this node, in attachment order.
    pub fn devices(&self) -> &[Ipv4Addr] {
        &self.devices
    }

    /// The address of the first device, the one used to reach this node.
    pub fn primary_address(&self) -> Option<Ipv4Addr> {
        self.devices.first().copied()
    }

    /// Returns `true` if one of the devices of this node owns `address`.
    pub fn owns(&self, address: Ipv4Addr) -> bool {
        self.devices.contains(&address)
    }

    pub(crate) fn attach(&mut self, address: Ipv4Addr) {
        self.devices.push(address);
    }
}
