//! Placement of the nodes and reachability between their devices.
//!
//! The [`Topology`] is configured once, before any traffic: nodes are placed
//! with [`Topology::place_nodes`], each receiving one device and the next
//! address of the [`AddressAllocator`]. Afterwards the topology is only read,
//! by the router when it validates a path and by the traffic generator when
//! it forwards a packet.
use crate::{
    address::{AddressAllocator, AddressError},
    link::{LinkId, LinkModel},
    node::{Node, NodeId, Position},
};
use std::{collections::HashMap, net::Ipv4Addr};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TopologyError {
    #[error("Cannot place {requested} node(s): {source}")]
    AddressExhausted {
        requested: usize,
        #[source]
        source: AddressError,
    },
}

pub struct Topology {
    nodes: Vec<Node>,

    /// reverse lookup of the device addresses
    addresses: HashMap<Ipv4Addr, NodeId>,

    link_model: LinkModel,

    allocator: AddressAllocator,
}

impl Topology {
    /// Create an empty topology.
    ///
    /// ```
    /// use hopsim_core::{
    ///     address::AddressAllocator, link::LinkModel, node::Position, topology::Topology,
    /// };
    /// use std::net::Ipv4Addr;
    ///
    /// let mut topology = Topology::new(
    ///     LinkModel::range_threshold(60.0).unwrap(),
    ///     AddressAllocator::new(Ipv4Addr::new(10, 1, 0, 0), 24),
    /// );
    /// let nodes = topology
    ///     .place_nodes([0.0, 50.0, 100.0].map(Position::on_x_axis))
    ///     .unwrap();
    ///
    /// let a = topology.address_of(nodes[0]).unwrap();
    /// let b = topology.address_of(nodes[1]).unwrap();
    /// let c = topology.address_of(nodes[2]).unwrap();
    ///
    /// assert_eq!(c, Ipv4Addr::new(10, 1, 0, 3));
    /// assert!(topology.reachable(a, b));
    /// assert!(!topology.reachable(a, c));
    /// ```
    pub fn new(link_model: LinkModel, allocator: AddressAllocator) -> Self {
        Self {
            nodes: Vec::new(),
            addresses: HashMap::new(),
            link_model,
            allocator,
        }
    }

    /// Place one node per position, in order, each with a single device.
    ///
    /// Returns the identifiers of the new nodes in placement order.
    ///
    /// # Errors
    ///
    /// [`TopologyError::AddressExhausted`] if the address allocator cannot
    /// provide an address for every position. No node is placed then.
    pub fn place_nodes<I>(&mut self, positions: I) -> Result<Vec<NodeId>, TopologyError>
    where
        I: IntoIterator<Item = Position>,
    {
        let positions: Vec<Position> = positions.into_iter().collect();

        let mut allocator = self.allocator.clone();
        let mut addresses = Vec::with_capacity(positions.len());
        for _ in &positions {
            let address = allocator
                .allocate()
                .map_err(|source| TopologyError::AddressExhausted {
                    requested: positions.len(),
                    source,
                })?;
            addresses.push(address);
        }
        self.allocator = allocator;

        let mut ids = Vec::with_capacity(positions.len());
        let mut id = NodeId::new(self.nodes.len() as u64);
        for (position, address) in positions.into_iter().zip(addresses) {
            let mut node = Node::new(id, position);
            node.attach(address);

            tracing::debug!(node = %id, %position, %address, "node placed");

            self.addresses.insert(address, id);
            self.nodes.push(node);
            ids.push(id);
            id = id.next();
        }

        Ok(ids)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    pub fn link_model(&self) -> &LinkModel {
        &self.link_model
    }

    /// the node owning the device with the given `address`
    pub fn node_of(&self, address: Ipv4Addr) -> Option<NodeId> {
        self.addresses.get(&address).copied()
    }

    /// the address of the first device of the node `id`
    pub fn address_of(&self, id: NodeId) -> Option<Ipv4Addr> {
        self.node(id).and_then(Node::primary_address)
    }

    /// Returns `true` if the devices `a` and `b` can exchange packets.
    ///
    /// Unknown addresses are never reachable.
    pub fn reachable(&self, a: Ipv4Addr, b: Ipv4Addr) -> bool {
        match (self.node_of(a), self.node_of(b)) {
            (Some(a), Some(b)) => self.nodes_reachable(a, b),
            _ => false,
        }
    }

    /// Returns `true` if the nodes `a` and `b` can exchange packets.
    pub fn nodes_reachable(&self, a: NodeId, b: NodeId) -> bool {
        match (self.node(a), self.node(b)) {
            (Some(a), Some(b)) => self.link_model.reachable(&a.position(), &b.position()),
            _ => false,
        }
    }

    /// All the pairs of distinct nodes that can hear each other.
    pub fn links(&self) -> Vec<LinkId> {
        let mut links = Vec::new();
        for (i, a) in self.nodes.iter().enumerate() {
            for b in &self.nodes[i + 1..] {
                if self.link_model.reachable(&a.position(), &b.position()) {
                    links.push(LinkId::new((a.id(), b.id())));
                }
            }
        }
        links
    }
}
