//! Static host routes.
//!
//! The [`StaticRouter`] holds, for every node, the next hop towards a
//! destination address. Entries are written once, before the traffic
//! starts, and never revised: there is no failure detection and no
//! re-routing during a run.
use crate::{node::NodeId, topology::Topology};
use std::{collections::BTreeMap, fmt, net::Ipv4Addr};
use thiserror::Error;

/// Error returned when installing or resolving a route.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    /// Two consecutive nodes of a path cannot hear each other.
    #[error("Path is disconnected: node {from} cannot reach node {to}")]
    DisconnectedPath { from: NodeId, to: NodeId },
    /// No entry for this destination was installed at this node.
    #[error("Node {node} has no route to {destination}")]
    NoRoute { node: NodeId, destination: Ipv4Addr },
    /// The node is not part of the topology.
    #[error("Node ({node}) Not Found")]
    UnknownNode { node: NodeId },
}

/// One forwarding entry: at `node`, packets for `destination` go to
/// `next_hop`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RouteEntry {
    pub node: NodeId,
    pub destination: Ipv4Addr,
    pub next_hop: Ipv4Addr,
}

#[derive(Debug, Default)]
pub struct StaticRouter {
    table: BTreeMap<(NodeId, Ipv4Addr), Ipv4Addr>,
}

impl StaticRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install host routes to `destination` along `path`.
    ///
    /// Every node but the last gets one entry pointing to the address of the
    /// node that follows it. The path is validated before anything is
    /// written: on error the table is left unchanged.
    ///
    /// Returns the number of entries written, `path.len() - 1`.
    ///
    /// # Errors
    ///
    /// - [`RouteError::UnknownNode`] if a node of `path` is not in the topology.
    /// - [`RouteError::DisconnectedPath`] if two consecutive nodes are not
    ///   reachable according to the link model.
    ///
    /// # Example
    ///
    /// ```
    /// use hopsim_core::{
    ///     address::AddressAllocator, link::LinkModel, node::Position, route::StaticRouter,
    ///     topology::Topology,
    /// };
    ///
    /// let mut topology = Topology::new(LinkModel::default(), AddressAllocator::default());
    /// let nodes = topology
    ///     .place_nodes([0.0, 40.0, 80.0].map(Position::on_x_axis))
    ///     .unwrap();
    /// let ue2 = topology.address_of(nodes[2]).unwrap();
    ///
    /// let mut router = StaticRouter::new();
    /// assert_eq!(router.install_path(&topology, &nodes, ue2).unwrap(), 2);
    ///
    /// let relay = topology.address_of(nodes[1]).unwrap();
    /// assert_eq!(router.next_hop(nodes[0], ue2).unwrap(), relay);
    /// assert_eq!(router.next_hop(nodes[1], ue2).unwrap(), ue2);
    /// ```
    pub fn install_path(
        &mut self,
        topology: &Topology,
        path: &[NodeId],
        destination: Ipv4Addr,
    ) -> Result<usize, RouteError> {
        let mut entries = Vec::with_capacity(path.len().saturating_sub(1));

        for pair in path.windows(2) {
            let (from, to) = (pair[0], pair[1]);
            if topology.node(from).is_none() {
                return Err(RouteError::UnknownNode { node: from });
            }
            let next_hop = topology
                .address_of(to)
                .ok_or(RouteError::UnknownNode { node: to })?;
            if !topology.nodes_reachable(from, to) {
                return Err(RouteError::DisconnectedPath { from, to });
            }
            entries.push(RouteEntry {
                node: from,
                destination,
                next_hop,
            });
        }

        let installed = entries.len();
        for entry in entries {
            self.add_host_route(entry.node, entry.destination, entry.next_hop);
        }
        Ok(installed)
    }

    /// Write a single entry, replacing any previous entry for the same
    /// node and destination. No validation is performed.
    pub fn add_host_route(&mut self, node: NodeId, destination: Ipv4Addr, next_hop: Ipv4Addr) {
        tracing::debug!(%node, %destination, %next_hop, "host route installed");
        self.table.insert((node, destination), next_hop);
    }

    /// The next hop towards `destination` from `node`.
    ///
    /// # Errors
    ///
    /// [`RouteError::NoRoute`] if no entry was installed for this pair.
    pub fn next_hop(&self, node: NodeId, destination: Ipv4Addr) -> Result<Ipv4Addr, RouteError> {
        self.table
            .get(&(node, destination))
            .copied()
            .ok_or(RouteError::NoRoute { node, destination })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.table.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// All the entries, ordered by node then destination.
    pub fn entries(&self) -> impl Iterator<Item = RouteEntry> + '_ {
        self.table
            .iter()
            .map(|(&(node, destination), &next_hop)| RouteEntry {
                node,
                destination,
                next_hop,
            })
    }
}

impl fmt::Display for RouteEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "node {}: {} via {}",
            self.node, self.destination, self.next_hop
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{address::AddressAllocator, link::LinkModel, node::Position};

    fn chain(len: usize, spacing: f64, model: LinkModel) -> (Topology, Vec<NodeId>) {
        let mut topology = Topology::new(model, AddressAllocator::default());
        let nodes = topology
            .place_nodes((0..len).map(|i| Position::on_x_axis(spacing * i as f64)))
            .unwrap();
        (topology, nodes)
    }

    #[test]
    fn path_of_length_l_installs_l_minus_1_entries() {
        for len in 1..=5 {
            let (topology, nodes) = chain(len, 50.0, LinkModel::default());
            let destination = topology.address_of(*nodes.last().unwrap()).unwrap();

            let mut router = StaticRouter::new();
            let installed = router.install_path(&topology, &nodes, destination).unwrap();

            assert_eq!(installed, len - 1);
            assert_eq!(router.len(), len - 1);

            for pair in nodes.windows(2) {
                assert_eq!(
                    router.next_hop(pair[0], destination).unwrap(),
                    topology.address_of(pair[1]).unwrap()
                );
            }
        }
    }

    #[test]
    fn disconnected_path_installs_nothing() {
        let (topology, nodes) = chain(3, 80.0, LinkModel::range_threshold(60.0).unwrap());
        let destination = topology.address_of(nodes[2]).unwrap();

        let mut router = StaticRouter::new();
        let error = router
            .install_path(&topology, &nodes, destination)
            .unwrap_err();

        assert_eq!(
            error,
            RouteError::DisconnectedPath {
                from: nodes[0],
                to: nodes[1],
            }
        );
        assert!(router.is_empty());
    }

    #[test]
    fn skipping_the_relay_is_checked_too() {
        let (topology, nodes) = chain(3, 40.0, LinkModel::range_threshold(60.0).unwrap());
        let destination = topology.address_of(nodes[2]).unwrap();

        let mut router = StaticRouter::new();
        assert_eq!(
            router.install_path(&topology, &[nodes[0], nodes[2]], destination),
            Err(RouteError::DisconnectedPath {
                from: nodes[0],
                to: nodes[2],
            })
        );
    }

    #[test]
    fn unknown_node() {
        let (topology, nodes) = chain(2, 10.0, LinkModel::default());
        let destination = topology.address_of(nodes[1]).unwrap();
        let ghost = NodeId::new(42);

        let mut router = StaticRouter::new();
        assert_eq!(
            router.install_path(&topology, &[nodes[0], ghost], destination),
            Err(RouteError::UnknownNode { node: ghost })
        );
        assert_eq!(
            router.install_path(&topology, &[ghost, nodes[0]], destination),
            Err(RouteError::UnknownNode { node: ghost })
        );
    }

    #[test]
    fn no_route() {
        let router = StaticRouter::new();
        let destination = Ipv4Addr::new(10, 0, 0, 3);
        assert_eq!(
            router.next_hop(NodeId::ZERO, destination),
            Err(RouteError::NoRoute {
                node: NodeId::ZERO,
                destination,
            })
        );
    }

    #[test]
    fn entries_are_sorted() {
        let (topology, nodes) = chain(4, 50.0, LinkModel::default());
        let destination = topology.address_of(nodes[3]).unwrap();
        let mut router = StaticRouter::new();
        router.install_path(&topology, &nodes, destination).unwrap();

        let listed: Vec<NodeId> = router.entries().map(|entry| entry.node).collect();
        assert_eq!(listed, nodes[..3].to_vec());
        assert_eq!(
            router.entries().next().unwrap().to_string(),
            "node 0: 10.0.0.4 via 10.0.0.2"
        );
    }
}
