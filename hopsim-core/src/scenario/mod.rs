//! The two measurement set-ups.
//!
//! Both scenarios place a handful of nodes on the x axis, install static
//! routes from the first node to the last one, run one UDP flow between
//! them and report its throughput, delay and loss:
//!
//! - [`sidelink`]: a device-to-device link, direct or through a relay.
//! - [`multihop`]: a chain of 1 to 3 wireless hops.
mod report;

pub mod multihop;
pub mod sidelink;

pub use self::{
    multihop::{MultiHopConfig, MultiHopReport},
    report::{Report, Significant},
    sidelink::{SidelinkConfig, SidelinkMode, SidelinkReport},
};
use crate::{
    SimError, defaults,
    address::AddressAllocator,
    link::LinkModel,
    node::{NodeId, Position},
    route::RouteError,
    sim_context::Simulation,
    time::SimTime,
    topology::Topology,
    traffic::{TrafficConfig, TrafficGenerator},
};
use std::net::Ipv4Addr;

/// Everything a scenario needs to run its single flow.
struct Setup<'a> {
    link_model: LinkModel,
    network: Ipv4Addr,
    /// x coordinates of the nodes, in meters
    positions: &'a [f64],
    /// indices, in `positions`, of the nodes the packets go through
    path: &'a [usize],
    traffic: TrafficConfig,
}

impl Setup<'_> {
    /// Build the topology, install the path from its first to its last
    /// node, run the flow and collect its statistics.
    ///
    /// The source and destination of `traffic` are replaced by the ends of
    /// the path.
    fn run(self) -> Result<Report, SimError> {
        let mut topology = Topology::new(
            self.link_model,
            AddressAllocator::new(self.network, defaults::DEFAULT_PREFIX_LEN),
        );
        let nodes = topology.place_nodes(self.positions.iter().copied().map(Position::on_x_axis))?;
        tracing::debug!(links = ?topology.links(), "topology ready");

        let path = self
            .path
            .iter()
            .map(|index| {
                nodes.get(*index).copied().ok_or(RouteError::UnknownNode {
                    node: NodeId::new(*index as u64),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let (Some(&source), Some(&sink)) = (path.first(), path.last()) else {
            return Err(RouteError::UnknownNode { node: NodeId::ZERO }.into());
        };
        let destination = topology
            .address_of(sink)
            .ok_or(RouteError::UnknownNode { node: sink })?;

        let mut simulation = Simulation::new(topology);
        simulation.install_path(&path, destination)?;

        let traffic = self.traffic.set_endpoints(source, destination);
        let stop = simulation_stop(traffic.stop());
        let generator = TrafficGenerator::new(simulation.world().topology(), traffic)?;
        let flow = generator.install(&mut simulation)?;

        let run = simulation.run(stop)?;
        Ok(Report::collect(&simulation, flow, run))
    }
}

/// the end of the run for a client stopping at `client_stop`
fn simulation_stop(client_stop: SimTime) -> SimTime {
    client_stop
        .checked_add(defaults::SIMULATION_DRAIN)
        .unwrap_or(SimTime::MAX)
}
