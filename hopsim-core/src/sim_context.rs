use crate::{
    SimError,
    flow::FlowMonitor,
    packet::PacketIdGenerator,
    route::StaticRouter,
    scheduler::{RunSummary, Scheduler},
    time::SimTime,
    topology::Topology,
};
use std::net::Ipv4Addr;

/// Everything the events of a run act upon.
///
/// The topology and the route table are only read once the traffic has
/// started; the flow monitor is updated by every emission.
pub struct World {
    topology: Topology,

    router: StaticRouter,

    monitor: FlowMonitor,

    packet_ids: PacketIdGenerator,
}

/// One simulation run: the [`Scheduler`] and the [`World`] it drives.
///
/// There is no global state, every run owns its own clock.
///
/// ```
/// use hopsim_core::{
///     address::AddressAllocator, link::LinkModel, node::Position, sim_context::Simulation,
///     time::SimTime, topology::Topology,
/// };
///
/// let mut topology = Topology::new(LinkModel::default(), AddressAllocator::default());
/// let nodes = topology
///     .place_nodes([0.0, 50.0].map(Position::on_x_axis))
///     .unwrap();
///
/// let mut simulation = Simulation::new(topology);
/// let destination = simulation.world().topology().address_of(nodes[1]).unwrap();
/// simulation.install_path(&nodes, destination).unwrap();
///
/// let summary = simulation.run(SimTime::from_secs(1)).unwrap();
/// assert_eq!(summary.executed, 0);
/// assert_eq!(simulation.now(), SimTime::from_secs(1));
/// ```
pub struct Simulation {
    scheduler: Scheduler<World>,

    world: World,
}

impl World {
    pub fn new(topology: Topology) -> Self {
        Self {
            topology,
            router: StaticRouter::new(),
            monitor: FlowMonitor::new(),
            packet_ids: PacketIdGenerator::new(),
        }
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    pub fn router(&self) -> &StaticRouter {
        &self.router
    }

    pub fn router_mut(&mut self) -> &mut StaticRouter {
        &mut self.router
    }

    pub fn monitor(&self) -> &FlowMonitor {
        &self.monitor
    }

    pub fn packet_ids(&mut self) -> &mut PacketIdGenerator {
        &mut self.packet_ids
    }

    /// borrow the read-only topology and route table next to the mutable
    /// flow monitor
    pub(crate) fn split(&mut self) -> (&Topology, &StaticRouter, &mut FlowMonitor) {
        (&self.topology, &self.router, &mut self.monitor)
    }
}

impl Simulation {
    pub fn new(topology: Topology) -> Self {
        Self {
            scheduler: Scheduler::new(),
            world: World::new(topology),
        }
    }

    #[inline]
    pub fn now(&self) -> SimTime {
        self.scheduler.now()
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn scheduler_mut(&mut self) -> &mut Scheduler<World> {
        &mut self.scheduler
    }

    /// Install the static routes to `destination` along `path`.
    ///
    /// See [`StaticRouter::install_path`].
    pub fn install_path(
        &mut self,
        path: &[crate::node::NodeId],
        destination: Ipv4Addr,
    ) -> Result<usize, SimError> {
        let World {
            topology, router, ..
        } = &mut self.world;
        Ok(router.install_path(topology, path, destination)?)
    }

    /// Run the scheduler until `stop` (see [`Scheduler::run`]).
    pub fn run(&mut self, stop: SimTime) -> Result<RunSummary, SimError> {
        self.scheduler.run(&mut self.world, stop)
    }
}
