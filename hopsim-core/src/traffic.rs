//! Synthetic UDP traffic.
//!
//! A [`TrafficGenerator`] behaves like a constant bit rate UDP client: from
//! its start time it sends one datagram of a fixed size every interval,
//! until it has sent `max_packets` datagrams or reached its stop time.
//!
//! Each datagram is accounted by the [`FlowMonitor`] when it leaves the
//! source, then walked along the static routes with [`deliver_along_path`].
//! Hops take no simulated time: the packet either reaches its destination
//! during the emission event or is silently dropped on the way.
//!
//! [`FlowMonitor`]: crate::flow::FlowMonitor
use crate::{
    SimError, defaults,
    flow::FiveTuple,
    node::NodeId,
    packet::Packet,
    route::{RouteError, StaticRouter},
    scheduler::Scheduler,
    sim_context::{Simulation, World},
    time::{SimDelay, SimTime},
    topology::Topology,
};
use std::net::Ipv4Addr;

/// Configuration of a [`TrafficGenerator`].
///
/// ## Defaults
///
/// | Setting | Default |
/// |---------|---------|
/// | Source port | 49153 |
/// | Destination port | 5000 |
/// | Packet size | 1400 bytes |
/// | Interval | 100µs |
/// | Max packets | 2 000 000 |
/// | Start | 0s |
/// | Stop | never |
#[derive(Debug, Clone, PartialEq)]
pub struct TrafficConfig {
    source: NodeId,
    destination: Ipv4Addr,
    source_port: u16,
    destination_port: u16,
    packet_size: u64,
    interval: SimDelay,
    max_packets: u64,
    start: SimTime,
    stop: SimTime,
}

/// A periodic sender. See the [module](self) documentation.
#[derive(Debug, Clone)]
pub struct TrafficGenerator {
    config: TrafficConfig,

    flow: FiveTuple,

    /// number of datagrams sent so far
    sent: u64,
}

/// What happened to a packet walked along its path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// The packet reached the node owning its destination address after
    /// `hops` wireless hops.
    Delivered { hops: u32 },
    /// The packet was silently dropped at node `at`.
    Dropped { at: NodeId, reason: DropReason },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// the next hop given by the route table is out of reach
    Unreachable { next_hop: Ipv4Addr },
    /// the packet was forwarded too many times
    TtlExpired,
}

impl TrafficConfig {
    pub fn new(source: NodeId, destination: Ipv4Addr) -> Self {
        Self {
            source,
            destination,
            source_port: defaults::DEFAULT_SOURCE_PORT,
            destination_port: defaults::DEFAULT_DESTINATION_PORT,
            packet_size: defaults::SIDELINK_PACKET_SIZE,
            interval: SimDelay::from_micros_f64(defaults::SIDELINK_INTERVAL_US),
            max_packets: defaults::DEFAULT_MAX_PACKETS,
            start: SimTime::ZERO,
            stop: SimTime::MAX,
        }
    }

    pub fn set_endpoints(mut self, source: NodeId, destination: Ipv4Addr) -> Self {
        self.source = source;
        self.destination = destination;
        self
    }

    pub fn set_ports(mut self, source_port: u16, destination_port: u16) -> Self {
        self.source_port = source_port;
        self.destination_port = destination_port;
        self
    }

    /// Set the application payload of every datagram, in bytes.
    pub fn set_packet_size(mut self, packet_size: u64) -> Self {
        self.packet_size = packet_size;
        self
    }

    /// Set the time between two datagrams.
    ///
    /// A negative interval is accepted here and rejected by the scheduler
    /// when the second datagram is due.
    pub fn set_interval(mut self, interval: SimDelay) -> Self {
        self.interval = interval;
        self
    }

    pub fn set_max_packets(mut self, max_packets: u64) -> Self {
        self.max_packets = max_packets;
        self
    }

    /// Send from `start` (included) to `stop` (excluded).
    pub fn set_window(mut self, start: SimTime, stop: SimTime) -> Self {
        self.start = start;
        self.stop = stop;
        self
    }

    pub fn source(&self) -> NodeId {
        self.source
    }

    pub fn destination(&self) -> Ipv4Addr {
        self.destination
    }

    pub fn packet_size(&self) -> u64 {
        self.packet_size
    }

    pub fn interval(&self) -> SimDelay {
        self.interval
    }

    pub fn max_packets(&self) -> u64 {
        self.max_packets
    }

    pub fn start(&self) -> SimTime {
        self.start
    }

    pub fn stop(&self) -> SimTime {
        self.stop
    }
}

impl TrafficGenerator {
    /// Create the generator, resolving the address of its source node.
    ///
    /// # Errors
    ///
    /// [`RouteError::UnknownNode`] if the source is not in the topology.
    pub fn new(topology: &Topology, config: TrafficConfig) -> Result<Self, RouteError> {
        let source = topology
            .address_of(config.source)
            .ok_or(RouteError::UnknownNode {
                node: config.source,
            })?;
        let flow = FiveTuple::udp(
            source,
            config.source_port,
            config.destination,
            config.destination_port,
        );
        Ok(Self {
            config,
            flow,
            sent: 0,
        })
    }

    /// the five-tuple every datagram of this generator is tagged with
    pub fn flow(&self) -> FiveTuple {
        self.flow
    }

    pub fn config(&self) -> &TrafficConfig {
        &self.config
    }

    /// Schedule the first emission at the start time.
    ///
    /// Returns the flow of the generator so the caller can look its
    /// statistics up after the run.
    ///
    /// # Errors
    ///
    /// [`ScheduleError::CausalityViolation`] if the start time is already
    /// in the past.
    ///
    /// [`ScheduleError::CausalityViolation`]: crate::scheduler::ScheduleError::CausalityViolation
    pub fn install(self, simulation: &mut Simulation) -> Result<FiveTuple, SimError> {
        let flow = self.flow;
        let start = self.config.start;
        tracing::debug!(
            %flow,
            %start,
            stop = %self.config.stop,
            interval = %self.config.interval,
            packet_size = self.config.packet_size,
            "traffic generator installed"
        );
        simulation
            .scheduler_mut()
            .schedule_at(start, move |world, scheduler| self.emit(world, scheduler))?;
        Ok(flow)
    }

    fn emit(mut self, world: &mut World, scheduler: &mut Scheduler<World>) -> Result<(), SimError> {
        let now = scheduler.now();
        if self.sent >= self.config.max_packets || now >= self.config.stop {
            tracing::debug!(flow = %self.flow, sent = self.sent, %now, "traffic generator done");
            return Ok(());
        }

        let id = world.packet_ids().generate();
        let mut packet = Packet::new(id, self.flow, self.sent, now, self.config.packet_size);
        self.sent += 1;

        let (topology, router, monitor) = world.split();
        monitor.record_tx(packet.flow(), now, packet.wire_bytes());

        match deliver_along_path(topology, router, self.config.source, &mut packet)? {
            Delivery::Delivered { hops } => {
                for _ in 1..hops {
                    monitor.record_forward(packet.flow());
                }
                let delay = now.delay_since(packet.sent_at());
                monitor.record_rx(packet.flow(), now, packet.wire_bytes(), delay)?;
            }
            Delivery::Dropped { at, reason } => {
                tracing::trace!(
                    packet = %packet.id(),
                    flow = %packet.flow(),
                    sequence = packet.sequence(),
                    node = %at,
                    ?reason,
                    "packet dropped"
                );
            }
        }

        let interval = self.config.interval;
        scheduler.schedule(interval, move |world, scheduler| self.emit(world, scheduler))?;
        Ok(())
    }
}

/// Walk `packet` from `source` along the static routes towards its
/// destination address.
///
/// At every node the route table gives the next hop; the hop is taken only
/// if the link model says the two devices can hear each other, otherwise
/// the packet is dropped. A packet that runs out of time to live is dropped
/// as well.
///
/// # Errors
///
/// - [`RouteError::NoRoute`] if a node on the way has no entry for the
///   destination.
/// - [`RouteError::UnknownNode`] if `source` is not in the topology.
pub fn deliver_along_path(
    topology: &Topology,
    router: &StaticRouter,
    source: NodeId,
    packet: &mut Packet,
) -> Result<Delivery, RouteError> {
    let destination = packet.flow().destination;
    let mut current = source;
    let mut hops = 0;

    loop {
        let node = topology
            .node(current)
            .ok_or(RouteError::UnknownNode { node: current })?;
        if node.owns(destination) {
            return Ok(Delivery::Delivered { hops });
        }

        let next_hop = router.next_hop(current, destination)?;
        let reachable = node
            .primary_address()
            .is_some_and(|from| topology.reachable(from, next_hop));
        let next = match topology.node_of(next_hop) {
            Some(next) if reachable => next,
            _ => {
                return Ok(Delivery::Dropped {
                    at: current,
                    reason: DropReason::Unreachable { next_hop },
                });
            }
        };

        if !packet.take_hop() {
            return Ok(Delivery::Dropped {
                at: current,
                reason: DropReason::TtlExpired,
            });
        }
        hops += 1;
        current = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        address::AddressAllocator,
        link::LinkModel,
        node::Position,
        packet::PacketIdGenerator,
        scheduler::ScheduleError,
    };

    fn line(spacings: &[f64], model: LinkModel) -> (Simulation, Vec<NodeId>) {
        let mut topology = Topology::new(model, AddressAllocator::default());
        let nodes = topology
            .place_nodes(spacings.iter().copied().map(Position::on_x_axis))
            .unwrap();
        (Simulation::new(topology), nodes)
    }

    fn address(simulation: &Simulation, node: NodeId) -> Ipv4Addr {
        simulation.world().topology().address_of(node).unwrap()
    }

    fn packet_to(simulation: &Simulation, from: NodeId, to: NodeId) -> Packet {
        let flow = FiveTuple::udp(address(simulation, from), 1, address(simulation, to), 2);
        Packet::new(PacketIdGenerator::new().generate(), flow, 0, SimTime::ZERO, 100)
    }

    #[test]
    fn delivers_hop_by_hop() {
        let (mut simulation, nodes) = line(&[0.0, 50.0, 100.0, 150.0], LinkModel::default());
        let destination = address(&simulation, nodes[3]);
        simulation.install_path(&nodes, destination).unwrap();

        let mut packet = packet_to(&simulation, nodes[0], nodes[3]);
        let world = simulation.world();
        let delivery =
            deliver_along_path(world.topology(), world.router(), nodes[0], &mut packet).unwrap();

        assert_eq!(delivery, Delivery::Delivered { hops: 3 });
        assert_eq!(packet.ttl(), defaults::DEFAULT_TTL - 3);
    }

    #[test]
    fn local_destination_takes_no_hop() {
        let (simulation, nodes) = line(&[0.0], LinkModel::default());
        let mut packet = packet_to(&simulation, nodes[0], nodes[0]);
        let world = simulation.world();

        assert_eq!(
            deliver_along_path(world.topology(), world.router(), nodes[0], &mut packet),
            Ok(Delivery::Delivered { hops: 0 })
        );
    }

    #[test]
    fn missing_route_is_an_error() {
        let (simulation, nodes) = line(&[0.0, 40.0, 80.0], LinkModel::default());
        let mut packet = packet_to(&simulation, nodes[0], nodes[2]);
        let world = simulation.world();

        assert_eq!(
            deliver_along_path(world.topology(), world.router(), nodes[0], &mut packet),
            Err(RouteError::NoRoute {
                node: nodes[0],
                destination: address(&simulation, nodes[2]),
            })
        );
    }

    #[test]
    fn unreachable_hop_drops_silently() {
        let (mut simulation, nodes) =
            line(&[0.0, 40.0, 80.0], LinkModel::range_threshold(50.0).unwrap());
        let destination = address(&simulation, nodes[2]);
        // a manual entry skipping the relay, bypassing the path validation
        simulation
            .world_mut()
            .router_mut()
            .add_host_route(nodes[0], destination, destination);

        let mut packet = packet_to(&simulation, nodes[0], nodes[2]);
        let world = simulation.world();

        assert_eq!(
            deliver_along_path(world.topology(), world.router(), nodes[0], &mut packet),
            Ok(Delivery::Dropped {
                at: nodes[0],
                reason: DropReason::Unreachable {
                    next_hop: destination
                },
            })
        );
    }

    #[test]
    fn routing_loop_expires() {
        let (mut simulation, nodes) = line(&[0.0, 40.0, 80.0], LinkModel::default());
        let destination = address(&simulation, nodes[2]);
        let relay = address(&simulation, nodes[1]);
        let source = address(&simulation, nodes[0]);
        let router = simulation.world_mut().router_mut();
        router.add_host_route(nodes[0], destination, relay);
        router.add_host_route(nodes[1], destination, source);

        let mut packet = packet_to(&simulation, nodes[0], nodes[2]).with_ttl(5);
        let world = simulation.world();

        let delivery =
            deliver_along_path(world.topology(), world.router(), nodes[0], &mut packet).unwrap();
        assert!(matches!(
            delivery,
            Delivery::Dropped {
                reason: DropReason::TtlExpired,
                ..
            }
        ));
    }

    #[test]
    fn sends_every_interval_within_window() {
        let (mut simulation, nodes) = line(&[0.0, 50.0], LinkModel::default());
        let destination = address(&simulation, nodes[1]);
        simulation.install_path(&nodes, destination).unwrap();

        let config = TrafficConfig::new(nodes[0], destination)
            .set_interval(SimDelay::from_millis(100))
            .set_packet_size(972)
            .set_window(SimTime::from_secs(1), SimTime::from_secs(2));
        let generator = TrafficGenerator::new(simulation.world().topology(), config).unwrap();
        let flow = generator.install(&mut simulation).unwrap();

        simulation.run(SimTime::from_secs(5)).unwrap();

        let record = simulation.world().monitor().record(&flow).unwrap();
        // 1.0, 1.1, ..., 1.9: the emission due at the stop time is not sent
        assert_eq!(record.tx_packets, 10);
        assert_eq!(record.rx_packets, 10);
        assert_eq!(record.tx_bytes, 10 * 1000);
        assert_eq!(record.time_first_tx, Some(SimTime::from_secs(1)));
        assert_eq!(record.time_last_rx, Some(SimTime::from_millis(1900)));
        assert_eq!(record.times_forwarded, 0);
    }

    #[test]
    fn max_packets_bounds_the_flow() {
        let (mut simulation, nodes) = line(&[0.0, 50.0, 100.0], LinkModel::default());
        let destination = address(&simulation, nodes[2]);
        simulation.install_path(&nodes, destination).unwrap();

        let config = TrafficConfig::new(nodes[0], destination)
            .set_interval(SimDelay::from_micros(10))
            .set_max_packets(7);
        let generator = TrafficGenerator::new(simulation.world().topology(), config).unwrap();
        let flow = generator.install(&mut simulation).unwrap();

        simulation.run(SimTime::from_secs(1)).unwrap();

        let record = simulation.world().monitor().record(&flow).unwrap();
        assert_eq!(record.tx_packets, 7);
        assert_eq!(record.rx_packets, 7);
        // the relay forwards every packet once
        assert_eq!(record.times_forwarded, 7);
    }

    #[test]
    fn negative_interval_aborts() {
        let (mut simulation, nodes) = line(&[0.0, 50.0], LinkModel::default());
        let destination = address(&simulation, nodes[1]);
        simulation.install_path(&nodes, destination).unwrap();

        let config = TrafficConfig::new(nodes[0], destination)
            .set_interval(SimDelay::from_micros(-100))
            .set_window(SimTime::from_secs(1), SimTime::from_secs(2));
        TrafficGenerator::new(simulation.world().topology(), config)
            .unwrap()
            .install(&mut simulation)
            .unwrap();

        let error = simulation.run(SimTime::from_secs(5)).unwrap_err();
        assert_eq!(
            error,
            SimError::Schedule(ScheduleError::InvalidDelay {
                delay: SimDelay::from_micros(-100)
            })
        );
    }

    #[test]
    fn start_in_the_past_is_rejected() {
        let (mut simulation, nodes) = line(&[0.0, 50.0], LinkModel::default());
        simulation.run(SimTime::from_secs(3)).unwrap();
        let destination = address(&simulation, nodes[1]);

        let config = TrafficConfig::new(nodes[0], destination)
            .set_window(SimTime::from_secs(1), SimTime::from_secs(2));
        let error = TrafficGenerator::new(simulation.world().topology(), config)
            .unwrap()
            .install(&mut simulation)
            .unwrap_err();

        assert!(matches!(
            error,
            SimError::Schedule(ScheduleError::CausalityViolation { .. })
        ));
    }

    #[test]
    fn unknown_source() {
        let (simulation, _) = line(&[0.0], LinkModel::default());
        let ghost = NodeId::new(9);
        let config = TrafficConfig::new(ghost, Ipv4Addr::new(10, 0, 0, 1));

        assert!(matches!(
            TrafficGenerator::new(simulation.world().topology(), config),
            Err(RouteError::UnknownNode { node }) if node == ghost
        ));
    }
}
