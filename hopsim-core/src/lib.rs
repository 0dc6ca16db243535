/*!
# Hop Simulator Core

Deterministic discrete-event primitives to measure short wireless
multi-hop paths: a virtual clock and its [`Scheduler`], nodes placed in
a [`Topology`] under a [`LinkModel`], a [`StaticRouter`], UDP-like
[`TrafficGenerator`]s and a [`FlowMonitor`] reducing packet events into
throughput, delay and loss.

Everything runs on a single logical thread and events due at the same
time run in the order they were scheduled: two runs with the same
configuration give the same results.

[`Scheduler`]: scheduler::Scheduler
[`Topology`]: topology::Topology
[`LinkModel`]: link::LinkModel
[`StaticRouter`]: route::StaticRouter
[`TrafficGenerator`]: traffic::TrafficGenerator
[`FlowMonitor`]: flow::FlowMonitor
*/

pub mod address;
pub mod defaults;
mod error;
pub mod flow;
pub mod link;
pub mod node;
pub mod packet;
pub mod route;
pub mod scenario;
pub mod scheduler;
pub mod sim_context;
pub mod time;
mod time_queue;
pub mod topology;
pub mod traffic;

pub use self::{
    error::SimError,
    link::{LinkId, LinkModel},
    node::{NodeId, Position},
    sim_context::{Simulation, World},
    time::{SimDelay, SimTime},
    time_queue::TimeQueue,
};
