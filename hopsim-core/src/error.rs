use crate::{
    flow::FlowError, route::RouteError, scheduler::ScheduleError, topology::TopologyError,
};
use thiserror::Error;

/// Any error that aborts a simulation run.
///
/// Dropping a packet because a hop is out of reach is not an error: it only
/// shows in the difference between transmitted and received packets.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimError {
    #[error(transparent)]
    Schedule(#[from] ScheduleError),
    #[error(transparent)]
    Route(#[from] RouteError),
    #[error(transparent)]
    Topology(#[from] TopologyError),
    #[error(transparent)]
    Flow(#[from] FlowError),
    #[error("Invalid link model: {0}")]
    LinkModel(#[from] crate::link::LinkModelError),
}
