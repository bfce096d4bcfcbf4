//! Crate-wide error type.

use std::time::Duration;

use thiserror::Error;

use super::riders::{RiderId, RiderState};
use super::route::NodeId;

/// Errors produced while routing, planning, dispatching, or configuring a simulation.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("no route from {from} to {to}")]
    Unreachable { from: NodeId, to: NodeId },

    #[error("node {0} not found in graph")]
    NodeNotFound(NodeId),

    #[error("graph is not strongly connected ({components} components)")]
    DisconnectedGraph { components: usize },

    #[error("invalid route: {0}")]
    InvalidRoute(String),

    #[error("no shuttle can serve the request")]
    NoFeasiblePlan,

    #[error("shuttle {shuttle} would carry {onboard} riders with capacity {capacity}")]
    CapacityInvariantViolation {
        shuttle: usize,
        onboard: usize,
        capacity: usize,
    },

    #[error("dispatch took {elapsed:?}, limit is {limit:?}")]
    SlowDispatch { elapsed: Duration, limit: Duration },

    #[error("rider {rider} cannot leave state {state:?} that way")]
    InvalidTransition { rider: RiderId, state: RiderState },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] yaml_rust::ScanError),
}

pub type DispatchResult<T> = Result<T, DispatchError>;
