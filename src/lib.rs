// imports of other modules from this crate
mod error;
pub use error::{DispatchError, DispatchResult};

mod geometry;
pub use geometry::Point2d;

mod route;
pub use route::{itinerary_chains, Edge, NodeId, Route};

mod dijkstra;

mod road_graph;
pub use road_graph::RoadGraph;

mod riders;
pub use riders::{Rider, RiderId, RiderRequest, RiderState};

mod evaluator;
pub use evaluator::{CostWeights, Evaluator, Projection};

mod shuttle;
pub use shuttle::{Shuttle, ShuttlePhase};

mod dispatcher;
pub use dispatcher::{best_plan, commit, RoutePlan};

mod config_utils;

mod dispatch_sim;
pub use dispatch_sim::{DispatchSimConfig, DispatchSimulator, SimReport};

#[cfg(test)]
mod test_utils;
