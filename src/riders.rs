use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::path::Path;

use rand::Rng;

use super::error::{DispatchError, DispatchResult};
use super::geometry::Point2d;
use super::road_graph::RoadGraph;
use super::route::NodeId;


#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Clone, Copy)]
pub struct RiderId(pub usize);

impl fmt::Display for RiderId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Riders only ever move forward through these states.
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum RiderState {
    // assigned to a shuttle, not yet aboard
    Waiting,
    Riding,
    Done,
}

/// A request for a ride, as it arrives from the outside world.
#[derive(PartialEq, Debug, Clone)]
pub struct RiderRequest {
    pub from: NodeId,
    pub to: NodeId,
    pub arrival_time: f64,
}

// A convenience type for parsing csv data
type Row = HashMap<String, String>;

impl RiderRequest {
    pub fn new(from: NodeId, to: NodeId, arrival_time: f64) -> RiderRequest {
        RiderRequest {from, to, arrival_time}
    }

    /// A request between two distinct random nodes, arriving at a random time in `[0, limit)`.
    pub fn random<R: Rng>(graph: &RoadGraph, rng: &mut R, limit: f64) -> RiderRequest {
        let from = graph.random_node(rng);
        let mut to = graph.random_node(rng);
        while to == from {
            to = graph.random_node(rng);
        }
        let arrival_time = if limit > 0.0 { rng.gen_range(0.0..limit) } else { 0.0 };
        RiderRequest {from, to, arrival_time}
    }

    /// Reads requests from a csv file with `from`, `to`, and `time` columns.  The requests
    /// come back in order of arrival.
    pub fn all_from_csv(csvpath: &Path) -> DispatchResult<Vec<RiderRequest>> {
        let file = File::open(csvpath)?;
        let mut reader = csv::Reader::from_reader(file);
        let mut requests = vec![];
        for (ii, result) in reader.deserialize().enumerate() {
            let row: Row = result?;
            let field = |name: &str| {
                row.get(name).map(|ss| ss.trim()).ok_or_else(|| DispatchError::Config(
                    format!("row {} of {} has no '{}' column", ii, csvpath.display(), name)))
            };
            let bad_value = |name: &str| DispatchError::Config(
                format!("row {} of {} has an invalid '{}'", ii, csvpath.display(), name));

            let from: NodeId = field("from")?.parse().map_err(|_| bad_value("from"))?;
            let to: NodeId = field("to")?.parse().map_err(|_| bad_value("to"))?;
            let arrival_time: f64 = field("time")?.parse().map_err(|_| bad_value("time"))?;
            if !arrival_time.is_finite() || from == to {
                return Err(bad_value("time or destination"));
            }
            requests.push(RiderRequest {from, to, arrival_time});
        }

        // stable, so requests arriving together keep their file order
        requests.sort_by(|aa, bb| aa.arrival_time.total_cmp(&bb.arrival_time));
        Ok(requests)
    }
}


#[derive(PartialEq, Debug, Clone)]
pub struct Rider {
    pub id: RiderId,
    pub from: NodeId,
    pub to: NodeId,
    pub start_time: f64,
    state: RiderState,
    pickup_time: Option<f64>,
    drop_time: Option<f64>,
    position: Point2d,
    // slot among the riders of one shuttle, so they can be drawn side by side
    offset: usize,
    // length of the shortest route from origin to destination
    direct_length: f64,
    shuttle: Option<usize>,
}

impl Rider {
    pub fn new(id: RiderId, from: NodeId, to: NodeId, start_time: f64, direct_length: f64,
               position: Point2d) -> Rider {
        Rider {
            id,
            from,
            to,
            start_time,
            state: RiderState::Waiting,
            pickup_time: None,
            drop_time: None,
            position,
            offset: 0,
            direct_length,
            shuttle: None,
        }
    }

    /// Builds the rider for a request, measuring its direct trip on the graph.
    pub fn from_request(id: RiderId, request: &RiderRequest, graph: &RoadGraph)
                        -> DispatchResult<Rider> {
        let direct_length = graph.shortest_length(request.from, request.to)?;
        let position = graph.location(request.from)?;
        Ok(Rider::new(id, request.from, request.to, request.arrival_time, direct_length,
                      position))
    }

    pub fn state(&self) -> RiderState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state != RiderState::Done
    }

    pub fn pickup_time(&self) -> Option<f64> {
        self.pickup_time
    }

    pub fn drop_time(&self) -> Option<f64> {
        self.drop_time
    }

    pub fn position(&self) -> Point2d {
        self.position
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn direct_length(&self) -> f64 {
        self.direct_length
    }

    pub fn shuttle(&self) -> Option<usize> {
        self.shuttle
    }

    pub fn assign_to(&mut self, shuttle: usize) {
        self.shuttle = Some(shuttle);
    }

    pub fn board(&mut self, time: f64) -> DispatchResult<()> {
        if self.state != RiderState::Waiting {
            return Err(DispatchError::InvalidTransition {rider: self.id, state: self.state});
        }
        self.pickup_time = Some(time);
        self.state = RiderState::Riding;
        Ok(())
    }

    pub fn drop_off(&mut self, time: f64) -> DispatchResult<()> {
        if self.state != RiderState::Riding {
            return Err(DispatchError::InvalidTransition {rider: self.id, state: self.state});
        }
        self.drop_time = Some(time);
        self.state = RiderState::Done;
        Ok(())
    }

    pub(crate) fn move_with_shuttle(&mut self, position: Point2d, offset: usize) {
        self.position = position;
        self.offset = offset;
    }

    pub fn wait_time(&self) -> Option<f64> {
        self.pickup_time.map(|pt| pt - self.start_time)
    }

    pub fn ride_time(&self) -> Option<f64> {
        match (self.pickup_time, self.drop_time) {
            (Some(pt), Some(dt)) => Some(dt - pt),
            _ => None,
        }
    }

    /// Time spent aboard beyond what the direct trip would have taken.
    pub fn detour(&self) -> Option<f64> {
        self.ride_time().map(|rt| rt - self.direct_length)
    }
}

impl fmt::Display for Rider {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:3}:{:?} {}->{}", self.id, self.state, self.from, self.to)
    }
}
