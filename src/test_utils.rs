use super::geometry::Point2d;
use super::riders::{Rider, RiderId, RiderRequest};
use super::road_graph::RoadGraph;
use super::route::NodeId;
use super::shuttle::Shuttle;


/// Nodes 0, 1, ..., n strung along the x axis, with two-way roads of the given lengths
/// between neighbours.
pub fn line_graph(lengths: &[f64]) -> RoadGraph {
    let mut xx = 0.0;
    let mut nodes = vec![Point2d::new(xx, 0.0)];
    let mut edges = vec![];
    for (ii, length) in lengths.iter().enumerate() {
        xx += length;
        nodes.push(Point2d::new(xx, 0.0));
        edges.push((ii, ii + 1, *length));
        edges.push((ii + 1, ii, *length));
    }
    RoadGraph::new(nodes, edges).unwrap()
}

pub fn idle_shuttle(graph: &RoadGraph, id: usize, node: NodeId, capacity: usize) -> Shuttle {
    Shuttle::new(id, 0.0, capacity, node, 0.0, graph).unwrap()
}

pub fn make_rider(graph: &RoadGraph, id: usize, from: NodeId, to: NodeId, time: f64) -> Rider {
    Rider::from_request(RiderId(id), &RiderRequest::new(from, to, time), graph).unwrap()
}
