// The road network shared by every shuttle.  A thin wrapper around a petgraph graph that
// answers shortest-route queries and hands out random patrol walks.
use std::collections::BTreeSet;

use petgraph::algo::kosaraju_scc;
use petgraph::graph::NodeIndex;
use rand::Rng;
use rand::seq::SliceRandom;

use super::dijkstra::{dijkstra_with_paths, unwind_path, RoadDiGraph};
use super::error::{DispatchError, DispatchResult};
use super::geometry::Point2d;
use super::riders::RiderId;
use super::route::{Edge, NodeId, Route};


const DEFAULT_PATROL_HOPS: usize = 4;

#[derive(Debug, Clone)]
pub struct RoadGraph {
    network: RoadDiGraph,
    // upper bound on the number of edges in a random patrol walk
    patrol_hops: usize,
}

impl RoadGraph {
    /// Builds a graph from node positions (node ids are indices into `nodes`) and directed
    /// `(from, to, length)` edges.  The result must be strongly connected, so that every
    /// shortest-route query has an answer.
    pub fn new(nodes: Vec<Point2d>, edges: Vec<(NodeId, NodeId, f64)>)
               -> DispatchResult<RoadGraph> {
        if nodes.len() < 2 {
            return Err(DispatchError::Config(
                String::from("a road graph needs at least two nodes")));
        }

        let mut network = RoadDiGraph::with_capacity(nodes.len(), edges.len());
        for pos in nodes {
            network.add_node(pos);
        }
        for (from, to, length) in edges {
            for node in &[from, to] {
                if *node >= network.node_count() {
                    return Err(DispatchError::NodeNotFound(*node));
                }
            }
            if from == to {
                // self-loops are never part of a useful route
                continue;
            }
            if !(length > 0.0) {
                return Err(DispatchError::InvalidRoute(
                    format!("edge {}->{} has non-positive length {}", from, to, length)));
            }
            network.add_edge(NodeIndex::new(from), NodeIndex::new(to),
                             Edge::new(from, to, length));
        }

        let comps = kosaraju_scc(&network);
        if comps.len() > 1 {
            log::warn!("there are {} strongly connected components", comps.len());
            return Err(DispatchError::DisconnectedGraph {components: comps.len()});
        }

        Ok(RoadGraph {network, patrol_hops: DEFAULT_PATROL_HOPS})
    }

    /// A `width` x `height` grid of nodes `unit` apart, with two-way roads between
    /// horizontal and vertical neighbours.  Each node is shifted by up to `jitter` along
    /// each axis; road lengths are the straight-line distances between the shifted nodes.
    pub fn grid<R: Rng>(width: usize, height: usize, unit: f64, jitter: f64, rng: &mut R)
                        -> DispatchResult<RoadGraph> {
        if !(unit > 0.0) || jitter < 0.0 {
            return Err(DispatchError::Config(
                format!("grid unit must be positive and jitter non-negative, got {} and {}",
                        unit, jitter)));
        }

        let mut nodes = Vec::with_capacity(width * height);
        for row in 0..height {
            for col in 0..width {
                let mut pos = Point2d::new(col as f64 * unit, row as f64 * unit);
                if jitter > 0.0 {
                    let offset = Point2d::new(rng.gen_range(-jitter..=jitter),
                                              rng.gen_range(-jitter..=jitter));
                    pos = pos.plus(&offset);
                }
                nodes.push(pos);
            }
        }

        let mut edges = vec![];
        let mut connect = |aa: NodeId, bb: NodeId| {
            let length = nodes[aa].euclidean_distance(&nodes[bb]);
            edges.push((aa, bb, length));
            edges.push((bb, aa, length));
        };
        for row in 0..height {
            for col in 0..width {
                let node = row * width + col;
                if col + 1 < width {
                    connect(node, node + 1);
                }
                if row + 1 < height {
                    connect(node, node + width);
                }
            }
        }

        RoadGraph::new(nodes, edges)
    }

    pub fn with_patrol_hops(mut self, patrol_hops: usize) -> RoadGraph {
        self.patrol_hops = patrol_hops.max(1);
        self
    }

    pub fn node_count(&self) -> usize {
        self.network.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.network.edge_count()
    }

    pub fn location(&self, node: NodeId) -> DispatchResult<Point2d> {
        self.network.node_weight(NodeIndex::new(node))
            .copied()
            .ok_or(DispatchError::NodeNotFound(node))
    }

    pub fn random_node<R: Rng>(&self, rng: &mut R) -> NodeId {
        rng.gen_range(0..self.node_count())
    }

    fn check_node(&self, node: NodeId) -> DispatchResult<NodeIndex> {
        if node < self.node_count() {
            Ok(NodeIndex::new(node))
        } else {
            Err(DispatchError::NodeNotFound(node))
        }
    }

    /// The shortest route between two distinct nodes.
    pub fn shortest_route(&self, from: NodeId, to: NodeId) -> DispatchResult<Route> {
        let start = self.check_node(from)?;
        let goal = self.check_node(to)?;
        if start == goal {
            return Err(DispatchError::InvalidRoute(
                format!("route from {} to itself would be empty", from)));
        }

        let (_, edges_used) = dijkstra_with_paths(&self.network, start, Some(goal),
                                                  |ee| ee.weight().length);
        match unwind_path(&edges_used, start, goal) {
            Some(path) => Route::new(path),
            None => Err(DispatchError::Unreachable {from, to}),
        }
    }

    /// As `shortest_route`, tagging the route with `pickups` plus `rider`, if one is given,
    /// as boarding at its origin.
    pub fn route_with_pickups(&self, from: NodeId, to: NodeId, rider: Option<RiderId>,
                              pickups: &BTreeSet<RiderId>) -> DispatchResult<Route> {
        let route = self.shortest_route(from, to)?;
        Ok(route.with_pickups(pickups.iter().copied().chain(rider)))
    }

    /// Length of the shortest route between two nodes; zero if they are the same node.
    pub fn shortest_length(&self, from: NodeId, to: NodeId) -> DispatchResult<f64> {
        if from == to {
            self.check_node(from)?;
            return Ok(0.0);
        }
        Ok(self.shortest_route(from, to)?.length())
    }

    /// A short random walk from `from` (or from a random node) for a shuttle with nothing
    /// to do.  Takes between one and `patrol_hops` edges, and avoids doubling straight back
    /// along the edge it just drove whenever another road is available.
    pub fn random_route<R: Rng>(&self, from: Option<NodeId>, rng: &mut R)
                                -> DispatchResult<Route> {
        let start = match from {
            Some(node) => node,
            None => self.random_node(rng),
        };
        let mut node = self.check_node(start)?;
        let num_hops = rng.gen_range(1..=self.patrol_hops);
        let mut path: Vec<Edge> = Vec::with_capacity(num_hops);

        for _ in 0..num_hops {
            // sort so that the choice depends only on the rng, not on storage order
            let mut options: Vec<Edge> = self.network.edges(node).map(|ee| *ee.weight())
                                                                .collect();
            options.sort_by_key(|ee| ee.to);
            if let Some(last) = path.last() {
                if options.len() > 1 {
                    options.retain(|ee| ee.to != last.from);
                }
            }
            let next = match options.choose(rng) {
                Some(edge) => *edge,
                None => break,
            };
            path.push(next);
            node = NodeIndex::new(next.to);
        }

        if path.is_empty() {
            return Err(DispatchError::Unreachable {from: start, to: start});
        }
        Route::new(path)
    }
}


#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use approx::assert_relative_eq;
    use petgraph::algo::dijkstra;
    use rand::SeedableRng;
    use rand_isaac::IsaacRng;

    use super::*;
    use super::super::route::itinerary_chains;
    use super::super::test_utils::line_graph;

    #[test]
    fn test_shortest_route_on_line() {
        let graph = line_graph(&[1.0, 1.0]);
        let route = graph.shortest_route(0, 2).unwrap();
        assert_eq!(route.edges(), &[Edge::new(0, 1, 1.0), Edge::new(1, 2, 1.0)]);
        assert_relative_eq!(route.length(), 2.0);
        assert!(route.pickups().is_empty());

        match graph.shortest_route(0, 0) {
            Err(DispatchError::InvalidRoute(_)) => (),
            other => panic!("expected an invalid route, got {:?}", other),
        }
        match graph.shortest_route(0, 9) {
            Err(DispatchError::NodeNotFound(9)) => (),
            other => panic!("expected a missing node, got {:?}", other),
        }
    }

    #[test]
    fn test_route_with_pickups() {
        let graph = line_graph(&[1.0, 1.0]);
        let existing: BTreeSet<RiderId> = [RiderId(3)].iter().copied().collect();
        let route = graph.route_with_pickups(1, 0, Some(RiderId(8)), &existing).unwrap();
        assert_eq!(route.pickups().iter().copied().collect::<Vec<_>>(),
                   vec![RiderId(3), RiderId(8)]);
        let route = graph.route_with_pickups(1, 0, None, &existing).unwrap();
        assert_eq!(route.pickups(), &existing);
    }

    #[test]
    fn test_rejects_disconnected_graphs() {
        let nodes = vec![Point2d::new(0., 0.), Point2d::new(1., 0.), Point2d::new(2., 0.)];
        // 2 can be reached but never left
        let result = RoadGraph::new(nodes.clone(), vec![(0, 1, 1.), (1, 0, 1.), (1, 2, 1.)]);
        match result {
            Err(DispatchError::DisconnectedGraph {components}) => assert_eq!(components, 2),
            other => panic!("expected a disconnected graph, got {:?}", other.map(|_| ())),
        }
        assert!(RoadGraph::new(nodes.clone(), vec![(0, 1, 0.0)]).is_err());
        assert!(RoadGraph::new(nodes, vec![(0, 7, 1.0)]).is_err());
    }

    #[test]
    fn test_shortest_routes_match_reference() {
        let mut rng = IsaacRng::seed_from_u64(11);
        let graph = RoadGraph::grid(6, 5, 1.0, 0.3, &mut rng).unwrap();
        assert_eq!(graph.node_count(), 30);
        // 2 * (5 * 5 + 6 * 4) one-way roads
        assert_eq!(graph.edge_count(), 98);

        for from in 0..graph.node_count() {
            let reference: HashMap<NodeIndex, f64> =
                dijkstra(&graph.network, NodeIndex::new(from), None, |ee| ee.weight().length);
            for to in 0..graph.node_count() {
                if from == to {
                    continue;
                }
                let route = graph.shortest_route(from, to).unwrap();
                assert_eq!(route.from(), from);
                assert_eq!(route.to(), to);
                assert_relative_eq!(route.length(), reference[&NodeIndex::new(to)],
                                    epsilon = 1e-9);
                assert_relative_eq!(graph.shortest_length(from, to).unwrap(), route.length());
            }
        }
    }

    #[test]
    fn test_random_routes_are_short_and_chained() {
        let mut rng = IsaacRng::seed_from_u64(3);
        let graph = RoadGraph::grid(4, 4, 2.0, 0.0, &mut rng).unwrap().with_patrol_hops(5);
        for _ in 0..200 {
            let from = graph.random_node(&mut rng);
            let route = graph.random_route(Some(from), &mut rng).unwrap();
            assert_eq!(route.from(), from);
            assert!(route.edges().len() >= 1 && route.edges().len() <= 5);
            assert!(itinerary_chains(&[route.clone()]));
            // no immediate u-turns on a grid, where every node has two or more exits
            for pair in route.edges().windows(2) {
                assert_ne!(pair[0].from, pair[1].to);
            }
        }
        assert!(graph.random_route(None, &mut rng).is_ok());
    }

    #[test]
    fn test_random_routes_are_reproducible() {
        let graph = line_graph(&[1.0, 2.0, 1.0]);
        let walks = |seed| {
            let mut rng = IsaacRng::seed_from_u64(seed);
            (0..20).map(|_| graph.random_route(None, &mut rng).unwrap()).collect::<Vec<_>>()
        };
        assert_eq!(walks(5), walks(5));
    }
}
