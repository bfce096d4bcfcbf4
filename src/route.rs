use std::collections::BTreeSet;
use std::fmt;

use itertools::Itertools;

use super::error::{DispatchError, DispatchResult};
use super::riders::RiderId;

pub type NodeId = usize;

/// A one-directional road from one node to another.
#[derive(PartialEq, Debug, Clone, Copy)]
pub struct Edge {
    pub from: NodeId,
    pub to: NodeId,
    pub length: f64,
}

impl Edge {
    pub fn new(from: NodeId, to: NodeId, length: f64) -> Edge {
        Edge {from, to, length}
    }

    pub fn chains_to(&self, next: &Edge) -> bool {
        self.to == next.from
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}->{}", self.from, self.to)
    }
}

/// One contiguous leg of an itinerary.  Riders named in `pickups` board at the leg's origin
/// when the leg begins.  Routes are never edited in place; every change builds a new one.
#[derive(PartialEq, Debug, Clone)]
pub struct Route {
    edges: Vec<Edge>,
    length: f64,
    pickups: BTreeSet<RiderId>,
}

impl Route {
    pub fn new(edges: Vec<Edge>) -> DispatchResult<Route> {
        if edges.is_empty() {
            return Err(DispatchError::InvalidRoute(String::from("a route needs at least one edge")));
        }
        if let Some((aa, bb)) = edges.iter().tuple_windows().find(|(aa, bb)| !aa.chains_to(bb)) {
            return Err(DispatchError::InvalidRoute(format!("{} does not chain to {}", aa, bb)));
        }
        let length = edges.iter().map(|ee| ee.length).sum();
        Ok(Route {edges, length, pickups: BTreeSet::new()})
    }

    pub fn from_edge(edge: Edge) -> Route {
        Route {edges: vec![edge], length: edge.length, pickups: BTreeSet::new()}
    }

    pub fn with_pickups<II>(mut self, pickups: II) -> Route
        where II: IntoIterator<Item = RiderId>
    {
        self.pickups.extend(pickups);
        self
    }

    pub fn without_pickups(&self) -> Route {
        Route {edges: self.edges.clone(), length: self.length, pickups: BTreeSet::new()}
    }

    /// The rest of this route once its first edge has been driven, or None if that was the
    /// last edge.  The remainder carries no pickups, since those happen at the origin.
    pub fn without_first_edge(&self) -> Option<Route> {
        if self.edges.len() == 1 {
            return None;
        }
        let edges = self.edges[1..].to_vec();
        let length = edges.iter().map(|ee| ee.length).sum();
        Some(Route {edges, length, pickups: BTreeSet::new()})
    }

    pub fn from(&self) -> NodeId {
        self.edges[0].from
    }

    pub fn to(&self) -> NodeId {
        self.edges[self.edges.len() - 1].to
    }

    pub fn length(&self) -> f64 {
        self.length
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn first_edge(&self) -> &Edge {
        &self.edges[0]
    }

    pub fn is_single_edge(&self) -> bool {
        self.edges.len() == 1
    }

    pub fn pickups(&self) -> &BTreeSet<RiderId> {
        &self.pickups
    }

    pub fn picks_up(&self, rider: RiderId) -> bool {
        self.pickups.contains(&rider)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:3}->{:3}:{}", self.from(), self.to(),
               self.pickups.iter().map(|id| id.to_string()).join(","))
    }
}

/// Checks that each leg of an itinerary starts where the previous one ended.
pub fn itinerary_chains(itinerary: &[Route]) -> bool {
    itinerary.iter().tuple_windows().all(|(aa, bb)| aa.to() == bb.from())
}


#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use super::*;

    #[test]
    fn test_route_length_is_sum_of_edges() {
        let route = Route::new(vec![
            Edge::new(0, 1, 1.5),
            Edge::new(1, 2, 2.0),
            Edge::new(2, 5, 0.25),
        ]).unwrap();
        assert_relative_eq!(route.length(), 3.75);
        assert_eq!(route.from(), 0);
        assert_eq!(route.to(), 5);
        assert!(!route.is_single_edge());
    }

    #[test]
    fn test_route_rejects_broken_chains() {
        assert!(Route::new(vec![]).is_err());
        let result = Route::new(vec![Edge::new(0, 1, 1.0), Edge::new(2, 3, 1.0)]);
        match result {
            Err(DispatchError::InvalidRoute(_)) => (),
            other => panic!("expected an invalid route, got {:?}", other),
        }
    }

    #[test]
    fn test_without_first_edge() {
        let route = Route::new(vec![Edge::new(0, 1, 1.0), Edge::new(1, 2, 3.0)]).unwrap()
            .with_pickups(vec![RiderId(4)]);
        assert!(route.picks_up(RiderId(4)));

        let rest = route.without_first_edge().unwrap();
        assert_eq!(rest.from(), 1);
        assert_relative_eq!(rest.length(), 3.0);
        assert!(rest.pickups().is_empty());
        assert!(rest.without_first_edge().is_none());
    }

    #[test]
    fn test_itinerary_chains() {
        let aa = Route::from_edge(Edge::new(0, 1, 1.0));
        let bb = Route::from_edge(Edge::new(1, 2, 1.0));
        assert!(itinerary_chains(&[aa.clone(), bb.clone()]));
        assert!(!itinerary_chains(&[bb, aa]));
        assert!(itinerary_chains(&[]));
    }

    #[test]
    fn test_display() {
        let route = Route::from_edge(Edge::new(3, 14, 1.0))
            .with_pickups(vec![RiderId(2), RiderId(1)]);
        assert_eq!(route.to_string(), "  3-> 14:1,2");
    }
}
