use std::collections::hash_map::Entry::{Occupied, Vacant};
use std::collections::{BinaryHeap, HashMap};
use std::cmp::Ordering;

use petgraph::algo::Measure;
use petgraph::graph::{DiGraph, EdgeReference, NodeIndex};
use petgraph::visit::{EdgeRef, VisitMap, Visitable};

use super::geometry::Point2d;
use super::route::Edge;

pub type RoadDiGraph = DiGraph<Point2d, Edge>;


/// Forward Dijkstra that also remembers which edge reached each node, so that paths can be
/// rebuilt.  Based on the implementation in the petgraph library.
///
/// Computes the length of the shortest path from `start` to every node reachable from it,
/// or stops as soon as `goal` is settled if a goal is given.  Edge costs must be
/// non-negative.  Among equally short frontier nodes the lowest node index is settled first,
/// which keeps the chosen paths reproducible.
///
/// Returns two `HashMap`s: the first maps each reached node to its path cost, the second maps
/// each reached node (other than `start`) to the edge used to enter it.
pub fn dijkstra_with_paths<'a, F, K>(
    graph: &'a RoadDiGraph,
    start: NodeIndex,
    goal: Option<NodeIndex>,
    mut edge_cost: F,
) -> (HashMap<NodeIndex, K>, HashMap<NodeIndex, EdgeReference<'a, Edge>>)
where
    F: FnMut(EdgeReference<'a, Edge>) -> K,
    K: Measure + Copy,
{
    let mut visited = graph.visit_map();
    let mut scores = HashMap::new();
    let mut edges_used = HashMap::new();
    let zero_score = K::default();
    scores.insert(start, zero_score);

    let mut visit_next = BinaryHeap::new();
    visit_next.push(MinScored(zero_score, start));
    while let Some(MinScored(node_score, node)) = visit_next.pop() {
        if visited.is_visited(&node) {
            continue;
        }
        if goal == Some(node) {
            break;
        }
        for edge in graph.edges(node) {
            let next = edge.target();
            if visited.is_visited(&next) {
                continue;
            }
            let next_score = node_score + edge_cost(edge);
            match scores.entry(next) {
                Occupied(ent) => {
                    if next_score < *ent.get() {
                        *ent.into_mut() = next_score;
                        visit_next.push(MinScored(next_score, next));
                        edges_used.insert(next, edge);
                    }
                }
                Vacant(ent) => {
                    ent.insert(next_score);
                    visit_next.push(MinScored(next_score, next));
                    edges_used.insert(next, edge);
                }
            }
        }
        visited.visit(node);
    }
    (scores, edges_used)
}

/// Walks the predecessor edges back from `goal` to `start`, returning the edges in driving
/// order.  None if `goal` was never reached.
pub fn unwind_path<'a>(
    edges_used: &HashMap<NodeIndex, EdgeReference<'a, Edge>>,
    start: NodeIndex,
    goal: NodeIndex,
) -> Option<Vec<Edge>> {
    let mut path = vec![];
    let mut node = goal;
    while node != start {
        let edge = edges_used.get(&node)?;
        path.push(*edge.weight());
        node = edge.source();
    }
    path.reverse();
    Some(path)
}


/// Heap entry ordered so that `BinaryHeap` pops the smallest score first, and among equal
/// scores the smallest payload.
#[derive(Copy, Clone, Debug)]
pub struct MinScored<K, T>(pub K, pub T);

impl<K: PartialOrd, T: Ord> PartialEq for MinScored<K, T> {
    #[inline]
    fn eq(&self, other: &MinScored<K, T>) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<K: PartialOrd, T: Ord> Eq for MinScored<K, T> {}

impl<K: PartialOrd, T: Ord> PartialOrd for MinScored<K, T> {
    #[inline]
    fn partial_cmp(&self, other: &MinScored<K, T>) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<K: PartialOrd, T: Ord> Ord for MinScored<K, T> {
    #[inline]
    fn cmp(&self, other: &MinScored<K, T>) -> Ordering {
        let a = &self.0;
        let b = &other.0;
        if a == b {
            other.1.cmp(&self.1)
        } else if a < b {
            Ordering::Greater
        } else if a > b {
            Ordering::Less
        } else if a.ne(a) && b.ne(b) {
            // these are the NaN cases
            other.1.cmp(&self.1)
        } else if a.ne(a) {
            // Order NaN less, so that it is last in the MinScore order
            Ordering::Less
        } else {
            Ordering::Greater
        }
    }
}
