use std::collections::BTreeSet;
use std::fmt;

use rand::Rng;
use rayon::prelude::*;

use super::dispatcher::RoutePlan;
use super::error::{DispatchError, DispatchResult};
use super::evaluator::{CostWeights, Evaluator};
use super::geometry::Point2d;
use super::riders::{Rider, RiderState};
use super::road_graph::RoadGraph;
use super::route::{itinerary_chains, Edge, NodeId, Route};


// lateral spacing between riders drawn alongside a shuttle, in graph distance units
const RIDER_SPACING: f64 = 0.05;

/// Where a shuttle is in its itinerary at a given moment.
#[derive(PartialEq, Debug, Clone, Copy)]
pub enum ShuttlePhase {
    // nothing to drive; parked at this node until it gets a patrol or a rider
    Idle(NodeId),
    // sitting exactly at the start node of its current edge
    AtBoundary(NodeId),
    Traversing { edge: Edge, remaining: f64 },
}

/// A shuttle bus that can carry several riders at once.  It owns its itinerary (the legs it
/// will drive, current leg first) and every rider assigned to it until they are dropped off.
#[derive(Debug, Clone)]
pub struct Shuttle {
    pub id: usize,
    // display colour, in [0, 1)
    pub hue: f64,
    capacity: usize,
    itinerary: Vec<Route>,
    onboard: Vec<Rider>,
    // time at which the shuttle was at the start of its current edge
    clock_base: f64,
    // the last node the shuttle passed, or the node it is parked at
    node: NodeId,
    position: Point2d,
    // set once the shuttle's state is known to be inconsistent; it then stops taking part
    frozen: bool,
}

impl Shuttle {
    /// A shuttle parked at `node` as of `clock_base`, with an empty itinerary.
    pub fn new(id: usize, hue: f64, capacity: usize, node: NodeId, clock_base: f64,
               graph: &RoadGraph) -> DispatchResult<Shuttle> {
        if capacity == 0 {
            return Err(DispatchError::Config(String::from("shuttle capacity must be positive")));
        }
        let position = graph.location(node)?;
        Ok(Shuttle {
            id,
            hue,
            capacity,
            itinerary: vec![],
            onboard: vec![],
            clock_base,
            node,
            position,
            frozen: false,
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn position(&self) -> Point2d {
        self.position
    }

    pub fn itinerary(&self) -> &[Route] {
        &self.itinerary
    }

    pub fn onboard(&self) -> &[Rider] {
        &self.onboard
    }

    pub fn clock_base(&self) -> f64 {
        self.clock_base
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn depth(&self) -> usize {
        self.itinerary.len()
    }

    pub fn is_busy(&self) -> bool {
        !self.onboard.is_empty()
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    pub fn num_riding(&self) -> usize {
        self.onboard.iter().filter(|rr| rr.state() == RiderState::Riding).count()
    }

    /// Fraction of seats taken.
    pub fn occupancy(&self) -> f64 {
        self.num_riding() as f64 / self.capacity as f64
    }

    pub fn current_edge(&self) -> Option<&Edge> {
        self.itinerary.first().map(|route| route.first_edge())
    }

    pub fn phase(&self, time: f64) -> ShuttlePhase {
        match self.current_edge() {
            None => ShuttlePhase::Idle(self.node),
            Some(edge) if time <= self.clock_base => ShuttlePhase::AtBoundary(edge.from),
            Some(edge) => ShuttlePhase::Traversing {
                edge: *edge,
                remaining: edge.length - (time - self.clock_base),
            },
        }
    }

    /// Advances the shuttle from its last recorded time to `time`, picking up and dropping
    /// off riders at every leg boundary it crosses.  Returns the riders dropped off.
    ///
    /// Any error leaves the shuttle frozen: it will not move, plan, or accept riders again.
    pub fn update<R: Rng>(&mut self, graph: &RoadGraph, time: f64, rng: &mut R)
                          -> DispatchResult<Vec<Rider>> {
        if self.frozen {
            return Ok(vec![]);
        }
        let result = self.advance(graph, time, rng);
        if result.is_err() {
            self.frozen = true;
        }
        result
    }

    fn advance<R: Rng>(&mut self, graph: &RoadGraph, time: f64, rng: &mut R)
                       -> DispatchResult<Vec<Rider>> {
        let mut dropped = vec![];
        if self.itinerary.is_empty() {
            self.start_patrol(graph, rng)?;
        }
        // riders handed over while the shuttle was parked at their origin
        self.board_head_pickups(self.clock_base)?;

        loop {
            let edge = match self.current_edge() {
                Some(edge) => *edge,
                None => break,
            };
            if time - self.clock_base < edge.length {
                break;
            }
            self.clock_base += edge.length;
            let crossing_time = self.clock_base;
            self.node = edge.to;

            let head = &self.itinerary[0];
            match head.without_first_edge() {
                // just move on to the next edge of the same leg
                Some(rest) => self.itinerary[0] = rest,
                None => {
                    dropped.append(&mut self.drop_riders_at(edge.to, crossing_time)?);
                    self.itinerary.remove(0);
                    if self.itinerary.is_empty() {
                        if !self.onboard.is_empty() {
                            return Err(DispatchError::InvalidRoute(format!(
                                "shuttle {} finished its itinerary with {} riders assigned",
                                self.id, self.onboard.len())));
                        }
                        self.start_patrol(graph, rng)?;
                    } else {
                        self.board_head_pickups(crossing_time)?;
                    }
                }
            }
        }

        self.move_along_edge(graph, time)?;
        Ok(dropped)
    }

    fn start_patrol<R: Rng>(&mut self, graph: &RoadGraph, rng: &mut R) -> DispatchResult<()> {
        let patrol = graph.random_route(Some(self.node), rng)?;
        log::debug!("shuttle {} patrols {} from t={:.2}", self.id, patrol, self.clock_base);
        self.itinerary = vec![patrol];
        Ok(())
    }

    fn drop_riders_at(&mut self, node: NodeId, time: f64) -> DispatchResult<Vec<Rider>> {
        let (mut leaving, staying): (Vec<Rider>, Vec<Rider>) = self.onboard.drain(..)
            .partition(|rr| rr.state() == RiderState::Riding && rr.to == node);
        self.onboard = staying;
        for rider in leaving.iter_mut() {
            rider.drop_off(time)?;
            log::debug!("shuttle {} dropped rider {} at {} (t={:.2})", self.id, rider.id, node,
                        time);
        }
        Ok(leaving)
    }

    fn board_head_pickups(&mut self, time: f64) -> DispatchResult<()> {
        let head = match self.itinerary.first() {
            Some(head) if !head.pickups().is_empty() => head.clone(),
            _ => return Ok(()),
        };
        for rider in self.onboard.iter_mut().filter(|rr| head.picks_up(rr.id)) {
            rider.board(time)?;
            log::debug!("shuttle {} picked up rider {} at {} (t={:.2})", self.id, rider.id,
                        head.from(), time);
        }
        self.itinerary[0] = head.without_pickups();

        let num_riding = self.num_riding();
        if num_riding > self.capacity {
            log::error!("shuttle {} is carrying {} riders with only {} seats", self.id,
                        num_riding, self.capacity);
            return Err(DispatchError::CapacityInvariantViolation {
                shuttle: self.id,
                onboard: num_riding,
                capacity: self.capacity,
            });
        }
        Ok(())
    }

    /// Places the shuttle part way along its current edge, and its riders beside it.
    fn move_along_edge(&mut self, graph: &RoadGraph, time: f64) -> DispatchResult<()> {
        let edge = match self.current_edge() {
            Some(edge) => *edge,
            None => return Ok(()),
        };
        let location_from = graph.location(edge.from)?;
        let location_to = graph.location(edge.to)?;
        let ratio = ((time - self.clock_base) / edge.length).max(0.0).min(1.0);
        self.position = location_from.lerp(&location_to, ratio);

        let normal = location_from.unit_normal_towards(&location_to);
        let position = self.position;
        let riding = self.onboard.iter_mut().filter(|rr| rr.state() == RiderState::Riding);
        for (offset, rider) in riding.enumerate() {
            let shifted = position.plus(&normal.times(RIDER_SPACING * offset as f64));
            rider.move_with_shuttle(shifted, offset);
        }
        Ok(())
    }

    /// The itinerary as a planner should see it: the leg being driven is cut down to the
    /// current edge alone, so that a rider can be slotted in right after it.
    fn normalized_itinerary(&self) -> Vec<Route> {
        let mut routes = self.itinerary.clone();
        if let Some(head) = self.itinerary.first() {
            if !head.is_single_edge() {
                routes[0] = Route::from_edge(*head.first_edge())
                    .with_pickups(head.pickups().iter().copied());
                if let Some(rest) = head.without_first_edge() {
                    routes.insert(1, rest);
                }
            }
            if self.onboard.is_empty() {
                // nobody to serve; the rest is only a patrol
                routes.truncate(1);
            }
        }
        routes
    }

    /// Every way this shuttle could serve `rider` in addition to its current riders, with
    /// the cost each would add.  Pickups and drop-offs are spliced in at leg boundaries;
    /// appending the trip after the current itinerary is always among the candidates.
    pub fn plans(&self, rider: &Rider, graph: &RoadGraph, time: f64, weights: &CostWeights)
                 -> DispatchResult<Vec<RoutePlan>> {
        if self.frozen {
            return Ok(vec![]);
        }
        let routes_base = self.normalized_itinerary();
        let cost_basis = self.evaluate(&routes_base, time, None, weights);
        if !cost_basis.is_finite() {
            log::warn!("shuttle {} has an infeasible itinerary before adding rider {}",
                       self.id, rider.id);
        }
        let no_pickups = BTreeSet::new();

        // All insertion points.  Each one works on its own copy of the itinerary, so they can
        // be evaluated in parallel; collecting keeps them in index order.
        let plans_array = (1..routes_base.len()).into_par_iter().map(|index0|
                                                                 -> DispatchResult<Vec<RoutePlan>> {
            let mut routes0 = routes_base.clone();
            let route = routes0[index0].clone();

            let pickup_index = if route.from() == rider.from {
                routes0[index0] = route.with_pickups(Some(rider.id));
                index0
            } else if route.to() == rider.from {
                if index0 + 1 < routes0.len() {
                    let next = routes0[index0 + 1].clone();
                    routes0[index0 + 1] = next.with_pickups(Some(rider.id));
                } else {
                    routes0.push(graph.route_with_pickups(rider.from, rider.to, Some(rider.id),
                                                          &no_pickups)?);
                }
                index0 + 1
            } else {
                routes0[index0] = graph.route_with_pickups(route.from(), rider.from, None,
                                                           route.pickups())?;
                routes0.insert(index0 + 1, graph.route_with_pickups(rider.from, route.to(),
                                                                    Some(rider.id),
                                                                    &no_pickups)?);
                index0 + 1
            };
            debug_assert!(itinerary_chains(&routes0));

            (pickup_index..routes0.len()).map(|index1| -> DispatchResult<RoutePlan> {
                let mut routes1 = routes0.clone();
                let route = routes1[index1].clone();
                if route.from() != rider.to && route.to() != rider.to {
                    routes1[index1] = graph.route_with_pickups(route.from(), rider.to, None,
                                                               route.pickups())?;
                    routes1.insert(index1 + 1, graph.shortest_route(rider.to, route.to())?);
                }
                let cost = self.evaluate(&routes1, time, Some(rider), weights);
                Ok(RoutePlan::new(self.id, routes1, cost - cost_basis))
            }).collect::<DispatchResult<Vec<RoutePlan>>>()
        }).collect::<DispatchResult<Vec<Vec<RoutePlan>>>>()?;
        let mut plans: Vec<RoutePlan> = plans_array.into_iter().flatten().collect();

        // Append case
        let mut routes0 = routes_base;
        let last = routes0.last().map(|route| route.to()).unwrap_or(self.node);
        if last != rider.from {
            routes0.push(graph.shortest_route(last, rider.from)?);
        }
        routes0.push(graph.route_with_pickups(rider.from, rider.to, Some(rider.id), &no_pickups)?);
        let cost = self.evaluate(&routes0, time, Some(rider), weights);
        plans.push(RoutePlan::new(self.id, routes0, cost - cost_basis));

        Ok(plans)
    }

    /// Cost of an itinerary for this shuttle's riders, plus optionally one more.  The head
    /// leg is counted from when the shuttle actually started it.
    fn evaluate(&self, routes: &[Route], time: f64, rider: Option<&Rider>,
                weights: &CostWeights) -> f64 {
        let start = if self.itinerary.is_empty() { time } else { self.clock_base.min(time) };
        let riders: Vec<&Rider> = self.onboard.iter().chain(rider).collect();
        Evaluator::new(routes, self.capacity, riders, start, *weights).cost()
    }

    /// Replaces the itinerary with a planned one and takes on `rider`, who waits for pickup.
    /// A parked shuttle sets off at `time`.
    ///
    /// The new itinerary must continue from where the shuttle is and must never need more
    /// seats than the shuttle has; breaking the latter freezes the shuttle.
    pub fn adapt(&mut self, itinerary: Vec<Route>, mut rider: Rider, time: f64)
                 -> DispatchResult<()> {
        if self.frozen {
            return Err(DispatchError::InvalidRoute(
                format!("shuttle {} is frozen and takes no riders", self.id)));
        }
        if rider.state() != RiderState::Waiting {
            return Err(DispatchError::InvalidTransition {rider: rider.id, state: rider.state()});
        }
        let first = match itinerary.first() {
            Some(route) => route,
            None => return Err(DispatchError::InvalidRoute(String::from("empty itinerary"))),
        };
        let continues = match self.current_edge() {
            Some(edge) => first.first_edge() == edge,
            None => first.from() == self.node,
        };
        if !continues || !itinerary_chains(&itinerary) {
            return Err(DispatchError::InvalidRoute(
                format!("itinerary for shuttle {} does not continue from its position", self.id)));
        }

        let riders: Vec<&Rider> = self.onboard.iter().chain(Some(&rider)).collect();
        let peak_load = Evaluator::new(&itinerary, self.capacity, riders, time,
                                       CostWeights::default()).project().peak_load;
        if peak_load > self.capacity {
            log::error!("itinerary for shuttle {} needs {} seats, it has {}", self.id,
                        peak_load, self.capacity);
            self.frozen = true;
            return Err(DispatchError::CapacityInvariantViolation {
                shuttle: self.id,
                onboard: peak_load,
                capacity: self.capacity,
            });
        }

        if self.itinerary.is_empty() {
            self.clock_base = time;
        }
        if log::log_enabled!(log::Level::Debug) {
            let mut nodes: Vec<NodeId> = itinerary.iter().map(|route| route.from()).collect();
            nodes.extend(itinerary.last().map(|route| route.to()));
            log::debug!("SH{} rider {}: [{}, {}] -> {:?}", self.id, rider.id, rider.from,
                        rider.to, nodes);
        }
        self.itinerary = itinerary;
        rider.assign_to(self.id);
        self.onboard.push(rider);
        Ok(())
    }
}

impl fmt::Display for Shuttle {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.current_edge() {
            Some(edge) => writeln!(f, "[Edge]{}", edge)?,
            None => writeln!(f, "[Edge]idle at {}", self.node)?,
        }
        writeln!(f, "[Routes]")?;
        for route in &self.itinerary {
            writeln!(f, " {}", route)?;
        }
        write!(f, "[Riders]")?;
        for rider in &self.onboard {
            write!(f, "\n {}", rider)?;
        }
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use rand::SeedableRng;
    use rand_isaac::IsaacRng;

    use super::*;
    use super::super::dispatcher::best_plan;
    use super::super::riders::RiderId;
    use super::super::test_utils::{idle_shuttle, line_graph, make_rider};

    #[test]
    fn test_idle_shuttle_serves_rider_at_its_node() {
        // a <-> b <-> c, shuttle parked at a
        let graph = line_graph(&[1.0, 1.0]);
        let mut rng = IsaacRng::seed_from_u64(0);
        let mut shuttle = idle_shuttle(&graph, 0, 0, 4);
        assert_eq!(shuttle.phase(0.0), ShuttlePhase::Idle(0));
        let rider = make_rider(&graph, 0, 0, 2, 0.0);

        let plan = best_plan(std::slice::from_ref(&shuttle), &rider, &graph, 0.0,
                             &CostWeights::default()).unwrap();
        let edges: Vec<Edge> = plan.itinerary.iter().flat_map(|rr| rr.edges().to_vec())
                                                    .collect();
        assert_eq!(edges, vec![Edge::new(0, 1, 1.0), Edge::new(1, 2, 1.0)]);
        assert_eq!(plan.itinerary[0].from(), 0);
        assert!(plan.itinerary[0].picks_up(RiderId(0)));

        shuttle.adapt(plan.itinerary, rider, 0.0).unwrap();
        assert_eq!(shuttle.onboard()[0].state(), RiderState::Waiting);
        assert_eq!(shuttle.onboard()[0].shuttle(), Some(0));

        let dropped = shuttle.update(&graph, 2.0, &mut rng).unwrap();
        assert_eq!(dropped.len(), 1);
        let rider = &dropped[0];
        assert_eq!(rider.state(), RiderState::Done);
        assert_relative_eq!(rider.pickup_time().unwrap(), 0.0);
        assert_relative_eq!(rider.drop_time().unwrap(), 2.0);
        assert!(shuttle.onboard().is_empty());
        // the empty shuttle went straight back to patrolling from c
        assert_eq!(shuttle.depth(), 1);
        assert_eq!(shuttle.itinerary()[0].from(), 2);
    }

    #[test]
    fn test_idle_shuttle_gets_patrol() {
        let graph = line_graph(&[1.0, 1.0, 1.0]);
        let mut rng = IsaacRng::seed_from_u64(4);
        let mut shuttle = idle_shuttle(&graph, 0, 1, 2);
        assert!(shuttle.update(&graph, 0.0, &mut rng).unwrap().is_empty());
        assert!(!shuttle.itinerary().is_empty());
        assert_eq!(shuttle.itinerary()[0].from(), 1);
        assert!(itinerary_chains(shuttle.itinerary()));
        assert_eq!(shuttle.phase(0.0), ShuttlePhase::AtBoundary(1));

        // patrolling forever never leaves the shuttle idle
        for step in 1..200 {
            shuttle.update(&graph, step as f64 * 0.37, &mut rng).unwrap();
            assert!(!shuttle.itinerary().is_empty());
            match shuttle.phase(step as f64 * 0.37) {
                ShuttlePhase::Idle(_) => panic!("shuttle went idle"),
                _ => (),
            }
        }
    }

    #[test]
    fn test_position_interpolates_along_edge() {
        let graph = line_graph(&[2.0, 2.0]);
        let mut rng = IsaacRng::seed_from_u64(0);
        let mut shuttle = idle_shuttle(&graph, 0, 0, 2);
        let rider = make_rider(&graph, 0, 0, 2, 0.0);
        let plans = shuttle.plans(&rider, &graph, 0.0, &CostWeights::default()).unwrap();
        assert_eq!(plans.len(), 1);
        shuttle.adapt(plans[0].itinerary.clone(), rider, 0.0).unwrap();

        assert!(shuttle.update(&graph, 0.5, &mut rng).unwrap().is_empty());
        assert_relative_eq!(shuttle.position().x_coord, 0.5);
        match shuttle.phase(0.5) {
            ShuttlePhase::Traversing {edge, remaining} => {
                assert_eq!(edge, Edge::new(0, 1, 2.0));
                assert_relative_eq!(remaining, 1.5);
            }
            other => panic!("expected to be traversing, got {:?}", other),
        }
        // the rider travels with the shuttle
        assert_eq!(shuttle.onboard()[0].state(), RiderState::Riding);
        assert_eq!(shuttle.onboard()[0].position(), shuttle.position());

        shuttle.update(&graph, 3.0, &mut rng).unwrap();
        assert_relative_eq!(shuttle.position().x_coord, 3.0);
        assert_eq!(shuttle.node(), 1);
    }

    /// Builds a capacity-one shuttle on a -- b -- c -- d that is carrying rider 0 from a to d.
    fn loaded_shuttle(graph: &RoadGraph) -> Shuttle {
        let mut rng = IsaacRng::seed_from_u64(0);
        let mut shuttle = idle_shuttle(graph, 0, 0, 1);
        let rider = make_rider(graph, 0, 0, 3, 0.0);
        let plans = shuttle.plans(&rider, graph, 0.0, &CostWeights::default()).unwrap();
        shuttle.adapt(plans[0].itinerary.clone(), rider, 0.0).unwrap();
        shuttle.update(graph, 0.5, &mut rng).unwrap();
        assert_eq!(shuttle.num_riding(), 1);
        shuttle
    }

    #[test]
    fn test_plans_respect_capacity() {
        let graph = line_graph(&[1.0, 1.0, 1.0]);
        let shuttle = loaded_shuttle(&graph);
        let other = make_rider(&graph, 1, 1, 2, 0.5);

        let plans = shuttle.plans(&other, &graph, 0.5, &CostWeights::default()).unwrap();
        // insertions after the current edge, plus the append case
        assert!(plans.len() > 1);
        for plan in &plans {
            assert!(itinerary_chains(&plan.itinerary));
            let riders: Vec<&Rider> = shuttle.onboard().iter().chain(Some(&other)).collect();
            let peak = Evaluator::new(&plan.itinerary, 1, riders, 0.5, CostWeights::default())
                .project().peak_load;
            if peak > 1 {
                assert_eq!(plan.marginal_cost, f64::INFINITY);
            }
        }

        let best = best_plan(std::slice::from_ref(&shuttle), &other, &graph, 0.5,
                             &CostWeights::default()).unwrap();
        assert!(best.marginal_cost.is_finite());
        // the only way to serve rider 1 is after rider 0 gets off at d
        let last = best.itinerary.last().unwrap();
        assert_eq!((last.from(), last.to()), (1, 2));
        assert!(last.picks_up(RiderId(1)));
    }

    #[test]
    fn test_marginal_cost_of_shared_ride() {
        // rider 1 wants to go from b to c, which the shuttle is passing through anyway
        let graph = line_graph(&[1.0, 1.0, 1.0]);
        let mut rng = IsaacRng::seed_from_u64(0);
        let mut shuttle = idle_shuttle(&graph, 0, 0, 2);
        let rider = make_rider(&graph, 0, 0, 3, 0.0);
        let plans = shuttle.plans(&rider, &graph, 0.0, &CostWeights::default()).unwrap();
        shuttle.adapt(plans[0].itinerary.clone(), rider, 0.0).unwrap();
        shuttle.update(&graph, 0.5, &mut rng).unwrap();

        let other = make_rider(&graph, 1, 1, 2, 0.5);
        let weights = CostWeights {wait: 1.0, ride: 1.0, detour: 0.0};
        let best = best_plan(std::slice::from_ref(&shuttle), &other, &graph, 0.5, &weights)
            .unwrap();
        // wait 0.5 (from t=0.5 to reaching b at t=1) and a ride of 1; rider 0 is not
        // delayed at all
        assert_relative_eq!(best.marginal_cost, 1.5);
        let ends: Vec<(NodeId, NodeId)> = best.itinerary.iter().map(|rr| (rr.from(), rr.to()))
                                                               .collect();
        assert_eq!(ends, vec![(0, 1), (1, 2), (2, 3)]);
        assert!(best.itinerary[1].picks_up(RiderId(1)));

        shuttle.adapt(best.itinerary, other, 0.5).unwrap();
        let dropped = shuttle.update(&graph, 2.0, &mut rng).unwrap();
        assert_eq!(dropped.len(), 1);
        assert_eq!(dropped[0].id, RiderId(1));
        assert_relative_eq!(dropped[0].pickup_time().unwrap(), 1.0);
        assert_relative_eq!(dropped[0].drop_time().unwrap(), 2.0);
        let dropped = shuttle.update(&graph, 3.5, &mut rng).unwrap();
        assert_eq!(dropped[0].id, RiderId(0));
        assert_relative_eq!(dropped[0].drop_time().unwrap(), 3.0);
    }

    #[test]
    fn test_adapt_rejects_overfull_itinerary() {
        let graph = line_graph(&[1.0, 1.0, 1.0]);
        let mut shuttle = loaded_shuttle(&graph);
        let other = make_rider(&graph, 1, 1, 2, 0.5);
        let plans = shuttle.plans(&other, &graph, 0.5, &CostWeights::default()).unwrap();
        let overfull = plans.into_iter().find(|pp| pp.marginal_cost == f64::INFINITY).unwrap();

        match shuttle.adapt(overfull.itinerary, other.clone(), 0.5) {
            Err(DispatchError::CapacityInvariantViolation {shuttle, onboard, capacity}) => {
                assert_eq!((shuttle, onboard, capacity), (0, 2, 1));
            }
            other => panic!("expected a capacity violation, got {:?}", other),
        }
        assert!(shuttle.is_frozen());
        // a frozen shuttle offers nothing and stays put
        assert!(shuttle.plans(&other, &graph, 0.5, &CostWeights::default()).unwrap()
                       .is_empty());
        let position = shuttle.position();
        let mut rng = IsaacRng::seed_from_u64(0);
        assert!(shuttle.update(&graph, 10.0, &mut rng).unwrap().is_empty());
        assert_eq!(shuttle.position(), position);
    }

    #[test]
    fn test_adapt_rejects_itinerary_from_elsewhere() {
        let graph = line_graph(&[1.0, 1.0, 1.0]);
        let mut shuttle = idle_shuttle(&graph, 0, 0, 2);
        let rider = make_rider(&graph, 0, 2, 3, 0.0);
        let itinerary = vec![graph.route_with_pickups(2, 3, Some(RiderId(0)), &BTreeSet::new())
                                  .unwrap()];
        match shuttle.adapt(itinerary, rider, 0.0) {
            Err(DispatchError::InvalidRoute(_)) => (),
            other => panic!("expected an invalid route, got {:?}", other),
        }
        assert!(!shuttle.is_frozen());
        assert!(shuttle.onboard().is_empty());
    }

    #[test]
    fn test_display_dump() {
        let graph = line_graph(&[1.0]);
        let mut shuttle = idle_shuttle(&graph, 0, 0, 2);
        let rider = make_rider(&graph, 5, 0, 1, 0.0);
        let plans = shuttle.plans(&rider, &graph, 0.0, &CostWeights::default()).unwrap();
        shuttle.adapt(plans[0].itinerary.clone(), rider, 0.0).unwrap();
        let dump = shuttle.to_string();
        assert!(dump.starts_with("[Edge]0->1\n[Routes]\n   0->  1:5\n[Riders]\n"));
    }
}
