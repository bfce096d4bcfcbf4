use std::collections::HashMap;

use super::riders::{Rider, RiderId, RiderState};
use super::route::Route;


/// Relative weights of the three things a rider cares about.  Any non-negative values work;
/// they are a policy choice, not part of the routing logic.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostWeights {
    pub wait: f64,
    pub ride: f64,
    // time aboard beyond the rider's direct trip
    pub detour: f64,
}

impl Default for CostWeights {
    fn default() -> CostWeights {
        CostWeights {wait: 1.0, ride: 1.0, detour: 1.0}
    }
}

/// Pickup and drop-off times that executing an itinerary would produce.
#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    pub pickup_times: HashMap<RiderId, f64>,
    pub drop_times: HashMap<RiderId, f64>,
    // the most riders aboard at once at any point of the itinerary
    pub peak_load: usize,
}

/// Scores an itinerary for a shuttle carrying or expecting `riders`, as of `time`.  A pure
/// function of its inputs, so candidates can be scored on any thread in any order.
pub struct Evaluator<'a> {
    itinerary: &'a [Route],
    capacity: usize,
    riders: Vec<&'a Rider>,
    time: f64,
    weights: CostWeights,
}

impl<'a> Evaluator<'a> {
    pub fn new(itinerary: &'a [Route], capacity: usize, riders: Vec<&'a Rider>, time: f64,
               weights: CostWeights) -> Evaluator<'a> {
        Evaluator {itinerary, capacity, riders, time, weights}
    }

    /// Drives the itinerary on paper: legs are taken back to back starting at `time`, riders
    /// board at the start of the leg that names them and leave at the first leg end that is
    /// their destination.
    pub fn project(&self) -> Projection {
        let by_id: HashMap<RiderId, &Rider> = self.riders.iter().map(|rr| (rr.id, *rr))
                                                                .collect();
        let mut pickup_times = HashMap::new();
        let mut drop_times = HashMap::new();
        let mut aboard = vec![];
        for rider in &self.riders {
            if rider.state() == RiderState::Riding {
                pickup_times.insert(rider.id, rider.pickup_time().unwrap_or(self.time));
                aboard.push(rider.id);
            }
        }
        let mut peak_load = aboard.len();

        let mut clock = self.time;
        for route in self.itinerary {
            for rider in &self.riders {
                if rider.state() == RiderState::Waiting && route.picks_up(rider.id)
                   && !pickup_times.contains_key(&rider.id) {
                    pickup_times.insert(rider.id, clock);
                    aboard.push(rider.id);
                }
            }
            peak_load = peak_load.max(aboard.len());

            clock += route.length();
            let node = route.to();
            aboard.retain(|id| {
                if by_id[id].to == node {
                    drop_times.insert(*id, clock);
                    false
                } else {
                    true
                }
            });
        }

        Projection {pickup_times, drop_times, peak_load}
    }

    /// Weighted sum of wait, ride and detour time over all riders.  Infinite if the shuttle
    /// would ever be over capacity, or if some rider is never picked up or never dropped off.
    pub fn cost(&self) -> f64 {
        let projection = self.project();
        if projection.peak_load > self.capacity {
            return f64::INFINITY;
        }

        let mut total = 0.0;
        for rider in &self.riders {
            let pickup = match projection.pickup_times.get(&rider.id) {
                Some(time) => *time,
                None => return f64::INFINITY,
            };
            let drop = match projection.drop_times.get(&rider.id) {
                Some(time) => *time,
                None => return f64::INFINITY,
            };
            let wait = pickup - rider.start_time;
            let ride = drop - pickup;
            let detour = (ride - rider.direct_length()).max(0.0);
            total += self.weights.wait * wait + self.weights.ride * ride
                + self.weights.detour * detour;
        }
        total
    }
}
