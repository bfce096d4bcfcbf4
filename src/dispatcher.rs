use super::error::{DispatchError, DispatchResult};
use super::evaluator::CostWeights;
use super::riders::Rider;
use super::road_graph::RoadGraph;
use super::route::Route;
use super::shuttle::Shuttle;


/// A candidate assignment of one rider: the full itinerary `shuttle` would drive, and what
/// taking the rider on would add to that shuttle's cost.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutePlan {
    pub shuttle: usize,
    pub itinerary: Vec<Route>,
    pub marginal_cost: f64,
}

impl RoutePlan {
    pub fn new(shuttle: usize, itinerary: Vec<Route>, marginal_cost: f64) -> RoutePlan {
        RoutePlan {shuttle, itinerary, marginal_cost}
    }
}

/// Collects every shuttle's plans for `rider` and returns the cheapest.  Among equally cheap
/// plans, the first one found wins, so the result depends only on shuttle order.
pub fn best_plan(shuttles: &[Shuttle], rider: &Rider, graph: &RoadGraph, time: f64,
                 weights: &CostWeights) -> DispatchResult<RoutePlan> {
    let mut best: Option<RoutePlan> = None;
    for shuttle in shuttles {
        let plans = match shuttle.plans(rider, graph, time, weights) {
            Ok(plans) => plans,
            Err(err) => {
                // one shuttle failing to plan doesn't stop the others from serving the rider
                log::warn!("shuttle {} could not plan for rider {}: {}", shuttle.id, rider.id,
                           err);
                continue;
            }
        };
        for plan in plans {
            let better = match &best {
                Some(current) => plan.marginal_cost.total_cmp(&current.marginal_cost).is_lt(),
                None => true,
            };
            if better {
                best = Some(plan);
            }
        }
    }
    best.ok_or(DispatchError::NoFeasiblePlan)
}

/// Hands `rider` to the shuttle the plan was made for.
pub fn commit(shuttles: &mut [Shuttle], plan: RoutePlan, rider: Rider, time: f64)
              -> DispatchResult<()> {
    let shuttle = shuttles.iter_mut().find(|ss| ss.id == plan.shuttle)
        .ok_or_else(|| DispatchError::InvalidRoute(
            format!("plan names shuttle {}, which does not exist", plan.shuttle)))?;
    shuttle.adapt(plan.itinerary, rider, time)
}
