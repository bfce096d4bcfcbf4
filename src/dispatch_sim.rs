// standard library imports
use std::collections::VecDeque;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

// non-standard crate imports
use rand::SeedableRng;
use rand_isaac::IsaacRng;
use yaml_rust::{Yaml, YamlLoader};

// imports of other modules from this crate
use super::config_utils;
use super::dispatcher;
use super::error::{DispatchError, DispatchResult};
use super::evaluator::CostWeights;
use super::riders::{Rider, RiderId, RiderRequest};
use super::road_graph::RoadGraph;
use super::route::NodeId;
use super::shuttle::Shuttle;


// the run is cut off at this multiple of the play duration, even if riders are still aboard
const HARD_STOP_FACTOR: f64 = 10.0;

#[derive(Debug, Clone, PartialEq)]
pub struct DispatchSimConfig {
    // number of grid nodes in each row
    pub graph_width: usize,
    // number of rows of grid nodes
    pub graph_height: usize,
    // spacing between neighbouring grid nodes
    pub edge_length: f64,
    // each node is moved by up to this much along each axis
    pub position_jitter: f64,
    pub num_shuttles: usize,
    pub shuttle_capacity: usize,
    // arrival rate of the random schedule
    pub riders_per_minute: usize,
    // length of the window in which riders arrive
    pub play_duration: f64,
    // sim time that passes per unit of driver time
    pub speed_multiple: f64,
    // driver time between ticks in run()
    pub time_step: f64,
    // most edges an idle shuttle drives before picking a new patrol
    pub patrol_hops: usize,
    // wall-clock limit on a single dispatch.  Going over it stops new riders from being admitted.
    pub max_dispatch_latency_s: f64,
    pub seed: u64,
    pub wait_weight: f64,
    pub ride_weight: f64,
    pub detour_weight: f64,
    // optional csv file of rider requests, used instead of the random schedule
    pub riders_path: Option<PathBuf>,
}

impl Default for DispatchSimConfig {
    fn default() -> DispatchSimConfig {
        DispatchSimConfig {
            graph_width: 10,
            graph_height: 10,
            edge_length: 1.0,
            position_jitter: 0.0,
            num_shuttles: 4,
            shuttle_capacity: 4,
            riders_per_minute: 2,
            play_duration: 60.0,
            speed_multiple: 1.0,
            time_step: 0.1,
            patrol_hops: 4,
            max_dispatch_latency_s: 0.5,
            seed: 0,
            wait_weight: 1.0,
            ride_weight: 1.0,
            detour_weight: 1.0,
            riders_path: None,
        }
    }
}

impl DispatchSimConfig {
    pub fn from_file(path: &Path) -> DispatchResult<DispatchSimConfig> {
        let file_contents = std::fs::read_to_string(path)?;
        let config_dir = path.parent().unwrap_or_else(|| Path::new("."));
        DispatchSimConfig::from_yaml_str(&file_contents, config_dir)
    }

    /// Parses a yaml document.  Relative paths in it are taken to be relative to `config_dir`.
    pub fn from_yaml_str(contents: &str, config_dir: &Path)
                         -> DispatchResult<DispatchSimConfig> {
        let yaml_cfgs = YamlLoader::load_from_str(contents)?;
        match yaml_cfgs.first() {
            Some(yaml_cfg) => DispatchSimConfig::from_yaml(yaml_cfg, config_dir),
            // an empty file means all defaults
            None => Ok(DispatchSimConfig::default()),
        }
    }

    pub fn from_yaml(yaml_cfg: &Yaml, config_dir: &Path) -> DispatchResult<DispatchSimConfig> {
        let dflt = DispatchSimConfig::default();
        let riders_path = config_utils::get_opt_str(yaml_cfg, "riders_path")?
            .map(|ss| config_utils::str_to_absolute_path(ss, config_dir));

        let config = DispatchSimConfig {
            graph_width: config_utils::get_usize_or(yaml_cfg, "graph_width", dflt.graph_width)?,
            graph_height: config_utils::get_usize_or(yaml_cfg, "graph_height",
                                                     dflt.graph_height)?,
            edge_length: config_utils::get_f64_or(yaml_cfg, "edge_length", dflt.edge_length)?,
            position_jitter: config_utils::get_f64_or(yaml_cfg, "position_jitter",
                                                      dflt.position_jitter)?,
            num_shuttles: config_utils::get_usize_or(yaml_cfg, "num_shuttles",
                                                     dflt.num_shuttles)?,
            shuttle_capacity: config_utils::get_usize_or(yaml_cfg, "shuttle_capacity",
                                                         dflt.shuttle_capacity)?,
            riders_per_minute: config_utils::get_usize_or(yaml_cfg, "riders_per_minute",
                                                          dflt.riders_per_minute)?,
            play_duration: config_utils::get_f64_or(yaml_cfg, "play_duration",
                                                    dflt.play_duration)?,
            speed_multiple: config_utils::get_f64_or(yaml_cfg, "speed_multiple",
                                                     dflt.speed_multiple)?,
            time_step: config_utils::get_f64_or(yaml_cfg, "time_step", dflt.time_step)?,
            patrol_hops: config_utils::get_usize_or(yaml_cfg, "patrol_hops", dflt.patrol_hops)?,
            max_dispatch_latency_s: config_utils::get_f64_or(yaml_cfg, "max_dispatch_latency_s",
                                                             dflt.max_dispatch_latency_s)?,
            seed: config_utils::get_u64_or(yaml_cfg, "seed", dflt.seed)?,
            wait_weight: config_utils::get_f64_or(yaml_cfg, "wait_weight", dflt.wait_weight)?,
            ride_weight: config_utils::get_f64_or(yaml_cfg, "ride_weight", dflt.ride_weight)?,
            detour_weight: config_utils::get_f64_or(yaml_cfg, "detour_weight",
                                                    dflt.detour_weight)?,
            riders_path,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> DispatchResult<()> {
        let mut problems = vec![];
        if self.graph_width * self.graph_height < 2 {
            problems.push("the grid needs at least two nodes");
        }
        if self.num_shuttles == 0 {
            problems.push("num_shuttles must be positive");
        }
        if self.shuttle_capacity == 0 {
            problems.push("shuttle_capacity must be positive");
        }
        if !(self.edge_length > 0.0) {
            problems.push("edge_length must be positive");
        }
        if !(self.position_jitter >= 0.0) {
            problems.push("position_jitter must not be negative");
        }
        if !(self.play_duration >= 0.0) {
            problems.push("play_duration must not be negative");
        }
        if !(self.speed_multiple > 0.0) {
            problems.push("speed_multiple must be positive");
        }
        if !(self.time_step > 0.0) {
            problems.push("time_step must be positive");
        }
        if self.patrol_hops == 0 {
            problems.push("patrol_hops must be positive");
        }
        let latency_ok = self.max_dispatch_latency_s > 0.0
            && Duration::try_from_secs_f64(self.max_dispatch_latency_s).is_ok();
        if !latency_ok {
            problems.push("max_dispatch_latency_s must be a positive, finite number of seconds");
        }
        if !(self.wait_weight >= 0.0 && self.ride_weight >= 0.0 && self.detour_weight >= 0.0) {
            problems.push("cost weights must not be negative");
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(DispatchError::Config(problems.join("; ")))
        }
    }

    pub fn weights(&self) -> CostWeights {
        CostWeights {
            wait: self.wait_weight,
            ride: self.ride_weight,
            detour: self.detour_weight,
        }
    }

    fn max_dispatch_latency(&self) -> Duration {
        Duration::try_from_secs_f64(self.max_dispatch_latency_s).unwrap_or(Duration::MAX)
    }
}


/// Summary of a finished run.  Averages are over the riders who reached their destination.
#[derive(Debug, Clone, PartialEq)]
pub struct SimReport {
    pub num_shuttles: usize,
    pub shuttle_capacity: usize,
    pub riders_per_minute: usize,
    pub riders: usize,
    // riders no shuttle could take, or who were still aboard when the run stopped
    pub unserved: usize,
    // of the unserved, those never handed to a shuttle at all
    pub unassigned: usize,
    pub avg_wait: f64,
    pub avg_ride: f64,
    pub avg_detour: f64,
    // fraction of shuttle samples in which the shuttle had riders assigned
    pub utilization: f64,
    // mean fraction of seats taken
    pub occupancy: f64,
    pub frozen_shuttles: Vec<usize>,
    pub halted_reason: Option<String>,
    pub end_time: f64,
}

impl fmt::Display for SimReport {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Number of Shuttles: {}", self.num_shuttles)?;
        writeln!(f, "Shuttle Capacity: {}", self.shuttle_capacity)?;
        writeln!(f, "Passengers/Minute: {}", self.riders_per_minute)?;
        writeln!(f, "Riders Served: {} ({} unserved, {} never assigned)", self.riders,
                 self.unserved, self.unassigned)?;
        writeln!(f, "Average Wait: {:.1}", self.avg_wait)?;
        writeln!(f, "Average Ride: {:.1}", self.avg_ride)?;
        writeln!(f, "Average Detour: {:.1}", self.avg_detour)?;
        writeln!(f, "Shuttle Utilization: {:.1}%", self.utilization * 100.)?;
        write!(f, "Occupancy Rate: {:.1}%", self.occupancy * 100.)?;
        if !self.frozen_shuttles.is_empty() {
            write!(f, "\nFrozen Shuttles: {:?}", self.frozen_shuttles)?;
        }
        if let Some(reason) = &self.halted_reason {
            write!(f, "\nAdmissions Halted: {}", reason)?;
        }
        Ok(())
    }
}


/// Drives a fleet of shuttles with a simulation clock.  Rider requests wait in a schedule
/// ordered by arrival time and are handed to the cheapest shuttle once the clock reaches them.
pub struct DispatchSimulator {
    config: DispatchSimConfig,
    graph: RoadGraph,
    rng: IsaacRng,
    shuttles: Vec<Shuttle>,
    schedule: VecDeque<RiderRequest>,
    // riders who have reached their destination
    completed: Vec<Rider>,
    num_created: usize,
    num_unassigned: usize,
    time: f64,
    admitting: bool,
    halted_reason: Option<String>,
    num_samples: usize,
    num_busy_samples: usize,
    total_occupancy: f64,
    done: bool,
}

impl DispatchSimulator {
    pub fn new(config: DispatchSimConfig) -> DispatchResult<DispatchSimulator> {
        config.validate()?;
        let mut rng = IsaacRng::seed_from_u64(config.seed);
        let graph = RoadGraph::grid(config.graph_width, config.graph_height, config.edge_length,
                                    config.position_jitter, &mut rng)?
            .with_patrol_hops(config.patrol_hops);

        let mut shuttles = Vec::with_capacity(config.num_shuttles);
        for ii in 0..config.num_shuttles {
            let hue = ii as f64 / config.num_shuttles as f64;
            let node = graph.random_node(&mut rng);
            shuttles.push(Shuttle::new(ii, hue, config.shuttle_capacity, node, 0.0, &graph)?);
        }
        log::info!("built a {}x{} road graph with {} roads and {} shuttles of capacity {}",
                   config.graph_width, config.graph_height, graph.edge_count(),
                   config.num_shuttles, config.shuttle_capacity);

        let mut sim = DispatchSimulator {
            config,
            graph,
            rng,
            shuttles,
            schedule: VecDeque::new(),
            completed: vec![],
            num_created: 0,
            num_unassigned: 0,
            time: 0.0,
            admitting: true,
            halted_reason: None,
            num_samples: 0,
            num_busy_samples: 0,
            total_occupancy: 0.0,
            done: false,
        };
        if let Some(riders_path) = sim.config.riders_path.clone() {
            sim.load_riders_csv(&riders_path)?;
        }
        Ok(sim)
    }

    pub fn from_file(config_path: &Path) -> DispatchResult<DispatchSimulator> {
        DispatchSimulator::new(DispatchSimConfig::from_file(config_path)?)
    }

    pub fn config(&self) -> &DispatchSimConfig {
        &self.config
    }

    pub fn graph(&self) -> &RoadGraph {
        &self.graph
    }

    pub fn shuttles(&self) -> &[Shuttle] {
        &self.shuttles
    }

    pub fn completed_riders(&self) -> &[Rider] {
        &self.completed
    }

    /// Riders assigned to a shuttle who have not yet reached their destination.
    pub fn active_riders(&self) -> impl Iterator<Item = &Rider> {
        self.shuttles.iter().flat_map(|ss| ss.onboard().iter())
    }

    pub fn num_pending(&self) -> usize {
        self.schedule.len()
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn is_admitting(&self) -> bool {
        self.admitting
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Fills the schedule with random requests arriving during the play duration, at the
    /// configured rate.
    pub fn schedule_random_riders(&mut self) -> DispatchResult<()> {
        let count = (self.config.riders_per_minute as f64 * self.config.play_duration / 60.0)
            as usize;
        let graph = &self.graph;
        let rng = &mut self.rng;
        let limit = self.config.play_duration;
        let mut requests: Vec<RiderRequest> = (0..count)
            .map(|_| RiderRequest::random(graph, rng, limit))
            .collect();
        requests.sort_by(|aa, bb| aa.arrival_time.total_cmp(&bb.arrival_time));
        log::info!("scheduled {} random riders", requests.len());
        for request in requests {
            self.enqueue(request)?;
        }
        Ok(())
    }

    /// Adds a request to the back of the schedule.  Requests must arrive in order.
    pub fn enqueue(&mut self, request: RiderRequest) -> DispatchResult<()> {
        if !self.admitting {
            return Err(DispatchError::Config(String::from("no longer admitting riders")));
        }
        self.graph.location(request.from)?;
        self.graph.location(request.to)?;
        if request.from == request.to {
            return Err(DispatchError::Config(
                format!("request at {} starts and ends at node {}", request.arrival_time,
                        request.from)));
        }
        let last_time = self.schedule.back().map(|rr| rr.arrival_time).unwrap_or(self.time);
        if !(request.arrival_time >= last_time) {
            return Err(DispatchError::Config(
                format!("request at {} arrives before the previous one at {}",
                        request.arrival_time, last_time)));
        }
        self.schedule.push_back(request);
        Ok(())
    }

    pub fn load_riders_csv(&mut self, csvpath: &Path) -> DispatchResult<()> {
        let requests = RiderRequest::all_from_csv(csvpath)?;
        log::info!("loaded {} rider requests from {}", requests.len(), csvpath.display());
        for request in requests {
            self.enqueue(request)?;
        }
        Ok(())
    }

    /// Dispatches a rider right away, arriving at the current time.
    pub fn add_rider_now(&mut self, from: NodeId, to: NodeId) -> DispatchResult<RiderId> {
        if !self.admitting {
            return Err(DispatchError::Config(String::from("no longer admitting riders")));
        }
        if from == to {
            return Err(DispatchError::Config(format!("rider starts and ends at node {}", from)));
        }
        self.dispatch(&RiderRequest::new(from, to, self.time))
    }

    /// Finds the cheapest shuttle for a request and hands the new rider to it.
    fn dispatch(&mut self, request: &RiderRequest) -> DispatchResult<RiderId> {
        let id = RiderId(self.num_created);
        self.num_created += 1;
        let rider = match Rider::from_request(id, request, &self.graph) {
            Ok(rider) => rider,
            Err(err) => {
                self.num_unassigned += 1;
                return Err(err);
            }
        };

        let start = Instant::now();
        let result = dispatcher::best_plan(&self.shuttles, &rider, &self.graph, self.time,
                                           &self.config.weights());
        let elapsed = start.elapsed();

        let plan = match result {
            Ok(plan) => plan,
            Err(err) => {
                log::warn!("could not dispatch rider {}: {}", id, err);
                self.num_unassigned += 1;
                return Err(err);
            }
        };
        log::debug!("rider {} ({}->{}) goes to shuttle {} at marginal cost {:.2}, took {:?}",
                    id, rider.from, rider.to, plan.shuttle, plan.marginal_cost, elapsed);

        if let Err(err) = dispatcher::commit(&mut self.shuttles, plan, rider, self.time) {
            log::error!("commit of rider {} failed: {}", id, err);
            self.num_unassigned += 1;
            return Err(err);
        }
        if log::log_enabled!(log::Level::Debug) {
            let depth = self.shuttles.iter().map(|ss| ss.depth()).max().unwrap_or(0);
            log::debug!("max itinerary depth is now {}", depth);
        }

        let limit = self.config.max_dispatch_latency();
        if elapsed > limit {
            let err = DispatchError::SlowDispatch {elapsed, limit};
            self.stop_admitting(&err);
            return Err(err);
        }
        Ok(id)
    }

    fn stop_admitting(&mut self, reason: &DispatchError) {
        log::warn!("{}; dropping {} scheduled riders and admitting no more", reason,
                   self.schedule.len());
        self.admitting = false;
        self.schedule.clear();
        self.halted_reason = Some(reason.to_string());
    }

    /// Advances the simulation to `time`.  Shuttles move first, then every request that has
    /// arrived by `time` is dispatched in arrival order.
    pub fn tick(&mut self, time: f64) -> DispatchResult<()> {
        if time < self.time {
            return Err(DispatchError::Config(
                format!("clock cannot go back from {} to {}", self.time, time)));
        }
        self.time = time;

        for shuttle in self.shuttles.iter_mut() {
            if shuttle.is_frozen() {
                continue;
            }
            match shuttle.update(&self.graph, time, &mut self.rng) {
                Ok(mut dropped) => self.completed.append(&mut dropped),
                Err(err) => log::error!("shuttle {} froze at t={:.2}: {}", shuttle.id, time, err),
            }
        }

        while let Some(request) = self.schedule.front() {
            if request.arrival_time > time {
                break;
            }
            let request = match self.schedule.pop_front() {
                Some(request) => request,
                None => break,
            };
            match self.dispatch(&request) {
                Ok(_) => (),
                Err(DispatchError::SlowDispatch {..}) => break,
                // already logged; one failed request doesn't stop the others
                Err(_) => (),
            }
        }

        // leave out the start-up and wind-down periods
        let play_duration = self.config.play_duration;
        if time > play_duration / 3. && time < play_duration {
            for shuttle in &self.shuttles {
                self.num_samples += 1;
                self.total_occupancy += shuttle.occupancy();
                if shuttle.is_busy() {
                    self.num_busy_samples += 1;
                }
            }
        }

        let any_active = self.shuttles.iter().any(|ss| !ss.is_frozen() && ss.is_busy());
        if !self.done && self.schedule.is_empty() && self.num_created > 0 && !any_active {
            log::info!("all riders served by t={:.2}", time);
            self.done = true;
        }
        Ok(())
    }

    /// Runs the clock until every rider has been served, or until the hard stop.
    pub fn run(&mut self) -> DispatchResult<SimReport> {
        let step = self.config.time_step * self.config.speed_multiple;
        let hard_stop = (self.config.play_duration * HARD_STOP_FACTOR).max(step);
        log::info!("running simulation with {} scheduled riders", self.schedule.len());

        let start = self.time;
        let mut tt = 0;
        while !self.done {
            tt += 1;
            let time = start + tt as f64 * step;
            if time > hard_stop {
                log::warn!("stopping at t={:.2} with riders still active", self.time);
                break;
            }
            self.tick(time)?;
            if self.schedule.is_empty() && self.num_created == 0 && !self.admitting {
                break;
            }
        }
        log::info!("Simulator run finished after {} timesteps", tt);

        let report = self.report();
        log::info!("{}", report);
        Ok(report)
    }

    pub fn report(&self) -> SimReport {
        let count = self.completed.len();
        let average = |values: Vec<f64>| {
            if values.is_empty() {
                0.0
            } else {
                values.iter().sum::<f64>() / values.len() as f64
            }
        };
        let avg_wait = average(self.completed.iter().filter_map(|rr| rr.wait_time()).collect());
        let avg_ride = average(self.completed.iter().filter_map(|rr| rr.ride_time()).collect());
        let avg_detour = average(self.completed.iter().filter_map(|rr| rr.detour()).collect());
        let (utilization, occupancy) = if self.num_samples > 0 {
            (self.num_busy_samples as f64 / self.num_samples as f64,
             self.total_occupancy / self.num_samples as f64)
        } else {
            (0.0, 0.0)
        };

        SimReport {
            num_shuttles: self.config.num_shuttles,
            shuttle_capacity: self.config.shuttle_capacity,
            riders_per_minute: self.config.riders_per_minute,
            riders: count,
            unserved: self.num_created - count,
            unassigned: self.num_unassigned,
            avg_wait,
            avg_ride,
            avg_detour,
            utilization,
            occupancy,
            frozen_shuttles: self.shuttles.iter().filter(|ss| ss.is_frozen())
                                                 .map(|ss| ss.id).collect(),
            halted_reason: self.halted_reason.clone(),
            end_time: self.time,
        }
    }
}
