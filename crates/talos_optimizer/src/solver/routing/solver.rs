use jiff::SignedDuration;

use crate::solver::{nodes::NodeIdx, vehicle::VehicleIdx};

/// Arc evaluator registered with the solver. Matrices behind these closures
/// belong to the routing model and outlive the solve.
pub type TransitEvaluator = Box<dyn Fn(NodeIdx, NodeIdx) -> i64 + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallbackIdx(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DimensionIdx(pub usize);

/// Maps vehicles to their route endpoints in the node space.
#[derive(Debug, Clone)]
pub struct RoutingIndexManager {
    num_nodes: usize,
    starts: Vec<NodeIdx>,
    ends: Vec<NodeIdx>,
}

impl RoutingIndexManager {
    pub fn new(num_nodes: usize, starts: Vec<NodeIdx>, ends: Vec<NodeIdx>) -> Self {
        assert_eq!(starts.len(), ends.len());
        RoutingIndexManager {
            num_nodes,
            starts,
            ends,
        }
    }

    pub fn num_nodes(&self) -> usize {
        self.num_nodes
    }

    pub fn num_vehicles(&self) -> usize {
        self.starts.len()
    }

    pub fn start(&self, vehicle: VehicleIdx) -> NodeIdx {
        self.starts[vehicle.get()]
    }

    pub fn end(&self, vehicle: VehicleIdx) -> NodeIdx {
        self.ends[vehicle.get()]
    }
}

/// A cumulative variable along a route. Vehicle start and end cumuls are
/// distinct from the node they happen to share a place with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteVar {
    Node(NodeIdx),
    Start(VehicleIdx),
    End(VehicleIdx),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FirstSolutionStrategy {
    #[default]
    Automatic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LocalSearchMetaheuristic {
    #[default]
    Automatic,
}

#[derive(Debug, Clone)]
pub struct SearchParams {
    pub first_solution: FirstSolutionStrategy,
    pub metaheuristic: LocalSearchMetaheuristic,
    pub time_limit: SignedDuration,
}

impl Default for SearchParams {
    fn default() -> Self {
        SearchParams {
            first_solution: FirstSolutionStrategy::default(),
            metaheuristic: LocalSearchMetaheuristic::default(),
            time_limit: SignedDuration::from_secs(10),
        }
    }
}

/// One visited stop with its cumulative value per registered dimension.
#[derive(Debug, Clone)]
pub struct Stop {
    pub node: NodeIdx,
    pub cumuls: Vec<i64>,
}

/// A vehicle's ordered stops, start and end included.
#[derive(Debug, Clone)]
pub struct RoutePlan {
    pub stops: Vec<Stop>,
}

/// A feasible solution returned by the solver.
#[derive(Debug, Clone)]
pub struct Assignment {
    pub objective: i64,
    pub routes: Vec<RoutePlan>,
    pub dropped: Vec<NodeIdx>,
}

/// The abstract routing back-end. The model registers transit callbacks,
/// dimensions, disjunctions and eligibility before calling `solve` once.
/// Implementations must be deterministic for a fixed configuration.
pub trait RoutingSolver {
    fn set_index_manager(&mut self, manager: RoutingIndexManager);

    fn register_transit_callback(&mut self, evaluator: TransitEvaluator) -> CallbackIdx;

    /// Uses a registered callback as the arc-cost evaluator for one vehicle.
    fn set_vehicle_arc_cost(&mut self, vehicle: VehicleIdx, callback: CallbackIdx);

    /// Adds a cumulative dimension with one transit callback per vehicle.
    /// `slack_max` bounds the idle accumulated at each stop, `capacity` the
    /// cumulative value anywhere along a route.
    fn add_dimension(
        &mut self,
        transits: Vec<CallbackIdx>,
        slack_max: i64,
        capacity: i64,
        fix_start_cumul_to_zero: bool,
        name: &str,
    ) -> DimensionIdx;

    fn set_cumul_range(&mut self, dimension: DimensionIdx, var: RouteVar, min: i64, max: i64);

    fn set_allowed_vehicles(&mut self, node: NodeIdx, vehicles: &[VehicleIdx]);

    /// Lets the nodes be dropped from all routes at the given penalty.
    fn add_disjunction(&mut self, nodes: &[NodeIdx], penalty: i64);

    /// Runs the search until proven optimal or the time limit expires.
    /// Returns `None` when no feasible assignment was found.
    fn solve(&mut self, params: &SearchParams) -> Option<Assignment>;
}
