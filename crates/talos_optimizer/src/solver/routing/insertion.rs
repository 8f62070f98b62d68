use fxhash::FxHashMap;
use jiff::Timestamp;
use tracing::debug;

use crate::solver::{nodes::NodeIdx, vehicle::VehicleIdx};

use super::solver::{
    Assignment, CallbackIdx, DimensionIdx, RoutePlan, RouteVar, RoutingIndexManager,
    RoutingSolver, SearchParams, Stop, TransitEvaluator,
};

struct DimensionDef {
    transits: Vec<CallbackIdx>,
    slack_max: i64,
    capacity: i64,
    fix_start_cumul_to_zero: bool,
    #[allow(dead_code)]
    name: String,
    node_ranges: FxHashMap<NodeIdx, (i64, i64)>,
    start_ranges: FxHashMap<usize, (i64, i64)>,
    end_ranges: FxHashMap<usize, (i64, i64)>,
}

/// Built-in routing back-end: deterministic cheapest-insertion construction
/// followed by first-improvement local search (reinsertion of dropped nodes,
/// relocate, swap), all under the registered dimension constraints. Tiny
/// sibling of a ruin-and-recreate search, adequate while every candidate
/// move is re-validated against the dimensions.
#[derive(Default)]
pub struct InsertionSolver {
    manager: Option<RoutingIndexManager>,
    callbacks: Vec<TransitEvaluator>,
    arc_costs: FxHashMap<usize, CallbackIdx>,
    dimensions: Vec<DimensionDef>,
    allowed: FxHashMap<NodeIdx, Vec<VehicleIdx>>,
    disjunctions: FxHashMap<NodeIdx, i64>,
}

impl RoutingSolver for InsertionSolver {
    fn set_index_manager(&mut self, manager: RoutingIndexManager) {
        self.manager = Some(manager);
    }

    fn register_transit_callback(&mut self, evaluator: TransitEvaluator) -> CallbackIdx {
        self.callbacks.push(evaluator);
        CallbackIdx(self.callbacks.len() - 1)
    }

    fn set_vehicle_arc_cost(&mut self, vehicle: VehicleIdx, callback: CallbackIdx) {
        self.arc_costs.insert(vehicle.get(), callback);
    }

    fn add_dimension(
        &mut self,
        transits: Vec<CallbackIdx>,
        slack_max: i64,
        capacity: i64,
        fix_start_cumul_to_zero: bool,
        name: &str,
    ) -> DimensionIdx {
        self.dimensions.push(DimensionDef {
            transits,
            slack_max,
            capacity,
            fix_start_cumul_to_zero,
            name: name.to_owned(),
            node_ranges: FxHashMap::default(),
            start_ranges: FxHashMap::default(),
            end_ranges: FxHashMap::default(),
        });
        DimensionIdx(self.dimensions.len() - 1)
    }

    fn set_cumul_range(&mut self, dimension: DimensionIdx, var: RouteVar, min: i64, max: i64) {
        let dimension = &mut self.dimensions[dimension.0];
        match var {
            RouteVar::Node(node) => {
                dimension.node_ranges.insert(node, (min, max));
            }
            RouteVar::Start(vehicle) => {
                dimension.start_ranges.insert(vehicle.get(), (min, max));
            }
            RouteVar::End(vehicle) => {
                dimension.end_ranges.insert(vehicle.get(), (min, max));
            }
        }
    }

    fn set_allowed_vehicles(&mut self, node: NodeIdx, vehicles: &[VehicleIdx]) {
        self.allowed.insert(node, vehicles.to_vec());
    }

    fn add_disjunction(&mut self, nodes: &[NodeIdx], penalty: i64) {
        debug_assert_eq!(nodes.len(), 1, "only single-node disjunctions are used");
        for &node in nodes {
            self.disjunctions.insert(node, penalty);
        }
    }

    fn solve(&mut self, params: &SearchParams) -> Option<Assignment> {
        let manager = self
            .manager
            .as_ref()
            .expect("index manager must be set before solving");
        let deadline = Timestamp::now() + params.time_limit;

        let mut routes: Vec<Vec<NodeIdx>> = (0..manager.num_vehicles())
            .map(|vehicle| {
                let vehicle = VehicleIdx::new(vehicle);
                vec![manager.start(vehicle), manager.end(vehicle)]
            })
            .collect();

        let endpoint_nodes: Vec<NodeIdx> = routes.iter().flatten().copied().collect();
        let mut candidates: Vec<NodeIdx> = (0..manager.num_nodes())
            .map(NodeIdx::new)
            .filter(|node| !endpoint_nodes.contains(node))
            .collect();

        // Mandatory nodes go in first, then droppable ones, costliest to
        // drop first.
        candidates.sort_by_key(|node| {
            let penalty = self.disjunctions.get(node).copied();
            (penalty.is_some(), std::cmp::Reverse(penalty.unwrap_or(0)), *node)
        });

        let mut dropped: Vec<NodeIdx> = Vec::new();
        for node in candidates {
            let penalty = self.disjunctions.get(&node).copied();
            match self.best_insertion(&routes, node) {
                // A droppable node is only worth routing when the detour
                // costs less than its penalty.
                Some((delta, vehicle, position))
                    if penalty.is_none_or(|penalty| delta < penalty) =>
                {
                    routes[vehicle].insert(position, node);
                }
                Some(_) => dropped.push(node),
                None => match penalty {
                    Some(_) => dropped.push(node),
                    None => {
                        debug!(%node, "mandatory node cannot be placed on any route");
                        return None;
                    }
                },
            }
        }

        self.improve(&mut routes, &mut dropped, deadline);

        dropped.sort();
        let objective = self.objective(&routes, &dropped);

        let route_plans = routes
            .iter()
            .enumerate()
            .map(|(vehicle, route)| {
                let cumuls: Vec<Vec<i64>> = self
                    .dimensions
                    .iter()
                    .map(|dimension| {
                        self.schedule(dimension, vehicle, route)
                            .expect("accepted route no longer schedules")
                    })
                    .collect();

                RoutePlan {
                    stops: route
                        .iter()
                        .enumerate()
                        .map(|(position, &node)| Stop {
                            node,
                            cumuls: cumuls.iter().map(|dimension| dimension[position]).collect(),
                        })
                        .collect(),
                }
            })
            .collect();

        Some(Assignment {
            objective,
            routes: route_plans,
            dropped,
        })
    }
}

impl InsertionSolver {
    fn transit(&self, callback: CallbackIdx, from: NodeIdx, to: NodeIdx) -> i64 {
        (self.callbacks[callback.0])(from, to)
    }

    fn arc_cost(&self, vehicle: usize, from: NodeIdx, to: NodeIdx) -> i64 {
        match self.arc_costs.get(&vehicle) {
            Some(&callback) => self.transit(callback, from, to),
            None => 0,
        }
    }

    fn route_cost(&self, vehicle: usize, route: &[NodeIdx]) -> i64 {
        route
            .windows(2)
            .map(|arc| self.arc_cost(vehicle, arc[0], arc[1]))
            .sum()
    }

    fn objective(&self, routes: &[Vec<NodeIdx>], dropped: &[NodeIdx]) -> i64 {
        let route_costs: i64 = routes
            .iter()
            .enumerate()
            .map(|(vehicle, route)| self.route_cost(vehicle, route))
            .sum();
        let penalties: i64 = dropped
            .iter()
            .map(|node| self.disjunctions.get(node).copied().unwrap_or(0))
            .sum();
        route_costs + penalties
    }

    fn may_serve(&self, vehicle: usize, node: NodeIdx) -> bool {
        match self.allowed.get(&node) {
            Some(vehicles) => vehicles.iter().any(|allowed| allowed.get() == vehicle),
            None => true,
        }
    }

    fn bounds(
        &self,
        dimension: &DimensionDef,
        vehicle: usize,
        route: &[NodeIdx],
        position: usize,
    ) -> (i64, i64) {
        let (min, max) = if position == 0 {
            if dimension.fix_start_cumul_to_zero {
                (0, 0)
            } else {
                dimension
                    .start_ranges
                    .get(&vehicle)
                    .copied()
                    .unwrap_or((0, dimension.capacity))
            }
        } else if position == route.len() - 1 {
            dimension
                .end_ranges
                .get(&vehicle)
                .copied()
                .unwrap_or((0, dimension.capacity))
        } else {
            dimension
                .node_ranges
                .get(&route[position])
                .copied()
                .unwrap_or((0, dimension.capacity))
        };

        (min, max.min(dimension.capacity))
    }

    /// Cumulative values along `route` satisfying the dimension's transit,
    /// slack and range constraints, or `None` when none exist. The chain of
    /// `cumul[i+1] - cumul[i] ∈ [transit, transit + slack]` plus box bounds
    /// forms an interval system over a path, so one forward pass computing
    /// earliest/latest envelopes decides feasibility exactly.
    fn schedule(
        &self,
        dimension: &DimensionDef,
        vehicle: usize,
        route: &[NodeIdx],
    ) -> Option<Vec<i64>> {
        let callback = dimension.transits[vehicle];
        let len = route.len();

        let mut earliest = vec![0_i64; len];
        let mut latest = vec![0_i64; len];

        let (min, max) = self.bounds(dimension, vehicle, route, 0);
        earliest[0] = min;
        latest[0] = max;
        if earliest[0] > latest[0] {
            return None;
        }

        for position in 1..len {
            let transit = self.transit(callback, route[position - 1], route[position]);
            let (min, max) = self.bounds(dimension, vehicle, route, position);

            earliest[position] = earliest[position - 1].saturating_add(transit).max(min);
            latest[position] = latest[position - 1]
                .saturating_add(transit)
                .saturating_add(dimension.slack_max)
                .min(max);

            if earliest[position] > latest[position] {
                return None;
            }
        }

        // Pin the final cumul to its earliest value and walk back, keeping
        // idle time as late as possible.
        let mut cumuls = vec![0_i64; len];
        cumuls[len - 1] = earliest[len - 1];
        for position in (0..len - 1).rev() {
            let transit = self.transit(callback, route[position], route[position + 1]);
            cumuls[position] = cumuls[position + 1]
                .saturating_sub(transit)
                .saturating_sub(dimension.slack_max)
                .max(earliest[position]);
        }

        Some(cumuls)
    }

    fn route_feasible(&self, vehicle: usize, route: &[NodeIdx]) -> bool {
        self.dimensions
            .iter()
            .all(|dimension| self.schedule(dimension, vehicle, route).is_some())
    }

    /// Cheapest feasible `(cost delta, vehicle, position)` for inserting
    /// `node`, scanning vehicles and positions in a fixed order so ties
    /// resolve deterministically.
    fn best_insertion(
        &self,
        routes: &[Vec<NodeIdx>],
        node: NodeIdx,
    ) -> Option<(i64, usize, usize)> {
        let mut best: Option<(i64, usize, usize)> = None;

        for (vehicle, route) in routes.iter().enumerate() {
            if !self.may_serve(vehicle, node) {
                continue;
            }

            let mut candidate = route.clone();
            for position in 1..route.len() {
                candidate.insert(position, node);

                if self.route_feasible(vehicle, &candidate) {
                    let delta = self.arc_cost(vehicle, route[position - 1], node)
                        + self.arc_cost(vehicle, node, route[position])
                        - self.arc_cost(vehicle, route[position - 1], route[position]);

                    if best.is_none_or(|(best_delta, _, _)| delta < best_delta) {
                        best = Some((delta, vehicle, position));
                    }
                }

                candidate.remove(position);
            }
        }

        best
    }

    /// First-improvement descent over three moves: bring a dropped node back
    /// when its penalty beats the insertion cost, relocate a stop (possibly
    /// dropping it instead), and swap two stops across routes.
    fn improve(
        &self,
        routes: &mut Vec<Vec<NodeIdx>>,
        dropped: &mut Vec<NodeIdx>,
        deadline: Timestamp,
    ) {
        loop {
            if Timestamp::now() >= deadline {
                debug!("local search stopped by deadline");
                return;
            }

            if self.reinsert_dropped(routes, dropped)
                || self.relocate(routes, dropped)
                || self.exchange_with_dropped(routes, dropped)
                || self.swap(routes)
            {
                continue;
            }

            return;
        }
    }

    fn reinsert_dropped(&self, routes: &mut [Vec<NodeIdx>], dropped: &mut Vec<NodeIdx>) -> bool {
        for index in 0..dropped.len() {
            let node = dropped[index];
            let penalty = self.disjunctions.get(&node).copied().unwrap_or(0);
            if let Some((delta, vehicle, position)) = self.best_insertion(routes, node)
                && delta < penalty
            {
                routes[vehicle].insert(position, node);
                dropped.remove(index);
                return true;
            }
        }

        false
    }

    fn relocate(&self, routes: &mut [Vec<NodeIdx>], dropped: &mut Vec<NodeIdx>) -> bool {
        for vehicle in 0..routes.len() {
            for position in 1..routes[vehicle].len().saturating_sub(1) {
                let node = routes[vehicle][position];

                let mut remaining: Vec<Vec<NodeIdx>> = routes.to_vec();
                remaining[vehicle].remove(position);
                if !self.route_feasible(vehicle, &remaining[vehicle]) {
                    continue;
                }

                let removal_gain = self.route_cost(vehicle, &routes[vehicle])
                    - self.route_cost(vehicle, &remaining[vehicle]);

                // Dropping can beat any reinsertion when the node's penalty
                // is below what the detour costs.
                let penalty = self.disjunctions.get(&node).copied();
                if let Some(penalty) = penalty
                    && penalty < removal_gain
                {
                    routes[vehicle].remove(position);
                    dropped.push(node);
                    return true;
                }

                if let Some((delta, target, target_position)) =
                    self.best_insertion(&remaining, node)
                    && delta < removal_gain
                {
                    remaining[target].insert(target_position, node);
                    routes.clone_from_slice(&remaining);
                    return true;
                }
            }
        }

        false
    }

    /// Trades a droppable routed stop for a dropped node when the pair of
    /// penalties and detours comes out ahead. This is what lets a cheap
    /// optional visit make way for a rewarding one that missed construction.
    fn exchange_with_dropped(
        &self,
        routes: &mut [Vec<NodeIdx>],
        dropped: &mut Vec<NodeIdx>,
    ) -> bool {
        for vehicle in 0..routes.len() {
            for position in 1..routes[vehicle].len().saturating_sub(1) {
                let routed = routes[vehicle][position];
                let Some(&routed_penalty) = self.disjunctions.get(&routed) else {
                    continue;
                };

                let mut remaining: Vec<Vec<NodeIdx>> = routes.to_vec();
                remaining[vehicle].remove(position);
                if !self.route_feasible(vehicle, &remaining[vehicle]) {
                    continue;
                }

                let removal_gain = self.route_cost(vehicle, &routes[vehicle])
                    - self.route_cost(vehicle, &remaining[vehicle]);

                for index in 0..dropped.len() {
                    let candidate = dropped[index];
                    let candidate_penalty =
                        self.disjunctions.get(&candidate).copied().unwrap_or(0);

                    let Some((delta, target, target_position)) =
                        self.best_insertion(&remaining, candidate)
                    else {
                        continue;
                    };

                    let move_delta =
                        routed_penalty - removal_gain + delta - candidate_penalty;
                    if move_delta < 0 {
                        remaining[target].insert(target_position, candidate);
                        routes.clone_from_slice(&remaining);
                        dropped.remove(index);
                        dropped.push(routed);
                        return true;
                    }
                }
            }
        }

        false
    }

    fn swap(&self, routes: &mut [Vec<NodeIdx>]) -> bool {
        let current: i64 = routes
            .iter()
            .enumerate()
            .map(|(vehicle, route)| self.route_cost(vehicle, route))
            .sum();

        for first_vehicle in 0..routes.len() {
            for first in 1..routes[first_vehicle].len().saturating_sub(1) {
                for second_vehicle in first_vehicle..routes.len() {
                    let second_from = if second_vehicle == first_vehicle {
                        first + 1
                    } else {
                        1
                    };

                    for second in second_from..routes[second_vehicle].len().saturating_sub(1) {
                        let first_node = routes[first_vehicle][first];
                        let second_node = routes[second_vehicle][second];

                        if !self.may_serve(first_vehicle, second_node)
                            || !self.may_serve(second_vehicle, first_node)
                        {
                            continue;
                        }

                        let mut candidate: Vec<Vec<NodeIdx>> = routes.to_vec();
                        candidate[first_vehicle][first] = second_node;
                        candidate[second_vehicle][second] = first_node;

                        if !self.route_feasible(first_vehicle, &candidate[first_vehicle])
                            || !self.route_feasible(second_vehicle, &candidate[second_vehicle])
                        {
                            continue;
                        }

                        let changed: i64 = candidate
                            .iter()
                            .enumerate()
                            .map(|(vehicle, route)| self.route_cost(vehicle, route))
                            .sum();

                        if changed < current {
                            routes.clone_from_slice(&candidate);
                            return true;
                        }
                    }
                }
            }
        }

        false
    }
}
