use std::sync::Arc;

use crate::{
    error::SolveError,
    problem::scheduling_problem::SchedulingProblem,
    solver::{
        matrix::SquareMatrix,
        nodes::{NodeGraph, NodeIdx},
        solver_params::SolverParams,
        vehicle::{COST_SCALE, Vehicle, VehicleIdx},
    },
};

use super::solver::{
    Assignment, DimensionIdx, RouteVar, RoutingIndexManager, RoutingSolver, SearchParams,
};

pub const TIME_DIMENSION: &str = "SecondsSinceT0";
pub const PRECEDENCE_DIMENSION: &str = "Precedence";

/// Wires the vehicle matrices, windows, eligibility, precedence and
/// disjunction penalties into an abstract [`RoutingSolver`], then runs it
/// once. Construction order matters: the index manager must exist before
/// callbacks, and callbacks before dimensions.
pub struct RoutingModel<'a> {
    problem: &'a SchedulingProblem,
    graph: &'a NodeGraph,
    vehicles: &'a [Vehicle],
    solver: Box<dyn RoutingSolver>,
    time_dimension: DimensionIdx,
    search: SearchParams,
}

impl<'a> RoutingModel<'a> {
    pub fn build(
        problem: &'a SchedulingProblem,
        graph: &'a NodeGraph,
        vehicles: &'a [Vehicle],
        precedence: Arc<SquareMatrix<i64>>,
        mut solver: Box<dyn RoutingSolver>,
        params: &SolverParams,
    ) -> Result<Self, SolveError> {
        solver.set_index_manager(RoutingIndexManager::new(
            graph.len(),
            vehicles.iter().map(Vehicle::start_node).collect(),
            vehicles.iter().map(Vehicle::end_node).collect(),
        ));

        for (index, vehicle) in vehicles.iter().enumerate() {
            let cost = Arc::clone(vehicle.cost_matrix());
            let callback =
                solver.register_transit_callback(Box::new(move |from, to| cost.get(from, to)));
            solver.set_vehicle_arc_cost(VehicleIdx::new(index), callback);
        }

        let time_dimension = Self::add_time_dimension(problem, graph, vehicles, &mut *solver)?;
        Self::restrict_vehicles(problem, graph, vehicles, &mut *solver)?;
        Self::add_disjunctions(problem, graph, vehicles, &mut *solver);
        Self::add_precedence_dimension(vehicles, precedence, &mut *solver);

        let search = SearchParams {
            first_solution: params.first_solution,
            metaheuristic: params.metaheuristic,
            time_limit: params.time_limit.unwrap_or(problem.config().timeout),
        };

        Ok(RoutingModel {
            problem,
            graph,
            vehicles,
            solver,
            time_dimension,
            search,
        })
    }

    pub fn time_dimension(&self) -> DimensionIdx {
        self.time_dimension
    }

    pub fn solve(&mut self) -> Option<Assignment> {
        self.solver.solve(&self.search)
    }

    fn add_time_dimension(
        problem: &SchedulingProblem,
        graph: &NodeGraph,
        vehicles: &[Vehicle],
        solver: &mut dyn RoutingSolver,
    ) -> Result<DimensionIdx, SolveError> {
        let transits = vehicles
            .iter()
            .map(|vehicle| {
                let time = Arc::clone(vehicle.time_matrix());
                solver.register_transit_callback(Box::new(move |from, to| time.get(from, to)))
            })
            .collect();

        let dimension = solver.add_dimension(
            transits,
            problem.config().max_idle_seconds(),
            i64::MAX,
            false,
            TIME_DIMENSION,
        );

        let t_zero = problem.t_zero();
        for (node_idx, node) in graph.nodes_iter() {
            let Some((open, close)) = node.window() else {
                continue;
            };

            // A required window that already closed relative to T-zero can
            // never be met; surface that here rather than as a silent
            // infeasibility.
            if let crate::problem::place::PlaceRef::Job(job) = node.place()
                && close == 0
                && problem.job(job).window().close() < t_zero
                && !node.is_skippable()
            {
                return Err(SolveError::InvalidWindow(
                    problem.job(job).external_id().to_owned(),
                ));
            }

            solver.set_cumul_range(dimension, RouteVar::Node(node_idx), open, close);
        }

        for (index, vehicle) in vehicles.iter().enumerate() {
            let worker = problem.worker(vehicle.driver());
            let earliest = worker
                .earliest_start()
                .map(|earliest| earliest.duration_since(t_zero).as_secs().max(0))
                .unwrap_or(0);
            let latest = worker
                .latest_end()
                .map(|latest| latest.duration_since(t_zero).as_secs().max(0))
                .unwrap_or(i64::MAX);

            let vehicle_idx = VehicleIdx::new(index);
            solver.set_cumul_range(dimension, RouteVar::Start(vehicle_idx), earliest, latest);
            solver.set_cumul_range(dimension, RouteVar::End(vehicle_idx), earliest, latest);
        }

        Ok(dimension)
    }

    /// A job head may only be served by vehicles whose driver can complete
    /// every required task, narrowed further by guarantees.
    fn restrict_vehicles(
        problem: &SchedulingProblem,
        graph: &NodeGraph,
        vehicles: &[Vehicle],
        solver: &mut dyn RoutingSolver,
    ) -> Result<(), SolveError> {
        for (job_idx, job) in problem.jobs_iter() {
            let head_idx = graph.job_head_node(job_idx);
            let head = graph.node(head_idx);

            let mut eligible: Vec<VehicleIdx> = vehicles
                .iter()
                .enumerate()
                .filter(|(_, vehicle)| {
                    let worker = problem.worker(vehicle.driver());
                    job.required_tasks().all(|task| {
                        worker.capability(task.tool()).is_some_and(|capability| {
                            capability
                                .completion_chance()
                                .unwrap_or(problem.tool(task.tool()).default_completion_chance())
                                > 0.0
                        })
                    })
                })
                .map(|(index, _)| VehicleIdx::new(index))
                .collect();

            for guarantee in problem.guarantees() {
                if guarantee.job != job_idx {
                    continue;
                }
                let guaranteed: Vec<VehicleIdx> = vehicles
                    .iter()
                    .enumerate()
                    .filter(|(_, vehicle)| vehicle.driver() == guarantee.worker)
                    .map(|(index, _)| VehicleIdx::new(index))
                    .collect();

                if guarantee.must_visit {
                    eligible.retain(|vehicle| guaranteed.contains(vehicle));
                } else {
                    eligible.retain(|vehicle| !guaranteed.contains(vehicle));
                }
            }

            if eligible.is_empty() && !head.is_skippable() {
                return Err(SolveError::NoViableWorker(job.external_id().to_owned()));
            }

            solver.set_allowed_vehicles(head_idx, &eligible);
        }

        Ok(())
    }

    /// Every skippable node may be dropped at a penalty growing with the
    /// work it carries; a must-visit guarantee removes the escape hatch.
    /// Hub nodes no vehicle is homed at are droppable for free.
    fn add_disjunctions(
        problem: &SchedulingProblem,
        graph: &NodeGraph,
        vehicles: &[Vehicle],
        solver: &mut dyn RoutingSolver,
    ) {
        let must_visit_jobs: Vec<crate::problem::job::JobIdx> = problem
            .guarantees()
            .iter()
            .filter(|guarantee| guarantee.must_visit)
            .map(|guarantee| guarantee.job)
            .collect();

        for (node_idx, node) in graph.nodes_iter() {
            if node.place().is_hub() {
                let homed = vehicles.iter().any(|vehicle| {
                    vehicle.start_node() == node_idx || vehicle.end_node() == node_idx
                });
                if !homed {
                    solver.add_disjunction(&[node_idx], 0);
                }
                continue;
            }

            if !node.is_skippable() {
                continue;
            }

            if let crate::problem::place::PlaceRef::Job(job) = node.place()
                && node.is_head()
                && must_visit_jobs.contains(&job)
            {
                continue;
            }

            let penalty = COST_SCALE as i64 * (node.tasks().len() as i64 + 1);
            solver.add_disjunction(&[node_idx], penalty);
        }
    }

    fn add_precedence_dimension(
        vehicles: &[Vehicle],
        precedence: Arc<SquareMatrix<i64>>,
        solver: &mut dyn RoutingSolver,
    ) {
        let callback = solver
            .register_transit_callback(Box::new(move |from, to| precedence.get(from, to)));
        let transits = vehicles.iter().map(|_| callback).collect();

        solver.add_dimension(transits, 0, 0, true, PRECEDENCE_DIMENSION);
    }

    pub fn problem(&self) -> &SchedulingProblem {
        self.problem
    }

    pub fn graph(&self) -> &NodeGraph {
        self.graph
    }

    pub fn vehicles(&self) -> &[Vehicle] {
        self.vehicles
    }
}
