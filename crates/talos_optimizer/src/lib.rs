use std::sync::Arc;

use rand::Rng;
use tracing::warn;

pub mod error;
pub mod json;
pub mod problem;
pub mod solver;
mod utils;

#[cfg(test)]
pub(crate) mod test_utils;

use error::SolveError;
use problem::scheduling_problem::SchedulingProblem;
use solver::{
    extract::extract,
    geometry::TravelGeometry,
    nodes::NodeGraph,
    precedence::build_precedence_matrix,
    routing::{insertion::InsertionSolver, model::RoutingModel, solver::RoutingSolver},
    solution::Itinerary,
    solver_params::SolverParams,
    vehicle::build_vehicles,
};

/// Runs one full solve with the built-in routing back-end.
pub fn solve(
    problem: &SchedulingProblem,
    params: &SolverParams,
) -> Result<Itinerary, SolveError> {
    solve_with(problem, params, Box::new(InsertionSolver::default()))
}

/// Runs one full solve against a caller-provided routing back-end: node
/// expansion, geometry, per-vehicle matrices, precedence, model build,
/// search, extraction.
pub fn solve_with(
    problem: &SchedulingProblem,
    params: &SolverParams,
    backend: Box<dyn RoutingSolver>,
) -> Result<Itinerary, SolveError> {
    let graph = timer_debug!("node expansion", NodeGraph::expand(problem));
    let geometry = timer_debug!("geometry", TravelGeometry::build(problem, &graph))?;

    let seed = params.seed.unwrap_or_else(|| rand::rng().random());
    let vehicles = timer_debug!(
        "vehicle matrices",
        build_vehicles(problem, &graph, &geometry, seed)
    );
    let precedence = Arc::new(build_precedence_matrix(problem, &graph));

    let mut model = RoutingModel::build(problem, &graph, &vehicles, precedence, backend, params)?;

    let assignment = timer_debug!("search", model.solve());
    if assignment.is_none() {
        warn!("no assignment found within the time limit, every job is skipped");
    }

    Ok(extract(&model, assignment.as_ref()))
}
