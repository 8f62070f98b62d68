use serde_json::Value;

use talos_optimizer::{
    json::{
        solution::{JsonSolution, JsonVisit},
        types::JsonProblem,
    },
    problem::scheduling_problem::SchedulingProblem,
    solver::solver_params::SolverParams,
};

pub fn parse(document: Value) -> JsonProblem {
    serde_json::from_value(document).expect("fixture document must deserialize")
}

pub fn solve_document(document: Value, seed: u64) -> (SchedulingProblem, JsonSolution) {
    let problem = parse(document)
        .build_problem()
        .expect("fixture document must validate");

    let itinerary = talos_optimizer::solve(
        &problem,
        &SolverParams {
            seed: Some(seed),
            ..SolverParams::default()
        },
    )
    .expect("solve must succeed");

    let solution = JsonSolution::from_itinerary(&problem, &itinerary);
    (problem, solution)
}

pub fn visit_of<'a>(solution: &'a JsonSolution, place_id: &str) -> &'a JsonVisit {
    solution
        .visits
        .iter()
        .find(|visit| visit.place_id == place_id)
        .unwrap_or_else(|| panic!("expected a visit at {place_id}"))
}
