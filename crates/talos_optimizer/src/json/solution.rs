use std::collections::BTreeMap;

use jiff::Timestamp;
use schemars::JsonSchema;
use serde::Serialize;

use crate::{problem::scheduling_problem::SchedulingProblem, solver::solution::Itinerary};

#[derive(Serialize, JsonSchema, Debug)]
#[serde(rename_all = "camelCase", rename = "Visit")]
pub struct JsonVisit {
    pub place_id: String,
    pub worker_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arrival_time: Option<Timestamp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub departure_time: Option<Timestamp>,
    pub earned_rewards: BTreeMap<String, f64>,
    pub completed_tasks: Vec<String>,
}

/// The output document: every worker's visits in route order, the jobs no
/// worker took, per-metric totals in input units and the solver objective.
#[derive(Serialize, JsonSchema, Debug)]
#[serde(rename_all = "camelCase", rename = "Solution")]
pub struct JsonSolution {
    pub visits: Vec<JsonVisit>,
    pub skipped_jobs: Vec<String>,
    pub total_metrics: BTreeMap<String, f64>,
    pub total_cost: i64,
}

impl JsonSolution {
    pub fn from_itinerary(problem: &SchedulingProblem, itinerary: &Itinerary) -> Self {
        let visits = itinerary
            .visits
            .iter()
            .map(|visit| JsonVisit {
                place_id: problem.place_id(visit.place).to_owned(),
                worker_id: problem.worker(visit.worker).external_id().to_owned(),
                arrival_time: visit.arrival_time,
                departure_time: visit.departure_time,
                earned_rewards: visit
                    .earned_rewards
                    .iter()
                    .map(|(&metric, &amount)| {
                        (problem.metric(metric).external_id().to_owned(), amount)
                    })
                    .collect(),
                completed_tasks: visit
                    .completed_tasks
                    .iter()
                    .map(|handle| {
                        problem
                            .job(handle.job)
                            .task(handle.index)
                            .external_id()
                            .to_owned()
                    })
                    .collect(),
            })
            .collect();

        JsonSolution {
            visits,
            skipped_jobs: itinerary
                .skipped_jobs
                .iter()
                .map(|&job| problem.job(job).external_id().to_owned())
                .collect(),
            total_metrics: itinerary
                .total_metrics
                .iter()
                .map(|&(metric, amount)| {
                    (problem.metric(metric).external_id().to_owned(), amount)
                })
                .collect(),
            total_cost: itinerary.total_cost,
        }
    }
}
