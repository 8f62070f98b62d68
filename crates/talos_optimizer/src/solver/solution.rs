use fxhash::FxHashMap;
use jiff::Timestamp;

use crate::problem::{
    job::{JobIdx, TaskHandle},
    metric::MetricIdx,
    place::PlaceRef,
    scheduling_problem::SchedulingProblem,
    worker::WorkerIdx,
};

/// One stop on a worker's route. The start-hub visit has only a departure
/// time, the end-hub visit only an arrival time.
#[derive(Debug, Clone)]
pub struct Visit {
    pub place: PlaceRef,
    pub worker: WorkerIdx,
    pub arrival_time: Option<Timestamp>,
    pub departure_time: Option<Timestamp>,
    pub work_seconds: i64,
    pub earned_rewards: FxHashMap<MetricIdx, f64>,
    pub completed_tasks: Vec<TaskHandle>,
}

/// The extracted result of a solve: ordered visits per worker, per-metric
/// totals in input units, and the jobs no worker took.
#[derive(Debug, Clone)]
pub struct Itinerary {
    pub visits: Vec<Visit>,
    pub skipped_jobs: Vec<JobIdx>,
    pub total_metrics: Vec<(MetricIdx, f64)>,
    pub total_cost: i64,
}

impl Itinerary {
    /// No assignment: nobody goes anywhere and every job is skipped.
    pub fn empty(problem: &SchedulingProblem) -> Self {
        Itinerary {
            visits: Vec::new(),
            skipped_jobs: (0..problem.jobs().len()).map(JobIdx::new).collect(),
            total_metrics: problem
                .metrics_iter()
                .map(|(metric, _)| (metric, 0.0))
                .collect(),
            total_cost: 0,
        }
    }

    pub fn visits_of(&self, worker: WorkerIdx) -> impl Iterator<Item = &Visit> {
        self.visits.iter().filter(move |visit| visit.worker == worker)
    }

    pub fn visited_job(&self, job: JobIdx) -> bool {
        !self.skipped_jobs.contains(&job)
    }
}
