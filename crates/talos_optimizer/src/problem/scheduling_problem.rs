use jiff::Timestamp;

use super::{
    config::SolverConfig,
    guarantee::Guarantee,
    job::{Job, JobIdx},
    location::Location,
    metric::{Metric, MetricIdx, MetricKind},
    place::{Hub, HubIdx, PlaceRef},
    tool::{Tool, ToolIdx},
    worker::{Worker, WorkerIdx},
};

/// The validated problem. Every cross-entity reference has been resolved to
/// an index handle; all times are absolute `jiff::Timestamp`s, all durations
/// seconds. Immutable once built.
#[derive(Debug, PartialEq)]
pub struct SchedulingProblem {
    tools: Vec<Tool>,
    metrics: Vec<Metric>,
    hubs: Vec<Hub>,
    jobs: Vec<Job>,
    workers: Vec<Worker>,
    guarantees: Vec<Guarantee>,
    config: SolverConfig,
    t_zero: Timestamp,
}

impl SchedulingProblem {
    pub(crate) fn new(
        tools: Vec<Tool>,
        metrics: Vec<Metric>,
        hubs: Vec<Hub>,
        jobs: Vec<Job>,
        workers: Vec<Worker>,
        guarantees: Vec<Guarantee>,
        config: SolverConfig,
        t_zero: Timestamp,
    ) -> Self {
        SchedulingProblem {
            tools,
            metrics,
            hubs,
            jobs,
            workers,
            guarantees,
            config,
            t_zero,
        }
    }

    pub fn tools(&self) -> &[Tool] {
        &self.tools
    }

    pub fn tool(&self, index: ToolIdx) -> &Tool {
        &self.tools[index]
    }

    pub fn metrics(&self) -> &[Metric] {
        &self.metrics
    }

    pub fn metric(&self, index: MetricIdx) -> &Metric {
        &self.metrics[index]
    }

    pub fn metrics_iter(&self) -> impl Iterator<Item = (MetricIdx, &Metric)> {
        self.metrics
            .iter()
            .enumerate()
            .map(|(index, metric)| (MetricIdx::new(index), metric))
    }

    pub fn has_metric_kind(&self, kind: MetricKind) -> bool {
        self.metrics.iter().any(|metric| metric.kind() == kind)
    }

    pub fn hubs(&self) -> &[Hub] {
        &self.hubs
    }

    pub fn hub(&self, index: HubIdx) -> &Hub {
        &self.hubs[index]
    }

    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    pub fn job(&self, index: JobIdx) -> &Job {
        &self.jobs[index]
    }

    pub fn jobs_iter(&self) -> impl Iterator<Item = (JobIdx, &Job)> {
        self.jobs
            .iter()
            .enumerate()
            .map(|(index, job)| (JobIdx::new(index), job))
    }

    pub fn workers(&self) -> &[Worker] {
        &self.workers
    }

    pub fn worker(&self, index: WorkerIdx) -> &Worker {
        &self.workers[index]
    }

    pub fn workers_iter(&self) -> impl Iterator<Item = (WorkerIdx, &Worker)> {
        self.workers
            .iter()
            .enumerate()
            .map(|(index, worker)| (WorkerIdx::new(index), worker))
    }

    pub fn guarantees(&self) -> &[Guarantee] {
        &self.guarantees
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Reference timestamp. All route times are seconds since this instant.
    pub fn t_zero(&self) -> Timestamp {
        self.t_zero
    }

    pub fn place_id(&self, place: PlaceRef) -> &str {
        match place {
            PlaceRef::Hub(hub) => self.hubs[hub].external_id(),
            PlaceRef::Job(job) => self.jobs[job].external_id(),
        }
    }

    pub fn place_location(&self, place: PlaceRef) -> Option<&Location> {
        match place {
            PlaceRef::Hub(hub) => self.hubs[hub].location(),
            PlaceRef::Job(job) => self.jobs[job].location(),
        }
    }
}
