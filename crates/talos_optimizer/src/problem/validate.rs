use fxhash::FxHashMap;
use jiff::{SignedDuration, Timestamp};
use smallvec::SmallVec;
use tracing::warn;

use crate::{
    error::{ValidationError, ValidationErrorKind},
    json::types::{
        JsonGuarantee, JsonHub, JsonJob, JsonMetric, JsonProblem, JsonTool, JsonWorker,
    },
};

use super::{
    config::SolverConfig,
    guarantee::Guarantee,
    job::{ArrivalWindow, Job, JobIdx, Reward, Task},
    location::Location,
    metric::{Metric, MetricIdx, MetricKind, OptimizeMode},
    place::{Hub, HubIdx, PlaceRef},
    scheduling_problem::SchedulingProblem,
    tool::{Tool, ToolIdx},
    worker::{Capability, ModifierEffect, RewardModifier, Worker, WorkerIdx},
};

use ValidationErrorKind::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Phase {
    Config,
    Tools,
    Metrics,
    Hubs,
    Jobs,
    Workers,
    Guarantees,
}

/// Resolves the raw document into the problem model, step by step. Steps must
/// run in declaration order of [`Phase`] because later steps look up the
/// indexes built by earlier ones; calling them out of order is a bug in the
/// engine, not in the input, and panics.
#[derive(Default)]
pub(crate) struct Validator {
    phase: Option<Phase>,
    config: SolverConfig,
    tools: Vec<Tool>,
    tool_index: FxHashMap<String, ToolIdx>,
    metrics: Vec<Metric>,
    metric_index: FxHashMap<String, MetricIdx>,
    hubs: Vec<Hub>,
    hub_index: FxHashMap<String, HubIdx>,
    jobs: Vec<Job>,
    job_index: FxHashMap<String, JobIdx>,
    workers: Vec<Worker>,
    worker_index: FxHashMap<String, WorkerIdx>,
    guarantees: Vec<Guarantee>,
}

fn fail(context: impl Into<String>, kind: ValidationErrorKind) -> ValidationError {
    ValidationError::new(context, kind)
}

fn require<T>(value: Option<T>, context: &str) -> Result<T, ValidationError> {
    value.ok_or_else(|| fail(context, Missing))
}

fn require_id(value: Option<String>, context: &str) -> Result<String, ValidationError> {
    match value {
        Some(id) if !id.is_empty() => Ok(id),
        Some(_) => Err(fail(context, Empty)),
        None => Err(fail(context, Missing)),
    }
}

fn require_collection<T>(
    collection: Option<Vec<T>>,
    context: &str,
) -> Result<Vec<T>, ValidationError> {
    match collection {
        Some(items) if !items.is_empty() => Ok(items),
        Some(_) => Err(fail(context, Empty)),
        None => Err(fail(context, Missing)),
    }
}

impl Validator {
    pub(crate) fn validate(mut self, doc: JsonProblem) -> Result<SchedulingProblem, ValidationError> {
        self.validate_config(&doc)?;
        self.validate_tools(doc.tools)?;
        self.validate_metrics(doc.metrics)?;
        self.validate_hubs(doc.hubs)?;
        self.validate_jobs(doc.jobs)?;
        self.validate_workers(doc.workers)?;
        self.validate_guarantees(doc.guarantees)?;

        let t_zero = self.select_t_zero();
        self.demote_unreachable_jobs();

        Ok(SchedulingProblem::new(
            self.tools,
            self.metrics,
            self.hubs,
            self.jobs,
            self.workers,
            self.guarantees,
            self.config,
            t_zero,
        ))
    }

    fn enter(&mut self, phase: Phase) {
        let in_order = match (self.phase, phase) {
            (None, Phase::Config) => true,
            (Some(previous), _) => previous < phase,
            _ => false,
        };
        if !in_order {
            panic!(
                "validation phase {phase:?} invoked out of order (after {:?})",
                self.phase
            );
        }
        self.phase = Some(phase);
    }

    fn seconds_per_unit(&self) -> f64 {
        self.config.seconds_per_unit()
    }

    fn validate_config(&mut self, doc: &JsonProblem) -> Result<(), ValidationError> {
        self.enter(Phase::Config);

        let mut config = SolverConfig {
            t_zero: doc.t_zero,
            ..SolverConfig::default()
        };

        if let Some(timeout_seconds) = doc.timeout_seconds {
            if timeout_seconds < 1 {
                return Err(fail("timeoutSeconds", LessThanOrEqualToZero));
            }
            config.timeout = SignedDuration::from_secs(timeout_seconds);
        }

        if let Some(speed) = doc.default_travel_speed {
            if speed <= 0.0 {
                return Err(fail("defaultTravelSpeed", LessThanOrEqualToZero));
            }
            config.default_travel_speed = speed;
        }

        if let Some(max_idle_time) = doc.max_idle_time {
            if max_idle_time < 0.0 {
                return Err(fail("maxIdleTime", LessThanZero));
            }
            config.max_idle_time = max_idle_time;
        }

        if let Some(distance_unit) = doc.distance_unit {
            config.distance_unit = distance_unit;
        }
        if let Some(time_unit) = doc.time_unit {
            config.time_unit = time_unit;
        }
        if let Some(engine) = doc.engine {
            config.engine = engine;
        }

        self.config = config;
        Ok(())
    }

    fn validate_tools(&mut self, tools: Option<Vec<JsonTool>>) -> Result<(), ValidationError> {
        self.enter(Phase::Tools);

        for tool in require_collection(tools, "tools")? {
            let id = require_id(tool.id, "tools.id")?;
            let context = format!("tools.{id}");

            if self.tool_index.contains_key(&id) {
                return Err(fail(format!("{context}.id"), NotUnique));
            }

            let work_time = require(tool.work_time, &format!("{context}.workTime"))?;
            if work_time <= 0.0 {
                return Err(fail(format!("{context}.workTime"), LessThanOrEqualToZero));
            }

            let completion_chance = tool.completion_chance.unwrap_or(1.0);
            if completion_chance <= 0.0 {
                return Err(fail(
                    format!("{context}.completionChance"),
                    LessThanOrEqualToZero,
                ));
            }
            if completion_chance > 1.0 {
                return Err(fail(format!("{context}.completionChance"), Invalid));
            }

            let work_time =
                SignedDuration::from_secs_f64(work_time * self.seconds_per_unit());

            self.tool_index
                .insert(id.clone(), ToolIdx::new(self.tools.len()));
            self.tools.push(Tool::new(id, work_time, completion_chance));
        }

        Ok(())
    }

    fn validate_metrics(&mut self, metrics: Option<Vec<JsonMetric>>) -> Result<(), ValidationError> {
        self.enter(Phase::Metrics);

        for metric in require_collection(metrics, "metrics")? {
            let id = require_id(metric.id, "metrics.id")?;
            let context = format!("metrics.{id}");

            if self.metric_index.contains_key(&id) {
                return Err(fail(format!("{context}.id"), NotUnique));
            }

            let kind = require(metric.kind, &format!("{context}.type"))?;
            if kind != MetricKind::Custom
                && self.metrics.iter().any(|existing| existing.kind() == kind)
            {
                return Err(fail(format!("{context}.type"), NotUnique));
            }

            let weight = require(metric.weight, &format!("{context}.weight"))?;
            if weight < 0.0 {
                return Err(fail(format!("{context}.weight"), LessThanZero));
            }

            let mode = metric.mode.unwrap_or(OptimizeMode::Minimize);

            self.metric_index
                .insert(id.clone(), MetricIdx::new(self.metrics.len()));
            self.metrics.push(Metric::new(id, kind, mode, weight));
        }

        Ok(())
    }

    fn validate_hubs(&mut self, hubs: Option<Vec<JsonHub>>) -> Result<(), ValidationError> {
        self.enter(Phase::Hubs);

        for hub in require_collection(hubs, "hubs")? {
            let id = require_id(hub.id, "hubs.id")?;

            if self.hub_index.contains_key(&id) {
                return Err(fail(format!("hubs.{id}.id"), NotUnique));
            }

            let location = hub.location.map(|[x, y]| Location::from_cartesian(x, y));

            self.hub_index
                .insert(id.clone(), HubIdx::new(self.hubs.len()));
            self.hubs.push(Hub::new(id, location));
        }

        Ok(())
    }

    fn validate_jobs(&mut self, jobs: Option<Vec<JsonJob>>) -> Result<(), ValidationError> {
        self.enter(Phase::Jobs);

        for job in require_collection(jobs, "jobs")? {
            let id = require_id(job.id, "jobs.id")?;
            let context = format!("jobs.{id}");

            if self.job_index.contains_key(&id) {
                return Err(fail(format!("{context}.id"), NotUnique));
            }

            let window = require(job.arrival_window, &format!("{context}.arrivalWindow"))?;
            let open = require(window.open, &format!("{context}.arrivalWindow.open"))?;
            let close = require(window.close, &format!("{context}.arrivalWindow.close"))?;
            if close < open {
                return Err(fail(format!("{context}.arrivalWindow"), Invalid));
            }

            let mut tasks = Vec::new();
            for (index, task) in require_collection(job.tasks, &format!("{context}.tasks"))?
                .into_iter()
                .enumerate()
            {
                let task_context = format!("{context}.tasks.{index}");
                let task_id = require_id(task.id, &format!("{task_context}.id"))?;

                let tool_id = require_id(task.tool_id, &format!("{task_context}.toolId"))?;
                let tool = *self
                    .tool_index
                    .get(&tool_id)
                    .ok_or_else(|| fail(format!("{task_context}.toolId"), Unrecognized))?;

                let mut rewards = SmallVec::new();
                for (reward_index, reward) in
                    task.rewards.unwrap_or_default().into_iter().enumerate()
                {
                    let reward_context = format!("{task_context}.rewards.{reward_index}");
                    let metric_id =
                        require_id(reward.metric_id, &format!("{reward_context}.metricId"))?;
                    let metric = *self
                        .metric_index
                        .get(&metric_id)
                        .ok_or_else(|| fail(format!("{reward_context}.metricId"), Unrecognized))?;

                    let amount = require(reward.amount, &format!("{reward_context}.amount"))?;
                    if amount < 0.0 {
                        return Err(fail(format!("{reward_context}.amount"), LessThanZero));
                    }

                    rewards.push(Reward { metric, amount });
                }

                // Task order is the 1-based position within the job.
                tasks.push(Task::new(
                    task_id,
                    index as u32 + 1,
                    tool,
                    task.optional.unwrap_or(false),
                    rewards,
                ));
            }

            let location = job.location.map(|[x, y]| Location::from_cartesian(x, y));

            self.job_index
                .insert(id.clone(), JobIdx::new(self.jobs.len()));
            self.jobs.push(Job::new(
                id,
                location,
                ArrivalWindow::new(open, close),
                job.optional.unwrap_or(false),
                tasks,
            ));
        }

        Ok(())
    }

    fn validate_workers(&mut self, workers: Option<Vec<JsonWorker>>) -> Result<(), ValidationError> {
        self.enter(Phase::Workers);

        for worker in require_collection(workers, "workers")? {
            let id = require_id(worker.id, "workers.id")?;
            let context = format!("workers.{id}");

            if self.worker_index.contains_key(&id) {
                return Err(fail(format!("{context}.id"), NotUnique));
            }

            let start_hub_id = require_id(worker.start_hub_id, &format!("{context}.startHubId"))?;
            let start_hub = *self
                .hub_index
                .get(&start_hub_id)
                .ok_or_else(|| fail(format!("{context}.startHubId"), Unrecognized))?;

            let end_hub_id = require_id(worker.end_hub_id, &format!("{context}.endHubId"))?;
            let end_hub = *self
                .hub_index
                .get(&end_hub_id)
                .ok_or_else(|| fail(format!("{context}.endHubId"), Unrecognized))?;

            if let (Some(earliest), Some(latest)) =
                (worker.earliest_start_time, worker.latest_end_time)
                && earliest > latest
            {
                return Err(fail(format!("{context}.earliestStartTime"), Invalid));
            }

            let travel_speed_factor = worker.travel_speed_factor.unwrap_or(1.0);
            if travel_speed_factor <= 0.0 {
                return Err(fail(
                    format!("{context}.travelSpeedFactor"),
                    LessThanOrEqualToZero,
                ));
            }

            let mut capabilities = FxHashMap::default();
            for capability in worker.capabilities.unwrap_or_default() {
                let tool_id =
                    require_id(capability.tool_id, &format!("{context}.capabilities.toolId"))?;
                let capability_context = format!("{context}.capabilities.{tool_id}");

                let tool = *self
                    .tool_index
                    .get(&tool_id)
                    .ok_or_else(|| fail(format!("{capability_context}.toolId"), Unrecognized))?;

                if capabilities.contains_key(&tool) {
                    return Err(fail(format!("{capability_context}.toolId"), NotUnique));
                }

                if let Some(work_time) = capability.work_time
                    && work_time < 0.0
                {
                    return Err(fail(format!("{capability_context}.workTime"), LessThanZero));
                }

                let work_time_factor = capability.work_time_factor.unwrap_or(1.0);
                if work_time_factor <= 0.0 {
                    return Err(fail(
                        format!("{capability_context}.workTimeFactor"),
                        LessThanOrEqualToZero,
                    ));
                }

                if let Some(chance) = capability.completion_chance
                    && !(0.0..=1.0).contains(&chance)
                {
                    return Err(fail(
                        format!("{capability_context}.completionChance"),
                        Invalid,
                    ));
                }

                let mut reward_factors = FxHashMap::default();
                for (metric_id, factor) in capability.reward_factors.unwrap_or_default() {
                    let factor_context = format!("{capability_context}.rewardFactors.{metric_id}");
                    let metric = *self
                        .metric_index
                        .get(&metric_id)
                        .ok_or_else(|| fail(&factor_context, Unrecognized))?;
                    if factor < 0.0 {
                        return Err(fail(&factor_context, LessThanZero));
                    }
                    reward_factors.insert(metric, factor);
                }

                capabilities.insert(
                    tool,
                    Capability::new(
                        capability
                            .work_time
                            .map(|work_time| {
                                SignedDuration::from_secs_f64(
                                    work_time * self.seconds_per_unit(),
                                )
                            }),
                        work_time_factor,
                        capability.completion_chance,
                        reward_factors,
                    ),
                );
            }

            let mut reward_modifiers = Vec::new();
            for (index, modifier) in worker
                .reward_modifiers
                .unwrap_or_default()
                .into_iter()
                .enumerate()
            {
                let modifier_context = format!("{context}.rewardModifiers.{index}");

                let metric_id =
                    require_id(modifier.metric_id, &format!("{modifier_context}.metricId"))?;
                let metric = *self
                    .metric_index
                    .get(&metric_id)
                    .ok_or_else(|| fail(format!("{modifier_context}.metricId"), Unrecognized))?;

                if modifier.tool_id.is_some() && modifier.place_id.is_some() {
                    return Err(fail(&modifier_context, Invalid));
                }

                let tool = modifier
                    .tool_id
                    .map(|tool_id| {
                        self.tool_index.get(&tool_id).copied().ok_or_else(|| {
                            fail(format!("{modifier_context}.toolId"), Unrecognized)
                        })
                    })
                    .transpose()?;

                let place = modifier
                    .place_id
                    .map(|place_id| {
                        self.resolve_place(&place_id).ok_or_else(|| {
                            fail(format!("{modifier_context}.placeId"), Unrecognized)
                        })
                    })
                    .transpose()?;

                let effect = match (modifier.factor, modifier.amount) {
                    (Some(factor), None) => ModifierEffect::Factor(factor),
                    (None, Some(amount)) => ModifierEffect::Amount(amount),
                    (Some(_), Some(_)) => return Err(fail(&modifier_context, Invalid)),
                    (None, None) => return Err(fail(&modifier_context, MissingOrEmpty)),
                };

                reward_modifiers.push(RewardModifier {
                    metric,
                    tool,
                    place,
                    effect,
                });
            }

            self.worker_index
                .insert(id.clone(), WorkerIdx::new(self.workers.len()));
            self.workers.push(Worker::new(
                id,
                start_hub,
                end_hub,
                worker.earliest_start_time,
                worker.latest_end_time,
                travel_speed_factor,
                capabilities,
                reward_modifiers,
            ));
        }

        Ok(())
    }

    fn validate_guarantees(
        &mut self,
        guarantees: Option<Vec<JsonGuarantee>>,
    ) -> Result<(), ValidationError> {
        self.enter(Phase::Guarantees);

        for (index, guarantee) in guarantees.unwrap_or_default().into_iter().enumerate() {
            let context = format!("guarantees.{index}");

            let worker_id = require_id(guarantee.worker_id, &format!("{context}.workerId"))?;
            let worker = *self
                .worker_index
                .get(&worker_id)
                .ok_or_else(|| fail(format!("{context}.workerId"), Unrecognized))?;

            // Guarantees bind to job head nodes only.
            let place_id = require_id(guarantee.place_id, &format!("{context}.placeId"))?;
            let job = *self
                .job_index
                .get(&place_id)
                .ok_or_else(|| fail(format!("{context}.placeId"), Unrecognized))?;

            let must_visit = guarantee.must_visit.unwrap_or(false);

            if must_visit
                && self
                    .guarantees
                    .iter()
                    .any(|existing| existing.job == job && existing.must_visit)
            {
                return Err(fail(format!("{context}.placeId"), NotUnique));
            }

            self.guarantees.push(Guarantee {
                worker,
                job,
                must_visit,
            });
        }

        Ok(())
    }

    fn resolve_place(&self, place_id: &str) -> Option<PlaceRef> {
        if let Some(&hub) = self.hub_index.get(place_id) {
            return Some(PlaceRef::Hub(hub));
        }
        self.job_index.get(place_id).map(|&job| PlaceRef::Job(job))
    }

    /// Reference timestamp: the explicit override when given, otherwise the
    /// minimum of all worker earliest starts and job window opens. Without
    /// any worker earliest start, absolute anchoring degrades to relative
    /// seconds from the minimum representable instant.
    fn select_t_zero(&self) -> Timestamp {
        if let Some(t_zero) = self.config.t_zero {
            return t_zero;
        }

        let earliest_worker_start = self
            .workers
            .iter()
            .filter_map(|worker| worker.earliest_start())
            .min();

        match earliest_worker_start {
            Some(earliest) => self
                .jobs
                .iter()
                .map(|job| job.window().open())
                .chain(std::iter::once(earliest))
                .min()
                .unwrap_or(earliest),
            None => Timestamp::MIN,
        }
    }

    /// A job whose window closes before any worker can start can never be
    /// served; demote it to optional so the solve stays feasible.
    fn demote_unreachable_jobs(&mut self) {
        let Some(earliest_worker_start) = self
            .workers
            .iter()
            .filter_map(|worker| worker.earliest_start())
            .min()
        else {
            return;
        };

        for job in &mut self.jobs {
            if !job.is_optional() && job.window().close() < earliest_worker_start {
                warn!(
                    job = job.external_id(),
                    "arrival window closes before any worker starts, marking job optional"
                );
                job.mark_optional();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::test_utils::{basic_document, job, tool, worker};

    use super::*;

    #[test]
    fn test_valid_document_builds() {
        let problem = basic_document().build_problem().unwrap();

        assert_eq!(problem.tools().len(), 1);
        assert_eq!(problem.metrics().len(), 2);
        assert_eq!(problem.hubs().len(), 1);
        assert_eq!(problem.jobs().len(), 1);
        assert_eq!(problem.workers().len(), 1);
    }

    #[test]
    fn test_missing_tools_collection() {
        let mut doc = basic_document();
        doc.tools = None;

        let error = doc.build_problem().unwrap_err();
        assert_eq!(error.kind, Missing);
        assert_eq!(error.context, "tools");
        assert_eq!(
            error.to_string(),
            "Validation failed because tools is Missing."
        );
    }

    #[test]
    fn test_empty_tools_collection() {
        let mut doc = basic_document();
        doc.tools = Some(Vec::new());

        let error = doc.build_problem().unwrap_err();
        assert_eq!(error.kind, Empty);
        assert_eq!(error.context, "tools");
    }

    #[test]
    fn test_blank_tool_id() {
        let mut doc = basic_document();
        doc.tools = Some(vec![tool("", 10.0)]);

        let error = doc.build_problem().unwrap_err();
        assert_eq!(error.kind, Empty);
        assert_eq!(error.context, "tools.id");
    }

    #[test]
    fn test_modifier_without_factor_or_amount() {
        let mut doc = basic_document();
        doc.workers.as_mut().unwrap()[0].reward_modifiers =
            Some(vec![crate::json::types::JsonRewardModifier {
                metric_id: Some("payout".to_owned()),
                tool_id: None,
                place_id: None,
                factor: None,
                amount: None,
            }]);

        let error = doc.build_problem().unwrap_err();
        assert_eq!(error.kind, MissingOrEmpty);
        assert_eq!(error.context, "workers.w1.rewardModifiers.0");
    }

    #[test]
    fn test_duplicate_tool_id() {
        let mut doc = basic_document();
        doc.tools = Some(vec![tool("wrench", 10.0), tool("wrench", 5.0)]);

        let error = doc.build_problem().unwrap_err();
        assert_eq!(error.kind, NotUnique);
        assert_eq!(error.context, "tools.wrench.id");
    }

    #[test]
    fn test_non_positive_tool_work_time() {
        let mut doc = basic_document();
        doc.tools = Some(vec![tool("wrench", 0.0)]);

        let error = doc.build_problem().unwrap_err();
        assert_eq!(error.kind, LessThanOrEqualToZero);
        assert_eq!(error.context, "tools.wrench.workTime");
    }

    #[test]
    fn test_duplicate_builtin_metric_kind() {
        let mut doc = basic_document();
        let mut extra = crate::test_utils::metric("more-time", MetricKind::TravelTime, 1.0);
        extra.id = Some("more-time".to_owned());
        doc.metrics.as_mut().unwrap().push(extra);

        let error = doc.build_problem().unwrap_err();
        assert_eq!(error.kind, NotUnique);
        assert_eq!(error.context, "metrics.more-time.type");
    }

    #[test]
    fn test_unknown_tool_reference() {
        let mut doc = basic_document();
        doc.jobs.as_mut().unwrap()[0]
            .tasks
            .as_mut()
            .unwrap()[0]
            .tool_id = Some("laser".to_owned());

        let error = doc.build_problem().unwrap_err();
        assert_eq!(error.kind, Unrecognized);
        assert_eq!(error.context, "jobs.j1.tasks.0.toolId");
    }

    #[test]
    fn test_inverted_arrival_window() {
        let mut doc = basic_document();
        let window = doc.jobs.as_mut().unwrap()[0].arrival_window.as_mut().unwrap();
        std::mem::swap(&mut window.open, &mut window.close);

        let error = doc.build_problem().unwrap_err();
        assert_eq!(error.kind, Invalid);
        assert_eq!(error.context, "jobs.j1.arrivalWindow");
    }

    #[test]
    fn test_task_order_is_one_based() {
        let mut doc = basic_document();
        let tasks = doc.jobs.as_mut().unwrap()[0].tasks.as_mut().unwrap();
        tasks.push(crate::test_utils::task("t2", "wrench"));
        tasks.push(crate::test_utils::task("t3", "wrench"));

        let problem = doc.build_problem().unwrap();
        let orders: Vec<u32> = problem.jobs()[0]
            .tasks()
            .iter()
            .map(|task| task.order())
            .collect();
        assert_eq!(orders, vec![1, 2, 3]);
    }

    #[test]
    fn test_unknown_hub_reference() {
        let mut doc = basic_document();
        doc.workers.as_mut().unwrap()[0].start_hub_id = Some("nowhere".to_owned());

        let error = doc.build_problem().unwrap_err();
        assert_eq!(error.kind, Unrecognized);
        assert_eq!(error.context, "workers.w1.startHubId");
    }

    #[test]
    fn test_modifier_with_tool_and_place() {
        let mut doc = basic_document();
        doc.workers.as_mut().unwrap()[0].reward_modifiers =
            Some(vec![crate::json::types::JsonRewardModifier {
                metric_id: Some("payout".to_owned()),
                tool_id: Some("wrench".to_owned()),
                place_id: Some("j1".to_owned()),
                factor: Some(2.0),
                amount: None,
            }]);

        let error = doc.build_problem().unwrap_err();
        assert_eq!(error.kind, Invalid);
        assert_eq!(error.context, "workers.w1.rewardModifiers.0");
    }

    #[test]
    fn test_second_must_visit_for_same_job() {
        let mut doc = basic_document();
        doc.workers.as_mut().unwrap().push(worker("w2", "h1"));
        doc.guarantees = Some(vec![
            crate::test_utils::guarantee("w1", "j1", true),
            crate::test_utils::guarantee("w2", "j1", true),
        ]);

        let error = doc.build_problem().unwrap_err();
        assert_eq!(error.kind, NotUnique);
        assert_eq!(error.context, "guarantees.1.placeId");
    }

    #[test]
    fn test_unreachable_job_demoted_to_optional() {
        let mut doc = basic_document();
        doc.workers.as_mut().unwrap()[0].earliest_start_time =
            Some("2026-03-02T08:00:00Z".parse().unwrap());
        doc.jobs.as_mut().unwrap().push(job(
            "stale",
            (5.0, 5.0),
            "2026-03-01T08:00:00Z",
            "2026-03-01T09:00:00Z",
        ));

        let problem = doc.build_problem().unwrap();
        assert!(problem.jobs()[1].is_optional());
    }

    #[test]
    fn test_t_zero_defaults_to_minimum_without_worker_starts() {
        let problem = basic_document().build_problem().unwrap();
        assert_eq!(problem.t_zero(), Timestamp::MIN);
    }

    #[test]
    fn test_t_zero_from_worker_and_windows() {
        let mut doc = basic_document();
        doc.workers.as_mut().unwrap()[0].earliest_start_time =
            Some("2026-03-02T08:00:00Z".parse().unwrap());

        let problem = doc.build_problem().unwrap();
        // The job window opens before the worker's shift.
        assert_eq!(problem.t_zero(), problem.jobs()[0].window().open());
    }
}
