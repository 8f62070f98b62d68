use std::collections::BTreeMap;

use jiff::Timestamp;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{
    error::ValidationError,
    problem::{
        config::GeometryMode,
        metric::{MetricKind, OptimizeMode},
        scheduling_problem::SchedulingProblem,
        units::{DistanceUnit, TimeUnit},
        validate::Validator,
        worker::ModifierEffect,
    },
};

/// The raw input document. Everything is optional at this level; the
/// validator decides what is required and produces the resolved
/// [`SchedulingProblem`].
#[derive(Deserialize, Serialize, JsonSchema, Debug, Default)]
#[serde(deny_unknown_fields, rename_all = "camelCase", rename = "Problem")]
pub struct JsonProblem {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub t_zero: Option<Timestamp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_travel_speed: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_unit: Option<DistanceUnit>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_unit: Option<TimeUnit>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_idle_time: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub engine: Option<GeometryMode>,
    pub tools: Option<Vec<JsonTool>>,
    pub metrics: Option<Vec<JsonMetric>>,
    pub hubs: Option<Vec<JsonHub>>,
    pub jobs: Option<Vec<JsonJob>>,
    pub workers: Option<Vec<JsonWorker>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guarantees: Option<Vec<JsonGuarantee>>,
}

#[derive(Deserialize, Serialize, JsonSchema, Debug)]
#[serde(deny_unknown_fields, rename_all = "camelCase", rename = "Tool")]
pub struct JsonTool {
    pub id: Option<String>,
    /// Default work time, in the document's time unit.
    pub work_time: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completion_chance: Option<f64>,
}

#[derive(Deserialize, Serialize, JsonSchema, Debug)]
#[serde(deny_unknown_fields, rename_all = "camelCase", rename = "Metric")]
pub struct JsonMetric {
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<MetricKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<OptimizeMode>,
    pub weight: Option<f64>,
}

#[derive(Deserialize, Serialize, JsonSchema, Debug)]
#[serde(deny_unknown_fields, rename_all = "camelCase", rename = "Hub")]
pub struct JsonHub {
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<[f64; 2]>,
}

#[derive(Deserialize, Serialize, JsonSchema, Debug)]
#[serde(deny_unknown_fields, rename_all = "camelCase", rename = "ArrivalWindow")]
pub struct JsonArrivalWindow {
    pub open: Option<Timestamp>,
    pub close: Option<Timestamp>,
}

#[derive(Deserialize, Serialize, JsonSchema, Debug)]
#[serde(deny_unknown_fields, rename_all = "camelCase", rename = "Job")]
pub struct JsonJob {
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<[f64; 2]>,
    pub arrival_window: Option<JsonArrivalWindow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub optional: Option<bool>,
    pub tasks: Option<Vec<JsonTask>>,
}

#[derive(Deserialize, Serialize, JsonSchema, Debug)]
#[serde(deny_unknown_fields, rename_all = "camelCase", rename = "Task")]
pub struct JsonTask {
    pub id: Option<String>,
    pub tool_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub optional: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rewards: Option<Vec<JsonReward>>,
}

#[derive(Deserialize, Serialize, JsonSchema, Debug)]
#[serde(deny_unknown_fields, rename_all = "camelCase", rename = "Reward")]
pub struct JsonReward {
    pub metric_id: Option<String>,
    pub amount: Option<f64>,
}

#[derive(Deserialize, Serialize, JsonSchema, Debug)]
#[serde(deny_unknown_fields, rename_all = "camelCase", rename = "Worker")]
pub struct JsonWorker {
    pub id: Option<String>,
    pub start_hub_id: Option<String>,
    pub end_hub_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub earliest_start_time: Option<Timestamp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest_end_time: Option<Timestamp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub travel_speed_factor: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capabilities: Option<Vec<JsonCapability>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reward_modifiers: Option<Vec<JsonRewardModifier>>,
}

#[derive(Deserialize, Serialize, JsonSchema, Debug)]
#[serde(deny_unknown_fields, rename_all = "camelCase", rename = "Capability")]
pub struct JsonCapability {
    pub tool_id: Option<String>,
    /// Work time override, in the document's time unit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub work_time: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub work_time_factor: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completion_chance: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reward_factors: Option<BTreeMap<String, f64>>,
}

#[derive(Deserialize, Serialize, JsonSchema, Debug)]
#[serde(deny_unknown_fields, rename_all = "camelCase", rename = "RewardModifier")]
pub struct JsonRewardModifier {
    pub metric_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub place_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub factor: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
}

#[derive(Deserialize, Serialize, JsonSchema, Debug)]
#[serde(deny_unknown_fields, rename_all = "camelCase", rename = "Guarantee")]
pub struct JsonGuarantee {
    pub worker_id: Option<String>,
    pub place_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub must_visit: Option<bool>,
}

impl JsonProblem {
    /// Validates the document and resolves every reference, producing the
    /// immutable problem model.
    pub fn build_problem(self) -> Result<SchedulingProblem, ValidationError> {
        Validator::default().validate(self)
    }
}

impl From<&SchedulingProblem> for JsonProblem {
    fn from(problem: &SchedulingProblem) -> Self {
        let config = problem.config();
        let seconds_per_unit = config.seconds_per_unit();

        let tools = problem
            .tools()
            .iter()
            .map(|tool| JsonTool {
                id: Some(tool.external_id().to_owned()),
                work_time: Some(tool.default_work_time().as_secs_f64() / seconds_per_unit),
                completion_chance: Some(tool.default_completion_chance()),
            })
            .collect();

        let metrics = problem
            .metrics()
            .iter()
            .map(|metric| JsonMetric {
                id: Some(metric.external_id().to_owned()),
                kind: Some(metric.kind()),
                mode: Some(metric.mode()),
                weight: Some(metric.weight()),
            })
            .collect();

        let hubs = problem
            .hubs()
            .iter()
            .map(|hub| JsonHub {
                id: Some(hub.external_id().to_owned()),
                location: hub.location().map(|location| [location.x(), location.y()]),
            })
            .collect();

        let jobs = problem
            .jobs()
            .iter()
            .map(|job| JsonJob {
                id: Some(job.external_id().to_owned()),
                location: job.location().map(|location| [location.x(), location.y()]),
                arrival_window: Some(JsonArrivalWindow {
                    open: Some(job.window().open()),
                    close: Some(job.window().close()),
                }),
                optional: Some(job.is_optional()),
                tasks: Some(
                    job.tasks()
                        .iter()
                        .map(|task| JsonTask {
                            id: Some(task.external_id().to_owned()),
                            tool_id: Some(problem.tool(task.tool()).external_id().to_owned()),
                            optional: Some(task.is_optional()),
                            rewards: Some(
                                task.rewards()
                                    .iter()
                                    .map(|reward| JsonReward {
                                        metric_id: Some(
                                            problem.metric(reward.metric).external_id().to_owned(),
                                        ),
                                        amount: Some(reward.amount),
                                    })
                                    .collect(),
                            ),
                        })
                        .collect(),
                ),
            })
            .collect();

        let workers = problem
            .workers()
            .iter()
            .map(|worker| {
                let mut capabilities: Vec<JsonCapability> = worker
                    .capabilities()
                    .iter()
                    .map(|(&tool, capability)| JsonCapability {
                        tool_id: Some(problem.tool(tool).external_id().to_owned()),
                        work_time: capability
                            .work_time()
                            .map(|work_time| work_time.as_secs_f64() / seconds_per_unit),
                        work_time_factor: Some(capability.work_time_factor()),
                        completion_chance: capability.completion_chance(),
                        reward_factors: Some(
                            capability
                                .reward_factors()
                                .iter()
                                .map(|(&metric, &factor)| {
                                    (problem.metric(metric).external_id().to_owned(), factor)
                                })
                                .collect(),
                        ),
                    })
                    .collect();
                capabilities.sort_by(|a, b| a.tool_id.cmp(&b.tool_id));

                JsonWorker {
                    id: Some(worker.external_id().to_owned()),
                    start_hub_id: Some(problem.hub(worker.start_hub()).external_id().to_owned()),
                    end_hub_id: Some(problem.hub(worker.end_hub()).external_id().to_owned()),
                    earliest_start_time: worker.earliest_start(),
                    latest_end_time: worker.latest_end(),
                    travel_speed_factor: Some(worker.travel_speed_factor()),
                    capabilities: Some(capabilities),
                    reward_modifiers: Some(
                        worker
                            .reward_modifiers()
                            .iter()
                            .map(|modifier| {
                                let (factor, amount) = match modifier.effect {
                                    ModifierEffect::Factor(factor) => (Some(factor), None),
                                    ModifierEffect::Amount(amount) => (None, Some(amount)),
                                };
                                JsonRewardModifier {
                                    metric_id: Some(
                                        problem.metric(modifier.metric).external_id().to_owned(),
                                    ),
                                    tool_id: modifier
                                        .tool
                                        .map(|tool| problem.tool(tool).external_id().to_owned()),
                                    place_id: modifier
                                        .place
                                        .map(|place| problem.place_id(place).to_owned()),
                                    factor,
                                    amount,
                                }
                            })
                            .collect(),
                    ),
                }
            })
            .collect();

        let guarantees = problem
            .guarantees()
            .iter()
            .map(|guarantee| JsonGuarantee {
                worker_id: Some(problem.worker(guarantee.worker).external_id().to_owned()),
                place_id: Some(problem.job(guarantee.job).external_id().to_owned()),
                must_visit: Some(guarantee.must_visit),
            })
            .collect();

        JsonProblem {
            t_zero: config.t_zero,
            timeout_seconds: Some(config.timeout.as_secs()),
            default_travel_speed: Some(config.default_travel_speed),
            distance_unit: Some(config.distance_unit),
            time_unit: Some(config.time_unit),
            max_idle_time: Some(config.max_idle_time),
            engine: Some(config.engine),
            tools: Some(tools),
            metrics: Some(metrics),
            hubs: Some(hubs),
            jobs: Some(jobs),
            workers: Some(workers),
            guarantees: Some(guarantees),
        }
    }
}
