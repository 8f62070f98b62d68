use crate::{
    json::types::{
        JsonArrivalWindow, JsonCapability, JsonGuarantee, JsonHub, JsonJob, JsonMetric,
        JsonProblem, JsonReward, JsonTask, JsonTool, JsonWorker,
    },
    problem::metric::{MetricKind, OptimizeMode},
};

pub fn tool(id: &str, work_time: f64) -> JsonTool {
    JsonTool {
        id: Some(id.to_owned()),
        work_time: Some(work_time),
        completion_chance: Some(1.0),
    }
}

pub fn metric(id: &str, kind: MetricKind, weight: f64) -> JsonMetric {
    JsonMetric {
        id: Some(id.to_owned()),
        kind: Some(kind),
        mode: Some(match kind {
            MetricKind::Custom => OptimizeMode::Maximize,
            _ => OptimizeMode::Minimize,
        }),
        weight: Some(weight),
    }
}

pub fn hub(id: &str, location: (f64, f64)) -> JsonHub {
    JsonHub {
        id: Some(id.to_owned()),
        location: Some([location.0, location.1]),
    }
}

pub fn task(id: &str, tool_id: &str) -> JsonTask {
    JsonTask {
        id: Some(id.to_owned()),
        tool_id: Some(tool_id.to_owned()),
        optional: Some(false),
        rewards: Some(Vec::new()),
    }
}

pub fn rewarded_task(id: &str, tool_id: &str, metric_id: &str, amount: f64) -> JsonTask {
    JsonTask {
        id: Some(id.to_owned()),
        tool_id: Some(tool_id.to_owned()),
        optional: Some(false),
        rewards: Some(vec![JsonReward {
            metric_id: Some(metric_id.to_owned()),
            amount: Some(amount),
        }]),
    }
}

pub fn job(id: &str, location: (f64, f64), open: &str, close: &str) -> JsonJob {
    JsonJob {
        id: Some(id.to_owned()),
        location: Some([location.0, location.1]),
        arrival_window: Some(JsonArrivalWindow {
            open: Some(open.parse().expect("Error parsing ISO")),
            close: Some(close.parse().expect("Error parsing ISO")),
        }),
        optional: Some(false),
        tasks: Some(vec![task(&format!("{id}-t1"), "wrench")]),
    }
}

pub fn capability(tool_id: &str) -> JsonCapability {
    JsonCapability {
        tool_id: Some(tool_id.to_owned()),
        work_time: None,
        work_time_factor: Some(1.0),
        completion_chance: Some(1.0),
        reward_factors: None,
    }
}

pub fn worker(id: &str, hub_id: &str) -> JsonWorker {
    JsonWorker {
        id: Some(id.to_owned()),
        start_hub_id: Some(hub_id.to_owned()),
        end_hub_id: Some(hub_id.to_owned()),
        earliest_start_time: None,
        latest_end_time: None,
        travel_speed_factor: Some(1.0),
        capabilities: Some(vec![capability("wrench")]),
        reward_modifiers: None,
    }
}

pub fn guarantee(worker_id: &str, place_id: &str, must_visit: bool) -> JsonGuarantee {
    JsonGuarantee {
        worker_id: Some(worker_id.to_owned()),
        place_id: Some(place_id.to_owned()),
        must_visit: Some(must_visit),
    }
}

/// One hub, one worker, one single-task job with a custom reward metric.
pub fn basic_document() -> JsonProblem {
    JsonProblem {
        tools: Some(vec![tool("wrench", 10.0)]),
        metrics: Some(vec![
            metric("travel-time", MetricKind::TravelTime, 1.0),
            metric("payout", MetricKind::Custom, 1.0),
        ]),
        hubs: Some(vec![hub("h1", (0.0, 0.0))]),
        jobs: Some(vec![JsonJob {
            tasks: Some(vec![rewarded_task("j1-t1", "wrench", "payout", 100.0)]),
            ..job("j1", (1.0, 0.0), "2026-03-01T10:00:00Z", "2026-03-01T11:00:00Z")
        }]),
        workers: Some(vec![worker("w1", "h1")]),
        guarantees: None,
        ..JsonProblem::default()
    }
}
