use std::sync::Arc;

use fxhash::FxHashMap;
use rand::{SeedableRng, rngs::StdRng};
use rayon::prelude::*;

use crate::{
    define_index_newtype,
    problem::{
        metric::{MetricIdx, MetricKind, OptimizeMode},
        scheduling_problem::SchedulingProblem,
        tool::ToolIdx,
        worker::WorkerIdx,
    },
};

use super::{
    geometry::TravelGeometry,
    matrix::SquareMatrix,
    nodes::{NodeGraph, NodeIdx},
    work_simulator::{Completion, simulate_node},
};

define_index_newtype!(VehicleIdx, Vehicle);

/// Fixed-point scale applied to fused costs before they reach the solver.
pub const COST_SCALE: f64 = 1_000_000.0;

/// The solver-side twin of one worker: its time, per-metric and fused cost
/// matrices plus the simulated work outcomes per node. Immutable during a
/// solve; the shared matrices are borrowed by transit callbacks.
pub struct Vehicle {
    driver: WorkerIdx,
    start_node: NodeIdx,
    end_node: NodeIdx,
    tool_times: FxHashMap<ToolIdx, i64>,
    work: Vec<Vec<Completion>>,
    time: Arc<SquareMatrix<i64>>,
    metrics: Vec<SquareMatrix<f64>>,
    cost: Arc<SquareMatrix<i64>>,
}

impl Vehicle {
    pub fn driver(&self) -> WorkerIdx {
        self.driver
    }

    pub fn start_node(&self) -> NodeIdx {
        self.start_node
    }

    pub fn end_node(&self) -> NodeIdx {
        self.end_node
    }

    /// Seconds the driver needs for one use of `tool`, 0 when incapable.
    pub fn tool_time(&self, tool: ToolIdx) -> i64 {
        self.tool_times.get(&tool).copied().unwrap_or(0)
    }

    pub fn completions_at(&self, node: NodeIdx) -> &[Completion] {
        &self.work[node.get()]
    }

    pub fn time_matrix(&self) -> &Arc<SquareMatrix<i64>> {
        &self.time
    }

    pub fn metric_matrix(&self, metric: MetricIdx) -> &SquareMatrix<f64> {
        &self.metrics[metric.get()]
    }

    pub fn cost_matrix(&self) -> &Arc<SquareMatrix<i64>> {
        &self.cost
    }
}

struct VehicleDraft {
    driver: WorkerIdx,
    start_node: NodeIdx,
    end_node: NodeIdx,
    tool_times: FxHashMap<ToolIdx, i64>,
    work: Vec<Vec<Completion>>,
    time: SquareMatrix<i64>,
    metrics: Vec<SquareMatrix<f64>>,
}

/// Builds one vehicle per worker, then fuses every vehicle's metric matrices
/// into its integer cost matrix. Population is independent per vehicle and
/// runs in parallel; each vehicle draws from its own seeded RNG stream.
pub fn build_vehicles(
    problem: &SchedulingProblem,
    graph: &NodeGraph,
    geometry: &TravelGeometry,
    seed: u64,
) -> Vec<Vehicle> {
    let drafts: Vec<VehicleDraft> = (0..problem.workers().len())
        .into_par_iter()
        .map(|index| {
            let mut rng = StdRng::seed_from_u64(seed.wrapping_add(index as u64));
            populate(problem, graph, geometry, WorkerIdx::new(index), &mut rng)
        })
        .collect();

    let metric_maxima: Vec<f64> = (0..problem.metrics().len())
        .map(|metric| {
            drafts
                .iter()
                .map(|draft| draft.metrics[metric].max_value())
                .fold(0.0, f64::max)
        })
        .collect();

    let weight_sum: f64 = problem.metrics().iter().map(|metric| metric.weight()).sum();

    drafts
        .into_iter()
        .map(|draft| {
            let cost = fuse_cost_matrix(problem, &draft.metrics, &metric_maxima, weight_sum);
            Vehicle {
                driver: draft.driver,
                start_node: draft.start_node,
                end_node: draft.end_node,
                tool_times: draft.tool_times,
                work: draft.work,
                time: Arc::new(draft.time),
                metrics: draft.metrics,
                cost: Arc::new(cost),
            }
        })
        .collect()
}

fn populate(
    problem: &SchedulingProblem,
    graph: &NodeGraph,
    geometry: &TravelGeometry,
    driver: WorkerIdx,
    rng: &mut StdRng,
) -> VehicleDraft {
    let worker = problem.worker(driver);
    let speed_factor = worker.travel_speed_factor();

    let tool_times = problem
        .tools()
        .iter()
        .enumerate()
        .filter_map(|(index, tool)| {
            let tool_idx = ToolIdx::new(index);
            worker.capability(tool_idx).map(|capability| {
                let work_time = capability.work_time().unwrap_or(tool.default_work_time());
                let seconds =
                    (work_time.as_secs_f64() * capability.work_time_factor()).round() as i64;
                (tool_idx, seconds)
            })
        })
        .collect();

    let work: Vec<Vec<Completion>> = graph
        .nodes()
        .iter()
        .map(|node| simulate_node(problem, driver, node, rng))
        .collect();

    let work_seconds: Vec<i64> = work
        .iter()
        .map(|completions| {
            completions
                .iter()
                .map(|completion| completion.work_seconds)
                .sum()
        })
        .collect();

    let size = graph.len();
    let mut time = SquareMatrix::new(size);
    let mut metrics: Vec<SquareMatrix<f64>> = problem
        .metrics()
        .iter()
        .map(|_| SquareMatrix::new(size))
        .collect();

    for from in (0..size).map(NodeIdx::new) {
        for to in (0..size).map(NodeIdx::new) {
            let travel =
                (geometry.travel_times().get(from, to) / speed_factor).round() as i64;
            time.set(from, to, work_seconds[from.get()] + travel);

            for (metric_idx, metric) in problem.metrics_iter() {
                let value = match metric.kind() {
                    MetricKind::Distance => geometry.distances().get(from, to),
                    MetricKind::TravelTime => travel as f64,
                    MetricKind::WorkTime => work_seconds[from.get()] as f64,
                    MetricKind::Custom => work[from.get()]
                        .iter()
                        .map(|completion| completion.reward_for(metric_idx))
                        .sum(),
                };
                metrics[metric_idx.get()].set(from, to, value);
            }
        }
    }

    VehicleDraft {
        driver,
        start_node: graph.hub_node(worker.start_hub()),
        end_node: graph.hub_node(worker.end_hub()),
        tool_times,
        work,
        time,
        metrics,
    }
}

/// Normalizes every metric by the fleet-wide maximum, inverts Maximize
/// metrics so high reward reads as low cost, weighs each on the probability
/// simplex and scales to fixed-point integers.
fn fuse_cost_matrix(
    problem: &SchedulingProblem,
    metrics: &[SquareMatrix<f64>],
    metric_maxima: &[f64],
    weight_sum: f64,
) -> SquareMatrix<i64> {
    let size = metrics.first().map(SquareMatrix::size).unwrap_or(0);
    let mut cost = SquareMatrix::new(size);

    if weight_sum <= 0.0 {
        return cost;
    }

    for from in (0..size).map(NodeIdx::new) {
        for to in (0..size).map(NodeIdx::new) {
            let mut fused = 0.0;

            for (metric_idx, metric) in problem.metrics_iter() {
                let maximum = metric_maxima[metric_idx.get()];
                if maximum <= 0.0 {
                    continue;
                }

                let mut normalized = metrics[metric_idx.get()].get(from, to) / maximum;
                if metric.mode() == OptimizeMode::Maximize {
                    normalized = (normalized - 1.0).abs();
                }

                fused += normalized * metric.weight() / weight_sum;
            }

            cost.set(from, to, (fused * COST_SCALE).round() as i64);
        }
    }

    cost
}

#[cfg(test)]
mod tests {
    use crate::test_utils::{basic_document, metric};
    use crate::problem::metric::MetricKind;

    use super::*;

    fn vehicles_for(doc: crate::json::types::JsonProblem) -> Vec<Vehicle> {
        let problem = doc.build_problem().unwrap();
        let graph = NodeGraph::expand(&problem);
        let geometry = TravelGeometry::build(&problem, &graph).unwrap();
        build_vehicles(&problem, &graph, &geometry, 7)
    }

    #[test]
    fn test_time_matrix_is_work_plus_travel() {
        let mut doc = basic_document();
        doc.default_travel_speed = Some(0.5);
        doc.workers.as_mut().unwrap()[0].travel_speed_factor = Some(2.0);

        let vehicles = vehicles_for(doc);
        let hub = NodeIdx::new(0);
        let head = NodeIdx::new(1);

        // 1 unit at speed 0.5 is 2 seconds of travel, halved by the worker's
        // speed factor; no work happens at the hub.
        assert_eq!(vehicles[0].time_matrix().get(hub, head), 1);
        // Leaving the job carries its 10 seconds of work.
        assert_eq!(vehicles[0].time_matrix().get(head, hub), 10 + 1);
    }

    #[test]
    fn test_tool_times() {
        let vehicles = vehicles_for(basic_document());
        assert_eq!(vehicles[0].tool_time(ToolIdx::new(0)), 10);
    }

    #[test]
    fn test_cost_entries_are_non_negative() {
        let vehicles = vehicles_for(basic_document());
        let cost = vehicles[0].cost_matrix();

        assert!(cost.values().iter().all(|&value| value >= 0));
    }

    #[test]
    fn test_maximize_metric_inverts() {
        let vehicles = vehicles_for(basic_document());
        let hub = NodeIdx::new(0);
        let head = NodeIdx::new(1);

        // The full payout is earned on arcs leaving the job, so those arcs
        // carry no reward cost; arcs leaving the hub pay the whole reward
        // weight on top of their travel-time share.
        let payout = MetricIdx::new(1);
        assert_eq!(vehicles[0].metric_matrix(payout).get(head, hub), 100.0);
        assert_eq!(vehicles[0].metric_matrix(payout).get(hub, head), 0.0);

        let toward = vehicles[0].cost_matrix().get(hub, head);
        let away = vehicles[0].cost_matrix().get(head, hub);
        assert!(toward > away);
    }

    #[test]
    fn test_doubling_reward_does_not_increase_cost() {
        let base = vehicles_for(basic_document());

        let mut doc = basic_document();
        doc.jobs.as_mut().unwrap()[0].tasks.as_mut().unwrap()[0]
            .rewards
            .as_mut()
            .unwrap()[0]
            .amount = Some(200.0);
        let doubled = vehicles_for(doc);

        for (a, b) in base[0]
            .cost_matrix()
            .values()
            .iter()
            .zip(doubled[0].cost_matrix().values())
        {
            assert!(b <= a);
        }
    }

    #[test]
    fn test_zero_weight_metric_is_inert() {
        let base = vehicles_for(basic_document());

        let mut doc = basic_document();
        doc.metrics
            .as_mut()
            .unwrap()
            .push(metric("idle-distance", MetricKind::Distance, 0.0));
        let extended = vehicles_for(doc);

        assert_eq!(
            base[0].cost_matrix().values(),
            extended[0].cost_matrix().values()
        );
    }

    #[test]
    fn test_normalized_entries_bounded_by_fleet_maximum() {
        let mut doc = basic_document();
        doc.workers.as_mut().unwrap().push(crate::test_utils::worker("w2", "h1"));
        doc.workers.as_mut().unwrap()[1].travel_speed_factor = Some(0.25);

        let problem = doc.build_problem().unwrap();
        let graph = NodeGraph::expand(&problem);
        let geometry = TravelGeometry::build(&problem, &graph).unwrap();
        let vehicles = build_vehicles(&problem, &graph, &geometry, 7);

        let travel_time = MetricIdx::new(0);
        let fleet_max = vehicles
            .iter()
            .map(|vehicle| vehicle.metric_matrix(travel_time).max_value())
            .fold(0.0, f64::max);

        for vehicle in &vehicles {
            assert!(vehicle.metric_matrix(travel_time).max_value() / fleet_max <= 1.0);
        }
    }
}
