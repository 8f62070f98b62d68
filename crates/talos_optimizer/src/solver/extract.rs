use fxhash::FxHashMap;
use jiff::SignedDuration;

use crate::problem::{
    job::JobIdx,
    metric::{MetricIdx, MetricKind},
    place::PlaceRef,
    worker::WorkerIdx,
};

use super::{
    routing::{model::RoutingModel, solver::Assignment},
    solution::{Itinerary, Visit},
    vehicle::Vehicle,
};

/// Walks the assignment route by route and aggregates it into the final
/// itinerary. All aggregates are built up front; nothing is mutated after.
pub fn extract(model: &RoutingModel<'_>, assignment: Option<&Assignment>) -> Itinerary {
    let problem = model.problem();

    let Some(assignment) = assignment else {
        return Itinerary::empty(problem);
    };

    let time_dimension = model.time_dimension().0;
    let t_zero = problem.t_zero();
    let config = problem.config();

    let mut visits = Vec::new();
    let mut skipped: Vec<JobIdx> = (0..problem.jobs().len()).map(JobIdx::new).collect();
    let mut totals: Vec<f64> = vec![0.0; problem.metrics().len()];

    for (vehicle_index, route) in assignment.routes.iter().enumerate() {
        let vehicle = &model.vehicles()[vehicle_index];
        let worker = vehicle.driver();
        let stops = &route.stops;

        for arc in stops.windows(2) {
            for (metric_idx, _) in problem.metrics_iter() {
                totals[metric_idx.get()] +=
                    vehicle.metric_matrix(metric_idx).get(arc[0].node, arc[1].node);
            }
        }

        let start = &stops[0];
        visits.push(Visit {
            place: model.graph().node(start.node).place(),
            worker,
            arrival_time: None,
            departure_time: Some(t_zero + SignedDuration::from_secs(start.cumuls[time_dimension])),
            work_seconds: 0,
            earned_rewards: FxHashMap::default(),
            completed_tasks: Vec::new(),
        });

        // Stops at the same place collapse into one visit: a job's head node
        // and its optional-task nodes are entered back to back.
        let mut position = 1;
        while position < stops.len() - 1 {
            let place = model.graph().node(stops[position].node).place();
            let mut group_end = position;
            while group_end + 1 < stops.len() - 1
                && model.graph().node(stops[group_end + 1].node).place() == place
            {
                group_end += 1;
            }

            visits.push(place_visit(
                model,
                vehicle,
                worker,
                place,
                &stops[position..=group_end],
                time_dimension,
            ));

            if let PlaceRef::Job(job) = place {
                skipped.retain(|&skipped_job| skipped_job != job);
            }

            position = group_end + 1;
        }

        let end = &stops[stops.len() - 1];
        visits.push(Visit {
            place: model.graph().node(end.node).place(),
            worker,
            arrival_time: Some(t_zero + SignedDuration::from_secs(end.cumuls[time_dimension])),
            departure_time: None,
            work_seconds: 0,
            earned_rewards: FxHashMap::default(),
            completed_tasks: Vec::new(),
        });
    }

    let total_metrics = problem
        .metrics_iter()
        .map(|(metric_idx, metric)| {
            let raw = totals[metric_idx.get()];
            let converted = match metric.kind() {
                MetricKind::Distance => raw / config.meters_per_unit(),
                MetricKind::TravelTime | MetricKind::WorkTime => raw / config.seconds_per_unit(),
                MetricKind::Custom => raw,
            };
            (metric_idx, converted)
        })
        .collect();

    Itinerary {
        visits,
        skipped_jobs: skipped,
        total_metrics,
        total_cost: assignment.objective,
    }
}

fn place_visit(
    model: &RoutingModel<'_>,
    vehicle: &Vehicle,
    worker: WorkerIdx,
    place: PlaceRef,
    stops: &[super::routing::solver::Stop],
    time_dimension: usize,
) -> Visit {
    let problem = model.problem();
    let t_zero = problem.t_zero();

    let arrival_seconds = stops[0].cumuls[time_dimension];
    let arrival_time = t_zero + SignedDuration::from_secs(arrival_seconds);

    let mut completions: Vec<&super::work_simulator::Completion> = stops
        .iter()
        .flat_map(|stop| vehicle.completions_at(stop.node).iter())
        .collect();
    completions.sort_by_key(|completion| completion.order);

    let work_seconds: i64 = completions
        .iter()
        .map(|completion| completion.work_seconds)
        .sum();

    let mut earned_rewards: FxHashMap<MetricIdx, f64> = FxHashMap::default();
    for completion in &completions {
        for &(metric, amount) in &completion.rewards {
            *earned_rewards.entry(metric).or_insert(0.0) += amount;
        }
    }

    let completed_tasks = completions
        .iter()
        .filter_map(|completion| completion.task)
        .collect();

    Visit {
        place,
        worker,
        arrival_time: Some(arrival_time),
        departure_time: Some(arrival_time + SignedDuration::from_secs(work_seconds)),
        work_seconds,
        earned_rewards,
        completed_tasks,
    }
}
