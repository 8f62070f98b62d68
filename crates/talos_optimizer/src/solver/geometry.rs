use crate::{
    error::SolveError,
    problem::{config::GeometryMode, scheduling_problem::SchedulingProblem},
};

use super::{matrix::SquareMatrix, nodes::NodeGraph};

/// Node-pair distances (meters) and travel times (seconds at the default
/// speed, before any per-worker speed factor).
pub struct TravelGeometry {
    distances: SquareMatrix<f64>,
    travel_times: SquareMatrix<f64>,
}

impl TravelGeometry {
    pub fn distances(&self) -> &SquareMatrix<f64> {
        &self.distances
    }

    pub fn travel_times(&self) -> &SquareMatrix<f64> {
        &self.travel_times
    }

    pub fn build(problem: &SchedulingProblem, graph: &NodeGraph) -> Result<Self, SolveError> {
        match problem.config().engine {
            GeometryMode::Simple => Ok(Self::build_simple(problem, graph)),
            GeometryMode::Osrm => Err(SolveError::NotImplemented("OSRM geometry")),
        }
    }

    /// Manhattan geometry on planar coordinates. Transits between the same
    /// place, or where either location is unknown, are zero.
    fn build_simple(problem: &SchedulingProblem, graph: &NodeGraph) -> Self {
        let config = problem.config();
        let meters_per_unit = config.meters_per_unit();
        let seconds_per_unit = config.seconds_per_unit();
        let speed = config.default_travel_speed;

        let mut distances = SquareMatrix::new(graph.len());
        let mut travel_times = SquareMatrix::new(graph.len());

        for (from_idx, from) in graph.nodes_iter() {
            for (to_idx, to) in graph.nodes_iter() {
                if from.place() == to.place() {
                    continue;
                }

                let (Some(from_location), Some(to_location)) = (
                    problem.place_location(from.place()),
                    problem.place_location(to.place()),
                ) else {
                    continue;
                };

                let units = from_location.manhattan_distance(to_location);
                distances.set(from_idx, to_idx, units * meters_per_unit);
                travel_times.set(from_idx, to_idx, units / speed * seconds_per_unit);
            }
        }

        TravelGeometry {
            distances,
            travel_times,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        problem::config::GeometryMode,
        solver::nodes::NodeIdx,
        test_utils::{basic_document, job},
    };

    use super::*;

    #[test]
    fn test_simple_geometry() {
        let mut doc = basic_document();
        doc.distance_unit = Some(serde_json::from_str("\"fathom\"").unwrap());
        doc.time_unit = Some(serde_json::from_str("\"minute\"").unwrap());
        doc.default_travel_speed = Some(2.0);
        doc.jobs.as_mut().unwrap().push(job(
            "j2",
            (3.0, 4.0),
            "2026-03-01T10:00:00Z",
            "2026-03-01T11:00:00Z",
        ));

        let problem = doc.build_problem().unwrap();
        let graph = NodeGraph::expand(&problem);
        let geometry = TravelGeometry::build(&problem, &graph).unwrap();

        let hub = NodeIdx::new(0);
        let j2 = NodeIdx::new(2);

        // 7 fathoms of Manhattan distance, in meters.
        assert_eq!(geometry.distances().get(hub, j2), 7.0 * 1.8288);
        // 7 units at 2 units per minute.
        assert_eq!(geometry.travel_times().get(hub, j2), 3.5 * 60.0);
        assert_eq!(geometry.distances().get(hub, hub), 0.0);
    }

    #[test]
    fn test_missing_location_is_zero() {
        let mut doc = basic_document();
        doc.hubs.as_mut().unwrap()[0].location = None;

        let problem = doc.build_problem().unwrap();
        let graph = NodeGraph::expand(&problem);
        let geometry = TravelGeometry::build(&problem, &graph).unwrap();

        assert_eq!(geometry.distances().get(NodeIdx::new(0), NodeIdx::new(1)), 0.0);
        assert_eq!(
            geometry.travel_times().get(NodeIdx::new(0), NodeIdx::new(1)),
            0.0
        );
    }

    #[test]
    fn test_osrm_is_not_implemented() {
        let mut doc = basic_document();
        doc.engine = Some(GeometryMode::Osrm);

        let problem = doc.build_problem().unwrap();
        let graph = NodeGraph::expand(&problem);

        assert!(matches!(
            TravelGeometry::build(&problem, &graph),
            Err(SolveError::NotImplemented(_))
        ));
    }
}
