use crate::problem::scheduling_problem::SchedulingProblem;

use super::{matrix::SquareMatrix, nodes::NodeGraph};

/// 0/1 matrix of transits that would violate intra-job task order. Attached
/// to the routing model as a capacity-0 dimension, so a single invalid arc
/// makes a route infeasible.
///
/// A transit is invalid when it enters a job's head node from the same
/// place, or enters an optional-task node from anywhere but an
/// earlier-ordered node of the same place.
pub fn build_precedence_matrix(
    problem: &SchedulingProblem,
    graph: &NodeGraph,
) -> SquareMatrix<i64> {
    let mut invalid = SquareMatrix::new(graph.len());

    for (from_idx, from) in graph.nodes_iter() {
        for (to_idx, to) in graph.nodes_iter() {
            if to.place().is_hub() || to.tasks().is_empty() {
                continue;
            }

            let violates = if to.is_head() {
                from.place() == to.place()
            } else {
                from.place() != to.place()
                    || from.first_task_order(problem) >= to.first_task_order(problem)
            };

            if violates {
                invalid.set(from_idx, to_idx, 1);
            }
        }
    }

    invalid
}

#[cfg(test)]
mod tests {
    use crate::{
        json::types::JsonTask,
        solver::nodes::NodeIdx,
        test_utils::{basic_document, job, task},
    };

    use super::*;

    #[test]
    fn test_required_then_optional_ordering() {
        let mut doc = basic_document();
        doc.jobs.as_mut().unwrap()[0]
            .tasks
            .as_mut()
            .unwrap()
            .push(JsonTask {
                optional: Some(true),
                ..task("t2", "wrench")
            });

        let problem = doc.build_problem().unwrap();
        let graph = crate::solver::nodes::NodeGraph::expand(&problem);
        let invalid = build_precedence_matrix(&problem, &graph);

        let hub = NodeIdx::new(0);
        let head = NodeIdx::new(1);
        let optional = NodeIdx::new(2);

        assert_eq!(invalid.get(hub, head), 0);
        assert_eq!(invalid.get(hub, optional), 1);
        assert_eq!(invalid.get(head, optional), 0);
        assert_eq!(invalid.get(optional, head), 1);
        // Leaving for a hub is always allowed.
        assert_eq!(invalid.get(optional, hub), 0);
        assert_eq!(invalid.get(head, hub), 0);
    }

    #[test]
    fn test_optional_nodes_keep_task_order() {
        let mut doc = basic_document();
        let tasks = doc.jobs.as_mut().unwrap()[0].tasks.as_mut().unwrap();
        tasks.push(JsonTask {
            optional: Some(true),
            ..task("t2", "wrench")
        });
        tasks.push(JsonTask {
            optional: Some(true),
            ..task("t3", "wrench")
        });

        let problem = doc.build_problem().unwrap();
        let graph = crate::solver::nodes::NodeGraph::expand(&problem);
        let invalid = build_precedence_matrix(&problem, &graph);

        let first_optional = NodeIdx::new(2);
        let second_optional = NodeIdx::new(3);

        assert_eq!(invalid.get(first_optional, second_optional), 0);
        assert_eq!(invalid.get(second_optional, first_optional), 1);
    }

    #[test]
    fn test_cross_job_transits() {
        let mut doc = basic_document();
        doc.jobs.as_mut().unwrap().push(job(
            "j2",
            (2.0, 0.0),
            "2026-03-01T10:00:00Z",
            "2026-03-01T11:00:00Z",
        ));
        doc.jobs.as_mut().unwrap()[1]
            .tasks
            .as_mut()
            .unwrap()
            .push(JsonTask {
                optional: Some(true),
                ..task("j2-t2", "wrench")
            });

        let problem = doc.build_problem().unwrap();
        let graph = crate::solver::nodes::NodeGraph::expand(&problem);
        let invalid = build_precedence_matrix(&problem, &graph);

        let j1_head = NodeIdx::new(1);
        let j2_head = NodeIdx::new(2);
        let j2_optional = NodeIdx::new(3);

        // Head nodes are reachable from any other place.
        assert_eq!(invalid.get(j1_head, j2_head), 0);
        // But an optional-task node is never entered from another place.
        assert_eq!(invalid.get(j1_head, j2_optional), 1);
        // And a head node is never re-entered from its own place.
        assert_eq!(invalid.get(j2_optional, j2_head), 1);
    }
}
