use rand::Rng;
use smallvec::SmallVec;
use tracing::debug;

use crate::problem::{
    job::TaskHandle,
    metric::MetricIdx,
    scheduling_problem::SchedulingProblem,
    worker::{Worker, WorkerIdx},
};

use super::nodes::Node;

/// Outcome of one attempted piece of work at a node. `task` is `None` for
/// the synthetic arrival pseudo-task that carries a worker's flat visit
/// rewards; it always completes and takes one second.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub task: Option<TaskHandle>,
    pub order: u32,
    pub work_seconds: i64,
    pub rewards: SmallVec<[(MetricIdx, f64); 2]>,
}

impl Completion {
    pub fn reward_for(&self, metric: MetricIdx) -> f64 {
        self.rewards
            .iter()
            .filter(|(reward_metric, _)| *reward_metric == metric)
            .map(|(_, amount)| amount)
            .sum()
    }
}

/// Decides which of a node's tasks a worker completes and what they earn,
/// drawing completion outcomes from the injected RNG. Pure in its inputs
/// plus the RNG state.
pub fn simulate_node<R: Rng>(
    problem: &SchedulingProblem,
    worker_idx: WorkerIdx,
    node: &Node,
    rng: &mut R,
) -> Vec<Completion> {
    let worker = problem.worker(worker_idx);
    let mut completions = Vec::new();

    if !node.place().is_hub() && node.is_head() {
        push_arrival_rewards(worker, node, &mut completions);
    }

    for &handle in node.tasks() {
        let task = problem.job(handle.job).task(handle.index);
        let tool = problem.tool(task.tool());

        let Some(capability) = worker.capability(task.tool()) else {
            let missed: f64 = task.rewards().iter().map(|reward| reward.amount).sum();
            debug!(
                worker = worker.external_id(),
                task = task.external_id(),
                tool = tool.external_id(),
                missed_rewards = missed,
                "worker lacks tool, task unattempted"
            );
            continue;
        };

        let work_time = capability.work_time().unwrap_or(tool.default_work_time());
        let work_seconds =
            (work_time.as_secs_f64() * capability.work_time_factor()).round() as i64;
        let chance = capability
            .completion_chance()
            .unwrap_or(tool.default_completion_chance());

        let draw: f64 = rng.random();
        if draw >= chance || work_seconds <= 0 {
            continue;
        }

        let rewards = task
            .rewards()
            .iter()
            .map(|reward| {
                let earned = reward.amount
                    * capability.reward_factor(reward.metric)
                    * worker.reward_factor(reward.metric, task.tool(), node.place());
                (reward.metric, earned)
            })
            .collect();

        completions.push(Completion {
            task: Some(handle),
            order: task.order(),
            work_seconds,
            rewards,
        });
    }

    completions
}

fn push_arrival_rewards(worker: &Worker, node: &Node, completions: &mut Vec<Completion>) {
    let rewards: SmallVec<[(MetricIdx, f64); 2]> = worker.visit_rewards(node.place()).collect();
    if rewards.is_empty() {
        return;
    }

    completions.push(Completion {
        task: None,
        order: 0,
        work_seconds: 1,
        rewards,
    });
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use crate::{
        json::types::{JsonCapability, JsonRewardModifier},
        solver::nodes::{NodeGraph, NodeIdx},
        test_utils::basic_document,
    };

    use super::*;

    #[test]
    fn test_certain_completion_earns_rewards() {
        let problem = basic_document().build_problem().unwrap();
        let graph = NodeGraph::expand(&problem);
        let mut rng = StdRng::seed_from_u64(7);

        let head = graph.node(NodeIdx::new(1));
        let completions = simulate_node(&problem, WorkerIdx::new(0), head, &mut rng);

        assert_eq!(completions.len(), 1);
        assert_eq!(completions[0].work_seconds, 10);
        assert_eq!(completions[0].reward_for(MetricIdx::new(1)), 100.0);
    }

    #[test]
    fn test_incapable_worker_attempts_nothing() {
        let mut doc = basic_document();
        doc.workers.as_mut().unwrap()[0].capabilities = Some(Vec::new());

        let problem = doc.build_problem().unwrap();
        let graph = NodeGraph::expand(&problem);
        let mut rng = StdRng::seed_from_u64(7);

        let head = graph.node(NodeIdx::new(1));
        let completions = simulate_node(&problem, WorkerIdx::new(0), head, &mut rng);

        assert!(completions.is_empty());
    }

    #[test]
    fn test_zero_chance_never_completes() {
        let mut doc = basic_document();
        doc.workers.as_mut().unwrap()[0].capabilities = Some(vec![JsonCapability {
            completion_chance: Some(0.0),
            ..crate::test_utils::capability("wrench")
        }]);

        let problem = doc.build_problem().unwrap();
        let graph = NodeGraph::expand(&problem);
        let mut rng = StdRng::seed_from_u64(7);

        let head = graph.node(NodeIdx::new(1));
        assert!(simulate_node(&problem, WorkerIdx::new(0), head, &mut rng).is_empty());
    }

    #[test]
    fn test_capability_overrides_apply() {
        let mut doc = basic_document();
        doc.workers.as_mut().unwrap()[0].capabilities = Some(vec![JsonCapability {
            work_time: Some(30.0),
            work_time_factor: Some(0.5),
            reward_factors: Some([("payout".to_owned(), 2.0)].into_iter().collect()),
            ..crate::test_utils::capability("wrench")
        }]);

        let problem = doc.build_problem().unwrap();
        let graph = NodeGraph::expand(&problem);
        let mut rng = StdRng::seed_from_u64(7);

        let head = graph.node(NodeIdx::new(1));
        let completions = simulate_node(&problem, WorkerIdx::new(0), head, &mut rng);

        assert_eq!(completions[0].work_seconds, 15);
        assert_eq!(completions[0].reward_for(MetricIdx::new(1)), 200.0);
    }

    #[test]
    fn test_visit_reward_arrival_pseudo_task() {
        let mut doc = basic_document();
        doc.workers.as_mut().unwrap()[0].reward_modifiers = Some(vec![JsonRewardModifier {
            metric_id: Some("payout".to_owned()),
            tool_id: None,
            place_id: Some("j1".to_owned()),
            factor: None,
            amount: Some(25.0),
        }]);

        let problem = doc.build_problem().unwrap();
        let graph = NodeGraph::expand(&problem);
        let mut rng = StdRng::seed_from_u64(7);

        let head = graph.node(NodeIdx::new(1));
        let completions = simulate_node(&problem, WorkerIdx::new(0), head, &mut rng);

        assert_eq!(completions.len(), 2);
        assert_eq!(completions[0].task, None);
        assert_eq!(completions[0].work_seconds, 1);
        assert_eq!(completions[0].reward_for(MetricIdx::new(1)), 25.0);
    }

    #[test]
    fn test_factor_modifier_scales_tool_rewards() {
        let mut doc = basic_document();
        doc.workers.as_mut().unwrap()[0].reward_modifiers = Some(vec![JsonRewardModifier {
            metric_id: Some("payout".to_owned()),
            tool_id: Some("wrench".to_owned()),
            place_id: None,
            factor: Some(3.0),
            amount: None,
        }]);

        let problem = doc.build_problem().unwrap();
        let graph = NodeGraph::expand(&problem);
        let mut rng = StdRng::seed_from_u64(7);

        let head = graph.node(NodeIdx::new(1));
        let completions = simulate_node(&problem, WorkerIdx::new(0), head, &mut rng);

        assert_eq!(completions[0].reward_for(MetricIdx::new(1)), 300.0);
    }

    #[test]
    fn test_same_seed_same_outcome() {
        let mut doc = basic_document();
        doc.workers.as_mut().unwrap()[0].capabilities = Some(vec![JsonCapability {
            completion_chance: Some(0.5),
            ..crate::test_utils::capability("wrench")
        }]);

        let problem = doc.build_problem().unwrap();
        let graph = NodeGraph::expand(&problem);
        let head = graph.node(NodeIdx::new(1));

        let first = simulate_node(
            &problem,
            WorkerIdx::new(0),
            head,
            &mut StdRng::seed_from_u64(42),
        );
        let second = simulate_node(
            &problem,
            WorkerIdx::new(0),
            head,
            &mut StdRng::seed_from_u64(42),
        );

        assert_eq!(first, second);
    }
}
