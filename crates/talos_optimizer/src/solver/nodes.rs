use smallvec::SmallVec;

use crate::{
    define_index_newtype,
    problem::{
        job::TaskHandle,
        place::PlaceRef,
        scheduling_problem::SchedulingProblem,
    },
};

define_index_newtype!(NodeIdx, Node);

/// A visitable unit of the routing graph. Hubs map to one task-less node.
/// A job maps to a head node carrying its required tasks plus one node per
/// optional task; optional-task nodes can only follow their head in place.
#[derive(Debug, Clone)]
pub struct Node {
    place: PlaceRef,
    tasks: SmallVec<[TaskHandle; 2]>,
    /// Arrival window in seconds since T-zero. Head nodes only.
    window: Option<(i64, i64)>,
    skippable: bool,
    head: bool,
}

impl Node {
    pub fn place(&self) -> PlaceRef {
        self.place
    }

    pub fn tasks(&self) -> &[TaskHandle] {
        &self.tasks
    }

    pub fn window(&self) -> Option<(i64, i64)> {
        self.window
    }

    pub fn is_skippable(&self) -> bool {
        self.skippable
    }

    /// Whether this is the node carrying a job's required tasks.
    pub fn is_head(&self) -> bool {
        self.head
    }

    /// Order of the node's first task within its job, 0 when the node has
    /// no tasks.
    pub fn first_task_order(&self, problem: &SchedulingProblem) -> u32 {
        self.tasks
            .first()
            .map(|handle| problem.job(handle.job).task(handle.index).order())
            .unwrap_or(0)
    }
}

/// The expanded node list plus lookups from hubs and jobs back to node ids.
pub struct NodeGraph {
    nodes: Vec<Node>,
    hub_nodes: Vec<NodeIdx>,
    job_head_nodes: Vec<NodeIdx>,
}

impl NodeGraph {
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node(&self, index: NodeIdx) -> &Node {
        &self.nodes[index]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes_iter(&self) -> impl Iterator<Item = (NodeIdx, &Node)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(index, node)| (NodeIdx::new(index), node))
    }

    pub fn hub_node(&self, hub: crate::problem::place::HubIdx) -> NodeIdx {
        self.hub_nodes[hub.get()]
    }

    pub fn job_head_node(&self, job: crate::problem::job::JobIdx) -> NodeIdx {
        self.job_head_nodes[job.get()]
    }

    /// Expands hubs and jobs into consecutively numbered nodes.
    pub fn expand(problem: &SchedulingProblem) -> Self {
        let t_zero = problem.t_zero();
        let mut nodes = Vec::new();
        let mut hub_nodes = Vec::with_capacity(problem.hubs().len());
        let mut job_head_nodes = Vec::with_capacity(problem.jobs().len());

        for (index, _) in problem.hubs().iter().enumerate() {
            hub_nodes.push(NodeIdx::new(nodes.len()));
            nodes.push(Node {
                place: PlaceRef::Hub(index.into()),
                tasks: SmallVec::new(),
                window: None,
                skippable: false,
                head: false,
            });
        }

        for (job_idx, job) in problem.jobs_iter() {
            let window = job.window();
            let open = window.open().duration_since(t_zero).as_secs().max(0);
            let close = window.close().duration_since(t_zero).as_secs().max(0);

            let required: SmallVec<[TaskHandle; 2]> = job
                .tasks()
                .iter()
                .enumerate()
                .filter(|(_, task)| !task.is_optional())
                .map(|(index, _)| TaskHandle {
                    job: job_idx,
                    index,
                })
                .collect();

            job_head_nodes.push(NodeIdx::new(nodes.len()));
            nodes.push(Node {
                place: PlaceRef::Job(job_idx),
                tasks: required,
                window: Some((open, close)),
                skippable: job.is_optional(),
                head: true,
            });

            // Optional tasks each get their own skippable node, in task order.
            for (index, task) in job.tasks().iter().enumerate() {
                if task.is_optional() {
                    nodes.push(Node {
                        place: PlaceRef::Job(job_idx),
                        tasks: SmallVec::from_elem(
                            TaskHandle {
                                job: job_idx,
                                index,
                            },
                            1,
                        ),
                        window: None,
                        skippable: true,
                        head: false,
                    });
                }
            }
        }

        NodeGraph {
            nodes,
            hub_nodes,
            job_head_nodes,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        json::types::JsonTask,
        test_utils::{basic_document, task},
    };

    use super::*;

    #[test]
    fn test_hub_and_job_expansion() {
        let mut doc = basic_document();
        doc.t_zero = Some("2026-03-01T00:00:00Z".parse().unwrap());
        let problem = doc.build_problem().unwrap();
        let graph = NodeGraph::expand(&problem);

        // One hub node plus one head node for the single-task job.
        assert_eq!(graph.len(), 2);
        assert!(graph.node(NodeIdx::new(0)).place().is_hub());
        assert!(graph.node(NodeIdx::new(0)).tasks().is_empty());
        assert!(graph.node(NodeIdx::new(0)).window().is_none());

        let head = graph.node(graph.job_head_node(0.into()));
        assert!(head.is_head());
        assert!(!head.is_skippable());
        assert_eq!(head.tasks().len(), 1);
        assert_eq!(head.window(), Some((3600 * 10, 3600 * 11)));
    }

    #[test]
    fn test_optional_tasks_become_skippable_nodes() {
        let mut doc = basic_document();
        let tasks = doc.jobs.as_mut().unwrap()[0].tasks.as_mut().unwrap();
        tasks.push(JsonTask {
            optional: Some(true),
            ..task("t2", "wrench")
        });
        tasks.push(task("t3", "wrench"));
        tasks.push(JsonTask {
            optional: Some(true),
            ..task("t4", "wrench")
        });

        let problem = doc.build_problem().unwrap();
        let graph = NodeGraph::expand(&problem);

        // hub + head (two required tasks) + two optional-task nodes.
        assert_eq!(graph.len(), 4);

        let head = graph.node(NodeIdx::new(1));
        assert_eq!(head.tasks().len(), 2);
        assert_eq!(head.first_task_order(&problem), 1);

        let first_optional = graph.node(NodeIdx::new(2));
        assert!(first_optional.is_skippable());
        assert!(!first_optional.is_head());
        assert!(first_optional.window().is_none());
        assert_eq!(first_optional.first_task_order(&problem), 2);

        let second_optional = graph.node(NodeIdx::new(3));
        assert_eq!(second_optional.first_task_order(&problem), 4);
    }

    #[test]
    fn test_optional_job_head_is_skippable() {
        let mut doc = basic_document();
        doc.jobs.as_mut().unwrap()[0].optional = Some(true);

        let problem = doc.build_problem().unwrap();
        let graph = NodeGraph::expand(&problem);

        assert!(graph.node(graph.job_head_node(0.into())).is_skippable());
    }

    #[test]
    fn test_window_relative_to_explicit_t_zero() {
        let mut doc = basic_document();
        doc.t_zero = Some("2026-03-01T09:00:00Z".parse().unwrap());

        let problem = doc.build_problem().unwrap();
        let graph = NodeGraph::expand(&problem);

        let head = graph.node(graph.job_head_node(0.into()));
        assert_eq!(head.window(), Some((3600, 2 * 3600)));
    }
}
