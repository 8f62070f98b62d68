use jiff::Timestamp;
use smallvec::SmallVec;

use crate::define_index_newtype;

use super::{location::Location, metric::MetricIdx, tool::ToolIdx};

define_index_newtype!(JobIdx, Job);

/// Closed arrival interval for a job's head node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArrivalWindow {
    open: Timestamp,
    close: Timestamp,
}

impl ArrivalWindow {
    pub fn new(open: Timestamp, close: Timestamp) -> Self {
        ArrivalWindow { open, close }
    }

    pub fn open(&self) -> Timestamp {
        self.open
    }

    pub fn close(&self) -> Timestamp {
        self.close
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reward {
    pub metric: MetricIdx,
    pub amount: f64,
}

/// A single tool-using step of a job. `order` is the 1-based position within
/// the job's task list, assigned during validation.
#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    external_id: String,
    order: u32,
    tool: ToolIdx,
    optional: bool,
    rewards: SmallVec<[Reward; 2]>,
}

impl Task {
    pub fn new(
        external_id: String,
        order: u32,
        tool: ToolIdx,
        optional: bool,
        rewards: SmallVec<[Reward; 2]>,
    ) -> Self {
        Task {
            external_id,
            order,
            tool,
            optional,
            rewards,
        }
    }

    pub fn external_id(&self) -> &str {
        &self.external_id
    }

    pub fn order(&self) -> u32 {
        self.order
    }

    pub fn tool(&self) -> ToolIdx {
        self.tool
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }

    pub fn rewards(&self) -> &[Reward] {
        &self.rewards
    }
}

/// A place workers may visit to perform an ordered sequence of tasks.
#[derive(Debug, Clone, PartialEq)]
pub struct Job {
    external_id: String,
    location: Option<Location>,
    window: ArrivalWindow,
    optional: bool,
    tasks: Vec<Task>,
}

impl Job {
    pub fn new(
        external_id: String,
        location: Option<Location>,
        window: ArrivalWindow,
        optional: bool,
        tasks: Vec<Task>,
    ) -> Self {
        Job {
            external_id,
            location,
            window,
            optional,
            tasks,
        }
    }

    pub fn external_id(&self) -> &str {
        &self.external_id
    }

    pub fn location(&self) -> Option<&Location> {
        self.location.as_ref()
    }

    pub fn window(&self) -> ArrivalWindow {
        self.window
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }

    /// Demotes the job to optional. Used when its window closes before any
    /// worker can start.
    pub(crate) fn mark_optional(&mut self) {
        self.optional = true;
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn task(&self, index: usize) -> &Task {
        &self.tasks[index]
    }

    pub fn required_tasks(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter().filter(|task| !task.is_optional())
    }

    pub fn optional_tasks(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter().filter(|task| task.is_optional())
    }
}

/// Value-copy handle to one task of one job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskHandle {
    pub job: JobIdx,
    pub index: usize,
}
