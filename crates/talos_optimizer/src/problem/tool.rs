use jiff::SignedDuration;

use crate::define_index_newtype;

define_index_newtype!(ToolIdx, Tool);

/// A tool a worker may be capable of using. The defaults apply whenever a
/// capability does not override them.
#[derive(Debug, Clone, PartialEq)]
pub struct Tool {
    external_id: String,
    default_work_time: SignedDuration,
    default_completion_chance: f64,
}

impl Tool {
    pub fn new(
        external_id: String,
        default_work_time: SignedDuration,
        default_completion_chance: f64,
    ) -> Self {
        Tool {
            external_id,
            default_work_time,
            default_completion_chance,
        }
    }

    pub fn external_id(&self) -> &str {
        &self.external_id
    }

    pub fn default_work_time(&self) -> SignedDuration {
        self.default_work_time
    }

    pub fn default_completion_chance(&self) -> f64 {
        self.default_completion_chance
    }
}
