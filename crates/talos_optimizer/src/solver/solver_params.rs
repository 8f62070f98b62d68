use jiff::SignedDuration;

use super::routing::solver::{FirstSolutionStrategy, LocalSearchMetaheuristic};

/// Caller-side knobs for one solve. The timeout from the input document
/// applies unless overridden here; the seed fixes the work-simulation RNG
/// for reproducible runs.
#[derive(Debug, Clone, Default)]
pub struct SolverParams {
    pub seed: Option<u64>,
    pub time_limit: Option<SignedDuration>,
    pub first_solution: FirstSolutionStrategy,
    pub metaheuristic: LocalSearchMetaheuristic,
}
