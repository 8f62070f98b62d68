use fxhash::FxHashMap;
use jiff::{SignedDuration, Timestamp};

use crate::define_index_newtype;

use super::{
    metric::MetricIdx,
    place::{HubIdx, PlaceRef},
    tool::ToolIdx,
};

define_index_newtype!(WorkerIdx, Worker);

/// How well a worker handles one tool. Overrides fall back to the tool's
/// defaults when unset.
#[derive(Debug, Clone, PartialEq)]
pub struct Capability {
    work_time: Option<SignedDuration>,
    work_time_factor: f64,
    completion_chance: Option<f64>,
    reward_factors: FxHashMap<MetricIdx, f64>,
}

impl Capability {
    pub fn new(
        work_time: Option<SignedDuration>,
        work_time_factor: f64,
        completion_chance: Option<f64>,
        reward_factors: FxHashMap<MetricIdx, f64>,
    ) -> Self {
        Capability {
            work_time,
            work_time_factor,
            completion_chance,
            reward_factors,
        }
    }

    pub fn work_time(&self) -> Option<SignedDuration> {
        self.work_time
    }

    pub fn work_time_factor(&self) -> f64 {
        self.work_time_factor
    }

    pub fn completion_chance(&self) -> Option<f64> {
        self.completion_chance
    }

    pub fn reward_factor(&self, metric: MetricIdx) -> f64 {
        self.reward_factors.get(&metric).copied().unwrap_or(1.0)
    }

    pub fn reward_factors(&self) -> &FxHashMap<MetricIdx, f64> {
        &self.reward_factors
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ModifierEffect {
    /// Multiplies task rewards earned for the modifier's metric.
    Factor(f64),
    /// A flat reward earned on arrival at the modifier's place.
    Amount(f64),
}

/// Per-worker reward adjustment keyed by metric plus at most one of tool or
/// place.
#[derive(Debug, Clone, PartialEq)]
pub struct RewardModifier {
    pub metric: MetricIdx,
    pub tool: Option<ToolIdx>,
    pub place: Option<PlaceRef>,
    pub effect: ModifierEffect,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Worker {
    external_id: String,
    start_hub: HubIdx,
    end_hub: HubIdx,
    earliest_start: Option<Timestamp>,
    latest_end: Option<Timestamp>,
    travel_speed_factor: f64,
    capabilities: FxHashMap<ToolIdx, Capability>,
    reward_modifiers: Vec<RewardModifier>,
}

impl Worker {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        external_id: String,
        start_hub: HubIdx,
        end_hub: HubIdx,
        earliest_start: Option<Timestamp>,
        latest_end: Option<Timestamp>,
        travel_speed_factor: f64,
        capabilities: FxHashMap<ToolIdx, Capability>,
        reward_modifiers: Vec<RewardModifier>,
    ) -> Self {
        Worker {
            external_id,
            start_hub,
            end_hub,
            earliest_start,
            latest_end,
            travel_speed_factor,
            capabilities,
            reward_modifiers,
        }
    }

    pub fn external_id(&self) -> &str {
        &self.external_id
    }

    pub fn start_hub(&self) -> HubIdx {
        self.start_hub
    }

    pub fn end_hub(&self) -> HubIdx {
        self.end_hub
    }

    pub fn earliest_start(&self) -> Option<Timestamp> {
        self.earliest_start
    }

    pub fn latest_end(&self) -> Option<Timestamp> {
        self.latest_end
    }

    pub fn travel_speed_factor(&self) -> f64 {
        self.travel_speed_factor
    }

    pub fn capability(&self, tool: ToolIdx) -> Option<&Capability> {
        self.capabilities.get(&tool)
    }

    pub fn capabilities(&self) -> &FxHashMap<ToolIdx, Capability> {
        &self.capabilities
    }

    pub fn reward_modifiers(&self) -> &[RewardModifier] {
        &self.reward_modifiers
    }

    /// Product of every matching factor modifier for this metric: metric-wide
    /// ones, ones bound to the tool in use, and ones bound to the place being
    /// worked. Unmatched combinations contribute 1.
    pub fn reward_factor(&self, metric: MetricIdx, tool: ToolIdx, place: PlaceRef) -> f64 {
        self.reward_modifiers
            .iter()
            .filter(|modifier| modifier.metric == metric)
            .filter(|modifier| match (modifier.tool, modifier.place) {
                (None, None) => true,
                (Some(t), None) => t == tool,
                (None, Some(p)) => p == place,
                (Some(_), Some(_)) => false,
            })
            .filter_map(|modifier| match modifier.effect {
                ModifierEffect::Factor(factor) => Some(factor),
                ModifierEffect::Amount(_) => None,
            })
            .product()
    }

    /// Flat rewards this worker earns by arriving at `place`.
    pub fn visit_rewards(&self, place: PlaceRef) -> impl Iterator<Item = (MetricIdx, f64)> + '_ {
        self.reward_modifiers
            .iter()
            .filter(move |modifier| modifier.place == Some(place))
            .filter_map(|modifier| match modifier.effect {
                ModifierEffect::Amount(amount) => Some((modifier.metric, amount)),
                ModifierEffect::Factor(_) => None,
            })
    }
}
