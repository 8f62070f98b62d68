use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::define_index_newtype;

define_index_newtype!(MetricIdx, Metric);

/// What a metric measures. The three built-in kinds are derived from the
/// vehicle matrices; `Custom` accumulates task rewards.
#[derive(Deserialize, Serialize, JsonSchema, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Distance,
    TravelTime,
    WorkTime,
    Custom,
}

#[derive(Deserialize, Serialize, JsonSchema, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OptimizeMode {
    #[default]
    Minimize,
    Maximize,
}

/// One dimension of the fused cost objective.
#[derive(Debug, Clone, PartialEq)]
pub struct Metric {
    external_id: String,
    kind: MetricKind,
    mode: OptimizeMode,
    weight: f64,
}

impl Metric {
    pub fn new(external_id: String, kind: MetricKind, mode: OptimizeMode, weight: f64) -> Self {
        Metric {
            external_id,
            kind,
            mode,
            weight,
        }
    }

    pub fn external_id(&self) -> &str {
        &self.external_id
    }

    pub fn kind(&self) -> MetricKind {
        self.kind
    }

    pub fn mode(&self) -> OptimizeMode {
        self.mode
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }
}
