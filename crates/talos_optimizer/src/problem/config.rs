use jiff::{SignedDuration, Timestamp};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::units::{DistanceUnit, TimeUnit};

/// Which geometry backend computes distances and travel times.
#[derive(Deserialize, Serialize, JsonSchema, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GeometryMode {
    /// Manhattan distance on planar coordinates.
    #[default]
    Simple,
    /// Road-network matrices from an OSRM service. Not implemented.
    Osrm,
}

/// Solve-wide options decoded from the top level of the input document.
#[derive(Debug, Clone, PartialEq)]
pub struct SolverConfig {
    pub t_zero: Option<Timestamp>,
    pub timeout: SignedDuration,
    pub default_travel_speed: f64,
    pub distance_unit: DistanceUnit,
    pub time_unit: TimeUnit,
    pub max_idle_time: f64,
    pub engine: GeometryMode,
}

impl Default for SolverConfig {
    fn default() -> Self {
        SolverConfig {
            t_zero: None,
            timeout: SignedDuration::from_secs(10),
            default_travel_speed: 1.0,
            distance_unit: DistanceUnit::default(),
            time_unit: TimeUnit::default(),
            max_idle_time: 0.0,
            engine: GeometryMode::default(),
        }
    }
}

impl SolverConfig {
    pub fn meters_per_unit(&self) -> f64 {
        self.distance_unit.meters_per_unit()
    }

    pub fn seconds_per_unit(&self) -> f64 {
        self.time_unit.seconds_per_unit()
    }

    /// Maximum idle time between consecutive visits, in seconds.
    pub fn max_idle_seconds(&self) -> i64 {
        (self.max_idle_time * self.seconds_per_unit()).round() as i64
    }
}
