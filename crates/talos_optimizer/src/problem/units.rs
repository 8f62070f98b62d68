use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};

/// Distance unit of the input document. All internal geometry is in meters.
#[derive(JsonSchema, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DistanceUnit {
    Foot,
    #[default]
    Metre,
    Ell,
    Fathom,
    Peninkulma,
    Rast,
}

impl DistanceUnit {
    pub fn meters_per_unit(&self) -> f64 {
        match self {
            DistanceUnit::Foot => 0.3048,
            DistanceUnit::Metre => 1.0,
            DistanceUnit::Ell => 1.143,
            DistanceUnit::Fathom => 1.8288,
            DistanceUnit::Peninkulma => 6000.0,
            DistanceUnit::Rast => 10000.0,
        }
    }
}

impl<'de> Deserialize<'de> for DistanceUnit {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        match name.to_ascii_lowercase().as_str() {
            "foot" => Ok(DistanceUnit::Foot),
            "metre" => Ok(DistanceUnit::Metre),
            "ell" => Ok(DistanceUnit::Ell),
            "fathom" => Ok(DistanceUnit::Fathom),
            "peninkulma" => Ok(DistanceUnit::Peninkulma),
            "rast" => Ok(DistanceUnit::Rast),
            _ => Err(serde::de::Error::custom(format!(
                "unknown distance unit: {name}"
            ))),
        }
    }
}

/// Time unit of the input document. All internal scheduling is in seconds.
#[derive(JsonSchema, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeUnit {
    #[default]
    Second,
    Minute,
    Hour,
}

impl TimeUnit {
    pub fn seconds_per_unit(&self) -> f64 {
        match self {
            TimeUnit::Second => 1.0,
            TimeUnit::Minute => 60.0,
            TimeUnit::Hour => 3600.0,
        }
    }
}

impl<'de> Deserialize<'de> for TimeUnit {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        match name.to_ascii_lowercase().as_str() {
            "second" => Ok(TimeUnit::Second),
            "minute" => Ok(TimeUnit::Minute),
            "hour" => Ok(TimeUnit::Hour),
            _ => Err(serde::de::Error::custom(format!("unknown time unit: {name}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_unit_factors() {
        assert_eq!(DistanceUnit::Foot.meters_per_unit(), 0.3048);
        assert_eq!(DistanceUnit::Metre.meters_per_unit(), 1.0);
        assert_eq!(DistanceUnit::Ell.meters_per_unit(), 1.143);
        assert_eq!(DistanceUnit::Fathom.meters_per_unit(), 1.8288);
        assert_eq!(DistanceUnit::Peninkulma.meters_per_unit(), 6000.0);
        assert_eq!(DistanceUnit::Rast.meters_per_unit(), 10000.0);
    }

    #[test]
    fn test_time_unit_factors() {
        assert_eq!(TimeUnit::Second.seconds_per_unit(), 1.0);
        assert_eq!(TimeUnit::Minute.seconds_per_unit(), 60.0);
        assert_eq!(TimeUnit::Hour.seconds_per_unit(), 3600.0);
    }

    #[test]
    fn test_case_insensitive_parsing() {
        let unit: DistanceUnit = serde_json::from_str("\"peninkulma\"").unwrap();
        assert_eq!(unit, DistanceUnit::Peninkulma);

        let unit: DistanceUnit = serde_json::from_str("\"FATHOM\"").unwrap();
        assert_eq!(unit, DistanceUnit::Fathom);

        let unit: TimeUnit = serde_json::from_str("\"hour\"").unwrap();
        assert_eq!(unit, TimeUnit::Hour);

        assert!(serde_json::from_str::<DistanceUnit>("\"parsec\"").is_err());
    }
}
