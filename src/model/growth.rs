//! Growth cycles and the growth state derived from them.

use std::{fmt, str::FromStr};

use jiff::civil::Date;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ParseEnumError;

/// Stage durations for a plant species, in days.
///
/// Stage boundaries are cumulative sums of the first three durations.
/// `total_growth_days` is authoritative for the expected harvest date and
/// need not equal the sum of the stages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrowthCycle {
    pub id: Uuid,
    pub germination_days: u32,
    pub vegetative_days: u32,
    pub flowering_days: u32,
    pub fruiting_days: u32,
    pub total_growth_days: u32,
}

/// Where a planting is in its growth cycle.
///
/// Ordered: a planting only ever moves forward through the stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GrowthStage {
    Germination,
    Vegetative,
    Flowering,
    /// Terminal. Persists until the planting is closed out.
    Fruiting,
}

impl GrowthStage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Germination => "germination",
            Self::Vegetative => "vegetative",
            Self::Flowering => "flowering",
            Self::Fruiting => "fruiting",
        }
    }
}

impl fmt::Display for GrowthStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GrowthStage {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "germination" => Ok(Self::Germination),
            "vegetative" => Ok(Self::Vegetative),
            "flowering" => Ok(Self::Flowering),
            "fruiting" => Ok(Self::Fruiting),
            other => Err(ParseEnumError::new("growth stage", other)),
        }
    }
}

/// Growth fields derived from a planting date, a cycle, and "today".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrowthState {
    pub stage: GrowthStage,
    pub days_since_planting: u32,
    pub expected_harvest: Date,
}
