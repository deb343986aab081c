//! Farm layout and plantings.

use std::{fmt, str::FromStr};

use jiff::{Timestamp, civil::Date};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{GrowthState, ParseEnumError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Farm {
    pub id: Uuid,
    pub name: String,
    pub owner: String,
    pub location: Option<String>,
    pub description: Option<String>,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plot {
    pub id: Uuid,
    pub farm_id: Uuid,
    pub name: String,
    pub area_sqm: Option<Decimal>,
    pub soil_type: Option<String>,
    pub created_at: Timestamp,
}

/// One concrete planting of a species on a plot.
///
/// `growth` is a cache: it is recomputed from `planted_on`, the plant's
/// growth cycle, and today's date on every read. `None` means the plant
/// has no growth cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlantInstance {
    pub id: Uuid,
    pub plot_id: Uuid,
    pub plant_id: Uuid,
    pub planted_on: Date,
    pub count: u32,
    pub status: InstanceStatus,
    pub growth: Option<GrowthState>,
    pub created_by: String,
    pub created_at: Timestamp,
}

/// Where a planting stands in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InstanceStatus {
    Active,
    Completed,
    Failed,
}

impl InstanceStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for InstanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InstanceStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            other => Err(ParseEnumError::new("instance status", other)),
        }
    }
}
