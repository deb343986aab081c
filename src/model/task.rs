//! Scheduled care tasks and the checklist that records who did them.

use std::{fmt, str::FromStr};

use jiff::{Timestamp, civil::Date};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ParseEnumError;

/// The kind of care a task calls for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TaskType {
    Water,
    Fertilizer,
    Spray,
}

impl TaskType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Water => "water",
            Self::Fertilizer => "fertilizer",
            Self::Spray => "spray",
        }
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "water" => Ok(Self::Water),
            "fertilizer" => Ok(Self::Fertilizer),
            "spray" => Ok(Self::Spray),
            other => Err(ParseEnumError::new("task type", other)),
        }
    }
}

/// Task state machine: `Pending` moves once, to `Done` or `Skipped`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TaskStatus {
    Pending,
    Done,
    Skipped,
}

impl TaskStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Done => "done",
            Self::Skipped => "skipped",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "done" => Ok(Self::Done),
            "skipped" => Ok(Self::Skipped),
            other => Err(ParseEnumError::new("task status", other)),
        }
    }
}

/// A quantity of some input a task consumes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceDemand {
    pub quantity: Decimal,
    pub unit: String,
}

/// A task produced by the schedule compiler, not yet persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDraft {
    pub task_type: TaskType,
    pub resource: String,
    pub scheduled_for: Date,
    pub demand: Option<ResourceDemand>,
}

/// A dated unit of care work for one planting.
///
/// Once `Done`, the demand and the inventory debit it caused are history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledTask {
    pub id: Uuid,
    pub plant_instance_id: Uuid,
    pub task_type: TaskType,
    pub resource: String,
    pub scheduled_for: Date,
    pub status: TaskStatus,
    pub demand: Option<ResourceDemand>,
    /// Inventory item bound at planting time, if one matched.
    pub inventory_item_id: Option<Uuid>,
    pub resolved_at: Option<Timestamp>,
}

/// Who performed a task, and when. One per completed task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistEntry {
    pub id: Uuid,
    pub task_id: Uuid,
    pub performed_by: String,
    pub notes: Option<String>,
    pub performed_at: Timestamp,
}
