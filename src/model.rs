//! Core data model for Furrow.
//!
//! Reference data (growth cycles, requirement profiles, plants), the farm
//! layout (farms, plots), plantings and their derived growth state,
//! scheduled care tasks, and the inventory ledger.

mod catalog;
mod growth;
mod inventory;
mod planting;
mod task;

pub use catalog::{Cadence, Demand, Plant, RequirementProfile, Requirements};
pub use growth::{GrowthCycle, GrowthStage, GrowthState};
pub use inventory::{InventoryItem, InventoryTransaction};
pub use planting::{Farm, InstanceStatus, PlantInstance, Plot};
pub use task::{ChecklistEntry, ResourceDemand, ScheduledTask, TaskDraft, TaskStatus, TaskType};

/// Error returned when parsing one of the model's string-encoded enums.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind}: {value}")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

impl ParseEnumError {
    pub(crate) fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}
