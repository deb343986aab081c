//! Output formatting for CLI display.

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::lifecycle::ScheduleOutcome;
use crate::model::{GrowthState, ResourceDemand};

/// The first eight hex digits of an id, enough to refer back to it.
pub(super) fn short(id: Uuid) -> String {
    id.to_string()[..8].to_string()
}

pub(super) fn format_growth(growth: Option<&GrowthState>) -> String {
    match growth {
        Some(g) => format!(
            "{} day {} (harvest {})",
            g.stage, g.days_since_planting, g.expected_harvest
        ),
        None => "untracked".to_string(),
    }
}

pub(super) fn format_demand(demand: Option<&ResourceDemand>) -> String {
    match demand {
        Some(d) => format!("{} {}", d.quantity.normalize(), d.unit),
        None => "-".to_string(),
    }
}

pub(super) fn format_quantity(quantity: Decimal, unit: &str) -> String {
    format!("{} {unit}", quantity.normalize())
}

pub(super) fn format_schedule(outcome: &ScheduleOutcome) -> String {
    match outcome {
        ScheduleOutcome::NoProfile => "no requirement profile, nothing scheduled".to_string(),
        ScheduleOutcome::Scheduled { tasks } => format!("{tasks} tasks scheduled"),
        ScheduleOutcome::Failed { reason } => format!("scheduling failed: {reason}"),
    }
}

pub(super) fn or_dash(value: Option<&str>) -> &str {
    value.unwrap_or("-")
}
