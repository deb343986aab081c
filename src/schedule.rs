//! Schedule compiler: expand a requirement profile into dated task drafts.
//!
//! Pure over `(planted_on, requirements, horizon)`. Persisting the drafts is
//! the caller's job.
//!
//! Tasks are only generated for a fixed planning horizon starting on the
//! planting date (30 days unless configured otherwise). A plant whose growth
//! cycle runs longer gets no tasks past the horizon unless
//! `extend-to-growth-cycle` is set.

use crate::growth::add_days;
use crate::model::{Cadence, GrowthCycle, Requirements, ResourceDemand, TaskDraft, TaskType};

pub const DEFAULT_HORIZON_DAYS: u32 = 30;

const WEEK_DAYS: usize = 7;
const MONTH_DAYS: u32 = 30;

/// Picks the planning horizon for a planting.
///
/// With `extend_to_cycle`, a longer growth cycle stretches the horizon to
/// its total length.
pub fn planning_horizon(base_days: u32, extend_to_cycle: bool, cycle: Option<&GrowthCycle>) -> u32 {
    match cycle {
        Some(cycle) if extend_to_cycle => base_days.max(cycle.total_growth_days),
        _ => base_days,
    }
}

/// Compiles the care schedule for a planting.
///
/// - Daily inputs (water): one task per day, days `0..horizon`.
/// - Weekly inputs (fertilizer): days `0, 7, 14, ...` below the horizon.
/// - Monthly inputs (spray): every 30th day up to and including the horizon.
///
/// Drafts are ordered by date, then by the profile's field order.
pub fn compile_schedule(
    planted_on: jiff::civil::Date,
    requirements: Option<&Requirements>,
    horizon_days: u32,
) -> Vec<TaskDraft> {
    let Some(requirements) = requirements else {
        return Vec::new();
    };

    let mut drafts = Vec::new();
    for demand in requirements.demands() {
        let (task_type, offsets): (TaskType, Vec<u32>) = match demand.cadence {
            Cadence::Daily => (TaskType::Water, (0..horizon_days).collect()),
            Cadence::Weekly => (
                TaskType::Fertilizer,
                (0..horizon_days).step_by(WEEK_DAYS).collect(),
            ),
            Cadence::Monthly => (
                TaskType::Spray,
                (1..=horizon_days / MONTH_DAYS)
                    .map(|month| month * MONTH_DAYS)
                    .collect(),
            ),
        };

        drafts.extend(offsets.into_iter().map(|offset| TaskDraft {
            task_type,
            resource: demand.resource.to_string(),
            scheduled_for: add_days(planted_on, offset),
            demand: Some(ResourceDemand {
                quantity: demand.quantity,
                unit: demand.unit.to_string(),
            }),
        }));
    }

    drafts.sort_by_key(|d| d.scheduled_for);
    drafts
}
