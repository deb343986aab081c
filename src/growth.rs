//! Growth clock: derive a planting's growth stage from elapsed days.
//!
//! Pure and deterministic. Callers pass "today" explicitly and must call
//! again whenever the current date matters; nothing here is cached.

use jiff::{Span, civil::Date};

use crate::model::{GrowthCycle, GrowthStage, GrowthState};

/// Derives the growth state of a planting as of `as_of`.
///
/// Returns `None` when there is no growth cycle: the planting simply has no
/// tracked growth. A planting date in the future clamps to day 0
/// (germination) rather than failing.
pub fn derive_growth_state(
    planted_on: Date,
    cycle: Option<&GrowthCycle>,
    as_of: Date,
) -> Option<GrowthState> {
    let cycle = cycle?;
    let days_since_planting = days_between(planted_on, as_of);

    Some(GrowthState {
        stage: stage_for(days_since_planting, cycle),
        days_since_planting,
        expected_harvest: add_days(planted_on, cycle.total_growth_days),
    })
}

/// Stage boundaries are cumulative and inclusive of their upper day.
fn stage_for(days: u32, cycle: &GrowthCycle) -> GrowthStage {
    let germinated = u64::from(cycle.germination_days);
    let vegetated = germinated + u64::from(cycle.vegetative_days);
    let flowered = vegetated + u64::from(cycle.flowering_days);
    let days = u64::from(days);

    if days <= germinated {
        GrowthStage::Germination
    } else if days <= vegetated {
        GrowthStage::Vegetative
    } else if days <= flowered {
        GrowthStage::Flowering
    } else {
        GrowthStage::Fruiting
    }
}

/// Whole days from `from` to `to`, clamped at zero.
pub(crate) fn days_between(from: Date, to: Date) -> u32 {
    from.until(to)
        .map_or(0, |span| u32::try_from(span.get_days()).unwrap_or(0))
}

/// `date + days`, saturating at the end of the supported calendar.
pub(crate) fn add_days(date: Date, days: u32) -> Date {
    Span::new()
        .try_days(i64::from(days))
        .map_or(Date::MAX, |span| date.saturating_add(span))
}
