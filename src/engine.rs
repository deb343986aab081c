//! The planting lifecycle engine.
//!
//! [`Engine`] owns the three collaborators every operation needs: storage,
//! a clock, and settings. The operations themselves live next to the logic
//! they drive:
//!
//! - [`catalog`](crate::catalog): growth cycles, requirement profiles,
//!   plants, farms, plots, and dashboard counts
//! - [`lifecycle`](crate::lifecycle): creating and reading plantings
//! - [`ledger`](crate::ledger): stock levels and adjustments
//! - [`completion`](crate::completion): completing, skipping, and listing tasks

use jiff::civil::Date;
use uuid::Uuid;

use crate::clock::Clock;
use crate::config::{Config, UntrackedResources};
use crate::error::{Error, Result};
use crate::schedule::DEFAULT_HORIZON_DAYS;
use crate::storage::{Entity, Storage};

/// Tunables that change engine behavior, resolved from [`Config`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    pub horizon_days: u32,
    pub extend_to_growth_cycle: bool,
    pub untracked_resources: UntrackedResources,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            horizon_days: DEFAULT_HORIZON_DAYS,
            extend_to_growth_cycle: false,
            untracked_resources: UntrackedResources::Proceed,
        }
    }
}

impl Settings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            horizon_days: config.schedule.horizon_days,
            extend_to_growth_cycle: config.schedule.extend_to_growth_cycle,
            untracked_resources: config.inventory.untracked_resources,
        }
    }
}

pub struct Engine {
    pub(crate) storage: Storage,
    pub(crate) clock: Box<dyn Clock>,
    pub(crate) settings: Settings,
}

impl Engine {
    pub fn new(storage: Storage, clock: impl Clock + 'static, settings: Settings) -> Self {
        Self {
            storage,
            clock: Box::new(clock),
            settings,
        }
    }

    /// Today, according to the engine's clock.
    pub fn today(&self) -> Date {
        self.clock.today()
    }

    /// Resolves a full id or an unambiguous id prefix (e.g. `a3b`).
    pub fn resolve_id(&self, entity: Entity, reference: &str) -> Result<Uuid> {
        // Try full UUID first.
        if let Ok(id) = reference.parse::<Uuid>() {
            return Ok(id);
        }

        if reference.is_empty() || !reference.chars().all(|c| c.is_ascii_hexdigit() || c == '-') {
            return Err(Error::InvalidArgument(format!(
                "'{reference}' is not an id or id prefix"
            )));
        }

        let matches = self.storage.ids_with_prefix(entity, reference)?;
        match matches.as_slice() {
            [] => Err(Error::not_found(entity, reference)),
            [id] => Ok(*id),
            ids => {
                let shown: Vec<String> = ids.iter().map(|id| id.to_string()[..8].to_string()).collect();
                Err(Error::InvalidArgument(format!(
                    "'{reference}' is ambiguous: matches {} {entity} records: {}",
                    ids.len(),
                    shown.join(", ")
                )))
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use jiff::{civil::Date, tz::TimeZone};
    use rust_decimal::Decimal;
    use tempfile::TempDir;
    use uuid::Uuid;

    use super::{Engine, Settings};
    use crate::catalog::{NewFarm, NewGrowthCycle, NewPlant, NewPlot};
    use crate::clock::FixedClock;
    use crate::identity::{Actor, Role};
    use crate::model::Requirements;
    use crate::storage::testing::test_storage;

    pub(crate) fn owner() -> Actor {
        Actor::new("asha", Role::Owner)
    }

    pub(crate) fn farmer() -> Actor {
        Actor::new("ravi", Role::Farmer)
    }

    /// An engine over a throwaway database whose clock reads `today`.
    pub(crate) fn test_engine_with(today: Date, settings: Settings) -> (TempDir, Engine) {
        let (dir, storage) = test_storage();
        let at = today.at(9, 0, 0, 0).to_zoned(TimeZone::UTC).unwrap();
        (dir, Engine::new(storage, FixedClock::new(at), settings))
    }

    pub(crate) fn test_engine(today: Date) -> (TempDir, Engine) {
        test_engine_with(today, Settings::default())
    }

    pub(crate) fn seed_plot(engine: &Engine) -> Uuid {
        let farm = engine
            .create_farm(
                &owner(),
                NewFarm {
                    name: "North".into(),
                    location: None,
                    description: None,
                },
            )
            .unwrap();
        engine
            .create_plot(
                &owner(),
                NewPlot {
                    farm_id: farm.id,
                    name: "Bed 1".into(),
                    area_sqm: None,
                    soil_type: None,
                },
            )
            .unwrap()
            .id
    }

    pub(crate) fn tomato_cycle() -> NewGrowthCycle {
        NewGrowthCycle {
            germination_days: 7,
            vegetative_days: 21,
            flowering_days: 14,
            fruiting_days: 28,
            total_growth_days: 70,
        }
    }

    pub(crate) fn water_only() -> Requirements {
        Requirements {
            water_min_ml: Some(Decimal::new(500, 0)),
            ..Requirements::default()
        }
    }

    /// A tomato with the standard cycle and, optionally, a profile.
    pub(crate) fn seed_plant(engine: &Engine, requirements: Option<Requirements>) -> Uuid {
        let cycle = engine.create_growth_cycle(&owner(), tomato_cycle()).unwrap();
        let profile = requirements
            .map(|r| engine.create_requirement_profile(&owner(), r).unwrap().id);
        engine
            .create_plant(
                &owner(),
                NewPlant {
                    name: "Tomato".into(),
                    scientific_name: Some("Solanum lycopersicum".into()),
                    growth_cycle_id: Some(cycle.id),
                    requirement_profile_id: profile,
                    notes: None,
                },
            )
            .unwrap()
            .id
    }
}
