//! Reference data and farm layout: growth cycles, requirement profiles,
//! plants, farms, plots. Plus the dashboard counts.

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::engine::Engine;
use crate::error::{Error, Result};
use crate::identity::Actor;
use crate::model::{Farm, GrowthCycle, Plant, Plot, RequirementProfile, Requirements};
use crate::storage::{self, Entity};

/// Upper bound on any one growth cycle duration, in days.
pub const MAX_CYCLE_DAYS: u32 = 36_500;

#[derive(Debug, Clone, Copy)]
pub struct NewGrowthCycle {
    pub germination_days: u32,
    pub vegetative_days: u32,
    pub flowering_days: u32,
    pub fruiting_days: u32,
    pub total_growth_days: u32,
}

#[derive(Debug, Clone)]
pub struct NewPlant {
    pub name: String,
    pub scientific_name: Option<String>,
    pub growth_cycle_id: Option<Uuid>,
    pub requirement_profile_id: Option<Uuid>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewFarm {
    pub name: String,
    pub location: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewPlot {
    pub farm_id: Uuid,
    pub name: String,
    pub area_sqm: Option<Decimal>,
    pub soil_type: Option<String>,
}

/// Counts for an at-a-glance view of the farm.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Stats {
    pub farms: u64,
    pub plots: u64,
    pub active_plantings: u64,
    pub low_stock_items: u64,
    /// Pending tasks scheduled for today. Overdue tasks are not counted.
    pub pending_tasks_due: u64,
}

impl Engine {
    pub fn create_growth_cycle(&self, actor: &Actor, new: NewGrowthCycle) -> Result<GrowthCycle> {
        let durations = [
            ("germination", new.germination_days),
            ("vegetative", new.vegetative_days),
            ("flowering", new.flowering_days),
            ("fruiting", new.fruiting_days),
            ("total growth", new.total_growth_days),
        ];
        for (stage, days) in durations {
            if days > MAX_CYCLE_DAYS {
                return Err(Error::InvalidArgument(format!(
                    "{stage} days must be at most {MAX_CYCLE_DAYS}, got {days}"
                )));
            }
        }

        let cycle = GrowthCycle {
            id: Uuid::new_v4(),
            germination_days: new.germination_days,
            vegetative_days: new.vegetative_days,
            flowering_days: new.flowering_days,
            fruiting_days: new.fruiting_days,
            total_growth_days: new.total_growth_days,
        };
        let conn = self.storage.connect()?;
        storage::catalog::insert_growth_cycle(&conn, &cycle)?;

        info!(id = %cycle.id, actor = %actor.name, "created growth cycle");
        Ok(cycle)
    }

    pub fn list_growth_cycles(&self) -> Result<Vec<GrowthCycle>> {
        let conn = self.storage.connect()?;
        Ok(storage::catalog::list_growth_cycles(&conn)?)
    }

    pub fn create_requirement_profile(
        &self,
        actor: &Actor,
        requirements: Requirements,
    ) -> Result<RequirementProfile> {
        requirements.validate().map_err(Error::InvalidArgument)?;

        let profile = RequirementProfile {
            id: Uuid::new_v4(),
            requirements,
        };
        let conn = self.storage.connect()?;
        storage::catalog::insert_profile(&conn, &profile)?;

        info!(id = %profile.id, actor = %actor.name, "created requirement profile");
        Ok(profile)
    }

    pub fn list_requirement_profiles(&self) -> Result<Vec<RequirementProfile>> {
        let conn = self.storage.connect()?;
        Ok(storage::catalog::list_profiles(&conn)?)
    }

    /// Adds a species to the catalog. Linked cycle and profile must exist.
    pub fn create_plant(&self, actor: &Actor, new: NewPlant) -> Result<Plant> {
        let name = required_text("plant name", &new.name)?;

        let plant = Plant {
            id: Uuid::new_v4(),
            name,
            scientific_name: optional_text(new.scientific_name),
            growth_cycle_id: new.growth_cycle_id,
            requirement_profile_id: new.requirement_profile_id,
            notes: optional_text(new.notes),
        };

        self.storage.unit_of_work(|tx| {
            if let Some(id) = plant.growth_cycle_id {
                storage::catalog::load_growth_cycle(tx, id)?;
            }
            if let Some(id) = plant.requirement_profile_id {
                storage::catalog::load_profile(tx, id)?;
            }
            storage::catalog::insert_plant(tx, &plant)?;
            Ok::<_, Error>(())
        })?;

        info!(id = %plant.id, name = %plant.name, actor = %actor.name, "created plant");
        Ok(plant)
    }

    pub fn get_plant(&self, id: Uuid) -> Result<Plant> {
        let conn = self.storage.connect()?;
        Ok(storage::catalog::load_plant(&conn, id)?)
    }

    pub fn list_plants(&self) -> Result<Vec<Plant>> {
        let conn = self.storage.connect()?;
        Ok(storage::catalog::list_plants(&conn)?)
    }

    /// Creates a farm owned by `actor`.
    pub fn create_farm(&self, actor: &Actor, new: NewFarm) -> Result<Farm> {
        let farm = Farm {
            id: Uuid::new_v4(),
            name: required_text("farm name", &new.name)?,
            owner: actor.name.clone(),
            location: optional_text(new.location),
            description: optional_text(new.description),
            created_at: self.clock.now(),
        };
        let conn = self.storage.connect()?;
        storage::farm::insert_farm(&conn, &farm)?;

        info!(id = %farm.id, owner = %farm.owner, "created farm");
        Ok(farm)
    }

    pub fn list_farms(&self) -> Result<Vec<Farm>> {
        let conn = self.storage.connect()?;
        Ok(storage::farm::list_farms(&conn)?)
    }

    pub fn create_plot(&self, actor: &Actor, new: NewPlot) -> Result<Plot> {
        if let Some(area) = new.area_sqm
            && area <= Decimal::ZERO
        {
            return Err(Error::InvalidArgument(format!(
                "plot area must be positive, got {area}"
            )));
        }

        let plot = Plot {
            id: Uuid::new_v4(),
            farm_id: new.farm_id,
            name: required_text("plot name", &new.name)?,
            area_sqm: new.area_sqm,
            soil_type: optional_text(new.soil_type),
            created_at: self.clock.now(),
        };

        self.storage.unit_of_work(|tx| {
            storage::farm::load_farm(tx, plot.farm_id)?;
            storage::farm::insert_plot(tx, &plot)?;
            Ok::<_, Error>(())
        })?;

        info!(id = %plot.id, farm = %plot.farm_id, actor = %actor.name, "created plot");
        Ok(plot)
    }

    /// Lists plots, optionally only those on `farm` (which must exist).
    pub fn list_plots(&self, farm: Option<Uuid>) -> Result<Vec<Plot>> {
        let conn = self.storage.connect()?;
        if let Some(id) = farm {
            storage::farm::load_farm(&conn, id)?;
        }
        Ok(storage::farm::list_plots(&conn, farm)?)
    }

    pub fn stats(&self) -> Result<Stats> {
        let conn = self.storage.connect()?;
        let low_stock = storage::inventory::list_items(&conn)?
            .iter()
            .filter(|item| item.is_low_stock())
            .count();

        Ok(Stats {
            farms: self.storage.count(Entity::Farm)?,
            plots: self.storage.count(Entity::Plot)?,
            active_plantings: storage::planting::count_active(&conn)?,
            low_stock_items: u64::try_from(low_stock).unwrap_or(u64::MAX),
            pending_tasks_due: storage::task::count_pending_due(&conn, self.clock.today())?,
        })
    }
}

/// Trims `value`, failing if nothing is left.
pub(crate) fn required_text(what: &str, value: &str) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(Error::InvalidArgument(format!("{what} must not be empty")));
    }
    Ok(value.to_string())
}

/// Trims `value`, treating blank as absent.
pub(crate) fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
