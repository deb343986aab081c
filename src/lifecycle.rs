//! Planting lifecycle: creating plantings, materializing their care
//! schedule, and serving them with fresh growth state.
//!
//! The growth fields stored on a planting are a cache. Every read
//! recomputes them from the planting date, the plant's growth cycle, and
//! the engine clock; a stale cache is rewritten on the way out, but a
//! failed rewrite never fails the read.

use std::collections::HashMap;

use jiff::civil::Date;
use rusqlite::Connection;
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::engine::Engine;
use crate::error::{Error, Result};
use crate::growth::derive_growth_state;
use crate::identity::Actor;
use crate::model::{
    GrowthCycle, InstanceStatus, PlantInstance, ScheduledTask, TaskDraft, TaskStatus,
};
use crate::schedule::{compile_schedule, planning_horizon};
use crate::storage;

#[derive(Debug, Clone, Copy)]
pub struct NewPlanting {
    pub plot_id: Uuid,
    pub plant_id: Uuid,
    pub planted_on: Date,
    pub count: u32,
}

/// What happened to the care schedule of a new planting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "result")]
pub enum ScheduleOutcome {
    /// The plant has no requirement profile; nothing to schedule.
    NoProfile,
    /// This many tasks were stored.
    Scheduled { tasks: usize },
    /// Scheduling failed. The planting exists with no tasks.
    Failed { reason: String },
}

/// A newly created planting and its schedule outcome.
#[derive(Debug, Clone, Serialize)]
pub struct Planting {
    pub instance: PlantInstance,
    pub schedule: ScheduleOutcome,
}

impl Engine {
    /// Plants `count` of a species on a plot.
    ///
    /// The planting is stored first in its own unit of work. Its care
    /// schedule follows in a second one: if that fails, the planting stays
    /// and the failure is reported in [`Planting::schedule`].
    pub fn create_plant_instance(&self, actor: &Actor, new: NewPlanting) -> Result<Planting> {
        if new.count < 1 {
            return Err(Error::InvalidArgument(
                "planting count must be at least 1".into(),
            ));
        }

        let today = self.clock.today();
        let now = self.clock.now();

        let (instance, profile_id, cycle) = self.storage.unit_of_work(|tx| {
            storage::farm::load_plot(tx, new.plot_id)?;
            let plant = storage::catalog::load_plant(tx, new.plant_id)?;
            let cycle = plant
                .growth_cycle_id
                .map(|id| storage::catalog::load_growth_cycle(tx, id))
                .transpose()?;

            let instance = PlantInstance {
                id: Uuid::new_v4(),
                plot_id: new.plot_id,
                plant_id: new.plant_id,
                planted_on: new.planted_on,
                count: new.count,
                status: InstanceStatus::Active,
                growth: derive_growth_state(new.planted_on, cycle.as_ref(), today),
                created_by: actor.name.clone(),
                created_at: now,
            };
            storage::planting::insert_instance(tx, &instance)?;
            Ok::<_, Error>((instance, plant.requirement_profile_id, cycle))
        })?;

        info!(
            id = %instance.id,
            plot = %instance.plot_id,
            plant = %instance.plant_id,
            actor = %actor.name,
            "created plant instance"
        );

        let schedule = match profile_id {
            None => ScheduleOutcome::NoProfile,
            Some(profile_id) => match self.store_schedule(&instance, profile_id, cycle.as_ref()) {
                Ok(tasks) => ScheduleOutcome::Scheduled { tasks },
                Err(e) => {
                    warn!(id = %instance.id, error = %e, "schedule generation failed");
                    ScheduleOutcome::Failed {
                        reason: e.to_string(),
                    }
                }
            },
        };

        Ok(Planting { instance, schedule })
    }

    /// Compiles and stores the schedule for `instance` as one batch.
    fn store_schedule(
        &self,
        instance: &PlantInstance,
        profile_id: Uuid,
        cycle: Option<&GrowthCycle>,
    ) -> Result<usize> {
        let horizon = planning_horizon(
            self.settings.horizon_days,
            self.settings.extend_to_growth_cycle,
            cycle,
        );

        self.storage.unit_of_work(|tx| {
            let profile = storage::catalog::load_profile(tx, profile_id)?;
            let drafts = compile_schedule(instance.planted_on, Some(&profile.requirements), horizon);

            let mut bindings = HashMap::new();
            let mut tasks = Vec::with_capacity(drafts.len());
            for draft in drafts {
                let item = bound_item(tx, &draft, &mut bindings)?;
                tasks.push(task_from_draft(instance.id, draft, item));
            }
            storage::task::insert_tasks(tx, &tasks)?;

            debug!(id = %instance.id, tasks = tasks.len(), horizon, "stored schedule");
            Ok(tasks.len())
        })
    }

    pub fn get_plant_instance(&self, id: Uuid) -> Result<PlantInstance> {
        let conn = self.storage.connect()?;
        let instance = storage::planting::load_instance(&conn, id)?;
        self.refresh_with(&conn, instance, &mut HashMap::new())
    }

    /// Lists plantings, optionally only those on `plot` (which must exist).
    pub fn list_plant_instances(&self, plot: Option<Uuid>) -> Result<Vec<PlantInstance>> {
        let conn = self.storage.connect()?;
        if let Some(id) = plot {
            storage::farm::load_plot(&conn, id)?;
        }

        let mut cycles = HashMap::new();
        storage::planting::list_instances(&conn, plot)?
            .into_iter()
            .map(|instance| self.refresh_with(&conn, instance, &mut cycles))
            .collect()
    }

    /// Recomputes the growth fields of `instance` as of today.
    pub fn refresh_growth_state(&self, instance: PlantInstance) -> Result<PlantInstance> {
        let conn = self.storage.connect()?;
        self.refresh_with(&conn, instance, &mut HashMap::new())
    }

    /// Closes out an active planting as completed or failed.
    pub fn close_plant_instance(
        &self,
        actor: &Actor,
        id: Uuid,
        outcome: InstanceStatus,
    ) -> Result<PlantInstance> {
        if outcome == InstanceStatus::Active {
            return Err(Error::InvalidArgument(
                "a planting can only be closed as completed or failed".into(),
            ));
        }

        let instance = self.storage.unit_of_work(|tx| {
            let instance = storage::planting::load_instance(tx, id)?;
            if instance.status != InstanceStatus::Active {
                return Err(Error::InvalidState(format!(
                    "plant instance {id} is already {}",
                    instance.status
                )));
            }
            if !storage::planting::close_instance(tx, id, outcome)? {
                return Err(Error::InvalidState(format!(
                    "plant instance {id} is no longer active"
                )));
            }
            Ok(PlantInstance {
                status: outcome,
                ..instance
            })
        })?;

        info!(id = %id, status = %outcome, actor = %actor.name, "closed plant instance");
        self.refresh_growth_state(instance)
    }

    fn refresh_with(
        &self,
        conn: &Connection,
        mut instance: PlantInstance,
        cycles: &mut HashMap<Uuid, Option<GrowthCycle>>,
    ) -> Result<PlantInstance> {
        let cycle = match cycles.get(&instance.plant_id) {
            Some(cycle) => cycle.clone(),
            None => {
                let plant = storage::catalog::load_plant(conn, instance.plant_id)?;
                let cycle = plant
                    .growth_cycle_id
                    .map(|id| storage::catalog::load_growth_cycle(conn, id))
                    .transpose()?;
                cycles.insert(instance.plant_id, cycle.clone());
                cycle
            }
        };

        let fresh = derive_growth_state(instance.planted_on, cycle.as_ref(), self.clock.today());
        if fresh != instance.growth {
            if let Err(e) = storage::planting::update_growth_cache(conn, instance.id, fresh.as_ref()) {
                warn!(id = %instance.id, error = %e, "failed to cache growth state");
            }
            instance.growth = fresh;
        }
        Ok(instance)
    }
}

/// Finds the inventory item a task draws on: the one item whose name is
/// the task's resource and whose unit matches. Anything else stays unbound
/// and is resolved by unit at completion time.
fn bound_item(
    conn: &Connection,
    draft: &TaskDraft,
    cache: &mut HashMap<(String, String), Option<Uuid>>,
) -> Result<Option<Uuid>> {
    let Some(demand) = &draft.demand else {
        return Ok(None);
    };
    let key = (draft.resource.clone(), demand.unit.clone());
    if let Some(found) = cache.get(&key) {
        return Ok(*found);
    }

    let found = match storage::inventory::items_named(conn, &draft.resource, &demand.unit)?.as_slice() {
        [item] => Some(item.id),
        _ => None,
    };
    cache.insert(key, found);
    Ok(found)
}

fn task_from_draft(instance_id: Uuid, draft: TaskDraft, item: Option<Uuid>) -> ScheduledTask {
    ScheduledTask {
        id: Uuid::new_v4(),
        plant_instance_id: instance_id,
        task_type: draft.task_type,
        resource: draft.resource,
        scheduled_for: draft.scheduled_for,
        status: TaskStatus::Pending,
        demand: draft.demand,
        inventory_item_id: item,
        resolved_at: None,
    }
}
