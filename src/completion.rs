//! Task completion: the one place a care task touches stock.
//!
//! Completing a task debits the input it consumes, records who did it, and
//! marks it done, all in one unit of work. If any step fails nothing is
//! written, so a failed completion can simply be retried.

use jiff::{Timestamp, civil::Date};
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::config::UntrackedResources;
use crate::engine::Engine;
use crate::error::{Error, Result};
use crate::identity::Actor;
use crate::ledger::apply_adjustment;
use crate::model::{ChecklistEntry, InventoryItem, ResourceDemand, ScheduledTask, TaskStatus};
use crate::storage::{self, Entity};

/// Narrows [`Engine::list_scheduled_tasks`]. Empty matches everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct TaskFilter {
    pub plot: Option<Uuid>,
    pub plant_instance: Option<Uuid>,
    pub status: Option<TaskStatus>,
}

/// Stock drawn by a completed task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Debit {
    pub item_id: Uuid,
    pub item: String,
    pub quantity: Decimal,
    pub unit: String,
    pub remaining: Decimal,
}

/// The result of completing a task.
#[derive(Debug, Clone, Serialize)]
pub struct Completion {
    pub task: ScheduledTask,
    /// `None` when the task has no demand or its input is untracked.
    pub debit: Option<Debit>,
    pub entry: ChecklistEntry,
}

/// A task with its checklist entry, if it has been done.
#[derive(Debug, Clone, Serialize)]
pub struct TaskRecord {
    pub task: ScheduledTask,
    pub checklist: Option<ChecklistEntry>,
}

impl Engine {
    /// Marks a pending task done, drawing its input from stock.
    ///
    /// Fails with [`Error::InvalidState`] unless the task is pending, and
    /// with [`Error::InsufficientStock`] if the matched item holds less
    /// than the task needs. Either way nothing changes.
    pub fn complete_task(
        &self,
        actor: &Actor,
        task_id: Uuid,
        notes: Option<&str>,
    ) -> Result<Completion> {
        let now = self.clock.now();
        let untracked = self.settings.untracked_resources;

        let completion = self.storage.unit_of_work(|tx| {
            let task = load_pending(tx, task_id)?;

            let debit = match &task.demand {
                None => None,
                Some(demand) => match resolve_item(tx, &task, demand)? {
                    Some(item) => {
                        let reason = format!("task completion: {}", task.task_type);
                        let remaining = apply_adjustment(
                            tx,
                            &item,
                            -demand.quantity,
                            &reason,
                            Some(task.id),
                            &actor.name,
                            now,
                        )?;
                        Some(Debit {
                            item_id: item.id,
                            item: item.name,
                            quantity: demand.quantity,
                            unit: item.unit,
                            remaining,
                        })
                    }
                    None if untracked == UntrackedResources::Reject => {
                        return Err(Error::not_found(
                            Entity::InventoryItem,
                            format!("{} ({})", task.resource, demand.unit),
                        ));
                    }
                    None => {
                        info!(task = %task.id, resource = %task.resource, unit = %demand.unit, "untracked resource, no debit");
                        None
                    }
                },
            };

            mark(tx, task_id, TaskStatus::Done, now)?;
            let entry = ChecklistEntry {
                id: Uuid::new_v4(),
                task_id,
                performed_by: actor.name.clone(),
                notes: notes.map(str::trim).filter(|n| !n.is_empty()).map(String::from),
                performed_at: now,
            };
            storage::task::insert_checklist_entry(tx, &entry)?;

            Ok(Completion {
                task: ScheduledTask {
                    status: TaskStatus::Done,
                    resolved_at: Some(now),
                    ..task
                },
                debit,
                entry,
            })
        })?;

        info!(
            task = %task_id,
            actor = %actor.name,
            debited = completion.debit.is_some(),
            "completed task"
        );
        Ok(completion)
    }

    /// Marks a pending task skipped. Stock is untouched.
    pub fn skip_task(
        &self,
        actor: &Actor,
        task_id: Uuid,
        reason: Option<&str>,
    ) -> Result<ScheduledTask> {
        let now = self.clock.now();

        let task = self.storage.unit_of_work(|tx| {
            let task = load_pending(tx, task_id)?;
            mark(tx, task_id, TaskStatus::Skipped, now)?;
            Ok::<_, Error>(ScheduledTask {
                status: TaskStatus::Skipped,
                resolved_at: Some(now),
                ..task
            })
        })?;

        info!(task = %task_id, actor = %actor.name, reason = reason.unwrap_or(""), "skipped task");
        Ok(task)
    }

    pub fn get_task(&self, task_id: Uuid) -> Result<TaskRecord> {
        let conn = self.storage.connect()?;
        Ok(TaskRecord {
            task: storage::task::load_task(&conn, task_id)?,
            checklist: storage::task::checklist_entry_for(&conn, task_id)?,
        })
    }

    /// Lists tasks by date. A plot or planting in the filter must exist.
    pub fn list_scheduled_tasks(&self, filter: TaskFilter) -> Result<Vec<ScheduledTask>> {
        let conn = self.storage.connect()?;
        if let Some(id) = filter.plot {
            storage::farm::load_plot(&conn, id)?;
        }
        if let Some(id) = filter.plant_instance {
            storage::planting::load_instance(&conn, id)?;
        }
        Ok(storage::task::list_tasks(
            &conn,
            filter.plot,
            filter.plant_instance,
            filter.status,
        )?)
    }

    /// Every task scheduled on `date`, whatever its status.
    pub fn list_tasks_due_on(&self, date: Date) -> Result<Vec<ScheduledTask>> {
        let conn = self.storage.connect()?;
        Ok(storage::task::tasks_due_on(&conn, date)?)
    }
}

fn load_pending(conn: &Connection, task_id: Uuid) -> Result<ScheduledTask> {
    let task = storage::task::load_task(conn, task_id)?;
    if task.status != TaskStatus::Pending {
        return Err(Error::InvalidState(format!(
            "task {task_id} is {}, not pending",
            task.status
        )));
    }
    Ok(task)
}

fn mark(conn: &Connection, task_id: Uuid, status: TaskStatus, at: Timestamp) -> Result<()> {
    if !storage::task::resolve_task(conn, task_id, status, at)? {
        return Err(Error::InvalidState(format!(
            "task {task_id} is no longer pending"
        )));
    }
    Ok(())
}

/// Picks the item a task draws from.
///
/// The item bound at planting time wins. Otherwise any item stocked in the
/// task's unit is a candidate, narrowed by the task's resource name when
/// there are several. A tie that survives narrowing is a conflict.
fn resolve_item(
    conn: &Connection,
    task: &ScheduledTask,
    demand: &ResourceDemand,
) -> Result<Option<InventoryItem>> {
    if let Some(id) = task.inventory_item_id {
        return Ok(Some(storage::inventory::load_item(conn, id)?));
    }

    let mut candidates = storage::inventory::items_with_unit(conn, &demand.unit)?;
    if candidates.len() <= 1 {
        return Ok(candidates.pop());
    }

    let total = candidates.len();
    candidates.retain(|item| item.name.eq_ignore_ascii_case(&task.resource));
    match candidates.len() {
        1 => Ok(candidates.pop()),
        _ => Err(Error::Conflict(format!(
            "{total} inventory items are stocked in {unit} and none is uniquely named {resource}",
            unit = demand.unit,
            resource = task.resource
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Barrier;
    use std::thread;

    use jiff::civil::date;

    use crate::engine::Settings;
    use crate::engine::testing::{
        farmer, owner, seed_plant, seed_plot, test_engine, test_engine_with, water_only,
    };
    use crate::ledger::NewInventoryItem;
    use crate::lifecycle::NewPlanting;
    use crate::model::Requirements;

    fn stock(engine: &Engine, name: &str, unit: &str, quantity: i64) -> InventoryItem {
        engine
            .create_inventory_item(
                &owner(),
                NewInventoryItem {
                    name: name.into(),
                    unit: unit.into(),
                    quantity: Decimal::new(quantity, 0),
                    reorder_level: Decimal::new(1000, 0),
                },
            )
            .unwrap()
    }

    /// Plants a tomato needing `requirements` and returns its tasks, earliest first.
    fn planted_tasks(engine: &Engine, requirements: Requirements) -> Vec<ScheduledTask> {
        let plot = seed_plot(engine);
        let plant = seed_plant(engine, Some(requirements));
        let created = engine
            .create_plant_instance(
                &owner(),
                NewPlanting {
                    plot_id: plot,
                    plant_id: plant,
                    planted_on: date(2025, 1, 1),
                    count: 4,
                },
            )
            .unwrap();
        engine
            .list_scheduled_tasks(TaskFilter {
                plant_instance: Some(created.instance.id),
                ..TaskFilter::default()
            })
            .unwrap()
    }

    #[test]
    fn completion_debits_logs_and_records() {
        let (_dir, engine) = test_engine(date(2025, 1, 1));
        let water = stock(&engine, "Water", "ml", 10_000);
        let tasks = planted_tasks(&engine, water_only());

        let done = engine
            .complete_task(&farmer(), tasks[0].id, Some("  morning round "))
            .unwrap();

        assert_eq!(done.task.status, TaskStatus::Done);
        let debit = done.debit.unwrap();
        assert_eq!(debit.item_id, water.id);
        assert_eq!(debit.remaining, Decimal::new(9500, 0));
        assert_eq!(done.entry.performed_by, "ravi");
        assert_eq!(done.entry.notes.as_deref(), Some("morning round"));

        let history = engine.inventory_history(water.id).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].delta, Decimal::new(-500, 0));
        assert_eq!(history[0].reason, "task completion: water");
        assert_eq!(history[0].task_id, Some(tasks[0].id));

        let record = engine.get_task(tasks[0].id).unwrap();
        assert_eq!(record.task.status, TaskStatus::Done);
        assert_eq!(record.checklist, Some(done.entry));
    }

    #[test]
    fn insufficient_stock_aborts_everything() {
        let (_dir, engine) = test_engine(date(2025, 1, 1));
        let water = stock(&engine, "Water", "ml", 300);
        let tasks = planted_tasks(&engine, water_only());

        let err = engine.complete_task(&farmer(), tasks[0].id, None).unwrap_err();

        assert!(matches!(err, Error::InsufficientStock { .. }));
        assert_eq!(engine.get_inventory_item(water.id).unwrap().quantity, Decimal::new(300, 0));
        let record = engine.get_task(tasks[0].id).unwrap();
        assert_eq!(record.task.status, TaskStatus::Pending);
        assert!(record.checklist.is_none());
        assert!(engine.inventory_history(water.id).unwrap().is_empty());
    }

    #[test]
    fn second_completion_is_invalid_state() {
        let (_dir, engine) = test_engine(date(2025, 1, 1));
        let water = stock(&engine, "Water", "ml", 10_000);
        let tasks = planted_tasks(&engine, water_only());

        engine.complete_task(&farmer(), tasks[0].id, None).unwrap();
        let err = engine.complete_task(&farmer(), tasks[0].id, None).unwrap_err();

        assert!(matches!(err, Error::InvalidState(_)));
        assert_eq!(engine.inventory_history(water.id).unwrap().len(), 1);
        assert_eq!(engine.get_inventory_item(water.id).unwrap().quantity, Decimal::new(9500, 0));
    }

    #[test]
    fn unknown_task_is_not_found() {
        let (_dir, engine) = test_engine(date(2025, 1, 1));

        let err = engine.complete_task(&farmer(), Uuid::new_v4(), None).unwrap_err();
        assert!(matches!(err, Error::NotFound { entity: Entity::ScheduledTask, .. }));
    }

    #[test]
    fn untracked_input_proceeds_by_default() {
        let (_dir, engine) = test_engine(date(2025, 1, 1));
        let tasks = planted_tasks(&engine, water_only());

        let done = engine.complete_task(&farmer(), tasks[0].id, None).unwrap();
        assert!(done.debit.is_none());
        assert_eq!(engine.get_task(tasks[0].id).unwrap().task.status, TaskStatus::Done);
    }

    #[test]
    fn untracked_input_can_be_rejected() {
        let settings = Settings {
            untracked_resources: UntrackedResources::Reject,
            ..Settings::default()
        };
        let (_dir, engine) = test_engine_with(date(2025, 1, 1), settings);
        let tasks = planted_tasks(&engine, water_only());

        let err = engine.complete_task(&farmer(), tasks[0].id, None).unwrap_err();
        assert!(matches!(err, Error::NotFound { entity: Entity::InventoryItem, .. }));
        assert_eq!(engine.get_task(tasks[0].id).unwrap().task.status, TaskStatus::Pending);
    }

    #[test]
    fn unbound_task_falls_back_to_the_only_item_in_its_unit() {
        let (_dir, engine) = test_engine(date(2025, 1, 1));
        // Planted before the item exists, so nothing is bound.
        let tasks = planted_tasks(&engine, water_only());
        assert!(tasks[0].inventory_item_id.is_none());
        let tank = stock(&engine, "Rain tank", "ml", 2000);

        let done = engine.complete_task(&farmer(), tasks[0].id, None).unwrap();
        assert_eq!(done.debit.unwrap().item_id, tank.id);
    }

    #[test]
    fn several_items_in_a_unit_narrow_by_name() {
        let (_dir, engine) = test_engine(date(2025, 1, 1));
        let tasks = planted_tasks(&engine, water_only());
        stock(&engine, "Buttermilk", "ml", 2000);
        let water = stock(&engine, "water", "ml", 2000);

        let done = engine.complete_task(&farmer(), tasks[0].id, None).unwrap();
        assert_eq!(done.debit.unwrap().item_id, water.id);
    }

    #[test]
    fn ambiguous_unit_match_is_a_conflict() {
        let (_dir, engine) = test_engine(date(2025, 1, 1));
        let tasks = planted_tasks(&engine, water_only());
        stock(&engine, "Buttermilk", "ml", 2000);
        stock(&engine, "Rain tank", "ml", 2000);

        let err = engine.complete_task(&farmer(), tasks[0].id, None).unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
        assert_eq!(engine.get_task(tasks[0].id).unwrap().task.status, TaskStatus::Pending);
    }

    #[test]
    fn skip_is_terminal_and_leaves_stock_alone() {
        let (_dir, engine) = test_engine(date(2025, 1, 1));
        let water = stock(&engine, "Water", "ml", 1000);
        let tasks = planted_tasks(&engine, water_only());

        let skipped = engine.skip_task(&farmer(), tasks[0].id, Some("rained")).unwrap();
        assert_eq!(skipped.status, TaskStatus::Skipped);
        assert!(skipped.resolved_at.is_some());

        assert!(matches!(
            engine.complete_task(&farmer(), tasks[0].id, None),
            Err(Error::InvalidState(_))
        ));
        assert!(matches!(
            engine.skip_task(&farmer(), tasks[0].id, None),
            Err(Error::InvalidState(_))
        ));
        assert_eq!(engine.get_inventory_item(water.id).unwrap().quantity, Decimal::new(1000, 0));
    }

    #[test]
    fn listings_filter_by_status_and_date() {
        let (_dir, engine) = test_engine(date(2025, 1, 1));
        let tasks = planted_tasks(&engine, water_only());
        engine.complete_task(&farmer(), tasks[0].id, None).unwrap();

        let pending = engine
            .list_scheduled_tasks(TaskFilter {
                status: Some(TaskStatus::Pending),
                ..TaskFilter::default()
            })
            .unwrap();
        assert_eq!(pending.len(), 29);

        let due = engine.list_tasks_due_on(date(2025, 1, 1)).unwrap();
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].status, TaskStatus::Done);
        assert!(engine.list_tasks_due_on(date(2025, 3, 1)).unwrap().is_empty());

        assert!(matches!(
            engine.list_scheduled_tasks(TaskFilter {
                plot: Some(Uuid::new_v4()),
                ..TaskFilter::default()
            }),
            Err(Error::NotFound { entity: Entity::Plot, .. })
        ));
    }

    #[test]
    fn stats_count_due_work_and_low_stock() {
        let (_dir, engine) = test_engine(date(2025, 1, 3));
        stock(&engine, "Water", "ml", 800);
        let tasks = planted_tasks(&engine, water_only());
        engine.complete_task(&farmer(), tasks[0].id, None).unwrap();

        let stats = engine.stats().unwrap();
        assert_eq!(stats.farms, 1);
        assert_eq!(stats.plots, 1);
        assert_eq!(stats.active_plantings, 1);
        assert_eq!(stats.low_stock_items, 1);
        // Jan 2 is overdue, only Jan 3 counts.
        assert_eq!(stats.pending_tasks_due, 1);
    }

    #[test]
    fn stats_due_count_matches_todays_list() {
        let (_dir, engine) = test_engine(date(2025, 1, 10));
        planted_tasks(&engine, water_only());

        let due_today = engine.list_tasks_due_on(date(2025, 1, 10)).unwrap();
        assert_eq!(due_today.len(), 1);
        assert_eq!(engine.stats().unwrap().pending_tasks_due, 1);
    }

    #[test]
    fn racing_completions_of_one_task_succeed_once() {
        let (_dir, engine) = test_engine(date(2025, 1, 1));
        let water = stock(&engine, "Water", "ml", 10_000);
        let tasks = planted_tasks(&engine, water_only());
        let barrier = Barrier::new(2);

        let results: Vec<_> = thread::scope(|s| {
            let handles: Vec<_> = (0..2)
                .map(|_| {
                    let (barrier, engine, task) = (&barrier, &engine, &tasks[0]);
                    s.spawn(move || {
                        barrier.wait();
                        engine.complete_task(&farmer(), task.id, None)
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(results.iter().any(|r| matches!(r, Err(Error::InvalidState(_)))));
        assert_eq!(engine.inventory_history(water.id).unwrap().len(), 1);
    }

    #[test]
    fn racing_completions_on_one_item_never_overdraw() {
        let (_dir, engine) = test_engine(date(2025, 1, 1));
        let water = stock(&engine, "Water", "ml", 700);
        let tasks = planted_tasks(&engine, water_only());
        let barrier = Barrier::new(2);

        let results: Vec<_> = thread::scope(|s| {
            let handles: Vec<_> = tasks[..2]
                .iter()
                .map(|task| {
                    let barrier = &barrier;
                    let engine = &engine;
                    s.spawn(move || {
                        barrier.wait();
                        engine.complete_task(&farmer(), task.id, None)
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(results
            .iter()
            .any(|r| matches!(r, Err(Error::InsufficientStock { .. }))));
        assert_eq!(engine.get_inventory_item(water.id).unwrap().quantity, Decimal::new(200, 0));
    }
}
