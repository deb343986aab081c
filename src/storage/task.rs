//! Task storage: scheduled tasks and the checklist.

use jiff::{Timestamp, civil::Date};
use rusqlite::{Connection, OptionalExtension, Row, params};
use uuid::Uuid;

use crate::model::{ChecklistEntry, ResourceDemand, ScheduledTask, TaskStatus};

use super::{
    Entity, Result, StorageError, parse_date, parse_decimal, parse_enum, parse_opt_uuid,
    parse_timestamp, parse_uuid,
};

const COLUMNS: &str = "t.id, t.plant_instance_id, t.task_type, t.resource, t.scheduled_for,
     t.status, t.quantity_required, t.unit, t.inventory_item_id, t.resolved_at";

/// Inserts a batch of tasks. Callers wrap this in a transaction when the
/// batch must land all-or-nothing.
pub(crate) fn insert_tasks(conn: &Connection, tasks: &[ScheduledTask]) -> Result<()> {
    let mut stmt = conn.prepare(
        "INSERT INTO scheduled_tasks
             (id, plant_instance_id, task_type, resource, scheduled_for, status,
              quantity_required, unit, inventory_item_id, resolved_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
    )?;
    for task in tasks {
        let demand = task.demand.as_ref();
        stmt.execute(params![
            task.id.to_string(),
            task.plant_instance_id.to_string(),
            task.task_type.as_str(),
            &task.resource,
            task.scheduled_for.to_string(),
            task.status.as_str(),
            demand.map(|d| d.quantity.to_string()),
            demand.map(|d| d.unit.as_str()),
            task.inventory_item_id.map(|id| id.to_string()),
            task.resolved_at.map(|at| at.to_string()),
        ])?;
    }
    Ok(())
}

pub(crate) fn load_task(conn: &Connection, id: Uuid) -> Result<ScheduledTask> {
    let row = conn
        .query_row(
            &format!("SELECT {COLUMNS} FROM scheduled_tasks t WHERE t.id = ?1"),
            [id.to_string()],
            task_columns,
        )
        .optional()?
        .ok_or(StorageError::NotFound(Entity::ScheduledTask, id))?;
    task_from_columns(row)
}

/// Lists tasks ordered by date, optionally narrowed to one plot, one
/// planting, or one status.
pub(crate) fn list_tasks(
    conn: &Connection,
    plot: Option<Uuid>,
    instance: Option<Uuid>,
    status: Option<TaskStatus>,
) -> Result<Vec<ScheduledTask>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {COLUMNS}
         FROM scheduled_tasks t
         JOIN plant_instances p ON p.id = t.plant_instance_id
         WHERE (?1 IS NULL OR p.plot_id = ?1)
           AND (?2 IS NULL OR t.plant_instance_id = ?2)
           AND (?3 IS NULL OR t.status = ?3)
         ORDER BY t.scheduled_for, t.rowid"
    ))?;
    let rows = stmt
        .query_map(
            params![
                plot.map(|id| id.to_string()),
                instance.map(|id| id.to_string()),
                status.map(TaskStatus::as_str),
            ],
            task_columns,
        )?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    rows.into_iter().map(task_from_columns).collect()
}

/// Lists every task scheduled on `date`, whatever its status.
pub(crate) fn tasks_due_on(conn: &Connection, date: Date) -> Result<Vec<ScheduledTask>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {COLUMNS} FROM scheduled_tasks t
         WHERE t.scheduled_for = ?1
         ORDER BY t.rowid"
    ))?;
    let rows = stmt
        .query_map([date.to_string()], task_columns)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    rows.into_iter().map(task_from_columns).collect()
}

/// Moves a pending task to `status`. Returns false if it was no longer
/// pending, which leaves the row untouched.
pub(crate) fn resolve_task(
    conn: &Connection,
    id: Uuid,
    status: TaskStatus,
    at: Timestamp,
) -> Result<bool> {
    let n = conn.execute(
        "UPDATE scheduled_tasks SET status = ?2, resolved_at = ?3
         WHERE id = ?1 AND status = 'pending'",
        params![id.to_string(), status.as_str(), at.to_string()],
    )?;
    Ok(n == 1)
}

pub(crate) fn count_pending_due(conn: &Connection, on: Date) -> Result<u64> {
    let n: i64 = conn.query_row(
        "SELECT COUNT(*) FROM scheduled_tasks WHERE status = 'pending' AND scheduled_for = ?1",
        [on.to_string()],
        |row| row.get(0),
    )?;
    Ok(u64::try_from(n).unwrap_or(0))
}

struct TaskColumns {
    id: String,
    instance: String,
    task_type: String,
    resource: String,
    scheduled_for: String,
    status: String,
    quantity: Option<String>,
    unit: Option<String>,
    item: Option<String>,
    resolved_at: Option<String>,
}

fn task_columns(row: &Row<'_>) -> rusqlite::Result<TaskColumns> {
    Ok(TaskColumns {
        id: row.get(0)?,
        instance: row.get(1)?,
        task_type: row.get(2)?,
        resource: row.get(3)?,
        scheduled_for: row.get(4)?,
        status: row.get(5)?,
        quantity: row.get(6)?,
        unit: row.get(7)?,
        item: row.get(8)?,
        resolved_at: row.get(9)?,
    })
}

fn task_from_columns(cols: TaskColumns) -> Result<ScheduledTask> {
    let demand = match (cols.quantity, cols.unit) {
        (Some(quantity), Some(unit)) => Some(ResourceDemand {
            quantity: parse_decimal(&quantity)?,
            unit,
        }),
        (None, None) => None,
        _ => {
            return Err(StorageError::Corrupt(format!(
                "task {} has a quantity without a unit",
                cols.id
            )));
        }
    };

    Ok(ScheduledTask {
        id: parse_uuid(&cols.id)?,
        plant_instance_id: parse_uuid(&cols.instance)?,
        task_type: parse_enum(&cols.task_type)?,
        resource: cols.resource,
        scheduled_for: parse_date(&cols.scheduled_for)?,
        status: parse_enum(&cols.status)?,
        demand,
        inventory_item_id: parse_opt_uuid(cols.item.as_deref())?,
        resolved_at: cols.resolved_at.as_deref().map(parse_timestamp).transpose()?,
    })
}

// ── Checklist ──

pub(crate) fn insert_checklist_entry(conn: &Connection, entry: &ChecklistEntry) -> Result<()> {
    conn.execute(
        "INSERT INTO checklist_entries (id, task_id, performed_by, notes, performed_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            entry.id.to_string(),
            entry.task_id.to_string(),
            &entry.performed_by,
            &entry.notes,
            entry.performed_at.to_string(),
        ],
    )?;
    Ok(())
}

pub(crate) fn checklist_entry_for(conn: &Connection, task_id: Uuid) -> Result<Option<ChecklistEntry>> {
    let row = conn
        .query_row(
            "SELECT id, performed_by, notes, performed_at FROM checklist_entries WHERE task_id = ?1",
            [task_id.to_string()],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Option<String>>(2)?,
                    row.get::<_, String>(3)?,
                ))
            },
        )
        .optional()?;

    row.map(|(id, performed_by, notes, performed_at)| -> Result<ChecklistEntry> {
        Ok(ChecklistEntry {
            id: parse_uuid(&id)?,
            task_id,
            performed_by,
            notes,
            performed_at: parse_timestamp(&performed_at)?,
        })
    })
    .transpose()
}
