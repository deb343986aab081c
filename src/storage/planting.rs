//! Planting storage: plant instances and their cached growth state.

use rusqlite::{Connection, OptionalExtension, Row, params};
use uuid::Uuid;

use crate::model::{GrowthState, InstanceStatus, PlantInstance};

use super::{
    Entity, Result, StorageError, parse_date, parse_enum, parse_timestamp, parse_uuid, to_u32,
};

const COLUMNS: &str = "id, plot_id, plant_id, planted_on, count, status, growth_stage,
     days_since_planting, expected_harvest, created_by, created_at";

pub(crate) fn insert_instance(conn: &Connection, instance: &PlantInstance) -> Result<()> {
    let growth = instance.growth.as_ref();
    conn.execute(
        "INSERT INTO plant_instances
             (id, plot_id, plant_id, planted_on, count, status, growth_stage,
              days_since_planting, expected_harvest, created_by, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            instance.id.to_string(),
            instance.plot_id.to_string(),
            instance.plant_id.to_string(),
            instance.planted_on.to_string(),
            instance.count,
            instance.status.as_str(),
            growth.map(|g| g.stage.as_str()),
            growth.map(|g| g.days_since_planting),
            growth.map(|g| g.expected_harvest.to_string()),
            &instance.created_by,
            instance.created_at.to_string(),
        ],
    )?;
    Ok(())
}

pub(crate) fn load_instance(conn: &Connection, id: Uuid) -> Result<PlantInstance> {
    let row = conn
        .query_row(
            &format!("SELECT {COLUMNS} FROM plant_instances WHERE id = ?1"),
            [id.to_string()],
            instance_columns,
        )
        .optional()?
        .ok_or(StorageError::NotFound(Entity::PlantInstance, id))?;
    instance_from_columns(row)
}

/// Lists plantings, optionally only those on one plot.
pub(crate) fn list_instances(conn: &Connection, plot: Option<Uuid>) -> Result<Vec<PlantInstance>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {COLUMNS} FROM plant_instances
         WHERE ?1 IS NULL OR plot_id = ?1
         ORDER BY planted_on, created_at, rowid"
    ))?;
    let rows = stmt
        .query_map([plot.map(|id| id.to_string())], instance_columns)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    rows.into_iter().map(instance_from_columns).collect()
}

/// Overwrites the cached growth state columns.
pub(crate) fn update_growth_cache(
    conn: &Connection,
    id: Uuid,
    growth: Option<&GrowthState>,
) -> Result<()> {
    let n = conn.execute(
        "UPDATE plant_instances
         SET growth_stage = ?2, days_since_planting = ?3, expected_harvest = ?4
         WHERE id = ?1",
        params![
            id.to_string(),
            growth.map(|g| g.stage.as_str()),
            growth.map(|g| g.days_since_planting),
            growth.map(|g| g.expected_harvest.to_string()),
        ],
    )?;
    if n == 0 {
        return Err(StorageError::NotFound(Entity::PlantInstance, id));
    }
    Ok(())
}

/// Moves an active planting to `status`. Returns false if it was not active.
pub(crate) fn close_instance(conn: &Connection, id: Uuid, status: InstanceStatus) -> Result<bool> {
    let n = conn.execute(
        "UPDATE plant_instances SET status = ?2 WHERE id = ?1 AND status = 'active'",
        params![id.to_string(), status.as_str()],
    )?;
    Ok(n == 1)
}

pub(crate) fn count_active(conn: &Connection) -> Result<u64> {
    let n: i64 = conn.query_row(
        "SELECT COUNT(*) FROM plant_instances WHERE status = 'active'",
        [],
        |row| row.get(0),
    )?;
    Ok(u64::try_from(n).unwrap_or(0))
}

struct InstanceColumns {
    id: String,
    plot_id: String,
    plant_id: String,
    planted_on: String,
    count: i64,
    status: String,
    stage: Option<String>,
    days: Option<i64>,
    harvest: Option<String>,
    created_by: String,
    created_at: String,
}

fn instance_columns(row: &Row<'_>) -> rusqlite::Result<InstanceColumns> {
    Ok(InstanceColumns {
        id: row.get(0)?,
        plot_id: row.get(1)?,
        plant_id: row.get(2)?,
        planted_on: row.get(3)?,
        count: row.get(4)?,
        status: row.get(5)?,
        stage: row.get(6)?,
        days: row.get(7)?,
        harvest: row.get(8)?,
        created_by: row.get(9)?,
        created_at: row.get(10)?,
    })
}

fn instance_from_columns(cols: InstanceColumns) -> Result<PlantInstance> {
    let growth = match (cols.stage, cols.days, cols.harvest) {
        (Some(stage), Some(days), Some(harvest)) => Some(GrowthState {
            stage: parse_enum(&stage)?,
            days_since_planting: to_u32(days, "days_since_planting")?,
            expected_harvest: parse_date(&harvest)?,
        }),
        (None, None, None) => None,
        _ => {
            return Err(StorageError::Corrupt(format!(
                "plant instance {} has a partial growth state",
                cols.id
            )));
        }
    };

    Ok(PlantInstance {
        id: parse_uuid(&cols.id)?,
        plot_id: parse_uuid(&cols.plot_id)?,
        plant_id: parse_uuid(&cols.plant_id)?,
        planted_on: parse_date(&cols.planted_on)?,
        count: to_u32(cols.count, "count")?,
        status: parse_enum(&cols.status)?,
        growth,
        created_by: cols.created_by,
        created_at: parse_timestamp(&cols.created_at)?,
    })
}

#[cfg(test)]
pub(crate) mod fixtures {
    use jiff::{Timestamp, civil::Date};
    use rusqlite::Connection;
    use uuid::Uuid;

    use crate::model::{Farm, InstanceStatus, Plant, PlantInstance, Plot};
    use crate::storage::{catalog, farm};

    /// Inserts a farm, a plot, and a bare plant; returns `(plot_id, plant_id)`.
    pub(crate) fn plot_and_plant(conn: &Connection) -> (Uuid, Uuid) {
        let farm = Farm {
            id: Uuid::new_v4(),
            name: "North".into(),
            owner: "asha".into(),
            location: None,
            description: None,
            created_at: Timestamp::UNIX_EPOCH,
        };
        farm::insert_farm(conn, &farm).unwrap();
        let plot = Plot {
            id: Uuid::new_v4(),
            farm_id: farm.id,
            name: "Bed 1".into(),
            area_sqm: None,
            soil_type: None,
            created_at: Timestamp::UNIX_EPOCH,
        };
        farm::insert_plot(conn, &plot).unwrap();
        let plant = Plant {
            id: Uuid::new_v4(),
            name: "Tomato".into(),
            scientific_name: None,
            growth_cycle_id: None,
            requirement_profile_id: None,
            notes: None,
        };
        catalog::insert_plant(conn, &plant).unwrap();
        (plot.id, plant.id)
    }

    pub(crate) fn instance(plot_id: Uuid, plant_id: Uuid, planted_on: Date) -> PlantInstance {
        PlantInstance {
            id: Uuid::new_v4(),
            plot_id,
            plant_id,
            planted_on,
            count: 3,
            status: InstanceStatus::Active,
            growth: None,
            created_by: "ravi".into(),
            created_at: Timestamp::UNIX_EPOCH,
        }
    }
}
