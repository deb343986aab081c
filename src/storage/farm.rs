//! Farm layout storage: farms and their plots.

use rusqlite::{Connection, OptionalExtension, Row, params};
use uuid::Uuid;

use crate::model::{Farm, Plot};

use super::{Entity, Result, StorageError, parse_decimal, parse_timestamp, parse_uuid};

pub(crate) fn insert_farm(conn: &Connection, farm: &Farm) -> Result<()> {
    conn.execute(
        "INSERT INTO farms (id, name, owner, location, description, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            farm.id.to_string(),
            &farm.name,
            &farm.owner,
            &farm.location,
            &farm.description,
            farm.created_at.to_string(),
        ],
    )?;
    Ok(())
}

pub(crate) fn load_farm(conn: &Connection, id: Uuid) -> Result<Farm> {
    let row = conn
        .query_row(
            "SELECT id, name, owner, location, description, created_at
             FROM farms WHERE id = ?1",
            [id.to_string()],
            farm_columns,
        )
        .optional()?
        .ok_or(StorageError::NotFound(Entity::Farm, id))?;
    farm_from_columns(row)
}

pub(crate) fn list_farms(conn: &Connection) -> Result<Vec<Farm>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, owner, location, description, created_at
         FROM farms ORDER BY created_at, rowid",
    )?;
    let rows = stmt
        .query_map([], farm_columns)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    rows.into_iter().map(farm_from_columns).collect()
}

type FarmColumns = (String, String, String, Option<String>, Option<String>, String);

fn farm_columns(row: &Row<'_>) -> rusqlite::Result<FarmColumns> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
    ))
}

fn farm_from_columns(
    (id, name, owner, location, description, created_at): FarmColumns,
) -> Result<Farm> {
    Ok(Farm {
        id: parse_uuid(&id)?,
        name,
        owner,
        location,
        description,
        created_at: parse_timestamp(&created_at)?,
    })
}

pub(crate) fn insert_plot(conn: &Connection, plot: &Plot) -> Result<()> {
    conn.execute(
        "INSERT INTO plots (id, farm_id, name, area_sqm, soil_type, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            plot.id.to_string(),
            plot.farm_id.to_string(),
            &plot.name,
            plot.area_sqm.map(|a| a.to_string()),
            &plot.soil_type,
            plot.created_at.to_string(),
        ],
    )?;
    Ok(())
}

pub(crate) fn load_plot(conn: &Connection, id: Uuid) -> Result<Plot> {
    let row = conn
        .query_row(
            "SELECT id, farm_id, name, area_sqm, soil_type, created_at
             FROM plots WHERE id = ?1",
            [id.to_string()],
            plot_columns,
        )
        .optional()?
        .ok_or(StorageError::NotFound(Entity::Plot, id))?;
    plot_from_columns(row)
}

/// Lists plots, optionally only those on one farm.
pub(crate) fn list_plots(conn: &Connection, farm: Option<Uuid>) -> Result<Vec<Plot>> {
    let mut stmt = conn.prepare(
        "SELECT id, farm_id, name, area_sqm, soil_type, created_at
         FROM plots
         WHERE ?1 IS NULL OR farm_id = ?1
         ORDER BY created_at, rowid",
    )?;
    let rows = stmt
        .query_map([farm.map(|id| id.to_string())], plot_columns)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    rows.into_iter().map(plot_from_columns).collect()
}

type PlotColumns = (String, String, String, Option<String>, Option<String>, String);

fn plot_columns(row: &Row<'_>) -> rusqlite::Result<PlotColumns> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
    ))
}

fn plot_from_columns(
    (id, farm_id, name, area, soil_type, created_at): PlotColumns,
) -> Result<Plot> {
    Ok(Plot {
        id: parse_uuid(&id)?,
        farm_id: parse_uuid(&farm_id)?,
        name,
        area_sqm: area.as_deref().map(parse_decimal).transpose()?,
        soil_type,
        created_at: parse_timestamp(&created_at)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use jiff::Timestamp;
    use rust_decimal::Decimal;

    use crate::storage::testing::test_storage;

    fn farm(name: &str) -> Farm {
        Farm {
            id: Uuid::new_v4(),
            name: name.into(),
            owner: "asha".into(),
            location: Some("Mysuru".into()),
            description: None,
            created_at: Timestamp::UNIX_EPOCH,
        }
    }

    fn plot(farm_id: Uuid, name: &str) -> Plot {
        Plot {
            id: Uuid::new_v4(),
            farm_id,
            name: name.into(),
            area_sqm: Some(Decimal::new(1255, 1)),
            soil_type: Some("red loam".into()),
            created_at: Timestamp::UNIX_EPOCH,
        }
    }

    #[test]
    fn farm_round_trips() {
        let (_dir, storage) = test_storage();
        let conn = storage.connect().unwrap();
        let north = farm("North");

        insert_farm(&conn, &north).unwrap();
        assert_eq!(load_farm(&conn, north.id).unwrap(), north);
        assert_eq!(list_farms(&conn).unwrap(), vec![north]);
    }

    #[test]
    fn plots_filter_by_farm() {
        let (_dir, storage) = test_storage();
        let conn = storage.connect().unwrap();
        let north = farm("North");
        let south = farm("South");
        insert_farm(&conn, &north).unwrap();
        insert_farm(&conn, &south).unwrap();

        let a = plot(north.id, "A");
        let b = plot(south.id, "B");
        insert_plot(&conn, &a).unwrap();
        insert_plot(&conn, &b).unwrap();

        assert_eq!(list_plots(&conn, None).unwrap().len(), 2);
        assert_eq!(list_plots(&conn, Some(north.id)).unwrap(), vec![a.clone()]);
        assert_eq!(load_plot(&conn, a.id).unwrap().area_sqm, Some(Decimal::new(1255, 1)));
    }

    #[test]
    fn plot_on_missing_farm_is_rejected() {
        let (_dir, storage) = test_storage();
        let conn = storage.connect().unwrap();

        let err = insert_plot(&conn, &plot(Uuid::new_v4(), "Orphan")).unwrap_err();
        assert!(err.is_constraint_violation());
    }

    #[test]
    fn missing_plot_is_not_found() {
        let (_dir, storage) = test_storage();
        let conn = storage.connect().unwrap();

        let err = load_plot(&conn, Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, StorageError::NotFound(Entity::Plot, _)));
    }
}
