//! Catalog storage: growth cycles, requirement profiles, and plants.

use rusqlite::{Connection, OptionalExtension, Row, params};
use uuid::Uuid;

use crate::model::{GrowthCycle, Plant, RequirementProfile, Requirements};

use super::{Entity, Result, StorageError, parse_opt_uuid, parse_uuid, to_u32};

// ── Growth cycles ──

pub(crate) fn insert_growth_cycle(conn: &Connection, cycle: &GrowthCycle) -> Result<()> {
    conn.execute(
        "INSERT INTO growth_cycles
             (id, germination_days, vegetative_days, flowering_days, fruiting_days, total_growth_days)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            cycle.id.to_string(),
            cycle.germination_days,
            cycle.vegetative_days,
            cycle.flowering_days,
            cycle.fruiting_days,
            cycle.total_growth_days,
        ],
    )?;
    Ok(())
}

pub(crate) fn load_growth_cycle(conn: &Connection, id: Uuid) -> Result<GrowthCycle> {
    let row = conn
        .query_row(
            "SELECT id, germination_days, vegetative_days, flowering_days, fruiting_days,
                    total_growth_days
             FROM growth_cycles WHERE id = ?1",
            [id.to_string()],
            growth_cycle_columns,
        )
        .optional()?
        .ok_or(StorageError::NotFound(Entity::GrowthCycle, id))?;
    growth_cycle_from_columns(row)
}

pub(crate) fn list_growth_cycles(conn: &Connection) -> Result<Vec<GrowthCycle>> {
    let mut stmt = conn.prepare(
        "SELECT id, germination_days, vegetative_days, flowering_days, fruiting_days,
                total_growth_days
         FROM growth_cycles ORDER BY rowid",
    )?;
    let rows = stmt
        .query_map([], growth_cycle_columns)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    rows.into_iter().map(growth_cycle_from_columns).collect()
}

type GrowthCycleColumns = (String, i64, i64, i64, i64, i64);

fn growth_cycle_columns(row: &Row<'_>) -> rusqlite::Result<GrowthCycleColumns> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
    ))
}

fn growth_cycle_from_columns(
    (id, germination, vegetative, flowering, fruiting, total): GrowthCycleColumns,
) -> Result<GrowthCycle> {
    Ok(GrowthCycle {
        id: parse_uuid(&id)?,
        germination_days: to_u32(germination, "germination_days")?,
        vegetative_days: to_u32(vegetative, "vegetative_days")?,
        flowering_days: to_u32(flowering, "flowering_days")?,
        fruiting_days: to_u32(fruiting, "fruiting_days")?,
        total_growth_days: to_u32(total, "total_growth_days")?,
    })
}

// ── Requirement profiles ──

pub(crate) fn insert_profile(conn: &Connection, profile: &RequirementProfile) -> Result<()> {
    let json = serde_json::to_string(&profile.requirements)?;
    conn.execute(
        "INSERT INTO requirement_profiles (id, requirements) VALUES (?1, ?2)",
        params![profile.id.to_string(), json],
    )?;
    Ok(())
}

pub(crate) fn load_profile(conn: &Connection, id: Uuid) -> Result<RequirementProfile> {
    let json: String = conn
        .query_row(
            "SELECT requirements FROM requirement_profiles WHERE id = ?1",
            [id.to_string()],
            |row| row.get(0),
        )
        .optional()?
        .ok_or(StorageError::NotFound(Entity::RequirementProfile, id))?;
    Ok(RequirementProfile {
        id,
        requirements: serde_json::from_str::<Requirements>(&json)?,
    })
}

pub(crate) fn list_profiles(conn: &Connection) -> Result<Vec<RequirementProfile>> {
    let mut stmt =
        conn.prepare("SELECT id, requirements FROM requirement_profiles ORDER BY rowid")?;
    let rows = stmt
        .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    rows.into_iter()
        .map(|(id, json)| -> Result<RequirementProfile> {
            Ok(RequirementProfile {
                id: parse_uuid(&id)?,
                requirements: serde_json::from_str(&json)?,
            })
        })
        .collect()
}

// ── Plants ──

pub(crate) fn insert_plant(conn: &Connection, plant: &Plant) -> Result<()> {
    conn.execute(
        "INSERT INTO plants
             (id, name, scientific_name, growth_cycle_id, requirement_profile_id, notes)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            plant.id.to_string(),
            &plant.name,
            &plant.scientific_name,
            plant.growth_cycle_id.map(|id| id.to_string()),
            plant.requirement_profile_id.map(|id| id.to_string()),
            &plant.notes,
        ],
    )?;
    Ok(())
}

pub(crate) fn load_plant(conn: &Connection, id: Uuid) -> Result<Plant> {
    let row = conn
        .query_row(
            "SELECT id, name, scientific_name, growth_cycle_id, requirement_profile_id, notes
             FROM plants WHERE id = ?1",
            [id.to_string()],
            plant_columns,
        )
        .optional()?
        .ok_or(StorageError::NotFound(Entity::Plant, id))?;
    plant_from_columns(row)
}

pub(crate) fn list_plants(conn: &Connection) -> Result<Vec<Plant>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, scientific_name, growth_cycle_id, requirement_profile_id, notes
         FROM plants ORDER BY name, rowid",
    )?;
    let rows = stmt
        .query_map([], plant_columns)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    rows.into_iter().map(plant_from_columns).collect()
}

type PlantColumns = (
    String,
    String,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<String>,
);

fn plant_columns(row: &Row<'_>) -> rusqlite::Result<PlantColumns> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
    ))
}

fn plant_from_columns(
    (id, name, scientific_name, cycle, profile, notes): PlantColumns,
) -> Result<Plant> {
    Ok(Plant {
        id: parse_uuid(&id)?,
        name,
        scientific_name,
        growth_cycle_id: parse_opt_uuid(cycle.as_deref())?,
        requirement_profile_id: parse_opt_uuid(profile.as_deref())?,
        notes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use rust_decimal::Decimal;

    use crate::storage::testing::test_storage;

    fn sample_cycle() -> GrowthCycle {
        GrowthCycle {
            id: Uuid::new_v4(),
            germination_days: 7,
            vegetative_days: 21,
            flowering_days: 14,
            fruiting_days: 28,
            total_growth_days: 70,
        }
    }

    #[test]
    fn growth_cycle_round_trips() {
        let (_dir, storage) = test_storage();
        let conn = storage.connect().unwrap();
        let cycle = sample_cycle();

        insert_growth_cycle(&conn, &cycle).unwrap();
        assert_eq!(load_growth_cycle(&conn, cycle.id).unwrap(), cycle);
        assert_eq!(list_growth_cycles(&conn).unwrap(), vec![cycle]);
    }

    #[test]
    fn missing_growth_cycle_is_not_found() {
        let (_dir, storage) = test_storage();
        let conn = storage.connect().unwrap();

        let err = load_growth_cycle(&conn, Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, StorageError::NotFound(Entity::GrowthCycle, _)));
    }

    #[test]
    fn profile_keeps_sparse_fields() {
        let (_dir, storage) = test_storage();
        let conn = storage.connect().unwrap();
        let profile = RequirementProfile {
            id: Uuid::new_v4(),
            requirements: Requirements {
                water_min_ml: Some(Decimal::new(500, 0)),
                cowpat_kg_monthly: Some(Decimal::new(25, 1)),
                ..Requirements::default()
            },
        };

        insert_profile(&conn, &profile).unwrap();
        let loaded = load_profile(&conn, profile.id).unwrap();
        assert_eq!(loaded, profile);
        assert!(loaded.requirements.water_max_ml.is_none());
    }

    #[test]
    fn plant_with_dangling_cycle_is_rejected() {
        let (_dir, storage) = test_storage();
        let conn = storage.connect().unwrap();
        let plant = Plant {
            id: Uuid::new_v4(),
            name: "Tomato".into(),
            scientific_name: None,
            growth_cycle_id: Some(Uuid::new_v4()),
            requirement_profile_id: None,
            notes: None,
        };

        let err = insert_plant(&conn, &plant).unwrap_err();
        assert!(err.is_constraint_violation());
    }

    #[test]
    fn plants_list_by_name() {
        let (_dir, storage) = test_storage();
        let conn = storage.connect().unwrap();
        for name in ["Okra", "Brinjal"] {
            let plant = Plant {
                id: Uuid::new_v4(),
                name: name.into(),
                scientific_name: None,
                growth_cycle_id: None,
                requirement_profile_id: None,
                notes: None,
            };
            insert_plant(&conn, &plant).unwrap();
        }

        let names: Vec<_> = list_plants(&conn).unwrap().into_iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["Brinjal", "Okra"]);
    }
}
