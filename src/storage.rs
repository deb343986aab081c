//! SQLite persistence for the farm engine.
//!
//! Everything lives in one database file:
//!
//! ```text
//! ~/.furrow/furrow.sqlite
//!   farms, plots                       # Layout
//!   growth_cycles, requirement_profiles, plants
//!   plant_instances                    # Plantings + cached growth state
//!   scheduled_tasks, checklist_entries # Care schedule and who did what
//!   inventory_items                    # Current stock
//!   inventory_transactions             # Append-only stock audit trail
//! ```
//!
//! Each call opens its own connection, so a `Storage` can be shared across
//! threads. Row-level functions in the submodules take a `&Connection` and
//! work the same inside or outside a [`Storage::unit_of_work`].

pub(crate) mod catalog;
pub(crate) mod farm;
pub(crate) mod inventory;
pub(crate) mod planting;
pub(crate) mod task;

use std::{fmt, fs, io, path::PathBuf, str::FromStr, time::Duration};

use jiff::{Timestamp, civil::Date};
use rusqlite::{Connection, Transaction, TransactionBehavior};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::model::ParseEnumError;

/// Kinds of stored record, for error reporting and id lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Farm,
    Plot,
    GrowthCycle,
    RequirementProfile,
    Plant,
    PlantInstance,
    ScheduledTask,
    InventoryItem,
}

impl Entity {
    fn table(self) -> &'static str {
        match self {
            Self::Farm => "farms",
            Self::Plot => "plots",
            Self::GrowthCycle => "growth_cycles",
            Self::RequirementProfile => "requirement_profiles",
            Self::Plant => "plants",
            Self::PlantInstance => "plant_instances",
            Self::ScheduledTask => "scheduled_tasks",
            Self::InventoryItem => "inventory_items",
        }
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Farm => "farm",
            Self::Plot => "plot",
            Self::GrowthCycle => "growth cycle",
            Self::RequirementProfile => "requirement profile",
            Self::Plant => "plant",
            Self::PlantInstance => "plant instance",
            Self::ScheduledTask => "scheduled task",
            Self::InventoryItem => "inventory item",
        })
    }
}

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("{0} not found: {1}")]
    NotFound(Entity, Uuid),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("corrupt record: {0}")]
    Corrupt(String),
}

impl StorageError {
    /// Whether this is a uniqueness or other constraint violation.
    pub fn is_constraint_violation(&self) -> bool {
        matches!(
            self,
            Self::Sqlite(e) if e.sqlite_error_code() == Some(rusqlite::ErrorCode::ConstraintViolation)
        )
    }
}

pub type Result<T> = core::result::Result<T, StorageError>;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS farms (
    id          TEXT PRIMARY KEY,
    name        TEXT NOT NULL,
    owner       TEXT NOT NULL,
    location    TEXT,
    description TEXT,
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS plots (
    id         TEXT PRIMARY KEY,
    farm_id    TEXT NOT NULL REFERENCES farms (id),
    name       TEXT NOT NULL,
    area_sqm   TEXT,
    soil_type  TEXT,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS growth_cycles (
    id                TEXT PRIMARY KEY,
    germination_days  INTEGER NOT NULL,
    vegetative_days   INTEGER NOT NULL,
    flowering_days    INTEGER NOT NULL,
    fruiting_days     INTEGER NOT NULL,
    total_growth_days INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS requirement_profiles (
    id           TEXT PRIMARY KEY,
    requirements TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS plants (
    id                     TEXT PRIMARY KEY,
    name                   TEXT NOT NULL,
    scientific_name        TEXT,
    growth_cycle_id        TEXT REFERENCES growth_cycles (id),
    requirement_profile_id TEXT REFERENCES requirement_profiles (id),
    notes                  TEXT
);

CREATE TABLE IF NOT EXISTS plant_instances (
    id                  TEXT PRIMARY KEY,
    plot_id             TEXT NOT NULL REFERENCES plots (id),
    plant_id            TEXT NOT NULL REFERENCES plants (id),
    planted_on          TEXT NOT NULL,
    count               INTEGER NOT NULL CHECK (count >= 1),
    status              TEXT NOT NULL,
    growth_stage        TEXT,
    days_since_planting INTEGER,
    expected_harvest    TEXT,
    created_by          TEXT NOT NULL,
    created_at          TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS inventory_items (
    id            TEXT PRIMARY KEY,
    name          TEXT NOT NULL,
    unit          TEXT NOT NULL,
    quantity      TEXT NOT NULL,
    reorder_level TEXT NOT NULL,
    UNIQUE (name, unit)
);

CREATE TABLE IF NOT EXISTS scheduled_tasks (
    id                TEXT PRIMARY KEY,
    plant_instance_id TEXT NOT NULL REFERENCES plant_instances (id),
    task_type         TEXT NOT NULL,
    resource          TEXT NOT NULL,
    scheduled_for     TEXT NOT NULL,
    status            TEXT NOT NULL,
    quantity_required TEXT,
    unit              TEXT,
    inventory_item_id TEXT REFERENCES inventory_items (id),
    resolved_at       TEXT
);

CREATE INDEX IF NOT EXISTS scheduled_tasks_by_date ON scheduled_tasks (scheduled_for);
CREATE INDEX IF NOT EXISTS scheduled_tasks_by_instance ON scheduled_tasks (plant_instance_id);

CREATE TABLE IF NOT EXISTS checklist_entries (
    id           TEXT PRIMARY KEY,
    task_id      TEXT NOT NULL UNIQUE REFERENCES scheduled_tasks (id),
    performed_by TEXT NOT NULL,
    notes        TEXT,
    performed_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS inventory_transactions (
    id          TEXT PRIMARY KEY,
    item_id     TEXT NOT NULL REFERENCES inventory_items (id),
    task_id     TEXT REFERENCES scheduled_tasks (id),
    delta       TEXT NOT NULL,
    reason      TEXT NOT NULL,
    recorded_by TEXT NOT NULL,
    recorded_at TEXT NOT NULL
);
";

/// Default time a connection waits on a locked database before failing.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// SQLite-backed storage for farms, plantings, schedules, and inventory.
#[derive(Debug, Clone)]
pub struct Storage {
    path: PathBuf,
    busy_timeout: Duration,
}

impl Storage {
    /// Opens (and if needed creates) the database at `path`.
    ///
    /// Parent directories are created if they don't exist.
    pub fn open(path: impl Into<PathBuf>, busy_timeout: Duration) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let storage = Self { path, busy_timeout };
        storage.connect()?.execute_batch(SCHEMA)?;
        Ok(storage)
    }

    /// Returns the default database path: `~/.furrow/furrow.sqlite`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".furrow").join("furrow.sqlite"))
    }

    /// Opens a fresh connection with foreign keys on and a bounded lock wait.
    pub(crate) fn connect(&self) -> Result<Connection> {
        let conn = Connection::open(&self.path)?;
        conn.busy_timeout(self.busy_timeout)?;
        conn.pragma_update(None, "foreign_keys", true)?;
        Ok(conn)
    }

    /// Runs `work` as one atomic unit: committed if it returns `Ok`,
    /// rolled back otherwise.
    ///
    /// The transaction takes the write lock up front (`BEGIN IMMEDIATE`), so
    /// two units of work never interleave their read-check-write sequences.
    pub fn unit_of_work<T, E>(
        &self,
        work: impl FnOnce(&Transaction<'_>) -> core::result::Result<T, E>,
    ) -> core::result::Result<T, E>
    where
        E: From<StorageError>,
    {
        let mut conn = self.connect()?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(StorageError::from)?;
        let out = work(&tx)?;
        tx.commit().map_err(StorageError::from)?;
        Ok(out)
    }

    /// Lists ids of `entity` records that start with `prefix`.
    pub fn ids_with_prefix(&self, entity: Entity, prefix: &str) -> Result<Vec<Uuid>> {
        let conn = self.connect()?;
        let sql = format!(
            "SELECT id FROM {} WHERE id LIKE ?1 || '%' ORDER BY id",
            entity.table()
        );
        let mut stmt = conn.prepare(&sql)?;
        let ids = stmt
            .query_map([prefix.to_lowercase()], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        ids.iter().map(|id| parse_uuid(id)).collect()
    }

    /// Counts all records of `entity`.
    pub fn count(&self, entity: Entity) -> Result<u64> {
        let conn = self.connect()?;
        let sql = format!("SELECT COUNT(*) FROM {}", entity.table());
        let n: i64 = conn.query_row(&sql, [], |row| row.get(0))?;
        Ok(u64::try_from(n).unwrap_or(0))
    }
}

// ── Column decoding ──

pub(crate) fn parse_uuid(s: &str) -> Result<Uuid> {
    s.parse::<Uuid>()
        .map_err(|e| StorageError::Corrupt(format!("invalid id {s:?}: {e}")))
}

pub(crate) fn parse_opt_uuid(s: Option<&str>) -> Result<Option<Uuid>> {
    s.map(parse_uuid).transpose()
}

pub(crate) fn parse_date(s: &str) -> Result<Date> {
    s.parse::<Date>()
        .map_err(|e| StorageError::Corrupt(format!("invalid date {s:?}: {e}")))
}

pub(crate) fn parse_timestamp(s: &str) -> Result<Timestamp> {
    s.parse::<Timestamp>()
        .map_err(|e| StorageError::Corrupt(format!("invalid timestamp {s:?}: {e}")))
}

pub(crate) fn parse_decimal(s: &str) -> Result<Decimal> {
    Decimal::from_str(s).map_err(|e| StorageError::Corrupt(format!("invalid quantity {s:?}: {e}")))
}

pub(crate) fn parse_enum<T>(s: &str) -> Result<T>
where
    T: FromStr<Err = ParseEnumError>,
{
    s.parse::<T>()
        .map_err(|e| StorageError::Corrupt(e.to_string()))
}

pub(crate) fn to_u32(n: i64, column: &str) -> Result<u32> {
    u32::try_from(n).map_err(|_| StorageError::Corrupt(format!("{column} out of range: {n}")))
}

#[cfg(test)]
pub(crate) mod testing {
    use tempfile::TempDir;

    use super::{DEFAULT_BUSY_TIMEOUT, Storage};

    pub(crate) fn test_storage() -> (TempDir, Storage) {
        let dir = TempDir::new().unwrap();
        let storage = Storage::open(dir.path().join("furrow.sqlite"), DEFAULT_BUSY_TIMEOUT).unwrap();
        (dir, storage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use testing::test_storage;

    #[test]
    fn open_creates_parent_directories() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("nested").join("furrow.sqlite");

        Storage::open(&path, DEFAULT_BUSY_TIMEOUT).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn reopening_keeps_schema() {
        let (dir, _storage) = test_storage();
        let again = Storage::open(dir.path().join("furrow.sqlite"), DEFAULT_BUSY_TIMEOUT).unwrap();
        assert_eq!(again.count(Entity::Farm).unwrap(), 0);
    }

    #[test]
    fn failed_unit_of_work_rolls_back() {
        let (_dir, storage) = test_storage();

        let result: core::result::Result<(), StorageError> = storage.unit_of_work(|tx| {
            tx.execute(
                "INSERT INTO farms (id, name, owner, created_at) VALUES ('f', 'North', 'asha', 'now')",
                [],
            )?;
            Err(StorageError::Corrupt("abort".into()))
        });

        assert!(result.is_err());
        assert_eq!(storage.count(Entity::Farm).unwrap(), 0);
    }

    #[test]
    fn successful_unit_of_work_commits() {
        let (_dir, storage) = test_storage();

        storage
            .unit_of_work(|tx| {
                tx.execute(
                    "INSERT INTO farms (id, name, owner, created_at) VALUES ('f', 'North', 'asha', 'now')",
                    [],
                )?;
                Ok::<_, StorageError>(())
            })
            .unwrap();

        assert_eq!(storage.count(Entity::Farm).unwrap(), 1);
    }

    #[test]
    fn corrupt_columns_are_reported() {
        assert!(matches!(parse_uuid("nope"), Err(StorageError::Corrupt(_))));
        assert!(matches!(parse_date("2025-13-01"), Err(StorageError::Corrupt(_))));
        assert!(matches!(parse_decimal("ten"), Err(StorageError::Corrupt(_))));
    }
}
