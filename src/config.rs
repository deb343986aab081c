//! Furrow configuration.
//!
//! Loaded from `~/.furrow/config.toml`. Every key is optional; a missing
//! file means defaults throughout.
//!
//! ```toml
//! identity = "asha"
//! role = "owner"
//! database = "/srv/furrow/furrow.sqlite"
//!
//! [schedule]
//! horizon-days = 30
//! extend-to-growth-cycle = false
//!
//! [inventory]
//! untracked-resources = "proceed"
//!
//! [storage]
//! busy-timeout-ms = 5000
//! ```

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::identity::Role;
use crate::schedule::DEFAULT_HORIZON_DAYS;
use crate::storage::DEFAULT_BUSY_TIMEOUT;

const MAX_HORIZON_DAYS: u32 = 3650;

/// Furrow configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct Config {
    /// Default identity when neither `--as` nor `FURROW_IDENTITY` is set.
    pub identity: Option<String>,

    /// Default role when neither `--role` nor `FURROW_ROLE` is set.
    pub role: Option<Role>,

    /// Database file. Defaults to `~/.furrow/furrow.sqlite`.
    pub database: Option<PathBuf>,

    pub schedule: ScheduleConfig,
    pub inventory: InventoryConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct ScheduleConfig {
    /// Days of tasks generated at planting time.
    pub horizon_days: u32,

    /// Stretch the horizon to the plant's full growth cycle when longer.
    pub extend_to_growth_cycle: bool,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            horizon_days: DEFAULT_HORIZON_DAYS,
            extend_to_growth_cycle: false,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct InventoryConfig {
    pub untracked_resources: UntrackedResources,
}

/// What task completion does when no inventory item stocks the task's input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UntrackedResources {
    /// Complete the task without a debit.
    #[default]
    Proceed,
    /// Fail the completion with a not-found error.
    Reject,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct StorageConfig {
    pub busy_timeout_ms: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            busy_timeout_ms: u64::try_from(DEFAULT_BUSY_TIMEOUT.as_millis()).unwrap_or(5000),
        }
    }
}

impl StorageConfig {
    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}

impl Config {
    /// Load config from `~/.furrow/config.toml`, or defaults if absent.
    pub fn load() -> Result<Self, String> {
        match Self::path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load config from `path`, or defaults if the file does not exist.
    pub fn load_from(path: &Path) -> Result<Self, String> {
        let contents = match fs::read_to_string(path) {
            Ok(s) => s,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(format!("failed to read {}: {e}", path.display())),
        };

        Self::parse(&contents).map_err(|e| format!("invalid config at {}: {e}", path.display()))
    }

    fn parse(contents: &str) -> Result<Self, String> {
        let config: Self = toml::from_str(contents).map_err(|e| e.to_string())?;

        let horizon = config.schedule.horizon_days;
        if !(1..=MAX_HORIZON_DAYS).contains(&horizon) {
            return Err(format!(
                "schedule.horizon-days must be between 1 and {MAX_HORIZON_DAYS}, got {horizon}"
            ));
        }

        Ok(config)
    }

    /// The config file path: `~/.furrow/config.toml`.
    pub fn path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".furrow").join("config.toml"))
    }
}
