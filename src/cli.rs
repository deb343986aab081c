//! CLI interface for Furrow.
//!
//! Every subcommand is non-interactive: arguments in, short lines out (or
//! JSON with `--json`). Ids can be given in full or as an unambiguous
//! prefix (e.g. `a3b`).
//!
//! Reading needs no identity. Anything that writes resolves the caller
//! through `--as`/`--role` (see [`identity`](crate::identity)) and checks
//! the role before the engine is called.

mod catalog;
mod farm;
mod format;
mod inventory;
mod planting;
mod task;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use jiff::civil::Date;
use jiff::tz::TimeZone;
use serde::Serialize;
use uuid::Uuid;

use crate::clock::{FixedClock, SystemClock};
use crate::config::Config;
use crate::engine::{Engine, Settings};
use crate::error::Error;
use crate::identity::{Actor, Role, resolve_actor};
use crate::storage::{Entity, Storage};

/// Furrow: plantings, care schedules, and the input store.
#[derive(Debug, Parser)]
#[command(name = "furrow", version, after_long_help = WORKFLOW_HELP)]
pub struct Cli {
    /// Act as this identity (overrides FURROW_IDENTITY and config).
    #[arg(long = "as", global = true)]
    identity: Option<String>,

    /// Act with this role (overrides FURROW_ROLE and config).
    #[arg(long, global = true, value_enum)]
    role: Option<Role>,

    /// Pretend today is this date (YYYY-MM-DD). Growth and due dates follow it.
    #[arg(long, global = true)]
    as_of: Option<Date>,

    /// Database file (overrides `database` in config).
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Print JSON instead of text.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

const WORKFLOW_HELP: &str = r#"Workflow: from seed to watered
  1. furrow --role owner cycle new --germination 7 --vegetative 21 --flowering 14 --fruiting 28 --total 70
  2. furrow --role owner profile new --water-min-ml 500
  3. furrow --role owner plant new Tomato --cycle 3f2 --profile 9ab
  4. furrow --role owner farm new North && furrow --role owner plot new --farm 71c "Bed 1"
  5. furrow --role owner inventory new Water --unit ml --quantity 10000 --reorder-level 1000
  6. furrow --role owner planting new --plot 5d0 --plant c41 --count 12
  7. furrow task due
  8. furrow --as ravi --role farmer task complete e07 --notes "morning round""#;

#[derive(Debug, Subcommand)]
enum Command {
    /// Growth cycle definitions.
    Cycle {
        #[command(subcommand)]
        command: catalog::CycleCommand,
    },

    /// Requirement profiles.
    Profile {
        #[command(subcommand)]
        command: catalog::ProfileCommand,
    },

    /// The plant catalog.
    Plant {
        #[command(subcommand)]
        command: catalog::PlantCommand,
    },

    /// Farms.
    Farm {
        #[command(subcommand)]
        command: farm::FarmCommand,
    },

    /// Plots on a farm.
    Plot {
        #[command(subcommand)]
        command: farm::PlotCommand,
    },

    /// Plantings: create, inspect, close out.
    Planting {
        #[command(subcommand)]
        command: planting::PlantingCommand,
    },

    /// The input store.
    Inventory {
        #[command(subcommand)]
        command: inventory::InventoryCommand,
    },

    /// Scheduled care tasks.
    Task {
        #[command(subcommand)]
        command: task::TaskCommand,
    },

    /// Counts at a glance.
    Stats,
}

/// A failed command, carrying the exit code to report it with.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error(transparent)]
    Engine(#[from] Error),

    #[error("{0}")]
    PermissionDenied(String),

    #[error("{0}")]
    Config(String),

    #[error("failed to write output: {0}")]
    Output(#[from] serde_json::Error),
}

impl CliError {
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Engine(e) => e.kind().exit_code(),
            Self::PermissionDenied(_) => 8,
            Self::Config(_) => 9,
            Self::Output(_) => 1,
        }
    }
}

/// Everything a command needs: the engine, and how to find out who is asking.
struct Context {
    engine: Engine,
    config: Config,
    identity: Option<String>,
    role: Option<Role>,
    json: bool,
}

impl Context {
    /// Resolves the caller and checks they hold one of `allowed`.
    fn actor(&self, allowed: &[Role]) -> Result<Actor, CliError> {
        let actor = resolve_actor(&self.config, self.identity.as_deref(), self.role)
            .map_err(CliError::Config)?;
        actor.require(allowed).map_err(CliError::PermissionDenied)?;
        Ok(actor)
    }

    fn resolve(&self, entity: Entity, reference: &str) -> Result<Uuid, CliError> {
        Ok(self.engine.resolve_id(entity, reference)?)
    }

    /// Prints `value` as JSON if asked to, otherwise runs `text`.
    fn emit<T: Serialize>(&self, value: &T, text: impl FnOnce(&T)) -> Result<(), CliError> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        } else {
            text(value);
        }
        Ok(())
    }
}

/// Parse arguments, open storage, and run the command.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::parse();
    let config = Config::load().map_err(CliError::Config)?;

    let path = cli
        .db
        .clone()
        .or_else(|| config.database.clone())
        .or_else(Storage::default_path)
        .ok_or_else(|| CliError::Config("could not determine home directory".to_string()))?;
    let storage = Storage::open(path, config.storage.busy_timeout()).map_err(Error::from)?;

    let settings = Settings::from_config(&config);
    let engine = match cli.as_of {
        Some(date) => {
            let at = date
                .at(12, 0, 0, 0)
                .to_zoned(TimeZone::system())
                .map_err(|e| CliError::Config(format!("invalid --as-of date: {e}")))?;
            Engine::new(storage, FixedClock::new(at), settings)
        }
        None => Engine::new(storage, SystemClock, settings),
    };

    let ctx = Context {
        engine,
        config,
        identity: cli.identity,
        role: cli.role,
        json: cli.json,
    };

    match cli.command {
        Command::Cycle { command } => catalog::run_cycle(&ctx, command),
        Command::Profile { command } => catalog::run_profile(&ctx, command),
        Command::Plant { command } => catalog::run_plant(&ctx, command),
        Command::Farm { command } => farm::run_farm(&ctx, command),
        Command::Plot { command } => farm::run_plot(&ctx, command),
        Command::Planting { command } => planting::run(&ctx, command),
        Command::Inventory { command } => inventory::run(&ctx, command),
        Command::Task { command } => task::run(&ctx, command),
        Command::Stats => farm::cmd_stats(&ctx),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use clap::CommandFactory;

    #[test]
    fn command_tree_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_parse_anywhere() {
        let cli = Cli::try_parse_from([
            "furrow",
            "task",
            "complete",
            "e07",
            "--as",
            "ravi",
            "--role",
            "farmer",
            "--as-of",
            "2025-01-05",
        ])
        .unwrap();

        assert_eq!(cli.identity.as_deref(), Some("ravi"));
        assert_eq!(cli.role, Some(Role::Farmer));
        assert_eq!(cli.as_of, Some(jiff::civil::date(2025, 1, 5)));
    }

    #[test]
    fn negative_adjustments_parse() {
        let cli = Cli::try_parse_from([
            "furrow", "inventory", "adjust", "a3b", "-500", "--reason", "spill",
        ]);
        assert!(cli.is_ok());
    }

    #[test]
    fn exit_codes_extend_engine_codes() {
        assert_eq!(CliError::PermissionDenied(String::new()).exit_code(), 8);
        assert_eq!(CliError::Config(String::new()).exit_code(), 9);
        assert_eq!(
            CliError::from(Error::InvalidState(String::new())).exit_code(),
            6
        );
    }
}
