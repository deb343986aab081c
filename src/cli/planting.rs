//! Planting commands: create, list, show, close.

use clap::{Subcommand, ValueEnum};
use jiff::civil::Date;

use crate::identity::Role;
use crate::lifecycle::NewPlanting;
use crate::model::{InstanceStatus, PlantInstance};
use crate::storage::Entity;

use super::format::{format_growth, format_schedule, short};
use super::{CliError, Context};

#[derive(Debug, Subcommand)]
pub enum PlantingCommand {
    /// Plant a species on a plot and generate its care schedule.
    /// Prints the planting id.
    New {
        /// Plot id or prefix.
        #[arg(long)]
        plot: String,

        /// Plant id or prefix.
        #[arg(long)]
        plant: String,

        /// Planting date (YYYY-MM-DD). Defaults to today.
        #[arg(long)]
        planted_on: Option<Date>,

        /// Number of plants.
        #[arg(long, default_value_t = 1)]
        count: u32,
    },

    /// List plantings with their current growth stage.
    List {
        /// Only plantings on this plot (id or prefix).
        #[arg(long)]
        plot: Option<String>,
    },

    /// Show one planting.
    Show {
        /// Planting id or prefix.
        planting: String,
    },

    /// Close out an active planting.
    Close {
        /// Planting id or prefix.
        planting: String,

        #[arg(long, value_enum)]
        outcome: OutcomeArg,
    },
}

/// CLI-facing close-out outcome, mapped to the domain `InstanceStatus`.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutcomeArg {
    /// Harvested.
    Completed,
    /// Lost.
    Failed,
}

impl OutcomeArg {
    fn to_domain(self) -> InstanceStatus {
        match self {
            Self::Completed => InstanceStatus::Completed,
            Self::Failed => InstanceStatus::Failed,
        }
    }
}

pub(super) fn run(ctx: &Context, command: PlantingCommand) -> Result<(), CliError> {
    match command {
        PlantingCommand::New {
            plot,
            plant,
            planted_on,
            count,
        } => {
            let actor = ctx.actor(&[Role::Owner])?;
            let new = NewPlanting {
                plot_id: ctx.resolve(Entity::Plot, &plot)?,
                plant_id: ctx.resolve(Entity::Plant, &plant)?,
                planted_on: planted_on.unwrap_or_else(|| ctx.engine.today()),
                count,
            };
            let planting = ctx.engine.create_plant_instance(&actor, new)?;
            ctx.emit(&planting, |p| {
                println!("{}", p.instance.id);
                eprintln!("{}", format_schedule(&p.schedule));
            })
        }
        PlantingCommand::List { plot } => {
            let plot = plot.map(|p| ctx.resolve(Entity::Plot, &p)).transpose()?;
            let instances = ctx.engine.list_plant_instances(plot)?;
            ctx.emit(&instances, |instances| {
                if instances.is_empty() {
                    println!("No plantings");
                }
                for i in instances {
                    print_line(i);
                }
            })
        }
        PlantingCommand::Show { planting } => {
            let id = ctx.resolve(Entity::PlantInstance, &planting)?;
            let instance = ctx.engine.get_plant_instance(id)?;
            ctx.emit(&instance, |i| {
                println!("Planting:   {}", i.id);
                println!("Plot:       {}", short(i.plot_id));
                println!("Plant:      {}", short(i.plant_id));
                println!("Planted on: {}", i.planted_on);
                println!("Count:      {}", i.count);
                println!("Status:     {}", i.status);
                println!("Growth:     {}", format_growth(i.growth.as_ref()));
                println!("Created by: {}", i.created_by);
            })
        }
        PlantingCommand::Close { planting, outcome } => {
            let actor = ctx.actor(&[Role::Owner, Role::Farmer])?;
            let id = ctx.resolve(Entity::PlantInstance, &planting)?;
            let instance = ctx
                .engine
                .close_plant_instance(&actor, id, outcome.to_domain())?;
            ctx.emit(&instance, |i| {
                eprintln!("Planting {} closed as {}", short(i.id), i.status);
            })
        }
    }
}

fn print_line(i: &PlantInstance) {
    println!(
        "{}  [{}]  plot {}  x{}  planted {}  {}",
        short(i.id),
        i.status,
        short(i.plot_id),
        i.count,
        i.planted_on,
        format_growth(i.growth.as_ref())
    );
}
