//! Farm layout commands: farms, plots, and the stats summary.

use clap::Subcommand;
use rust_decimal::Decimal;

use crate::catalog::{NewFarm, NewPlot};
use crate::identity::Role;
use crate::storage::Entity;

use super::format::{format_quantity, or_dash, short};
use super::{CliError, Context};

#[derive(Debug, Subcommand)]
pub enum FarmCommand {
    /// Create a farm owned by the caller. Prints its id.
    New {
        name: String,

        #[arg(long)]
        location: Option<String>,

        #[arg(long)]
        description: Option<String>,
    },

    /// List farms.
    List,
}

#[derive(Debug, Subcommand)]
pub enum PlotCommand {
    /// Create a plot on a farm. Prints its id.
    New {
        /// Farm id or prefix.
        #[arg(long)]
        farm: String,

        name: String,

        /// Area in square metres.
        #[arg(long)]
        area_sqm: Option<Decimal>,

        #[arg(long)]
        soil_type: Option<String>,
    },

    /// List plots.
    List {
        /// Only plots on this farm (id or prefix).
        #[arg(long)]
        farm: Option<String>,
    },
}

pub(super) fn run_farm(ctx: &Context, command: FarmCommand) -> Result<(), CliError> {
    match command {
        FarmCommand::New {
            name,
            location,
            description,
        } => {
            let actor = ctx.actor(&[Role::Owner])?;
            let farm = ctx.engine.create_farm(
                &actor,
                NewFarm {
                    name,
                    location,
                    description,
                },
            )?;
            ctx.emit(&farm, |f| println!("{}", f.id))
        }
        FarmCommand::List => {
            let farms = ctx.engine.list_farms()?;
            ctx.emit(&farms, |farms| {
                if farms.is_empty() {
                    println!("No farms");
                }
                for f in farms {
                    println!(
                        "{}  {}  [{}]  {}",
                        short(f.id),
                        f.name,
                        f.owner,
                        or_dash(f.location.as_deref())
                    );
                }
            })
        }
    }
}

pub(super) fn run_plot(ctx: &Context, command: PlotCommand) -> Result<(), CliError> {
    match command {
        PlotCommand::New {
            farm,
            name,
            area_sqm,
            soil_type,
        } => {
            let actor = ctx.actor(&[Role::Owner])?;
            let farm_id = ctx.resolve(Entity::Farm, &farm)?;
            let plot = ctx.engine.create_plot(
                &actor,
                NewPlot {
                    farm_id,
                    name,
                    area_sqm,
                    soil_type,
                },
            )?;
            ctx.emit(&plot, |p| println!("{}", p.id))
        }
        PlotCommand::List { farm } => {
            let farm = farm.map(|f| ctx.resolve(Entity::Farm, &f)).transpose()?;
            let plots = ctx.engine.list_plots(farm)?;
            ctx.emit(&plots, |plots| {
                if plots.is_empty() {
                    println!("No plots");
                }
                for p in plots {
                    let area = p
                        .area_sqm
                        .map_or_else(|| "-".to_string(), |a| format_quantity(a, "m²"));
                    println!(
                        "{}  {}  farm {}  {area}  {}",
                        short(p.id),
                        p.name,
                        short(p.farm_id),
                        or_dash(p.soil_type.as_deref())
                    );
                }
            })
        }
    }
}

pub(super) fn cmd_stats(ctx: &Context) -> Result<(), CliError> {
    let stats = ctx.engine.stats()?;
    ctx.emit(&stats, |s| {
        println!("Farms:             {}", s.farms);
        println!("Plots:             {}", s.plots);
        println!("Active plantings:  {}", s.active_plantings);
        println!("Low-stock items:   {}", s.low_stock_items);
        println!("Tasks due:         {}", s.pending_tasks_due);
    })
}
