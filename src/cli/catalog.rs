//! Catalog commands: growth cycles, requirement profiles, plants.

use clap::{Args, Subcommand};
use rust_decimal::Decimal;

use crate::catalog::{NewGrowthCycle, NewPlant};
use crate::identity::Role;
use crate::model::{Cadence, Requirements};
use crate::storage::Entity;

use super::format::{format_quantity, or_dash, short};
use super::{CliError, Context};

#[derive(Debug, Subcommand)]
pub enum CycleCommand {
    /// Define a growth cycle. Prints its id.
    New {
        #[arg(long)]
        germination: u32,
        #[arg(long)]
        vegetative: u32,
        #[arg(long)]
        flowering: u32,
        #[arg(long)]
        fruiting: u32,
        /// Days from planting to harvest. Need not equal the sum of stages.
        #[arg(long)]
        total: u32,
    },

    /// List growth cycles.
    List,
}

#[derive(Debug, Subcommand)]
pub enum ProfileCommand {
    /// Define a requirement profile from the inputs given. Prints its id.
    New(ProfileArgs),

    /// List requirement profiles.
    List,
}

/// Care inputs. Leave out anything the plant does not need.
#[derive(Debug, Args)]
pub struct ProfileArgs {
    /// Daily water, minimum (ml). Used as the task quantity.
    #[arg(long)]
    water_min_ml: Option<Decimal>,
    /// Daily water, maximum (ml).
    #[arg(long)]
    water_max_ml: Option<Decimal>,
    /// Weekly go krupa (ml).
    #[arg(long)]
    go_krupa_ml_weekly: Option<Decimal>,
    #[arg(long)]
    panchagavya_l_monthly: Option<Decimal>,
    #[arg(long)]
    dashagavya_l_monthly: Option<Decimal>,
    #[arg(long)]
    jeevamrutha_l_monthly: Option<Decimal>,
    #[arg(long)]
    vermicompost_ml_monthly: Option<Decimal>,
    #[arg(long)]
    cowpat_kg_monthly: Option<Decimal>,
    #[arg(long = "spray-3g-g-monthly")]
    spray_3g_g_monthly: Option<Decimal>,
    #[arg(long)]
    mustard_g_monthly: Option<Decimal>,
    #[arg(long)]
    pulse_l_monthly: Option<Decimal>,
    #[arg(long)]
    buttermilk_ml_monthly: Option<Decimal>,
    #[arg(long)]
    bo_ml_monthly: Option<Decimal>,
    #[arg(long)]
    faa_ml_monthly: Option<Decimal>,
    #[arg(long)]
    em_ml_monthly: Option<Decimal>,
}

impl ProfileArgs {
    fn into_requirements(self) -> Requirements {
        Requirements {
            water_min_ml: self.water_min_ml,
            water_max_ml: self.water_max_ml,
            go_krupa_ml_weekly: self.go_krupa_ml_weekly,
            panchagavya_l_monthly: self.panchagavya_l_monthly,
            dashagavya_l_monthly: self.dashagavya_l_monthly,
            jeevamrutha_l_monthly: self.jeevamrutha_l_monthly,
            vermicompost_ml_monthly: self.vermicompost_ml_monthly,
            cowpat_kg_monthly: self.cowpat_kg_monthly,
            spray_3g_g_monthly: self.spray_3g_g_monthly,
            mustard_g_monthly: self.mustard_g_monthly,
            pulse_l_monthly: self.pulse_l_monthly,
            buttermilk_ml_monthly: self.buttermilk_ml_monthly,
            bo_ml_monthly: self.bo_ml_monthly,
            faa_ml_monthly: self.faa_ml_monthly,
            em_ml_monthly: self.em_ml_monthly,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum PlantCommand {
    /// Add a species to the catalog. Prints its id.
    New {
        name: String,

        #[arg(long)]
        scientific_name: Option<String>,

        /// Growth cycle id or prefix.
        #[arg(long)]
        cycle: Option<String>,

        /// Requirement profile id or prefix.
        #[arg(long)]
        profile: Option<String>,

        #[arg(long)]
        notes: Option<String>,
    },

    /// List the catalog.
    List,

    /// Show one plant.
    Show {
        /// Plant id or prefix.
        plant: String,
    },
}

pub(super) fn run_cycle(ctx: &Context, command: CycleCommand) -> Result<(), CliError> {
    match command {
        CycleCommand::New {
            germination,
            vegetative,
            flowering,
            fruiting,
            total,
        } => {
            let actor = ctx.actor(&[Role::Owner])?;
            let cycle = ctx.engine.create_growth_cycle(
                &actor,
                NewGrowthCycle {
                    germination_days: germination,
                    vegetative_days: vegetative,
                    flowering_days: flowering,
                    fruiting_days: fruiting,
                    total_growth_days: total,
                },
            )?;
            ctx.emit(&cycle, |c| println!("{}", c.id))
        }
        CycleCommand::List => {
            let cycles = ctx.engine.list_growth_cycles()?;
            ctx.emit(&cycles, |cycles| {
                if cycles.is_empty() {
                    println!("No growth cycles");
                }
                for c in cycles {
                    println!(
                        "{}  {}/{}/{}/{} days, harvest at {}",
                        short(c.id),
                        c.germination_days,
                        c.vegetative_days,
                        c.flowering_days,
                        c.fruiting_days,
                        c.total_growth_days
                    );
                }
            })
        }
    }
}

pub(super) fn run_profile(ctx: &Context, command: ProfileCommand) -> Result<(), CliError> {
    match command {
        ProfileCommand::New(args) => {
            let actor = ctx.actor(&[Role::Owner])?;
            let profile = ctx
                .engine
                .create_requirement_profile(&actor, args.into_requirements())?;
            ctx.emit(&profile, |p| println!("{}", p.id))
        }
        ProfileCommand::List => {
            let profiles = ctx.engine.list_requirement_profiles()?;
            ctx.emit(&profiles, |profiles| {
                if profiles.is_empty() {
                    println!("No requirement profiles");
                }
                for p in profiles {
                    let inputs: Vec<String> = p
                        .requirements
                        .demands()
                        .iter()
                        .map(|d| {
                            let per = match d.cadence {
                                Cadence::Daily => "day",
                                Cadence::Weekly => "week",
                                Cadence::Monthly => "month",
                            };
                            format!("{} {}/{per}", d.resource, format_quantity(d.quantity, d.unit))
                        })
                        .collect();
                    let inputs = if inputs.is_empty() {
                        "no inputs".to_string()
                    } else {
                        inputs.join(", ")
                    };
                    println!("{}  {inputs}", short(p.id));
                }
            })
        }
    }
}

pub(super) fn run_plant(ctx: &Context, command: PlantCommand) -> Result<(), CliError> {
    match command {
        PlantCommand::New {
            name,
            scientific_name,
            cycle,
            profile,
            notes,
        } => {
            let actor = ctx.actor(&[Role::Owner])?;
            let growth_cycle_id = cycle
                .map(|c| ctx.resolve(Entity::GrowthCycle, &c))
                .transpose()?;
            let requirement_profile_id = profile
                .map(|p| ctx.resolve(Entity::RequirementProfile, &p))
                .transpose()?;
            let plant = ctx.engine.create_plant(
                &actor,
                NewPlant {
                    name,
                    scientific_name,
                    growth_cycle_id,
                    requirement_profile_id,
                    notes,
                },
            )?;
            ctx.emit(&plant, |p| println!("{}", p.id))
        }
        PlantCommand::List => {
            let plants = ctx.engine.list_plants()?;
            ctx.emit(&plants, |plants| {
                if plants.is_empty() {
                    println!("No plants");
                }
                for p in plants {
                    println!(
                        "{}  {}  ({})",
                        short(p.id),
                        p.name,
                        or_dash(p.scientific_name.as_deref())
                    );
                }
            })
        }
        PlantCommand::Show { plant } => {
            let id = ctx.resolve(Entity::Plant, &plant)?;
            let plant = ctx.engine.get_plant(id)?;
            ctx.emit(&plant, |p| {
                println!("Plant:      {} ({})", p.name, p.id);
                println!("Scientific: {}", or_dash(p.scientific_name.as_deref()));
                println!(
                    "Cycle:      {}",
                    p.growth_cycle_id.map_or_else(|| "-".to_string(), short)
                );
                println!(
                    "Profile:    {}",
                    p.requirement_profile_id.map_or_else(|| "-".to_string(), short)
                );
                println!("Notes:      {}", or_dash(p.notes.as_deref()));
            })
        }
    }
}
